use super::{PersistenceResult, PlanSnapshot, PlanStore};
use crate::task::Task;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;

pub struct SqlitePlanStore {
    connection: Mutex<Connection>,
}

impl SqlitePlanStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS plan_meta (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                config_json TEXT NOT NULL,
                dependencies_json TEXT NOT NULL,
                assignments_json TEXT NOT NULL,
                resource_calendars_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                task_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_meta(&self, tx: &rusqlite::Transaction, plan: &PlanSnapshot) -> PersistenceResult<()> {
        tx.execute("DELETE FROM plan_meta", [])?;
        tx.execute(
            "INSERT INTO plan_meta (id, config_json, dependencies_json, assignments_json, resource_calendars_json) \
             VALUES (1, ?1, ?2, ?3, ?4)",
            params![
                serde_json::to_string(&plan.config)?,
                serde_json::to_string(&plan.dependencies)?,
                serde_json::to_string(&plan.assignments)?,
                serde_json::to_string(&plan.resource_calendars)?,
            ],
        )?;
        Ok(())
    }

    fn save_tasks(&self, tx: &rusqlite::Transaction, plan: &PlanSnapshot) -> PersistenceResult<()> {
        tx.execute("DELETE FROM tasks", [])?;
        let mut stmt = tx.prepare("INSERT INTO tasks (id, task_json) VALUES (?1, ?2)")?;
        for task in &plan.tasks {
            let json = serde_json::to_string(task)?;
            stmt.execute(params![task.id, json])?;
        }
        Ok(())
    }
}

impl PlanStore for SqlitePlanStore {
    fn save_plan(&self, plan: &PlanSnapshot) -> PersistenceResult<()> {
        super::validate_tasks(&plan.tasks)?;
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        self.save_meta(&tx, plan)?;
        self.save_tasks(&tx, plan)?;
        tx.commit()?;
        Ok(())
    }

    fn load_plan(&self) -> PersistenceResult<Option<PlanSnapshot>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");

        let mut stmt = conn.prepare(
            "SELECT config_json, dependencies_json, assignments_json, resource_calendars_json \
             FROM plan_meta WHERE id = 1",
        )?;
        let meta: Option<(String, String, String, String)> = stmt
            .query_row([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .optional()?;

        let Some((config_json, dependencies_json, assignments_json, resource_calendars_json)) =
            meta
        else {
            return Ok(None);
        };

        let mut stmt = conn.prepare("SELECT task_json FROM tasks ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut tasks = Vec::new();
        for json in rows {
            let task: Task = serde_json::from_str(&json?)?;
            tasks.push(task);
        }

        super::validate_tasks(&tasks)?;

        Ok(Some(PlanSnapshot {
            config: serde_json::from_str(&config_json)?,
            tasks,
            dependencies: serde_json::from_str(&dependencies_json)?,
            assignments: serde_json::from_str(&assignments_json)?,
            resource_calendars: serde_json::from_str(&resource_calendars_json)?,
        }))
    }
}
