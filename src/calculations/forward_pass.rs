use petgraph::Direction;
use polars::prelude::*;
use std::collections::HashMap;

use crate::calendar::CalendarConfig;
use crate::graph::TaskDag;
use crate::schedule::ScheduleError;
use crate::task::Task;
use crate::timeline;

/// Forward CPM pass: earliest start and finish per task, in working-day
/// offsets. Tasks marked done with a recorded completion date are pinned to
/// that date instead of being resequenced, and feed successors with their
/// actual finish.
pub struct ForwardPass<'a> {
    df: &'a DataFrame,
    config: &'a CalendarConfig,
}

impl<'a> ForwardPass<'a> {
    pub fn new(df: &'a DataFrame, config: &'a CalendarConfig) -> Self {
        Self { df, config }
    }

    pub fn execute(&self) -> Result<HashMap<String, (i64, i64)>, ScheduleError> {
        let dag = TaskDag::build(self.df)?;
        let order = dag.topo_order()?;

        let done_finishes = self.pinned_finishes()?;

        let mut early_starts: HashMap<String, i64> = HashMap::new();
        let mut early_finishes: HashMap<String, i64> = HashMap::new();

        for node_ix in order {
            let task_id = dag.graph[node_ix].clone();
            let duration = *dag.durations.get(&task_id).unwrap_or(&0);

            if let Some(&pinned_finish) = done_finishes.get(&task_id) {
                let early_finish = pinned_finish;
                let early_start = (early_finish - duration).max(0);
                early_starts.insert(task_id.clone(), early_start);
                early_finishes.insert(task_id, early_finish);
                continue;
            }

            let mut early_start = 0;
            for pred_ix in dag.graph.neighbors_directed(node_ix, Direction::Incoming) {
                let pred_id = &dag.graph[pred_ix];
                if let Some(&pred_finish) = early_finishes.get(pred_id) {
                    if pred_finish > early_start {
                        early_start = pred_finish;
                    }
                }
            }

            early_finishes.insert(task_id.clone(), early_start + duration);
            early_starts.insert(task_id, early_start);
        }

        let mut results = HashMap::new();
        for (task_id, early_start) in early_starts {
            if let Some(&early_finish) = early_finishes.get(&task_id) {
                results.insert(task_id, (early_start, early_finish));
            }
        }
        Ok(results)
    }

    /// Exclusive finish offsets for done tasks with a recorded date: the
    /// offset of the completion day plus one, so successors start after it.
    fn pinned_finishes(&self) -> Result<HashMap<String, i64>, ScheduleError> {
        let ids_ca = self.df.column("id")?.str()?;
        let done_ca = self.df.column("done")?.bool()?;
        let done_dates = self.df.column("done_date")?.date()?;

        let mut pinned = HashMap::new();
        for (idx, id_opt) in ids_ca.into_iter().enumerate() {
            let Some(task_id) = id_opt else { continue };
            if done_ca.get(idx) != Some(true) {
                continue;
            }
            let Some(done_date) = Task::date_from_series(done_dates, idx) else {
                continue;
            };
            let offset = timeline::date_to_offset(done_date, self.config)?;
            pinned.insert(task_id.to_string(), offset + 1);
        }
        Ok(pinned)
    }
}
