use petgraph::Direction;
use polars::prelude::*;
use std::collections::HashMap;

use crate::graph::TaskDag;
use crate::schedule::ScheduleError;

/// Backward CPM pass: latest start and finish per task, in working-day
/// offsets, anchored on the project's overall earliest finish.
pub struct BackwardPass<'a> {
    df: &'a DataFrame,
}

impl<'a> BackwardPass<'a> {
    pub fn new(df: &'a DataFrame) -> Self {
        Self { df }
    }

    pub fn execute(
        &self,
        project_finish: i64,
    ) -> Result<HashMap<String, (i64, i64)>, ScheduleError> {
        let dag = TaskDag::build(self.df)?;

        let mut late_starts: HashMap<String, i64> = HashMap::new();
        let mut late_finishes: HashMap<String, i64> = HashMap::new();

        let mut order = dag.topo_order()?;
        order.reverse();

        for node_ix in order {
            let task_id = dag.graph[node_ix].clone();

            let mut late_finish = project_finish;
            for succ_ix in dag.graph.neighbors_directed(node_ix, Direction::Outgoing) {
                let succ_id = &dag.graph[succ_ix];
                if let Some(&succ_start) = late_starts.get(succ_id) {
                    if succ_start < late_finish {
                        late_finish = succ_start;
                    }
                }
            }

            let duration = *dag.durations.get(&task_id).unwrap_or(&0);
            late_starts.insert(task_id.clone(), late_finish - duration);
            late_finishes.insert(task_id, late_finish);
        }

        let mut results = HashMap::new();
        for (task_id, late_start) in late_starts {
            if let Some(&late_finish) = late_finishes.get(&task_id) {
                results.insert(task_id, (late_start, late_finish));
            }
        }
        Ok(results)
    }
}
