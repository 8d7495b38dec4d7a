use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use polars::prelude::*;
use std::collections::HashMap;

use crate::schedule::ScheduleError;

/// The validated task graph in the form the CPM passes walk: a petgraph
/// `DiGraph` with one node per task and one `pred -> succ` edge per
/// dependency, plus per-task expected durations in working days.
pub struct TaskDag {
    pub graph: DiGraph<String, ()>,
    pub id_to_index: HashMap<String, NodeIndex>,
    pub durations: HashMap<String, i64>,
}

impl TaskDag {
    pub fn build(df: &DataFrame) -> Result<Self, ScheduleError> {
        let ids_ca = df.column("id")?.str()?;
        let durations_ca = df.column("duration_days")?.i64()?;
        let preds_lc = df.column("predecessors")?.list()?;

        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut id_to_index: HashMap<String, NodeIndex> = HashMap::new();
        let mut durations: HashMap<String, i64> = HashMap::new();

        for (idx, id_opt) in ids_ca.into_iter().enumerate() {
            if let Some(task_id) = id_opt {
                let node_ix = graph.add_node(task_id.to_string());
                id_to_index.insert(task_id.to_string(), node_ix);
                durations.insert(task_id.to_string(), durations_ca.get(idx).unwrap_or(0));
            }
        }

        let ids_ca = df.column("id")?.str()?;
        for (idx, id_opt) in ids_ca.into_iter().enumerate() {
            if let Some(task_id) = id_opt {
                let Some(series) = preds_lc.get_as_series(idx) else {
                    continue;
                };
                let v = id_to_index[task_id];
                for pred_opt in series.str()?.into_iter() {
                    if let Some(pred_id) = pred_opt {
                        let Some(&u) = id_to_index.get(pred_id) else {
                            return Err(ScheduleError::UnknownTask {
                                id: pred_id.to_string(),
                                referenced_by: task_id.to_string(),
                            });
                        };
                        graph.add_edge(u, v, ());
                    }
                }
            }
        }

        Ok(Self {
            graph,
            id_to_index,
            durations,
        })
    }

    /// Topological order of the task nodes. A cyclic edge set surfaces as
    /// `ScheduleError::Cycle`.
    pub fn topo_order(&self) -> Result<Vec<NodeIndex>, ScheduleError> {
        toposort(&self.graph, None).map_err(|cycle| {
            let id = self.graph[cycle.node_id()].clone();
            ScheduleError::Cycle { task_id: id }
        })
    }
}
