pub mod backward_pass;
pub mod estimate;
pub mod forward_pass;

pub use estimate::{DurationPolicy, pert_estimate};
