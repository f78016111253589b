pub mod coordinator;
pub mod plan;

pub use coordinator::{Coordinator, Dispatch};
pub use plan::{ActionPlan, Operation, PlanTable, PlannedOp};
