//! Query planning and execution

mod planner;

pub use planner::{choose_plan, execute};
