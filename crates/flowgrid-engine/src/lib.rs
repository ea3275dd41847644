//! Flowgrid engine: planner, durable step runtime, executor registry, run
//! driver, and the built-in node executors.

pub mod driver;
pub mod executors;
pub mod plan;
pub mod registry;
pub mod step;

pub use driver::RunDriver;
pub use plan::{plan, ExecutionPlan};
pub use registry::{EngineServices, ExecCtx, ExecutorRegistry, NodeExecutor};
pub use step::{MemoryJournal, StepHandle, StepJournal};
