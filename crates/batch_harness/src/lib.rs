pub mod harness;
pub mod kernel;
pub mod source;

pub use harness::{Harness, HarnessConfig, RunSummary};
pub use kernel::{CollatzSteps, Kernel, UnitCircle};
pub use source::{PartitionPlan, RemainderPolicy};
