pub mod artifacts;
pub mod compile;
pub mod dataset;
pub mod instruction;
pub mod runner;

pub use artifacts::{read_combined, split_combined, write_combined, SplitArtifacts};
pub use compile::CompileChecker;
pub use dataset::{load_records, sample_records, SamplePlan};
pub use instruction::{build_instruction, DEFAULT_HEADER};
pub use runner::{EvalEvent, EvalResult, EvalRunner, EvalSummary, TaskOutcome};
