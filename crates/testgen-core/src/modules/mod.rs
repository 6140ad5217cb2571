pub mod compiler;
pub mod discovery;
pub mod fixtures;
pub mod oracle;
pub mod patcher;
pub mod process;
pub mod report;
pub mod serialization;

mod traits;

pub use compiler::{CompileDriver, CompileReport, ProcessCompiler};
pub use fixtures::{FixtureGenerator, GenerationReport};
pub use oracle::ProcessOracle;
pub use patcher::{PatchRunReport, SourcePatcher};
pub use report::{WorkflowReport, render_human_summary, write_report_file};
pub use traits::{CompileRequest, Compiler, Oracle, OracleOutcome, OracleRequest};
