//! Step scripts and the sequential runner that drives them.

mod context;
pub mod extract;
mod orchestrator;
mod printer;
mod report;
mod result;
mod step;

pub use context::RunContext;
pub use orchestrator::Orchestrator;
pub use printer::{excerpt, ConsoleReporter, ReportSink, SilentSink, DEFAULT_PREVIEW_CHARS};
pub use report::{render_report, write_report};
pub use result::{Observation, RunReport, StepResult, Summary};
pub use step::{Extractor, PayloadBuilder, TestStep};
