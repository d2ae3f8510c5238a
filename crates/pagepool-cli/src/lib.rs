//! # pagepool-cli
//!
//! Console presentation of pool simulation reports and shell completion.

pub mod completion;
pub mod output;
pub mod presenter;
pub mod report;
pub mod ui;

pub use presenter::{CliReportPresenter, ReportPresenter};
pub use report::SimulationReport;
