//! Domain models for the test trend server.

pub mod history_event;
pub mod run;
pub mod test_report;
pub mod trend;

// Re-export commonly used types
pub use history_event::{
    HistoryEvent, HistoryEventMessage, HistoryRefreshedPayload, RunsIngestedPayload,
    SelectionChangedPayload,
};
pub use run::{HistoryResponse, Run, RunListItem, RunOrigin};
pub use test_report::{TestCase, TestReport, TestStatus, TestSuite, success_rate};
pub use trend::{RunSummary, SuiteTrend, SuiteTrendPoint, TrendDelta, TrendPoint};
