//! Integration test suite.
//!
//! Drives the public library API and the HTTP layer end to end, with the
//! history held in memory and report sources backed by temp directories.
//!
//! Run with: cargo test --test integration


mod test_api_ingest;
mod test_api_runs;
mod test_polling;
mod test_scenarios;
