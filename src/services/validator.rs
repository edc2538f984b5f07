//! Report validation: raw payload -> [`TestReport`].
//!
//! Validation is all-or-nothing. A payload that is not JSON at all is
//! `Malformed`; JSON that does not carry the report shape (or carries
//! negative/non-finite numbers) is a `SchemaMismatch`.

use crate::error::ParseError;
use crate::models::TestReport;

/// Extension every report file name must carry to be considered.
pub const REPORT_FILE_EXTENSION: &str = ".json";

/// Check if a file name is a report candidate.
pub fn is_report_file(file_name: &str) -> bool {
    file_name.ends_with(REPORT_FILE_EXTENSION)
}

/// Validate raw bytes, rejecting invalid UTF-8 as malformed.
pub fn validate_bytes(raw: &[u8]) -> Result<TestReport, ParseError> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| ParseError::malformed(format!("Invalid UTF-8: {}", e)))?;
    validate(text)
}

/// Validate a text payload into a report.
pub fn validate(raw: &str) -> Result<TestReport, ParseError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| ParseError::malformed(format!("Invalid JSON: {}", e)))?;

    if !value.is_object() {
        return Err(ParseError::schema_mismatch(
            "Report must be a JSON object",
        ));
    }

    let report: TestReport = serde_json::from_value(value)
        .map_err(|e| ParseError::schema_mismatch(e.to_string()))?;

    check_semantics(&report)?;
    Ok(report)
}

/// Checks serde cannot express: durations must be finite and non-negative,
/// suites must be named.
fn check_semantics(report: &TestReport) -> Result<(), ParseError> {
    check_duration("total_time", report.total_time)?;

    for (idx, suite) in report.test_suites.iter().enumerate() {
        if suite.name.trim().is_empty() {
            return Err(ParseError::schema_mismatch(format!(
                "test_suites[{}].name must not be empty",
                idx
            )));
        }
        check_duration(&format!("test_suites[{}].total_time", idx), suite.total_time)?;

        for (case_idx, case) in suite.test_cases.iter().enumerate() {
            check_duration(
                &format!("test_suites[{}].test_cases[{}].execution_time", idx, case_idx),
                case.execution_time,
            )?;
        }
    }

    Ok(())
}

fn check_duration(field: &str, value: f64) -> Result<(), ParseError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ParseError::schema_mismatch(format!(
            "{} must be a non-negative number, got {}",
            field, value
        )))
    }
}
