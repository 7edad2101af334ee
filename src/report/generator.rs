//! Trial report generation.
//!
//! The text report is the tab-separated layout read by downstream
//! scripts; the JSON report is one compact document per run so that
//! appended runs form a JSON Lines stream.

use crate::error::{Result, TrialError};
use crate::models::{ModelSummary, SlotSummary, TrialReport};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Format a float in shortest round-trip form, always with a decimal
/// point or exponent (`2.0`, `0.1`, `1e-7`).
pub fn format_value(value: f64) -> String {
    format!("{:?}", value)
}

/// Generate the complete text report.
pub fn generate_text_report(report: &TrialReport) -> String {
    let mut output = String::new();

    for model in &report.models {
        output.push_str(&generate_model_block(model));
    }

    output
}

/// Generate the header line and slot rows of one model.
fn generate_model_block(model: &ModelSummary) -> String {
    let mut block = String::new();

    block.push_str(&model.name);
    block.push('\n');

    for slot in &model.slots {
        block.push_str(&generate_slot_row(slot));
    }

    block
}

/// `slot \t values... \t mean \t half_width \t direction`
fn generate_slot_row(slot: &SlotSummary) -> String {
    let mut row = format!("{}\t", slot.slot);

    for value in &slot.values {
        row.push_str(&format_value(*value));
        row.push('\t');
    }

    row.push_str(&format!(
        "{}\t{}\t{}\n",
        format_value(slot.mean),
        format_value(slot.half_width),
        slot.direction
    ));

    row
}

/// Generate a single-line JSON report.
pub fn generate_json_report(report: &TrialReport) -> Result<String> {
    let mut line = serde_json::to_string(report)?;
    line.push('\n');
    Ok(line)
}

/// Append `content` to `path`, creating the file if needed.
///
/// The report is written in a single call once it is fully rendered.
pub fn append_report(path: &Path, content: &str) -> Result<()> {
    debug!("Appending {} bytes to {}", content.len(), path.display());

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| TrialError::write(path, e))?;

    file.write_all(content.as_bytes())
        .map_err(|e| TrialError::write(path, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BaselineScope, Direction, ReportMetadata};
    use chrono::Utc;

    fn create_test_report() -> TrialReport {
        TrialReport {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                inputs: vec!["run1.txt".to_string(), "run2.txt".to_string()],
                cluster_count: 2,
                baseline: BaselineScope::Global,
                z_score: 1.96,
                global_max: Some(4.0),
            },
            models: vec![ModelSummary {
                name: "A".to_string(),
                reference: 4.0,
                slots: vec![
                    SlotSummary {
                        slot: 1,
                        values: vec![2.0, 4.0],
                        mean: 3.0,
                        half_width: 1.96,
                        direction: Direction::None,
                    },
                    SlotSummary {
                        slot: 2,
                        values: vec![1.0, 1.0],
                        mean: 1.0,
                        half_width: 0.0,
                        direction: Direction::Down,
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(2.0), "2.0");
        assert_eq!(format_value(0.1), "0.1");
        assert_eq!(format_value(-3.25), "-3.25");
    }

    #[test]
    fn test_generate_text_report() {
        let text = generate_text_report(&create_test_report());
        assert_eq!(
            text,
            "A\n1\t2.0\t4.0\t3.0\t1.96\tnone\n2\t1.0\t1.0\t1.0\t0.0\tdown\n"
        );
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_report()).unwrap();
        assert!(json.ends_with('\n'));
        assert_eq!(json.lines().count(), 1);
        assert!(json.contains("\"baseline\":\"global\""));
        assert!(json.contains("\"direction\":\"down\""));

        let parsed: TrialReport = serde_json::from_str(json.trim_end()).unwrap();
        assert_eq!(parsed.models[0].slots[1].values, vec![1.0, 1.0]);
    }

    #[test]
    fn test_append_report_grows_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");

        append_report(&path, "first\n").unwrap();
        append_report(&path, "second\n").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_append_report_bad_path() {
        let err = append_report(Path::new("/nonexistent/dir/report.txt"), "x").unwrap_err();
        assert!(matches!(err, TrialError::Write { .. }));
    }
}
