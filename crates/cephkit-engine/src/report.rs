//! Analysis report for one projection.
//!
//! Lists the computed measurements with their norms and a one-line
//! conclusion, as plain text or CSV.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::catalogue::{Module, ProjectionConfig};
use crate::measurement::Measurement;

pub const CONCLUSION_NORMAL: &str = "All measured parameters are within norm.";
pub const CONCLUSION_DEVIATING: &str = "Some measured parameters deviate from norm.";

/// Error types for report export
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Report is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub projection: String,
    pub projection_label: String,
    pub module: Module,
    pub measurements: Vec<Measurement>,
    /// Every classified measurement lies within its norm
    pub all_normal: bool,
    pub conclusion: String,
}

impl AnalysisReport {
    pub fn new(config: &ProjectionConfig, measurements: Vec<Measurement>) -> Self {
        let all_normal = measurements.iter().all(Measurement::is_normal);
        let conclusion = if all_normal {
            CONCLUSION_NORMAL
        } else {
            CONCLUSION_DEVIATING
        };
        Self {
            projection: config.key.clone(),
            projection_label: config.label.clone(),
            module: config.module,
            measurements,
            all_normal,
            conclusion: conclusion.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Fixed-width table followed by the conclusion.
    pub fn to_text_table(&self) -> String {
        let rows: Vec<[String; 4]> = self
            .measurements
            .iter()
            .map(|m| {
                [
                    m.name.clone(),
                    m.formatted_value(),
                    m.norm_range_text.clone().unwrap_or_default(),
                    m.interpretation.clone().unwrap_or_default(),
                ]
            })
            .collect();
        let header = ["Parameter", "Value", "Norm", "Interpretation"];
        let mut widths = header.map(|h| h.chars().count());
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = format!("{} - {} ({})\n\n", self.module, self.projection_label, self.projection);
        let line = |cells: [&str; 4]| {
            let padded: Vec<String> = cells
                .iter()
                .zip(widths)
                .map(|(c, w)| format!("{:<width$}", c, width = w))
                .collect();
            padded.join("  ").trim_end().to_string()
        };
        out.push_str(&line(header));
        out.push('\n');
        out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
        out.push('\n');
        for row in &rows {
            out.push_str(&line([&row[0], &row[1], &row[2], &row[3]]));
            out.push('\n');
        }
        if rows.is_empty() {
            out.push_str("(no measurements yet)\n");
        }
        out.push('\n');
        out.push_str(&self.conclusion);
        out.push('\n');
        out
    }

    /// Writes one CSV row per measurement.
    pub fn write_csv<W: Write>(&self, writer: W) -> ReportResult<()> {
        let mut csv_writer = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
        csv_writer.write_record(["Key", "Parameter", "Value", "Unit", "Norm", "Interpretation", "Group"])?;
        for m in &self.measurements {
            csv_writer.write_record([
                m.key.as_str(),
                m.name.as_str(),
                &format!("{:.2}", m.value),
                m.unit.suffix(),
                m.norm_range_text.as_deref().unwrap_or(""),
                m.interpretation.as_deref().unwrap_or(""),
                m.group.as_deref().unwrap_or(""),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv(&self) -> ReportResult<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}
