// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TesseraError {
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),
    #[error("View building error: {0}")]
    View(#[from] ViewError),
    #[error("Data loading error: {0}")]
    Data(#[from] DataError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] SerialisationError),
}

/// Rejected filter input coming from the UI layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unrecognised measure token '{token}': expected 'gross income' or 'Rating'")]
    InvalidMeasure { token: String },
}

/// Contract violations between aggregation output and the view rules consuming it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("Malformed result table for view '{view}': {reason}")]
    MalformedTable { view: String, reason: String },
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to open data file '{path}': {source}")]
    DataFileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV decoding failed at line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },
    #[error("Temporal parsing failed at line {line}: '{value}' matches no configured date format")]
    TemporalParsingError { line: u64, value: String },
    #[error("Negative gross income {value} at line {line}")]
    NegativeIncome { line: u64, value: f64 },
    #[error("Rating {value} at line {line} is outside [{min}, {max}]")]
    RatingOutOfBounds {
        line: u64,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("Empty dataset provided")]
    EmptyDataset,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigFileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML configuration: {source}")]
    YamlParseError {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration: {field} {reason}")]
    InvalidField { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SerialisationError {
    #[error("JSON serialisation failed: {source}")]
    JsonSerialisationError {
        #[from]
        source: serde_json::Error,
    },
    #[error("Unsupported export format: {format}")]
    UnsupportedExportFormat { format: String },
}

pub type Result<T> = std::result::Result<T, TesseraError>;
pub type FilterResult<T> = std::result::Result<T, FilterError>;
pub type ViewResult<T> = std::result::Result<T, ViewError>;
pub type DataResult<T> = std::result::Result<T, DataError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type SerialisationResult<T> = std::result::Result<T, SerialisationError>;

impl From<serde_json::Error> for TesseraError {
    fn from(err: serde_json::Error) -> Self {
        TesseraError::Serialisation(SerialisationError::JsonSerialisationError { source: err })
    }
}

impl ViewError {
    pub fn malformed(view: &str, reason: impl Into<String>) -> Self {
        ViewError::MalformedTable {
            view: view.to_string(),
            reason: reason.into(),
        }
    }
}

impl TesseraError {
    /// Errors after which the dashboard can keep serving the last good charts.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TesseraError::View(ViewError::MalformedTable { .. }))
    }
    pub fn category(&self) -> &'static str {
        match self {
            TesseraError::Filter(_) => "Filter",
            TesseraError::View(_) => "View",
            TesseraError::Data(_) => "Data",
            TesseraError::Io(_) => "I/O",
            TesseraError::Config(_) => "Configuration",
            TesseraError::Serialisation(_) => "Serialisation",
        }
    }
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            TesseraError::Filter(FilterError::InvalidMeasure { .. }) => vec![
                "Use one of the measure tokens 'gross income' or 'Rating'".to_string(),
            ],
            TesseraError::Data(DataError::ColumnNotFound { .. }) => vec![
                "The file needs the columns City, Gender, Payment, Product line, Date, gross income and Rating".to_string(),
            ],
            TesseraError::Data(DataError::TemporalParsingError { .. }) => vec![
                "Add the file's date layout to data.date_formats in the configuration".to_string(),
            ],
            TesseraError::Data(DataError::DataFileError { .. }) => vec![
                "Check the data path in the configuration or pass --data".to_string(),
            ],
            TesseraError::Config(ConfigError::ConfigFileError { .. }) => vec![
                "Pass --config with the path to dashboard.yml".to_string(),
            ],
            _ => vec!["Check the error message for specific guidance".to_string()],
        }
    }
    pub fn user_message(&self) -> String {
        match self {
            TesseraError::Data(DataError::EmptyDataset) => {
                "The dataset appears to be empty. Please provide data with at least one row."
                    .to_string()
            }
            TesseraError::View(ViewError::MalformedTable { .. }) => {
                "Charts could not be refreshed; the previous charts are still shown.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    pub fn of(error: &TesseraError) -> Self {
        match error {
            TesseraError::View(_) => ErrorSeverity::Warning,
            TesseraError::Filter(_) => ErrorSeverity::Error,
            TesseraError::Data(_) | TesseraError::Config(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }
    pub fn color_code(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "\x1b[36m",
            ErrorSeverity::Warning => "\x1b[33m",
            ErrorSeverity::Error => "\x1b[31m",
            ErrorSeverity::Critical => "\x1b[35m",
        }
    }
}

pub struct ErrorReporter {
    pub show_suggestions: bool,
    pub colored_output: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            show_suggestions: true,
            colored_output: true,
        }
    }
    /// Plain-text reporter for widgets that cannot render ANSI colours.
    pub fn plain() -> Self {
        Self {
            show_suggestions: true,
            colored_output: false,
        }
    }
    pub fn report(&self, error: &TesseraError) -> String {
        let severity = ErrorSeverity::of(error);
        let mut output = String::new();
        if self.colored_output {
            output.push_str(severity.color_code());
        }
        output.push_str(&format!(
            "[{}] {}: {}\n",
            severity.as_str(),
            error.category(),
            error.user_message()
        ));
        if self.colored_output {
            output.push_str("\x1b[0m");
        }
        if self.show_suggestions {
            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                output.push_str("\nSuggestions:\n");
                for suggestion in suggestions {
                    output.push_str(&format!("  • {suggestion}\n"));
                }
            }
        }
        output
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_tables_are_recoverable_warnings() {
        let error = TesseraError::from(ViewError::malformed("city-fig", "expected 1 key"));
        assert!(error.is_recoverable());
        assert_eq!(ErrorSeverity::of(&error), ErrorSeverity::Warning);
        assert_eq!(error.category(), "View");
    }

    #[test]
    fn invalid_measure_is_not_recoverable() {
        let error = TesseraError::from(FilterError::InvalidMeasure {
            token: "profit".to_string(),
        });
        assert!(!error.is_recoverable());
        assert!(error.to_string().contains("profit"));
    }

    #[test]
    fn plain_report_has_no_escape_codes() {
        let error = TesseraError::from(DataError::EmptyDataset);
        let report = ErrorReporter::plain().report(&error);
        assert!(report.starts_with("[CRITICAL] Data:"));
        assert!(!report.contains('\x1b'));
    }
}
