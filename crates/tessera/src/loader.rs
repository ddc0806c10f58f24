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

use crate::config::DataConfig;
use crate::dataset::{Dataset, Record};
use crate::error::{DataError, DataResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

pub const REQUIRED_COLUMNS: [&str; 7] = [
    "City",
    "Gender",
    "Payment",
    "Product line",
    "Date",
    "gross income",
    "Rating",
];

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "City")]
    city: String,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "Payment")]
    payment: String,
    #[serde(rename = "Product line")]
    product_line: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "gross income")]
    gross_income: f64,
    #[serde(rename = "Rating")]
    rating: f64,
}

/// Reads the sales CSV once at start-up. Any bad row aborts the load.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    date_formats: Vec<String>,
    rating_min: f64,
    rating_max: f64,
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self::from_config(&DataConfig::default())
    }
    pub fn from_config(config: &DataConfig) -> Self {
        Self {
            date_formats: config.date_formats.clone(),
            rating_min: config.rating_min,
            rating_max: config.rating_max,
        }
    }
    pub fn load_csv<P: AsRef<Path>>(&self, path: P) -> DataResult<Dataset> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataError::DataFileError {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());
        let dataset = self.load_reader(name, file)?.with_source_path(path);
        info!(
            path = %path.display(),
            rows = dataset.len(),
            cities = dataset.cities().len(),
            "loaded sales dataset"
        );
        Ok(dataset)
    }
    pub fn load_reader<R: Read>(&self, name: impl Into<String>, reader: R) -> DataResult<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|source| DataError::Csv { line: 1, source })?
            .clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|header| header == column) {
                return Err(DataError::ColumnNotFound {
                    column: column.to_string(),
                });
            }
        }
        let mut records = Vec::new();
        let mut row = csv::StringRecord::new();
        loop {
            let line = reader.position().line();
            match reader.read_record(&mut row) {
                Ok(true) => {}
                Ok(false) => break,
                Err(source) => return Err(DataError::Csv { line, source }),
            }
            // quoted fields may span lines, so report where the record starts
            let line = row.position().map_or(line, |position| position.line());
            let raw: RawRecord = row
                .deserialize(Some(&headers))
                .map_err(|source| DataError::Csv { line, source })?;
            records.push(self.normalise(raw, line)?);
        }
        if records.is_empty() {
            return Err(DataError::EmptyDataset);
        }
        Ok(Dataset::new(name, records))
    }
    fn normalise(&self, raw: RawRecord, line: u64) -> DataResult<Record> {
        let date = self.parse_date(&raw.date, line)?;
        if raw.gross_income < 0.0 || !raw.gross_income.is_finite() {
            return Err(DataError::NegativeIncome {
                line,
                value: raw.gross_income,
            });
        }
        if !(self.rating_min..=self.rating_max).contains(&raw.rating) {
            return Err(DataError::RatingOutOfBounds {
                line,
                value: raw.rating,
                min: self.rating_min,
                max: self.rating_max,
            });
        }
        Ok(Record {
            city: raw.city,
            gender: raw.gender,
            payment_method: raw.payment,
            product_line: raw.product_line,
            date,
            gross_income: raw.gross_income,
            rating: raw.rating,
        })
    }
    fn parse_date(&self, value: &str, line: u64) -> DataResult<NaiveDate> {
        self.date_formats
            .iter()
            .find_map(|format| {
                if format.contains("%H") {
                    NaiveDateTime::parse_from_str(value, format)
                        .ok()
                        .map(|timestamp| timestamp.date())
                } else {
                    NaiveDate::parse_from_str(value, format).ok()
                }
            })
            .ok_or_else(|| DataError::TemporalParsingError {
                line,
                value: value.to_string(),
            })
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}
