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

//! In-memory sales records. A [`Dataset`] is built once by the loader and
//! only ever handed out behind shared references afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub city: String,
    pub gender: String,
    pub payment_method: String,
    pub product_line: String,
    pub date: NaiveDate,
    pub gross_income: f64,
    pub rating: f64,
}

/// Categorical (or temporal) column a result table can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    City,
    Gender,
    Payment,
    ProductLine,
    Date,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::City,
        Dimension::Gender,
        Dimension::Payment,
        Dimension::ProductLine,
        Dimension::Date,
    ];

    /// Column header in the source file, also used as axis title.
    pub const fn column(self) -> &'static str {
        match self {
            Dimension::City => "City",
            Dimension::Gender => "Gender",
            Dimension::Payment => "Payment",
            Dimension::ProductLine => "Product line",
            Dimension::Date => "Date",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One component of a grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Date(NaiveDate),
    Text(String),
}

impl KeyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            KeyValue::Text(value) => Some(value),
            KeyValue::Date(_) => None,
        }
    }
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            KeyValue::Date(date) => Some(*date),
            KeyValue::Text(_) => None,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Text(value) => f.write_str(value),
            KeyValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// Borrowed key component used while grouping, so rows are not cloned per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum KeyRef<'a> {
    Text(&'a str),
    Date(NaiveDate),
}

impl KeyRef<'_> {
    pub(crate) fn to_owned_key(self) -> KeyValue {
        match self {
            KeyRef::Text(value) => KeyValue::Text(value.to_string()),
            KeyRef::Date(date) => KeyValue::Date(date),
        }
    }
}

impl Record {
    pub(crate) fn key(&self, dimension: Dimension) -> KeyRef<'_> {
        match dimension {
            Dimension::City => KeyRef::Text(&self.city),
            Dimension::Gender => KeyRef::Text(&self.gender),
            Dimension::Payment => KeyRef::Text(&self.payment_method),
            Dimension::ProductLine => KeyRef::Text(&self.product_line),
            Dimension::Date => KeyRef::Date(self.date),
        }
    }
    pub fn key_value(&self, dimension: Dimension) -> KeyValue {
        self.key(dimension).to_owned_key()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(String);

impl DatasetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for DatasetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub id: DatasetId,
    pub name: String,
    pub row_count: usize,
    pub loaded_at: DateTime<Utc>,
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub name: String,
    pub row_count: usize,
    pub cities: Vec<String>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub total_gross_income: f64,
}

/// Immutable, ordered collection of sales records.
#[derive(Debug)]
pub struct Dataset {
    records: Vec<Record>,
    cities: Vec<String>,
    metadata: DatasetMetadata,
}

impl Dataset {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        let cities = records
            .iter()
            .map(|record| record.city.as_str())
            .collect::<IndexSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let metadata = DatasetMetadata {
            id: DatasetId::new(),
            name: name.into(),
            row_count: records.len(),
            loaded_at: Utc::now(),
            source_path: None,
        };
        Self {
            records,
            cities,
            metadata,
        }
    }
    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata.source_path = Some(path.into());
        self
    }
    pub fn records(&self) -> &[Record] {
        &self.records
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }
    /// Distinct cities in first-occurrence order.
    pub fn cities(&self) -> &[String] {
        &self.cities
    }
    pub fn contains_city(&self, city: &str) -> bool {
        self.cities.iter().any(|known| known == city)
    }
    /// Distinct values of `dimension` in first-occurrence order.
    pub fn distinct_values(&self, dimension: Dimension) -> Vec<KeyValue> {
        self.records
            .iter()
            .map(|record| record.key(dimension))
            .collect::<IndexSet<_>>()
            .into_iter()
            .map(KeyRef::to_owned_key)
            .collect()
    }
    pub fn summary(&self) -> DatasetSummary {
        let first_date = self.records.iter().map(|r| r.date).min();
        let last_date = self.records.iter().map(|r| r.date).max();
        let min_rating = self.records.iter().map(|r| r.rating).reduce(f64::min);
        let max_rating = self.records.iter().map(|r| r.rating).reduce(f64::max);
        DatasetSummary {
            name: self.metadata.name.clone(),
            row_count: self.records.len(),
            cities: self.cities.clone(),
            first_date,
            last_date,
            min_rating,
            max_rating,
            total_gross_income: self.records.iter().map(|r| r.gross_income).sum(),
        }
    }
}
