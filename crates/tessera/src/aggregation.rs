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

//! Filters the dataset by the selected cities and reduces the chosen measure
//! over five fixed groupings.

use crate::config::EngineConfig;
use crate::dataset::{Dataset, Dimension, KeyRef, KeyValue, Record};
use crate::filter::{FilterState, Measure, Reduction};
use indexmap::IndexMap;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::debug;

/// Identifies one of the five result tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableId {
    City,
    Payment,
    GenderCity,
    Date,
    ProductCity,
}

impl TableId {
    pub const ALL: [TableId; 5] = [
        TableId::City,
        TableId::Payment,
        TableId::GenderCity,
        TableId::Date,
        TableId::ProductCity,
    ];

    pub const fn dimensions(self) -> &'static [Dimension] {
        match self {
            TableId::City => &[Dimension::City],
            TableId::Payment => &[Dimension::Payment],
            TableId::GenderCity => &[Dimension::Gender, Dimension::City],
            TableId::Date => &[Dimension::Date],
            TableId::ProductCity => &[Dimension::ProductLine, Dimension::City],
        }
    }
    pub const fn name(self) -> &'static str {
        match self {
            TableId::City => "by_city",
            TableId::Payment => "by_payment",
            TableId::GenderCity => "by_gender_city",
            TableId::Date => "by_date",
            TableId::ProductCity => "by_product_city",
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRow {
    pub key: Vec<KeyValue>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub id: TableId,
    pub dimensions: Vec<Dimension>,
    pub measure: Measure,
    pub reduction: Reduction,
    pub rows: Vec<AggregatedRow>,
}

impl ResultTable {
    pub fn empty(id: TableId, measure: Measure) -> Self {
        Self {
            id,
            dimensions: id.dimensions().to_vec(),
            measure,
            reduction: measure.reduction(),
            rows: Vec::new(),
        }
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    /// Position of `dimension` inside each row key.
    pub fn key_index(&self, dimension: Dimension) -> Option<usize> {
        self.dimensions.iter().position(|d| *d == dimension)
    }
    pub fn value_of(&self, key: &[KeyValue]) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.key == key)
            .map(|row| row.value)
    }
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|row| row.value).sum()
    }
}

/// The five tables one recompute produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTables {
    pub city: ResultTable,
    pub payment: ResultTable,
    pub gender_city: ResultTable,
    pub date: ResultTable,
    pub product_city: ResultTable,
}

impl ResultTables {
    pub fn get(&self, id: TableId) -> &ResultTable {
        match id {
            TableId::City => &self.city,
            TableId::Payment => &self.payment,
            TableId::GenderCity => &self.gender_city,
            TableId::Date => &self.date,
            TableId::ProductCity => &self.product_city,
        }
    }
    pub fn iter(&self) -> impl Iterator<Item = &ResultTable> {
        TableId::ALL.into_iter().map(move |id| self.get(id))
    }
    pub fn is_empty(&self) -> bool {
        self.iter().all(ResultTable::is_empty)
    }
}

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    sum: f64,
    count: usize,
    min: f64,
    max: f64,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            sum: 0.0,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }
    fn finish(self, reduction: Reduction) -> f64 {
        match reduction {
            Reduction::Sum => self.sum,
            Reduction::Mean => {
                let mean = self.sum / self.count as f64;
                // rounding in sum / count must not push the mean outside the group's range;
                // min > max only when every value was NaN
                if self.min <= self.max {
                    mean.clamp(self.min, self.max)
                } else {
                    mean
                }
            }
        }
    }
}

pub struct AggregationEngine {
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    parallel_threshold: usize,
}

impl AggregationEngine {
    pub fn new() -> Self {
        Self::from_config(&EngineConfig::default())
    }
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            parallel_threshold: config.parallel_threshold,
        }
    }
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    #[cfg(feature = "parallel")]
    fn group_tables(&self, filtered: &[&Record], measure: Measure) -> Vec<ResultTable> {
        if filtered.len() >= self.parallel_threshold {
            return TableId::ALL
                .par_iter()
                .map(|id| Self::group_table(*id, filtered, measure))
                .collect();
        }
        Self::group_sequential(filtered, measure)
    }

    #[cfg(not(feature = "parallel"))]
    fn group_tables(&self, filtered: &[&Record], measure: Measure) -> Vec<ResultTable> {
        Self::group_sequential(filtered, measure)
    }

    fn group_sequential(filtered: &[&Record], measure: Measure) -> Vec<ResultTable> {
        TableId::ALL
            .iter()
            .map(|id| Self::group_table(*id, filtered, measure))
            .collect()
    }

    /// Pure function of its inputs: the same dataset and filter always yield
    /// identical tables.
    pub fn compute(&self, dataset: &Dataset, filter: &FilterState) -> ResultTables {
        let started = Instant::now();
        let filtered: Vec<&Record> = dataset
            .records()
            .iter()
            .filter(|record| filter.includes(&record.city))
            .collect();
        let measure = filter.measure;
        let tables = self.group_tables(&filtered, measure);
        debug!(
            records = dataset.len(),
            filtered = filtered.len(),
            cities = filter.selected_cities.len(),
            %measure,
            elapsed_us = started.elapsed().as_micros() as u64,
            "aggregated result tables"
        );
        let mut tables = tables.into_iter();
        let mut next = |id: TableId| {
            tables
                .next()
                .unwrap_or_else(|| ResultTable::empty(id, measure))
        };
        ResultTables {
            city: next(TableId::City),
            payment: next(TableId::Payment),
            gender_city: next(TableId::GenderCity),
            date: next(TableId::Date),
            product_city: next(TableId::ProductCity),
        }
    }

    fn group_table(id: TableId, records: &[&Record], measure: Measure) -> ResultTable {
        let dimensions = id.dimensions();
        let mut groups: IndexMap<Vec<KeyRef<'_>>, Accumulator> = IndexMap::new();
        for record in records {
            let key: Vec<KeyRef<'_>> = dimensions.iter().map(|d| record.key(*d)).collect();
            groups
                .entry(key)
                .or_insert_with(Accumulator::new)
                .push(measure.value(record));
        }
        if id == TableId::Date {
            groups.sort_keys();
        }
        let reduction = measure.reduction();
        let rows = groups
            .into_iter()
            .map(|(key, accumulator)| AggregatedRow {
                key: key.into_iter().map(KeyRef::to_owned_key).collect(),
                value: accumulator.finish(reduction),
            })
            .collect();
        ResultTable {
            id,
            dimensions: dimensions.to_vec(),
            measure,
            reduction,
            rows,
        }
    }
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sale(city: &str, payment: &str, day: u32, income: f64, rating: f64) -> Record {
        Record {
            city: city.to_string(),
            gender: if day % 2 == 0 { "Male" } else { "Female" }.to_string(),
            payment_method: payment.to_string(),
            product_line: "Health and beauty".to_string(),
            date: NaiveDate::from_ymd_opt(2019, 2, day).unwrap(),
            gross_income: income,
            rating,
        }
    }

    fn text(value: &str) -> KeyValue {
        KeyValue::Text(value.to_string())
    }

    #[test]
    fn date_table_is_chronological() {
        let dataset = Dataset::new(
            "sales",
            vec![
                sale("A", "Cash", 9, 1.0, 5.0),
                sale("A", "Cash", 2, 1.0, 5.0),
                sale("B", "Card", 5, 1.0, 5.0),
                sale("B", "Card", 2, 1.0, 5.0),
            ],
        );
        let tables = AggregationEngine::new()
            .compute(&dataset, &FilterState::new(["A", "B"], Measure::GrossIncome));
        let days: Vec<u32> = tables
            .date
            .rows
            .iter()
            .map(|row| chrono::Datelike::day(&row.key[0].as_date().unwrap()))
            .collect();
        assert_eq!(days, vec![2, 5, 9]);
        assert_eq!(tables.date.value_of(&[KeyValue::Date(
            NaiveDate::from_ymd_opt(2019, 2, 2).unwrap()
        )]), Some(2.0));
    }

    #[test]
    fn other_tables_keep_first_occurrence_order() {
        let dataset = Dataset::new(
            "sales",
            vec![
                sale("B", "Ewallet", 1, 1.0, 5.0),
                sale("A", "Cash", 2, 1.0, 5.0),
                sale("B", "Cash", 3, 1.0, 5.0),
            ],
        );
        let tables = AggregationEngine::new()
            .compute(&dataset, &FilterState::new(["A", "B"], Measure::GrossIncome));
        let cities: Vec<&KeyValue> = tables.city.rows.iter().map(|r| &r.key[0]).collect();
        assert_eq!(cities, vec![&text("B"), &text("A")]);
        let payments: Vec<&KeyValue> = tables.payment.rows.iter().map(|r| &r.key[0]).collect();
        assert_eq!(payments, vec![&text("Ewallet"), &text("Cash")]);
    }

    #[test]
    fn composite_keys_follow_dimension_order() {
        let dataset = Dataset::new("sales", vec![sale("A", "Cash", 2, 3.0, 5.0)]);
        let tables = AggregationEngine::new()
            .compute(&dataset, &FilterState::new(["A"], Measure::GrossIncome));
        assert_eq!(tables.gender_city.dimensions, vec![Dimension::Gender, Dimension::City]);
        assert_eq!(tables.gender_city.rows[0].key, vec![text("Male"), text("A")]);
        assert_eq!(
            tables.product_city.rows[0].key,
            vec![text("Health and beauty"), text("A")]
        );
    }

    #[test]
    fn rating_uses_mean() {
        let dataset = Dataset::new(
            "sales",
            vec![
                sale("A", "Cash", 1, 10.0, 4.0),
                sale("A", "Card", 2, 20.0, 8.0),
            ],
        );
        let tables = AggregationEngine::new()
            .compute(&dataset, &FilterState::new(["A"], Measure::Rating));
        assert_eq!(tables.city.reduction, Reduction::Mean);
        assert_eq!(tables.city.value_of(&[text("A")]), Some(6.0));
    }

    #[test]
    fn parallel_path_matches_sequential() {
        let records: Vec<Record> = (1..=28)
            .map(|day| sale(if day % 3 == 0 { "A" } else { "B" }, "Cash", day, day as f64, 7.0))
            .collect();
        let dataset = Dataset::new("sales", records);
        let filter = FilterState::new(["A", "B"], Measure::GrossIncome);
        let sequential = AggregationEngine::new().compute(&dataset, &filter);
        let parallel = AggregationEngine::new()
            .with_parallel_threshold(1)
            .compute(&dataset, &filter);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn single_value_mean_is_exact() {
        let mut accumulator = Accumulator::new();
        for _ in 0..7 {
            accumulator.push(9.1);
        }
        assert_eq!(accumulator.finish(Reduction::Mean), 9.1);
    }

    #[test]
    fn nan_only_group_mean_does_not_panic() {
        let dataset = Dataset::new(
            "sales",
            vec![sale("A", "Cash", 2, 1.0, 8.0), sale("B", "Card", 3, 1.0, f64::NAN)],
        );
        let tables = AggregationEngine::new()
            .compute(&dataset, &FilterState::new(["A", "B"], Measure::Rating));
        assert_eq!(tables.city.value_of(&[text("A")]), Some(8.0));
        assert!(tables.city.value_of(&[text("B")]).unwrap().is_nan());
    }
}
