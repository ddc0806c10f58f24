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

use crate::dataset::{Dataset, Record};
use crate::error::{FilterError, FilterResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    #[default]
    GrossIncome,
    Rating,
}

/// How grouped measure values collapse into one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    Sum,
    Mean,
}

impl Measure {
    pub const ALL: [Measure; 2] = [Measure::GrossIncome, Measure::Rating];

    pub const fn reduction(self) -> Reduction {
        match self {
            Measure::GrossIncome => Reduction::Sum,
            Measure::Rating => Reduction::Mean,
        }
    }
    /// The UI token and source column header.
    pub const fn label(self) -> &'static str {
        match self {
            Measure::GrossIncome => "gross income",
            Measure::Rating => "Rating",
        }
    }
    pub fn value(self, record: &Record) -> f64 {
        match self {
            Measure::GrossIncome => record.gross_income,
            Measure::Rating => record.rating,
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Measure {
    type Err = FilterError;

    fn from_str(token: &str) -> FilterResult<Self> {
        let normalised = token.trim().to_ascii_lowercase().replace('_', " ");
        match normalised.as_str() {
            "gross income" => Ok(Measure::GrossIncome),
            "rating" => Ok(Measure::Rating),
            _ => Err(FilterError::InvalidMeasure {
                token: token.to_string(),
            }),
        }
    }
}

/// The user's current selection. Replaced wholesale on every UI event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub selected_cities: BTreeSet<String>,
    pub measure: Measure,
}

impl FilterState {
    pub fn new<I, S>(cities: I, measure: Measure) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected_cities: cities.into_iter().map(Into::into).collect(),
            measure,
        }
    }
    /// Start-up state: every city in the dataset, gross income.
    pub fn all_cities(dataset: &Dataset) -> Self {
        Self::new(dataset.cities().iter().cloned(), Measure::default())
    }
    /// Builds a state from raw UI values, rejecting unknown measure tokens.
    /// Cities absent from the dataset are kept; they simply match no record.
    pub fn from_tokens<I, S>(cities: I, measure_token: &str) -> FilterResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let measure = measure_token.parse()?;
        Ok(Self::new(cities, measure))
    }
    pub fn with_measure(&self, measure: Measure) -> Self {
        Self {
            selected_cities: self.selected_cities.clone(),
            measure,
        }
    }
    pub fn includes(&self, city: &str) -> bool {
        self.selected_cities.contains(city)
    }
    pub fn reduction(&self) -> Reduction {
        self.measure.reduction()
    }
}
