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

use chrono::NaiveDate;
use std::collections::BTreeSet;
use tessera::{
    AggregationEngine, Dataset, FilterState, KeyValue, Measure, Record, ResultTable, ViewBuilder,
};

fn sale(city: &str, payment: &str, income: f64) -> Record {
    Record {
        city: city.to_string(),
        gender: "Female".to_string(),
        payment_method: payment.to_string(),
        product_line: "Electronic accessories".to_string(),
        date: NaiveDate::from_ymd_opt(2019, 1, 15).unwrap(),
        gross_income: income,
        rating: 7.5,
    }
}

fn three_sales() -> Dataset {
    Dataset::new(
        "three",
        vec![sale("A", "Cash", 10.0), sale("A", "Card", 20.0), sale("B", "Cash", 5.0)],
    )
}

fn rows(table: &ResultTable) -> Vec<(String, f64)> {
    table
        .rows
        .iter()
        .map(|row| (row.key[0].to_string(), row.value))
        .collect()
}

fn pairs(values: &[(&str, f64)]) -> Vec<(String, f64)> {
    values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn test_both_cities_gross_income() {
    let tables = AggregationEngine::new().compute(
        &three_sales(),
        &FilterState::new(["A", "B"], Measure::GrossIncome),
    );
    assert_eq!(rows(&tables.city), pairs(&[("A", 30.0), ("B", 5.0)]));
    assert_eq!(rows(&tables.payment), pairs(&[("Cash", 15.0), ("Card", 20.0)]));
}

#[test]
fn test_single_city_gross_income() {
    let tables =
        AggregationEngine::new().compute(&three_sales(), &FilterState::new(["A"], Measure::GrossIncome));
    assert_eq!(rows(&tables.city), pairs(&[("A", 30.0)]));
    assert_eq!(rows(&tables.payment), pairs(&[("Cash", 10.0), ("Card", 20.0)]));
}

#[test]
fn test_empty_selection_yields_five_empty_charts() {
    let dataset = three_sales();
    let filter = FilterState::new(Vec::<String>::new(), Measure::GrossIncome);
    let tables = AggregationEngine::new().compute(&dataset, &filter);
    assert!(tables.is_empty());
    let charts = ViewBuilder::default().build(&tables, filter.measure).unwrap();
    assert_eq!(charts.len(), 5);
    assert!(charts.iter().all(|spec| spec.bars().is_empty()));
}

#[test]
fn test_disjoint_selection_is_not_an_error() {
    let dataset = three_sales();
    let filter = FilterState::from_tokens(["Atlantis"], "Rating").unwrap();
    let tables = AggregationEngine::new().compute(&dataset, &filter);
    assert!(tables.is_empty());
    assert!(ViewBuilder::default().build(&tables, filter.measure).is_ok());
}

#[test]
fn test_full_selection_covers_every_distinct_key() {
    let dataset = three_sales();
    let tables = AggregationEngine::new().compute(&dataset, &FilterState::all_cities(&dataset));
    let keys: BTreeSet<KeyValue> = tables.city.rows.iter().map(|r| r.key[0].clone()).collect();
    let cities: BTreeSet<KeyValue> = dataset
        .distinct_values(tessera::Dimension::City)
        .into_iter()
        .collect();
    assert_eq!(keys, cities);
    assert_eq!(tables.gender_city.len(), 2);
    assert_eq!(tables.product_city.len(), 2);
    assert_eq!(tables.date.len(), 1);
}

#[test]
fn test_rating_switch_keeps_keys_and_averages() {
    let mut records = vec![sale("A", "Cash", 10.0), sale("A", "Card", 20.0)];
    records[0].rating = 4.0;
    records[1].rating = 9.0;
    let dataset = Dataset::new("ratings", records);
    let engine = AggregationEngine::new();
    let income = engine.compute(&dataset, &FilterState::new(["A"], Measure::GrossIncome));
    let rating = engine.compute(&dataset, &FilterState::new(["A"], Measure::Rating));
    assert_eq!(rows(&rating.city), pairs(&[("A", 6.5)]));
    for (a, b) in income.iter().zip(rating.iter()) {
        let left: Vec<_> = a.rows.iter().map(|r| &r.key).collect();
        let right: Vec<_> = b.rows.iter().map(|r| &r.key).collect();
        assert_eq!(left, right);
    }
}

#[test]
fn test_chart_titles_follow_measure() {
    let dataset = three_sales();
    let filter = FilterState::all_cities(&dataset).with_measure(Measure::Rating);
    let tables = AggregationEngine::new().compute(&dataset, &filter);
    let charts = ViewBuilder::default().build(&tables, filter.measure).unwrap();
    let city = charts.get("city-fig").unwrap();
    assert_eq!(city.title, "Rating by city");
    assert_eq!(city.y.title, "Rating");
    assert_eq!(city.x.title, "City");
}
