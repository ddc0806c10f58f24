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

//! Declarative chart specifications built from result tables.
//!
//! Every view is described by one row of [`VIEW_RULES`]; [`ViewBuilder`] walks
//! the rule table instead of carrying one code path per chart. A rule names the
//! table it consumes and the grouping it expects, and the builder refuses to
//! bind a table whose shape does not match.

use crate::aggregation::{ResultTable, ResultTables, TableId};
use crate::config::{LayoutConfig, Margin};
use crate::dataset::{Dimension, KeyValue};
use crate::error::{ViewError, ViewResult};
use crate::filter::Measure;
use serde::{Deserialize, Serialize};

/// What an axis is bound to: a grouping column or the active measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "dimension")]
pub enum Field {
    Dimension(Dimension),
    Measure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// `Relative` stacks bars sharing a category, `Group` places them side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarMode {
    Relative,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightClass {
    Standard,
    Tall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRule {
    pub id: &'static str,
    pub caption: &'static str,
    pub source: TableId,
    pub grouping: &'static [Dimension],
    pub x: Field,
    pub y: Field,
    pub color: Option<Dimension>,
    pub orientation: Orientation,
    pub bar_mode: BarMode,
    pub height: HeightClass,
    pub themed: bool,
}

pub const VIEW_RULES: [ViewRule; 5] = [
    ViewRule {
        id: "city-fig",
        caption: "by city",
        source: TableId::City,
        grouping: &[Dimension::City],
        x: Field::Dimension(Dimension::City),
        y: Field::Measure,
        color: Some(Dimension::City),
        orientation: Orientation::Vertical,
        bar_mode: BarMode::Relative,
        height: HeightClass::Standard,
        themed: true,
    },
    ViewRule {
        id: "paym-fig",
        caption: "by payment",
        source: TableId::Payment,
        grouping: &[Dimension::Payment],
        x: Field::Measure,
        y: Field::Dimension(Dimension::Payment),
        color: None,
        orientation: Orientation::Horizontal,
        bar_mode: BarMode::Relative,
        height: HeightClass::Standard,
        themed: true,
    },
    ViewRule {
        id: "gender-fig",
        caption: "by gender and city",
        source: TableId::GenderCity,
        grouping: &[Dimension::Gender, Dimension::City],
        x: Field::Dimension(Dimension::Gender),
        y: Field::Measure,
        color: Some(Dimension::City),
        orientation: Orientation::Vertical,
        bar_mode: BarMode::Group,
        height: HeightClass::Standard,
        themed: true,
    },
    ViewRule {
        id: "income-per-date-fig",
        caption: "by date",
        source: TableId::Date,
        grouping: &[Dimension::Date],
        x: Field::Dimension(Dimension::Date),
        y: Field::Measure,
        color: None,
        orientation: Orientation::Vertical,
        bar_mode: BarMode::Relative,
        height: HeightClass::Standard,
        themed: true,
    },
    ViewRule {
        id: "income-per-product-fig",
        caption: "by product line and city",
        source: TableId::ProductCity,
        grouping: &[Dimension::ProductLine, Dimension::City],
        x: Field::Measure,
        y: Field::Dimension(Dimension::ProductLine),
        color: Some(Dimension::City),
        orientation: Orientation::Horizontal,
        bar_mode: BarMode::Group,
        height: HeightClass::Tall,
        themed: false,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub margin: Margin,
    pub height: u32,
    pub template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisBinding {
    pub field: Field,
    pub title: String,
}

/// One bar ready to draw: category axis label, colour series and length.
#[derive(Debug, Clone, PartialEq)]
pub struct BarDatum {
    pub category: KeyValue,
    pub series: Option<KeyValue>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub orientation: Orientation,
    pub bar_mode: BarMode,
    pub x: AxisBinding,
    pub y: AxisBinding,
    pub color: Option<Dimension>,
    pub layout: Layout,
    pub data: ResultTable,
}

impl ChartSpec {
    /// The axis carrying categories; the other one carries the measure.
    pub fn category_axis(&self) -> &AxisBinding {
        match self.orientation {
            Orientation::Vertical => &self.x,
            Orientation::Horizontal => &self.y,
        }
    }
    pub fn value_axis(&self) -> &AxisBinding {
        match self.orientation {
            Orientation::Vertical => &self.y,
            Orientation::Horizontal => &self.x,
        }
    }
    pub fn bars(&self) -> Vec<BarDatum> {
        let category_index = match self.category_axis().field {
            Field::Dimension(dimension) => self.data.key_index(dimension),
            Field::Measure => None,
        }
        .unwrap_or(0);
        let series_index = self.color.and_then(|dimension| self.data.key_index(dimension));
        self.data
            .rows
            .iter()
            .filter_map(|row| {
                Some(BarDatum {
                    category: row.key.get(category_index)?.clone(),
                    series: series_index.and_then(|index| row.key.get(index).cloned()),
                    value: row.value,
                })
            })
            .collect()
    }
    /// Distinct colour values in first-appearance order.
    pub fn series(&self) -> Vec<KeyValue> {
        let mut series: Vec<KeyValue> = Vec::new();
        for bar in self.bars() {
            if let Some(value) = bar.series {
                if !series.contains(&value) {
                    series.push(value);
                }
            }
        }
        series
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The five chart specifications of one recompute, in dashboard order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSet(Vec<ChartSpec>);

impl ChartSet {
    pub fn iter(&self) -> std::slice::Iter<'_, ChartSpec> {
        self.0.iter()
    }
    pub fn get(&self, id: &str) -> Option<&ChartSpec> {
        self.0.iter().find(|spec| spec.id == id)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a ChartSet {
    type Item = &'a ChartSpec;
    type IntoIter = std::slice::Iter<'a, ChartSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub struct ViewBuilder {
    layout: LayoutConfig,
    rules: [ViewRule; 5],
}

impl ViewBuilder {
    pub fn new(layout: &LayoutConfig) -> Self {
        Self {
            layout: layout.clone(),
            rules: VIEW_RULES,
        }
    }
    pub fn with_rules(mut self, rules: [ViewRule; 5]) -> Self {
        self.rules = rules;
        self
    }
    pub fn rules(&self) -> &[ViewRule; 5] {
        &self.rules
    }

    pub fn build(&self, tables: &ResultTables, measure: Measure) -> ViewResult<ChartSet> {
        self.rules
            .iter()
            .map(|rule| self.build_one(rule, tables.get(rule.source), measure))
            .collect::<ViewResult<Vec<_>>>()
            .map(ChartSet)
    }

    fn build_one(&self, rule: &ViewRule, table: &ResultTable, measure: Measure) -> ViewResult<ChartSpec> {
        check_shape(rule, table)?;
        let layout = Layout {
            margin: self.layout.margin,
            height: match rule.height {
                HeightClass::Standard => self.layout.height,
                HeightClass::Tall => self.layout.tall_height,
            },
            template: if rule.themed {
                self.layout.theme.clone()
            } else {
                None
            },
        };
        Ok(ChartSpec {
            id: rule.id.to_string(),
            title: format!("{} {}", measure.label(), rule.caption),
            kind: ChartKind::Bar,
            orientation: rule.orientation,
            bar_mode: rule.bar_mode,
            x: axis(rule.x, measure),
            y: axis(rule.y, measure),
            color: rule.color,
            layout,
            data: table.clone(),
        })
    }
}

impl Default for ViewBuilder {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

fn axis(field: Field, measure: Measure) -> AxisBinding {
    let title = match field {
        Field::Dimension(dimension) => dimension.column().to_string(),
        Field::Measure => measure.label().to_string(),
    };
    AxisBinding { field, title }
}

fn check_shape(rule: &ViewRule, table: &ResultTable) -> ViewResult<()> {
    if table.dimensions.as_slice() != rule.grouping {
        return Err(ViewError::malformed(
            rule.id,
            format!(
                "expected grouping {:?}, table '{}' is grouped by {:?}",
                rule.grouping, table.id, table.dimensions
            ),
        ));
    }
    let bound = [rule.x, rule.y]
        .into_iter()
        .filter_map(|field| match field {
            Field::Dimension(dimension) => Some(dimension),
            Field::Measure => None,
        })
        .chain(rule.color);
    for dimension in bound {
        if !rule.grouping.contains(&dimension) {
            return Err(ViewError::malformed(
                rule.id,
                format!("{dimension} is bound to an axis but not part of the grouping"),
            ));
        }
    }
    let arity = rule.grouping.len();
    if let Some(row) = table.rows.iter().find(|row| row.key.len() != arity) {
        return Err(ViewError::malformed(
            rule.id,
            format!("expected {arity}-part keys, found a row with {}", row.key.len()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::AggregatedRow;

    fn text(value: &str) -> KeyValue {
        KeyValue::Text(value.to_string())
    }

    fn empty_tables(measure: Measure) -> ResultTables {
        ResultTables {
            city: ResultTable::empty(TableId::City, measure),
            payment: ResultTable::empty(TableId::Payment, measure),
            gender_city: ResultTable::empty(TableId::GenderCity, measure),
            date: ResultTable::empty(TableId::Date, measure),
            product_city: ResultTable::empty(TableId::ProductCity, measure),
        }
    }

    #[test]
    fn builds_five_views_in_dashboard_order() {
        let charts = ViewBuilder::default()
            .build(&empty_tables(Measure::GrossIncome), Measure::GrossIncome)
            .unwrap();
        let ids: Vec<&str> = charts.iter().map(|spec| spec.id.as_str()).collect();
        assert_eq!(
            ids,
            ["city-fig", "paym-fig", "gender-fig", "income-per-date-fig", "income-per-product-fig"]
        );
        assert!(charts.iter().all(ChartSpec::is_empty));
    }

    #[test]
    fn layout_follows_rule_table() {
        let charts = ViewBuilder::default()
            .build(&empty_tables(Measure::Rating), Measure::Rating)
            .unwrap();
        for spec in charts.iter().take(4) {
            assert_eq!(spec.layout.height, 200);
            assert_eq!(spec.layout.template.as_deref(), Some("minty"));
        }
        let product = charts.get("income-per-product-fig").unwrap();
        assert_eq!(product.layout.height, 500);
        assert_eq!(product.layout.template, None);
        assert_eq!(product.layout.margin, Margin { l: 0, r: 0, t: 20, b: 20 });
        assert_eq!(product.orientation, Orientation::Horizontal);
        assert_eq!(product.bar_mode, BarMode::Group);
        assert_eq!(product.x.title, "Rating");
        assert_eq!(product.y.title, "Product line");
    }

    #[test]
    fn payment_view_is_horizontal_with_measure_on_x() {
        let charts = ViewBuilder::default()
            .build(&empty_tables(Measure::GrossIncome), Measure::GrossIncome)
            .unwrap();
        let payment = charts.get("paym-fig").unwrap();
        assert_eq!(payment.x.field, Field::Measure);
        assert_eq!(payment.x.title, "gross income");
        assert_eq!(payment.category_axis().field, Field::Dimension(Dimension::Payment));
        assert_eq!(payment.color, None);
    }

    #[test]
    fn bars_split_composite_keys() {
        let mut tables = empty_tables(Measure::GrossIncome);
        tables.gender_city.rows = vec![
            AggregatedRow { key: vec![text("Female"), text("A")], value: 3.0 },
            AggregatedRow { key: vec![text("Male"), text("B")], value: 4.0 },
        ];
        let charts = ViewBuilder::default()
            .build(&tables, Measure::GrossIncome)
            .unwrap();
        let gender = charts.get("gender-fig").unwrap();
        let bars = gender.bars();
        assert_eq!(bars[0].category, text("Female"));
        assert_eq!(bars[0].series, Some(text("A")));
        assert_eq!(gender.series(), vec![text("A"), text("B")]);
    }

    #[test]
    fn wrong_key_arity_is_malformed() {
        let mut tables = empty_tables(Measure::GrossIncome);
        tables.city.rows = vec![AggregatedRow {
            key: vec![text("A"), text("extra")],
            value: 1.0,
        }];
        let err = ViewBuilder::default()
            .build(&tables, Measure::GrossIncome)
            .unwrap_err();
        assert!(matches!(err, ViewError::MalformedTable { ref view, .. } if view == "city-fig"));
    }

    #[test]
    fn rule_bound_to_wrong_table_is_malformed() {
        let mut rules = VIEW_RULES;
        rules[1].source = TableId::GenderCity;
        let err = ViewBuilder::default()
            .with_rules(rules)
            .build(&empty_tables(Measure::GrossIncome), Measure::GrossIncome)
            .unwrap_err();
        assert!(matches!(err, ViewError::MalformedTable { ref view, .. } if view == "paym-fig"));
    }
}
