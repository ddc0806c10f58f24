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

//! Bar charts painted straight from a `ChartSpec`.

use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, Vec2};
use tessera::render::plotly::MINTY_COLORWAY;
use tessera::view::{BarMode, ChartSpec, Orientation};
use tessera::KeyValue;

const DEFAULT_PALETTE: [Color32; 6] = [
    Color32::from_rgb(99, 110, 250),
    Color32::from_rgb(239, 85, 59),
    Color32::from_rgb(0, 204, 150),
    Color32::from_rgb(171, 99, 250),
    Color32::from_rgb(255, 161, 90),
    Color32::from_rgb(25, 211, 243),
];

/// Minimum spacing between category labels, in points.
const LABEL_SPACING: f32 = 56.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBar {
    pub rect: Rect,
    pub category: String,
    pub series: Option<String>,
    pub value: f64,
    pub colour_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartGeometry {
    pub bars: Vec<PlacedBar>,
    /// Category label and its centre along the category axis.
    pub categories: Vec<(String, f32)>,
    pub max_value: f64,
}

pub fn layout_bars(spec: &ChartSpec, plot: Rect) -> ChartGeometry {
    let bars = spec.bars();
    let mut categories: Vec<&KeyValue> = Vec::new();
    for bar in &bars {
        if !categories.contains(&&bar.category) {
            categories.push(&bar.category);
        }
    }
    let series = spec.series();
    let slots = match spec.bar_mode {
        BarMode::Group => series.len().max(1),
        BarMode::Relative => 1,
    };

    let mut stacked = vec![0.0f64; categories.len()];
    for bar in &bars {
        if let Some(index) = categories.iter().position(|c| *c == &bar.category) {
            stacked[index] += bar.value.max(0.0);
        }
    }
    let max_value = match spec.bar_mode {
        BarMode::Relative => stacked.iter().copied().fold(0.0, f64::max),
        BarMode::Group => bars.iter().map(|bar| bar.value).fold(0.0, f64::max),
    };
    let scale = if max_value > 0.0 { max_value } else { 1.0 };

    let (category_extent, value_extent) = match spec.orientation {
        Orientation::Vertical => (plot.width(), plot.height()),
        Orientation::Horizontal => (plot.height(), plot.width()),
    };
    let band = category_extent / categories.len().max(1) as f32;
    let slot = band * 0.8 / slots as f32;

    let mut bases = vec![0.0f64; categories.len()];
    let placed = bars
        .iter()
        .filter_map(|bar| {
            let category_index = categories.iter().position(|c| *c == &bar.category)?;
            let series_index = bar
                .series
                .as_ref()
                .and_then(|value| series.iter().position(|s| s == value))
                .unwrap_or(0);
            let slot_index = match spec.bar_mode {
                BarMode::Group => series_index,
                BarMode::Relative => 0,
            };
            let base = match spec.bar_mode {
                BarMode::Group => 0.0,
                BarMode::Relative => bases[category_index],
            };
            let value = bar.value.max(0.0);
            if spec.bar_mode == BarMode::Relative {
                bases[category_index] += value;
            }
            let start = band * category_index as f32 + band * 0.1 + slot * slot_index as f32;
            let from = (base / scale) as f32 * value_extent;
            let to = ((base + value) / scale) as f32 * value_extent;
            let rect = match spec.orientation {
                Orientation::Vertical => Rect::from_min_max(
                    Pos2::new(plot.left() + start, plot.bottom() - to),
                    Pos2::new(plot.left() + start + slot, plot.bottom() - from),
                ),
                Orientation::Horizontal => Rect::from_min_max(
                    Pos2::new(plot.left() + from, plot.top() + start),
                    Pos2::new(plot.left() + to, plot.top() + start + slot),
                ),
            };
            Some(PlacedBar {
                rect,
                category: bar.category.to_string(),
                series: bar.series.as_ref().map(ToString::to_string),
                value: bar.value,
                colour_index: if spec.color.is_some() { series_index } else { 0 },
            })
        })
        .collect();

    ChartGeometry {
        bars: placed,
        categories: categories
            .iter()
            .enumerate()
            .map(|(index, category)| (category.to_string(), band * (index as f32 + 0.5)))
            .collect(),
        max_value,
    }
}

fn palette(spec: &ChartSpec) -> Vec<Color32> {
    match spec.layout.template.as_deref() {
        Some("minty") => MINTY_COLORWAY
            .iter()
            .filter_map(|hex| Color32::from_hex(hex).ok())
            .collect(),
        _ => DEFAULT_PALETTE.to_vec(),
    }
}

pub fn draw_chart(ui: &mut Ui, spec: &ChartSpec) {
    ui.label(egui::RichText::new(&spec.title).strong());
    let height = spec.layout.height as f32;
    let (rect, response) =
        ui.allocate_exact_size(Vec2::new(ui.available_width(), height), Sense::hover());
    if !ui.is_rect_visible(rect) {
        return;
    }
    let painter = ui.painter_at(rect);
    let text_colour = ui.visuals().text_color();
    let axis_stroke = Stroke::new(1.0, ui.visuals().weak_text_color());
    let font = FontId::proportional(10.0);

    let margin = spec.layout.margin;
    let gutter = match spec.orientation {
        Orientation::Vertical => Vec2::new(44.0, 16.0),
        Orientation::Horizontal => Vec2::new(140.0, 14.0),
    };
    let plot = Rect::from_min_max(
        Pos2::new(rect.left() + margin.l as f32 + gutter.x, rect.top() + margin.t as f32),
        Pos2::new(
            rect.right() - margin.r as f32 - 8.0,
            rect.bottom() - margin.b as f32 - gutter.y,
        ),
    );
    painter.rect_filled(rect, 4.0, ui.visuals().extreme_bg_color);
    if plot.width() <= 0.0 || plot.height() <= 0.0 {
        return;
    }
    if spec.is_empty() {
        painter.text(
            plot.center(),
            Align2::CENTER_CENTER,
            "No data for the selected cities",
            FontId::proportional(12.0),
            ui.visuals().weak_text_color(),
        );
        return;
    }

    let colours = palette(spec);
    let geometry = layout_bars(spec, plot);
    for bar in &geometry.bars {
        painter.rect_filled(bar.rect, 0.0, colours[bar.colour_index % colours.len()]);
    }
    painter.line_segment([plot.left_bottom(), plot.right_bottom()], axis_stroke);
    painter.line_segment([plot.left_top(), plot.left_bottom()], axis_stroke);

    let (category_extent, label_every) = match spec.orientation {
        Orientation::Vertical => (plot.width(), LABEL_SPACING),
        Orientation::Horizontal => (plot.height(), 12.0),
    };
    let step = ((geometry.categories.len() as f32 * label_every / category_extent).ceil() as usize).max(1);
    for (label, centre) in geometry.categories.iter().step_by(step) {
        match spec.orientation {
            Orientation::Vertical => painter.text(
                Pos2::new(plot.left() + centre, plot.bottom() + 2.0),
                Align2::CENTER_TOP,
                label,
                font.clone(),
                text_colour,
            ),
            Orientation::Horizontal => painter.text(
                Pos2::new(plot.left() - 4.0, plot.top() + centre),
                Align2::RIGHT_CENTER,
                label,
                font.clone(),
                text_colour,
            ),
        };
    }
    let max_label = format!("{:.1}", geometry.max_value);
    match spec.orientation {
        Orientation::Vertical => painter.text(
            Pos2::new(plot.left() - 4.0, plot.top()),
            Align2::RIGHT_TOP,
            max_label,
            font.clone(),
            text_colour,
        ),
        Orientation::Horizontal => painter.text(
            Pos2::new(plot.right(), plot.bottom() + 2.0),
            Align2::RIGHT_TOP,
            max_label,
            font.clone(),
            text_colour,
        ),
    };

    if spec.color.is_some() {
        let mut cursor = Pos2::new(plot.right() - 4.0, plot.top() + 2.0);
        for (index, series) in spec.series().iter().enumerate().rev() {
            let galley = painter.layout_no_wrap(series.to_string(), font.clone(), text_colour);
            cursor.x -= galley.size().x;
            painter.galley(cursor, galley, text_colour);
            cursor.x -= 12.0;
            painter.rect_filled(
                Rect::from_min_size(cursor + Vec2::new(0.0, 2.0), Vec2::splat(8.0)),
                1.0,
                colours[index % colours.len()],
            );
            cursor.x -= 8.0;
        }
    }

    if let Some(pointer) = response.hover_pos() {
        if let Some(bar) = geometry.bars.iter().find(|bar| bar.rect.contains(pointer)) {
            let text = match &bar.series {
                Some(series) => format!("{} / {}: {:.2}", bar.category, series, bar.value),
                None => format!("{}: {:.2}", bar.category, bar.value),
            };
            response.on_hover_text(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera::aggregation::{AggregatedRow, ResultTable, ResultTables, TableId};
    use tessera::{ChartSet, Measure, ViewBuilder};

    fn text(value: &str) -> KeyValue {
        KeyValue::Text(value.to_string())
    }

    fn charts() -> ChartSet {
        let measure = Measure::GrossIncome;
        let mut tables = ResultTables {
            city: ResultTable::empty(TableId::City, measure),
            payment: ResultTable::empty(TableId::Payment, measure),
            gender_city: ResultTable::empty(TableId::GenderCity, measure),
            date: ResultTable::empty(TableId::Date, measure),
            product_city: ResultTable::empty(TableId::ProductCity, measure),
        };
        tables.city.rows = vec![
            AggregatedRow { key: vec![text("A")], value: 30.0 },
            AggregatedRow { key: vec![text("B")], value: 15.0 },
        ];
        tables.gender_city.rows = vec![
            AggregatedRow { key: vec![text("Female"), text("A")], value: 10.0 },
            AggregatedRow { key: vec![text("Female"), text("B")], value: 5.0 },
            AggregatedRow { key: vec![text("Male"), text("A")], value: 20.0 },
        ];
        tables.payment.rows = vec![AggregatedRow { key: vec![text("Cash")], value: 8.0 }];
        ViewBuilder::default().build(&tables, measure).unwrap()
    }

    fn plot() -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(200.0, 100.0))
    }

    #[test]
    fn vertical_bars_scale_to_tallest() {
        let charts = charts();
        let geometry = layout_bars(charts.get("city-fig").unwrap(), plot());
        assert_eq!(geometry.max_value, 30.0);
        assert_eq!(geometry.bars[0].rect.height(), 100.0);
        assert_eq!(geometry.bars[1].rect.height(), 50.0);
        assert_eq!(geometry.bars[0].rect.bottom(), 100.0);
        assert_ne!(geometry.bars[0].colour_index, geometry.bars[1].colour_index);
    }

    #[test]
    fn grouped_bars_share_a_category_band() {
        let charts = charts();
        let geometry = layout_bars(charts.get("gender-fig").unwrap(), plot());
        assert_eq!(geometry.categories.len(), 2);
        let female_a = &geometry.bars[0].rect;
        let female_b = &geometry.bars[1].rect;
        assert!(female_a.right() <= female_b.left());
        assert!(female_b.right() <= 100.0);
        assert_eq!(geometry.bars[2].series.as_deref(), Some("A"));
    }

    #[test]
    fn horizontal_bars_grow_rightwards() {
        let charts = charts();
        let geometry = layout_bars(charts.get("paym-fig").unwrap(), plot());
        let bar = &geometry.bars[0].rect;
        assert_eq!(bar.left(), 0.0);
        assert_eq!(bar.width(), 200.0);
    }
}
