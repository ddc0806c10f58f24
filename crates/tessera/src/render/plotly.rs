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

use crate::dataset::KeyValue;
use crate::view::{BarMode, ChartSpec, Orientation};
use serde_json::{json, Value};

/// Bootstrap "minty" palette, applied as colorway for themed views.
pub const MINTY_COLORWAY: [&str; 7] = [
    "#78c2ad", "#f3969a", "#6cc3d5", "#ffce67", "#ff7851", "#56cc9d", "#5a5a5a",
];

/// Converts one chart specification into a Plotly figure (`data` + `layout`).
/// Coloured views get one bar trace per colour value, named after it.
pub fn figure(spec: &ChartSpec) -> Value {
    let bars = spec.bars();
    let traces: Vec<Value> = if spec.color.is_some() {
        spec.series()
            .iter()
            .map(|series| {
                let (categories, values): (Vec<String>, Vec<f64>) = bars
                    .iter()
                    .filter(|bar| bar.series.as_ref() == Some(series))
                    .map(|bar| (bar.category.to_string(), bar.value))
                    .unzip();
                trace(spec, Some(series), categories, values)
            })
            .collect()
    } else {
        let (categories, values): (Vec<String>, Vec<f64>) = bars
            .iter()
            .map(|bar| (bar.category.to_string(), bar.value))
            .unzip();
        vec![trace(spec, None, categories, values)]
    };
    json!({
        "data": traces,
        "layout": layout(spec),
    })
}

fn trace(spec: &ChartSpec, series: Option<&KeyValue>, categories: Vec<String>, values: Vec<f64>) -> Value {
    let mut trace = match spec.orientation {
        Orientation::Vertical => json!({
            "type": "bar",
            "x": categories,
            "y": values,
            "orientation": "v",
        }),
        Orientation::Horizontal => json!({
            "type": "bar",
            "x": values,
            "y": categories,
            "orientation": "h",
        }),
    };
    if let Some(series) = series {
        trace["name"] = json!(series.to_string());
        trace["legendgroup"] = json!(series.to_string());
        trace["showlegend"] = json!(true);
    }
    trace
}

fn layout(spec: &ChartSpec) -> Value {
    let mut layout = json!({
        "title": { "text": spec.title },
        "margin": {
            "l": spec.layout.margin.l,
            "r": spec.layout.margin.r,
            "t": spec.layout.margin.t,
            "b": spec.layout.margin.b,
        },
        "height": spec.layout.height,
        "barmode": match spec.bar_mode {
            BarMode::Relative => "relative",
            BarMode::Group => "group",
        },
        "xaxis": { "title": { "text": spec.x.title } },
        "yaxis": { "title": { "text": spec.y.title } },
    });
    if let Some(template) = &spec.layout.template {
        layout["template"] = json!(template);
        if template == "minty" {
            layout["colorway"] = json!(MINTY_COLORWAY);
        }
    }
    if let Some(dimension) = spec.color {
        layout["legend"] = json!({ "title": { "text": dimension.column() } });
    }
    layout
}
