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

use super::plotly::figure;
use crate::controller::Publication;
use crate::error::SerialisationResult;
use serde_json::{Map, Value};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Dashboard page layout: three small charts, then the date and product charts.
const ROWS: [&[&str]; 3] = [
    &["city-fig", "gender-fig", "paym-fig"],
    &["income-per-date-fig"],
    &["income-per-product-fig"],
];

/// Renders a standalone page showing every chart of `publication`.
pub fn dashboard_page(publication: &Publication) -> SerialisationResult<String> {
    let figures: Map<String, Value> = publication
        .charts
        .iter()
        .map(|spec| (spec.id.clone(), figure(spec)))
        .collect();
    let figures_json = script_safe(&serde_json::to_string(&Value::Object(figures))?);

    let rows_html: String = ROWS
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|id| format!(r#"<div class="chart" id="{id}"></div>"#))
                .collect();
            format!("<div class=\"row cols-{}\">{cells}</div>\n", row.len())
        })
        .collect();
    let cities = publication
        .filter
        .selected_cities
        .iter()
        .map(|city| escape_text(city))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Supermarket sales</title>
    <script src="{PLOTLY_CDN}"></script>
    <style>
        body {{ font-family: system-ui, -apple-system, sans-serif; margin: 0; padding: 20px; background: #f8f9fa; }}
        .filters {{ color: #5a5a5a; margin-bottom: 20px; }}
        .row {{ display: grid; gap: 12px; margin-bottom: 12px; }}
        .row.cols-3 {{ grid-template-columns: 1fr 1fr 1fr; }}
        .row.cols-1 {{ grid-template-columns: 1fr; }}
        .chart {{ background: white; border-radius: 6px; }}
    </style>
</head>
<body>
    <div class="filters">
        <strong>Cities:</strong> {cities}<br>
        <strong>Variable of analysis:</strong> {measure}<br>
        <small>generation {generation}, {published_at}</small>
    </div>
{rows_html}
    <script>
        const figures = {figures_json};
        for (const [id, fig] of Object.entries(figures)) {{
            delete fig.layout.template;
            Plotly.newPlot(id, fig.data, fig.layout, {{ displayModeBar: false }});
        }}
    </script>
</body>
</html>"#,
        measure = escape_text(publication.filter.measure.label()),
        generation = publication.generation,
        published_at = publication.published_at.format("%Y-%m-%d %H:%M:%S UTC"),
    ))
}

/// Keeps embedded JSON from closing the surrounding script element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::AggregationEngine;
    use crate::dataset::{Dataset, Record};
    use crate::filter::{FilterState, Measure};
    use crate::view::ViewBuilder;
    use chrono::{NaiveDate, Utc};

    fn publication(city: &str) -> Publication {
        let dataset = Dataset::new(
            "sales",
            vec![Record {
                city: city.to_string(),
                gender: "Male".to_string(),
                payment_method: "Cash".to_string(),
                product_line: "Home and lifestyle".to_string(),
                date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
                gross_income: 4.0,
                rating: 7.0,
            }],
        );
        let filter = FilterState::all_cities(&dataset);
        let tables = AggregationEngine::new().compute(&dataset, &filter);
        Publication {
            generation: 3,
            charts: ViewBuilder::default().build(&tables, Measure::GrossIncome).unwrap(),
            filter,
            published_at: Utc::now(),
        }
    }

    #[test]
    fn page_has_a_container_per_chart() {
        let page = dashboard_page(&publication("Yangon")).unwrap();
        for id in ROWS.iter().flat_map(|row| row.iter()) {
            assert!(page.contains(&format!(r#"id="{id}""#)), "missing {id}");
        }
        assert!(page.contains("generation 3"));
        assert!(page.contains(PLOTLY_CDN));
    }

    #[test]
    fn embedded_values_cannot_break_out_of_script() {
        let page = dashboard_page(&publication("</script><b>x")).unwrap();
        assert!(!page.contains("</script><b>"));
        assert!(page.contains("&lt;/script&gt;&lt;b&gt;x"));
    }
}
