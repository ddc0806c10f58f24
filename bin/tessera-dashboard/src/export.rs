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

use crate::setup::report;
use anyhow::Context;
use std::path::Path;
use tessera::render::{self, ExportFormat};
use tessera::{Dashboard, DatasetSummary, RecomputeOutcome, TesseraError};
use tracing::info;

pub fn run_export(
    dashboard: &Dashboard,
    cities: Option<Vec<String>>,
    measure: &str,
    format: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let format: ExportFormat = format.parse().map_err(|err| report(TesseraError::Serialisation(err)))?;
    let controller = dashboard.controller().map_err(report)?;
    let cities = selected_cities(cities, dashboard.dataset().cities());
    let outcome = controller
        .submit_tokens(cities, measure)
        .map_err(|err| report(err.into()))?;
    if let RecomputeOutcome::Retained { error, .. } = outcome {
        return Err(report(error.into()));
    }
    let publication = controller
        .latest()
        .context("controller has not published any charts")?;
    let rendered = render::render(&publication, format).map_err(|err| report(err.into()))?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), %format, generation = publication.generation, "exported charts");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Omitted `--cities` selects every city; blank entries are dropped, so
/// `--cities ""` selects none.
fn selected_cities(requested: Option<Vec<String>>, all: &[String]) -> Vec<String> {
    match requested {
        None => all.to_vec(),
        Some(cities) => cities.into_iter().filter(|city| !city.is_empty()).collect(),
    }
}

pub fn print_summary(dashboard: &Dashboard, json: bool) -> anyhow::Result<()> {
    let summary = dashboard.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary_text(&summary));
    }
    Ok(())
}

fn summary_text(summary: &DatasetSummary) -> String {
    let range = |low: Option<String>, high: Option<String>| match (low, high) {
        (Some(low), Some(high)) => format!("{low} to {high}"),
        _ => "n/a".to_string(),
    };
    format!(
        "Dataset: {}\nRows: {}\nCities: {}\nDates: {}\nRating: {}\nTotal gross income: {:.2}\n",
        summary.name,
        summary.row_count,
        summary.cities.join(", "),
        range(
            summary.first_date.map(|d| d.to_string()),
            summary.last_date.map(|d| d.to_string())
        ),
        range(
            summary.min_rating.map(|r| format!("{r:.1}")),
            summary.max_rating.map(|r| format!("{r:.1}"))
        ),
        summary.total_gross_income,
    )
}
