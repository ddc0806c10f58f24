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

//! Serialised forms of a publication: Plotly figure JSON and an HTML page.

pub mod html;
pub mod plotly;

use crate::controller::Publication;
use crate::error::{SerialisationError, SerialisationResult};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Html,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = SerialisationError;

    fn from_str(value: &str) -> SerialisationResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "html" | "htm" => Ok(ExportFormat::Html),
            _ => Err(SerialisationError::UnsupportedExportFormat {
                format: value.to_string(),
            }),
        }
    }
}

/// Figure JSON for every chart, keyed by chart id, plus publication metadata.
pub fn publication_json(publication: &Publication) -> Value {
    let figures: Map<String, Value> = publication
        .charts
        .iter()
        .map(|spec| (spec.id.clone(), plotly::figure(spec)))
        .collect();
    json!({
        "generation": publication.generation,
        "published_at": publication.published_at,
        "filter": publication.filter,
        "figures": figures,
    })
}

pub fn render(publication: &Publication, format: ExportFormat) -> SerialisationResult<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&publication_json(publication))?),
        ExportFormat::Html => html::dashboard_page(publication),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_export_formats() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("htm".parse::<ExportFormat>().unwrap(), ExportFormat::Html);
        let err = "pdf".parse::<ExportFormat>().unwrap_err();
        assert!(err.to_string().contains("pdf"));
    }
}
