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

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data: DataConfig,
    pub layout: LayoutConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
    /// Tried in order; the first format that parses wins.
    pub date_formats: Vec<String>,
    pub rating_min: f64,
    pub rating_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub t: u32,
    pub b: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub margin: Margin,
    pub height: u32,
    /// Height of the product line view, which carries the most categories.
    pub tall_height: u32,
    pub theme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub parallel_threshold: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/supermarket_sales.csv"),
            date_formats: vec![
                "%m/%d/%Y".to_string(),
                "%Y-%m-%d".to_string(),
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%d/%m/%Y".to_string(),
                "%Y%m%d".to_string(),
            ],
            rating_min: 0.0,
            rating_max: 10.0,
        }
    }
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            l: 0,
            r: 0,
            t: 20,
            b: 20,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: Margin::default(),
            height: 200,
            tall_height: 500,
            theme: Some("minty".to_string()),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 10_000,
        }
    }
}

impl DashboardConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigFileError {
                path: path.to_path_buf(),
                source,
            })?;
        let mut config = Self::from_yaml_str(&content)?;
        if config.data.path.is_relative() {
            if let Some(parent) = path.parent() {
                config.data.path = parent.join(&config.data.path);
            }
        }
        Ok(config)
    }
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> ConfigResult<()> {
        if self.data.date_formats.is_empty() {
            return Err(invalid("data.date_formats", "must list at least one format"));
        }
        if !(self.data.rating_min < self.data.rating_max) {
            return Err(invalid("data.rating_min", "must be below data.rating_max"));
        }
        if self.layout.height == 0 {
            return Err(invalid("layout.height", "must be greater than 0"));
        }
        if self.layout.tall_height < self.layout.height {
            return Err(invalid("layout.tall_height", "must not be below layout.height"));
        }
        if self.engine.parallel_threshold == 0 {
            return Err(invalid("engine.parallel_threshold", "must be greater than 0"));
        }
        Ok(())
    }
    pub fn with_data_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data.path = path.into();
        self
    }
    /// Larger charts for projector or wall displays.
    pub fn for_presentation() -> Self {
        Self {
            layout: LayoutConfig {
                height: 320,
                tall_height: 640,
                ..LayoutConfig::default()
            },
            ..Default::default()
        }
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
