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

pub mod aggregation;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod loader;
pub mod render;
pub mod view;

pub use aggregation::{AggregatedRow, AggregationEngine, ResultTable, ResultTables, TableId};
pub use config::{DashboardConfig, DataConfig, EngineConfig, LayoutConfig, Margin};
pub use controller::{
    ControllerState, Publication, PublicationReceiver, RecomputeController, RecomputeOutcome,
};
pub use dataset::{Dataset, DatasetMetadata, DatasetSummary, Dimension, KeyValue, Record};
pub use error::{
    ConfigError, DataError, ErrorReporter, ErrorSeverity, FilterError, Result, SerialisationError,
    TesseraError, ViewError,
};
pub use filter::{FilterState, Measure, Reduction};
pub use loader::DatasetLoader;
pub use render::ExportFormat;
pub use view::{ChartSet, ChartSpec, ViewBuilder, ViewRule, VIEW_RULES};

use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// One loaded dataset plus the configuration its controllers are built from.
pub struct Dashboard {
    dataset: Arc<Dataset>,
    config: DashboardConfig,
}

impl Dashboard {
    /// Loads the configured CSV. Any data problem aborts start-up.
    pub fn open(config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let dataset = DatasetLoader::from_config(&config.data).load_csv(&config.data.path)?;
        Ok(Self::with_dataset(Arc::new(dataset), config))
    }
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(DashboardConfig::from_yaml_file(path)?)
    }
    pub fn with_dataset(dataset: Arc<Dataset>, config: DashboardConfig) -> Self {
        Self { dataset, config }
    }
    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }
    pub fn summary(&self) -> DatasetSummary {
        self.dataset.summary()
    }
    /// A controller sharing this dataset, already showing the start-up charts.
    pub fn controller(&self) -> Result<RecomputeController> {
        let controller = RecomputeController::from_config(Arc::clone(&self.dataset), &self.config);
        match controller.start() {
            RecomputeOutcome::Retained { error, .. } => Err(error.into()),
            outcome => {
                info!(dataset = %self.dataset.metadata().name, ?outcome, "dashboard controller ready");
                Ok(controller)
            }
        }
    }
}
