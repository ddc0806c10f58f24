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

use crate::cli::{Args, LogLevel};
use std::path::Path;
use tessera::{Dashboard, DashboardConfig, ErrorReporter, TesseraError};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const CONFIG_CANDIDATES: [&str; 3] = [
    "config/dashboard.yml",
    "crates/tessera/config/dashboard.yml",
    "../../crates/tessera/config/dashboard.yml",
];

/// `RUST_LOG` wins over `--log-level` when set.
pub fn setup_logging(level: LogLevel) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(env_filter),
        )
        .init();
}

pub fn open_dashboard(args: &Args) -> anyhow::Result<Dashboard> {
    let config = load_config(args).map_err(report)?;
    info!(data = %config.data.path.display(), "opening dashboard");
    Dashboard::open(config).map_err(report)
}

fn load_config(args: &Args) -> tessera::Result<DashboardConfig> {
    let config = match &args.config {
        Some(path) => DashboardConfig::from_yaml_file(path)?,
        None => match CONFIG_CANDIDATES.iter().map(Path::new).find(|path| path.is_file()) {
            Some(path) => DashboardConfig::from_yaml_file(path)?,
            None => DashboardConfig::default(),
        },
    };
    Ok(match &args.data {
        Some(path) => config.with_data_path(path),
        None => config,
    })
}

/// Prints the user-facing report and hands the error on to `main`.
pub fn report(error: TesseraError) -> anyhow::Error {
    eprint!("{}", ErrorReporter::new().report(&error));
    anyhow::Error::new(error)
}
