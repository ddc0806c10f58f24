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

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tessera-dashboard")]
#[command(about = "Supermarket sales dashboard: filter by city, compare gross income or rating")]
#[command(version)]
pub struct Args {
    #[arg(long, short, help = "Dashboard configuration file (YAML)")]
    pub config: Option<PathBuf>,

    #[arg(long, short, help = "Sales CSV, overriding data.path from the configuration")]
    pub data: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "info", help = "Set the logging level")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Open the desktop dashboard (default)
    Gui,
    /// Compute the charts for one filter and write them out
    Export {
        #[arg(
            long,
            value_delimiter = ',',
            help = "Cities to include; all cities when omitted, none when given as \"\""
        )]
        cities: Option<Vec<String>>,

        #[arg(long, default_value = "gross income", help = "'gross income' or 'Rating'")]
        measure: String,

        #[arg(long, default_value = "html", help = "json or html")]
        format: String,

        #[arg(long, short, help = "Output file; stdout when omitted")]
        output: Option<PathBuf>,
    },
    /// Print row count, cities, date range and rating range of the dataset
    Summary {
        #[arg(long, help = "Print the summary as JSON")]
        json: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
