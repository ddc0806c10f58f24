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

mod app;
mod charts;
mod cli;
mod export;
mod setup;

use clap::Parser;
use cli::{Args, Command};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup::setup_logging(args.log_level);

    let dashboard = setup::open_dashboard(&args)?;
    match args.command.clone().unwrap_or(Command::Gui) {
        Command::Gui => app::run(dashboard),
        Command::Export {
            cities,
            measure,
            format,
            output,
        } => export::run_export(&dashboard, cities, &measure, &format, output.as_deref()),
        Command::Summary { json } => export::print_summary(&dashboard, json),
    }
}
