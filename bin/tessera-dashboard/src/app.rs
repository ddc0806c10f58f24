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

use crate::charts::draw_chart;
use crate::setup::report;
use eframe::egui;
use std::sync::Arc;
use tessera::{
    Dashboard, ErrorReporter, FilterError, Measure, Publication, PublicationReceiver,
    RecomputeController, RecomputeOutcome, TesseraError,
};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Dashboard rows: three small charts, then date, then product line.
const ROWS: [&[&str]; 3] = [
    &["city-fig", "gender-fig", "paym-fig"],
    &["income-per-date-fig"],
    &["income-per-product-fig"],
];

pub fn run(dashboard: Dashboard) -> anyhow::Result<()> {
    let runtime = Runtime::new()?;
    let controller = Arc::new(dashboard.controller().map_err(report)?);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_title("Supermarket Sales"),
        ..Default::default()
    };
    eframe::run_native(
        "Supermarket Sales",
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(controller, runtime)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run egui app: {e}"))
}

struct DashboardApp {
    controller: Arc<RecomputeController>,
    runtime: Runtime,
    receiver: PublicationReceiver,
    publication: Option<Arc<Publication>>,
    cities: Vec<(String, bool)>,
    measure_token: String,
    outcomes: mpsc::UnboundedReceiver<Result<RecomputeOutcome, FilterError>>,
    outcome_sender: mpsc::UnboundedSender<Result<RecomputeOutcome, FilterError>>,
    error_message: Option<String>,
    error_reporter: ErrorReporter,
}

impl DashboardApp {
    fn new(controller: Arc<RecomputeController>, runtime: Runtime) -> Self {
        let mut receiver = controller.subscribe();
        let publication = receiver.borrow_and_update().clone();
        let cities = controller
            .dataset()
            .cities()
            .iter()
            .map(|city| (city.clone(), true))
            .collect();
        let (outcome_sender, outcomes) = mpsc::unbounded_channel();
        Self {
            controller,
            runtime,
            receiver,
            publication,
            cities,
            measure_token: Measure::default().label().to_string(),
            outcomes,
            outcome_sender,
            error_message: None,
            error_reporter: ErrorReporter::plain(),
        }
    }

    /// Recomputes off the UI thread; overlapping requests coalesce in the controller.
    fn submit_filter(&self, ctx: &egui::Context) {
        let cities: Vec<String> = self
            .cities
            .iter()
            .filter(|(_, selected)| *selected)
            .map(|(city, _)| city.clone())
            .collect();
        let token = self.measure_token.clone();
        let controller = Arc::clone(&self.controller);
        let sender = self.outcome_sender.clone();
        let ctx = ctx.clone();
        self.runtime.spawn_blocking(move || {
            let outcome = controller.submit_tokens(cities, &token);
            let _ = sender.send(outcome);
            ctx.request_repaint();
        });
    }

    fn poll(&mut self) {
        if self.receiver.has_changed().unwrap_or(false) {
            self.publication = self.receiver.borrow_and_update().clone();
            if let Some(publication) = &self.publication {
                debug!(generation = publication.generation, "showing new publication");
            }
        }
        while let Ok(outcome) = self.outcomes.try_recv() {
            let error = match outcome {
                Ok(RecomputeOutcome::Retained { error, .. }) => TesseraError::from(error),
                Err(error) => TesseraError::from(error),
                Ok(RecomputeOutcome::Published { .. }) => {
                    self.error_message = None;
                    continue;
                }
                Ok(RecomputeOutcome::Coalesced) => continue,
            };
            warn!("filter change not applied: {}", error);
            self.error_message = Some(self.error_reporter.report(&error));
        }
    }

    fn render_sidebar(&mut self, ui: &mut egui::Ui) {
        ui.heading("Supermarket Sales");
        ui.separator();
        ui.strong("Cities:");
        let mut changed = false;
        for (city, selected) in &mut self.cities {
            changed |= ui.checkbox(selected, city.as_str()).changed();
        }
        ui.add_space(20.0);
        ui.strong("Variable of Analysis");
        for measure in Measure::ALL {
            let label = measure.label();
            changed |= ui
                .radio_value(&mut self.measure_token, label.to_string(), label)
                .changed();
        }
        if changed {
            self.submit_filter(ui.ctx());
        }

        ui.add_space(20.0);
        if let Some(publication) = &self.publication {
            ui.small(format!(
                "generation {} at {}",
                publication.generation,
                publication.published_at.format("%H:%M:%S")
            ));
        }
        if let Some(message) = &self.error_message {
            ui.add_space(10.0);
            ui.colored_label(egui::Color32::from_rgb(220, 80, 60), message.as_str());
        }
    }

    fn render_charts(&self, ui: &mut egui::Ui) {
        let Some(publication) = &self.publication else {
            ui.label("Waiting for the first charts...");
            return;
        };
        egui::ScrollArea::vertical().show(ui, |ui| {
            for row in ROWS {
                ui.columns(row.len(), |columns| {
                    for (column, id) in columns.iter_mut().zip(row.iter()) {
                        if let Some(spec) = publication.charts.get(id) {
                            draw_chart(column, spec);
                        }
                    }
                });
                ui.add_space(8.0);
            }
        });
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll();
        egui::SidePanel::left("filters")
            .resizable(false)
            .exact_width(220.0)
            .show(ctx, |ui| self.render_sidebar(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.render_charts(ui));
    }
}
