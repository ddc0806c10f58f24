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

//! Drives aggregation and view building on every filter change.
//!
//! The controller is a two-state machine. A submit that finds it `Idle`
//! takes ownership of the recompute loop and keeps running until no pending
//! filter is left; a submit that finds it `Recomputing` only replaces the
//! pending filter and returns. Each loop iteration publishes one complete
//! [`Publication`] through a `watch` channel, so readers never observe charts
//! from two different filters.

use crate::aggregation::AggregationEngine;
use crate::config::DashboardConfig;
use crate::dataset::Dataset;
use crate::error::{FilterResult, ViewError};
use crate::filter::FilterState;
use crate::view::{ChartSet, ViewBuilder};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    Idle,
    Recomputing,
}

/// Five chart specifications published together for one filter state.
#[derive(Debug, Clone, Serialize)]
pub struct Publication {
    pub generation: u64,
    pub filter: FilterState,
    pub charts: ChartSet,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecomputeOutcome {
    /// The submitted filter (or a later one that superseded it) was published.
    Published { generation: u64 },
    /// Another caller is recomputing and will pick this filter up.
    Coalesced,
    /// Building the views failed; the previous publication stays current.
    Retained {
        error: ViewError,
        generation: Option<u64>,
    },
}

#[derive(Debug)]
struct Inner {
    state: ControllerState,
    pending: Option<FilterState>,
}

pub type PublicationReceiver = watch::Receiver<Option<Arc<Publication>>>;

type RecomputeHook = Box<dyn Fn(&FilterState) + Send + Sync>;

pub struct RecomputeController {
    dataset: Arc<Dataset>,
    engine: AggregationEngine,
    builder: ViewBuilder,
    inner: Mutex<Inner>,
    generation: AtomicU64,
    publisher: watch::Sender<Option<Arc<Publication>>>,
    hook: Option<RecomputeHook>,
}

/// Returns the controller to `Idle` if the recompute loop unwinds, so a
/// panicking recompute cannot leave every later submit coalescing forever.
struct UnwindReset<'a> {
    inner: &'a Mutex<Inner>,
}

impl Drop for UnwindReset<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.state = ControllerState::Idle;
            inner.pending = None;
            error!("recompute panicked; controller reset to idle");
        }
    }
}

impl RecomputeController {
    pub fn new(dataset: Arc<Dataset>, engine: AggregationEngine, builder: ViewBuilder) -> Self {
        let (publisher, _) = watch::channel(None);
        Self {
            dataset,
            engine,
            builder,
            inner: Mutex::new(Inner {
                state: ControllerState::Idle,
                pending: None,
            }),
            generation: AtomicU64::new(0),
            publisher,
            hook: None,
        }
    }
    pub fn from_config(dataset: Arc<Dataset>, config: &DashboardConfig) -> Self {
        Self::new(
            dataset,
            AggregationEngine::from_config(&config.engine),
            ViewBuilder::new(&config.layout),
        )
    }
    /// Runs `hook` on the recomputing thread before each recompute.
    pub fn with_recompute_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FilterState) + Send + Sync + 'static,
    {
        self.hook = Some(Box::new(hook));
        self
    }
    /// Publishes the start-up view: every city, gross income.
    pub fn start(&self) -> RecomputeOutcome {
        self.submit(FilterState::all_cities(&self.dataset))
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }
    pub fn state(&self) -> ControllerState {
        self.lock().state
    }
    pub fn latest(&self) -> Option<Arc<Publication>> {
        self.publisher.borrow().clone()
    }
    pub fn subscribe(&self) -> PublicationReceiver {
        self.publisher.subscribe()
    }

    /// Parses raw UI values and submits them. An unknown measure token is
    /// returned to the caller and nothing is recomputed.
    pub fn submit_tokens<I, S>(&self, cities: I, measure_token: &str) -> FilterResult<RecomputeOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match FilterState::from_tokens(cities, measure_token) {
            Ok(filter) => Ok(self.submit(filter)),
            Err(err) => {
                error!(token = measure_token, "rejected filter change: {}", err);
                Err(err)
            }
        }
    }

    pub fn submit(&self, filter: FilterState) -> RecomputeOutcome {
        {
            let mut inner = self.lock();
            if inner.state == ControllerState::Recomputing {
                if inner.pending.replace(filter).is_some() {
                    debug!("superseded a pending filter change");
                }
                return RecomputeOutcome::Coalesced;
            }
            inner.state = ControllerState::Recomputing;
        }
        let _reset = UnwindReset { inner: &self.inner };
        let mut current = filter;
        loop {
            let outcome = self.recompute(&current);
            let mut inner = self.lock();
            match inner.pending.take() {
                Some(next) => {
                    debug!(
                        cities = next.selected_cities.len(),
                        measure = %next.measure,
                        "recomputing for newer filter"
                    );
                    current = next;
                }
                None => {
                    inner.state = ControllerState::Idle;
                    return outcome;
                }
            }
        }
    }

    fn recompute(&self, filter: &FilterState) -> RecomputeOutcome {
        if let Some(hook) = &self.hook {
            hook(filter);
        }
        let tables = self.engine.compute(&self.dataset, filter);
        match self.builder.build(&tables, filter.measure) {
            Ok(charts) => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let publication = Publication {
                    generation,
                    filter: filter.clone(),
                    charts,
                    published_at: Utc::now(),
                };
                self.publisher.send_replace(Some(Arc::new(publication)));
                info!(
                    generation,
                    cities = filter.selected_cities.len(),
                    measure = %filter.measure,
                    "published charts"
                );
                RecomputeOutcome::Published { generation }
            }
            Err(err) => {
                let generation = self.latest().map(|publication| publication.generation);
                error!("view building failed: {}", err);
                warn!(?generation, "keeping the previous publication");
                RecomputeOutcome::Retained {
                    error: err,
                    generation,
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
