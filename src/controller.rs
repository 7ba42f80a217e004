//! Turns page triggers into history requests and rendered tables

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::HistorySource;
use crate::config::{Config, LogSearchConfig, StatusClasses};
use crate::page::{ApplyOutcome, Display, InputEdit, PageHandle, PageInputs};
use crate::render::render;

/// What caused a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    PageLoad,
    SelectorChanged,
    RangeChanged,
    Refresh,
    /// Ask for the server's most current tick instead of the displayed
    /// maximum, which may be out of date.
    LoadCurrent,
}

impl Trigger {
    pub fn uses_displayed_max(self) -> bool {
        self != Self::LoadCurrent
    }
}

/// Query for `service-history.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub service: String,
    /// First tick, inclusive
    pub from_tick: i64,
    /// Last tick, exclusive. `None` lets the server pick its current tick.
    pub to_tick: Option<i64>,
}

impl HistoryRequest {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("service", self.service.clone()),
            ("from-tick", self.from_tick.to_string()),
        ];
        if let Some(to_tick) = self.to_tick {
            pairs.push(("to-tick", to_tick.to_string()));
        }
        pairs
    }
}

/// Why a trigger did not lead to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoService,
    InvalidRange,
}

/// What became of a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    Skipped { reason: SkipReason },
    Failed { error: String },
    Applied { sequence: u64 },
    Stale { sequence: u64 },
}

/// Service identifier from a selector: the text after `#`, or the whole
/// selector when it has none.
pub fn service_from_selector(selector: &str) -> Option<&str> {
    let service = selector
        .split_once('#')
        .map_or(selector, |(_, fragment)| fragment)
        .trim();
    (!service.is_empty()).then_some(service)
}

/// Build the request for the current inputs.
pub fn build_request(
    inputs: &PageInputs,
    trigger: Trigger,
) -> Result<HistoryRequest, SkipReason> {
    let service = service_from_selector(&inputs.selector).ok_or(SkipReason::NoService)?;
    let min_tick: i64 = inputs
        .min_tick
        .trim()
        .parse()
        .map_err(|_| SkipReason::InvalidRange)?;
    let max_tick: i64 = inputs
        .max_tick
        .trim()
        .parse()
        .map_err(|_| SkipReason::InvalidRange)?;

    Ok(HistoryRequest {
        service: service.to_string(),
        from_tick: min_tick,
        to_tick: trigger
            .uses_displayed_max()
            .then(|| max_tick.saturating_add(1)),
    })
}

/// Loads histories into a page.
pub struct Controller<D> {
    source: Arc<dyn HistorySource>,
    page: PageHandle<D>,
    classes: StatusClasses,
    log_search: LogSearchConfig,
    sequence: AtomicU64,
}

impl<D: Display> Controller<D> {
    pub fn new(
        source: Arc<dyn HistorySource>,
        page: PageHandle<D>,
        classes: StatusClasses,
        log_search: LogSearchConfig,
    ) -> Self {
        Self {
            source,
            page,
            classes,
            log_search,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &Config, source: Arc<dyn HistorySource>, page: PageHandle<D>) -> Self {
        Self::new(
            source,
            page,
            config.status_classes.clone(),
            config.log_search.clone(),
        )
    }

    pub fn page(&self) -> &PageHandle<D> {
        &self.page
    }

    /// Point the page at another service and load it.
    pub async fn select(&self, selector: String) -> LoadOutcome {
        if let Err(e) = self.page.edit(InputEdit::Selector(selector)).await {
            return failed(e);
        }
        self.load(Trigger::SelectorChanged).await
    }

    /// Change the range inputs and load them.
    pub async fn set_range(&self, min_tick: String, max_tick: String) -> LoadOutcome {
        if let Err(e) = self
            .page
            .edit(InputEdit::Range { min_tick, max_tick })
            .await
        {
            return failed(e);
        }
        self.load(Trigger::RangeChanged).await
    }

    /// Read the page inputs, fetch the matching history and put it on the
    /// page. Nothing on the page changes unless a table gets applied.
    pub async fn load(&self, trigger: Trigger) -> LoadOutcome {
        let inputs = match self.page.inputs().await {
            Ok(inputs) => inputs,
            Err(e) => return failed(e),
        };

        let request = match build_request(&inputs, trigger) {
            Ok(request) => request,
            Err(reason) => {
                tracing::debug!("{:?} not loading: {:?} for {:?}", trigger, reason, inputs);
                return LoadOutcome::Skipped { reason };
            }
        };

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("{:?} issuing request #{}: {:?}", trigger, sequence, request);

        let history = match self.source.fetch(&request).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("Request #{} for {} failed: {}", sequence, request.service, e);
                return failed(e);
            }
        };

        let model = match render(&history, &self.classes, &self.log_search) {
            Ok(model) => model,
            Err(e) => {
                tracing::warn!("Dropping response #{}: {}", sequence, e);
                return failed(e);
            }
        };

        match self.page.apply(sequence, model).await {
            Ok(ApplyOutcome::Applied) => {
                tracing::info!(
                    "Showing {} ticks {}..={} (request #{})",
                    history.service_slug,
                    history.min_tick,
                    history.max_tick,
                    sequence
                );
                LoadOutcome::Applied { sequence }
            }
            Ok(ApplyOutcome::Stale) => LoadOutcome::Stale { sequence },
            Err(e) => failed(e),
        }
    }
}

fn failed(error: crate::ViewerError) -> LoadOutcome {
    LoadOutcome::Failed {
        error: error.to_string(),
    }
}
