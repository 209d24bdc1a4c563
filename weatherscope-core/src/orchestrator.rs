//! Turns user text plus a chosen provider into a stream of events for the UI.

use std::sync::Arc;

use futures::StreamExt;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, info, trace, warn};

use crate::{Failure, WeatherProvider, WeatherReport, request::classify};

pub const QUERY_ERROR_TITLE: &str = "Query Error";
pub const QUERY_ERROR_MESSAGE: &str = "Please input a known city (i.e., \"New York\"), \
    location (i.e., \"35,-112\"), or zip code (i.e., \"84093\")";
pub const UNSUPPORTED_TITLE: &str = "Forecast";
pub const FAILURE_TITLE: &str = "Error";

/// Something the caller should show: a finished report or a one-line alert.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastEvent {
    Report(WeatherReport),
    Alert { title: String, message: String },
}

/// Dispatches queries and funnels every outcome into one channel.
///
/// Events from queries still in flight interleave freely; nothing is batched,
/// sorted or cancelled.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    events: UnboundedSender<ForecastEvent>,
}

impl Orchestrator {
    pub fn new() -> (Self, UnboundedReceiver<ForecastEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Self { events }, rx)
    }

    /// Classify `text` and start a forecast on `provider`.
    ///
    /// Query errors and unsupported request kinds are reported immediately and
    /// return `None`. Otherwise a task is spawned that forwards each report or
    /// failure as soon as it resolves. Must be called from within a tokio runtime.
    pub fn process(
        &self,
        text: &str,
        provider: Arc<dyn WeatherProvider>,
    ) -> Option<JoinHandle<()>> {
        let Some(request) = classify(text) else {
            debug!(text, "query not understood");
            self.alert(QUERY_ERROR_TITLE, QUERY_ERROR_MESSAGE.to_string());
            return None;
        };

        let mut stream = match provider.forecast(&request) {
            Ok(stream) => stream,
            Err(failure) => {
                warn!(provider = provider.name(), kind = %request.kind(), "request rejected");
                self.alert(UNSUPPORTED_TITLE, failure.to_string());
                return None;
            }
        };

        info!(
            provider = provider.name(),
            subject = %request.subject(),
            kind = %request.kind(),
            "forecast dispatched"
        );

        let source = provider.name().to_string();
        let events = self.events.clone();
        Some(tokio::spawn(async move {
            while let Some(outcome) = stream.next().await {
                let event = match outcome {
                    Ok(report) => ForecastEvent::Report(report),
                    Err(failure) => {
                        log_failure(&source, &failure);
                        ForecastEvent::Alert {
                            title: FAILURE_TITLE.to_string(),
                            message: failure.to_string(),
                        }
                    }
                };

                if events.send(event).is_err() {
                    trace!("event receiver dropped; draining remaining calls");
                }
            }
        }))
    }

    fn alert(&self, title: &str, message: String) {
        let event = ForecastEvent::Alert {
            title: title.to_string(),
            message,
        };
        if self.events.send(event).is_err() {
            trace!("event receiver dropped");
        }
    }
}

/// Missing forecasts log at info; every other failure at warn with its status.
fn log_failure(source: &str, failure: &Failure) {
    if failure.is_not_found() {
        info!(provider = source, error = %failure, "no forecast for location");
    } else {
        warn!(
            provider = source,
            status = ?failure.status_code(),
            error = %failure,
            "forecast call failed"
        );
    }
}

/// Caller-owned, append-only list of received reports.
#[derive(Debug, Clone, Default)]
pub struct ForecastLog {
    reports: Vec<WeatherReport>,
}

impl ForecastLog {
    pub fn push(&mut self, report: WeatherReport) {
        self.reports.push(report);
    }

    pub fn reports(&self) -> &[WeatherReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
