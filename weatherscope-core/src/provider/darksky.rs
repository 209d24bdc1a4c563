use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use serde::Deserialize;
use tracing::trace;

use crate::{
    error::Failure,
    model::WeatherReport,
    request::{Request, RequestKind},
    transport::{OutboundCall, Transport},
    units::relative_humidity_from_dew_point,
};

use super::{ForecastStream, WeatherProvider, fetch_json, unsupported};

pub const DEFAULT_BASE_URL: &str = "https://api.forecast.io/forecast";

/// DarkSky: one coordinate-keyed endpoint, coordinates only.
#[derive(Debug, Clone)]
pub struct DarkSkyProvider {
    name: String,
    api_key: String,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl DarkSkyProvider {
    pub fn new(api_key: String, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: "DarkSky".to_string(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            transport,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn location_call(&self, lat: f64, lon: f64) -> OutboundCall {
        let base = self.base_url.trim_end_matches('/');
        OutboundCall::get(format!("{base}/{}/{lat},{lon}", self.api_key))
    }

    async fn fetch(self, call: OutboundCall, location: String) -> Result<WeatherReport, Failure> {
        let parsed: DsForecast = fetch_json(self.transport.as_ref(), &call, &location).await?;
        Ok(transform(&self.name, location, parsed.currently))
    }
}

#[derive(Debug, Deserialize)]
struct DsForecast {
    currently: DsCurrently,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DsCurrently {
    summary: String,
    temperature: f64,
    dew_point: f64,
    humidity: f64,
    pressure: f64,
}

/// Humidity is recomputed from dew point and temperature; the reported
/// `humidity` field is not used.
fn transform(source: &str, location: String, current: DsCurrently) -> WeatherReport {
    trace!(
        reported_humidity = current.humidity,
        pressure = current.pressure,
        "ignoring reported humidity"
    );

    WeatherReport {
        source: source.to_string(),
        location,
        temperature_f: current.temperature,
        relative_humidity_pct: relative_humidity_from_dew_point(
            current.dew_point,
            current.temperature,
        ),
        notes: Some(current.summary),
    }
}

#[async_trait]
impl WeatherProvider for DarkSkyProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, kind: RequestKind) -> bool {
        kind == RequestKind::Location
    }

    fn forecast(&self, request: &Request) -> Result<ForecastStream, Failure> {
        match request {
            Request::Location { lat, lon } => {
                let call = self.location_call(*lat, *lon);
                let fut = self.clone().fetch(call, request.subject());
                Ok(stream::once(fut).boxed())
            }
            _ => Err(unsupported(&self.name, request)),
        }
    }
}
