use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::Failure,
    model::WeatherReport,
    request::{Request, RequestKind},
    transport::{OutboundCall, Transport},
};

use super::{ForecastStream, WeatherProvider, fetch_json};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// OpenWeatherMap: a single `/weather` endpoint addressed by query parameters.
#[derive(Debug, Clone)]
pub struct OpenWeatherMapProvider {
    name: String,
    api_key: String,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl OpenWeatherMapProvider {
    pub fn new(api_key: String, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: "OpenWeatherMap".to_string(),
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

    /// Fixed credential and units parameters, plus the request-specific ones.
    fn call_for(&self, request: &Request) -> OutboundCall {
        let url = format!("{}/weather", self.base_url.trim_end_matches('/'));
        let call = OutboundCall::get(url)
            .param("APPID", &self.api_key)
            .param("units", "imperial");

        match request {
            Request::City { name } => call.param("q", name),
            Request::Zip { code } => call.param("zip", code),
            Request::Location { lat, lon } => call.param("lat", lat).param("lon", lon),
        }
    }

    async fn fetch_current(
        self,
        call: OutboundCall,
        location: String,
    ) -> Result<WeatherReport, Failure> {
        let parsed: OwmResponse = fetch_json(self.transport.as_ref(), &call, &location).await?;

        debug!(requested = %location, resolved = %parsed.name, "OpenWeatherMap station resolved");

        let notes = parsed.weather.first().map(|w| {
            if w.description.is_empty() {
                w.main.clone()
            } else {
                w.description.clone()
            }
        });

        Ok(WeatherReport {
            source: self.name.clone(),
            location,
            temperature_f: parsed.main.temp,
            relative_humidity_pct: parsed.main.humidity,
            notes,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    weather: Vec<OwmWeather>,
    main: OwmMain,
    name: String,
}

#[async_trait]
impl WeatherProvider for OpenWeatherMapProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, _kind: RequestKind) -> bool {
        true
    }

    fn forecast(&self, request: &Request) -> Result<ForecastStream, Failure> {
        let call = self.call_for(request);
        let fut = self.clone().fetch_current(call, request.subject());
        Ok(stream::once(fut).boxed())
    }
}
