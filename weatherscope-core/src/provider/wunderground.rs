use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, stream, stream::FuturesUnordered};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    error::{Failure, NetworkCause},
    model::WeatherReport,
    request::{Request, RequestKind},
    transport::{OutboundCall, Transport},
};

use super::{ForecastStream, WeatherProvider, fetch_json};

pub const DEFAULT_BASE_URL: &str = "https://api.wunderground.com/api";
pub const DEFAULT_AUTOCOMPLETE_URL: &str = "https://autocomplete.wunderground.com/aq";

/// WeatherUnderground: a conditions endpoint keyed by zip, coordinate or station
/// id ("zmw"), and a keyless autocomplete endpoint that maps city names to stations.
#[derive(Debug, Clone)]
pub struct WeatherUndergroundProvider {
    name: String,
    api_key: String,
    base_url: String,
    autocomplete_url: String,
    transport: Arc<dyn Transport>,
}

impl WeatherUndergroundProvider {
    pub fn new(api_key: String, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: "WeatherUnderground".to_string(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            autocomplete_url: DEFAULT_AUTOCOMPLETE_URL.to_string(),
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

    pub fn with_autocomplete_url(mut self, url: impl Into<String>) -> Self {
        self.autocomplete_url = url.into();
        self
    }

    fn conditions_call(&self, suffix: &str) -> OutboundCall {
        let base = self.base_url.trim_end_matches('/');
        OutboundCall::get(format!("{base}/{}/conditions/q/{suffix}", self.api_key))
    }

    fn autocomplete_call(&self, city: &str) -> OutboundCall {
        OutboundCall::get(self.autocomplete_url.clone())
            .param("query", city)
            .param("c", "US")
    }

    async fn fetch_conditions(
        self,
        call: OutboundCall,
        location: String,
    ) -> Result<WeatherReport, Failure> {
        let parsed: WuForecast = fetch_json(self.transport.as_ref(), &call, &location).await?;
        let current = parsed.current_observation;

        Ok(WeatherReport {
            source: self.name.clone(),
            location,
            temperature_f: current.temp_f,
            relative_humidity_pct: parse_humidity(&current.relative_humidity),
            notes: Some(current.weather),
        })
    }

    /// Stage one of a city lookup. Failures here are labelled with the provider
    /// name rather than the city.
    async fn resolve_city(&self, city: &str) -> Result<Vec<WuCandidate>, Failure> {
        let call = self.autocomplete_call(city);
        let transport = self.transport.as_ref();
        let parsed: WuAutocomplete = fetch_json(transport, &call, &self.name).await?;

        if parsed.results.is_empty() {
            warn!(city, "autocomplete returned no stations");
            return Err(Failure::NetworkError {
                location: self.name.clone(),
                cause: NetworkCause::NoMatch,
            });
        }

        debug!(
            city,
            candidates = parsed.results.len(),
            "autocomplete resolved stations"
        );
        Ok(parsed.results)
    }

    /// One conditions call per autocomplete candidate, yielded in completion order.
    fn city_forecast(&self, city: String) -> ForecastStream {
        let this = self.clone();

        stream::once(async move {
            let resolved = this.resolve_city(&city).await;
            (this, resolved)
        })
        .flat_map(|(this, resolved)| match resolved {
            Ok(candidates) => candidates
                .into_iter()
                .map(|candidate| {
                    let call = this.conditions_call(&format!("zmw:{}.json", candidate.zmw));
                    this.clone().fetch_conditions(call, candidate.name)
                })
                .collect::<FuturesUnordered<_>>()
                .boxed(),
            Err(failure) => {
                let failed: Result<WeatherReport, Failure> = Err(failure);
                stream::iter([failed]).boxed()
            }
        })
        .boxed()
    }
}

/// `"27%"` → 27.0. Anything unparsable reads as 0.0 rather than failing the report.
fn parse_humidity(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed);
    number.trim().parse().unwrap_or(0.0)
}

#[derive(Debug, Deserialize)]
struct WuObservation {
    weather: String,
    relative_humidity: String,
    temp_f: f64,
}

#[derive(Debug, Deserialize)]
struct WuForecast {
    current_observation: WuObservation,
}

#[derive(Debug, Deserialize)]
struct WuCandidate {
    zmw: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct WuAutocomplete {
    #[serde(rename = "RESULTS")]
    results: Vec<WuCandidate>,
}

#[async_trait]
impl WeatherProvider for WeatherUndergroundProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, _kind: RequestKind) -> bool {
        true
    }

    fn forecast(&self, request: &Request) -> Result<ForecastStream, Failure> {
        let stream = match request {
            Request::City { name } => self.city_forecast(name.clone()),
            Request::Zip { code } => {
                let call = self.conditions_call(&format!("{code}.json"));
                let fut = self.clone().fetch_conditions(call, request.subject());
                stream::once(fut).boxed()
            }
            Request::Location { lat, lon } => {
                let call = self.conditions_call(&format!("{lat},{lon}.json"));
                let fut = self.clone().fetch_conditions(call, request.subject());
                stream::once(fut).boxed()
            }
        };

        Ok(stream)
    }
}
