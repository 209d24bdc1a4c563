use crate::{
    Config, Request, RequestKind, WeatherReport,
    error::{Failure, NetworkCause},
    provider::{
        darksky::DarkSkyProvider, openweathermap::OpenWeatherMapProvider,
        wunderground::WeatherUndergroundProvider,
    },
    transport::{OutboundCall, RawResponse, Transport},
};
use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};
use tracing::debug;

pub mod darksky;
pub mod openweathermap;
pub mod wunderground;

/// Reports (or per-call failures) in the order the underlying calls complete.
pub type ForecastStream = BoxStream<'static, Result<WeatherReport, Failure>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    DarkSky,
    OpenWeatherMap,
    WeatherUnderground,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::DarkSky => "darksky",
            ProviderId::OpenWeatherMap => "openweathermap",
            ProviderId::WeatherUnderground => "wunderground",
        }
    }

    /// Name shown to users unless the configuration overrides it.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::DarkSky => "DarkSky",
            ProviderId::OpenWeatherMap => "OpenWeatherMap",
            ProviderId::WeatherUnderground => "WeatherUnderground",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[
            ProviderId::DarkSky,
            ProviderId::OpenWeatherMap,
            ProviderId::WeatherUnderground,
        ]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "darksky" => Ok(ProviderId::DarkSky),
            "openweathermap" => Ok(ProviderId::OpenWeatherMap),
            "wunderground" => Ok(ProviderId::WeatherUnderground),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. \
                 Supported providers: darksky, openweathermap, wunderground."
            )),
        }
    }
}

/// A weather source that turns a [`Request`] into normalized [`WeatherReport`]s.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// User-readable name of the source, e.g. "WeatherUnderground".
    fn name(&self) -> &str;

    fn supports(&self, kind: RequestKind) -> bool;

    /// Start a forecast.
    ///
    /// Request kinds the provider cannot serve are rejected here with
    /// [`Failure::UnsupportedRequest`] before any network work begins. Otherwise
    /// the stream yields one item per outbound conditions call, each as soon as
    /// it resolves; one failing item never stops its siblings.
    fn forecast(&self, request: &Request) -> Result<ForecastStream, Failure>;

    /// Run [`forecast`](Self::forecast) to completion and collect every outcome.
    async fn forecast_all(
        &self,
        request: &Request,
    ) -> Result<Vec<Result<WeatherReport, Failure>>, Failure> {
        let stream = self.forecast(request)?;
        Ok(stream.collect().await)
    }
}

pub(crate) fn unsupported(provider: &str, request: &Request) -> Failure {
    Failure::UnsupportedRequest {
        kind: request.kind(),
        provider: provider.to_string(),
    }
}

/// Issue `call` and decode a successful body as `T`.
///
/// Calls that get no response and non-2xx statuses become
/// [`Failure::NetworkError`], malformed bodies [`Failure::DecodeError`], all
/// labelled with `location`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    transport: &dyn Transport,
    call: &OutboundCall,
    location: &str,
) -> Result<T, Failure> {
    debug!(url = %call.url, location, "requesting forecast data");

    let response = transport.get(call).await.map_err(|err| {
        debug!(url = %call.url, error = %err, "provider call did not complete");
        Failure::NetworkError {
            location: location.to_string(),
            cause: NetworkCause::Unreachable(err.message),
        }
    })?;

    decode(&response, location).inspect_err(|failure| {
        debug!(url = %call.url, status = response.status, error = %failure, "provider call failed");
    })
}

pub(crate) fn decode<T: DeserializeOwned>(
    response: &RawResponse,
    location: &str,
) -> Result<T, Failure> {
    if !response.is_success() {
        return Err(Failure::http_status(location, response.status));
    }

    serde_json::from_slice(&response.body).map_err(|source| Failure::DecodeError {
        status: response.status,
        location: location.to_string(),
        source,
    })
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
    transport: Arc<dyn Transport>,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let settings = config.provider_config(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weatherscope configure {id}` and enter your API key."
        )
    })?;

    let api_key = settings.api_key.clone();
    let name = settings
        .display_name
        .clone()
        .unwrap_or_else(|| id.display_name().to_string());

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::DarkSky => {
            let mut provider = DarkSkyProvider::new(api_key, transport).with_name(name);
            if let Some(url) = &settings.base_url {
                provider = provider.with_base_url(url);
            }
            Box::new(provider)
        }
        ProviderId::OpenWeatherMap => {
            let mut provider = OpenWeatherMapProvider::new(api_key, transport)
                .with_name(name);
            if let Some(url) = &settings.base_url {
                provider = provider.with_base_url(url);
            }
            Box::new(provider)
        }
        ProviderId::WeatherUnderground => {
            let mut provider = WeatherUndergroundProvider::new(api_key, transport)
                .with_name(name);
            if let Some(url) = &settings.base_url {
                provider = provider.with_base_url(url);
            }
            if let Some(url) = &settings.autocomplete_url {
                provider = provider.with_autocomplete_url(url);
            }
            Box::new(provider)
        }
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(
    config: &Config,
    transport: Arc<dyn Transport>,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config, transport)
}
