//! Core library for the `weatherscope` CLI.
//!
//! This crate defines:
//! - Classification of free-form queries into city, zip or coordinate requests
//! - A provider contract and adapters for DarkSky, OpenWeatherMap and
//!   WeatherUnderground
//! - Normalization of every provider's response into one `WeatherReport`
//! - An orchestrator that streams reports and failures back to the caller
//! - Configuration & credentials handling
//!
//! It is used by `weatherscope-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod request;
pub mod transport;
pub mod units;

pub use config::{Config, ProviderConfig};
pub use error::{Failure, NetworkCause};
pub use model::WeatherReport;
pub use orchestrator::{ForecastEvent, ForecastLog, Orchestrator};
pub use provider::{ForecastStream, ProviderId, WeatherProvider};
pub use request::{Request, RequestKind, classify};
pub use transport::{HttpTransport, OutboundCall, RawResponse, Transport, TransportError};
