use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password};
use tracing::info;
use weatherscope_core::{
    Config, ForecastEvent, ForecastLog, HttpTransport, Orchestrator, ProviderId, Transport,
    WeatherProvider, WeatherReport, provider::provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherscope", version, about = "Current weather from several providers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name: "darksky", "openweathermap" or "wunderground".
        provider: String,
    },

    /// Show current weather for a city, zip code, or "lat,lon" coordinate.
    Show {
        /// e.g. "New York", "84093" or "35,-112".
        query: String,

        /// Provider to ask; repeat to ask several. Defaults to the configured default.
        #[arg(short, long = "provider")]
        providers: Vec<String>,
    },

    /// List known providers and whether they are configured.
    Providers,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show { query, providers } => show(&query, &providers).await,
            Command::Providers => list_providers(),
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {}:", id.display_name()))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.upsert_provider_api_key(id, api_key.trim().to_string());

    if config.default_provider_id().ok() != Some(id) {
        let make_default = Confirm::new(&format!("Make {id} the default provider?"))
            .with_default(false)
            .prompt()
            .context("Failed to read answer")?;
        if make_default {
            config.set_default_provider(id);
        }
    }

    let path = config.save()?;
    println!("Saved {id} credentials to {}", path.display());
    Ok(())
}

async fn show(query: &str, providers: &[String]) -> anyhow::Result<()> {
    let config = Config::load()?;

    let ids = if providers.is_empty() {
        vec![config.default_provider_id()?]
    } else {
        providers
            .iter()
            .map(|p| ProviderId::try_from(p.as_str()))
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new());
    let providers = build_providers(&ids, &config, transport)?;

    let (orchestrator, mut events) = Orchestrator::new();
    let tasks: Vec<_> = providers
        .into_iter()
        .filter_map(|provider| orchestrator.process(query, provider))
        .collect();
    drop(orchestrator);

    let mut log = ForecastLog::default();
    while let Some(event) = events.recv().await {
        match event {
            ForecastEvent::Report(report) => {
                println!("{}", render_report(&report));
                log.push(report);
            }
            ForecastEvent::Alert { title, message } => eprintln!("{title}: {message}"),
        }
    }

    for task in tasks {
        task.await.context("Forecast task panicked")?;
    }

    info!(reports = log.len(), "done");
    Ok(())
}

/// Every requested provider must be configured before any query goes out.
fn build_providers(
    ids: &[ProviderId],
    config: &Config,
    transport: Arc<dyn Transport>,
) -> anyhow::Result<Vec<Arc<dyn WeatherProvider>>> {
    ids.iter()
        .map(|&id| {
            let provider = provider_from_config(id, config, Arc::clone(&transport))?;
            anyhow::Ok(Arc::from(provider))
        })
        .collect()
}

fn list_providers() -> anyhow::Result<()> {
    let config = Config::load()?;
    let default = config.default_provider_id().ok();

    for id in ProviderId::all() {
        let status = if config.is_provider_configured(*id) {
            "configured"
        } else {
            "not configured"
        };
        let marker = if default == Some(*id) {
            " (default)"
        } else {
            ""
        };
        let (key, name) = (id.as_str(), id.display_name());
        println!("{key:<16}{name:<20}{status}{marker}");
    }

    Ok(())
}

/// One line per report: `source<location>: temp°F, hum% RH, notes`.
fn render_report(report: &WeatherReport) -> String {
    let notes = report
        .notes
        .as_ref()
        .map(|n| format!(", {n}"))
        .unwrap_or_default();
    format!(
        "{}<{}>: {}°F, {:.0}% RH{notes}",
        report.source, report.location, report.temperature_f, report.relative_humidity_pct
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_with_notes() {
        let report = WeatherReport {
            source: "OpenWeatherMap".to_string(),
            location: "New York".to_string(),
            temperature_f: 34.16,
            relative_humidity_pct: 94.0,
            notes: Some("light snow".to_string()),
        };

        assert_eq!(
            render_report(&report),
            "OpenWeatherMap<New York>: 34.16°F, 94% RH, light snow"
        );
    }

    #[test]
    fn render_rounds_humidity_and_skips_missing_notes() {
        let report = WeatherReport {
            source: "DarkSky".to_string(),
            location: "(35, -112)".to_string(),
            temperature_f: 43.11,
            relative_humidity_pct: 30.27,
            notes: None,
        };

        assert_eq!(
            render_report(&report),
            "DarkSky<(35, -112)>: 43.11°F, 30% RH"
        );
    }

    #[test]
    fn unconfigured_provider_fails_before_any_dispatch() {
        let mut config = Config::default();
        config.upsert_provider_api_key(ProviderId::DarkSky, "KEY".to_string());

        let ids = [ProviderId::DarkSky, ProviderId::WeatherUnderground];
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new());

        let err = build_providers(&ids, &config, transport).unwrap_err();
        let msg = err.to_string();
        assert!(
            msg.contains("No API key configured for provider 'wunderground'"),
            "{msg}"
        );
    }

    #[test]
    fn configured_providers_keep_requested_order() {
        let mut config = Config::default();
        config.upsert_provider_api_key(ProviderId::DarkSky, "DS".to_string());
        config.upsert_provider_api_key(ProviderId::WeatherUnderground, "WU".to_string());

        let ids = [ProviderId::WeatherUnderground, ProviderId::DarkSky];
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new());

        let providers = build_providers(&ids, &config, transport).unwrap();
        let names: Vec<_> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["WeatherUnderground", "DarkSky"]);
    }

    #[test]
    fn show_accepts_repeated_providers() {
        let cli = Cli::try_parse_from([
            "weatherscope",
            "show",
            "Sandy",
            "-p",
            "darksky",
            "--provider",
            "wunderground",
        ])
        .unwrap();

        match cli.command {
            Command::Show { query, providers } => {
                assert_eq!(query, "Sandy");
                assert_eq!(providers, vec!["darksky", "wunderground"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
