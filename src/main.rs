mod age;
mod collector;
mod config;
mod github;
mod markdown;
mod metrics;
mod output;
mod stats;
mod streak;
mod svg;

#[cfg(test)]
mod test_utils;

use anyhow::Context;
use chrono::Utc;
use config::{Config, ConfigError};
use github::GithubClient;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e @ ConfigError::MissingToken) => {
            log::error!("{e}");
            return Ok(ExitCode::from(1));
        }
        Err(e) => return Err(e).context("Invalid configuration"),
    };

    let client = GithubClient::new(&config.token, &config.api_url)?;
    log::info!("Generating profile badge for {}", config.username);

    let stats = stats::assemble(
        &client,
        &config.username,
        Utc::now(),
        config.assemble_options(),
    )
    .await?;

    let artifacts = [
        (
            svg::Theme::Dark.file_name(),
            svg::generate_svg(&stats, svg::Theme::Dark),
        ),
        (
            svg::Theme::Light.file_name(),
            svg::generate_svg(&stats, svg::Theme::Light),
        ),
        ("README.md", markdown::generate_markdown(&stats)),
    ];

    let written = output::write_all(&config.output_dir, &artifacts)?;
    for path in &written {
        log::info!("Generated {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}
