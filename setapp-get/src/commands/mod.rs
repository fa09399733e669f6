pub mod install;
pub mod list;

use crate::cli::{Cli, Command};
use crate::reporter::ConsoleReporter;
use anyhow::Result;
use setapp_lib::{
    CacheStore, Capabilities, CatalogClient, CatalogError, CatalogIndex, CatalogSource,
    HttpCatalogSource, InstallerConfig, ProgressReporter,
};
use std::io::Write;
use std::sync::Arc;

/// How a command finished, mapped to an exit code by `main`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Nothing to do with the given arguments; print usage
    Usage,
    UnknownCommand(String),
}

/// Everything a command needs from the outside world
pub struct Services {
    pub config: InstallerConfig,
    pub source: Arc<dyn CatalogSource>,
    pub capabilities: Capabilities,
    pub reporter: Arc<dyn ProgressReporter>,
}

impl Services {
    pub fn system(config: InstallerConfig, use_sudo: bool) -> Result<Self> {
        let source = HttpCatalogSource::new(
            config.catalog_url.clone(),
            config.request_timeout,
            config.fetch_attempts,
        )?;
        let capabilities = Capabilities::system(&config, use_sudo)?;
        Ok(Self {
            config,
            source: Arc::new(source),
            capabilities,
            reporter: Arc::new(ConsoleReporter::stderr()),
        })
    }
}

/// Environment overrides first, then command-line flags
pub fn config_from_cli(cli: &Cli) -> InstallerConfig {
    let mut config = InstallerConfig::from_env();
    if let Some(destination) = &cli.destination {
        config.destination = destination.clone();
    }
    config
}

pub async fn dispatch(
    command: Option<Command>,
    services: &Services,
    refresh: bool,
    out: &mut dyn Write,
) -> Result<Outcome> {
    match command {
        None => Ok(Outcome::Usage),
        Some(Command::Install(args)) => install::execute(services, &args, refresh, out).await,
        Some(Command::List) => list::execute(services, refresh, out).await,
        Some(Command::Other(args)) => Ok(Outcome::UnknownCommand(
            args.into_iter().next().unwrap_or_default(),
        )),
    }
}

/// Fetch (or reuse) the catalog and index it. An unavailable catalog ends the
/// run.
pub async fn load_index(services: &Services, refresh: bool) -> Result<CatalogIndex, CatalogError> {
    let client = CatalogClient::new(
        CacheStore::new(&services.config.cache_path),
        services.source.clone(),
        services.config.cache_fallback,
    )
    .force_refresh(refresh);

    let document = client
        .get_catalog(chrono::Utc::now().timestamp_millis())
        .await?;
    let index = CatalogIndex::build(&document);
    log::info!("Catalog indexed: {} application(s)", index.len());
    Ok(index)
}
