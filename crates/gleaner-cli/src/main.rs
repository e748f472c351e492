mod cli;
mod error;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use gleaner_core::{
    merged_metrics, CacheStore, ConcurrentDispatcher, MetricsSummary, ProxyPool, RetrievalConfig,
    Source, SourceFetchOutcome, StaticSource,
};

use crate::cli::{CacheAction, Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let args = Cli::parse();

    let mut config = RetrievalConfig::from_env();
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = dir.clone();
    }
    if let Some(path) = &args.proxy_file {
        config.proxy_file = path.clone();
    }

    match &args.command {
        Command::Fetch { sources } => fetch(&args, config, sources).await,
        Command::Cache { action } => cache(&args, config, action).await,
        Command::Proxies => proxies(&args, config),
    }
}

/// One source's row in the fetch report. Bodies go to the extraction stage,
/// not to stdout; the report carries counts and failure descriptors.
#[derive(Debug, Serialize)]
struct SourceReport {
    source: String,
    pages: usize,
    error: Option<String>,
    metrics: MetricsSummary,
}

#[derive(Debug, Serialize)]
struct FetchReport {
    sources: Vec<SourceReport>,
    metrics: MetricsSummary,
}

async fn fetch(
    args: &Cli,
    config: RetrievalConfig,
    sources_path: &std::path::Path,
) -> Result<ExitCode, CliError> {
    let contents =
        std::fs::read_to_string(sources_path).map_err(|source| CliError::SourceList {
            path: sources_path.display().to_string(),
            source,
        })?;
    let sources = parse_sources(&contents)?;

    let dispatcher = ConcurrentDispatcher::new(config);
    let outcomes = dispatcher.dispatch_all(&sources).await;

    let report = FetchReport {
        metrics: merged_metrics(&outcomes),
        sources: outcomes.iter().map(source_report).collect(),
    };
    render(args, &report)?;

    if outcomes.iter().any(|outcome| !outcome.is_success()) {
        return Ok(ExitCode::from(3));
    }
    Ok(ExitCode::SUCCESS)
}

fn source_report(outcome: &SourceFetchOutcome) -> SourceReport {
    SourceReport {
        source: outcome.source.as_str().to_owned(),
        pages: outcome.bodies().len(),
        error: outcome.result.as_ref().err().map(|f| f.message.clone()),
        metrics: outcome.metrics,
    }
}

async fn cache(
    args: &Cli,
    config: RetrievalConfig,
    action: &CacheAction,
) -> Result<ExitCode, CliError> {
    let store = CacheStore::new(&config.cache_dir, config.cache_ttl);

    match action {
        CacheAction::Stats => render(args, &store.stats().await)?,
        CacheAction::Clear => {
            store.clear().await;
            render(args, &store.stats().await)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn proxies(args: &Cli, config: RetrievalConfig) -> Result<ExitCode, CliError> {
    let pool = ProxyPool::from_file(&config.proxy_file);
    render(args, &pool.stats())?;
    Ok(ExitCode::SUCCESS)
}

fn render<T: Serialize>(args: &Cli, value: &T) -> Result<(), CliError> {
    let output = if args.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}

/// Parse a `name url` per-line source list; repeated names group their URLs
/// in first-seen order.
fn parse_sources(contents: &str) -> Result<Vec<Arc<dyn Source>>, CliError> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();

    for (index, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let (Some(name), Some(url)) = (parts.next(), parts.next()) else {
            return Err(CliError::InvalidSourceLine {
                line: index + 1,
                text: line.to_owned(),
            });
        };

        let urls: Vec<String> = std::iter::once(url)
            .chain(parts)
            .map(str::to_owned)
            .collect();

        match grouped.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, existing_urls)) => existing_urls.extend(urls),
            None => grouped.push((name.to_owned(), urls)),
        }
    }

    Ok(grouped
        .into_iter()
        .map(|(name, urls)| Arc::new(StaticSource::new(name.as_str(), urls)) as Arc<dyn Source>)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_lines_group_by_name_and_skip_comments() {
        let contents = "\
# sources
revolico https://www.revolico.com/empleos

cubisima https://www.cubisima.com/empleos/ofertas/marketing
cubisima https://www.cubisima.com/empleos/ofertas/informatica
cucoders https://cucoders.dev/empleos/ https://cucoders.dev/empleos/remoto
";
        let sources = parse_sources(contents).expect("valid list");

        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].id().as_str(), "revolico");
        assert_eq!(sources[1].page_urls().len(), 2);
        assert_eq!(sources[2].page_urls().len(), 2);
    }

    #[test]
    fn a_line_without_a_url_is_rejected() {
        let error = parse_sources("revolico\n").err().expect("missing url");
        assert!(matches!(error, CliError::InvalidSourceLine { line: 1, .. }));
    }
}
