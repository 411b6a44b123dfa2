//! Motospec CLI: scrape the catalogue into a JSON-lines file.

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use args::Cli;
use motospec::core::Item;
use motospec::errors::{ErrorKind, OutputError};
use motospec::fetch::HttpFetcher;
use motospec::observability::init_logging;
use motospec::output::JsonLinesWriter;
use motospec::pipeline::{PipelineBuilder, PipelineHandles};
use motospec::stages::default_chain;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config().context("invalid configuration")?;
    init_logging(&config.logs, cli.verbose).context("cannot set up logging")?;

    let sink = config.logs.error_sink().context("cannot open error logs")?;
    let fetcher = HttpFetcher::new(config.fetch.clone()).context("cannot build HTTP client")?;
    let mut writer = JsonLinesWriter::open(&config.output_path)
        .with_context(|| format!("cannot open {}", config.output_path.display()))?;

    let (pipeline, handles) = PipelineBuilder::new(Arc::new(fetcher))
        .stages(default_chain(&config.selectors))
        .interval(config.interval())
        .retry(config.fetch.retry.clone())
        .error_sink(sink)
        .build();
    let PipelineHandles {
        input,
        mut output,
        cancel,
        ..
    } = handles;

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, shutting down");
            interrupt.cancel("interrupted");
        }
    });

    info!(start_url = %config.start_url, interval = ?config.interval(), "scraping");
    let run = tokio::spawn(pipeline.run());
    if input.send(Item::from(config.start_url.as_str())).await.is_err() {
        warn!("pipeline stopped before the start url was accepted");
    }
    drop(input);

    let mut failure: Option<OutputError> = None;
    while let Some(item) = output.recv().await {
        let Item::Spec(spec) = item else {
            warn!(%item, "ignoring non-spec output");
            continue;
        };
        println!("{} {} {} {}", spec.brand, spec.model, spec.moto, spec.year);
        if failure.is_some() {
            continue;
        }
        if let Err(e) = writer.write_spec(&spec) {
            error!("cannot write {}: {}", writer.path().display(), e);
            cancel.cancel("output failed");
            failure = Some(e);
        }
    }

    let report = run.await.context("pipeline task failed")?;
    println!(
        "{} specs written to {} in {:.1}s; {} errors ({} transport, {} processing){}",
        writer.written(),
        writer.path().display(),
        Duration::from_millis(report.duration_ms).as_secs_f64(),
        report.errors.total(),
        report.errors.transport(),
        report.errors.get(ErrorKind::Processing),
        if report.cancelled { ", cancelled" } else { "" }
    );

    match failure {
        Some(e) => Err(e).context("writing specs failed"),
        None => Ok(()),
    }
}
