// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Papiertiger — virtual IPP printer daemon.
//
// Entry point. Initialises logging, loads configuration, wires the spool
// into the job store, starts the IPP server, registers the mDNS
// advertisement, and runs until interrupted.  Shutdown order matters:
// the advertisement is withdrawn before the listener is released so
// clients stop discovering a printer that no longer answers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use papiertiger_core::config::PrinterConfig;
use papiertiger_core::error::Result;
use papiertiger_print::{Dispatcher, IppServer, JobStore, PrinterAdvertiser};
use papiertiger_print::hostname::{machine_hostname, sanitize_label};
use papiertiger_spool::{Convert, FileSpool, Ghostscript};

/// How often expired jobs are purged from the registry.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Papiertiger starting");

    if let Err(e) = run().await {
        error!(error = %e, "fatal startup error");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Arc::new(PrinterConfig::load_or_default(config_path.as_deref()));

    // Spool directory plus optional Ghostscript conversion.
    let converter: Option<Arc<dyn Convert>> = if config.convert_to_pdf {
        Some(Arc::new(Ghostscript::new(Duration::from_secs(
            config.convert_timeout_secs,
        ))))
    } else {
        None
    };
    let spool = Arc::new(FileSpool::new(&config.spool_dir, converter)?);

    let store = Arc::new(JobStore::new(Some(spool.clone())));
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&store), Arc::clone(&config)));

    // Bind the listener first; advertising a dead port helps nobody.
    let mut server = IppServer::new(config.port);
    server.start(dispatcher).await?;

    // Register the mDNS advertisement. Failure is fatal: an unadvertised
    // virtual printer cannot be discovered by anything.
    let mut advertiser = PrinterAdvertiser::new()?;
    advertiser.register(&config)?;

    // Periodically drop expired terminal jobs to bound memory.
    let sweeper = {
        let store = Arc::clone(&store);
        let retention = chrono::Duration::seconds(config.retention_secs as i64);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                store.purge_expired(retention);
            }
        })
    };

    let host = sanitize_label(&machine_hostname());
    info!(
        printer = %config.printer_name,
        uri = %config.printer_uri(&format!("{host}.local")),
        spool_dir = %spool.dir().display(),
        pdf_conversion = config.convert_to_pdf,
        "printer ready — press Ctrl+C to stop"
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(papiertiger_core::PrinterError::Io)?;
    info!("shutting down");

    sweeper.abort();
    advertiser.shutdown();
    server.stop().await?;

    info!("server stopped");
    Ok(())
}
