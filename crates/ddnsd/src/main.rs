// # ddnsd - DDNS Daemon
//
// The ddnsd daemon is a thin integration layer responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Verifying the registrar credentials
// 4. Wiring the registrar and address sources into the engine
// 5. Running reconciliation cycles until SIGTERM/SIGINT
//
// All reconciliation logic lives in ddns-core.
//
// ## Configuration
//
// See `settings.rs` for the full list of environment variables.
//
// ## Example
//
// ```bash
// export APIKEY=pk1_...
// export SECRETKEY=sk1_...
// export DOMAINS=example.com,home.example.com
// export IPV6=prefix-only
// export TIMEOUT=300
//
// ddnsd
// ```

mod settings;

use anyhow::Result;
use ddns_core::ReconcileEngine;
use ddns_core::domain::is_valid_fqdn;
use ddns_ip_fritzbox::FritzBoxSource;
use ddns_ip_http::HttpAddressSource;
use ddns_registrar_porkbun::PorkbunRegistrar;
use settings::Settings;
use std::future::Future;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load and validate configuration from environment
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");
    info!(
        "Configuration loaded: {} domain(s), IPv4 {}, IPv6 {}, interval {}s",
        settings.config.domains.len(),
        settings.config.ipv4,
        settings.config.ipv6,
        settings.config.engine.interval_secs
    );

    for domain in &settings.config.domains {
        if is_valid_fqdn(domain) {
            info!("Managing domain: {}", domain);
        } else {
            warn!("Domain {} is not a valid FQDN and will not be updated", domain);
        }
    }

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let engine = match start(settings).await {
            Ok(engine) => engine,
            Err(e) => {
                error!("Startup failed: {}", e);
                return DdnsExitCode::ConfigError;
            }
        };

        let shutdown = match shutdown_signal() {
            Ok(shutdown) => shutdown,
            Err(e) => {
                error!("{}", e);
                return DdnsExitCode::RuntimeError;
            }
        };

        if let Err(e) = engine.run_until(shutdown).await {
            error!("Daemon error: {}", e);
            DdnsExitCode::RuntimeError
        } else {
            info!("Shutting down daemon");
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Build the collaborators, verify the keys and create the engine
async fn start(settings: Settings) -> Result<ReconcileEngine> {
    let config = settings.config;

    let registrar = PorkbunRegistrar::new(&config.registrar)?;
    match registrar.ping().await {
        Ok(seen_as) => {
            info!("APIKEY and SECRETKEY successfully validated");
            if let Some(addr) = seen_as {
                info!("Registrar sees this host as {}", addr);
            }
        }
        Err(e) => anyhow::bail!(
            "APIKEY or SECRETKEY could not be validated (this may be temporary): {}",
            e
        ),
    }

    let router = FritzBoxSource::new(&config.router)?;
    let host = HttpAddressSource::new(&config.host_ip)?;

    let engine = ReconcileEngine::new(
        Box::new(registrar),
        Box::new(router),
        Box::new(host),
        config,
    )?;

    Ok(engine)
}

/// Resolve on SIGTERM or SIGINT
///
/// Handlers are installed before returning so that a signal arriving during
/// the first cycle is not lost.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        let received = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", received);
    })
}

/// Resolve on Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal: SIGINT"),
            Err(e) => {
                error!("Failed to wait for CTRL-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    })
}
