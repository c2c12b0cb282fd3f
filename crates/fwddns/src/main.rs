// # fwddns - Firewall allow-list sync
//
// Thin integration layer: resolve configuration, wire up the IP source and
// the Robot API client, run one sync pass, print one message.
// All sync logic lives in fwddns-core.
//
// Meant to be run periodically (cron, systemd timer).
//
// ## Configuration
//
// ### Environment (or `.env` file)
// - `HETZNER_SERVER_ID`: Robot server number (required)
// - `HETZNER_API_USER`: Webservice user (required)
// - `HETZNER_API_PASSWORD`: Webservice password (required)
// - `API_BASE_URL`: Robot webservice URL (default: https://robot-ws.your-server.de)
// - `FWDDNS_MODE`: Set to `dry-run` to skip submission
// - `FWDDNS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `FWDDNS_SETTINGS`: Settings file path (default: config.json)
// - `FWDDNS_ENV_FILE`: Env file path (default: .env)
// - `FWDDNS_STRICT_EXIT`: Set to `true` to exit non-zero on failure (default: false)
//
// ### Settings file
// - `rule_names`: Input rules whose source IP is managed
// - `debug`: Dump requests and responses
// - `request_timeout_secs`: Per-request timeout (default: 30)
//
// ## Example
//
// ```bash
// export HETZNER_SERVER_ID=321
// export HETZNER_API_USER='#ws+AbCdEfGh'
// export HETZNER_API_PASSWORD=...
// echo '{"rule_names": ["home ssh"], "debug": false}' > config.json
//
// fwddns
// ```

use fwddns_core::config::{ConfigSources, DEFAULT_ENV_FILE, DEFAULT_SETTINGS_PATH};
use fwddns_core::{Configuration, Error, ErrorKind, Stage, SyncEngine, SyncFailure};
use fwddns_ip_http::HttpIpSource;
use fwddns_provider_hetzner::HetznerFirewall;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// A failed run prints its message and still exits 0 unless
/// `FWDDNS_STRICT_EXIT` is set. In strict mode the codes follow systemd
/// conventions:
/// - 0: Run completed (updated, unchanged or dry run)
/// - 1: Configuration error
/// - 2: Runtime error (network, parse, API)
#[derive(Debug, Clone, Copy)]
enum FwddnsExitCode {
    /// Run completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<FwddnsExitCode> for ExitCode {
    fn from(code: FwddnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<ErrorKind> for FwddnsExitCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Config => FwddnsExitCode::ConfigError,
            ErrorKind::Network | ErrorKind::Parse | ErrorKind::Api => FwddnsExitCode::RuntimeError,
        }
    }
}

/// Whether failures map to non-zero exit codes, per `FWDDNS_STRICT_EXIT`
fn strict_exit() -> bool {
    env::var("FWDDNS_STRICT_EXIT")
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Exit code for a reported failure
fn failure_exit(code: FwddnsExitCode, strict: bool) -> ExitCode {
    if strict {
        code.into()
    } else {
        FwddnsExitCode::Success.into()
    }
}

/// Where to read configuration from, per `FWDDNS_SETTINGS` / `FWDDNS_ENV_FILE`
fn config_sources() -> ConfigSources {
    let settings =
        env::var("FWDDNS_SETTINGS").unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    let env_file = env::var("FWDDNS_ENV_FILE").unwrap_or_else(|_| DEFAULT_ENV_FILE.to_string());

    ConfigSources::new(settings).with_env_file(env_file)
}

/// Log level from `FWDDNS_LOG_LEVEL`, raised to debug when debug mode is on
fn log_level(debug: bool) -> anyhow::Result<Level> {
    if debug {
        return Ok(Level::DEBUG);
    }

    let raw = env::var("FWDDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    match raw.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "FWDDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            raw
        ),
    }
}

/// Print the failure message, plus HTTP diagnostics in debug mode
fn report_error(error: &Error, debug: bool) {
    eprintln!("{}", error.user_message());
    if debug && let Some(diagnostics) = error.diagnostics() {
        eprintln!("{}", diagnostics);
    }
}

fn main() -> ExitCode {
    let strict = strict_exit();

    // Load configuration (Init -> ConfigLoaded)
    let config = match Configuration::resolve(&config_sources()) {
        Ok(cfg) => cfg,
        Err(error) => {
            let failure = SyncFailure {
                stage: Stage::Init,
                error,
            };
            report_error(&failure.error, false);
            return failure_exit(failure.kind().into(), strict);
        }
    };

    // Initialize tracing
    let level = match log_level(config.debug) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return failure_exit(FwddnsExitCode::ConfigError, strict);
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return failure_exit(FwddnsExitCode::ConfigError, strict);
    }

    info!(
        "Configuration loaded: server {}, {} managed rule(s){}",
        config.server_id,
        config.rule_names.len(),
        if config.dry_run { " [DRY-RUN]" } else { "" }
    );

    // Single-threaded runtime: every call is awaited in sequence
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return failure_exit(FwddnsExitCode::RuntimeError, strict);
        }
    };

    let debug = config.debug;
    let result = rt.block_on(run(config));

    match result {
        Ok(message) => {
            println!("{}", message);
            FwddnsExitCode::Success.into()
        }
        Err(failure) => {
            error!("{}", failure);
            report_error(&failure.error, debug);
            failure_exit(failure.kind().into(), strict)
        }
    }
}

/// Build the collaborators and run one sync pass
async fn run(config: Configuration) -> Result<String, SyncFailure> {
    let startup = |error| SyncFailure {
        stage: Stage::ConfigLoaded,
        error,
    };

    let ip_source = HttpIpSource::with_url(fwddns_ip_http::IPIFY_URL, config.request_timeout)
        .map_err(startup)?;
    let firewall = HetznerFirewall::new(&config).map_err(startup)?;

    let engine = SyncEngine::new(Box::new(ip_source), Box::new(firewall), config);
    let outcome = engine.run().await?;

    Ok(outcome.message())
}
