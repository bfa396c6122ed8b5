// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use clap::{Parser, Subcommand};
use stark_refiner::app::config::{GlobalSettings, PriceSourceKind};
use stark_refiner::app::logging::{LogSink, MemorySink, TeeSink, TracingSink, setup_logging};
use stark_refiner::common::constants::{SECRET_INFLUENCE_API_KEY, SECRET_SESSION_KEY};
use stark_refiner::core::driver::{Driver, poll_status, pulse};
use stark_refiner::core::supply_chain::SupplyChainGraph;
use stark_refiner::core::{Strategy, StrategyDeps};
use stark_refiner::domain::error::{AppError, VaultError};
use stark_refiner::network::endpoint_pool::EndpointPool;
use stark_refiner::network::influence::{GameStateProvider, InfluenceClient};
use stark_refiner::network::price_feed::{PriceSource, StaticPriceSource};
use stark_refiner::network::provider::{ChainClient, StarknetClient};
use stark_refiner::security::{KdfParams, SessionKey, Vault};
use std::io::{BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use zeroize::Zeroizing;

const VAULT_PASSWORD_ENV: &str = "VAULT_PASSWORD";
const RECENT_LOG_LINES: usize = 256;
const SHUTDOWN_TAIL_LINES: usize = 12;
const ENV_FILE: &str = ".env";

#[derive(Parser, Debug)]
#[command(author, version, about = "Guarded refining loop for Influence on Starknet")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long, global = true)]
    config: Option<String>,

    /// Force dry-run regardless of config/env
    #[arg(long, global = true, default_value_t = false)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty encrypted vault
    Init,
    /// Store the Influence API key and provision a session key
    Wizard {
        /// Replace an existing session key
        #[arg(long, default_value_t = false)]
        rotate_session_key: bool,
    },
    /// Run the strategy loop until interrupted
    Start,
    /// Run exactly one tick; the exit code reports the decision
    Pulse,
    /// Print chain status, endpoint health and key state
    Status,
}

#[tokio::main]
async fn main() -> Result<ExitCode, AppError> {
    let cli = Cli::parse();

    let mut settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    if cli.dry_run {
        settings.dry_run = true;
    }
    setup_logging(settings.log_level(), settings.log_json);

    match cli.command {
        Command::Init => init_vault(&settings)?,
        Command::Wizard { rotate_session_key } => {
            run_wizard(&settings, rotate_session_key).await?
        }
        Command::Start => run_loop(&settings).await?,
        Command::Pulse => return run_pulse(&settings).await,
        Command::Status => show_status(&settings).await?,
    }
    Ok(ExitCode::SUCCESS)
}

fn vault_password(confirm: bool) -> Result<Zeroizing<String>, AppError> {
    if let Ok(pw) = std::env::var(VAULT_PASSWORD_ENV)
        && !pw.is_empty()
    {
        return Ok(Zeroizing::new(pw));
    }
    let first = prompt_line("Vault password: ")?;
    if first.is_empty() {
        return Err(AppError::Config("Empty vault password".into()));
    }
    if confirm {
        let second = prompt_line("Confirm password: ")?;
        if *first != *second {
            return Err(AppError::Config("Passwords do not match".into()));
        }
    }
    Ok(first)
}

fn prompt_line(prompt: &str) -> Result<Zeroizing<String>, AppError> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{prompt}")
        .and_then(|_| stdout.flush())
        .map_err(|e| AppError::Initialization(format!("stdout: {e}")))?;
    let mut line = Zeroizing::new(String::new());
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| AppError::Initialization(format!("stdin: {e}")))?;
    Ok(Zeroizing::new(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn unlock_vault(path: &Path) -> Result<Vault, AppError> {
    let password = vault_password(false)?;
    Ok(Vault::unlock(path, &password)?)
}

fn init_vault(settings: &GlobalSettings) -> Result<(), AppError> {
    let path = settings.vault_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(VaultError::from)?;
    }
    let password = vault_password(true)?;
    let vault = Vault::create(&path, &password, KdfParams::default())?;
    tracing::info!(target: "vault", path = %vault.path().display(), "Vault created");
    println!("Vault created at {}", vault.path().display());
    Ok(())
}

async fn run_wizard(settings: &GlobalSettings, rotate_session_key: bool) -> Result<(), AppError> {
    let rpc_url = prompt_line("Starknet RPC URL (blank to keep current): ")?;
    let rpc_url = rpc_url.trim();
    if !rpc_url.is_empty() {
        configure_endpoint(settings, rpc_url).await?;
    }

    let path = settings.vault_path();
    let mut vault = unlock_vault(&path)?;

    let api_key = prompt_line("Influence API key (blank to keep current): ")?;
    if !api_key.trim().is_empty() {
        vault.store_secret(SECRET_INFLUENCE_API_KEY, api_key.trim().as_bytes())?;
        println!("Stored Influence API key");
    }

    if vault.has_secret(SECRET_SESSION_KEY) && !rotate_session_key {
        let existing = SessionKey::load(&vault)?;
        println!(
            "Session key already present: {}",
            existing.public_key().unwrap_or_default()
        );
        return Ok(());
    }

    let key = SessionKey::generate();
    key.store(&mut vault)?;
    let public_key = key.public_key().unwrap_or_default();
    tracing::info!(target: "vault", public_key = %public_key, "Session key provisioned");
    println!("Session key public key: {public_key}");
    println!("Register this key with your account before disabling dry-run.");
    Ok(())
}

/// Check the endpoint answers once, then persist it to `.env` as `STARKNET_RPC_URL`.
async fn configure_endpoint(settings: &GlobalSettings, rpc_url: &str) -> Result<(), AppError> {
    url::Url::parse(rpc_url).map_err(|e| AppError::Validation {
        field: "STARKNET_RPC_URL".into(),
        message: e.to_string(),
    })?;
    let pool = EndpointPool::new([rpc_url], settings.pool_policy())?;
    let probe = StarknetClient::new(Arc::new(pool))?;
    match probe.network_status().await {
        Ok(status) => println!(
            "Endpoint reachable: block {} | gas {:.2} gwei",
            status.block_height,
            status.gas_price_gwei()
        ),
        Err(e) => {
            tracing::warn!(target: "config", error = %e, "Endpoint probe failed; saving anyway");
            println!("Endpoint did not answer ({e}); saved anyway");
        }
    }
    upsert_env_var(Path::new(ENV_FILE), "STARKNET_RPC_URL", rpc_url)
        .map_err(|e| AppError::Initialization(format!("{ENV_FILE}: {e}")))?;
    println!("Saved STARKNET_RPC_URL to {ENV_FILE}");
    Ok(())
}

fn upsert_env_var(path: &Path, key: &str, value: &str) -> std::io::Result<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(body) => body,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };
    let prefix = format!("{key}=");
    let mut replaced = false;
    let mut lines: Vec<String> = existing
        .lines()
        .map(|line| {
            if line.trim_start().starts_with(&prefix) {
                replaced = true;
                format!("{key}={value}")
            } else {
                line.to_string()
            }
        })
        .collect();
    if !replaced {
        lines.push(format!("{key}={value}"));
    }
    std::fs::write(path, lines.join("\n") + "\n")
}

fn build_chain(settings: &GlobalSettings) -> Result<Arc<StarknetClient>, AppError> {
    let pool = EndpointPool::new(settings.rpc_urls(), settings.pool_policy())?;
    Ok(Arc::new(StarknetClient::new(Arc::new(pool))?))
}

/// Secrets are optional in dry-run. A missing vault leaves the key locked.
fn load_secrets(settings: &GlobalSettings) -> Result<(SessionKey, Option<Zeroizing<String>>), AppError> {
    let path = settings.vault_path();
    if !path.exists() {
        tracing::warn!(target: "vault", path = %path.display(), "No vault found; session key locked");
        return Ok((SessionKey::locked(), None));
    }
    let vault = unlock_vault(&path)?;
    let session_key = SessionKey::load(&vault)?;
    let api_key = vault
        .secret(SECRET_INFLUENCE_API_KEY)?
        .map(|raw| Zeroizing::new(String::from_utf8_lossy(&raw).into_owned()));
    Ok((session_key, api_key))
}

fn build_strategy(
    settings: &GlobalSettings,
    chain: Arc<dyn ChainClient>,
    log: Arc<dyn LogSink>,
) -> Result<Strategy, AppError> {
    let (session_key, api_key) = load_secrets(settings)?;

    let mut influence_config = settings.influence_config();
    influence_config.api_key = api_key;
    let influence = Arc::new(InfluenceClient::new(influence_config)?);

    let prices: Arc<dyn PriceSource> = match settings.price_source_kind()? {
        PriceSourceKind::Influence => influence.clone(),
        PriceSourceKind::Static => Arc::new(StaticPriceSource::new(settings.static_price_map())),
    };
    let game: Arc<dyn GameStateProvider> = influence;

    let deps = StrategyDeps {
        chain,
        game,
        prices,
        session_key: Arc::new(session_key),
        log,
    };
    let graph = SupplyChainGraph::with_defaults(settings.refinery_overhead);
    Ok(Strategy::build(settings.strategy_config()?, graph, deps))
}

/// The strategy (and its session key) is dropped before the code is returned.
async fn run_pulse(settings: &GlobalSettings) -> Result<ExitCode, AppError> {
    let strategy = build_strategy(settings, build_chain(settings)?, Arc::new(TracingSink))?;
    let result = pulse(&strategy).await;
    drop(strategy);
    println!("{} {}", result.decision, result.reason);
    Ok(ExitCode::from(result.exit_code()))
}

async fn run_loop(settings: &GlobalSettings) -> Result<(), AppError> {
    let recent = Arc::new(MemorySink::new(RECENT_LOG_LINES));
    let sinks: Vec<Arc<dyn LogSink>> = vec![Arc::new(TracingSink), recent.clone()];
    let chain = build_chain(settings)?;
    let strategy = Arc::new(build_strategy(settings, chain.clone(), Arc::new(TeeSink(sinks)))?);
    let interval = strategy.config().poll_interval;
    let driver = Driver::new(strategy, settings.wallet_address(), interval);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(target: "strategy", "Shutdown requested");
            signal.cancel();
        }
    });

    let stats = driver.run(shutdown).await;
    let lines = recent.recent();
    println!("Recent activity:");
    for line in lines.iter().skip(lines.len().saturating_sub(SHUTDOWN_TAIL_LINES)) {
        println!("  {line}");
    }
    println!(
        "ticks={} executed={} waited={} stood_down={} failures={}",
        stats.ticks, stats.executed, stats.waited, stats.stood_down, stats.failures
    );
    print_endpoints(&chain);
    Ok(())
}

fn print_endpoints(chain: &StarknetClient) {
    for endpoint in chain.pool().snapshot() {
        let state = match endpoint.cooldown_remaining {
            Some(left) => format!("cooling down ({}s)", left.as_secs()),
            None => "healthy".to_string(),
        };
        println!(
            "  {} failures={} {}",
            endpoint.url, endpoint.consecutive_failures, state
        );
    }
}

async fn show_status(settings: &GlobalSettings) -> Result<(), AppError> {
    let chain = build_chain(settings)?;
    let wallet = settings.wallet_address();
    let status = poll_status(chain.as_ref(), wallet.as_deref()).await;
    println!("{}", status.render());
    print_endpoints(&chain);

    let path = settings.vault_path();
    if path.exists() {
        let vault = unlock_vault(&path)?;
        let key = SessionKey::load(&vault)?;
        match key.public_key() {
            Some(pk) => println!("Session key: {pk}"),
            None => println!("Session key: locked (run `wizard`)"),
        }
    } else {
        println!("Vault: not initialized (run `init`)");
    }
    println!("Mode: {}", if settings.dry_run { "dry-run" } else { "live" });
    Ok(())
}
