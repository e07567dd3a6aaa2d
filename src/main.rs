//! ScaleHub CLI
//!
//! Command-line client for the scale monitoring platform: log in, list
//! scales, and stream live telemetry.

use clap::{Parser, Subcommand};
use scalehub::api::ApiClient;
use scalehub::auth::{FileSessionStore, SessionManager};
use scalehub::config::{generate_default_config, Config};
use scalehub::realtime::RealtimeClient;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scalehub", version, about = "Scale monitoring platform client")]
struct Cli {
    /// Path to a config file (default: standard locations)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session
    Login {
        username: String,
        password: String,
    },
    /// Log out and clear the persisted session
    Logout,
    /// Show the currently authenticated user
    Whoami,
    /// List registered scales
    Scales,
    /// Stream live telemetry to stdout until interrupted
    Monitor {
        /// Watch a single scale instead of all of them
        #[arg(short, long)]
        scale: Option<i64>,
    },
    /// Print a default configuration file
    GenerateConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_logging(&config);

    match cli.command {
        Commands::Login { username, password } => {
            let session = session_manager(&config);
            let user = session.login(&username, &password).await?;
            println!("Logged in as {} ({})", user.username, user.full_name);
        }
        Commands::Logout => {
            let session = session_manager(&config);
            session.restore()?;
            session.logout().await;
            println!("Logged out");
        }
        Commands::Whoami => {
            let session = session_manager(&config);
            if !session.restore()? {
                anyhow::bail!("Not logged in");
            }
            match session.user() {
                Some(user) => {
                    println!("{} ({})", user.username, user.full_name);
                    for role in &user.roles {
                        println!("  role: {}", role.normalized_code());
                    }
                }
                None => anyhow::bail!("Not logged in"),
            }
        }
        Commands::Scales => {
            let session = Arc::new(session_manager(&config));
            if !session.restore()? {
                anyhow::bail!("Not logged in, run `scalehub login` first");
            }
            let api = ApiClient::new(&config.api, Arc::clone(&session));
            let scales = api.scales().list().await?;
            for scale in &scales {
                println!(
                    "{:>5}  {:<24}  {}",
                    scale.id,
                    scale.name,
                    scale
                        .status
                        .map(|s| format!("{:?}", s))
                        .unwrap_or_else(|| "-".to_string())
                );
            }
            println!("{} scales", scales.len());
        }
        Commands::Monitor { scale } => {
            monitor(&config, scale).await?;
        }
        Commands::GenerateConfig => {
            print!("{}", generate_default_config());
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("scalehub={}", config.logging.level)),
    );

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn session_manager(config: &Config) -> SessionManager {
    let store = FileSessionStore::new(Path::new(&config.session.storage_dir));
    SessionManager::new(
        config.api.base_url.clone(),
        Duration::from_secs(config.api.request_timeout_secs),
        Box::new(store),
    )
}

async fn monitor(config: &Config, scale: Option<i64>) -> anyhow::Result<()> {
    let realtime = RealtimeClient::new(config.realtime.clone());
    let store = realtime.snapshots();
    let mut updates = store.watch();
    let mut connected = realtime.connected();

    realtime.connect();

    // Wait for the first connection before subscribing; subscriptions
    // registered after that survive reconnects on their own.
    tokio::time::timeout(Duration::from_secs(30), async {
        while !*connected.borrow_and_update() {
            connected.changed().await?;
        }
        Ok::<_, tokio::sync::watch::error::RecvError>(())
    })
    .await
    .map_err(|_| anyhow::anyhow!("Timed out connecting to {}", config.realtime.url))??;

    match scale {
        Some(id) => {
            realtime.subscribe(id);
            println!("Watching scale {} (ctrl-c to stop)", id);
        }
        None => {
            realtime.subscribe_all();
            println!("Watching all scales (ctrl-c to stop)");
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = updates.recv() => match update {
                Ok(snapshot) => {
                    println!(
                        "[{}] scale {} {:?} {}",
                        snapshot.last_time,
                        snapshot.scale_id,
                        snapshot.status,
                        snapshot.data1.as_deref().unwrap_or("-"),
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Dropped {} updates, output lagging", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    realtime.shutdown().await;
    Ok(())
}
