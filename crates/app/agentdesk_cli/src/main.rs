//! Agentdesk CLI: hosts one session manager per process over the
//! file-backed persisted session.

// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::sync::Arc;

use agentdesk_api_client::bootstrap::{BaseUrlSource, StaticBaseUrl};
use agentdesk_api_client::{ApiClient, ClientConfig};
use agentdesk_core::config::SessionConfig;
use agentdesk_core::models::auth::LoginRequest;
use agentdesk_core::session::guard::LogNavigator;
use agentdesk_core::session::machine::Session;
use agentdesk_core::session::manager::SessionManager;
use agentdesk_core::session::scheduler::{RevalidationScheduler, Visibility};
use agentdesk_core::session::storage::FileStorage;
use agentdesk_core::session::store::SessionStore;
use clap::Parser;
use cli::{Cli, Commands};
use tracing::{debug, info};

mod cli;
mod logging;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("{}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> Result<()> {
    if let Commands::Version = args.command {
        println!("{} {}", env!("CARGO_PKG_NAME"), agentdesk_core::version());
        return Ok(());
    }

    let mut session_config = SessionConfig::from_env();
    if let Some(dir) = &args.state_dir {
        session_config.storage_path = dir.join("session.json");
    }
    let manager = Arc::new(build_manager(&args, &session_config)?);

    match args.command {
        Commands::Status { json } => {
            let session = manager.initialize().await;
            print_session(&session, json)?;
        }
        Commands::Login {
            username,
            password,
            ip_address,
            return_to,
        } => {
            let user = manager
                .login(&LoginRequest {
                    username,
                    password,
                    ip_address,
                    return_to,
                })
                .await?;
            println!("logged in as {} ({})", user.email(), user.role());
        }
        Commands::Logout => {
            manager.logout().await;
            println!("logged out");
        }
        Commands::Watch => watch(manager, &session_config).await?,
        Commands::Version => {}
    }
    Ok(())
}

fn build_manager(args: &Cli, session_config: &SessionConfig) -> Result<SessionManager> {
    let client_config = ClientConfig::from_env();
    let source: Arc<dyn BaseUrlSource> = match args.api_url.as_deref() {
        Some(url) if !url.trim().is_empty() => Arc::new(StaticBaseUrl(url.to_string())),
        _ => client_config.base_url_source(),
    };
    let storage = FileStorage::new(&session_config.storage_path);
    debug!(path = %storage.path().display(), "persisted session file");
    let store = SessionStore::new(Arc::new(storage));
    let client = Arc::new(ApiClient::new(&client_config, source)?.with_session_store(store.clone()));
    Ok(SessionManager::new(
        store,
        client.clone(),
        client,
        Arc::new(LogNavigator),
    ))
}

fn print_session(session: &Session, json: bool) -> Result<()> {
    match session.user() {
        Some(user) if session.is_authenticated() => {
            if json {
                println!("{}", serde_json::to_string_pretty(user)?);
            } else {
                println!("authenticated as {} ({}, uid {})", user.email(), user.role(), user.uid());
            }
        }
        _ => println!("unauthenticated"),
    }
    Ok(())
}

async fn watch(manager: Arc<SessionManager>, config: &SessionConfig) -> Result<()> {
    let session = manager.initialize().await;
    if !session.is_authenticated() {
        return Err(Error::Custom("no authenticated session to watch".into()));
    }
    print_session(&session, false)?;

    let mut states = manager.subscribe();
    let visibility = Visibility::new();
    let scheduler = RevalidationScheduler::spawn(manager.clone(), &visibility, config.revalidate_interval);

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("interrupted");
        }
        _ = states.wait_for(|s| !s.is_authenticated()) => {
            println!("session expired, logged out");
        }
    }
    scheduler.shutdown().await;
    Ok(())
}
