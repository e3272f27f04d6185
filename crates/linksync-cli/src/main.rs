mod config;
mod identity;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::CliConfig;
use identity::HttpIdentityProvider;
use linksync_core::notify::{LogNotifier, SystemClipboard, SystemUrlOpener};
use linksync_core::{
    ActionHandler, ActionOutcome, ApiClient, AuthMirror, AuthService, CoreConfig, IngestListener,
    InboxStore, OutboundSender, SharedStorage,
};

#[derive(Parser)]
#[command(name = "linksync-cli")]
#[command(about = "Send and receive synced links and text snippets")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short)]
    pretty: bool,

    /// Path to JSON config file (sharedDir, apiBaseUrl)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in against the backend and mirror the session for other surfaces
    Login {
        username: String,
        password: String,
    },

    /// Create an account on the backend
    Register {
        username: String,
        password: String,
    },

    /// Sign out and clear the mirrored session
    Logout,

    /// Show mirrored auth state and unseen count
    Status,

    /// Send a text snippet or URL to the backend
    Send {
        /// Content to send; classified as url or text automatically
        content: String,
        /// Account to send as (defaults to the mirrored user id)
        #[arg(long)]
        user: Option<String>,
    },

    /// Ingest a push payload (JSON) into the inbox
    Ingest {
        /// Raw payload, e.g. '{"data":{"title":"Hi","body":"hello","link":"https://x.com"}}'
        payload: String,
    },

    /// Simulate a click on the notification for an inbox item
    Click {
        /// Item id
        id: String,
    },

    /// List inbox items (unseen by default)
    Inbox {
        /// Include items already seen
        #[arg(long)]
        all: bool,
    },

    /// Open a link item in the browser and mark it seen
    Open {
        id: String,
    },

    /// Copy a text item to the clipboard and mark it seen
    Copy {
        id: String,
    },

    /// Mark one item seen
    MarkRead {
        id: String,
    },

    /// Mark every item seen
    MarkAllRead,

    /// Clear the inbox
    ClearAll,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let core_config = core_config(&config);
    tracing::debug!(
        "shared dir {}, backend {}",
        core_config.shared_dir.display(),
        core_config.api_base_url
    );
    let storage = SharedStorage::new(&core_config.shared_dir);
    let pretty = cli.pretty;

    match cli.command {
        Commands::Login { username, password } => {
            let provider = HttpIdentityProvider::new(&core_config.api_base_url);
            let service = AuthService::new(provider, storage);
            let user_id = service.sign_in(&username, &password).await?;
            println!("Signed in as {}", user_id);
        }

        Commands::Register { username, password } => {
            let provider = HttpIdentityProvider::new(&core_config.api_base_url);
            provider.register(&username, &password).await?;
            println!("Registered {}. You can now log in.", username);
        }

        Commands::Logout => {
            let provider = HttpIdentityProvider::new(&core_config.api_base_url);
            let service = AuthService::new(provider, storage);
            service.sign_out().await?;
            println!("Signed out");
        }

        Commands::Status => {
            let mirror = AuthMirror::new(storage.clone());
            let store = InboxStore::new(storage);
            let status = serde_json::json!({
                "isAuthenticated": mirror.is_authenticated(),
                "userId": mirror.user_id(),
                "authTimestamp": mirror.auth_timestamp(),
                "unseen": store.unseen_count(),
                "total": store.items().len(),
            });
            print_json(&status, pretty)?;
        }

        Commands::Send { content, user } => {
            let mirror = AuthMirror::new(storage);
            let user_id = match user.or_else(|| mirror.user_id()) {
                Some(id) => id,
                None => anyhow::bail!("Not signed in. Run login first."),
            };
            let sender = OutboundSender::new(mirror, ApiClient::new(&core_config.api_base_url));
            let response = sender.send(&user_id, &content).await?;
            println!(
                "{}",
                response.message.unwrap_or_else(|| "Message Sent".to_string())
            );
        }

        Commands::Ingest { payload } => {
            let store = Arc::new(InboxStore::new(storage));
            let listener = IngestListener::new(store, Arc::new(LogNotifier));
            let item = listener.handle_push(&payload)?;
            print_json(&serde_json::to_value(&item)?, pretty)?;
        }

        Commands::Click { id } => {
            let store = Arc::new(InboxStore::new(storage));
            let listener = IngestListener::new(store, Arc::new(LogNotifier));
            listener.handle_notification_click(&id, &SystemUrlOpener)?;
            println!("Marked {} seen", id);
        }

        Commands::Inbox { all } => {
            let handler = action_handler(storage);
            let view = handler.view();
            let items = if all { view.all } else { view.unseen };
            print_json(&serde_json::to_value(&items)?, pretty)?;
        }

        Commands::Open { id } => {
            let handler = action_handler(storage);
            handler.open(&id)?;
            println!("Opened {}", id);
        }

        Commands::Copy { id } => {
            let handler = action_handler(storage);
            report(handler.copy(&id)?);
        }

        Commands::MarkRead { id } => {
            let store = InboxStore::new(storage);
            store.mark_seen(&id)?;
            println!("Marked {} seen", id);
        }

        Commands::MarkAllRead => {
            let handler = action_handler(storage);
            let outcome = handler.mark_all_read()?;
            println!("Marked {} items seen", outcome.view.all.len());
        }

        Commands::ClearAll => {
            let handler = action_handler(storage);
            handler.clear_all()?;
            println!("Inbox cleared");
        }
    }

    Ok(())
}

fn action_handler(storage: SharedStorage) -> ActionHandler {
    ActionHandler::new(
        Arc::new(InboxStore::new(storage)),
        Arc::new(SystemUrlOpener),
        Arc::new(SystemClipboard),
    )
}

fn report(outcome: ActionOutcome) {
    if let Some(confirmation) = outcome.confirmation {
        println!("{}", confirmation);
    }
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<()> {
    if pretty {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<CliConfig> {
    match cli.config {
        Some(ref path) => CliConfig::load(path),
        None => Ok(CliConfig::default()),
    }
}

fn core_config(config: &CliConfig) -> CoreConfig {
    let mut core = CoreConfig::new(config.shared_dir());
    if let Some(ref base_url) = config.api_base_url {
        core = core.with_api_base_url(base_url.clone());
    }
    core
}
