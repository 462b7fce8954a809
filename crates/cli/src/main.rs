use std::{path::PathBuf, sync::Arc};

use {
    chrono::Utc,
    clap::{Parser, Subcommand},
    secrecy::{ExposeSecret, Secret},
    tokio::io::{AsyncBufReadExt, BufReader},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    wren_auth::{
        AuthState, HttpIdentityProvider, Identity, IdentityProvider, STARTUP_WAIT, Surface,
        resolve_on_startup, route_after_auth,
    },
    wren_chat::{ChatSession, render},
    wren_config::WrenConfig,
    wren_credentials::{CredentialStore, ProviderKind},
    wren_docstore::{DocumentStore, RestDocumentStore},
    wren_providers::ModelGateway,
    wren_sessions::{ConversationKey, ConversationLog, LiveFeed, MessageRecord},
};

#[derive(Parser)]
#[command(name = "wren", about = "Wren — a hosted-LLM chat client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides default ~/.config/wren/).
    #[arg(long, global = true, env = "WREN_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and report where you land (default when no subcommand).
    Login,
    /// Sign out and forget the cached session.
    Logout,
    /// Show the signed-in identity.
    Whoami,
    /// API key management.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Interactive conversation.
    Chat,
    /// Print the conversation transcript.
    History,
    /// Delete every message in the conversation.
    Clear,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store an API key for a provider.
    Set {
        api_key: String,
        /// Provider the key belongs to (openai, together).
        #[arg(long, default_value = "openai")]
        provider: String,
    },
    /// Show the stored key (masked) and its provider.
    Show,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .init();
    }
}

/// Everything a command needs, wired once from config.
struct App {
    identity: HttpIdentityProvider,
    store: Arc<dyn DocumentStore>,
    config: WrenConfig,
}

impl App {
    fn from_config(config: WrenConfig) -> anyhow::Result<Self> {
        let session_path = wren_config::config_dir()
            .ok_or_else(|| anyhow::anyhow!("no config directory available"))?
            .join("session.json");
        let identity = HttpIdentityProvider::new(config.identity.base_url.clone(), session_path);
        let store: Arc<dyn DocumentStore> = Arc::new(RestDocumentStore::new(
            config.docstore.base_url.clone(),
            config.docstore.auth_token.clone().map(Secret::new),
        ));
        Ok(Self {
            identity,
            store,
            config,
        })
    }

    fn credentials(&self) -> CredentialStore {
        CredentialStore::new(self.store.clone())
    }

    fn gateway(&self) -> ModelGateway {
        ModelGateway::with_base_urls(
            self.config.providers.openai_base_url(),
            self.config.providers.together_base_url(),
        )
    }

    fn conversation(&self, identity: &Identity) -> ConversationLog {
        let key = ConversationKey::new(&identity.user_id, &self.config.chat.chat_id);
        ConversationLog::new(self.store.clone(), key)
    }

    /// The cached identity, or an error pointing at `wren login`.
    fn require_identity(&self) -> anyhow::Result<Identity> {
        self.identity
            .current()
            .ok_or_else(|| anyhow::anyhow!("not signed in; run `wren login` first"))
    }
}

async fn login(app: &App) -> anyhow::Result<()> {
    let identity = match resolve_on_startup(&app.identity, STARTUP_WAIT).await {
        AuthState::Authenticated(identity) => identity,
        AuthState::Unauthenticated => app.identity.sign_in().await?,
    };
    println!("Signed in as {}", describe(&identity));

    let credentials = app.credentials();
    let surface = route_after_auth(&identity, |_uid| async {
        credentials.load(Some(&identity)).await
    })
    .await;
    match surface {
        Surface::Chat => println!("API key on record. Run `wren chat` to start talking."),
        Surface::Setup => println!("No API key on record yet. Run `wren key set <key>` first."),
    }
    Ok(())
}

fn describe(identity: &Identity) -> String {
    match (&identity.display_name, &identity.email) {
        (Some(name), Some(email)) => format!("{name} <{email}>"),
        (Some(name), None) => name.clone(),
        (None, Some(email)) => email.clone(),
        (None, None) => identity.user_id.clone(),
    }
}

fn mask(key: &str) -> String {
    let chars = key.chars().count();
    if chars <= 4 {
        return "****".to_string();
    }
    let tail: String = key.chars().skip(chars - 4).collect();
    format!("****{tail}")
}

fn print_transcript(records: &[MessageRecord]) {
    let now = Utc::now();
    for record in records {
        println!(
            "[{}] {}: {}",
            render::format_timestamp(&record.timestamp, now),
            record.role,
            record.content
        );
    }
}

async fn chat_repl(app: &App) -> anyhow::Result<()> {
    let identity = app.require_identity()?;
    let log = app.conversation(&identity);
    let session = ChatSession::new(
        identity.clone(),
        app.credentials(),
        log.clone(),
        app.gateway(),
    )
    .with_history_limit(app.config.chat.history_limit);

    let mut feed = LiveFeed::new(app.store.clone());
    feed.subscribe(log.key().clone(), |records| {
        println!();
        print_transcript(&records);
        print!("> ");
        use std::io::Write as _;
        let _ = std::io::stdout().flush();
    });

    println!("Type a message and press enter. `exit` to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        session.submit(&line).await;
    }
    feed.unsubscribe();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);
    if let Some(dir) = &cli.config_dir {
        wren_config::set_config_dir(dir.clone());
    }

    let config = wren_config::discover_and_load();
    info!(version = env!("CARGO_PKG_VERSION"), "wren starting");
    let app = App::from_config(config)?;

    match cli.command.unwrap_or(Commands::Login) {
        Commands::Login => login(&app).await?,
        Commands::Logout => {
            app.identity.sign_out().await?;
            println!("Signed out.");
        },
        Commands::Whoami => match app.identity.current() {
            Some(identity) => println!("{}", describe(&identity)),
            None => println!("Not signed in."),
        },
        Commands::Key { action } => {
            let identity = app.require_identity()?;
            let credentials = app.credentials();
            match action {
                KeyAction::Set { api_key, provider } => {
                    let kind = ProviderKind::parse(Some(&provider))?;
                    credentials.save(Some(&identity), &api_key, kind).await?;
                    println!("Saved {kind} key {}", mask(&api_key));
                },
                KeyAction::Show => match credentials.load(Some(&identity)).await? {
                    Some(credential) => println!(
                        "{}: {}",
                        credential.provider,
                        mask(credential.api_key.expose_secret())
                    ),
                    None => println!("No API key on record."),
                },
            }
        },
        Commands::Chat => chat_repl(&app).await?,
        Commands::History => {
            let identity = app.require_identity()?;
            let records = app.conversation(&identity).snapshot().await?;
            if records.is_empty() {
                println!("No messages yet.");
            } else {
                print_transcript(&records);
            }
        },
        Commands::Clear => {
            let identity = app.require_identity()?;
            app.conversation(&identity).clear().await?;
            println!("Conversation cleared.");
        },
    }
    Ok(())
}
