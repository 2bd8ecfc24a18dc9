use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shiftpoll::auth::issue_scheduler_token;
use shiftpoll::config::ServerConfig;
use shiftpoll::notify::LogNotifier;
use shiftpoll::server::{AppState, create_router};
use shiftpoll::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "shiftpoll")]
#[command(about = "Collect and reconcile employee shift availability", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Manage scheduler accounts
    Scheduler {
        #[command(subcommand)]
        command: SchedulerCommands,
    },

    /// Start the server
    Serve {
        /// TOML config file; flags below override its values
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Public base URL for external access (e.g., "https://shifts.example.com").
        /// Used for the availability links sent to employees.
        #[arg(long)]
        public_base_url: Option<String>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create the database)
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum SchedulerCommands {
    /// Create a scheduler and print its API token
    Create {
        /// Display name of the scheduler
        #[arg(long)]
        name: String,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },

    /// List schedulers
    List {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
    let db_path = config.db_path();
    if !db_path.exists() {
        bail!(
            "Server not initialized. Run 'shiftpoll admin init --data-dir {}' first.",
            config.data_dir.display()
        );
    }
    Ok(SqliteStore::new(&db_path)?)
}

fn run_init(data_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(data_dir)?;

    let db_path = ServerConfig::for_data_dir(data_dir).db_path();
    let existed = db_path.exists();

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    if existed {
        println!("Database already initialized at {}", db_path.display());
    } else {
        println!("Initialized database at {}", db_path.display());
    }
    println!("Create a scheduler with: shiftpoll scheduler create --name <NAME>");

    Ok(())
}

fn run_scheduler_create(name: &str, data_dir: &Path) -> anyhow::Result<()> {
    let store: Arc<dyn Store> = Arc::new(open_store(&ServerConfig::for_data_dir(data_dir))?);
    let state = AppState::new(store.clone(), Arc::new(LogNotifier), "");

    let scheduler = state.registry.create_scheduler(name)?;
    let raw_token = issue_scheduler_token(store.as_ref(), &scheduler.id)?;

    println!();
    println!("========================================");
    println!("Created scheduler '{}' ({})", scheduler.name, scheduler.id);
    println!("API token (save this, it won't be shown again):");
    println!();
    println!("  {raw_token}");
    println!();
    println!("========================================");
    println!();

    Ok(())
}

fn run_scheduler_list(data_dir: &Path) -> anyhow::Result<()> {
    let store = open_store(&ServerConfig::for_data_dir(data_dir))?;
    let schedulers = store.list_schedulers()?;

    if schedulers.is_empty() {
        println!("No schedulers");
        return Ok(());
    }
    for scheduler in schedulers {
        println!("{}  {}", scheduler.id, scheduler.name);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("shiftpoll=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init { data_dir } => run_init(&data_dir)?,
        },
        Commands::Scheduler { command } => match command {
            SchedulerCommands::Create { name, data_dir } => {
                run_scheduler_create(&name, &data_dir)?;
            }
            SchedulerCommands::List { data_dir } => run_scheduler_list(&data_dir)?,
        },
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
            public_base_url,
        } => {
            let mut config = match config {
                Some(path) => ServerConfig::load(&path)?,
                None => ServerConfig::default(),
            };
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(data_dir) = data_dir {
                config.data_dir = data_dir;
            }
            if public_base_url.is_some() {
                config.public_base_url = public_base_url;
            }

            let store = open_store(&config)?;
            store.initialize()?;

            let state = Arc::new(AppState::new(
                Arc::new(store),
                Arc::new(LogNotifier),
                &config.link_base(),
            ));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);
            info!("Availability links use {}", config.link_base());

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
