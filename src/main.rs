use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keysprint::analytics::StatsService;
use keysprint::api::state::AppState;
use keysprint::api::{Pagination, PaginationMeta};
use keysprint::challenges::catalog;
use keysprint::config::AppConfig;
use keysprint::leaderboard::{self, LeaderboardQuery, TimeWindow};
use keysprint::models::{Category, Challenge, EntityId, TypingResult, User, UserId};
use keysprint::scoring::{self, ScoringInput};
use keysprint::session::{self, Session};
use keysprint::storage::{JsonlStore, RecordStore, StorageConfig};

#[derive(Parser)]
#[command(name = "keysprint")]
#[command(about = "Typing-speed platform: sessions, scoring, analytics and leaderboards")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Register a user
    AddUser {
        #[arg(long)]
        name: String,
    },

    /// Score a single attempt and print its metrics
    Score {
        /// Text that had to be typed
        #[arg(long)]
        target: String,

        /// Text that was typed
        #[arg(long)]
        input: String,

        /// Milliseconds from first keystroke to finish
        #[arg(long)]
        elapsed_ms: u64,
    },

    /// Replay a recorded keystroke log through a session
    Replay {
        /// JSONL file of {"offset_ms": .., "input": ..} lines
        #[arg(long)]
        log: PathBuf,

        /// Challenge category (standard, paragraph, developer, daily, custom)
        #[arg(long)]
        category: String,

        /// Save the result for this user id
        #[arg(long)]
        user: Option<String>,

        /// Text to type; defaults to a built-in text for the category
        #[arg(long)]
        target: Option<String>,
    },

    /// Print a leaderboard page
    Leaderboard {
        /// daily, weekly or all-time
        #[arg(long, default_value = "daily")]
        range: String,

        #[arg(long)]
        category: Option<String>,

        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Print a user's statistics snapshot
    Stats {
        /// User id
        #[arg(long)]
        user: String,
    },
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = if cli.config.exists() {
        AppConfig::from_file(&cli.config)
            .with_context(|| format!("Loading {}", cli.config.display()))?
    } else {
        AppConfig::default()
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn init_logging(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config.log_level, cli.json_logs);

    tracing::info!("Starting keysprint v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(JsonlStore::new(StorageConfig::new(config.data_dir.clone())));

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let addr = format!("{}:{}", config.server.host, config.server.port);
            let state = AppState::new(store, config);
            let app = keysprint::api::build_router(state);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::AddUser { name } => {
            let user = store.insert_user(User::new(&name)?).await?;
            tracing::info!(id = %user.id, name = %user.name, "Registered user");
            print_json(&user)?;
        }
        Commands::Score {
            target,
            input,
            elapsed_ms,
        } => {
            let metrics = scoring::score(&ScoringInput {
                target: &target,
                input: &input,
                elapsed_ms,
                max_key_delay_ms: 0,
                max_word_delay_ms: 0,
            });
            print_json(&metrics)?;
        }
        Commands::Replay {
            log,
            category,
            user,
            target,
        } => {
            let category: Category = category.parse()?;
            let challenge = match target {
                Some(content) => Challenge {
                    id: EntityId::generate(&[category.as_str(), content.as_str()]),
                    category,
                    name: category.display_name().to_string(),
                    content,
                },
                None => {
                    let today = Utc::now()
                        .with_timezone(&config.analytics.offset())
                        .date_naive();
                    catalog::pick(category, today, &mut rand::thread_rng()).with_context(
                        || format!("No built-in text for {}; pass --target", category),
                    )?
                }
            };

            let events = session::load_log(&log)
                .with_context(|| format!("Reading keystroke log {}", log.display()))?;

            let mut session = Session::new(challenge)?;
            let Some(metrics) = session::replay(&mut session, Utc::now(), &events)? else {
                bail!(
                    "Log ended after {} of {} characters",
                    session.input().chars().count(),
                    session.target().chars().count()
                );
            };
            print_json(&metrics)?;

            if let Some(user) = user {
                let user = UserId::from(user);
                if store.find_user(&user).await?.is_none() {
                    bail!("Unknown user {}", user);
                }
                let result = TypingResult::new(user, category, metrics.to_result_metrics());
                store.append_result(&result).await?;
                tracing::info!(id = %result.id, wpm = result.wpm(), "Saved replayed result");
            }
        }
        Commands::Leaderboard {
            range,
            category,
            page,
        } => {
            let query = LeaderboardQuery {
                window: range.parse::<TimeWindow>()?,
                category: category.map(|c| c.parse::<Category>()).transpose()?,
            };
            let rows = leaderboard::compute(store.as_ref(), query, Utc::now()).await?;
            let pagination = Pagination::new(
                Some(page),
                None,
                config.leaderboard.default_page_size,
                config.leaderboard.max_page_size,
            );
            print_json(&serde_json::json!({
                "data": pagination.slice(&rows),
                "pagination": PaginationMeta::new(&pagination, rows.len() as u32),
            }))?;
        }
        Commands::Stats { user } => {
            let user = UserId::from(user);
            if store.find_user(&user).await?.is_none() {
                bail!("Unknown user {}", user);
            }
            let stats = StatsService::new(store, config.analytics.clone());
            print_json(&stats.snapshot(&user).await?)?;
        }
    }

    Ok(())
}
