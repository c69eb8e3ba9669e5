use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use nightdeck::app::{App, AppEvent};
use nightdeck::config::Config;
use nightdeck::content::{GeminiClient, GeminiSettings};
use nightdeck::favorites::FavoritesStore;
use nightdeck::i18n;
use nightdeck::model::Language;
use nightdeck::storage::{Database, DatabaseError};
use nightdeck::ui;

/// Get the config directory path (~/.config/nightdeck/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("nightdeck"))
}

#[derive(Parser, Debug)]
#[command(
    name = "nightdeck",
    about = "Swipe through AI-generated paranormal facts in your terminal"
)]
struct Args {
    /// Content language (en or fr). Defaults to the config, then $LANG
    #[arg(long, value_name = "LANG")]
    lang: Option<String>,

    /// Reset database (delete favorites and onboarding state)
    #[arg(long)]
    reset_db: bool,

    /// Show the onboarding steps even if they were completed before
    #[arg(long)]
    show_onboarding: bool,

    /// Config file to use instead of ~/.config/nightdeck/config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never land on the alternate screen
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = args.config.clone().or_else(Config::default_path);
    let config = match &config_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    tracing::debug!(?config, "Configuration loaded");

    let lang = match args.lang.as_deref() {
        Some(code) => Language::from_code(code)
            .with_context(|| format!("Unsupported language '{}': use en or fr", code))?,
        None => config
            .language
            .unwrap_or_else(|| i18n::initial_language(None)),
    };

    // Set up config directory
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // The database holds favorites; keep the directory user-only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(&config_dir, std::fs::Permissions::from_mode(0o700))
        {
            tracing::warn!(
                path = %config_dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }

    let db_path = config_dir.join("nightdeck.db");

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    // Storage is optional: without it favorites and onboarding last one session
    let db = match Database::open(db_path_str).await {
        Ok(db) => {
            if args.reset_db {
                db.clear().await.context("Failed to reset database")?;
                println!("Database reset.");
            }
            Some(db)
        }
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of nightdeck appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Storage unavailable, favorites will not be saved");
            None
        }
    };

    let favorites = match &db {
        Some(db) => FavoritesStore::hydrate(db.clone()).await,
        None => FavoritesStore::detached(),
    };

    let provider = GeminiClient::new(GeminiSettings::from_config(&config))
        .context("Failed to create Gemini client")?;
    if provider.settings().api_key.is_none() {
        eprintln!("Warning: GEMINI_API_KEY is not set; facts cannot be summoned.");
    }

    let mut app = App::new(&config, lang, favorites, db.clone());
    app.load_onboarding(args.show_onboarding).await;

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(64);

    // Run the TUI
    let result = ui::run(&mut app, Arc::new(provider), event_tx, event_rx).await;

    drop(app);
    if let Some(db) = db {
        db.close().await;
    }
    result?;

    println!("Goodbye!");
    Ok(())
}
