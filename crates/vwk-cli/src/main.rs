use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};
use vwk_config::{LoadedConfig, Settings, UnusedKeyPolicy};
use vwk_host::{ChatDirectory, DispatchTiming, PassReport, PreferenceFile, Session};
use vwk_window::{ConversationId, HostEvent, PassKind, WindowConfigStore};

#[derive(Parser)]
#[command(name = "vwk")]
#[command(about = "Visibility window tools for chat transcripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> local overrides ...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Run one reconcile pass over a transcript and save it
    Reconcile {
        #[command(flatten)]
        chat: ChatArgs,

        /// Take the incremental path instead of a full pass
        #[arg(long, default_value_t = false)]
        incremental: bool,
    },

    /// Store a new window size and apply it with a full pass
    SetWindow {
        #[command(flatten)]
        chat: ChatArgs,

        /// Messages to keep visible (negative means 0, which disables the window)
        #[arg(long, allow_hyphen_values = true)]
        window: i64,
    },

    /// Print the stored window configuration for a conversation
    Show {
        /// Conversation id
        #[arg(long)]
        conversation: String,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Feed a JSONL file of host events through the debounced dispatcher
    Replay {
        /// Directory holding `<conversation>.jsonl` transcripts
        #[arg(long)]
        chats: PathBuf,

        /// JSONL file, one host event per line
        #[arg(long)]
        events: PathBuf,

        /// Pause between events, in milliseconds
        #[arg(long, default_value_t = 0)]
        gap_ms: u64,

        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args)]
struct StoreArgs {
    /// Preference file (overrides store.preferences_path)
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Layered config paths in merge order
    #[arg(long = "config")]
    config_paths: Vec<String>,
}

#[derive(Args)]
struct ChatArgs {
    /// Directory holding `<conversation>.jsonl` transcripts
    #[arg(long)]
    chats: PathBuf,

    /// Conversation id
    #[arg(long)]
    conversation: String,

    #[command(flatten)]
    store: StoreArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    // dev-time bootstrap; absent file is fine
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = vwk_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Reconcile { chat, incremental } => {
            let settings = boot(&chat.store)?;
            let mut session = open_session(&chat.chats, &chat.store, &settings)?;
            let conversation = ConversationId::new(chat.conversation);

            session.prepare(&HostEvent::ConversationSwitched {
                conversation: conversation.clone(),
            });
            let kind = if incremental {
                PassKind::Incremental
            } else {
                PassKind::Full
            };
            let report = session.settle(kind);
            finish(&report)?;
        }

        Commands::SetWindow { chat, window } => {
            let settings = boot(&chat.store)?;
            let mut session = open_session(&chat.chats, &chat.store, &settings)?;
            let conversation = ConversationId::new(chat.conversation);

            session.prepare(&HostEvent::ConversationSwitched { conversation });
            let report = session.handle(HostEvent::WindowReconfigured {
                window_size: window,
            });
            finish(&report)?;
        }

        Commands::Show {
            conversation,
            store,
        } => {
            let settings = boot(&store)?;
            let prefs = PreferenceFile::open(prefs_path(&store, &settings))?;
            let conversation = ConversationId::new(conversation);
            let cfg = prefs.get(&conversation);
            let out = json!({
                "conversation": conversation,
                "window_size": cfg.window_size,
                "checkpoint_len": cfg.checkpoint_len,
                "updated_at": prefs.record(&conversation).map(|r| r.updated_at),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }

        Commands::Replay {
            chats,
            events,
            gap_ms,
            store,
        } => {
            let settings = boot(&store)?;
            let session = open_session(&chats, &store, &settings)?;
            let events = read_events(&events).await?;
            replay(session, &settings, events, Duration::from_millis(gap_ms)).await?;
        }
    }

    Ok(())
}

/// Load config layers, install logging, lint unused keys.
fn boot(store: &StoreArgs) -> Result<Settings> {
    let loaded = if store.config_paths.is_empty() {
        LoadedConfig::empty()
    } else {
        let path_refs: Vec<&str> = store.config_paths.iter().map(|s| s.as_str()).collect();
        vwk_config::load_layered_yaml(&path_refs)?
    };
    let settings = loaded.settings()?;
    init_tracing(&settings.log_filter);

    let report = vwk_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for pointer in &report.unused_leaf_pointers {
        warn!(pointer = %pointer, "unused config key");
    }
    info!(config_hash = %loaded.config_hash, "config loaded");
    Ok(settings)
}

fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn prefs_path(store: &StoreArgs, settings: &Settings) -> PathBuf {
    store
        .prefs
        .clone()
        .unwrap_or_else(|| settings.preferences_path.clone())
}

fn open_session(
    chats: &Path,
    store: &StoreArgs,
    settings: &Settings,
) -> Result<Session<ChatDirectory, PreferenceFile>> {
    if !chats.is_dir() {
        bail!("chat directory not found: {}", chats.display());
    }
    let prefs = PreferenceFile::open(prefs_path(store, settings))?;
    Ok(Session::new(
        ChatDirectory::new(chats),
        prefs,
        settings.skip_distance,
    ))
}

async fn read_events(path: &Path) -> Result<Vec<HostEvent>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read events file: {}", path.display()))?;
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid host event", path.display(), n + 1))
        })
        .collect()
}

async fn replay(
    session: Session<ChatDirectory, PreferenceFile>,
    settings: &Settings,
    events: Vec<HostEvent>,
    gap: Duration,
) -> Result<()> {
    let timing = DispatchTiming {
        full_debounce: settings.full_debounce(),
        incremental_debounce: settings.incremental_debounce(),
    };
    let (handle, task) = vwk_host::spawn(session, timing);
    let reader = tokio::spawn(print_reports(handle.subscribe()));

    for event in events {
        handle.send(event)?;
        if !gap.is_zero() {
            tokio::time::sleep(gap).await;
        }
    }
    drop(handle);

    task.await.context("dispatcher task failed")?;
    let printed = reader.await.context("report reader failed")??;
    info!(passes = printed, "replay finished");
    Ok(())
}

/// Print every report until the dispatcher shuts down. Returns the count.
///
/// A lagged receiver means reports were lost; that fails the replay.
async fn print_reports(mut reports: broadcast::Receiver<PassReport>) -> Result<usize> {
    let mut printed = 0;
    loop {
        match reports.recv().await {
            Ok(report) => {
                print_report(&report)?;
                printed += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                bail!("report stream lagged: {skipped} pass reports lost")
            }
            Err(RecvError::Closed) => return Ok(printed),
        }
    }
}

fn print_report(report: &PassReport) -> Result<()> {
    println!("{}", serde_json::to_string(report)?);
    Ok(())
}

/// Print the pass result; an aborted pass is a failed command.
fn finish(report: &PassReport) -> Result<()> {
    print_report(report)?;
    match report {
        PassReport::Aborted { conversation } => {
            bail!("no transcript loaded for conversation {conversation}")
        }
        _ => Ok(()),
    }
}
