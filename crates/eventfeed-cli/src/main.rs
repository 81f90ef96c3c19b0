//! eventfeed - publish agent event windows as calendar and news feeds
//!
//! ## Commands
//!
//! - `emit`: Append an event to a source and deliver it to the agent
//! - `receive`: Deliver events appended by other writers since the watermark
//! - `window`: Show the current window and its cached state
//! - `render`: Render the window as iCalendar, RSS or JSON
//! - `check`: Validate the configuration and report whether events arrive

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use eventfeed_core::window::memory::describe;
use eventfeed_core::{FeedAgent, FeedConfig, FeedFormat, METRICS};
use eventfeed_state::{
    AgentId, AgentMemoryStore, EventId, EventLog, SourceId, SurrealFeedStore,
};
use serde_json::Value;
use tracing::{info, Level};

const DEFAULT_AGENT_ID: &str = "eventfeed";

#[derive(Parser)]
#[command(name = "eventfeed")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bounded event windows served as iCalendar, RSS and JSON feeds", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Agent configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "EVENTFEED_CONFIG",
        default_value = "eventfeed.toml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append an event and deliver it to the agent
    Emit {
        /// Source the event belongs to
        #[arg(short, long)]
        source: String,

        /// Event payload as a JSON object
        payload: String,
    },

    /// Deliver events appended since the agent's watermark
    Receive,

    /// Show the current window without rendering it
    Window,

    /// Render the feed
    Render {
        /// Shared secret checked against the configured allow-list
        #[arg(long, env = "EVENTFEED_SECRET")]
        secret: Option<String>,

        /// Output format: ics, rss or json
        #[arg(short, long, default_value = "ics")]
        format: String,

        /// Write the body here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate the configuration and report the working status
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    eventfeed_core::init_tracing(cli.json, level);

    let config = load_config(&cli.config)?;

    let store = Arc::new(
        SurrealFeedStore::from_env()
            .await
            .context("Failed to connect to eventfeed database")?,
    );
    let agent = build_agent(config, store)?;

    let result = match cli.command {
        Commands::Emit { source, payload } => cmd_emit(&agent, &source, &payload).await,
        Commands::Receive => cmd_receive(&agent).await,
        Commands::Window => cmd_window(&agent).await,
        Commands::Render {
            secret,
            format,
            output,
        } => cmd_render(&agent, secret.as_deref(), &format, output.as_deref()).await,
        Commands::Check => cmd_check(&agent).await,
    };

    METRICS.flush();
    result
}

fn load_config(path: &Path) -> Result<FeedConfig> {
    FeedConfig::from_path(path).with_context(|| format!("Failed to load config {:?}", path))
}

struct Agent {
    inner: FeedAgent,
    log: Arc<dyn EventLog>,
}

fn build_agent<S>(config: FeedConfig, store: Arc<S>) -> Result<Agent>
where
    S: EventLog + AgentMemoryStore + 'static,
{
    let agent_id = AgentId::from(config.agent_id.as_deref().unwrap_or(DEFAULT_AGENT_ID));
    let log: Arc<dyn EventLog> = store.clone();
    let memory: Arc<dyn AgentMemoryStore> = store;
    let inner = FeedAgent::new(agent_id, config, Arc::clone(&log), memory)?;
    Ok(Agent { inner, log })
}

/// Append an event and deliver it to the agent.
async fn cmd_emit(agent: &Agent, source: &str, payload: &str) -> Result<()> {
    let payload: Value = serde_json::from_str(payload).context("Payload is not valid JSON")?;
    let source = SourceId::new(source);
    if !agent.inner.config().sources.contains(&source) {
        tracing::warn!(source_id = %source, "source is not configured for this agent");
    }

    let event = agent.log.append(&source, payload).await?;
    let snapshot = agent.inner.on_events_received(&[event.clone()]).await?;

    info!(event_id = event.id.0, mode = %snapshot.mode, "event delivered");
    println!("Appended event {} to {}", event.id, event.source_id);
    println!(
        "Window: {} event(s), watermark {}",
        snapshot.events.len(),
        snapshot
            .last_event_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    Ok(())
}

/// Deliver events above the watermark that the agent has not seen yet.
async fn cmd_receive(agent: &Agent) -> Result<()> {
    let watermark = agent
        .inner
        .window_memory()
        .await?
        .last_event_id
        .unwrap_or(EventId(0));
    let batch = agent
        .log
        .events_above(&agent.inner.config().sources, watermark)
        .await?;

    if batch.is_empty() {
        println!("No new events above {watermark}");
        return Ok(());
    }

    let snapshot = agent.inner.on_events_received(&batch).await?;
    println!(
        "Received {} event(s); window holds {}",
        batch.len(),
        snapshot.events.len()
    );
    Ok(())
}

/// Show the current window and cached state.
async fn cmd_window(agent: &Agent) -> Result<()> {
    let snapshot = agent.inner.window().await?;
    let memory = agent.inner.window_memory().await?;

    println!("Agent:  {}", agent.inner.agent_id());
    println!("Mode:   {}", snapshot.mode);
    println!();
    if snapshot.events.is_empty() {
        println!("Window is empty");
    }
    for event in &snapshot.events {
        println!(
            "{:>8}  {:<16}  {}",
            event.id.0,
            event.source_id.as_str(),
            event.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&describe(&memory))?);
    Ok(())
}

/// Render the feed to stdout or a file.
async fn cmd_render(
    agent: &Agent,
    secret: Option<&str>,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let format: FeedFormat = format.parse()?;
    let response = agent.inner.render(secret, format).await?;
    if !response.is_success() {
        bail!("{} {}", response.status, response.body);
    }

    match output {
        Some(path) => {
            std::fs::write(path, &response.body)
                .with_context(|| format!("Failed to write {:?}", path))?;
            info!(path = %path.display(), content_type = %response.content_type, "feed written");
        }
        None => print!("{}", response.body),
    }
    Ok(())
}

/// Validate the configuration and report whether events arrive.
async fn cmd_check(agent: &Agent) -> Result<()> {
    let config = agent.inner.config();
    config.validate()?;

    let working = agent.inner.is_working(Utc::now()).await?;
    let last = agent.inner.last_receive_at().await?;

    println!("Configuration OK");
    println!("Agent:    {}", agent.inner.agent_id());
    println!("Sources:  {}", config.sources.len());
    println!("Window:   {} event(s)", config.events_to_show);
    match last {
        Some(at) => println!("Last receive: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("Last receive: never"),
    }
    println!(
        "Status:   {}",
        if working { "working" } else { "not working" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        agent_id = "cli-test"
        sources = ["meetup"]
        secrets = ["s3cret"]
        events_to_show = 2

        [template]
        title = "CLI feed"
    "#;

    async fn agent() -> Agent {
        let store = Arc::new(SurrealFeedStore::in_memory().await.unwrap());
        build_agent(FeedConfig::from_toml_str(CONFIG).unwrap(), store).unwrap()
    }

    #[test]
    fn test_cli_parses_render() {
        let cli = Cli::parse_from([
            "eventfeed",
            "--config",
            "feed.toml",
            "render",
            "--secret",
            "s3cret",
            "--format",
            "rss",
        ]);
        assert_eq!(cli.config, PathBuf::from("feed.toml"));
        assert!(matches!(
            cli.command,
            Commands::Render { ref format, .. } if format == "rss"
        ));
    }

    #[test]
    fn test_load_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("missing.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("missing.toml"));
    }

    #[tokio::test]
    async fn test_emit_then_render_to_file() {
        let agent = agent().await;
        cmd_emit(&agent, "meetup", r#"{"title": "First"}"#)
            .await
            .unwrap();
        cmd_emit(&agent, "meetup", r#"{"title": "Second"}"#)
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.ics");
        cmd_render(&agent, Some("s3cret"), "ics", Some(path.as_path()))
            .await
            .unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("SUMMARY:First"));
        assert!(body.contains("SUMMARY:Second"));
        assert!(agent.inner.is_working(Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_render_rejects_bad_secret_and_format() {
        let agent = agent().await;
        let err = cmd_render(&agent, Some("wrong"), "ics", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));

        let err = cmd_render(&agent, Some("s3cret"), "atom", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("atom"));
    }

    #[tokio::test]
    async fn test_receive_picks_up_foreign_appends() {
        let agent = agent().await;
        cmd_emit(&agent, "meetup", r#"{"title": "Seen"}"#)
            .await
            .unwrap();

        // Appended by another writer, not yet delivered.
        agent
            .log
            .append(&SourceId::new("meetup"), serde_json::json!({"title": "Unseen"}))
            .await
            .unwrap();
        assert_eq!(agent.inner.window().await.unwrap().events.len(), 1);

        cmd_receive(&agent).await.unwrap();
        assert_eq!(agent.inner.window().await.unwrap().events.len(), 2);

        // Nothing left to deliver.
        cmd_receive(&agent).await.unwrap();
    }

    #[tokio::test]
    async fn test_emit_rejects_non_object_payload() {
        let agent = agent().await;
        assert!(cmd_emit(&agent, "meetup", "[1, 2]").await.is_err());
        assert!(cmd_emit(&agent, "meetup", "not json").await.is_err());
    }
}
