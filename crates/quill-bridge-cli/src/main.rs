//! Quill bridge over stdio
//!
//! Runs one bridge instance with the in-memory editor. Each line on stdin is
//! one transport string from the host; each line on stdout is one message
//! from the bridge. Logs go to stderr.

use anyhow::Result;
use clap::Parser;
use quill_bridge::{
    Bridge, BridgeConfig, ChannelTransport, LineReader, MemoryEditorFactory, run, writer_task,
};
use quill_bridge_core::LoadEditor;
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(name = "quill-bridge", version, about = "Run a Quill editor bridge over stdio")]
struct Args {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Protocol prefix (overrides the config file)
    #[arg(long)]
    prefix: Option<String>,

    /// Warn when a message waits this long for acknowledgment
    #[arg(long)]
    ack_timeout_ms: Option<u64>,

    /// Log filter, used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Load the editor at startup instead of waiting for LOAD_EDITOR
    #[arg(long)]
    autoload: bool,
}

fn build_config(args: &Args) -> Result<BridgeConfig> {
    let mut config = match &args.config {
        Some(path) => BridgeConfig::from_file(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(prefix) = &args.prefix {
        config.prefix = prefix.clone();
    }
    if args.ack_timeout_ms.is_some() {
        config.ack_timeout_ms = args.ack_timeout_ms;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&args.log_level))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = build_config(&args)?;
    info!("Quill bridge starting (prefix {})", config.prefix);

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(writer_task(out_rx, tokio::io::stdout()));

    let ack_timeout = config.ack_timeout();
    let (mut bridge, events) = Bridge::new(config, MemoryEditorFactory, ChannelTransport(out_tx));
    if args.autoload {
        bridge.load_editor(LoadEditor::default())?;
    }

    let reader = LineReader::new(BufReader::new(tokio::io::stdin()));
    let bridge = run(bridge, reader, events, ack_timeout).await?;

    info!(
        "Quill bridge shutting down ({} message(s) never sent)",
        bridge.pending()
    );
    // Dropping the bridge closes the outbound channel and ends the writer
    drop(bridge);
    writer.await??;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["quill-bridge"]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.prefix, quill_bridge_core::MESSAGE_PREFIX);
        assert_eq!(config.ack_timeout_ms, None);
        assert!(!args.autoload);
    }

    #[test]
    fn test_flag_overrides() {
        let args = Args::parse_from([
            "quill-bridge",
            "--prefix",
            "notes-editor",
            "--ack-timeout-ms",
            "2500",
            "--autoload",
        ]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.prefix, "notes-editor");
        assert_eq!(config.ack_timeout_ms, Some(2500));
        assert!(args.autoload);
    }

    #[test]
    fn test_missing_config_file() {
        let args = Args::parse_from(["quill-bridge", "--config", "/nonexistent/bridge.json"]);
        assert!(build_config(&args).is_err());
    }
}
