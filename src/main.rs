mod chat;
mod cli;
mod config;
mod tui;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chat::{AttachmentFile, HttpTransport, MessageDispatcher, SendOutcome};
use clap::Parser;
use cli::{Cli, Commands};
use config::Settings;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let interactive = cli.command.is_none();
    init_logging(cli.log_file.as_deref(), interactive)?;

    let settings = Settings::load(&cli)?;

    match cli.command {
        Some(Commands::Send { message, attach }) => {
            if !attach.is_empty() && !settings.attachments_allowed {
                anyhow::bail!("Attachments are disabled; remove --attach or enable HOOKCHAT_ATTACHMENTS");
            }

            let mut dispatcher = build_dispatcher(&settings)?;
            let files = collect_attachments(attach, tokio::io::stdin()).await?;

            match dispatcher.send(&message.join(" "), files).await {
                SendOutcome::Replied => {
                    if let Some(reply) = dispatcher.store().last() {
                        println!("{}", reply.content);
                    }
                }
                SendOutcome::Ignored => {
                    anyhow::bail!("Nothing to send: give a message or at least one --attach");
                }
                SendOutcome::Failed => {
                    for notice in dispatcher.take_notices().iter().filter(|n| n.is_error()) {
                        eprintln!("{}", notice);
                    }
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Config) => {
            println!("{}", settings.describe());
        }
        None => {
            let dispatcher = build_dispatcher(&settings)?;
            tui::run(dispatcher, settings).await?;
        }
    }

    Ok(())
}

const STDIN_ATTACHMENT: &str = "stdin";

/// `-` attaches whatever arrives on stdin; anything else is a file path
async fn collect_attachments<R: AsyncRead + Unpin>(
    paths: Vec<PathBuf>,
    mut stdin: R,
) -> Result<Vec<AttachmentFile>> {
    let mut files = Vec::with_capacity(paths.len());
    let mut stdin_used = false;

    for path in paths {
        if path.as_os_str() != "-" {
            files.push(AttachmentFile::from_path(path));
            continue;
        }
        if stdin_used {
            anyhow::bail!("stdin can only be attached once");
        }
        stdin_used = true;

        let mut data = Vec::new();
        stdin
            .read_to_end(&mut data)
            .await
            .context("Failed to read attachment from stdin")?;
        files.push(AttachmentFile::from_bytes(
            STDIN_ATTACHMENT,
            "application/octet-stream",
            data,
        ));
    }

    Ok(files)
}

fn build_dispatcher(settings: &Settings) -> Result<MessageDispatcher> {
    let transport = HttpTransport::new(&settings.webhook_url, settings.auth_header.as_ref())?;
    tracing::debug!(url = %transport.url(), "Webhook transport ready");
    Ok(MessageDispatcher::new(Box::new(transport), settings.envelope))
}

/// Logs go to the given file, or to stderr outside the terminal UI
fn init_logging(log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "hookchat=info".into());

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None if interactive => {}
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
