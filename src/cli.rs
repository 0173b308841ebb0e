use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional command to run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Webhook URL that receives messages
    #[arg(long, global = true)]
    pub webhook_url: Option<String>,

    /// Name of a custom header sent with every request
    #[arg(long, global = true)]
    pub header_name: Option<String>,

    /// Value of the custom header
    #[arg(long, global = true)]
    pub header_value: Option<String>,

    /// Color theme: dark or light
    #[arg(long, global = true)]
    pub theme: Option<String>,

    /// Refuse file attachments
    #[arg(long, global = true)]
    pub no_attachments: bool,

    /// Request body layout: batch or object
    #[arg(long, global = true)]
    pub envelope: Option<String>,

    /// Write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a one-off message and print the reply
    Send {
        /// The message to send
        message: Vec<String>,

        /// File to attach (repeatable, `-` reads stdin)
        #[arg(short, long)]
        attach: Vec<PathBuf>,
    },

    /// Show the resolved configuration
    Config,
}
