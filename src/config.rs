use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::chat::{AuthHeader, EnvelopeShape};
use crate::cli::Cli;

const DEFAULT_HEADER_NAME: &str = "Authorization";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => anyhow::bail!("unknown theme '{}', expected 'dark' or 'light'", other),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dark => write!(f, "dark"),
            Self::Light => write!(f, "light"),
        }
    }
}

/// Everything the chat core and the front ends need to know up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub webhook_url: String,
    pub auth_header: Option<AuthHeader>,
    pub theme: Theme,
    pub attachments_allowed: bool,
    pub envelope: EnvelopeShape,
}

/// Raw values before validation
#[derive(Debug, Default)]
struct RawSettings {
    webhook_url: Option<String>,
    header_name: Option<String>,
    header_value: Option<String>,
    theme: Option<String>,
    attachments: Option<String>,
    envelope: Option<String>,
}

impl Settings {
    /// Resolve settings from the environment, then command-line overrides
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::resolve(|key| env::var(key).ok(), cli)
    }

    fn resolve(lookup: impl Fn(&str) -> Option<String>, cli: &Cli) -> Result<Self> {
        let mut raw = RawSettings {
            webhook_url: lookup("HOOKCHAT_WEBHOOK_URL"),
            header_name: lookup("HOOKCHAT_AUTH_HEADER_NAME"),
            header_value: lookup("HOOKCHAT_AUTH_HEADER_VALUE"),
            theme: lookup("HOOKCHAT_THEME"),
            attachments: lookup("HOOKCHAT_ATTACHMENTS"),
            envelope: lookup("HOOKCHAT_ENVELOPE"),
        };

        if cli.webhook_url.is_some() {
            raw.webhook_url = cli.webhook_url.clone();
        }
        if cli.header_name.is_some() {
            raw.header_name = cli.header_name.clone();
        }
        if cli.header_value.is_some() {
            raw.header_value = cli.header_value.clone();
        }
        if cli.theme.is_some() {
            raw.theme = cli.theme.clone();
        }
        if cli.no_attachments {
            raw.attachments = Some("false".to_string());
        }
        if cli.envelope.is_some() {
            raw.envelope = cli.envelope.clone();
        }

        Self::validate(raw)
    }

    fn validate(raw: RawSettings) -> Result<Self> {
        let webhook_url = raw
            .webhook_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .context("No webhook URL configured. Set HOOKCHAT_WEBHOOK_URL or pass --webhook-url")?;

        let parsed = reqwest::Url::parse(&webhook_url)
            .with_context(|| format!("Invalid webhook URL '{}'", webhook_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Webhook URL must use http or https, got '{}'", parsed.scheme());
        }

        let auth_header = resolve_header(raw.header_name, raw.header_value);

        let theme = match raw.theme {
            Some(value) => value.parse()?,
            None => Theme::default(),
        };

        let attachments_allowed = match raw.attachments {
            Some(value) => parse_flag(&value)
                .with_context(|| format!("Invalid HOOKCHAT_ATTACHMENTS value '{}'", value))?,
            None => true,
        };

        let envelope = match raw.envelope {
            Some(value) => value.parse()?,
            None => EnvelopeShape::default(),
        };

        Ok(Self {
            webhook_url,
            auth_header,
            theme,
            attachments_allowed,
            envelope,
        })
    }

    /// Human-readable summary with the header value masked
    pub fn describe(&self) -> String {
        let header = match &self.auth_header {
            Some(h) => format!("{}: {}", h.name, mask(&h.value)),
            None => "(none)".to_string(),
        };

        format!(
            "Webhook URL:  {}\nHeader:       {}\nTheme:        {}\nAttachments:  {}\nEnvelope:     {}",
            self.webhook_url,
            header,
            self.theme,
            if self.attachments_allowed { "allowed" } else { "disabled" },
            self.envelope,
        )
    }
}

/// A header is only sent when it has a value; the name defaults to Authorization
fn resolve_header(name: Option<String>, value: Option<String>) -> Option<AuthHeader> {
    let value = value.filter(|v| !v.trim().is_empty())?;
    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_HEADER_NAME.to_string());

    Some(AuthHeader { name, value })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn mask(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    if value.chars().count() <= 4 {
        return "****".to_string();
    }
    format!("{}****", visible)
}
