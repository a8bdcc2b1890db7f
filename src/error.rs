use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    #[error("Configuration file is not valid JSON: {0}")]
    ConfigSyntax(serde_json::Error),
    #[error("Missing or invalid configuration key: {0}")]
    ConfigSchema(serde_json::Error),
    #[error("Webhook URL is empty or still the placeholder value, please set slack_webhook_url")]
    PlaceholderWebhook,
    #[error("No sites configured")]
    NoSites,
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Data => Error::ConfigSchema(err),
            Category::Io => Error::Io(err.into()),
            Category::Syntax | Category::Eof => Error::ConfigSyntax(err),
        }
    }
}
