use clap::{ArgAction, Parser, Subcommand};

use crate::service::Language;

#[derive(Debug, Parser)]
#[command(name = "ssdown", version, about = "Save social media videos to a local gallery album")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show the video behind a link and its variants
    Fetch { url: String },
    /// Download a variant into the gallery album
    Download {
        url: String,
        /// Index of the variant as listed by `fetch`
        #[arg(default_value_t = 0)]
        variant: usize,
    },
    /// List downloaded videos
    List,
    /// Restrict downloads to Wi-Fi
    WifiOnly {
        #[arg(action = ArgAction::Set, value_parser = parse_switch, value_name = "on|off")]
        enabled: bool,
    },
    /// Show or change the language
    Language { language: Option<Language> },
    /// Show settings and permission state
    Status,
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(format!("expected on or off, got {}", other)),
    }
}
