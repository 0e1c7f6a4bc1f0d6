use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::Priority;

#[derive(Parser, Debug)]
#[command(author, version, about = "To-do notes client", long_about = None)]
pub struct Cli {
    /// Base URL of the notes service
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,
    /// Identity sent on login
    #[arg(long, global = true, value_name = "NAME")]
    pub identity: Option<String>,
    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all notes
    List,
    /// Create a note
    Add {
        #[arg(value_name = "TEXT")]
        text: String,
        /// 1 = low, 2 = medium, 3 = high
        #[arg(short = 'p', long = "priority", default_value = "1", value_parser = parse_priority)]
        priority: Priority,
    },
    /// Replace a note's text and priority
    Edit {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(value_name = "TEXT")]
        text: String,
        /// Keeps the current priority when omitted
        #[arg(short = 'p', long = "priority", value_parser = parse_priority)]
        priority: Option<Priority>,
    },
    /// Delete a note
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Flip a note between done and not done
    Toggle {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Launch TUI interface
    Tui,
    /// Print a shell completion script
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    s.parse::<Priority>().map_err(|e| e.to_string())
}
