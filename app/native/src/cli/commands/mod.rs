//! CLI command definitions using Clap.
//!
//! Commands are organized into submodules:
//!
//! - `config_cmd` - Configuration file management
//! - `website` - Website collection and renderer commands

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::config;
use crate::config::schema::generate_schema_json;
use crate::error::PlashError;
use crate::ipc::IpcRequest;

pub mod config_cmd;
pub mod website;

pub use config_cmd::ConfigCommands;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Plash CLI - Make any website your desktop wallpaper.
#[derive(Parser, Debug)]
#[command(name = "plash")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Add a website and make it the wallpaper.
    ///
    /// Accepts a URL, a domain (`https://` is assumed), or a local
    /// directory or HTML file.
    #[command(after_long_help = r#"Examples:
  plash add time.is
  plash add https://calendar.google.com --title Calendar
  plash add ~/Sites/dashboard"#)]
    Add {
        /// The website address.
        url: String,

        /// Title shown in menus. Fetched from the page when omitted.
        #[arg(long, short)]
        title: Option<String>,
    },

    /// Remove a website.
    Remove {
        /// Website UUID or 1-based index from `plash list`.
        #[arg(value_name = "ID|INDEX")]
        website: String,
    },

    /// List websites.
    List {
        /// Only show websites whose title or URL contains this text.
        #[arg(long, short)]
        filter: Option<String>,

        /// Output as JSON.
        #[arg(long, short)]
        json: bool,
    },

    /// Show the current website.
    Current {
        /// Output as JSON.
        #[arg(long, short)]
        json: bool,
    },

    /// Make a website the wallpaper.
    SetCurrent {
        /// Website UUID or 1-based index from `plash list`.
        #[arg(value_name = "ID|INDEX")]
        website: String,
    },

    /// Switch to the next website.
    Next,

    /// Switch to the previous website.
    Previous,

    /// Switch to a random website.
    Random,

    /// Reload the current website.
    Reload,

    /// Toggle browsing mode, which makes the wallpaper interactive.
    ToggleBrowsingMode,

    /// Show the website on the desktop.
    Enable,

    /// Hide the website.
    Disable,

    /// Show what the running app is doing.
    Status {
        /// Output as JSON.
        #[arg(long, short)]
        json: bool,
    },

    /// Run a plash:// URL command.
    #[command(after_long_help = r#"Examples:
  plash open "plash://add?url=https://time.is&title=Time"
  plash open plash://next"#)]
    Open {
        /// The plash:// URL.
        url: String,
    },

    /// Configuration file management commands.
    ///
    /// Initialize, view, and locate the configuration file.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Output the configuration JSON Schema.
    ///
    /// Can be redirected to a file for use with editors that support JSON
    /// Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Usage:
    ///   eval "$(plash completions --shell zsh)"
    ///   plash completions --shell fish > ~/.config/fish/completions/plash.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },

    /// Launch the desktop application.
    #[command(name = "--desktop", hide = true)]
    Desktop,
}

impl Cli {
    /// Returns the custom config path if specified via --config flag.
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> { self.config.as_ref().map(PathBuf::from) }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), PlashError> {
        if let Some(path) = self.config_path() {
            if !path.exists() {
                return Err(PlashError::ConfigError(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            config::set_custom_config_path(path);
        }

        match &self.command {
            Commands::Add { url, title } => website::add(url, title.as_deref()),
            Commands::Remove { website } => website::remove(website),
            Commands::List { filter, json } => website::list(filter.as_deref(), *json),
            Commands::Current { json } => website::current(*json),
            Commands::SetCurrent { website } => website::set_current(website),
            Commands::Next => website::navigate(&IpcRequest::Next),
            Commands::Previous => website::navigate(&IpcRequest::Previous),
            Commands::Random => website::navigate(&IpcRequest::Random),
            Commands::Reload => website::require_app(&IpcRequest::Reload),
            Commands::ToggleBrowsingMode => website::require_app(&IpcRequest::ToggleBrowsingMode),
            Commands::Enable => website::set_enabled(true),
            Commands::Disable => website::set_enabled(false),
            Commands::Status { json } => website::status(*json),
            Commands::Open { url } => open(url),
            Commands::Config(cmd) => config_cmd::execute(cmd),
            Commands::Schema => {
                println!("{}", generate_schema_json());
                Ok(())
            }
            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
            Commands::Desktop => Err(PlashError::InvalidArguments(
                "Desktop mode is handled before command dispatch".to_string(),
            )),
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, "plash", &mut io::stdout());
    }
}

/// `plash open`: validates the URL locally, then hands it to the app. An
/// `add` falls back to the store file like `plash add`.
fn open(url: &str) -> Result<(), PlashError> {
    match crate::url_scheme::parse_command_url(url)? {
        crate::app::AppCommand::Add { url, title } => website::add(&url, title.as_deref()),
        _ => website::require_app(&IpcRequest::Open { url: url.to_string() }),
    }
}
