//! Subcommands understood by the CLI

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
  /// Create a new account
  Register {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "STORYTELLER_PASSWORD", hide_env_values = true)]
    password: String,
  },
  /// Log in and remember the session
  Login {
    #[arg(long)]
    email: String,
    #[arg(long, env = "STORYTELLER_PASSWORD", hide_env_values = true)]
    password: String,
  },
  /// Forget the stored session
  Logout,
  /// Show who is logged in
  Whoami,
  /// Browse the story feed
  #[command(alias = "feed")]
  Stories {
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Stories per page (defaults to feed.page_size from the config)
    #[arg(long)]
    size: Option<u32>,
  },
  /// Show a single story
  Show { id: String },
  /// Post a new story with a photo
  Add {
    #[arg(long)]
    photo: PathBuf,
    #[arg(long)]
    description: String,
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
  },
  /// List stories that have a location
  Map,
  /// Request a password reset link
  ResetPassword {
    #[arg(long)]
    email: String,
  },
  /// Manage the local story cache
  Cache {
    #[command(subcommand)]
    action: CacheCommand,
  },
}

impl Command {
  /// Name for logs; never includes argument values
  pub fn name(&self) -> &'static str {
    match self {
      Command::Register { .. } => "register",
      Command::Login { .. } => "login",
      Command::Logout => "logout",
      Command::Whoami => "whoami",
      Command::Stories { .. } => "stories",
      Command::Show { .. } => "show",
      Command::Add { .. } => "add",
      Command::Map => "map",
      Command::ResetPassword { .. } => "reset-password",
      Command::Cache { .. } => "cache",
    }
  }
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum CacheCommand {
  /// Delete every cached story
  Clear,
}
