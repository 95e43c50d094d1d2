//! Command-line interface

pub mod channel;
pub mod install;
pub mod output;
pub mod prompt;
pub mod session;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::clock::{Clock, SystemClock};
use crate::config::{Layout, RegistryConfig, Settings};
use crate::platform::Platform;
use crate::resolution::{Environment, ProcessEnvironment, Resolver};
use crate::shim::ShimManager;
use crate::version::types::Channel;

pub use output::OutputFormat;
pub use prompt::{LinePrompt, Prompt};

/// Values accepted by `--source`
const SOURCE_VALUES: [&str; 3] = ["gemfile", "binary", "tebako"];

#[derive(Debug, Parser)]
#[command(name = "mnenv")]
#[command(version, about = "Install and switch between Metanorma versions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ruby (Gemfile) releases from the container image registry
    Gemfile {
        #[command(subcommand)]
        action: ChannelAction,
    },
    /// Snap store releases
    Snap {
        #[command(subcommand)]
        action: ChannelAction,
    },
    /// Homebrew tap releases
    Homebrew {
        #[command(subcommand)]
        action: ChannelAction,
    },
    /// Chocolatey package releases
    Chocolatey {
        #[command(subcommand)]
        action: ChannelAction,
    },
    /// Packed single-binary releases
    Binary {
        #[command(subcommand)]
        action: ChannelAction,
    },
    /// Show every recorded field of one version
    Info {
        channel: Channel,
        version: String,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// List the recorded versions of every channel
    ListAll {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Install a version
    Install(InstallArgs),
    /// Remove an installed version
    Uninstall {
        version: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Print commands that select a version for the current shell session
    Use(SelectArgs),
    /// Set the default version
    Global(SelectArgs),
    /// Set the version for the current directory
    Local(SelectArgs),
    /// List installed versions
    Versions {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Print the path a shim would run for NAME
    Which { name: String },
    /// Regenerate all shims
    Rehash,
    /// Show the detected shell and where to put the shims on PATH
    ShellInfo,
}

#[derive(Debug, Subcommand)]
pub enum ChannelAction {
    /// List recorded versions
    List {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Record versions published since the last refresh
    Refresh,
    /// Re-record every version the remote lists
    Revamp,
    /// Re-record a single version
    Update { version: String },
}

#[derive(Debug, Args)]
pub struct InstallArgs {
    pub version: Option<String>,
    #[arg(long, value_parser = SOURCE_VALUES)]
    pub source: Option<String>,
    /// Choose the source and version from a list
    #[arg(short, long)]
    pub interactive: bool,
    /// Reinstall without asking when the version is already installed
    #[arg(short, long)]
    pub force: bool,
    /// List installable versions
    #[arg(long, conflicts_with_all = ["version", "interactive", "force"])]
    pub list: bool,
}

#[derive(Debug, Args)]
pub struct SelectArgs {
    pub version: Option<String>,
    #[arg(long, value_parser = SOURCE_VALUES)]
    pub source: Option<String>,
    /// Choose from the installed versions
    #[arg(short, long)]
    pub interactive: bool,
}

/// Everything a command needs from its surroundings
pub struct App {
    pub layout: Layout,
    pub settings: Settings,
    pub clock: Arc<dyn Clock>,
    pub env: Arc<dyn Environment>,
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
    pub platform: Platform,
}

impl App {
    /// Context for the running process: `MNENV_ROOT`, settings file, working directory
    pub fn from_process() -> anyhow::Result<Self> {
        let layout = Layout::from_env();
        let settings = Settings::load(&layout.settings_file())?;
        let layout = match &settings.data_dir {
            Some(dir) => layout.with_data_dir(dir),
            None => layout,
        };
        let cwd = std::env::current_dir().context("Cannot determine the current directory")?;

        Ok(Self {
            layout,
            settings,
            clock: Arc::new(SystemClock),
            env: Arc::new(ProcessEnvironment),
            cwd,
            home: dirs::home_dir(),
            platform: Platform::current(),
        })
    }

    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.layout.clone(), self.env.clone(), self.cwd.clone())
    }

    pub fn shims(&self) -> ShimManager {
        ShimManager::new(self.layout.clone(), self.platform)
    }
}

/// Configured base URL, or `default`
pub(crate) fn base_url<'a>(config: &'a RegistryConfig, default: &'a str) -> &'a str {
    config.base_url.as_deref().unwrap_or(default)
}

pub async fn run(
    cli: Cli,
    app: &App,
    out: &mut dyn Write,
    prompt: &mut dyn Prompt,
) -> anyhow::Result<()> {
    match cli.command {
        Command::Gemfile { action } => channel::run(app, Channel::Gemfile, action, out).await,
        Command::Snap { action } => channel::run(app, Channel::Snap, action, out).await,
        Command::Homebrew { action } => channel::run(app, Channel::Homebrew, action, out).await,
        Command::Chocolatey { action } => {
            channel::run(app, Channel::Chocolatey, action, out).await
        }
        Command::Binary { action } => channel::run(app, Channel::Binary, action, out).await,
        Command::Info {
            channel,
            version,
            format,
        } => channel::info(app, channel, &version, format, out),
        Command::ListAll { format } => channel::list_all(app, format, out),
        Command::Install(args) => install::install(app, args, out, prompt).await,
        Command::Uninstall { version, force } => {
            install::uninstall(app, &version, force, out, prompt)
        }
        Command::Use(args) => session::use_version(app, args, out, prompt),
        Command::Global(args) => session::global(app, args, out, prompt),
        Command::Local(args) => session::local(app, args, out, prompt),
        Command::Versions { format } => session::versions(app, format, out),
        Command::Which { name } => session::which(app, &name, out),
        Command::Rehash => session::rehash(app, out),
        Command::ShellInfo => session::shell_info(app, out),
    }
}
