//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::bootstrap::BootstrapSettings;
use crate::cli::args::{BootstrapArgs, Cli, Commands};
use crate::error::Result;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command, writing its output to `out`.
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    project_root: PathBuf,
    settings_file: Option<PathBuf>,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project root.
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            settings_file: None,
        }
    }

    /// Read base settings from a YAML file.
    pub fn with_settings_file(mut self, path: Option<PathBuf>) -> Self {
        self.settings_file = path;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Build bootstrap settings: the settings file (if any), then flags.
    ///
    /// A relative or missing `project_dir` in the file is taken relative
    /// to the project root.
    pub fn settings(&self, args: &BootstrapArgs) -> Result<BootstrapSettings> {
        let mut settings = match &self.settings_file {
            Some(path) => {
                debug!("Loading bootstrap settings from {}", path.display());
                let mut settings = BootstrapSettings::load(path)?;
                settings.project_dir = self.project_root.join(&settings.project_dir);
                settings
            }
            None => BootstrapSettings::for_project(self.project_root.clone()),
        };
        args.apply(&mut settings);
        Ok(settings)
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it.
    pub fn dispatch(&self, cli: &Cli, out: &mut dyn Write) -> Result<CommandResult> {
        match &cli.command {
            Commands::Env(args) => {
                let settings = self.settings(&args.bootstrap)?;
                let cmd = super::env::EnvCommand::new(settings, args.clone());
                cmd.execute(out)
            }
            Commands::Resolve(args) => {
                let settings = self.settings(&args.bootstrap)?;
                let cmd = super::resolve::ResolveCommand::new(settings, args.clone());
                cmd.execute(out)
            }
        }
    }
}
