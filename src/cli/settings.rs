//! Code related to the program settings file and the CLI commands for interacting with it.
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result};
use clap::Subcommand;

/// The available subcommands for managing the settings file.
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Show the path to the settings file.
    Path,
    /// Show the settings currently in effect.
    Show,
    /// Show the default settings file contents.
    ShowDefault,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Path => handle_settings_path_command(),
            Self::Show => handle_settings_show_command()?,
            Self::ShowDefault => handle_settings_show_default_command(),
        }

        Ok(())
    }
}

/// Handle the `settings path` command.
fn handle_settings_path_command() {
    println!("{}", get_settings_file_path().display());
}

/// Handle the `settings show` command.
fn handle_settings_show_command() -> Result<()> {
    let settings = Settings::load().context("Failed to load settings.")?;
    let contents = toml::to_string(&settings).context("Could not convert settings to TOML")?;
    print!("{contents}");

    Ok(())
}

/// Handle the `settings show-default` command.
fn handle_settings_show_default_command() {
    print!("{}", Settings::default_file_contents());
}
