//! Code related to the example projects and the CLI commands for interacting with them.
use super::{CalculateOpts, calculate_project, load_settings_and_init_logger};
use crate::example::{Example, get_example_names};
use crate::settings::Settings;
use ::log::info;
use anyhow::Result;
use clap::Subcommand;
use std::path::{Path, PathBuf};

/// The available subcommands for managing example projects.
#[derive(Subcommand)]
pub enum ExampleSubcommands {
    /// List available examples.
    List,
    /// Provide information about the specified example.
    Info {
        /// The name of the example.
        name: String,
    },
    /// Extract an example project to a new directory.
    Extract {
        /// The name of the example to extract.
        name: String,
        /// The destination folder for the example.
        new_path: Option<PathBuf>,
    },
    /// Calculate the LCOE of an example project.
    Run {
        /// The name of the example to run.
        name: String,
        /// Other options
        #[command(flatten)]
        opts: CalculateOpts,
    },
}

impl ExampleSubcommands {
    /// Execute the supplied example subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List => handle_example_list_command(),
            Self::Info { name } => handle_example_info_command(&name)?,
            Self::Extract { name, new_path } => {
                handle_example_extract_command(&name, new_path.as_deref())?;
            }
            Self::Run { name, opts } => handle_example_run_command(&name, &opts, None)?,
        }

        Ok(())
    }
}

/// Handle the `example list` command.
fn handle_example_list_command() {
    for name in get_example_names() {
        println!("{name}");
    }
}

/// Handle the `example info` command.
fn handle_example_info_command(name: &str) -> Result<()> {
    let info = Example::from_name(name)?.get_readme()?;
    print!("{info}");

    Ok(())
}

/// Handle the `example extract` command
fn handle_example_extract_command(name: &str, dest: Option<&Path>) -> Result<()> {
    let dest = dest.unwrap_or(Path::new(name));
    Example::from_name(name)?.extract(dest)?;
    println!("Extracted '{name}' to {}", dest.display());

    Ok(())
}

/// Handle the `example run` command.
pub fn handle_example_run_command(
    name: &str,
    opts: &CalculateOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let example = Example::from_name(name)?;
    let settings = load_settings_and_init_logger(settings)?;
    info!("Running example '{name}'");
    calculate_project(&example.get_project()?, opts, &settings)
}
