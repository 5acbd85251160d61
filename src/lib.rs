//! Levelised Cost of Energy (LCOE) calculator.
//!
//! The core of the crate is the LCOE engine in [`finance`], fed by the input validator in
//! [`parameters`]. Two analyses are built on top of it: ranking of several projects against one
//! another ([`comparison`]) and the elasticity of LCOE with respect to each input
//! ([`sensitivity`]). The remaining modules make up the `lcoe` command-line program.
#![warn(missing_docs)]
use std::env;
use std::path::PathBuf;

pub mod cli;
pub mod comparison;
pub mod example;
pub mod finance;
pub mod input;
pub mod log;
pub mod output;
pub mod parameters;
pub mod sensitivity;
pub mod settings;

#[cfg(test)]
mod fixture;

/// The name under which results are published in output metadata
pub const SKILL_NAME: &str = "lcoe-calculator";

/// Get the directory where program configuration files are stored.
///
/// This can be overridden with the `LCOE_CONFIG_DIR` environment variable. Otherwise the
/// platform's standard configuration directory is used.
pub fn get_lcoe_config_dir() -> PathBuf {
    if let Some(dir) = env::var_os("LCOE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    let mut path = dirs::config_dir().unwrap_or_default();
    path.push("lcoe");
    path
}
