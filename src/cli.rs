//! The command line interface for the LCOE calculator.
use crate::comparison::compare_projects;
use crate::finance::calculate_lcoe;
use crate::input::{load_projects, read_json_object, read_piped_stdin, read_project};
use crate::log;
use crate::output::breakdown::write_breakdown_csv;
use crate::output::{Envelope, ErrorDetail, compute_inputs_hash, write_json};
use crate::parameters::{Parameter, RawParameters, ValidationError, validate_parameters};
use crate::sensitivity::{
    RangeSpec, SensitivityReport, generate_range, run_full_sensitivity, run_sensitivity,
};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;

pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the LCOE calculator.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options controlling where and how JSON output is written
#[derive(Args, Default)]
pub struct OutputOpts {
    /// Output JSON file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl OutputOpts {
    /// Write `value` according to these options.
    ///
    /// Output is pretty-printed if requested on the command line or in the program settings.
    fn write<T: Serialize>(&self, value: &T, settings: &Settings) -> Result<()> {
        write_json(value, self.output.as_deref(), self.pretty || settings.pretty)
    }
}

/// Options for the `calculate` command
#[derive(Args, Default)]
pub struct CalculateOpts {
    /// Output options
    #[command(flatten)]
    pub output: OutputOpts,
    /// Also write the annual breakdown to a CSV file
    #[arg(long, value_name = "FILE")]
    pub breakdown_csv: Option<PathBuf>,
}

/// Options for the `compare` command
#[derive(Args, Default)]
pub struct CompareOpts {
    /// Input JSON files to compare
    #[arg(short, long = "inputs", value_name = "FILE", num_args = 1..)]
    pub inputs: Vec<PathBuf>,
    /// Directory containing project JSON files
    #[arg(short = 'd', long, value_name = "DIR")]
    pub inputs_dir: Option<PathBuf>,
    /// Output options
    #[command(flatten)]
    pub output: OutputOpts,
}

/// Options for the `sensitivity` command
#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).multiple(true).args(["vary", "all"])))]
pub struct SensitivityOpts {
    /// Input JSON file with base project parameters
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
    /// Parameter to vary
    #[arg(short, long, value_name = "PARAMETER")]
    pub vary: Option<Parameter>,
    /// Range specification: min,max,step or comma-separated values
    #[arg(short, long, requires = "vary", allow_hyphen_values = true)]
    pub range: Option<RangeSpec>,
    /// Run full sensitivity analysis on all key parameters (takes precedence over --vary)
    #[arg(short, long)]
    pub all: bool,
    /// Output options
    #[command(flatten)]
    pub output: OutputOpts,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Calculate the LCOE of a project.
    Calculate {
        /// Input JSON file (defaults to stdin)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
        /// Other options
        #[command(flatten)]
        opts: CalculateOpts,
    },
    /// Compare LCOE across multiple projects.
    ///
    /// Projects are read from stdin (a JSON array or a single object), the listed files and the
    /// JSON files in a directory.
    Compare {
        /// Options for the comparison
        #[command(flatten)]
        opts: CompareOpts,
    },
    /// Analyse how LCOE changes when varying project parameters.
    Sensitivity {
        /// Options for the analysis
        #[command(flatten)]
        opts: SensitivityOpts,
    },
    /// Manage example projects.
    Example {
        /// The available subcommands for managing example projects.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Calculate { input, opts } => {
                handle_calculate_command(input.as_deref(), &opts, None)
            }
            Self::Compare { opts } => {
                let stdin = read_piped_stdin()?;
                handle_compare_command(&opts, stdin.as_deref(), None)
            }
            Self::Sensitivity { opts } => handle_sensitivity_command(&opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ lcoe --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    if let Some(command) = cli.command {
        command.execute()?;
    } else {
        // No command provided. Show help.
        Cli::command().print_long_help()?;
    }

    Ok(())
}

/// Load program settings (if not provided) and initialise the program logger
fn load_settings_and_init_logger(settings: Option<Settings>) -> Result<Settings> {
    let settings = Settings::load_or(settings)?;
    log::init(&settings.log_level).context("Failed to initialise logging.")?;

    Ok(settings)
}

/// The body of the `calculate` command's output
#[derive(Serialize)]
struct CalculateOutput<T, E = ValidationError> {
    data: Option<T>,
    error: Option<E>,
}

/// A project which could not be read, described in the same shape as a [`ValidationError`]
#[derive(Debug, Serialize)]
struct InputFailure {
    code: &'static str,
    message: String,
    field: &'static str,
    received: Value,
    expected: &'static str,
}

impl InputFailure {
    /// Describe a failure to read a project, if it was due to a missing file or malformed JSON
    fn from_error(err: &anyhow::Error, input: Option<&Path>) -> Option<Self> {
        err.chain().find_map(|cause| {
            if let Some(json_err) = cause.downcast_ref::<serde_json::Error>() {
                return Some(Self {
                    code: "INVALID_JSON",
                    message: format!("Failed to parse input JSON: {json_err}"),
                    field: "input",
                    received: Value::Null,
                    expected: "Valid JSON object",
                });
            }

            let io_err = cause.downcast_ref::<io::Error>()?;
            let path = input?.display().to_string();
            (io_err.kind() == io::ErrorKind::NotFound).then(|| Self {
                code: "FILE_NOT_FOUND",
                message: format!("Input file not found: {path}"),
                field: "input",
                received: Value::String(path),
                expected: "Existing file path",
            })
        })
    }
}

/// An output body consisting only of an error
#[derive(Serialize)]
struct ErrorOutput<E> {
    error: E,
}

/// Calculate the LCOE of a raw project and write the results.
///
/// If the project is invalid, an unsuccessful result is written before an error is returned.
pub(crate) fn calculate_project(
    raw: &RawParameters,
    opts: &CalculateOpts,
    settings: &Settings,
) -> Result<()> {
    let inputs_hash = compute_inputs_hash(raw);
    let params = match validate_parameters(raw) {
        Ok(params) => params,
        Err(err) => {
            let output = CalculateOutput::<()> {
                data: None,
                error: Some(err.clone()),
            };
            opts.output
                .write(&Envelope::new(false, output, Some(inputs_hash)), settings)?;
            return Err(err).context("Invalid project parameters");
        }
    };

    let result = calculate_lcoe(&params);
    info!(
        "LCOE for {} project: {} USD/MWh",
        params.technology, result.lcoe_usd_per_mwh
    );

    if let Some(csv_path) = &opts.breakdown_csv {
        write_breakdown_csv(csv_path, &result.annual_breakdown)?;
        info!("Annual breakdown written to {}", csv_path.display());
    }

    let output = CalculateOutput::<_> {
        data: Some(result),
        error: None,
    };
    opts.output
        .write(&Envelope::new(true, output, Some(inputs_hash)), settings)
}

/// Handle the `calculate` command.
pub fn handle_calculate_command(
    input: Option<&Path>,
    opts: &CalculateOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings_and_init_logger(settings)?;
    let raw = match read_project(input) {
        Ok(raw) => raw,
        Err(err) => {
            if let Some(failure) = InputFailure::from_error(&err, input) {
                let output = CalculateOutput::<(), _> {
                    data: None,
                    error: Some(failure),
                };
                opts.output
                    .write(&Envelope::new(false, output, None), &settings)?;
            }
            return Err(err);
        }
    };
    calculate_project(&raw, opts, &settings)
}

/// Handle the `compare` command.
///
/// # Arguments
///
/// * `opts` - Command options
/// * `stdin` - Contents of stdin, if it was piped
/// * `settings` - Program settings (loaded from file if `None`)
pub fn handle_compare_command(
    opts: &CompareOpts,
    stdin: Option<&str>,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings_and_init_logger(settings)?;
    let projects = load_projects(stdin, &opts.inputs, opts.inputs_dir.as_deref())?;
    if projects.is_empty() {
        let error = ErrorDetail::new(
            "NO_INPUT",
            "No project files provided. Use --inputs, --inputs-dir, or stdin.",
        );
        let output = ErrorOutput {
            error: error.clone(),
        };
        opts.output
            .write(&Envelope::new(false, output, None), &settings)?;
        bail!(error);
    }
    info!("Comparing {} projects", projects.len());

    match compare_projects(&projects) {
        Ok(comparison) => {
            if let Some(failed) = &comparison.failed_projects {
                warn!("{} projects could not be analysed", failed.len());
            }
            opts.output
                .write(&Envelope::new(true, comparison, None), &settings)
        }
        Err(failure) => {
            opts.output
                .write(&Envelope::new(false, &failure, None), &settings)?;
            Err(failure.into())
        }
    }
}

/// Handle the `sensitivity` command.
pub fn handle_sensitivity_command(opts: &SensitivityOpts, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings_and_init_logger(settings)?;
    let raw = match read_json_object(&opts.input) {
        Ok(raw) => raw,
        Err(err) => {
            let output = ErrorOutput {
                error: ErrorDetail::new("INPUT_ERROR", format!("{err:#}")),
            };
            opts.output
                .write(&Envelope::new(false, output, None), &settings)?;
            return Err(err);
        }
    };
    let inputs_hash = compute_inputs_hash(&raw);
    let base = match validate_parameters(&raw) {
        Ok(params) => params,
        Err(err) => {
            let output = ErrorOutput { error: err.clone() };
            opts.output
                .write(&Envelope::new(false, output, Some(inputs_hash)), &settings)?;
            return Err(err).context("Invalid base project");
        }
    };

    let report = match opts.vary {
        Some(parameter) if !opts.all => {
            let values = generate_range(
                parameter.value_in(&base),
                parameter,
                opts.range.as_ref(),
            );
            info!("Varying {parameter} over {} values", values.len());
            SensitivityReport::SingleParameter(run_sensitivity(&base, parameter, &values))
        }
        _ => {
            info!("Running full sensitivity analysis");
            SensitivityReport::Full(run_full_sensitivity(&base))
        }
    };

    opts.output
        .write(&Envelope::new(true, report, Some(inputs_hash)), &settings)
}
