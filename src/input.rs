//! Common routines for reading project input files.
use crate::comparison::SOURCE_KEY;
use crate::parameters::RawParameters;
use ::log::{info, warn};
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

/// Parse a string as a JSON object
pub fn parse_json_object(json: &str) -> Result<RawParameters> {
    serde_json::from_str(json).context("Failed to parse input JSON")
}

/// Describe the type of a JSON value for error messages
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read a single JSON object from a file.
///
/// # Arguments
///
/// * `file_path` - Path to the JSON file
pub fn read_json_object(file_path: &Path) -> Result<RawParameters> {
    let contents = fs::read_to_string(file_path)
        .with_context(|| format!("Could not read file: {}", file_path.display()))?;
    parse_json_object(&contents)
        .with_context(|| format!("Error reading {}", file_path.display()))
}

/// Read all of stdin as a string
pub fn read_stdin() -> Result<String> {
    let mut contents = String::new();
    std::io::stdin()
        .read_to_string(&mut contents)
        .context("Could not read from stdin")?;

    Ok(contents)
}

/// Read stdin only if it is not an interactive terminal
pub fn read_piped_stdin() -> Result<Option<String>> {
    if std::io::stdin().is_terminal() {
        Ok(None)
    } else {
        read_stdin().map(Some)
    }
}

/// Read a single project from a file, or from stdin if no file is given
pub fn read_project(file_path: Option<&Path>) -> Result<RawParameters> {
    match file_path {
        Some(path) => read_json_object(path),
        None => parse_json_object(&read_stdin()?).context("Error reading project from stdin"),
    }
}

/// Label a project with its source
fn with_source(mut project: RawParameters, source: String) -> RawParameters {
    project.insert(SOURCE_KEY.to_string(), Value::String(source));
    project
}

/// Parse projects supplied on stdin: either a single object or an array of objects.
///
/// Projects are labelled `stdin_project_N`, counting from 1. Unparseable input is ignored with a
/// warning.
fn parse_stdin_projects(json: &str) -> Vec<RawParameters> {
    if json.trim().is_empty() {
        return Vec::new();
    }

    let items = match serde_json::from_str(json) {
        Ok(Value::Array(items)) => items,
        Ok(item) => vec![item],
        Err(err) => {
            warn!("Ignoring stdin, which is not valid JSON: {err}");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match item {
            Value::Object(project) => Some(with_source(project, format!("stdin_project_{}", i + 1))),
            other => {
                warn!(
                    "Ignoring stdin project {}: expected an object, found {}",
                    i + 1,
                    type_name(&other)
                );
                None
            }
        })
        .collect()
}

/// Read a project file, labelled with its path, or warn and return `None` on failure
fn load_project_file(file_path: &Path) -> Option<RawParameters> {
    match read_json_object(file_path) {
        Ok(project) => Some(with_source(project, file_path.display().to_string())),
        Err(err) => {
            warn!("Could not load {}: {err:#}", file_path.display());
            None
        }
    }
}

/// Get the paths of all JSON files in a directory, sorted by file name
fn get_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Could not read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths)
}

/// Gather projects to compare from all sources.
///
/// Projects from stdin come first, followed by the listed files, then the JSON files in
/// `input_dir`. Each project is labelled with its source. Files which cannot be loaded are skipped
/// with a warning.
///
/// # Arguments
///
/// * `stdin` - Contents of stdin, if it was piped
/// * `input_files` - Paths to individual project files
/// * `input_dir` - A directory containing project files
pub fn load_projects(
    stdin: Option<&str>,
    input_files: &[PathBuf],
    input_dir: Option<&Path>,
) -> Result<Vec<RawParameters>> {
    let mut projects = stdin.map(parse_stdin_projects).unwrap_or_default();
    projects.extend(input_files.iter().filter_map(|path| load_project_file(path)));
    if let Some(dir) = input_dir {
        let files = get_json_files(dir)?;
        info!("Found {} project files in {}", files.len(), dir.display());
        projects.extend(files.iter().filter_map(|path| load_project_file(path)));
    }

    Ok(projects)
}
