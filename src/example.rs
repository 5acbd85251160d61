//! Code for working with the bundled example projects
use crate::input::parse_json_object;
use crate::parameters::RawParameters;
use anyhow::{Context, Result, ensure};
use include_dir::{Dir, include_dir};
use std::fs;
use std::path::Path;

/// The directory containing the example projects.
static EXAMPLES_DIR: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/demos");

/// The name of the project file in each example
pub const PROJECT_FILE_NAME: &str = "project.json";

const README_FILE_NAME: &str = "README.txt";

/// Get the names of all examples
pub fn get_example_names() -> impl Iterator<Item = &'static str> {
    EXAMPLES_DIR.dirs().filter_map(|dir| dir.path().to_str())
}

/// A bundled example project
pub struct Example(&'static Dir<'static>);

impl Example {
    /// Get the example with the specified name
    pub fn from_name(name: &str) -> Result<Self> {
        let dir = EXAMPLES_DIR
            .get_dir(name)
            .with_context(|| format!("Example '{name}' not found"))?;

        Ok(Self(dir))
    }

    fn get_file_contents(&self, file_name: &str) -> Result<&'static str> {
        self.0
            .get_file(self.0.path().join(file_name))
            .with_context(|| format!("Missing file: {file_name}"))?
            .contents_utf8()
            .context("File not UTF-8 encoded")
    }

    /// Get the contents of the readme file for this example
    pub fn get_readme(&self) -> Result<&'static str> {
        self.get_file_contents(README_FILE_NAME)
    }

    /// Get the raw project parameters for this example
    pub fn get_project(&self) -> Result<RawParameters> {
        parse_json_object(self.get_file_contents(PROJECT_FILE_NAME)?)
    }

    /// Extract this example to a specified destination, which must not already exist
    pub fn extract(&self, new_path: &Path) -> Result<()> {
        ensure!(
            !new_path.exists(),
            "Destination already exists: {}",
            new_path.display()
        );

        fs::create_dir_all(new_path)
            .with_context(|| format!("Could not create directory: {}", new_path.display()))?;
        for file in self.0.files() {
            let Some(file_name) = file.path().file_name() else {
                continue;
            };
            fs::write(new_path.join(file_name), file.contents())?;
        }

        Ok(())
    }
}
