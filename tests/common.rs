use assert_cmd::Command;
use assert_cmd::cargo_bin_cmd;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Get a command for running the `lcoe` binary, ignoring any user settings file
#[allow(dead_code)]
pub fn lcoe_cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("lcoe");
    cmd.env("LCOE_USE_DEFAULT_SETTINGS", "1");
    cmd
}

/// Check that `lcoe` runs successfully with the given arguments
#[allow(dead_code)]
pub fn assert_lcoe_runs(args: &[&str]) {
    lcoe_cmd().args(args).assert().success();
}

/// Run `lcoe` successfully and return its stdout
#[allow(dead_code)]
pub fn get_lcoe_stdout(args: &[&str]) -> String {
    let output = lcoe_cmd().args(args).assert().success().get_output().clone();
    String::from_utf8(output.stdout).expect("Non-UTF-8 output")
}

/// Write a JSON value to a file in `dir`, returning its path
#[allow(dead_code)]
pub fn write_json_file(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, value.to_string()).unwrap();
    path
}

/// Read a JSON file
#[allow(dead_code)]
pub fn read_json_file(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// A project whose LCOE is exactly `lcoe` USD/MWh (no discounting or running costs)
#[allow(dead_code)]
pub fn project_with_lcoe(technology: &str, lcoe: f64) -> Value {
    serde_json::json!({
        "technology": technology,
        "capex_usd": lcoe * 10_000.0,
        "annual_generation_mwh": 1000,
        "project_lifetime_years": 10,
        "discount_rate": 0.0,
        "degradation_rate": 0.0
    })
}

/// A 100 MW solar PV project
#[allow(dead_code)]
pub fn solar_project() -> Value {
    serde_json::json!({
        "technology": "solar_pv",
        "capacity_mw": 100,
        "capex_usd": 80_000_000,
        "annual_generation_mwh": 200_000,
        "project_lifetime_years": 25,
        "discount_rate": 0.08,
        "annual_opex_usd": 800_000,
        "opex_escalation_rate": 0.02,
        "degradation_rate": 0.005
    })
}
