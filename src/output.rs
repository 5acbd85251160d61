//! Code for writing results.
//!
//! Every command writes a single JSON document (an "envelope") containing a `success` flag, the
//! command's results and some [`Metadata`] about the run.
use crate::SKILL_NAME;
use crate::parameters::RawParameters;
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

pub mod breakdown;

/// Number of hex characters of the input hash to keep
const INPUTS_HASH_LENGTH: usize = 12;

/// A machine-readable error code with an explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    /// Error code (e.g. `NO_INPUT`)
    pub code: String,
    /// Human-readable explanation
    pub message: String,
}

impl ErrorDetail {
    /// Create a new [`ErrorDetail`]
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Information about how a result was produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// The name of the tool
    pub skill: &'static str,
    /// The program version
    pub version: &'static str,
    /// Fingerprint of the input, for reproducibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs_hash: Option<String>,
    /// When the result was calculated (RFC 3339, UTC)
    pub calculated_at: String,
}

impl Metadata {
    /// Metadata for a result calculated now
    pub fn new(inputs_hash: Option<String>) -> Self {
        Self {
            skill: SKILL_NAME,
            version: env!("CARGO_PKG_VERSION"),
            inputs_hash,
            calculated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// A command's output: a success flag, the body and metadata.
///
/// The body's fields are written at the top level of the document.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    /// Whether the command succeeded
    pub success: bool,
    /// Command-specific content
    #[serde(flatten)]
    pub body: T,
    /// Information about the run
    pub metadata: Metadata,
}

impl<T: Serialize> Envelope<T> {
    /// Wrap `body` in an envelope
    pub fn new(success: bool, body: T, inputs_hash: Option<String>) -> Self {
        Self {
            success,
            body,
            metadata: Metadata::new(inputs_hash),
        }
    }
}

/// Writes JSON in the same way as Python's `json.dumps` with its default options.
///
/// Items are separated by `", "` and keys by `": "`, non-ASCII characters are escaped and floats
/// are written as Python's `repr` would write them.
struct PythonJsonFormatter;

impl Formatter for PythonJsonFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_f64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(python_float_repr(value).as_bytes())
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        for c in fragment.chars() {
            if c.is_ascii() && c != '\x7f' {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }

        Ok(())
    }
}

/// Format a finite float as Python's `repr` does.
///
/// Both use the shortest digits which round-trip. Python writes fixed-point notation for decimal
/// exponents from -4 to 15 and otherwise scientific notation with a signed, two-digit exponent.
fn python_float_repr(value: f64) -> String {
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(mantissa) => ("-", mantissa),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if (-4..16).contains(&exponent) {
        // Number of digits before the decimal point
        let point = exponent + 1;
        if point <= 0 {
            format!("{sign}0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
        } else if point as usize >= digits.len() {
            format!("{sign}{digits}{}.0", "0".repeat(point as usize - digits.len()))
        } else {
            let (whole, fraction) = digits.split_at(point as usize);
            format!("{sign}{whole}.{fraction}")
        }
    } else {
        let (first, rest) = digits.split_at(1);
        let mantissa = if rest.is_empty() {
            first.to_string()
        } else {
            format!("{first}.{rest}")
        };
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        format!("{sign}{mantissa}e{exponent_sign}{:02}", exponent.unsigned_abs())
    }
}

/// Fingerprint raw input parameters.
///
/// The input is serialised with keys sorted, exactly as Python's `json.dumps(data,
/// sort_keys=True)` would write it, then hashed with SHA-256 and truncated to 12 hex characters.
/// Key order in the original input therefore has no effect.
pub fn compute_inputs_hash(raw: &RawParameters) -> String {
    // NB: serde_json maps are sorted by key
    let mut serialised = Vec::new();
    raw.serialize(&mut Serializer::with_formatter(
        &mut serialised,
        PythonJsonFormatter,
    ))
    .expect("Writing a JSON map to memory cannot fail");
    let mut hash = format!("{:x}", Sha256::digest(&serialised));
    hash.truncate(INPUTS_HASH_LENGTH);

    hash
}

/// Serialise `value` to JSON, either compact or indented with two spaces
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };

    json.context("Failed to serialise output")
}

/// Write `value` as JSON to the specified file, or to stdout if `path` is `None`
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>, pretty: bool) -> Result<()> {
    let json = to_json(value, pretty)?;
    match path {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write output file: {}", path.display()))?,
        None => println!("{json}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{raw_from_json, raw_parameters};
    use rstest::rstest;
    use serde_json::{Value, json};
    use tempfile::tempdir;

    #[derive(Serialize)]
    struct Body {
        data: u32,
    }

    #[rstest]
    fn inputs_hash_ignores_key_order(raw_parameters: RawParameters) {
        let reordered = raw_from_json(json!({
            "discount_rate": 0.08,
            "project_lifetime_years": 25,
            "annual_generation_mwh": 2000,
            "capex_usd": 1_000_000
        }));
        let hash = compute_inputs_hash(&raw_parameters);
        assert_eq!(hash.len(), 12);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, compute_inputs_hash(&reordered));
    }

    #[test]
    fn inputs_hash_matches_python_json_dumps() {
        let solar = raw_from_json(json!({
            "technology": "solar_pv",
            "capacity_mw": 100,
            "capex_usd": 80_000_000,
            "annual_generation_mwh": 200_000,
            "project_lifetime_years": 25,
            "discount_rate": 0.08,
            "annual_opex_usd": 800_000,
            "opex_escalation_rate": 0.02,
            "degradation_rate": 0.005
        }));
        assert_eq!(compute_inputs_hash(&solar), "542dd0a90c25");

        let unusual = raw_from_json(
            serde_json::from_str(
                r#"{"technology": "\u00e9olien \u2600 \ud83d\ude00", "capex_usd": 1.5e-05,
                    "annual_generation_mwh": 1e16, "x": [1, 2.0, null, true], "y": {}, "z": [],
                    "big": 1e15, "neg": -0.0001, "del": "a\u007fb\n"}"#,
            )
            .unwrap(),
        );
        assert_eq!(compute_inputs_hash(&unusual), "7769ba44088f");
    }

    #[rstest]
    #[case(0.0, "0.0")]
    #[case(-0.0, "-0.0")]
    #[case(2.0, "2.0")]
    #[case(0.08, "0.08")]
    #[case(0.005, "0.005")]
    #[case(123.456, "123.456")]
    #[case(-0.0001, "-0.0001")]
    #[case(0.000_015, "1.5e-05")]
    #[case(1e15, "1000000000000000.0")]
    #[case(1e16, "1e+16")]
    #[case(-2.5e300, "-2.5e+300")]
    fn python_float_repr_works(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(python_float_repr(value), expected);
    }

    #[rstest]
    fn inputs_hash_depends_on_values(raw_parameters: RawParameters) {
        let mut changed = raw_parameters.clone();
        changed.insert("discount_rate".into(), json!(0.09));
        assert_ne!(
            compute_inputs_hash(&raw_parameters),
            compute_inputs_hash(&changed)
        );
    }

    #[test]
    fn envelope_flattens_body() {
        let envelope = Envelope::new(true, Body { data: 42 }, Some("abc".into()));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"], json!(42));
        assert_eq!(value["metadata"]["skill"], json!("lcoe-calculator"));
        assert_eq!(value["metadata"]["inputs_hash"], json!("abc"));
        assert_eq!(
            value["metadata"]["version"],
            json!(env!("CARGO_PKG_VERSION"))
        );
    }

    #[test]
    fn metadata_timestamp_is_rfc3339_utc() {
        let metadata = Metadata::new(None);
        let timestamp = chrono::DateTime::parse_from_rfc3339(&metadata.calculated_at).unwrap();
        assert_eq!(timestamp.offset().local_minus_utc(), 0);
        assert!(
            serde_json::to_value(&metadata)
                .unwrap()
                .get("inputs_hash")
                .is_none()
        );
    }

    #[rstest]
    #[case(false, "{\"data\":1}")]
    #[case(true, "{\n  \"data\": 1\n}")]
    fn to_json_formatting(#[case] pretty: bool, #[case] expected: &str) {
        assert_eq!(to_json(&Body { data: 1 }, pretty).unwrap(), expected);
    }

    #[test]
    fn write_json_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&Body { data: 7 }, Some(&path), false).unwrap();
        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, json!({"data": 7}));
    }

    #[test]
    fn error_detail_display() {
        let error = ErrorDetail::new("NO_INPUT", "Nothing to do");
        assert_eq!(error.to_string(), "NO_INPUT: Nothing to do");
    }
}
