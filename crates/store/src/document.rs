//! Tracked data file codec
//!
//! The navigation data lives in a JavaScript module so the static site can
//! import it directly:
//!
//! ```text
//! // catnav-data-format: 1          (optional marker line)
//! export const mockData = { ...pretty-printed JSON... }
//! ```
//!
//! Decoding checks the assignment explicitly and then requires exactly one
//! JSON value, so nothing outside the JSON is ever evaluated or guessed at.
//! Encoding always emits the canonical spelling, which keeps repeated saves of
//! an unchanged document byte-identical.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ContentStoreError, Result};

/// Canonical assignment written before the JSON payload.
pub const LEGACY_PREFIX: &str = "export const mockData = ";
pub const FORMAT_MARKER: &str = "// catnav-data-format:";
pub const FORMAT_VERSION: u32 = 1;

const BINDING_NAME: &str = "mockData";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub emit_format_marker: bool,
}

/// Render `value` as the tracked file's full text.
pub fn encode<T: Serialize>(value: &T, options: EncodeOptions) -> Result<String> {
    let json = serde_json::to_string_pretty(value)?;

    let mut text = String::with_capacity(json.len() + LEGACY_PREFIX.len() + 32);
    if options.emit_format_marker {
        text.push_str(&format!("{} {}\n", FORMAT_MARKER, FORMAT_VERSION));
    }
    text.push_str(LEGACY_PREFIX);
    text.push_str(&json);
    text.push('\n');
    Ok(text)
}

/// Parse the tracked file's full text.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    let body = strip_header(text)?;

    let mut values = serde_json::Deserializer::from_str(body).into_iter::<T>();
    let value = match values.next() {
        Some(Ok(value)) => value,
        Some(Err(e)) => return Err(ContentStoreError::Parse(e)),
        None => {
            return Err(ContentStoreError::Format(
                "no JSON value follows the assignment".to_string(),
            ));
        }
    };

    let rest = body[values.byte_offset()..].trim_start();
    let rest = rest.strip_prefix(';').unwrap_or(rest);
    if !rest.trim().is_empty() {
        return Err(ContentStoreError::Format(format!(
            "unexpected content after the JSON value at byte {}",
            values.byte_offset()
        )));
    }

    Ok(value)
}

/// Skip the optional marker line and the assignment, returning the JSON text.
fn strip_header(text: &str) -> Result<&str> {
    let mut rest = text.trim_start_matches('\u{feff}').trim_start();

    if let Some(after) = rest.strip_prefix(FORMAT_MARKER) {
        let (version, remainder) = after.split_once('\n').unwrap_or((after, ""));
        let version = version.trim();
        if version.parse::<u32>().ok() != Some(FORMAT_VERSION) {
            return Err(ContentStoreError::Format(format!(
                "unsupported data format version '{}'",
                version
            )));
        }
        rest = remainder.trim_start();
    }

    strip_assignment(rest).ok_or_else(|| {
        ContentStoreError::Format(format!("expected the file to start with `{}`", LEGACY_PREFIX.trim_end()))
    })
}

/// Match `export const mockData =` with any whitespace between tokens.
fn strip_assignment(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("export")?;
    let rest = skip_required_whitespace(rest)?.strip_prefix("const")?;
    let rest = skip_required_whitespace(rest)?.strip_prefix(BINDING_NAME)?;
    let rest = rest.trim_start().strip_prefix('=')?;
    Some(rest.trim_start())
}

fn skip_required_whitespace(text: &str) -> Option<&str> {
    let trimmed = text.trim_start();
    (trimmed.len() < text.len()).then_some(trimmed)
}
