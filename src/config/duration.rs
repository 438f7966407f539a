//! Duration parsing for configuration values.

use anyhow::{bail, Context};

/// Parse a duration like "1h", "30m", "300s" or "300" into whole seconds.
///
/// A bare number is seconds. Negative values are rejected.
pub fn parse_duration_to_secs(s: &str) -> anyhow::Result<u64> {
    let s = s.trim();
    if s.is_empty() {
        bail!("Empty duration string");
    }

    let (num_str, unit, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, "hours", 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, "minutes", 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, "seconds", 1)
    } else {
        (s, "seconds", 1)
    };

    let value: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid {unit} value in duration '{s}'"))?;
    value
        .checked_mul(multiplier)
        .with_context(|| format!("Duration '{s}' is too large"))
}
