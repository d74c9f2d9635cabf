//! Journal number series.
//!
//! Numbers take the form `"{prefix}-NNN"` with the numeric suffix
//! zero-padded to at least three digits. The series is per organization;
//! the unique constraint on `(organization_id, journal_number)` is the
//! final arbiter against racing writers.

/// Returns the default series prefix for a year: `JRN-{year}`.
#[must_use]
pub fn default_prefix(year: i32) -> String {
    format!("JRN-{year}")
}

/// Returns the next number in the series for `prefix`, given the numbers
/// already taken.
///
/// Only entries of the exact form `"{prefix}-<digits>"` participate;
/// anything else (including reversal suffixes like `"-REV"`) is ignored.
#[must_use]
pub fn next_in_series<S: AsRef<str>>(prefix: &str, existing: &[S]) -> String {
    let highest = existing
        .iter()
        .filter_map(|number| suffix_of(prefix, number.as_ref()))
        .max()
        .unwrap_or(0);

    format!("{prefix}-{:03}", highest + 1)
}

/// Extracts the numeric suffix of `number` if it belongs to the series.
fn suffix_of(prefix: &str, number: &str) -> Option<u64> {
    let rest = number.strip_prefix(prefix)?.strip_prefix('-')?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}
