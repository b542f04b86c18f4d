use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::LengthBounds;
use crate::error::NameRule;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Check that `name` is a plain identifier within `bounds`.
pub fn check_identifier(name: &str, bounds: LengthBounds) -> Result<(), NameRule> {
    check_length(name, bounds)?;
    if !IDENTIFIER.is_match(name) {
        return Err(NameRule::Format);
    }
    Ok(())
}

/// Check only the character count of `name`.
pub fn check_length(name: &str, bounds: LengthBounds) -> Result<(), NameRule> {
    if !bounds.contains(name.chars().count()) {
        return Err(NameRule::Length {
            min: bounds.min,
            max: bounds.max,
        });
    }
    Ok(())
}

/// Derive a name not present in `taken`, truncated to `max` characters.
///
/// The base is tried first; collisions get `_2`, `_3`, ... suffixes.
pub fn unique_name(base: &str, max: usize, taken: &BTreeSet<String>) -> String {
    let candidate = truncate(base, max);
    if !taken.contains(&candidate) {
        return candidate;
    }

    let mut counter = 2_usize;
    loop {
        let suffix = format!("_{counter}");
        let head = truncate(base, max.saturating_sub(suffix.len()));
        let candidate = format!("{head}{suffix}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
