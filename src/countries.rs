//! Exit country whitelist and `ExitNodes` value rendering.

use crate::error::{Result, TorError};

/// Country codes accepted for `ExitNodes`, with display names.
pub const COUNTRIES: &[(&str, &str)] = &[
    ("tr", "Turkey"),
    ("de", "Germany"),
    ("us", "United States"),
    ("fr", "France"),
    ("uk", "United Kingdom"),
    ("at", "Austria"),
    ("be", "Belgium"),
    ("ro", "Romania"),
    ("ca", "Canada"),
    ("sg", "Singapore"),
    ("jp", "Japan"),
    ("ie", "Ireland"),
    ("fi", "Finland"),
    ("es", "Spain"),
    ("pl", "Poland"),
];

/// Look up the display name for a country code.
pub fn country_name(code: &str) -> Option<&'static str> {
    COUNTRIES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

/// Whitelist sorted by code, for menus and `countries` output.
pub fn sorted_countries() -> Vec<(&'static str, &'static str)> {
    let mut countries = COUNTRIES.to_vec();
    countries.sort_by_key(|(code, _)| *code);
    countries
}

/// Parse user input like `"us, de fr"` into whitelisted lowercase codes.
///
/// Duplicates are dropped, order is kept. Every unknown code is reported.
pub fn parse_country_codes(input: &str) -> Result<Vec<String>> {
    let mut codes: Vec<String> = Vec::new();
    let mut invalid = Vec::new();

    for raw in input.split(|c: char| c == ',' || c.is_whitespace()) {
        let code = raw.trim().to_lowercase();
        if code.is_empty() {
            continue;
        }
        if country_name(&code).is_none() {
            invalid.push(code);
        } else if !codes.contains(&code) {
            codes.push(code);
        }
    }

    if !invalid.is_empty() {
        return Err(TorError::InvalidInput(format!(
            "invalid country codes: {}",
            invalid.join(", ")
        )));
    }
    if codes.is_empty() {
        return Err(TorError::InvalidInput("no country codes given".to_string()));
    }
    Ok(codes)
}

/// Render codes in torrc set notation: `{de}{fr}`.
pub fn exit_nodes_value<S: AsRef<str>>(codes: &[S]) -> String {
    codes.iter().map(|c| format!("{{{}}}", c.as_ref())).collect()
}

/// Extract `{cc}` tokens from a stored `ExitNodes` value.
///
/// Tokens without braces (fingerprints, nicknames) are skipped.
pub fn parse_exit_nodes(value: &str) -> Vec<String> {
    let mut codes = Vec::new();
    let mut rest = value;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let code = after[..end].trim();
                if !code.is_empty() {
                    codes.push(code.to_lowercase());
                }
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    codes
}

/// Describe a stored `ExitNodes` value for display, e.g. `Germany, France`.
pub fn describe_exit_nodes(value: &str) -> String {
    let codes = parse_exit_nodes(value);
    if codes.is_empty() {
        return value.to_string();
    }
    codes
        .iter()
        .map(|code| country_name(code).unwrap_or(code.as_str()).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
