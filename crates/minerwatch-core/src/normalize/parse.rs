//! Parsers for hashrate and share strings.

/// Unit suffixes and their multiplier to KH/s. Longer suffix first.
const HASHRATE_UNITS: &[(&str, &str, f64)] = &[
    ("GH/S", "G", 1_000_000.0),
    ("MH/S", "M", 1_000.0),
    ("KH/S", "K", 1.0),
];

/// Parse a reported hashrate into KH/s.
///
/// Accepts `"113.1K"`, `"0.8M"`, `"0.001G"`, `"1.0149MH/s"` (case-insensitive)
/// and bare numbers, which are taken as KH/s. Blank or unparseable input
/// yields `0.0`.
pub fn parse_hashrate_kh(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let value = raw.trim().to_uppercase();
    if value.is_empty() {
        return 0.0;
    }

    for (long, short, multiplier) in HASHRATE_UNITS {
        let number = value
            .strip_suffix(long)
            .or_else(|| value.strip_suffix(short));
        if let Some(number) = number {
            return parse_finite(number.trim())
                .map(|n| n * multiplier)
                .unwrap_or(0.0);
        }
    }

    let digits: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    parse_finite(&digits).unwrap_or(0.0)
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Split `"accepted/rejected[/pct%]"` into its counters.
///
/// Each token is parsed independently; a malformed or missing token is
/// `None`.
pub fn parse_shares(raw: Option<&str>) -> (Option<u64>, Option<u64>) {
    let Some(raw) = raw else {
        return (None, None);
    };
    let mut tokens = raw.split('/').map(|t| t.trim().parse::<u64>().ok());
    let accepted = tokens.next().flatten();
    let rejected = tokens.next().flatten();
    (accepted, rejected)
}
