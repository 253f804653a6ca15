/// Whether a whitespace-separated token looks like a plain non-negative
/// decimal number: after removing the first `.`, only ASCII digits remain.
/// No sign, no exponent, at most one decimal point. This also accepts
/// fragments like `3.5` out of version strings or dates, so chartable data
/// can be a false positive.
fn looks_numeric(token: &str) -> bool {
    let stripped = token.replacen('.', "", 1);
    !stripped.is_empty() && stripped.bytes().all(|b| b.is_ascii_digit())
}

/// Best-effort scan of a reply for numeric tokens, in order of appearance.
/// A token that qualifies but fails to parse is skipped.
pub fn scan_numeric_tokens(reply: &str) -> Vec<f64> {
    reply
        .split_whitespace()
        .filter(|token| looks_numeric(token))
        .filter_map(|token| token.parse::<f64>().ok())
        .collect()
}

/// The series to chart, if any: two or more numeric tokens.
pub fn chartable_series(reply: &str) -> Option<Vec<f64>> {
    let values = scan_numeric_tokens(reply);
    (values.len() >= 2).then_some(values)
}
