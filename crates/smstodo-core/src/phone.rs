//! Phone number normalization to E.164.
//!
//! NANP-centric: bare 10-digit numbers are assumed to be US/Canada.

/// Normalize `raw` to E.164. Returns `None` when the number can't be made
/// into a plausible E.164 form.
pub fn normalize(raw: &str) -> Option<String> {
    let mut digits = String::with_capacity(raw.len());
    for (i, c) in raw.trim().chars().enumerate() {
        match c {
            '+' if i == 0 => digits.push('+'),
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return None,
        }
    }

    if digits.is_empty() || digits == "+" {
        return None;
    }
    if let Some(rest) = digits.strip_prefix('+') {
        // E.164 allows up to 15 digits after the country code prefix.
        if (7..=15).contains(&rest.len()) {
            return Some(digits);
        }
        return None;
    }
    match digits.len() {
        10 => Some(format!("+1{digits}")),
        11 if digits.starts_with('1') => Some(format!("+{digits}")),
        // International numbers sent without '+' (gateways often strip it).
        12..=15 => Some(format!("+{digits}")),
        _ => None,
    }
}
