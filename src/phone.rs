//! Phone number normalization and validation.
//!
//! Converts loosely-formatted input (`"06 12 34 56 78"`, `"+33 (0)6 12.34.56.78"`)
//! into the canonical `+`-prefixed international form WhatsApp expects, or
//! rejects it with a human-readable error. Pure and deterministic.

use serde::Serialize;

/// Minimum digit count accepted before formatting.
const MIN_DIGITS: usize = 10;

/// Maximum digit count accepted before formatting.
const MAX_DIGITS: usize = 15;

/// Minimum length of the formatted number, including the leading `+`.
const MIN_FORMATTED_LEN: usize = 11;

/// Maximum length of the formatted number, including the leading `+`.
const MAX_FORMATTED_LEN: usize = 16;

/// Outcome of validating a raw phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhoneValidation {
    /// Whether the input is acceptable for sending.
    pub is_valid: bool,
    /// Canonical international form (`+` followed by digits), when valid.
    pub formatted_number: Option<String>,
    /// Rejection reason, when invalid.
    pub error: Option<String>,
}

impl PhoneValidation {
    fn valid(formatted: String) -> Self {
        Self {
            is_valid: true,
            formatted_number: Some(formatted),
            error: None,
        }
    }

    fn invalid(error: &str) -> Self {
        Self {
            is_valid: false,
            formatted_number: None,
            error: Some(error.to_owned()),
        }
    }
}

/// Validate and normalize a raw phone number.
///
/// Strips every non-digit character, enforces a 10–15 digit bound, then
/// formats: French mobiles (`06`/`07`) and landlines (`01`–`05`, `08`, `09`)
/// lose the leading `0` and gain `+33`; any other leading `0` just loses the
/// `0`; everything else is assumed already international and gains `+`.
/// Input already carrying a `+` is reassembled as `+` plus its digits.
pub fn validate_phone_number(raw: &str) -> PhoneValidation {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return PhoneValidation::invalid("Phone number is required");
    }

    if digits.len() < MIN_DIGITS || digits.len() > MAX_DIGITS {
        return PhoneValidation::invalid("Phone number must be between 10 and 15 digits");
    }

    let formatted = if raw.starts_with('+') {
        format!("+{digits}")
    } else if let Some(rest) = digits.strip_prefix('0') {
        if is_french_prefix(&digits) {
            format!("+33{rest}")
        } else {
            // Other countries written with a leading trunk zero.
            format!("+{rest}")
        }
    } else {
        format!("+{digits}")
    };

    if formatted.len() < MIN_FORMATTED_LEN || formatted.len() > MAX_FORMATTED_LEN {
        return PhoneValidation::invalid("Invalid international phone number format");
    }

    PhoneValidation::valid(formatted)
}

/// Whether a `0`-leading digit string looks like a French national number.
///
/// Mobiles start `06`/`07`; landlines `01`–`05`, `08`, `09`. A second digit
/// of `0` falls outside both sets and is handled by the generic branch.
fn is_french_prefix(digits: &str) -> bool {
    matches!(
        digits.as_bytes().get(1),
        Some(b'1'..=b'9')
    )
}
