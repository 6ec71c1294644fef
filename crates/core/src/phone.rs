//! Indian mobile number normalization.
//!
//! Freely formatted input (`+91 98765-43210`, `919876543210`, `098765 43210`)
//! is reduced to a 10-digit canonical form used as the storage key, and a
//! `+91`-prefixed dispatch form handed to the SMS gateway.

use crate::AppError;

/// Country calling code for India, without the `+`.
pub const COUNTRY_CODE: &str = "91";

/// Length of a national mobile number.
pub const NATIONAL_NUMBER_LEN: usize = 10;

/// Why a raw phone string was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PhoneRejection {
    #[error("Phone number is required")]
    MissingInput,

    #[error("Invalid 10-digit Indian mobile number")]
    InvalidMobileNumber,
}

impl From<PhoneRejection> for AppError {
    fn from(rejection: PhoneRejection) -> Self {
        Self::InvalidArgument(rejection.to_string())
    }
}

/// A validated Indian mobile number.
///
/// Only obtainable through [`normalize`], so holding one proves the
/// canonical form is exactly 10 digits starting with 6, 7, 8 or 9.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPhone {
    canonical: String,
    dispatch: String,
}

impl NormalizedPhone {
    /// 10-digit storage and lookup key.
    #[inline]
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// `+91`-prefixed form for the SMS gateway.
    #[inline]
    #[must_use]
    pub fn dispatch(&self) -> &str {
        &self.dispatch
    }
}

impl std::fmt::Display for NormalizedPhone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// Normalize a raw phone number.
///
/// Non-digits are stripped; a 12-digit `91…` string loses its country code;
/// anything longer than 10 digits keeps its last 10.
///
/// # Errors
/// `MissingInput` for blank input, `InvalidMobileNumber` when the candidate
/// is not a 10-digit number starting with 6-9.
pub fn normalize(raw: &str) -> Result<NormalizedPhone, PhoneRejection> {
    if raw.trim().is_empty() {
        return Err(PhoneRejection::MissingInput);
    }

    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    let candidate = if digits.len() == NATIONAL_NUMBER_LEN + COUNTRY_CODE.len()
        && digits.starts_with(COUNTRY_CODE)
    {
        &digits[COUNTRY_CODE.len()..]
    } else if digits.len() > NATIONAL_NUMBER_LEN {
        &digits[digits.len() - NATIONAL_NUMBER_LEN..]
    } else {
        digits.as_str()
    };

    if !is_indian_mobile(candidate) {
        return Err(PhoneRejection::InvalidMobileNumber);
    }

    Ok(NormalizedPhone {
        canonical: candidate.to_string(),
        dispatch: format!("+{COUNTRY_CODE}{candidate}"),
    })
}

fn is_indian_mobile(candidate: &str) -> bool {
    candidate.len() == NATIONAL_NUMBER_LEN
        && candidate.bytes().all(|b| b.is_ascii_digit())
        && matches!(candidate.as_bytes()[0], b'6'..=b'9')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalent_spellings_share_canonical_form() {
        for raw in ["9876543210", "+919876543210", "919876543210", "98-7654-3210"] {
            let phone = normalize(raw).unwrap();
            assert_eq!(phone.canonical(), "9876543210", "input {raw}");
            assert_eq!(phone.dispatch(), "+919876543210", "input {raw}");
        }
    }

    #[test]
    fn formatting_noise_is_ignored() {
        let phone = normalize(" +91 (987) 654-3210 ").unwrap();
        assert_eq!(phone.canonical(), "9876543210");
    }

    #[test]
    fn leading_zero_trunk_prefix_is_tolerated() {
        assert_eq!(normalize("09876543210").unwrap().canonical(), "9876543210");
        assert_eq!(normalize("+91 09876543210").unwrap().canonical(), "9876543210");
    }

    #[test]
    fn empty_and_blank_input_is_missing() {
        assert_eq!(normalize(""), Err(PhoneRejection::MissingInput));
        assert_eq!(normalize("   "), Err(PhoneRejection::MissingInput));
    }

    #[test]
    fn short_numbers_are_rejected() {
        assert_eq!(normalize("12345"), Err(PhoneRejection::InvalidMobileNumber));
        assert_eq!(normalize("abc"), Err(PhoneRejection::InvalidMobileNumber));
    }

    #[test]
    fn leading_digit_outside_mobile_range_is_rejected() {
        assert_eq!(
            normalize("5876543210"),
            Err(PhoneRejection::InvalidMobileNumber)
        );
        assert_eq!(
            normalize("+910876543210"),
            Err(PhoneRejection::InvalidMobileNumber)
        );
    }

    #[test]
    fn non_ascii_digits_are_stripped() {
        // Devanagari digits are not decimal ASCII digits.
        assert_eq!(
            normalize("९८७६५४३२१०"),
            Err(PhoneRejection::InvalidMobileNumber)
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "6000000000",
            "7123456789",
            "8999999999",
            "9876543210",
            "+91 98765 43210",
        ] {
            let first = normalize(raw).unwrap();
            let second = normalize(first.canonical()).unwrap();
            assert_eq!(first, second);
            assert_eq!(normalize(first.dispatch()).unwrap(), first);
        }
    }

    #[test]
    fn rejection_converts_to_invalid_argument() {
        let err: AppError = PhoneRejection::InvalidMobileNumber.into();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }
}
