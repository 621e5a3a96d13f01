//! Format checks for contact and identity numbers.
//!
//! Each checker returns the normalized form on success so callers store one
//! canonical spelling: emails lowercased, phone and Aadhaar numbers reduced
//! to their digits, PAN uppercased.

use crate::error::AppError;

/// Lowercases and checks `local@domain.tld` with no whitespace.
///
/// # Errors
///
/// Returns [`AppError::InvalidRequest`] naming `label` on a bad address.
pub fn email(raw: &str, label: &str) -> Result<String, AppError> {
    let address = raw.trim().to_lowercase();
    let valid = !address.chars().any(char::is_whitespace)
        && address.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .rsplit_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        });
    if valid {
        Ok(address)
    } else {
        Err(AppError::InvalidRequest(format!("{label} is not a valid email address")))
    }
}

/// Strips separators and requires exactly `len` digits.
fn digits(raw: &str, len: usize, label: &str) -> Result<String, AppError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == len {
        Ok(digits)
    } else {
        Err(AppError::InvalidRequest(format!("{label} must have {len} digits")))
    }
}

/// A ten-digit phone number; spaces, dashes, and brackets are dropped.
///
/// # Errors
///
/// Returns [`AppError::InvalidRequest`] unless ten digits remain.
pub fn phone(raw: &str, label: &str) -> Result<String, AppError> {
    digits(raw, 10, label)
}

/// A twelve-digit Aadhaar number.
///
/// # Errors
///
/// Returns [`AppError::InvalidRequest`] unless twelve digits remain.
pub fn aadhaar(raw: &str) -> Result<String, AppError> {
    digits(raw, 12, "aadhar_number")
}

/// A PAN: five letters, four digits, one letter.
///
/// # Errors
///
/// Returns [`AppError::InvalidRequest`] on any other shape.
pub fn pan(raw: &str) -> Result<String, AppError> {
    let pan = raw.trim().to_ascii_uppercase();
    let bytes = pan.as_bytes();
    let valid = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            0..=4 | 9 => b.is_ascii_uppercase(),
            _ => b.is_ascii_digit(),
        });
    if valid {
        Ok(pan)
    } else {
        Err(AppError::InvalidRequest("pan_number is not a valid PAN".to_string()))
    }
}
