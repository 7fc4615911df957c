//! Local input checks that run before any network call.
//!
//! Lengths are counted in Unicode scalar values.

use crate::address::is_address_for;
use crate::error::{ClientError, Result};
use crate::types::ChainFamily;

pub const MAX_SUBJECT_LEN: usize = 200;
pub const MAX_BODY_LEN: usize = 10_000;
pub const MAX_MAIL_ID_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;
const MAX_LOCAL_PART_LEN: usize = 64;

fn invalid(message: impl Into<String>) -> ClientError {
    ClientError::Validation(message.into())
}

fn check_length(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len == 0 {
        return Err(invalid(format!("{field} cannot be empty")));
    }
    if len > max {
        return Err(invalid(format!(
            "{field} must be at most {max} characters, got {len}"
        )));
    }
    Ok(())
}

/// Subject 1-200 characters, body 1-10000 characters.
pub fn validate_message(subject: &str, body: &str) -> Result<()> {
    check_length("Subject", subject, MAX_SUBJECT_LEN)?;
    check_length("Body", body, MAX_BODY_LEN)
}

pub fn validate_mail_id(mail_id: &str) -> Result<()> {
    check_length("Mail ID", mail_id, MAX_MAIL_ID_LEN)
}

/// `local@domain` with a dotted domain that passes [`validate_domain`].
pub fn validate_email(email: &str) -> Result<()> {
    check_length("Email", email, MAX_EMAIL_LEN)?;

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid(format!("Invalid email address: '{email}'")))?;

    let local_ok = !local.is_empty()
        && local.chars().count() <= MAX_LOCAL_PART_LEN
        && !local.chars().any(|c| c.is_whitespace() || c == '@');
    if !local_ok || !domain.contains('.') || validate_domain(domain).is_err() {
        return Err(invalid(format!("Invalid email address: '{email}'")));
    }
    Ok(())
}

/// 1-253 characters of dot-separated labels; each label is 1-63 ASCII
/// alphanumerics or hyphens and neither starts nor ends with a hyphen.
pub fn validate_domain(domain: &str) -> Result<()> {
    check_length("Domain", domain, MAX_DOMAIN_LEN)?;

    for label in domain.split('.') {
        let label_ok = !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
            && !label.starts_with('-')
            && !label.ends_with('-');
        if !label_ok {
            return Err(invalid(format!("Invalid domain: '{domain}'")));
        }
    }
    Ok(())
}

/// An amount as callers tend to supply it.
#[derive(Debug, Clone, PartialEq)]
pub enum AmountInput {
    Float(f64),
    Integer(i128),
    Text(String),
}

impl From<f64> for AmountInput {
    fn from(v: f64) -> Self {
        AmountInput::Float(v)
    }
}

impl From<i64> for AmountInput {
    fn from(v: i64) -> Self {
        AmountInput::Integer(v.into())
    }
}

impl From<i32> for AmountInput {
    fn from(v: i32) -> Self {
        AmountInput::Integer(v.into())
    }
}

impl From<u64> for AmountInput {
    fn from(v: u64) -> Self {
        AmountInput::Integer(v.into())
    }
}

impl From<&str> for AmountInput {
    fn from(v: &str) -> Self {
        AmountInput::Text(v.to_string())
    }
}

impl From<String> for AmountInput {
    fn from(v: String) -> Self {
        AmountInput::Text(v)
    }
}

const NEGATIVE: &str = "Amount cannot be negative";
const NOT_A_NUMBER: &str = "Amount must be a valid number";

/// Normalizes an amount to whole base units, flooring fractions.
///
/// Negative values fail with "Amount cannot be negative"; anything that is
/// not a finite number fails with "Amount must be a valid number".
pub fn validate_amount(amount: impl Into<AmountInput>) -> Result<u128> {
    match amount.into() {
        AmountInput::Integer(v) => u128::try_from(v).map_err(|_| invalid(NEGATIVE)),
        AmountInput::Float(v) => floor_float(v),
        AmountInput::Text(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<u128>() {
                return Ok(v);
            }
            if let Ok(v) = s.parse::<i128>() {
                return u128::try_from(v).map_err(|_| invalid(NEGATIVE));
            }
            s.parse::<f64>()
                .map_err(|_| invalid(NOT_A_NUMBER))
                .and_then(floor_float)
        }
    }
}

fn floor_float(v: f64) -> Result<u128> {
    if !v.is_finite() {
        return Err(invalid(NOT_A_NUMBER));
    }
    if v < 0.0 {
        return Err(invalid(NEGATIVE));
    }
    let floored = v.floor();
    if floored >= u128::MAX as f64 {
        return Err(invalid(NOT_A_NUMBER));
    }
    Ok(floored as u128)
}

/// Rejects `address` unless it is shaped for `family`.
pub fn validate_address_for(family: ChainFamily, address: &str) -> Result<()> {
    if is_address_for(family, address) {
        Ok(())
    } else {
        Err(ClientError::AddressFormat {
            expected: family,
            address: address.to_string(),
        })
    }
}
