//! Field-level validation shared by every model's `validate()`.
//!
//! Lengths are counted in characters, not bytes. Required text fields reject
//! the empty string.

use crate::core::error::MyappError;
use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;

pub const EMAIL_MAX_LENGTH: usize = 254;

static EMAIL_USER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:",
        // dot-atom
        r"[-!#$%&'*+/=?^_`{}|~0-9a-z]+(?:\.[-!#$%&'*+/=?^_`{}|~0-9a-z]+)*",
        r"|",
        // quoted-string
        r#""(?:[\x01-\x08\x0B\x0C\x0E-\x1F!#-\[\]-\x7F]|\\[\x01-\x09\x0B\x0C\x0E-\x7F])*""#,
        r")$",
    ))
    .expect("email user regex")
});

/// Labels may hold any Unicode letter or digit, so internationalized domains
/// pass without punycode conversion. Label lengths are counted in characters.
static EMAIL_DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:[\p{L}\p{N}](?:[\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?\.)+",
        r"[\p{L}\p{N}-]{1,62}[\p{L}\p{N}]$",
    ))
    .expect("email domain regex")
});

static EMAIL_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\[([a-f0-9:.]+)\]$").expect("email literal regex"));

pub fn max_length(field: &'static str, value: &str, max: usize) -> Result<(), MyappError> {
    let len = value.chars().count();
    if len > max {
        return Err(MyappError::validation(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, len
            ),
        ));
    }
    Ok(())
}

pub fn required_text(field: &'static str, value: &str, max: usize) -> Result<(), MyappError> {
    if value.is_empty() {
        return Err(MyappError::validation(field, "This field cannot be blank."));
    }
    max_length(field, value, max)
}

/// Accepts a dot-atom or quoted local part, and a domain that is `localhost`,
/// a bracketed IPv4/IPv6 literal, or a dotted name (Unicode labels allowed).
pub fn email(field: &'static str, value: &str) -> Result<(), MyappError> {
    required_text(field, value, EMAIL_MAX_LENGTH)?;
    let invalid = || MyappError::validation(field, "Enter a valid email address.");

    let (user, domain) = value.rsplit_once('@').ok_or_else(invalid)?;
    if !EMAIL_USER_RE.is_match(user) {
        return Err(invalid());
    }
    if !valid_email_domain(domain) {
        return Err(invalid());
    }
    Ok(())
}

fn valid_email_domain(domain: &str) -> bool {
    if domain == "localhost" || EMAIL_DOMAIN_RE.is_match(domain) {
        return true;
    }
    EMAIL_LITERAL_RE
        .captures(domain)
        .and_then(|caps| caps.get(1))
        .is_some_and(|ip| ip.as_str().parse::<IpAddr>().is_ok())
}
