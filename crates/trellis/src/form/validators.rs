//! Reusable field predicates.
//!
//! Every predicate here has the shape `(value, all fields) -> bool`, so it
//! can be passed straight to [`validator`](super::validator) or
//! [`array_validator`](super::array_validator). Parameterized predicates
//! are functions returning such a closure.
//!
//! Predicates are total: a value of the wrong type fails instead of
//! panicking.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::validation::FieldMap;

/// IP protocol version for address checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IpVersion {
    /// IPv4, dotted quad.
    #[default]
    V4,
    /// IPv6.
    V6,
}

impl IpVersion {
    /// Longest valid prefix length.
    pub fn max_prefix(self) -> u8 {
        match self {
            IpVersion::V4 => 32,
            IpVersion::V6 => 128,
        }
    }

    fn parse(self, text: &str) -> Option<IpAddr> {
        match self {
            IpVersion::V4 => text.parse::<Ipv4Addr>().ok().map(IpAddr::V4),
            IpVersion::V6 => text.parse::<Ipv6Addr>().ok().map(IpAddr::V6),
        }
    }
}

fn mac_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(concat!(
                r"^(?:",
                r"[0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5}",
                r"|[0-9A-Fa-f]{2}(?:-[0-9A-Fa-f]{2}){5}",
                r"|[0-9A-Fa-f]{2}(?: [0-9A-Fa-f]{2}){5}",
                r"|[0-9A-Fa-f]{12}",
                r"|[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4}",
                r")$"
            ))
            .ok()
        })
        .as_ref()
}

/// Empty, or a MAC address.
///
/// Accepts six hex pairs separated consistently by `:`, `-` or a space,
/// twelve bare hex digits, or three dot-separated groups of four.
pub fn validate_mac_field(value: &Value, _fields: &FieldMap) -> bool {
    match value.as_str() {
        Some("") => true,
        Some(mac) => mac_pattern().is_some_and(|re| re.is_match(mac)),
        None => false,
    }
}

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(concat!(
                r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
                r"@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+",
                r"[A-Za-z]{2,63}$"
            ))
            .ok()
        })
        .as_ref()
}

/// An email address with a dotted domain, such as `ops@example.com`.
///
/// The local part may not start, end or repeat a dot, and the address is
/// limited to 254 characters.
pub fn validate_email(value: &Value, _fields: &FieldMap) -> bool {
    value
        .as_str()
        .filter(|email| email.len() <= 254)
        .is_some_and(|email| email_pattern().is_some_and(|re| re.is_match(email)))
}

/// Present and not null.
pub fn validate_non_null(value: &Value, _fields: &FieldMap) -> bool {
    !value.is_null()
}

/// Text whose length in characters is within `min..=max`.
pub fn validate_length(
    min: usize,
    max: usize,
) -> impl Fn(&Value, &FieldMap) -> bool + Send + Sync + Clone + 'static {
    move |value, _| {
        value
            .as_str()
            .map(|s| s.chars().count())
            .is_some_and(|len| (min..=max).contains(&len))
    }
}

/// Text at least `min` characters long.
pub fn validate_min_length(
    min: usize,
) -> impl Fn(&Value, &FieldMap) -> bool + Send + Sync + Clone + 'static {
    validate_length(min, usize::MAX)
}

/// Equal to the sibling field `other`, as in a password confirmation.
pub fn validate_repeat(
    other: &str,
) -> impl Fn(&Value, &FieldMap) -> bool + Send + Sync + Clone + use<> {
    let other = other.to_string();
    move |value, fields| fields.get(&other).unwrap_or(&Value::Null) == value
}

/// Text made only of ASCII characters.
pub fn validate_ascii(value: &Value, _fields: &FieldMap) -> bool {
    value.as_str().is_some_and(str::is_ascii)
}

/// A network in `address/prefix` notation for `version`.
pub fn validate_cidr(
    version: IpVersion,
) -> impl Fn(&Value, &FieldMap) -> bool + Send + Sync + Clone + 'static {
    move |value, _| {
        let Some((address, prefix)) = value.as_str().and_then(|s| s.split_once('/')) else {
            return false;
        };
        let prefix_ok = !prefix.is_empty()
            && prefix.bytes().all(|b| b.is_ascii_digit())
            && prefix
                .parse::<u8>()
                .is_ok_and(|p| p <= version.max_prefix());
        prefix_ok && version.parse(address).is_some()
    }
}

/// A single address for `version`.
pub fn validate_ip(
    version: IpVersion,
) -> impl Fn(&Value, &FieldMap) -> bool + Send + Sync + Clone + 'static {
    move |value, _| value.as_str().and_then(|s| version.parse(s)).is_some()
}

/// A file selection holding exactly one entry.
pub fn validate_single_file(value: &Value, _fields: &FieldMap) -> bool {
    matches!(value.as_array().map(Vec::as_slice), Some([file]) if !file.is_null())
}

/// Text matching `pattern` in full.
///
/// The pattern is anchored, so `"[0-9]+"` rejects `"12a"`.
pub fn validate_pattern(
    pattern: &str,
) -> Result<impl Fn(&Value, &FieldMap) -> bool + Send + Sync + Clone + use<>, regex::Error> {
    let re = Regex::new(&format!("^(?:{pattern})$"))?;
    Ok(move |value: &Value, _: &FieldMap| value.as_str().is_some_and(|s| re.is_match(s)))
}

/// An integer within `min..=max`, given as a number or as numeric text.
pub fn validate_int_range(
    min: i64,
    max: i64,
) -> impl Fn(&Value, &FieldMap) -> bool + Send + Sync + Clone + 'static {
    move |value, _| {
        let number = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        number.is_some_and(|n| (min..=max).contains(&n))
    }
}
