//! Comparator library for row ordering.
//!
//! Every builder returns a [`CompareFn`], a three-way ordering over two rows.
//! Comparators are total: missing data falls back to a neutral default
//! (`""`, `false`, epoch 0, empty sequence) instead of failing. Strings are
//! ordered by the Unicode root collation, so accented letters sort next to
//! their base letters.
//!
//! # Example
//!
//! ```
//! use serde_json::{json, Value};
//! use trellis::model::comparators;
//!
//! let mut machines = vec![
//!     json!({ "name": "node-b", "netbootEnabled": true }),
//!     json!({ "name": "node-a" }),
//! ];
//!
//! let by_name = comparators::string::<Value>("name");
//! comparators::sort_rows(&mut machines, &by_name);
//! assert_eq!(machines[0]["name"], "node-a");
//!
//! let netboot_first = comparators::descending(comparators::boolean::<Value>("netbootEnabled"));
//! comparators::sort_rows(&mut machines, &netboot_first);
//! assert_eq!(machines[0]["name"], "node-b");
//! ```

use std::cmp::Ordering;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use icu_collator::{Collator, CollatorBorrowed};
use icu_locale::locale;
use serde_json::Value;
use trellis_core::logging::targets;

use super::record::{FieldPath, Record};

/// Type alias for a row comparator.
///
/// Compares two rows and returns an ordering.
pub type CompareFn<R> = Arc<dyn Fn(&R, &R) -> Ordering + Send + Sync>;

/// Compares the strings found at `path`, locale-aware.
///
/// Absent or non-string values compare as `""`.
pub fn string<R: Record + 'static>(path: impl Into<FieldPath>) -> CompareFn<R> {
    let path = path.into();
    Arc::new(move |a, b| locale_compare(string_at(a, &path), string_at(b, &path)))
}

/// Like [`string`], applying `xform` to both strings before comparing.
pub fn string_with<R, F>(path: impl Into<FieldPath>, xform: F) -> CompareFn<R>
where
    R: Record + 'static,
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let path = path.into();
    Arc::new(move |a, b| {
        locale_compare(&xform(string_at(a, &path)), &xform(string_at(b, &path)))
    })
}

/// Compares booleans at `path`, absent or false ordering before true.
pub fn boolean<R: Record + 'static>(path: impl Into<FieldPath>) -> CompareFn<R> {
    let path = path.into();
    Arc::new(move |a, b| bool_at(a, &path).cmp(&bool_at(b, &path)))
}

/// Compares timestamps at `path`. Absent or unparseable values are epoch 0.
pub fn date<R: Record + 'static>(path: impl Into<FieldPath>) -> CompareFn<R> {
    let path = path.into();
    Arc::new(move |a, b| {
        timestamp_millis(a.lookup(&path)).cmp(&timestamp_millis(b.lookup(&path)))
    })
}

/// Compares numbers at `path`, absent values are 0.
pub fn number<R: Record + 'static>(path: impl Into<FieldPath>) -> CompareFn<R> {
    let path = path.into();
    Arc::new(move |a, b| number_at(a, &path).total_cmp(&number_at(b, &path)))
}

/// Compares the length of the sequence at `path`, absent being empty.
pub fn array_length<R: Record + 'static>(path: impl Into<FieldPath>) -> CompareFn<R> {
    let path = path.into();
    from_less_than(move |a: &R, b: &R| len_at(a, &path) < len_at(b, &path))
}

/// Builds a comparator from a derived key.
pub fn key<R, K, F>(key_fn: F) -> CompareFn<R>
where
    R: 'static,
    K: Ord,
    F: Fn(&R) -> K + Send + Sync + 'static,
{
    Arc::new(move |a, b| key_fn(a).cmp(&key_fn(b)))
}

/// Builds a comparator from a strict less-than predicate.
pub fn from_less_than<R, F>(less: F) -> CompareFn<R>
where
    R: 'static,
    F: Fn(&R, &R) -> bool + Send + Sync + 'static,
{
    Arc::new(move |a, b| {
        if less(a, b) {
            Ordering::Less
        } else if less(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

/// Inverts a comparator.
pub fn descending<R: 'static>(cmp: CompareFn<R>) -> CompareFn<R> {
    Arc::new(move |a, b| cmp(b, a))
}

/// Orders by `first`, breaking ties with `second`.
pub fn then<R: 'static>(first: CompareFn<R>, second: CompareFn<R>) -> CompareFn<R> {
    Arc::new(move |a, b| first(a, b).then_with(|| second(a, b)))
}

/// Sorts rows in place with a stable sort.
///
/// Rows comparing equal keep their relative input order.
pub fn sort_rows<R>(rows: &mut [R], cmp: &CompareFn<R>) {
    rows.sort_by(|a, b| cmp(a, b));
}

/// Locale-aware string ordering, using the root collation.
///
/// Base letters decide first, then accents, then case, with lowercase
/// first: `"apple" < "éclair" < "fig"` and `"alice" < "bob" < "Bob"`.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    match root_collator() {
        Some(collator) => collator.compare(a, b),
        None => case_fold_compare(a, b),
    }
}

fn root_collator() -> Option<&'static CollatorBorrowed<'static>> {
    static COLLATOR: OnceLock<Option<CollatorBorrowed<'static>>> = OnceLock::new();
    COLLATOR
        .get_or_init(|| {
            Collator::try_new(locale!("und").into(), Default::default())
                .inspect_err(|error| {
                    tracing::warn!(target: targets::GRID, %error, "root collator unavailable");
                })
                .ok()
        })
        .as_ref()
}

fn case_fold_compare(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| b.cmp(a))
}

/// Parses a timestamp value into milliseconds since the Unix epoch.
///
/// Accepts RFC 3339 strings, `YYYY-MM-DD HH:MM:SS[.f]` (also with a `T`
/// separator, read as UTC), bare dates and numeric epoch milliseconds.
pub fn timestamp_millis(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => parse_timestamp(s).unwrap_or(0),
        _ => 0,
    }
}

fn parse_timestamp(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

fn string_at<'a, R: Record>(row: &'a R, path: &FieldPath) -> &'a str {
    row.lookup(path).and_then(Value::as_str).unwrap_or("")
}

fn bool_at<R: Record>(row: &R, path: &FieldPath) -> bool {
    row.lookup(path).and_then(Value::as_bool).unwrap_or(false)
}

fn number_at<R: Record>(row: &R, path: &FieldPath) -> f64 {
    row.lookup(path).and_then(Value::as_f64).unwrap_or(0.0)
}

fn len_at<R: Record>(row: &R, path: &FieldPath) -> usize {
    row.lookup(path)
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}
