//! Filter predicates shared by server queries and in-memory filtering.
//!
//! A [`FilterPredicate`] is a `(field, operator, value)` triple. A list of
//! predicates is a conjunction: [`matches`] is true only when every
//! predicate holds. The same list renders into the service's `filter`
//! query parameter with [`render`].
//!
//! # Wire Format
//!
//! Predicates render as `field` + `operator` + `value` with no escaping,
//! joined by `;`. The operator characters double as separators on the
//! server side, so the rendering is kept byte-for-byte.
//!
//! ```rust
//! use moysklad_api::rest::{render, FilterOperator, FilterPredicate};
//!
//! let filters = vec![
//!     FilterPredicate::new("sum", FilterOperator::Gt, "100"),
//!     FilterPredicate::new("sum", FilterOperator::Lt, "200"),
//! ];
//! assert_eq!(render(&filters), "sum>100;sum<200");
//! ```
//!
//! # In-Memory Semantics
//!
//! - Equality is loose: if both sides read as numbers they compare
//!   numerically (`"100"` equals `100.0`), otherwise their text forms are
//!   compared (booleans read as `true`/`false`).
//! - Ordering puts the predicate value on the left: `sum<200` keeps a
//!   record when `200 < record.sum`. Both sides compare numerically when
//!   numeric, else lexicographically.
//! - `~`, `~=` and `=~` test substring, prefix and suffix.
//! - A missing or `null` field satisfies only `!=`.
//!
//! ```rust
//! use moysklad_api::rest::{matches, FilterOperator, FilterPredicate};
//! use serde_json::json;
//!
//! let order = json!({"sum": 150});
//! assert!(matches(&order, &[FilterPredicate::new("sum", FilterOperator::Lt, 100)]));
//! assert!(!matches(&order, &[FilterPredicate::new("sum", FilterOperator::Lt, 200)]));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::rest::errors::ResourceError;

/// Date-time layout used by the service in filters and payloads.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Comparison operators understood by the service's filter syntax.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `~`, partial match.
    Contains,
    /// `~=`, match at the start.
    StartsWith,
    /// `=~`, match at the end.
    EndsWith,
}

impl FilterOperator {
    /// Returns the operator as written on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Contains => "~",
            Self::StartsWith => "~=",
            Self::EndsWith => "=~",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            "<" => Ok(Self::Lt),
            ">" => Ok(Self::Gt),
            "<=" => Ok(Self::Le),
            ">=" => Ok(Self::Ge),
            "~" => Ok(Self::Contains),
            "~=" => Ok(Self::StartsWith),
            "=~" => Ok(Self::EndsWith),
            other => Err(ResourceError::not_supported(format!(
                "unknown filter operator '{other}'"
            ))),
        }
    }
}

/// The right-hand side of a predicate.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    /// A text value, rendered as is.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A floating point value.
    Float(f64),
    /// A boolean, rendered as `true`/`false`.
    Bool(bool),
    /// A moment, rendered as `YYYY-MM-DD HH:MM:SS`.
    DateTime(NaiveDateTime),
}

impl FilterValue {
    fn as_number(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(s) => parse_number(s),
            Self::Bool(_) | Self::DateTime(_) => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for FilterValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDateTime> for FilterValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

/// A single `(field, operator, value)` condition.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterPredicate {
    /// The field the condition reads.
    pub field: String,
    /// How the field is compared.
    pub operator: FilterOperator,
    /// What the field is compared against.
    pub value: FilterValue,
}

impl FilterPredicate {
    /// Creates a predicate.
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Creates a predicate from an operator written as text.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotSupported`] for an unknown operator.
    pub fn parse(
        field: impl Into<String>,
        operator: &str,
        value: impl Into<FilterValue>,
    ) -> Result<Self, ResourceError> {
        Ok(Self::new(field, operator.parse()?, value))
    }

    /// Evaluates this predicate against one record.
    #[must_use]
    pub fn is_satisfied_by<R: Record + ?Sized>(&self, record: &R) -> bool {
        let lhs = match record.filter_value(&self.field) {
            None | Some(Value::Null) => return self.operator == FilterOperator::Ne,
            Some(value) => value,
        };

        match self.operator {
            FilterOperator::Eq => loosely_equal(&lhs, &self.value),
            FilterOperator::Ne => !loosely_equal(&lhs, &self.value),
            // Ordering reads `value OP record[field]`.
            FilterOperator::Lt => compare(&lhs, &self.value) == Ordering::Greater,
            FilterOperator::Gt => compare(&lhs, &self.value) == Ordering::Less,
            FilterOperator::Le => compare(&lhs, &self.value) != Ordering::Less,
            FilterOperator::Ge => compare(&lhs, &self.value) != Ordering::Greater,
            FilterOperator::Contains => text_of(&lhs).contains(&self.value.to_string()),
            FilterOperator::StartsWith => text_of(&lhs).starts_with(&self.value.to_string()),
            FilterOperator::EndsWith => text_of(&lhs).ends_with(&self.value.to_string()),
        }
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, self.operator, self.value)
    }
}

/// Anything predicates can be evaluated against.
///
/// Implemented for [`Entity`](crate::rest::Entity),
/// [`FieldValue`](crate::rest::FieldValue) and `serde_json::Value`.
pub trait Record {
    /// Returns the plain JSON value of `field`, or `None` if absent.
    fn filter_value(&self, field: &str) -> Option<Value>;
}

impl Record for Value {
    fn filter_value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn filter_value(&self, field: &str) -> Option<Value> {
        (**self).filter_value(field)
    }
}

/// Returns `true` if every predicate holds for `record`.
///
/// An empty predicate list always matches.
#[must_use]
pub fn matches<R: Record + ?Sized>(record: &R, predicates: &[FilterPredicate]) -> bool {
    predicates.iter().all(|p| p.is_satisfied_by(record))
}

/// Renders predicates into the `filter` query parameter value.
#[must_use]
pub fn render(predicates: &[FilterPredicate]) -> String {
    predicates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// Keeps the records that match every predicate, in their original order.
#[must_use]
pub fn filter_list<R: Record>(
    list: impl IntoIterator<Item = R>,
    predicates: &[FilterPredicate],
) -> Vec<R> {
    list.into_iter()
        .filter(|record| matches(record, predicates))
        .collect()
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[allow(clippy::float_cmp)]
fn loosely_equal(lhs: &Value, rhs: &FilterValue) -> bool {
    match (number_of(lhs), rhs.as_number()) {
        (Some(a), Some(b)) => a == b,
        _ => text_of(lhs) == rhs.to_string(),
    }
}

fn compare(lhs: &Value, rhs: &FilterValue) -> Ordering {
    match (number_of(lhs), rhs.as_number()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => text_of(lhs).as_str().cmp(rhs.to_string().as_str()),
    }
}
