#![forbid(unsafe_code)]

//! Dynamic values used as dependency keys and prop values.
//!
//! Two comparisons are defined:
//!
//! - [`Value::same_value`]: identity-style equality. Scalars compare by
//!   value with `NaN == NaN` and `+0 != -0`; lists, maps and opaque handles
//!   compare by allocation identity.
//! - [`Value::shallow_equal`]: `same_value`, or, for two lists or two maps,
//!   equal length/key sets with every element compared by `same_value`.
//!   One level only.
//!
//! `PartialEq` is structural (deep) and uses `same_value` rules for numbers
//! and opaque handles, so it stays usable as a default change check for
//! derived values.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// What an [`Opaque`] value stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpaqueKind {
    /// Any external object compared by identity.
    Handle,
    /// A live query cursor. Its contents are not reactive by themselves.
    Cursor,
}

/// External object carried by identity.
#[derive(Clone)]
pub struct Opaque {
    kind: OpaqueKind,
    inner: Rc<dyn Any>,
}

impl Opaque {
    pub fn handle<T: 'static>(value: T) -> Self {
        Self {
            kind: OpaqueKind::Handle,
            inner: Rc::new(value),
        }
    }

    pub fn cursor<T: 'static>(value: T) -> Self {
        Self {
            kind: OpaqueKind::Cursor,
            inner: Rc::new(value),
        }
    }

    #[must_use]
    pub fn kind(&self) -> OpaqueKind {
        self.kind
    }

    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opaque").field("kind", &self.kind).finish()
    }
}

#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    List(Rc<[Value]>),
    Map(Rc<BTreeMap<String, Value>>),
    Opaque(Opaque),
}

fn same_number(x: f64, y: f64) -> bool {
    if x.is_nan() && y.is_nan() {
        return true;
    }
    // Bitwise: distinguishes +0 from -0, and equal finite values share bits.
    x.to_bits() == y.to_bits()
}

impl Value {
    /// Build a map value from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(Rc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Build a list value.
    pub fn list<V: Into<Value>, I: IntoIterator<Item = V>>(items: I) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Number from an integer, or `None` when it has no exact `f64` form.
    #[must_use]
    pub fn exact_int(n: i64) -> Option<Self> {
        (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER)
            .contains(&n)
            .then(|| Self::Number(n as f64))
    }

    /// Identity-style equality.
    #[must_use]
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => same_number(*a, *b),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => Rc::ptr_eq(a, b),
            (Self::Opaque(a), Self::Opaque(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// One level of element/key comparison on top of [`same_value`](Self::same_value).
    #[must_use]
    pub fn shallow_equal(&self, other: &Self) -> bool {
        if self.same_value(other) {
            return true;
        }
        match (self, other) {
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.same_value(y))
            }
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, x)| b.get(key).is_some_and(|y| x.same_value(y)))
            }
            _ => false,
        }
    }

    /// Short type name, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Opaque(_) => "opaque",
        }
    }

    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    #[must_use]
    pub fn is_cursor(&self) -> bool {
        matches!(self, Self::Opaque(o) if o.kind() == OpaqueKind::Cursor)
    }

    /// A cursor itself, or a map holding a cursor directly under some key.
    #[must_use]
    pub fn holds_cursor(&self) -> bool {
        match self {
            Self::Map(entries) => entries.values().any(Value::is_cursor),
            other => other.is_cursor(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(&**s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Look up `key` in a map value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(entries) => entries.get(key),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b)) => {
                Rc::ptr_eq(a, b) || (a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y))
            }
            (Self::Map(a), Self::Map(b)) => Rc::ptr_eq(a, b) || a == b,
            _ => self.same_value(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(_) => f.write_str("[map]"),
            Self::Opaque(o) => write!(f, "[{:?}]", o.kind()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

/// Largest integer below which every integer is an exact `f64` (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Lossy above [`MAX_SAFE_INTEGER`] in magnitude: distinct large integers may
/// round to the same number. Use [`Value::exact_int`] for keys that can be
/// that large.
impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

/// Lossy above [`MAX_SAFE_INTEGER`], like `From<i64>`.
impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(Rc::from(items))
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self::Map(Rc::new(entries))
    }
}

impl From<Opaque> for Value {
    fn from(o: Opaque) -> Self {
        Self::Opaque(o)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_same_as_nan() {
        assert!(Value::from(f64::NAN).same_value(&Value::from(f64::NAN)));
        assert_eq!(Value::from(f64::NAN), Value::from(f64::NAN));
    }

    #[test]
    fn exact_int_rejects_unrepresentable_keys() {
        assert_eq!(
            Value::exact_int(MAX_SAFE_INTEGER).and_then(|v| v.as_f64()),
            Some(9_007_199_254_740_991.0)
        );
        assert_eq!(
            Value::exact_int(-MAX_SAFE_INTEGER).and_then(|v| v.as_f64()),
            Some(-9_007_199_254_740_991.0)
        );
        assert_eq!(Value::exact_int(MAX_SAFE_INTEGER + 1), None);
        assert_eq!(Value::exact_int(i64::MIN), None);
        // The lossy conversion collapses neighbours past the limit.
        assert_eq!(Value::from(MAX_SAFE_INTEGER + 1), Value::from(MAX_SAFE_INTEGER + 2));
    }

    #[test]
    fn signed_zeros_differ() {
        assert!(!Value::from(0.0).same_value(&Value::from(-0.0)));
        assert!(Value::from(0.0).same_value(&Value::from(0.0)));
    }

    #[test]
    fn containers_compare_by_identity() {
        let a = Value::list([1, 2]);
        let b = Value::list([1, 2]);
        assert!(!a.same_value(&b));
        assert!(a.same_value(&a.clone()));
        assert!(a.shallow_equal(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn shallow_equal_is_one_level() {
        let inner_a = Value::list([1]);
        let inner_b = Value::list([1]);
        let a = Value::map([("k", inner_a.clone())]);
        let b = Value::map([("k", inner_b)]);
        let c = Value::map([("k", inner_a)]);
        assert!(!a.shallow_equal(&b));
        assert!(a.shallow_equal(&c));
        // Deep equality still sees them as equal.
        assert_eq!(a, b);
    }

    #[test]
    fn shallow_equal_checks_key_sets() {
        let a = Value::map([("x", 1), ("y", 2)]);
        let b = Value::map([("x", 1), ("z", 2)]);
        assert!(!a.shallow_equal(&b));
    }

    #[test]
    fn strings_compare_by_content() {
        assert!(Value::from("aaa").same_value(&Value::from(String::from("aaa"))));
    }

    #[test]
    fn opaque_identity() {
        let cursor = Opaque::cursor(vec![1, 2, 3]);
        let a = Value::from(cursor.clone());
        let b = Value::from(cursor);
        let c = Value::from(Opaque::cursor(vec![1, 2, 3]));
        assert!(a.same_value(&b));
        assert!(!a.same_value(&c));
        assert!(a.is_cursor());
    }

    #[test]
    fn holds_cursor_looks_one_level_into_maps() {
        let direct = Value::map([("docs", Value::from(Opaque::cursor(())))]);
        let nested = Value::map([("outer", direct.clone())]);
        assert!(direct.holds_cursor());
        assert!(!nested.holds_cursor());
        assert!(!Value::from(Opaque::handle(())).holds_cursor());
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::from("aaa").to_string(), "aaa");
        assert_eq!(Value::list([1, 2]).to_string(), "[1,2]");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
