#![forbid(unsafe_code)]

//! Dependency lists: when a binding throws away its computation.
//!
//! A [`DepList`] is either a list of comparison keys or
//! [`DepList::Unconditional`], which never compares equal to anything and so
//! recreates the computation on every render. A non-list argument coming
//! from dynamic input is kept as [`DepList::Invalid`]; it behaves like
//! `Unconditional` and is reported as a usage diagnostic.
//!
//! # Example
//!
//! ```
//! use autobind_core::deps::{DepList, are_deps_equal};
//! use autobind_core::deps;
//!
//! let prev = deps![0, "a"];
//! assert!(are_deps_equal(&deps![0, "a"], Some(&prev)));
//! assert!(!are_deps_equal(&deps![1, "a"], Some(&prev)));
//! assert!(!are_deps_equal(&DepList::Unconditional, Some(&prev)));
//! ```

use crate::value::Value;

#[derive(Clone, Debug, Default)]
pub enum DepList {
    /// No list: recompute on every render.
    #[default]
    Unconditional,
    /// A non-list argument, named by its kind.
    Invalid(&'static str),
    List(Vec<Value>),
}

impl DepList {
    /// The empty list: never changes, so the computation is created once.
    #[must_use]
    pub fn empty() -> Self {
        Self::List(Vec::new())
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    #[must_use]
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Kind of the rejected argument, for [`DepList::Invalid`].
    #[must_use]
    pub fn invalid_kind(&self) -> Option<&'static str> {
        match self {
            Self::Invalid(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl From<Vec<Value>> for DepList {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

impl<const N: usize> From<[Value; N]> for DepList {
    fn from(values: [Value; N]) -> Self {
        Self::List(values.into())
    }
}

impl From<Option<Vec<Value>>> for DepList {
    fn from(values: Option<Vec<Value>>) -> Self {
        values.map_or(Self::Unconditional, Self::List)
    }
}

/// Interpret a dynamic value as a dependency argument.
///
/// Lists become lists, `null`/`undefined` mean "no list", anything else is
/// [`DepList::Invalid`].
impl From<Value> for DepList {
    fn from(value: Value) -> Self {
        match value {
            Value::List(items) => Self::List(items.to_vec()),
            Value::Undefined | Value::Null => Self::Unconditional,
            other => Self::Invalid(other.kind()),
        }
    }
}

/// Compare `next` against the list from the previous render.
///
/// Returns `false` when either side is not a list, when the lengths differ,
/// or when any position differs under [`Value::shallow_equal`].
#[must_use]
pub fn are_deps_equal(next: &DepList, prev: Option<&DepList>) -> bool {
    are_deps_equal_by(next, prev, Value::shallow_equal)
}

/// [`are_deps_equal`] with a caller-supplied per-position equality.
pub fn are_deps_equal_by(
    next: &DepList,
    prev: Option<&DepList>,
    eq: impl Fn(&Value, &Value) -> bool,
) -> bool {
    let Some(prev) = prev.and_then(DepList::as_slice) else {
        return false;
    };
    let Some(next) = next.as_slice() else {
        return false;
    };
    next.len() == prev.len() && next.iter().zip(prev).all(|(a, b)| eq(a, b))
}

/// Build a [`DepList::List`] from expressions convertible into [`Value`].
#[macro_export]
macro_rules! deps {
    () => {
        $crate::deps::DepList::empty()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::deps::DepList::List(vec![$($crate::value::Value::from($value)),+])
    };
}
