#![forbid(unsafe_code)]

//! Component props: named [`Value`]s plus an optional forwarded ref.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::value::Value;

/// Mutable slot a component can publish into, compared by identity.
#[derive(Clone, Default)]
pub struct NodeRef(Rc<RefCell<Option<Value>>>);

impl NodeRef {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: Value) {
        *self.0.borrow_mut() = Some(value);
    }

    #[must_use]
    pub fn get(&self) -> Option<Value> {
        self.0.borrow().clone()
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.0.borrow()).finish()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    fields: BTreeMap<String, Value>,
    node_ref: Option<NodeRef>,
}

impl Props {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_ref(mut self, node_ref: NodeRef) -> Self {
        self.node_ref = Some(node_ref);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field as a string slice, if present and a string.
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Field as a number, if present and numeric.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    #[must_use]
    pub fn node_ref(&self) -> Option<&NodeRef> {
        self.node_ref.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `self` with every field of `extra` laid over it. The ref of `self`
    /// is kept.
    #[must_use]
    pub fn merged(&self, extra: Props) -> Props {
        let mut fields = self.fields.clone();
        fields.extend(extra.fields);
        Props {
            fields,
            node_ref: self.node_ref.clone(),
        }
    }

    /// Same keys, every field [`Value::same_value`], same ref.
    #[must_use]
    pub fn shallow_equal(&self, other: &Props) -> bool {
        self.node_ref == other.node_ref
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|(k, v)| other.fields.get(k).is_some_and(|o| v.same_value(o)))
    }

    /// The fields as a map value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::from(self.fields.clone())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            node_ref: None,
        }
    }
}
