//! Usage diagnostics.
//!
//! Misuse never fails a render. It is reported as a `WARN` event under the
//! `autobind::diagnostics` target while [`config::diagnostics`] is enabled,
//! and execution continues.
//!
//! [`config::diagnostics`]: crate::config::diagnostics

use std::any::Any;

use crate::config::{self, Diagnostics};
use crate::props::Props;
use crate::value::Value;

fn enabled() -> bool {
    config::diagnostics() == Diagnostics::Enabled
}

/// A dependency argument that is neither a list nor absent.
pub(crate) fn invalid_deps(kind: &'static str) {
    if enabled() {
        tracing::warn!(
            target: "autobind::diagnostics",
            kind,
            "dependency argument must be a list or absent; recomputing on every render"
        );
    }
}

/// Warn when a bound value is a live cursor or directly holds one.
///
/// Only [`Value`] and [`Props`] results can carry cursors; other types are
/// ignored.
pub(crate) fn check_cursor<T: 'static>(value: &T) {
    if !enabled() {
        return;
    }
    let any = value as &dyn Any;
    let holds = if let Some(value) = any.downcast_ref::<Value>() {
        value.holds_cursor()
    } else if let Some(props) = any.downcast_ref::<Props>() {
        props.iter().any(|(_, v)| v.is_cursor())
    } else {
        false
    };
    if holds {
        tracing::warn!(
            target: "autobind::diagnostics",
            "reactive function returned a live cursor; its contents are not tracked, \
             fetch the documents inside the function instead"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Opaque;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn invalid_deps_warns() {
        config::set_diagnostics(Diagnostics::Enabled);
        invalid_deps("number");
        assert!(logs_contain("dependency argument must be a list"));
        assert!(logs_contain("number"));
    }

    #[test]
    #[traced_test]
    fn disabled_is_silent() {
        config::set_diagnostics(Diagnostics::Disabled);
        invalid_deps("string");
        check_cursor(&Value::from(Opaque::cursor(())));
        assert!(!logs_contain("dependency argument"));
        assert!(!logs_contain("live cursor"));
    }

    #[test]
    #[traced_test]
    fn cursor_in_map_warns() {
        config::set_diagnostics(Diagnostics::Enabled);
        check_cursor(&Value::map([("docs", Value::from(Opaque::cursor(())))]));
        assert!(logs_contain("live cursor"));
    }

    #[test]
    #[traced_test]
    fn cursor_in_props_warns() {
        config::set_diagnostics(Diagnostics::Enabled);
        check_cursor(&Props::new().with("docs", Opaque::cursor(())));
        assert!(logs_contain("live cursor"));
    }

    #[test]
    #[traced_test]
    fn plain_values_are_silent() {
        config::set_diagnostics(Diagnostics::Enabled);
        check_cursor(&Value::from("x"));
        check_cursor(&42_u32);
        assert!(!logs_contain("live cursor"));
    }
}
