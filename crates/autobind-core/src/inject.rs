#![forbid(unsafe_code)]

//! Props injection: wrap a component so that props derived from reactive
//! data are merged into its own props on every render.
//!
//! ```text
//! make_injector(binder) ─config(InjectConfig)─▶ Enhancer ─wrap(inner)─▶ WithTracker
//! ```
//!
//! The binder decides how derivation is tracked: [`TrackerBinder`] keeps a
//! controlled binding per instance, [`StaticBinder`] derives once per render
//! without tracking.

use std::fmt;
use std::rc::Rc;

use crate::binding::use_controlled_tracker;
use crate::deps::DepList;
use crate::engine::ReactiveEngine;
use crate::error::Result;
use crate::handle::TrackerHandle;
use crate::host::{Component, RenderContext};
use crate::options::TrackerOptions;
use crate::props::Props;

pub type DeriveFn = Rc<dyn Fn(&Props) -> Option<Props>>;
pub type DeriveWithHandleFn = Rc<dyn Fn(&Props, &TrackerHandle) -> Option<Props>>;

/// How a wrapper derives its extra props.
#[derive(Clone)]
pub enum InjectConfig {
    /// A bare derivation; `pure` and unconditional recomputation apply.
    Derive(DeriveFn),
    Options {
        derive: DeriveWithHandleFn,
        /// Skip parent-driven re-renders when props are shallow-equal.
        pure: bool,
        deps: DepList,
    },
}

impl InjectConfig {
    pub fn derive(f: impl Fn(&Props) -> Option<Props> + 'static) -> Self {
        Self::Derive(Rc::new(f))
    }

    /// A derivation that also receives the binding's handle.
    pub fn with_handle(f: impl Fn(&Props, &TrackerHandle) -> Option<Props> + 'static) -> Self {
        Self::Options {
            derive: Rc::new(f),
            pure: true,
            deps: DepList::Unconditional,
        }
    }

    #[must_use]
    pub fn pure(self, pure: bool) -> Self {
        let InjectOptions { derive, deps, .. } = self.normalize();
        Self::Options { derive, pure, deps }
    }

    #[must_use]
    pub fn deps(self, deps: impl Into<DepList>) -> Self {
        let InjectOptions { derive, pure, .. } = self.normalize();
        Self::Options {
            derive,
            pure,
            deps: deps.into(),
        }
    }

    /// Collapse either form into one shape.
    #[must_use]
    pub fn normalize(self) -> InjectOptions {
        match self {
            Self::Derive(derive) => InjectOptions {
                derive: Rc::new(move |props: &Props, _: &TrackerHandle| derive(props)),
                pure: true,
                deps: DepList::Unconditional,
            },
            Self::Options { derive, pure, deps } => InjectOptions { derive, pure, deps },
        }
    }
}

impl fmt::Debug for InjectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Derive(_) => f.write_str("InjectConfig::Derive"),
            Self::Options { pure, deps, .. } => f
                .debug_struct("InjectConfig::Options")
                .field("pure", pure)
                .field("deps", deps)
                .finish(),
        }
    }
}

/// Normalized [`InjectConfig`].
#[derive(Clone)]
pub struct InjectOptions {
    pub derive: DeriveWithHandleFn,
    pub pure: bool,
    pub deps: DepList,
}

impl fmt::Debug for InjectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectOptions")
            .field("pure", &self.pure)
            .field("deps", &self.deps)
            .finish()
    }
}

/// Produces the extra props for one render.
pub trait Binder<Cx: RenderContext>: Clone + 'static {
    /// # Errors
    ///
    /// Whatever the underlying binding reports.
    fn bind(
        &self,
        cx: &mut Cx,
        derive: Rc<dyn Fn(&TrackerHandle) -> Props>,
        deps: DepList,
    ) -> Result<Props>;
}

/// Tracks the derivation with a controlled binding per instance.
#[derive(Debug, Clone)]
pub struct TrackerBinder<E> {
    engine: E,
}

impl<E: ReactiveEngine> TrackerBinder<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }
}

impl<Cx: RenderContext, E: ReactiveEngine> Binder<Cx> for TrackerBinder<E> {
    fn bind(
        &self,
        cx: &mut Cx,
        derive: Rc<dyn Fn(&TrackerHandle) -> Props>,
        deps: DepList,
    ) -> Result<Props> {
        use_controlled_tracker(
            cx,
            &self.engine,
            move |handle| derive(handle),
            deps,
            TrackerOptions::new(),
        )
        .map(|(props, _)| props)
    }
}

/// Derives once per render with no tracking, for one-shot rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticBinder;

impl<Cx: RenderContext> Binder<Cx> for StaticBinder {
    fn bind(
        &self,
        _cx: &mut Cx,
        derive: Rc<dyn Fn(&TrackerHandle) -> Props>,
        _deps: DepList,
    ) -> Result<Props> {
        Ok(derive(&TrackerHandle::detached()))
    }
}

#[derive(Debug, Clone)]
pub struct Injector<B> {
    binder: B,
}

#[must_use]
pub fn make_injector<B>(binder: B) -> Injector<B> {
    Injector { binder }
}

impl<B: Clone> Injector<B> {
    #[must_use]
    pub fn config(&self, config: InjectConfig) -> Enhancer<B> {
        Enhancer {
            binder: self.binder.clone(),
            options: config.normalize(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Enhancer<B> {
    binder: B,
    options: InjectOptions,
}

impl<B: Clone> Enhancer<B> {
    #[must_use]
    pub fn wrap<C>(&self, inner: C) -> WithTracker<B, C> {
        WithTracker {
            binder: self.binder.clone(),
            options: self.options.clone(),
            inner,
        }
    }
}

/// Shorthand for `make_injector(TrackerBinder::new(engine)).config(config)`.
#[must_use]
pub fn with_tracker<E: ReactiveEngine>(engine: E, config: InjectConfig) -> Enhancer<TrackerBinder<E>> {
    make_injector(TrackerBinder::new(engine)).config(config)
}

/// A component whose props are extended with derived props before render.
#[derive(Debug, Clone)]
pub struct WithTracker<B, C> {
    binder: B,
    options: InjectOptions,
    inner: C,
}

impl<B, C> WithTracker<B, C> {
    #[must_use]
    pub fn inner(&self) -> &C {
        &self.inner
    }

    #[must_use]
    pub fn options(&self) -> &InjectOptions {
        &self.options
    }
}

impl<Cx, B, C> Component<Cx> for WithTracker<B, C>
where
    Cx: RenderContext,
    B: Binder<Cx>,
    C: Component<Cx>,
{
    fn render(&self, cx: &mut Cx, props: &Props) -> Result<Cx::Node> {
        let derive = Rc::clone(&self.options.derive);
        let own = props.clone();
        let extra = self.binder.bind(
            cx,
            Rc::new(move |handle: &TrackerHandle| derive(&own, handle).unwrap_or_default()),
            self.options.deps.clone(),
        )?;
        self.inner.render(cx, &props.merged(extra))
    }

    fn props_unchanged(&self, prev: &Props, next: &Props) -> bool {
        self.options.pure && prev.shallow_equal(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn derive_normalizes_to_pure_unconditional() {
        let options = InjectConfig::derive(|_| None).normalize();
        assert!(options.pure);
        assert!(matches!(options.deps, DepList::Unconditional));
    }

    #[test]
    fn builders_convert_derive_form() {
        let options = InjectConfig::derive(|p| Some(p.clone()))
            .pure(false)
            .deps(vec![Value::from(1)])
            .normalize();
        assert!(!options.pure);
        assert_eq!(options.deps.as_slice().map(<[_]>::len), Some(1));
        let out = (options.derive)(&Props::new().with("a", 1), &TrackerHandle::detached());
        assert_eq!(out.and_then(|p| p.number("a")), Some(1.0));
    }

    #[test]
    fn with_handle_defaults() {
        let options = InjectConfig::with_handle(|_, h| {
            Some(Props::new().with("detached", h.is_detached()))
        })
        .normalize();
        assert!(options.pure);
        let out = (options.derive)(&Props::new(), &TrackerHandle::detached());
        assert_eq!(
            out.and_then(|p| p.get("detached").and_then(Value::as_bool)),
            Some(true)
        );
    }
}
