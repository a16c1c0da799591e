//! Lifecycle hooks.
//!
//! Hooks are registered per group type in a [`HookRegistry`] and evaluated by
//! the runner around the example body. A hook does not run "inside" the
//! group. It receives the group instance as an explicit `&mut` argument
//! instead, so it can prepare or inspect the group's state.
//!
//! Groups expose their registry through [`ExampleGroup`]. Registries are
//! usually built once and shared, for example from a
//! [`LazyLock`](std::sync::LazyLock) static, which is why they are handed out
//! behind an [`Arc`].

use std::{
    collections::HashMap,
    fmt::{self, Debug, Display},
    sync::Arc,
};

use crate::body::ExampleResult;

/// The lifecycle phase a hook is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookType {
    /// Runs inside the event loop, before the example body.
    Before,

    /// Runs inside the event loop, after the example signaled completion.
    After,
}

impl Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookType::Before => write!(f, "before"),
            HookType::After => write!(f, "after"),
        }
    }
}

/// A hook callable for groups of type `G`.
pub trait HookFn<G> {
    fn call_hook(&self, group: &mut G) -> ExampleResult;
}

impl<G, F, T> HookFn<G> for F
where
    F: Fn(&mut G) -> T,
    T: Into<ExampleResult>,
{
    fn call_hook(&self, group: &mut G) -> ExampleResult {
        (self)(group).into()
    }
}

#[non_exhaustive]
pub enum Hook<G> {
    Ptr(fn(&mut G) -> ExampleResult),
    Owned(Box<dyn HookFn<G> + Send + Sync>),
}

impl<G> Debug for Hook<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ptr(ptr) => f.debug_tuple("Ptr").field(ptr).finish(),
            Self::Owned(_) => write!(f, "Owned(...)"),
        }
    }
}

impl<G> Hook<G> {
    pub const fn from_const_fn(f: fn(&mut G) -> ExampleResult) -> Self {
        Self::Ptr(f)
    }

    pub fn from_boxed<F, T>(f: F) -> Self
    where
        F: Fn(&mut G) -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        Self::Owned(Box::new(f))
    }

    pub fn call(&self, group: &mut G) -> ExampleResult {
        match self {
            Self::Ptr(f) => f(group),
            Self::Owned(f) => f.call_hook(group),
        }
    }
}

/// Hooks of one group type, kept in registration order per [`HookType`].
pub struct HookRegistry<G> {
    hooks: HashMap<HookType, Vec<Hook<G>>>,
}

impl<G> Default for HookRegistry<G> {
    fn default() -> Self {
        Self {
            hooks: HashMap::new(),
        }
    }
}

impl<G> Debug for HookRegistry<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("before", &self.len(HookType::Before))
            .field("after", &self.len(HookType::After))
            .finish()
    }
}

impl<G> HookRegistry<G> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook_type: HookType, hook: Hook<G>) {
        self.hooks.entry(hook_type).or_default().push(hook);
    }

    pub fn with_hook<F, T>(mut self, hook_type: HookType, f: F) -> Self
    where
        F: Fn(&mut G) -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.register(hook_type, Hook::from_boxed(f));
        self
    }

    pub fn before<F, T>(self, f: F) -> Self
    where
        F: Fn(&mut G) -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.with_hook(HookType::Before, f)
    }

    pub fn after<F, T>(self, f: F) -> Self
    where
        F: Fn(&mut G) -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.with_hook(HookType::After, f)
    }

    /// Hooks registered for `hook_type`, in registration order.
    pub fn hooks_for(&self, hook_type: HookType) -> impl ExactSizeIterator<Item = &Hook<G>> {
        self.hooks
            .get(&hook_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
    }

    pub fn len(&self, hook_type: HookType) -> usize {
        self.hooks.get(&hook_type).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.values().all(Vec::is_empty)
    }
}

/// The enclosing test group of an example.
///
/// Implementors own their hook registrations. The runner only reads them.
pub trait ExampleGroup: Sized {
    fn hooks(&self) -> Arc<HookRegistry<Self>>;
}
