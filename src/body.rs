use std::fmt::{self, Debug};

/// The result of an example body or a hook.
///
/// Bodies and hooks may return `()` or any `Result<(), E>` where `E: Debug`.
/// Errors are rendered with `{:#?}` so that they can be stored and reported
/// without keeping the original error type around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleResult(pub Result<(), String>);

impl From<()> for ExampleResult {
    fn from(_: ()) -> Self {
        Self(Ok(()))
    }
}

impl<E: Debug> From<Result<(), E>> for ExampleResult {
    fn from(v: Result<(), E>) -> Self {
        ExampleResult(v.map_err(|e| format!("{e:#?}")))
    }
}

/// The test code of a single example.
///
/// A body is consumed when it is invoked, so it runs at most once.
pub struct ExampleBody(Box<dyn FnOnce() -> ExampleResult>);

impl Debug for ExampleBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExampleBody(...)")
    }
}

impl ExampleBody {
    pub fn new<F, T>(f: F) -> Self
    where
        F: FnOnce() -> T + 'static,
        T: Into<ExampleResult>,
    {
        Self(Box::new(move || f().into()))
    }

    pub fn call(self) -> ExampleResult {
        (self.0)()
    }
}

impl Default for ExampleBody {
    fn default() -> Self {
        Self::new(|| ())
    }
}
