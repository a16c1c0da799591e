//! Errors produced while running evented examples.

use std::{any::Any, time::Duration};

use thiserror::Error;

use crate::{example::ExampleState, hook::HookType};

/// Everything that can go wrong during the lifecycle of a single example.
///
/// The error is cloneable and comparable so that a captured failure can be
/// stored by an adapter and later surfaced unchanged by
/// [`finish_example`](crate::example::EventedExample::finish_example).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ExampleError {
    /// A lifecycle operation was invoked on a runner that does not implement it.
    #[error("`{operation}` is not supported by {runner}, use an event loop adapter")]
    NotSupported {
        operation: &'static str,
        runner: &'static str,
    },

    /// A lifecycle hook failed.
    #[error("{hook_type} hook #{index} failed: {message}")]
    Hook {
        hook_type: HookType,
        index: usize,
        message: String,
    },

    /// The example body failed.
    #[error("example failed: {message}")]
    Failed { message: String },

    /// The example body panicked.
    #[error("example panicked: {message}")]
    Panicked { message: String },

    /// The armed timer expired before the example signaled completion.
    #[error("example timed out after {after:?}")]
    TimedOut { after: Duration },

    /// A lifecycle step was taken in a state that does not allow it.
    #[error("illegal state transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: ExampleState,
        to: ExampleState,
    },
}

impl ExampleError {
    pub fn not_supported<R: ?Sized>(operation: &'static str) -> Self {
        Self::NotSupported {
            operation,
            runner: std::any::type_name::<R>(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Convert a panic payload into a [`Panicked`](Self::Panicked) error.
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        Self::Panicked {
            message: panic_message(payload),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Render a panic payload as a message.
///
/// This matches the common payload types produced by `panic!` (`&'static str` and `String`).
/// Other payload types are formatted as a generic placeholder.
pub(crate) fn panic_message(payload: Box<dyn Any + Send + 'static>) -> String {
    payload
        .downcast::<&'static str>()
        .map(|s| s.to_string())
        .or_else(|payload| payload.downcast::<String>().map(|s| *s))
        .unwrap_or_else(|_| String::from("Box<dyn Any>"))
}

/// An error raised while resolving example options into a configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid spec_timeout `{value}`: expected a positive number of seconds")]
    InvalidTimeout { value: f64 },

    #[error("failed to parse example options")]
    Parse(#[from] toml::de::Error),
}
