//! Run test examples inside an event loop.
//!
//! See [`example`] for the lifecycle and the [`EventedRunner`] contract that
//! event loop adapters implement.

pub mod body;
pub mod config;
pub mod error;
pub mod example;
pub mod hook;
pub mod outcome;

pub use body::{ExampleBody, ExampleResult};
pub use config::{ExampleConfig, ExampleOptions};
pub use error::{ConfigError, ExampleError};
pub use example::{Deferred, EventedExample, EventedRunner, ExampleState};
pub use hook::{ExampleGroup, Hook, HookRegistry, HookType};
pub use outcome::{ExampleOutcome, ExampleStatus, run_example};
