//! Examples that run inside an event loop.
//!
//! An evented example cannot simply call its body and return: the body
//! typically starts asynchronous work, and the example only completes once
//! that work calls back. Running such an example therefore needs an event
//! loop, and every event loop schedules timers and stops differently.
//!
//! This module splits that into two pieces:
//!
//! - [`EventedExample`] holds what every example has in common: its
//!   configuration, the borrowed group, the body, the captured failure and
//!   the lifecycle state.
//! - [`EventedRunner`] is the contract an event loop adapter implements:
//!   [`run`](EventedRunner::run), [`timeout`](EventedRunner::timeout),
//!   [`done`](EventedRunner::done) and [`delayed`](EventedRunner::delayed).
//!
//! An adapter embeds an [`EventedExample`] and drives it roughly like this:
//!
//! 1. [`begin`](EventedExample::begin) the example and arm the
//!    [`timeout`](EventedRunner::timeout),
//! 2. run the [`Before`](HookType::Before) hooks and the body,
//! 3. [`suspend`](EventedExample::suspend) and let the loop run until
//!    [`done`](EventedRunner::done) stops it or the timer fires,
//! 4. run the [`After`](HookType::After) hooks and
//!    [`finish_example`](EventedRunner::finish_example).
//!
//! [`EventedExample`] itself also implements [`EventedRunner`], but refuses
//! every loop operation with [`ExampleError::NotSupported`].

use std::{
    panic::{self, AssertUnwindSafe},
    time::Duration,
};

use tracing::{debug, trace, warn};

use crate::{
    body::{ExampleBody, ExampleResult},
    config::ExampleConfig,
    error::{ExampleError, panic_message},
    hook::{ExampleGroup, HookType},
};

/// The lifecycle state of an example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExampleState {
    #[default]
    Created,
    Running,
    AwaitingCompletion,
    TimedOut,
    Failed,
    Finished,
}

impl ExampleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExampleState::Finished)
    }
}

/// A callback scheduled on a runner, invoked with the runner itself.
pub type Deferred<R> = Box<dyn FnOnce(&mut R)>;

/// State shared by every evented example, independent of the event loop.
#[derive(Debug)]
pub struct EventedExample<'g, G> {
    config: ExampleConfig,
    group: &'g mut G,
    body: Option<ExampleBody>,
    failure: Option<ExampleError>,
    state: ExampleState,
}

impl<'g, G: ExampleGroup> EventedExample<'g, G> {
    pub fn new(config: ExampleConfig, group: &'g mut G, body: ExampleBody) -> Self {
        Self {
            config,
            group,
            body: Some(body),
            failure: None,
            state: ExampleState::Created,
        }
    }

    pub fn config(&self) -> &ExampleConfig {
        &self.config
    }

    pub fn group(&self) -> &G {
        &*self.group
    }

    pub fn group_mut(&mut self) -> &mut G {
        &mut *self.group
    }

    pub fn state(&self) -> ExampleState {
        self.state
    }

    /// The failure captured so far, if any.
    pub fn failure(&self) -> Option<&ExampleError> {
        self.failure.as_ref()
    }

    fn transition(&mut self, to: ExampleState) -> Result<(), ExampleError> {
        use ExampleState::*;

        let from = self.state;
        let allowed = match (from, to) {
            (Created, Running) => true,
            (Running, AwaitingCompletion) => true,
            (Created | Running | AwaitingCompletion, TimedOut | Failed) => true,
            (Created | Running | AwaitingCompletion | TimedOut | Failed, Finished) => true,
            _ => false,
        };
        if !allowed {
            return Err(ExampleError::IllegalTransition { from, to });
        }

        trace!(?from, ?to, "example state transition");
        self.state = to;
        Ok(())
    }

    /// Mark the example as running. Adapters call this first in `run`.
    pub fn begin(&mut self) -> Result<(), ExampleError> {
        self.transition(ExampleState::Running)
    }

    /// Mark the example as waiting for the event loop to call back.
    pub fn suspend(&mut self) -> Result<(), ExampleError> {
        self.transition(ExampleState::AwaitingCompletion)
    }

    /// Run all hooks of `hook_type` registered for the group, in registration order.
    ///
    /// Every hook receives the group instance. The first failing or panicking
    /// hook aborts the remaining ones and its error is returned.
    pub fn run_hooks(&mut self, hook_type: HookType) -> Result<(), ExampleError> {
        let registry = self.group.hooks();
        let hooks = registry.hooks_for(hook_type);
        debug!(%hook_type, count = hooks.len(), "running hooks");

        for (index, hook) in hooks.enumerate() {
            let group = &mut *self.group;
            let result = panic::catch_unwind(AssertUnwindSafe(|| hook.call(group)))
                .unwrap_or_else(|payload| ExampleResult(Err(panic_message(payload))));
            if let Err(message) = result.0 {
                debug!(%hook_type, index, %message, "hook failed");
                return Err(ExampleError::Hook {
                    hook_type,
                    index,
                    message,
                });
            }
        }
        Ok(())
    }

    /// Invoke the example body.
    ///
    /// The body is only available once. Calling this again, or before
    /// [`begin`](Self::begin), is an illegal transition.
    pub fn run_body(&mut self) -> Result<(), ExampleError> {
        if self.state != ExampleState::Running {
            return Err(ExampleError::IllegalTransition {
                from: self.state,
                to: ExampleState::Running,
            });
        }
        let body = self.body.take().ok_or(ExampleError::IllegalTransition {
            from: self.state,
            to: ExampleState::Running,
        })?;

        trace!("invoking example body");
        match panic::catch_unwind(AssertUnwindSafe(|| body.call())) {
            Ok(result) => result.0.map_err(ExampleError::failed),
            Err(payload) => Err(ExampleError::from_panic(payload)),
        }
    }

    /// Capture a failure to be surfaced by [`finish_example`](Self::finish_example).
    ///
    /// Only the first failure is kept; later ones are logged and dropped.
    /// A finished example rejects failures, nothing would surface them anymore.
    pub fn set_failure(&mut self, error: ExampleError) -> Result<(), ExampleError> {
        let to = match error.is_timeout() {
            true => ExampleState::TimedOut,
            false => ExampleState::Failed,
        };
        if self.state.is_terminal() {
            warn!(%error, "failure reported after the example finished");
            return Err(ExampleError::IllegalTransition {
                from: self.state,
                to,
            });
        }
        if let Some(existing) = &self.failure {
            warn!(%existing, dropped = %error, "example already failed");
            return Ok(());
        }

        self.transition(to)?;
        debug!(%error, "captured example failure");
        self.failure = Some(error);
        Ok(())
    }

    /// Complete the example.
    ///
    /// Returns the captured failure if there is one, otherwise `Ok(())`.
    /// The failure is handed out exactly once.
    pub fn finish_example(&mut self) -> Result<(), ExampleError> {
        self.transition(ExampleState::Finished)?;
        match self.failure.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// The event loop specific part of running an evented example.
///
/// Implement this for each event loop backend. The lifecycle operations have
/// no default behavior, only [`finish_example`](Self::finish_example) does,
/// and implementors may override it to release their own resources before or
/// after delegating to [`EventedExample::finish_example`].
pub trait EventedRunner<'g>: Sized {
    type Group: ExampleGroup + 'g;

    fn example(&self) -> &EventedExample<'g, Self::Group>;

    fn example_mut(&mut self) -> &mut EventedExample<'g, Self::Group>;

    /// Run the example to completion inside the event loop.
    ///
    /// Returns once the loop stopped, with the result of
    /// [`finish_example`](Self::finish_example).
    fn run(&mut self) -> Result<(), ExampleError>;

    /// Arm a timer that fails the example with [`ExampleError::TimedOut`]
    /// and stops the loop once `spec_timeout` elapsed.
    fn timeout(&mut self, spec_timeout: Duration) -> Result<(), ExampleError>;

    /// Stop the event loop, optionally after `delay`, then invoke `then` and
    /// finish the example.
    fn done(
        &mut self,
        delay: Option<Duration>,
        then: Option<Deferred<Self>>,
    ) -> Result<(), ExampleError>;

    /// Run `block` with this runner, right away when `delay` is `None`,
    /// otherwise after `delay` on the same event loop.
    fn delayed(
        &mut self,
        delay: Option<Duration>,
        block: Deferred<Self>,
    ) -> Result<(), ExampleError>;

    fn finish_example(&mut self) -> Result<(), ExampleError> {
        self.example_mut().finish_example()
    }
}

impl<'g, G: ExampleGroup + 'g> EventedRunner<'g> for EventedExample<'g, G> {
    type Group = G;

    fn example(&self) -> &EventedExample<'g, G> {
        self
    }

    fn example_mut(&mut self) -> &mut EventedExample<'g, G> {
        self
    }

    fn run(&mut self) -> Result<(), ExampleError> {
        Err(ExampleError::not_supported::<Self>("run"))
    }

    fn timeout(&mut self, _: Duration) -> Result<(), ExampleError> {
        Err(ExampleError::not_supported::<Self>("timeout"))
    }

    fn done(&mut self, _: Option<Duration>, _: Option<Deferred<Self>>) -> Result<(), ExampleError> {
        Err(ExampleError::not_supported::<Self>("done"))
    }

    fn delayed(&mut self, _: Option<Duration>, _: Deferred<Self>) -> Result<(), ExampleError> {
        Err(ExampleError::not_supported::<Self>("delayed"))
    }
}
