use std::{
    collections::{BTreeMap, HashMap},
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender};
use evented_spec::{
    Deferred, EventedExample, EventedRunner, ExampleBody, ExampleConfig, ExampleError,
    ExampleGroup, ExampleResult, HookType,
};

/// Requests an example body sends to the loop it runs in.
#[derive(Debug)]
pub enum Command {
    Done { delay: Option<Duration> },
    Fail(String),
    Later { delay: Duration, command: Box<Command> },
}

/// Handed to example bodies so they can talk to the loop after they returned.
#[derive(Debug, Clone)]
pub struct LoopHandle(Sender<Command>);

impl LoopHandle {
    fn send(&self, command: Command) {
        // The loop outlives every body it runs, a closed channel means the example is over.
        let _ = self.0.send(command);
    }

    pub fn done(&self) {
        self.send(Command::Done { delay: None });
    }

    pub fn done_after(&self, delay: Duration) {
        self.send(Command::Done { delay: Some(delay) });
    }

    pub fn fail_after(&self, delay: Duration, message: impl Into<String>) {
        self.send(Command::Later {
            delay,
            command: Box::new(Command::Fail(message.into())),
        });
    }
}

/// A single threaded event loop with a virtual clock.
///
/// Timers fire in deadline order and advance the clock instantly, so
/// timeouts can be exercised without waiting.
pub struct VirtualLoopExample<'g, G> {
    example: EventedExample<'g, G>,
    commands: Receiver<Command>,
    timers: BTreeMap<(Duration, u64), Deferred<Self>>,
    pending_stops: HashMap<u64, Deferred<Self>>,
    next_id: u64,
    now: Duration,
    stopped: bool,
    released: bool,
}

impl<'g, G: ExampleGroup + 'g> VirtualLoopExample<'g, G> {
    pub fn new<F, T>(config: ExampleConfig, group: &'g mut G, body: F) -> Self
    where
        F: FnOnce(LoopHandle) -> T + 'static,
        T: Into<ExampleResult>,
    {
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = LoopHandle(tx);
        Self {
            example: EventedExample::new(config, group, ExampleBody::new(move || body(handle))),
            commands: rx,
            timers: BTreeMap::new(),
            pending_stops: HashMap::new(),
            next_id: 0,
            now: Duration::ZERO,
            stopped: false,
            released: false,
        }
    }

    /// Virtual time elapsed since the loop started.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn released(&self) -> bool {
        self.released
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn apply(&mut self, command: Command) {
        let result = match command {
            Command::Done { delay } => self.done(delay, None),
            Command::Fail(message) => self
                .example
                .set_failure(ExampleError::failed(message))
                .and_then(|()| self.done(None, None)),
            Command::Later { delay, command } => {
                self.delayed(Some(delay), Box::new(move |this: &mut Self| this.apply(*command)))
            }
        };
        if let Err(err) = result {
            self.fail_and_stop(err);
        }
    }

    fn fail_and_stop(&mut self, error: ExampleError) {
        self.example
            .set_failure(error)
            .expect("the loop only runs before the example finishes");
        self.stopped = true;
    }

    fn run_loop(&mut self) {
        while !self.stopped {
            while let Ok(command) = self.commands.try_recv() {
                self.apply(command);
            }
            if self.stopped {
                break;
            }

            let Some(((due, _), timer)) = self.timers.pop_first() else {
                break;
            };
            self.now = due;
            timer(self);
        }

        self.timers.clear();
        self.pending_stops.clear();
    }
}

impl<'g, G: ExampleGroup + 'g> EventedRunner<'g> for VirtualLoopExample<'g, G> {
    type Group = G;

    fn example(&self) -> &EventedExample<'g, G> {
        &self.example
    }

    fn example_mut(&mut self) -> &mut EventedExample<'g, G> {
        &mut self.example
    }

    fn run(&mut self) -> Result<(), ExampleError> {
        self.example.begin()?;
        let spec_timeout = self.example.config().spec_timeout();
        self.timeout(spec_timeout)?;

        if let Err(err) = self.example.run_hooks(HookType::Before) {
            self.timers.clear();
            self.example.set_failure(err)?;
            return self.finish_example();
        }
        match self.example.run_body() {
            Ok(()) => self.example.suspend()?,
            Err(err) => {
                self.example.set_failure(err)?;
                self.done(None, None)?;
            }
        }

        self.run_loop();
        self.example.run_hooks(HookType::After)?;
        self.finish_example()
    }

    fn timeout(&mut self, spec_timeout: Duration) -> Result<(), ExampleError> {
        self.delayed(
            Some(spec_timeout),
            Box::new(move |this: &mut Self| {
                this.fail_and_stop(ExampleError::TimedOut {
                    after: spec_timeout,
                })
            }),
        )
    }

    fn done(
        &mut self,
        delay: Option<Duration>,
        then: Option<Deferred<Self>>,
    ) -> Result<(), ExampleError> {
        let id = self.next_id();
        if let Some(then) = then {
            self.pending_stops.insert(id, then);
        }
        self.delayed(
            delay,
            Box::new(move |this: &mut Self| {
                this.stopped = true;
                if let Some(then) = this.pending_stops.remove(&id) {
                    then(this);
                }
            }),
        )
    }

    fn delayed(
        &mut self,
        delay: Option<Duration>,
        block: Deferred<Self>,
    ) -> Result<(), ExampleError> {
        match delay {
            None => block(self),
            Some(delay) => {
                let id = self.next_id();
                self.timers.insert((self.now + delay, id), block);
            }
        }
        Ok(())
    }

    fn finish_example(&mut self) -> Result<(), ExampleError> {
        self.released = true;
        self.example.finish_example()
    }
}
