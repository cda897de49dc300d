//! Process-wide startup hook.
//!
//! Outboxes can be created while the process is still starting up (before
//! the runtime is serving connections). Their delivery loops are parked here
//! and spawned together once [`Startup::start`] runs.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::future::Future;
use tracing::debug;

/// Spawns background tasks now, or once startup completes.
#[derive(Default)]
pub struct Startup {
    state: Mutex<StartupState>,
}

#[derive(Default)]
struct StartupState {
    started: bool,
    deferred: Vec<(String, BoxFuture<'static, ()>)>,
}

impl Startup {
    /// A hook that has not started yet; tasks are deferred.
    pub fn new() -> Self {
        Self::default()
    }

    /// A hook that is already started; tasks spawn immediately.
    pub fn running() -> Self {
        Self {
            state: Mutex::new(StartupState {
                started: true,
                deferred: Vec::new(),
            }),
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Number of tasks waiting for startup.
    pub fn deferred(&self) -> usize {
        self.state.lock().deferred.len()
    }

    /// Spawn `task` on the current tokio runtime, or defer it until startup.
    pub fn spawn<F>(&self, name: impl Into<String>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let mut state = self.state.lock();
        if state.started {
            drop(state);
            debug!(task = %name, "Spawning background task");
            tokio::spawn(task);
        } else {
            debug!(task = %name, "Deferring background task until startup");
            state.deferred.push((name, task.boxed()));
        }
    }

    /// Mark startup complete and spawn every deferred task.
    ///
    /// Must run inside a tokio runtime. Later calls do nothing. Returns the
    /// number of tasks spawned.
    pub fn start(&self) -> usize {
        let deferred = {
            let mut state = self.state.lock();
            if state.started {
                return 0;
            }
            state.started = true;
            std::mem::take(&mut state.deferred)
        };

        let count = deferred.len();
        for (name, task) in deferred {
            debug!(task = %name, "Spawning deferred task");
            tokio::spawn(task);
        }
        count
    }
}
