use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::Rc,
    time::{Duration, Instant},
};

use crate::foundation::core::Millis;

/// Handle of a deferred callback, usable with [`EventLoop::cancel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId {
    due: Millis,
    seq: u64,
}

impl TimerId {
    pub fn due(self) -> Millis {
        self.due
    }
}

/// How [`EventLoop::run`] maps the loop clock onto real time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pacing {
    /// Jump straight to the next due timer. Deterministic and instant.
    #[default]
    Virtual,
    /// Sleep the calling thread until each timer is due on the wall clock.
    RealTime,
}

type Callback = Box<dyn FnOnce()>;

#[derive(Default)]
struct LoopState {
    now: Millis,
    next_seq: u64,
    timers: BTreeMap<TimerId, Callback>,
}

/// Single-threaded timer queue with its own clock.
///
/// Callbacks run one at a time in `(due, registration)` order. A callback may defer further
/// callbacks through a clone of the loop; nothing is borrowed while user code runs.
#[derive(Clone, Default)]
pub struct EventLoop {
    state: Rc<RefCell<LoopState>>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Millis {
        self.state.borrow().now
    }

    /// Schedules `callback` to run `delay` after the current loop time.
    pub fn defer(&self, delay: Millis, callback: impl FnOnce() + 'static) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = TimerId {
            due: state.now + delay,
            seq: state.next_seq,
        };
        state.next_seq += 1;
        state.timers.insert(id, Box::new(callback));
        id
    }

    /// Drops a pending callback. Returns false if it already ran or was cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        self.state.borrow_mut().timers.remove(&id).is_some()
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().timers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.state.borrow().timers.is_empty()
    }

    fn pop_next(&self, deadline: Option<Millis>) -> Option<Callback> {
        let mut state = self.state.borrow_mut();
        let (&id, _) = state.timers.first_key_value()?;
        if deadline.is_some_and(|d| id.due > d) {
            return None;
        }
        let callback = state.timers.remove(&id)?;
        if id.due > state.now {
            state.now = id.due;
        }
        Some(callback)
    }

    /// Runs the next due callback, advancing the clock to its due time.
    pub fn step(&self) -> bool {
        match self.pop_next(None) {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Runs callbacks until none are pending. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.step() {
            ran += 1;
        }
        ran
    }

    /// Runs every callback due at or before `deadline`, then moves the clock to `deadline`.
    pub fn run_until(&self, deadline: Millis) -> usize {
        let mut ran = 0;
        while let Some(callback) = self.pop_next(Some(deadline)) {
            callback();
            ran += 1;
        }
        let mut state = self.state.borrow_mut();
        if deadline > state.now {
            state.now = deadline;
        }
        ran
    }

    pub fn run(&self, pacing: Pacing) -> usize {
        match pacing {
            Pacing::Virtual => self.run_until_idle(),
            Pacing::RealTime => self.run_paced(),
        }
    }

    fn run_paced(&self) -> usize {
        let origin = self.now();
        let started = Instant::now();
        let mut ran = 0;
        loop {
            let next_due = match self.state.borrow().timers.first_key_value() {
                Some((id, _)) => id.due,
                None => break,
            };
            let target = Duration::from_millis(next_due.saturating_sub(origin).0);
            let elapsed = started.elapsed();
            if target > elapsed {
                std::thread::sleep(target - elapsed);
            }
            if self.step() {
                ran += 1;
            }
        }
        ran
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventLoop")
            .field("now", &state.now)
            .field("pending", &state.timers.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/event_loop.rs"]
mod tests;
