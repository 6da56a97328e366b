use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    foundation::core::Millis,
    runtime::{
        cancel::CancelToken,
        event_loop::{EventLoop, TimerId},
    },
};

/// Final state of one job.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum JobStatus {
    Completed,
    Failed(String),
    TimedOut,
    Cancelled,
}

impl JobStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JobOutcome {
    pub slot: usize,
    pub job: usize,
    pub label: Option<String>,
    pub status: JobStatus,
    pub finished_at: Millis,
}

struct Entry {
    label: Option<String>,
    status: Option<JobStatus>,
    finished_at: Millis,
    // Pending delay timer before invocation, timeout timer after.
    timer: Option<TimerId>,
}

type SlotDone = Box<dyn FnOnce(Vec<JobOutcome>)>;

/// Completion accounting for one slot: one resolution per job, one upward signal per slot.
pub(crate) struct SlotGate {
    slot: usize,
    entries: RefCell<Vec<Entry>>,
    remaining: Cell<usize>,
    event_loop: EventLoop,
    timeout: Option<Millis>,
    cancel: CancelToken,
    on_complete: RefCell<Option<SlotDone>>,
}

impl SlotGate {
    pub(crate) fn new(
        slot: usize,
        labels: Vec<Option<String>>,
        event_loop: EventLoop,
        timeout: Option<Millis>,
        cancel: CancelToken,
        on_complete: impl FnOnce(Vec<JobOutcome>) + 'static,
    ) -> Rc<Self> {
        let entries: Vec<Entry> = labels
            .into_iter()
            .map(|label| Entry {
                label,
                status: None,
                finished_at: Millis::ZERO,
                timer: None,
            })
            .collect();
        Rc::new(Self {
            slot,
            remaining: Cell::new(entries.len()),
            entries: RefCell::new(entries),
            event_loop,
            timeout,
            cancel,
            on_complete: RefCell::new(Some(Box::new(on_complete))),
        })
    }

    pub(crate) fn slot(&self) -> usize {
        self.slot
    }

    pub(crate) fn remaining(&self) -> usize {
        self.remaining.get()
    }

    pub(crate) fn is_resolved(&self, job: usize) -> bool {
        self.entries
            .borrow()
            .get(job)
            .is_none_or(|e| e.status.is_some())
    }

    pub(crate) fn status(&self, job: usize) -> Option<JobStatus> {
        self.entries.borrow().get(job).and_then(|e| e.status.clone())
    }

    pub(crate) fn set_timer(&self, job: usize, id: TimerId) {
        if let Some(entry) = self.entries.borrow_mut().get_mut(job) {
            entry.timer = Some(id);
        }
    }

    /// Starts the per-job timeout clock, if one is configured.
    pub(crate) fn arm_timeout(self: &Rc<Self>, job: usize) {
        let Some(timeout) = self.timeout else {
            return;
        };
        let gate = Rc::clone(self);
        let id = self.event_loop.defer(timeout, move || {
            // The timer is firing, so it must not be cancelled again on resolve.
            if let Some(entry) = gate.entries.borrow_mut().get_mut(job) {
                entry.timer = None;
            }
            if gate.resolve(job, JobStatus::TimedOut) {
                tracing::warn!(
                    slot = gate.slot,
                    job,
                    timeout_ms = timeout.0,
                    "job timed out"
                );
            }
        });
        self.set_timer(job, id);
    }

    /// Records `status` for `job`. Returns false if the job was already resolved.
    pub(crate) fn resolve(&self, job: usize, status: JobStatus) -> bool {
        let now = self.event_loop.now();
        let timer = {
            let mut entries = self.entries.borrow_mut();
            let Some(entry) = entries.get_mut(job) else {
                return false;
            };
            if entry.status.is_some() {
                return false;
            }
            entry.status = Some(status);
            entry.finished_at = now;
            entry.timer.take()
        };
        if let Some(id) = timer {
            self.event_loop.cancel(id);
        }

        let left = self.remaining.get().saturating_sub(1);
        self.remaining.set(left);
        if left == 0 {
            tracing::debug!(slot = self.slot, "completed slot");
            let outcomes = self.outcomes();
            let callback = self.on_complete.borrow_mut().take();
            if let Some(callback) = callback {
                callback(outcomes);
            }
        }
        true
    }

    /// Resolves every unresolved job as cancelled; pending delay timers are dropped.
    pub(crate) fn cancel_pending(&self) {
        let len = self.entries.borrow().len();
        for job in 0..len {
            self.resolve(job, JobStatus::Cancelled);
        }
    }

    fn outcomes(&self) -> Vec<JobOutcome> {
        self.entries
            .borrow()
            .iter()
            .enumerate()
            .map(|(job, e)| JobOutcome {
                slot: self.slot,
                job,
                label: e.label.clone(),
                status: e.status.clone().unwrap_or(JobStatus::Cancelled),
                finished_at: e.finished_at,
            })
            .collect()
    }
}

/// Handle a job resolves to report that it finished.
///
/// Clones refer to the same job. Only the first resolution counts; later calls are logged
/// and ignored, so a job that calls back twice cannot complete its slot twice.
#[derive(Clone)]
pub struct Completion {
    gate: Rc<SlotGate>,
    job: usize,
}

impl Completion {
    pub(crate) fn new(gate: Rc<SlotGate>, job: usize) -> Self {
        Self { gate, job }
    }

    pub fn done(&self) -> bool {
        self.resolve(JobStatus::Completed)
    }

    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.resolve(JobStatus::Failed(reason.into()))
    }

    pub fn resolve(&self, status: JobStatus) -> bool {
        let first = self.gate.resolve(self.job, status);
        if !first {
            tracing::warn!(
                slot = self.gate.slot(),
                job = self.job,
                previous = ?self.gate.status(self.job),
                "ignoring repeated job completion"
            );
        }
        first
    }

    pub fn is_resolved(&self) -> bool {
        self.gate.is_resolved(self.job)
    }

    /// True once the owning schedule has been cancelled; long-running jobs may bail early.
    pub fn is_cancelled(&self) -> bool {
        self.gate.cancel.is_cancelled()
    }

    pub fn slot(&self) -> usize {
        self.gate.slot()
    }

    pub fn job(&self) -> usize {
        self.job
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("slot", &self.gate.slot())
            .field("job", &self.job)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequencer/gate.rs"]
mod tests;
