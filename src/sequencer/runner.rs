use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    panic::AssertUnwindSafe,
    rc::Rc,
};

use crate::{
    foundation::{
        core::Millis,
        error::{EdgeFxError, EdgeFxResult, panic_message},
    },
    runtime::{
        cancel::CancelToken,
        event_loop::{EventLoop, TimerId},
    },
    sequencer::{
        gate::{Completion, JobOutcome, JobStatus, SlotGate},
        schedule::{Job, Ordering, Schedule, Slot},
    },
};

/// How many slots may be in flight at once.
///
/// `Sequential` runs slots strictly one after another. `Unbounded` fans every slot out at
/// start and gates the schedule on all of them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "limit")]
pub enum StageConcurrency {
    #[default]
    Sequential,
    Bounded(usize),
    Unbounded,
}

impl StageConcurrency {
    fn limit(self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Bounded(n) => n.max(1),
            Self::Unbounded => usize::MAX,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    pub concurrency: StageConcurrency,
    /// Per-job limit measured from invocation. `None` lets a stalled job hang the schedule.
    pub job_timeout: Option<Millis>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Building,
    Running,
    Completed,
}

/// Everything the final callback learns about a finished schedule.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScheduleReport {
    pub outcomes: Vec<JobOutcome>,
    pub started_at: Millis,
    pub finished_at: Millis,
    pub cancelled: bool,
}

impl ScheduleReport {
    /// True when every job completed successfully (vacuously true for an empty schedule).
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.outcomes.iter().all(|o| o.status.is_success())
    }

    pub fn count(&self, pred: impl Fn(&JobStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    pub fn elapsed(&self) -> Millis {
        self.finished_at.saturating_sub(self.started_at)
    }
}

type ScheduleDone = Box<dyn FnOnce(ScheduleReport)>;

struct Driver {
    event_loop: EventLoop,
    cancel: CancelToken,
    config: SequencerConfig,
    phase: Rc<Cell<Phase>>,
    pending: RefCell<VecDeque<(usize, Slot)>>,
    active: RefCell<Vec<Rc<SlotGate>>>,
    in_flight: Cell<usize>,
    remaining: Cell<usize>,
    outcomes: RefCell<Vec<JobOutcome>>,
    started_at: Cell<Millis>,
    // Pending initial-delay timer; `None` once the schedule has begun.
    begin_timer: Cell<Option<TimerId>>,
    on_complete: RefCell<Option<ScheduleDone>>,
}

impl Driver {
    fn begin(self: &Rc<Self>) {
        self.begin_timer.set(None);
        self.started_at.set(self.event_loop.now());
        tracing::debug!(
            slots = self.remaining.get(),
            concurrency = ?self.config.concurrency,
            "starting schedule"
        );
        self.pump();
    }

    /// Admits pending slots while the concurrency bound allows, then checks for completion.
    fn pump(self: &Rc<Self>) {
        let limit = self.config.concurrency.limit();
        while self.in_flight.get() < limit {
            let next = self.pending.borrow_mut().pop_front();
            let Some((index, slot)) = next else {
                break;
            };
            if self.cancel.is_cancelled() {
                self.skip(index, slot);
                continue;
            }
            self.admit(index, slot);
        }
        if self.remaining.get() == 0 {
            self.finish();
        }
    }

    fn admit(self: &Rc<Self>, index: usize, slot: Slot) {
        self.in_flight.set(self.in_flight.get() + 1);
        tracing::debug!(slot = index, jobs = slot.len(), "running slot");

        let labels = slot.jobs.iter().map(|j| j.label.clone()).collect();
        let driver = Rc::clone(self);
        let gate = SlotGate::new(
            index,
            labels,
            self.event_loop.clone(),
            self.config.job_timeout,
            self.cancel.clone(),
            move |outcomes| driver.slot_done(index, outcomes),
        );
        self.active.borrow_mut().push(Rc::clone(&gate));

        for (job_index, job) in slot.jobs.into_iter().enumerate() {
            let completion = Completion::new(Rc::clone(&gate), job_index);
            let invoke_gate = Rc::clone(&gate);
            let Job { run, delay, .. } = job;
            let id = self.event_loop.defer(delay, move || {
                if completion.is_resolved() {
                    return;
                }
                invoke_gate.arm_timeout(job_index);
                let handle = completion.clone();
                let result = std::panic::catch_unwind(AssertUnwindSafe(move || run(handle)));
                if let Err(payload) = result {
                    let reason = panic_message(payload.as_ref());
                    tracing::error!(
                        slot = invoke_gate.slot(),
                        job = job_index,
                        %reason,
                        "job panicked"
                    );
                    completion.fail(format!("panicked: {reason}"));
                }
            });
            // The timer is replaced by the timeout timer once the job is invoked.
            if !gate.is_resolved(job_index) {
                gate.set_timer(job_index, id);
            }
        }
    }

    fn skip(&self, index: usize, slot: Slot) {
        let now = self.event_loop.now();
        let mut outcomes = self.outcomes.borrow_mut();
        for (job, j) in slot.jobs.into_iter().enumerate() {
            outcomes.push(JobOutcome {
                slot: index,
                job,
                label: j.label,
                status: JobStatus::Cancelled,
                finished_at: now,
            });
        }
        self.remaining.set(self.remaining.get().saturating_sub(1));
    }

    fn slot_done(self: &Rc<Self>, index: usize, outcomes: Vec<JobOutcome>) {
        self.outcomes.borrow_mut().extend(outcomes);
        self.active.borrow_mut().retain(|g| g.slot() != index);
        self.in_flight.set(self.in_flight.get().saturating_sub(1));
        self.remaining.set(self.remaining.get().saturating_sub(1));
        self.pump();
    }

    fn abort(self: &Rc<Self>) {
        if self.phase.get() != Phase::Running {
            return;
        }
        if let Some(id) = self.begin_timer.take() {
            // Still inside the initial delay: nothing ran, every slot is skipped now.
            self.event_loop.cancel(id);
            self.started_at.set(self.event_loop.now());
            tracing::warn!(slots = self.remaining.get(), "schedule cancelled before it began");
            self.pump();
            return;
        }
        tracing::warn!(
            in_flight = self.in_flight.get(),
            remaining = self.remaining.get(),
            "schedule cancelled"
        );
        // Gates call back into `slot_done`, which mutates `active`; work on a copy.
        let active: Vec<Rc<SlotGate>> = self.active.borrow().clone();
        for gate in active {
            gate.cancel_pending();
        }
        self.pump();
    }

    fn finish(&self) {
        if self.phase.replace(Phase::Completed) == Phase::Completed {
            return;
        }
        let mut outcomes = std::mem::take(&mut *self.outcomes.borrow_mut());
        outcomes.sort_by_key(|o| (o.slot, o.job));
        let report = ScheduleReport {
            outcomes,
            started_at: self.started_at.get(),
            finished_at: self.event_loop.now(),
            cancelled: self.cancel.is_cancelled(),
        };
        tracing::debug!(
            jobs = report.outcomes.len(),
            elapsed_ms = report.elapsed().0,
            clean = report.is_clean(),
            "schedule complete"
        );
        self.active.borrow_mut().clear();
        let callback = self.on_complete.borrow_mut().take();
        if let Some(callback) = callback {
            callback(report);
        }
    }
}

/// Serial/parallel job runner with a single completion callback.
///
/// Jobs are registered while building (see [`Schedule::push`] for the grouping rules), then
/// [`Sequencer::start`] runs them on the event loop.
pub struct Sequencer {
    event_loop: EventLoop,
    config: SequencerConfig,
    cancel: CancelToken,
    schedule: Option<Schedule>,
    phase: Rc<Cell<Phase>>,
}

impl Sequencer {
    pub fn new(event_loop: EventLoop) -> Self {
        Self::with_config(event_loop, SequencerConfig::default())
    }

    pub fn with_config(event_loop: EventLoop, config: SequencerConfig) -> Self {
        Self {
            event_loop,
            config,
            cancel: CancelToken::new(),
            schedule: Some(Schedule::new()),
            phase: Rc::new(Cell::new(Phase::Building)),
        }
    }

    /// Replaces the cancellation token, e.g. to share one token across nested sequencers.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> SequencerConfig {
        self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    /// Registers a job body. `parallel` joins the last slot, otherwise a new slot opens.
    pub fn add(
        &mut self,
        job: impl FnOnce(Completion) + 'static,
        parallel: bool,
        delay: Millis,
    ) -> EdgeFxResult<usize> {
        self.push(
            Job::new(job).delay(delay),
            Ordering::from_parallel_flag(parallel),
        )
    }

    pub fn push(&mut self, job: Job, ordering: Ordering) -> EdgeFxResult<usize> {
        let schedule = self
            .schedule
            .as_mut()
            .ok_or_else(|| EdgeFxError::sequencer("cannot add jobs once the schedule started"))?;
        Ok(schedule.push(job, ordering))
    }

    /// The schedule being built; `None` once started.
    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    pub fn slot_sizes(&self) -> Vec<usize> {
        self.schedule
            .as_ref()
            .map(Schedule::slot_sizes)
            .unwrap_or_default()
    }

    /// Runs the schedule after `initial_delay`; `on_complete` fires exactly once.
    pub fn start(
        &mut self,
        initial_delay: Millis,
        on_complete: impl FnOnce(ScheduleReport) + 'static,
    ) -> EdgeFxResult<()> {
        let schedule = self
            .schedule
            .take()
            .ok_or_else(|| EdgeFxError::sequencer("schedule was already started"))?;
        self.phase.set(Phase::Running);

        let slots: VecDeque<(usize, Slot)> = schedule.into_slots().into_iter().enumerate().collect();
        let driver = Rc::new(Driver {
            event_loop: self.event_loop.clone(),
            cancel: self.cancel.clone(),
            config: self.config,
            phase: Rc::clone(&self.phase),
            remaining: Cell::new(slots.len()),
            pending: RefCell::new(slots),
            active: RefCell::new(Vec::new()),
            in_flight: Cell::new(0),
            outcomes: RefCell::new(Vec::new()),
            started_at: Cell::new(Millis::ZERO),
            begin_timer: Cell::new(None),
            on_complete: RefCell::new(Some(Box::new(on_complete))),
        });

        if self.cancel.is_cancelled() {
            // Report on the next tick rather than from inside `start`.
            self.event_loop.defer(Millis::ZERO, move || driver.begin());
            return Ok(());
        }

        let weak = Rc::downgrade(&driver);
        let begin = Rc::clone(&driver);
        let id = self.event_loop.defer(initial_delay, move || begin.begin());
        driver.begin_timer.set(Some(id));
        self.cancel.on_cancel(move || {
            if let Some(driver) = weak.upgrade() {
                driver.abort();
            }
        });
        Ok(())
    }

    /// Cancels the run: unstarted jobs never run, in-flight jobs are marked cancelled.
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("phase", &self.phase.get())
            .field("config", &self.config)
            .field("slots", &self.slot_sizes())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequencer/runner.rs"]
mod tests;
