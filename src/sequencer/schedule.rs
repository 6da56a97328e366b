use crate::{foundation::core::Millis, sequencer::gate::Completion};

/// Body of a job. It receives its completion handle and must resolve it once.
pub type JobFn = Box<dyn FnOnce(Completion)>;

/// How a newly added job relates to the previously added one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ordering {
    /// Join the most recent slot and run alongside its jobs.
    #[default]
    Parallel,
    /// Open a new slot that waits for the previous one.
    Serial,
}

impl Ordering {
    pub fn from_parallel_flag(parallel: bool) -> Self {
        if parallel {
            Self::Parallel
        } else {
            Self::Serial
        }
    }
}

pub struct Job {
    pub(crate) run: JobFn,
    pub delay: Millis,
    pub label: Option<String>,
}

impl Job {
    pub fn new(run: impl FnOnce(Completion) + 'static) -> Self {
        Self {
            run: Box::new(run),
            delay: Millis::ZERO,
            label: None,
        }
    }

    pub fn delay(mut self, delay: Millis) -> Self {
        self.delay = delay;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("delay", &self.delay)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Jobs that start together; complete once every job has resolved.
#[derive(Debug, Default)]
pub struct Slot {
    pub(crate) jobs: Vec<Job>,
}

impl Slot {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = Option<&str>> {
        self.jobs.iter().map(|j| j.label.as_deref())
    }
}

/// Flat, ordered slot list built by incremental registration.
///
/// A stage, the unit the driver admits under its concurrency bound, is one slot here.
#[derive(Debug, Default)]
pub struct Schedule {
    slots: Vec<Slot>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `job` and returns the index of the slot it landed in.
    ///
    /// The first job always opens slot 0, whatever its ordering.
    pub fn push(&mut self, job: Job, ordering: Ordering) -> usize {
        match (self.slots.last_mut(), ordering) {
            (Some(last), Ordering::Parallel) => last.jobs.push(job),
            _ => self.slots.push(Slot { jobs: vec![job] }),
        }
        self.slots.len() - 1
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot_sizes(&self) -> Vec<usize> {
        self.slots.iter().map(Slot::len).collect()
    }

    pub fn job_count(&self) -> usize {
        self.slots.iter().map(Slot::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn into_slots(self) -> Vec<Slot> {
        self.slots
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequencer/schedule.rs"]
mod tests;
