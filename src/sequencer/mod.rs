//! Serial/parallel animation job sequencing.
//!
//! Jobs are grouped into slots as they are registered. Slots are admitted in registration
//! order under a [`StageConcurrency`] bound; the jobs of an admitted slot all start at once.
//! One [`ScheduleReport`] is delivered when everything has resolved.

pub mod gate;
pub mod runner;
pub mod schedule;

pub use gate::{Completion, JobOutcome, JobStatus};
pub use runner::{Phase, ScheduleReport, Sequencer, SequencerConfig, StageConcurrency};
pub use schedule::{Job, Ordering, Schedule, Slot};
