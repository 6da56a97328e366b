//! edgefx traces animated outlines around page elements.
//!
//! Boxes, rounded boxes and images (through their alpha contour) get an outline that is drawn
//! by stroke, ripple or waves effects. The moving parts:
//!
//! - a priority [`EventBus`] that fires the run lifecycle,
//! - a [`Sequencer`] that runs effect jobs in serial/parallel slots on an [`EventLoop`],
//! - an [`Orchestrator`] that builds drafts and emits [`RenderCommand`]s to a [`RenderSurface`].
//!
//! Everything is single-threaded and runs on a virtual clock unless paced in real time.
#![forbid(unsafe_code)]

pub mod animation;
pub mod effects;
pub mod events;
pub mod foundation;
pub mod geometry;
pub mod orchestrate;
pub mod render;
pub mod runtime;
pub mod sequencer;

pub use crate::animation::{Ease, Tween};
pub use crate::effects::{Effect, EffectEnv, Ripple, Stroke, Waves};
pub use crate::events::{DEFAULT_PRIORITY, EventBus, Handler, HandlerResult, Lifecycle, handler};
pub use crate::foundation::core::{Affine, BezPath, DraftId, Millis, Point, Rect, Vec2};
pub use crate::foundation::error::{EdgeFxError, EdgeFxResult};
pub use crate::foundation::rng::Rng64;
pub use crate::geometry::{AlphaMask, CornerRadii, DashPattern, Outline};
pub use crate::orchestrate::{
    Draft, Element, ElementKind, LifecycleArgs, Options, Orchestrator, PresentationMode,
    RunContext, RunHandle, Scene,
};
pub use crate::render::{
    Painter, Property, RecordingSurface, RenderCommand, RenderSurface, SharedSurface, Target,
};
pub use crate::runtime::cancel::CancelToken;
pub use crate::runtime::event_loop::{EventLoop, Pacing};
pub use crate::sequencer::{
    Completion, JobStatus, ScheduleReport, Sequencer, SequencerConfig, StageConcurrency,
};
