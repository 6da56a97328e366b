//! Runs the `ready → init → onload → create → queue → animate → complete` lifecycle over a
//! scene, building one draft per selected element.

pub mod draft;
pub mod options;
pub mod run;
pub mod scene;

pub use draft::{Draft, DraftTiming};
pub use options::{
    AnimationOptions, BubbleOptions, BubbleSpeed, EffectConfig, Feature, FilterOptions, Interval,
    Opacity, Options, PresentationMode, PresentationOptions, RippleOptions, RippleStroke,
    StrokeOptions, WavesMode, WavesOptions,
};
pub use run::{LifecycleArgs, LifecycleBus, Orchestrator, RunContext, RunHandle};
pub use scene::{Element, ElementKind, ElementOverrides, ElementSettings, Scene};
