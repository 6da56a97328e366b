//! Effect strategies: each contributes jobs to the sequencer at the `queue` point.

pub mod ripple;
pub mod stroke;
pub mod waves;

use std::rc::Rc;

use crate::{
    animation::tween::Tween,
    events::HandlerResult,
    foundation::error::EdgeFxResult,
    orchestrate::{
        draft::Draft,
        options::{EffectConfig, Options, PresentationMode, PresentationOptions},
        run::RunContext,
    },
    render::surface::{Painter, Property},
    sequencer::Sequencer,
};

pub use ripple::Ripple;
pub use stroke::Stroke;
pub use waves::Waves;

/// Shared, read-only pieces of the run an effect may use while queueing.
#[derive(Clone, Copy, Debug)]
pub struct EffectEnv<'a> {
    pub painter: &'a Painter,
    pub options: &'a Options,
}

/// A pluggable animation played around every draft.
pub trait Effect {
    fn name(&self) -> &'static str;

    /// Runs first on `ready`, before user handlers of the default priority.
    fn ready(&self, _ctx: &mut RunContext) -> HandlerResult {
        Ok(())
    }

    /// Registers this effect's job(s) for `draft`.
    fn queue(&self, draft: &Draft, scheduler: &mut Sequencer, env: EffectEnv<'_>) -> HandlerResult;
}

pub fn build(config: &EffectConfig) -> Rc<dyn Effect> {
    match config {
        EffectConfig::Stroke => Rc::new(Stroke),
        EffectConfig::Ripple(options) => Rc::new(Ripple::new(options.clone())),
        EffectConfig::Waves(options) => Rc::new(Waves::new(options.clone())),
    }
}

/// What a draft's element and path do once its outline has been drawn.
pub(crate) fn reveal(
    painter: &Painter,
    draft: &Draft,
    presentation: PresentationOptions,
) -> EdgeFxResult<()> {
    let element = draft.element_target();
    let path = draft.path_target();
    match presentation.mode {
        PresentationMode::Showcase => {
            painter.opacity(element.clone(), 1.0)?;
            painter.show(element, true)?;
            let fade = Tween::linear(draft.style.opacity, 0.0, presentation.duration);
            painter.animate(path, Property::Opacity, fade.eased(presentation.ease))?;
        }
        PresentationMode::Inline => {
            painter.opacity(element.clone(), 1.0)?;
            painter.show(element, true)?;
        }
        PresentationMode::Fadein => {
            painter.opacity(element.clone(), 0.0)?;
            painter.show(element.clone(), true)?;
            let fade = Tween::linear(0.0, 1.0, presentation.duration);
            painter.animate(element, Property::Opacity, fade.eased(presentation.ease))?;
            let p = painter.clone();
            painter.after(presentation.duration, move || {
                let hidden = p.show(path.clone(), false).and_then(|_| p.opacity(path, 0.0));
                if let Err(err) = hidden {
                    tracing::warn!(%err, "failed to hide path after fade-in");
                }
            });
        }
        PresentationMode::Solo | PresentationMode::Hidden => {}
    }
    Ok(())
}
