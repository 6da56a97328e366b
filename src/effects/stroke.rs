use crate::{
    animation::tween::Tween,
    effects::{Effect, EffectEnv, reveal},
    events::HandlerResult,
    foundation::error::EdgeFxResult,
    orchestrate::{draft::Draft, options::PresentationOptions},
    render::surface::{Painter, Property},
    sequencer::{Completion, Job, Ordering, Sequencer},
};

/// Draws the outline by running its dash offset down to zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stroke;

impl Stroke {
    fn draw(painter: &Painter, draft: &Draft) -> EdgeFxResult<()> {
        let path = draft.path_target();
        painter.show(path.clone(), true)?;
        let tween = Tween::linear(draft.outline.length(), 0.0, draft.timing.duration);
        painter.animate(path, Property::DashOffset, tween.eased(draft.timing.ease))
    }

    fn job(
        draft: Draft,
        painter: Painter,
        presentation: PresentationOptions,
    ) -> impl FnOnce(Completion) + 'static {
        move |done| {
            if let Err(err) = Self::draw(&painter, &draft) {
                done.fail(err.to_string());
                return;
            }
            let p = painter.clone();
            painter.after(draft.timing.duration, move || {
                if done.is_resolved() {
                    return;
                }
                if let Err(err) = reveal(&p, &draft, presentation) {
                    done.fail(err.to_string());
                    return;
                }
                tracing::debug!(draft = %draft.id, interval = %draft.timing.interval, "stroke drawn");
                p.after(draft.timing.interval, move || {
                    done.done();
                });
            });
        }
    }
}

impl Effect for Stroke {
    fn name(&self) -> &'static str {
        "stroke"
    }

    fn queue(&self, draft: &Draft, scheduler: &mut Sequencer, env: EffectEnv<'_>) -> HandlerResult {
        let job = Job::new(Self::job(
            draft.clone(),
            env.painter.clone(),
            env.options.presentation,
        ))
        .delay(draft.timing.delay)
        .label(format!("stroke:{}", draft.element));
        scheduler.push(job, Ordering::from_parallel_flag(draft.timing.parallel))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/stroke.rs"]
mod tests;
