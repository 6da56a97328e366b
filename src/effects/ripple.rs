use crate::{
    animation::tween::Tween,
    effects::{Effect, EffectEnv, reveal},
    events::HandlerResult,
    foundation::{
        core::{Millis, Vec2},
        error::EdgeFxResult,
    },
    orchestrate::{
        draft::Draft,
        options::{PresentationOptions, RippleOptions},
    },
    render::surface::{Painter, Property, RenderCommand},
    sequencer::{Completion, Job, Ordering, Sequencer},
};

/// Expanding copies of the outline, drawn one after another and faded out.
#[derive(Clone, Debug)]
pub struct Ripple {
    options: RippleOptions,
}

/// Geometry and timing of a single wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wave {
    pub index: usize,
    pub opacity: f64,
    pub scale: Vec2,
}

impl Ripple {
    pub fn new(options: RippleOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RippleOptions {
        &self.options
    }

    /// Each wave is fainter and larger than the one before; the last reaches `2 * pixels`
    /// of growth per axis.
    pub fn waves(&self, draft: &Draft) -> Vec<Wave> {
        let n = self.options.waves.max(1) as usize;
        let full = draft.outline.grow_scale(self.options.pixels * 2.0);
        let base = draft.style.opacity;
        let step = base * 0.75 / n as f64;
        (0..n)
            .map(|i| {
                let reach = (i + 1) as f64 / n as f64;
                Wave {
                    index: i,
                    opacity: base - step * (i + 1) as f64,
                    scale: Vec2::new(1.0 + (full.x - 1.0) * reach, 1.0 + (full.y - 1.0) * reach),
                }
            })
            .collect()
    }

    /// Time unit of one wave: it draws over two units and fades over seven.
    pub fn beat(&self) -> Millis {
        self.options
            .duration
            .scale(0.33 / f64::from(self.options.waves.max(1)))
    }

    fn prepare(&self, painter: &Painter, draft: &Draft, waves: &[Wave]) -> EdgeFxResult<()> {
        let full = draft.outline.grow_scale(self.options.pixels * 2.0);
        let frame = draft.frame;
        painter.emit(RenderCommand::SetFrame {
            target: draft.surface_target(),
            frame: frame.inflate(
                frame.width() * (full.x - 1.0) / 2.0,
                frame.height() * (full.y - 1.0) / 2.0,
            ),
        })?;
        for wave in waves {
            painter.emit(RenderCommand::ClonePath {
                draft: draft.id,
                index: wave.index,
                color: self.options.stroke.color.clone(),
                width: self.options.stroke.width,
                opacity: wave.opacity,
            })?;
            painter.show(draft.clone_target(wave.index), false)?;
        }
        Ok(())
    }

    fn wave_job(
        painter: Painter,
        draft: &Draft,
        wave: Wave,
        beat: Millis,
        interval: Millis,
        outer: Completion,
    ) -> impl FnOnce(Completion) + 'static {
        let target = draft.clone_target(wave.index);
        let length = draft.outline.length();
        let ease = draft.timing.ease;
        move |done| {
            if outer.is_resolved() {
                done.done();
                return;
            }
            let draw = beat.scale(2.0);
            let started = painter
                .show(target.clone(), true)
                .and_then(|_| {
                    let tween = Tween::linear(length, 0.0, draw).eased(ease);
                    painter.animate(target.clone(), Property::DashOffset, tween)
                })
                .and_then(|_| {
                    let tween = Tween::linear(1.0, wave.scale.x, draw).eased(ease);
                    painter.animate(target.clone(), Property::ScaleX, tween)
                })
                .and_then(|_| {
                    let tween = Tween::linear(1.0, wave.scale.y, draw).eased(ease);
                    painter.animate(target.clone(), Property::ScaleY, tween)
                });
            if let Err(err) = started {
                done.fail(err.to_string());
                return;
            }
            let p = painter.clone();
            painter.after(draw, move || {
                if let Err(err) =
                    p.tween(target, Property::Opacity, wave.opacity, 0.0, beat.scale(7.0))
                {
                    tracing::warn!(%err, wave = wave.index, "ripple fade failed");
                }
                p.after(interval, move || {
                    done.done();
                });
            });
        }
    }

    fn job(
        &self,
        draft: Draft,
        painter: Painter,
        presentation: PresentationOptions,
    ) -> impl FnOnce(Completion) + 'static {
        let waves = self.waves(&draft);
        let beat = self.beat();
        let wave_interval = self.options.interval;
        move |done| {
            let mut inner = Sequencer::new(painter.event_loop().clone());
            for wave in &waves {
                let job = Self::wave_job(
                    painter.clone(),
                    &draft,
                    *wave,
                    beat,
                    wave_interval,
                    done.clone(),
                );
                let label = format!("ripple:{}#{}", draft.element, wave.index);
                if let Err(err) = inner.push(Job::new(job).label(label), Ordering::Serial) {
                    done.fail(err.to_string());
                    return;
                }
            }
            let p = painter.clone();
            let outer = done.clone();
            let started = inner.start(Millis::ZERO, move |report| {
                if outer.is_resolved() {
                    return;
                }
                if !report.is_clean() {
                    let failed = report.count(|s| !s.is_success());
                    outer.fail(format!("{failed} ripple wave(s) did not finish"));
                    return;
                }
                if let Err(err) = reveal(&p, &draft, presentation) {
                    outer.fail(err.to_string());
                    return;
                }
                tracing::debug!(draft = %draft.id, waves = report.outcomes.len(), "ripple drawn");
                p.after(draft.timing.interval, move || {
                    outer.done();
                });
            });
            if let Err(err) = started {
                done.fail(err.to_string());
            }
        }
    }
}

impl Effect for Ripple {
    fn name(&self) -> &'static str {
        "ripple"
    }

    fn queue(&self, draft: &Draft, scheduler: &mut Sequencer, env: EffectEnv<'_>) -> HandlerResult {
        let waves = self.waves(draft);
        self.prepare(env.painter, draft, &waves)?;
        let job = Job::new(self.job(draft.clone(), env.painter.clone(), env.options.presentation))
            .delay(draft.timing.delay)
            .label(format!("ripple:{}", draft.element));
        scheduler.push(job, Ordering::from_parallel_flag(draft.timing.parallel))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/ripple.rs"]
mod tests;
