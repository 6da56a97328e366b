use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

use crate::{
    effects::{Effect, EffectEnv},
    events::HandlerResult,
    foundation::{
        core::{BezPath, Millis, Point},
        error::EdgeFxResult,
        rng::Rng64,
    },
    orchestrate::{
        draft::Draft,
        options::{PresentationMode, WavesMode, WavesOptions},
    },
    render::surface::{Painter, Property, RenderCommand, Target},
    runtime::event_loop::TimerId,
    sequencer::{Completion, Job, Ordering, Sequencer},
};

/// Fill of the flooding outline in overlay mode.
pub const OVERLAY_FILL: &str = "#00f";

/// Floods each element from the bottom behind a rolling wave, with bubbles rising through it.
#[derive(Clone, Debug)]
pub struct Waves {
    options: WavesOptions,
}

/// Frame counts of one rise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavePlan {
    /// Samples across the wave; also the frames of one iteration.
    pub periods: usize,
    pub iterations: usize,
    pub frame_time: Millis,
}

impl WavePlan {
    pub fn frames(&self) -> usize {
        self.iterations * self.periods
    }

    pub fn running_time(&self) -> Millis {
        Millis(self.frame_time.0 * self.frames() as u64)
    }
}

/// Rolling wave samples. Each frame drops the oldest sample and appends a new crest.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveField {
    samples: VecDeque<f64>,
    amplitude: f64,
    step: f64,
}

impl WaveField {
    pub fn new(periods: usize, amplitude: f64, step: f64, rng: &mut Rng64) -> Self {
        let samples = (0..periods.max(2))
            .map(|i| {
                let n = i as f64 * amplitude;
                let jitter = rng.next_f64_01() * amplitude * 0.05;
                rng.normal((n * jitter).sin(), amplitude * 0.1)
            })
            .collect();
        Self {
            samples,
            amplitude,
            step,
        }
    }

    pub fn advance(&mut self, frame: usize) {
        self.samples
            .push_back(self.amplitude * 0.2 * (frame as f64 * self.step).sin());
        self.samples.pop_front();
    }

    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Closed outline of the water in a `width` x `height` box.
    ///
    /// At `level` 0 the crests ride in the bottom quarter; at 1 the water covers the box.
    pub fn outline(&self, width: f64, height: f64, level: f64) -> BezPath {
        let level = level.clamp(0.0, 1.0);
        let last = self.samples.len().saturating_sub(1).max(1) as f64;
        let mut path = BezPath::new();
        path.move_to((0.0, height));
        for (i, d) in self.samples().enumerate() {
            let crest = height - (d * self.amplitude + 1.0) / 2.0 * height * 0.25;
            let y = (crest - level * height).clamp(0.0, height);
            path.line_to((width * i as f64 / last, y));
        }
        path.line_to((width, height));
        path.close_path();
        path
    }
}

/// Start position and rise of one bubble, in surface coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bubble {
    pub index: usize,
    pub center: Point,
    pub radius: f64,
    pub opacity: f64,
    /// Upward travel in px; bubbles start below the element and end above it.
    pub rise: f64,
    pub delay: Millis,
}

impl Waves {
    pub fn new(options: WavesOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WavesOptions {
        &self.options
    }

    /// Wave window in samples: five per resolution step, at least six.
    pub fn moment(&self) -> usize {
        (self.options.resolution as usize * 5).max(6)
    }

    pub fn plan(&self) -> WavePlan {
        let moment = self.moment();
        let periods = (moment as f64 / self.options.amplitude).ceil().max(2.0) as usize;
        let frame_time = Millis((1000.0 / self.options.fps).round().max(1.0) as u64);
        let window = moment as f64 * frame_time.0 as f64;
        let iterations = (self.options.duration.0 as f64 / window).ceil().max(1.0) as usize;
        WavePlan {
            periods,
            iterations,
            frame_time,
        }
    }

    /// Bubbles spread across an element of `width` x `height` whose top-left corner sits at
    /// (`inset`, `inset`) on the surface.
    pub fn bubbles(
        &self,
        width: f64,
        height: f64,
        inset: f64,
        plan: &WavePlan,
        rng: &mut Rng64,
    ) -> Vec<Bubble> {
        let n = self.options.bubbles.amount as usize;
        if n == 0 {
            return Vec::new();
        }
        let rmax = width.min(height).max(0.0) * 0.25;
        let xstep = width / n as f64;
        (0..n)
            .map(|index| {
                let x = rng
                    .normal(index as f64 * xstep, xstep * 0.1)
                    .clamp(rmax, (width - rmax).max(rmax));
                let radius = rng.next_f64_01() * rmax;
                let y = rng.normal(height * 1.05 + 2.0 * radius, height * 0.1);
                let rise = (y + 2.0 * radius + rng.normal(height * 0.5, height * 0.05)).max(0.0);
                Bubble {
                    index,
                    center: Point::new(inset + x, inset + y),
                    radius,
                    opacity: rng.normal(0.2, 0.2).clamp(0.1, 0.45),
                    rise,
                    delay: plan.frame_time.scale(rng.normal(0.0, 0.5).abs()),
                }
            })
            .collect()
    }

    /// Time for one climb: the whole rise when automatic, else distance over fixed speed.
    pub fn travel_time(&self, bubble: &Bubble, plan: &WavePlan) -> Millis {
        match self.options.bubbles.speed.fixed_px_per_sec() {
            None => plan.running_time(),
            Some(px_per_sec) => {
                Millis((bubble.rise / px_per_sec * 1000.0).round().max(1.0) as u64)
            }
        }
    }

    fn job(
        &self,
        draft: Draft,
        painter: Painter,
        presentation: PresentationMode,
        mut rng: Rng64,
    ) -> impl FnOnce(Completion) + 'static {
        let plan = self.plan();
        let step = self.moment() as f64 / self.options.amplitude;
        let field = WaveField::new(plan.periods, self.options.amplitude, step, &mut rng);
        let inset = draft.style.width;
        let (w, h) = (draft.frame.width(), draft.frame.height());
        let (ew, eh) = ((w - 2.0 * inset).max(0.0), (h - 2.0 * inset).max(0.0));
        let bubbles = if presentation == PresentationMode::Hidden {
            Vec::new()
        } else {
            self.bubbles(ew, eh, inset, &plan, &mut rng)
        };
        let travel: Vec<Millis> = bubbles.iter().map(|b| self.travel_time(b, &plan)).collect();
        let clip = match (presentation, self.options.mode) {
            (PresentationMode::Hidden, _) => None,
            (_, WavesMode::Mask) => Some((draft.element_target(), ew, eh)),
            (_, WavesMode::Overlay) => Some((draft.surface_target(), w, h)),
        };
        let mode = self.options.mode;
        let tint = self.options.bubbles.tint().to_string();
        move |done| {
            let timers = vec![None; bubbles.len()];
            let run = Rc::new(WaveRun {
                painter,
                draft,
                plan,
                clip,
                field: RefCell::new(field),
                bubbles,
                travel,
                timers: RefCell::new(timers),
                finished: Cell::new(false),
                done,
            });
            if let Err(err) = run.begin(mode, &tint) {
                run.done.fail(err.to_string());
                return;
            }
            for i in 0..run.bubbles.len() {
                let delay = run.bubbles[i].delay;
                let next = Rc::clone(&run);
                let id = run.painter.after(delay, move || WaveRun::climb(next, i));
                run.timers.borrow_mut()[i] = Some(id);
            }
            let next = Rc::clone(&run);
            run.painter
                .after(run.plan.frame_time, move || WaveRun::tick(next, 1));
        }
    }
}

/// State of one draft's rise while its job runs.
struct WaveRun {
    painter: Painter,
    draft: Draft,
    plan: WavePlan,
    /// What the wave clips, with that target's size.
    clip: Option<(Target, f64, f64)>,
    field: RefCell<WaveField>,
    bubbles: Vec<Bubble>,
    travel: Vec<Millis>,
    timers: RefCell<Vec<Option<TimerId>>>,
    finished: Cell<bool>,
    done: Completion,
}

impl WaveRun {
    fn begin(&self, mode: WavesMode, tint: &str) -> EdgeFxResult<()> {
        let Some((target, ..)) = &self.clip else {
            return Ok(());
        };
        let path = self.draft.path_target();
        match mode {
            WavesMode::Mask => {
                self.painter.opacity(target.clone(), 1.0)?;
                self.painter.show(target.clone(), true)?;
                self.painter.show(path.clone(), false)?;
                self.painter.emit(RenderCommand::SetFill {
                    target: path,
                    color: None,
                })?;
            }
            WavesMode::Overlay => {
                self.painter.show(path.clone(), true)?;
                self.painter.opacity(path.clone(), 1.0)?;
                self.painter.emit(RenderCommand::SetFill {
                    target: path,
                    color: Some(OVERLAY_FILL.to_string()),
                })?;
            }
        }
        self.draw_frame(0)?;
        for b in &self.bubbles {
            self.painter.emit(RenderCommand::CreateBubble {
                draft: self.draft.id,
                index: b.index,
                center: b.center,
                radius: b.radius,
                tint: tint.to_string(),
                opacity: b.opacity,
            })?;
        }
        Ok(())
    }

    fn draw_frame(&self, frame: usize) -> EdgeFxResult<()> {
        let Some((target, w, h)) = &self.clip else {
            return Ok(());
        };
        let level = (frame + 1) as f64 / self.plan.frames() as f64;
        let svg = self.field.borrow().outline(*w, *h, level).to_svg();
        self.painter.emit(RenderCommand::SetClip {
            target: target.clone(),
            svg: Some(svg),
        })
    }

    fn tick(run: Rc<Self>, frame: usize) {
        if run.done.is_resolved() {
            run.stop_bubbles();
            return;
        }
        if frame >= run.plan.frames() {
            if let Err(err) = run.finish() {
                run.done.fail(err.to_string());
            }
            return;
        }
        run.field.borrow_mut().advance(frame);
        if let Err(err) = run.draw_frame(frame) {
            run.stop_bubbles();
            run.done.fail(err.to_string());
            return;
        }
        let next = Rc::clone(&run);
        run.painter
            .after(run.plan.frame_time, move || Self::tick(next, frame + 1));
    }

    /// Sends bubble `i` up once more; it starts over from below until the wave is done.
    fn climb(run: Rc<Self>, i: usize) {
        run.timers.borrow_mut()[i] = None;
        if run.finished.get() || run.done.is_resolved() {
            return;
        }
        let target = bubble_target(&run.draft, i);
        let travel = run.travel[i];
        if let Err(err) = run
            .painter
            .tween(target, Property::TranslateY, 0.0, -run.bubbles[i].rise, travel)
        {
            tracing::warn!(%err, bubble = i, "bubble rise failed");
            return;
        }
        let next = Rc::clone(&run);
        let id = run.painter.after(travel, move || Self::climb(next, i));
        run.timers.borrow_mut()[i] = Some(id);
    }

    fn stop_bubbles(&self) {
        self.finished.set(true);
        for id in self.timers.borrow_mut().iter_mut().filter_map(Option::take) {
            self.painter.event_loop().cancel(id);
        }
    }

    fn finish(self: &Rc<Self>) -> EdgeFxResult<()> {
        self.stop_bubbles();
        if let Some((target, ..)) = &self.clip {
            self.painter.emit(RenderCommand::SetClip {
                target: target.clone(),
                svg: None,
            })?;
        }
        let fade = self.plan.frame_time;
        for b in &self.bubbles {
            self.painter.tween(
                bubble_target(&self.draft, b.index),
                Property::Opacity,
                b.opacity,
                0.0,
                fade,
            )?;
        }
        if !self.bubbles.is_empty() {
            let run = Rc::clone(self);
            self.painter.after(fade, move || {
                for b in &run.bubbles {
                    if let Err(err) = run.painter.show(bubble_target(&run.draft, b.index), false) {
                        tracing::warn!(%err, bubble = b.index, "failed to hide bubble");
                    }
                }
            });
        }
        tracing::debug!(
            draft = %self.draft.id,
            frames = self.plan.frames(),
            interval = %self.draft.timing.interval,
            "waves drawn"
        );
        let done = self.done.clone();
        self.painter.after(self.draft.timing.interval, move || {
            done.done();
        });
        Ok(())
    }
}

fn bubble_target(draft: &Draft, index: usize) -> Target {
    Target::Bubble {
        draft: draft.id,
        index,
    }
}

impl Effect for Waves {
    fn name(&self) -> &'static str {
        "waves"
    }

    fn queue(&self, draft: &Draft, scheduler: &mut Sequencer, env: EffectEnv<'_>) -> HandlerResult {
        let rng = Rng64::new(env.options.seed.wrapping_add(draft.id.0 as u64));
        let job = Job::new(self.job(
            draft.clone(),
            env.painter.clone(),
            env.options.presentation.mode,
            rng,
        ))
        .delay(draft.timing.delay)
        .label(format!("waves:{}", draft.element));
        scheduler.push(job, Ordering::from_parallel_flag(draft.timing.parallel))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/waves.rs"]
mod tests;
