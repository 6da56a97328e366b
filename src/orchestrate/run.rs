use std::{cell::RefCell, rc::Rc};

use anyhow::anyhow;

use crate::{
    effects::{self, Effect, EffectEnv},
    events::{DEFAULT_PRIORITY, EventBus, Lifecycle, handler},
    foundation::{
        core::{DraftId, Millis},
        error::EdgeFxResult,
        rng::Rng64,
    },
    orchestrate::{
        draft::Draft,
        options::{Options, PresentationMode},
        scene::{ElementSettings, Scene},
    },
    render::surface::{Painter, Property, RenderCommand, SharedSurface, Target},
    runtime::{
        cancel::CancelToken,
        event_loop::{EventLoop, Pacing},
    },
    sequencer::{ScheduleReport, Sequencer},
};

/// Payload handed to lifecycle handlers.
#[derive(Clone, Debug, PartialEq)]
pub enum LifecycleArgs {
    /// Ids of the selected elements (`ready`, `init`, `onload`, `create`, `animate`).
    Selection(Vec<String>),
    /// The draft being queued; find it with [`RunContext::draft`].
    Queue(DraftId),
    /// Outcome of the whole schedule.
    Complete(ScheduleReport),
}

/// State of one orchestration run, shared by every lifecycle handler.
#[derive(Debug)]
pub struct RunContext {
    pub options: Options,
    pub scene: Scene,
    /// Indices into `scene.elements`.
    pub selection: Vec<usize>,
    /// Resolved settings, parallel to `selection`.
    pub settings: Vec<ElementSettings>,
    pub drafts: Vec<Draft>,
    pub painter: Painter,
    pub sequencer: Sequencer,
    pub rng: Rng64,
    pub started_at: Millis,
}

impl RunContext {
    pub fn selection_ids(&self) -> Vec<String> {
        self.selection
            .iter()
            .filter_map(|i| self.scene.elements.get(*i))
            .map(|el| el.id.clone())
            .collect()
    }

    pub fn draft(&self, id: DraftId) -> Option<&Draft> {
        self.drafts.iter().find(|d| d.id == id)
    }

    pub fn mode(&self) -> PresentationMode {
        self.options.presentation.mode
    }
}

pub type LifecycleBus = EventBus<RunContext, LifecycleArgs>;

type SharedContext = Rc<RefCell<RunContext>>;
type ReportSlot = Rc<RefCell<Option<ScheduleReport>>>;

/// Live view of a started run.
#[derive(Clone, Debug)]
pub struct RunHandle {
    report: ReportSlot,
    cancel: CancelToken,
    event_loop: EventLoop,
}

impl RunHandle {
    /// The final report, once `complete` has fired (or the run ended with nothing to do).
    pub fn report(&self) -> Option<ScheduleReport> {
        self.report.borrow().clone()
    }

    pub fn is_complete(&self) -> bool {
        self.report.borrow().is_some()
    }

    /// Stops the run: pending jobs are skipped and `complete` fires with a degraded report.
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    /// Drives the event loop until it is idle and returns the report.
    pub fn wait(&self, pacing: Pacing) -> Option<ScheduleReport> {
        self.event_loop.run(pacing);
        self.report()
    }
}

/// Fires the lifecycle through a priority bus and drives the effect jobs.
///
/// Each lifecycle point first performs its built-in step, then dispatches the event. Handlers
/// added through [`Orchestrator::bus_mut`] see the same context as the built-in effects.
#[derive(Debug, Default)]
pub struct Orchestrator {
    bus: LifecycleBus,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bus the run will dispatch on; register custom handlers before [`Orchestrator::run`].
    pub fn bus_mut(&mut self) -> &mut LifecycleBus {
        &mut self.bus
    }

    pub fn bus(&self) -> &LifecycleBus {
        &self.bus
    }

    /// Starts a run. Everything up to `animate` happens before this returns; the rest unfolds
    /// as `event_loop` is driven.
    #[tracing::instrument(skip_all, fields(elements = scene.elements.len()))]
    pub fn run(
        mut self,
        scene: Scene,
        options: Options,
        surface: SharedSurface,
        event_loop: EventLoop,
    ) -> EdgeFxResult<RunHandle> {
        let options = options.validated()?;
        scene.validate()?;

        for config in &options.effects {
            register_effect(&mut self.bus, effects::build(config));
        }

        let sequencer = Sequencer::with_config(event_loop.clone(), options.sequencer);
        let handle = RunHandle {
            report: Rc::new(RefCell::new(None)),
            cancel: sequencer.cancel_token(),
            event_loop: event_loop.clone(),
        };
        let ctx: SharedContext = Rc::new(RefCell::new(RunContext {
            rng: Rng64::new(options.seed),
            selection: (0..scene.elements.len()).collect(),
            settings: Vec::new(),
            drafts: Vec::new(),
            painter: Painter::new(surface, event_loop.clone()),
            sequencer,
            started_at: event_loop.now(),
            options,
            scene,
        }));
        let bus = Rc::new(self.bus);

        ready(&ctx.borrow())?;
        fire(&bus, &ctx, Lifecycle::Ready);

        let selected = init(&mut ctx.borrow_mut())?;
        if !selected {
            tracing::info!("nothing matched the filter; run ends without animating");
            let now = event_loop.now();
            *handle.report.borrow_mut() = Some(ScheduleReport {
                started_at: now,
                finished_at: now,
                ..ScheduleReport::default()
            });
            return Ok(handle);
        }
        fire(&bus, &ctx, Lifecycle::Init);

        onload(&mut ctx.borrow_mut());
        fire(&bus, &ctx, Lifecycle::Onload);

        create(&mut ctx.borrow_mut())?;
        fire(&bus, &ctx, Lifecycle::Create);

        queue(&ctx.borrow())?;
        let ids: Vec<DraftId> = ctx.borrow().drafts.iter().map(|d| d.id).collect();
        for id in ids {
            dispatch(&bus, &ctx, Lifecycle::Queue, &LifecycleArgs::Queue(id));
        }

        animate(&bus, &ctx, &handle)?;
        fire(&bus, &ctx, Lifecycle::Animate);

        Ok(handle)
    }
}

fn register_effect(bus: &mut LifecycleBus, effect: Rc<dyn Effect>) {
    tracing::debug!(effect = effect.name(), "registering effect");
    let on_ready = Rc::clone(&effect);
    bus.add_handler(
        Lifecycle::Ready.name(),
        handler(move |ctx: &mut RunContext, _: &LifecycleArgs| on_ready.ready(ctx)),
        0,
    );
    bus.add_handler(
        Lifecycle::Queue.name(),
        handler(move |ctx: &mut RunContext, args: &LifecycleArgs| {
            let LifecycleArgs::Queue(id) = args else {
                return Ok(());
            };
            let RunContext {
                drafts,
                sequencer,
                painter,
                options,
                ..
            } = ctx;
            let draft = drafts
                .iter()
                .find(|d| d.id == *id)
                .ok_or_else(|| anyhow!("no {id} in this run"))?;
            effect.queue(draft, sequencer, EffectEnv { painter, options })
        }),
        DEFAULT_PRIORITY,
    );
}

fn dispatch(bus: &LifecycleBus, ctx: &SharedContext, event: Lifecycle, args: &LifecycleArgs) {
    let mut ctx = ctx.borrow_mut();
    bus.dispatch(event.name(), &mut ctx, args);
}

/// Dispatches `event` with the current selection.
fn fire(bus: &LifecycleBus, ctx: &SharedContext, event: Lifecycle) {
    tracing::info!(%event, "lifecycle");
    let args = LifecycleArgs::Selection(ctx.borrow().selection_ids());
    dispatch(bus, ctx, event, &args);
}

fn selection_targets(ctx: &RunContext) -> Vec<Target> {
    ctx.selection_ids().into_iter().map(Target::element).collect()
}

fn ready(ctx: &RunContext) -> EdgeFxResult<()> {
    match ctx.mode() {
        PresentationMode::Showcase | PresentationMode::Fadein | PresentationMode::Solo => {
            ctx.painter.show(Target::Root, false)?;
            for target in selection_targets(ctx) {
                ctx.painter.show(target, false)?;
            }
        }
        PresentationMode::Inline | PresentationMode::Hidden => {}
    }
    Ok(())
}

/// Narrows the selection; false when nothing is left.
fn init(ctx: &mut RunContext) -> EdgeFxResult<bool> {
    let picked = ctx.scene.select(&ctx.options.filter);
    tracing::debug!(
        candidates = ctx.selection.len(),
        selected = picked.len(),
        "filtered selection"
    );
    // Elements dropped by the filter were hidden at `ready`; put them back.
    if matches!(
        ctx.mode(),
        PresentationMode::Showcase | PresentationMode::Fadein | PresentationMode::Solo
    ) {
        for i in ctx.selection.iter().filter(|i| !picked.contains(i)) {
            if let Some(el) = ctx.scene.elements.get(*i) {
                ctx.painter.show(Target::element(el.id.clone()), true)?;
            }
        }
        if picked.is_empty() {
            ctx.painter.show(Target::Root, true)?;
        }
    }
    ctx.selection = picked;
    Ok(!ctx.selection.is_empty())
}

fn onload(ctx: &mut RunContext) {
    ctx.settings = ctx
        .selection
        .iter()
        .filter_map(|i| ctx.scene.elements.get(*i))
        .map(|el| el.overrides.apply(&ctx.options))
        .collect();
}

fn create(ctx: &mut RunContext) -> EdgeFxResult<()> {
    let mut drafts = Vec::with_capacity(ctx.selection.len());
    for (i, settings) in ctx.selection.iter().zip(&ctx.settings) {
        let Some(element) = ctx.scene.elements.get(*i) else {
            continue;
        };
        let id = DraftId(drafts.len());
        match Draft::build(id, element, settings, &mut ctx.rng) {
            Ok(draft) => drafts.push(draft),
            Err(err) => tracing::warn!(element = %element.id, %err, "skipping element"),
        }
    }
    for draft in &drafts {
        for command in draft.create_commands() {
            ctx.painter.emit(command)?;
        }
        ctx.painter.show(draft.path_target(), false)?;
    }
    tracing::debug!(drafts = drafts.len(), "drafts created");
    ctx.drafts = drafts;
    Ok(())
}

fn queue(ctx: &RunContext) -> EdgeFxResult<()> {
    let presentation = ctx.options.presentation;
    match presentation.mode {
        PresentationMode::Fadein => {
            ctx.painter.opacity(Target::Root, 0.0)?;
            ctx.painter.show(Target::Root, true)?;
            ctx.painter.tween(
                Target::Root,
                Property::Opacity,
                0.0,
                1.0,
                presentation.duration,
            )?;
        }
        PresentationMode::Showcase | PresentationMode::Solo => {
            ctx.painter.show(Target::Root, true)?;
        }
        PresentationMode::Inline | PresentationMode::Hidden => {}
    }
    Ok(())
}

fn animate(bus: &Rc<LifecycleBus>, ctx: &SharedContext, handle: &RunHandle) -> EdgeFxResult<()> {
    // The report may arrive synchronously from a cancel issued inside a handler, while the
    // context is still borrowed; finish on the next tick instead.
    let on_done = {
        let bus = Rc::clone(bus);
        let ctx = Rc::clone(ctx);
        let slot = Rc::clone(&handle.report);
        let event_loop = handle.event_loop.clone();
        move |report: ScheduleReport| {
            event_loop.defer(Millis::ZERO, move || complete(&bus, &ctx, &slot, report));
        }
    };
    let mut guard = ctx.borrow_mut();
    let delay = guard.options.presentation.delay;
    tracing::debug!(slots = ?guard.sequencer.slot_sizes(), %delay, "starting sequencer");
    guard.sequencer.start(delay, on_done)
}

fn complete(bus: &LifecycleBus, ctx: &SharedContext, slot: &ReportSlot, report: ScheduleReport) {
    {
        let ctx = ctx.borrow();
        if let Err(err) = finale(&ctx) {
            tracing::error!(%err, "final presentation failed");
        }
        tracing::info!(
            elapsed_ms = ctx.painter.now().saturating_sub(ctx.started_at).0,
            jobs = report.outcomes.len(),
            clean = report.is_clean(),
            cancelled = report.cancelled,
            "run complete"
        );
    }
    *slot.borrow_mut() = Some(report.clone());
    tracing::info!(event = %Lifecycle::Complete, "lifecycle");
    dispatch(bus, ctx, Lifecycle::Complete, &LifecycleArgs::Complete(report));
}

fn finale(ctx: &RunContext) -> EdgeFxResult<()> {
    let painter = &ctx.painter;
    match ctx.mode() {
        PresentationMode::Showcase => {
            painter.show(Target::Root, true)?;
            for target in selection_targets(ctx) {
                painter.show(target, true)?;
            }
        }
        PresentationMode::Fadein | PresentationMode::Inline => {
            for target in selection_targets(ctx) {
                painter.show(target, true)?;
            }
        }
        PresentationMode::Solo => {
            for draft in &ctx.drafts {
                painter.show(draft.path_target(), true)?;
            }
        }
        PresentationMode::Hidden => {}
    }
    for draft in &ctx.drafts {
        painter.emit(RenderCommand::SetPointerEvents {
            target: draft.surface_target(),
            enabled: false,
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/run.rs"]
mod tests;
