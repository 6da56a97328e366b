use super::*;
use crate::{
    foundation::core::Rect,
    orchestrate::{
        options::{EffectConfig, Interval, Opacity, RippleOptions},
        scene::Element,
    },
    render::{recording::RecordingSurface, surface::Property},
    sequencer::JobStatus,
};

type Log = Rc<RefCell<Vec<String>>>;

fn options() -> Options {
    let mut o = Options::default();
    o.presentation.duration = Millis(300);
    o.presentation.delay = Millis(100);
    o.animation.interval = Interval::Fixed(Millis(200));
    o.stroke.opacity = Opacity::Fixed(0.5);
    o
}

fn card(id: &str, x: f64) -> Element {
    let mut el = Element::new(id, Rect::new(x, 0.0, x + 100.0, 50.0));
    el.background = true;
    el
}

fn scene(n: usize) -> Scene {
    Scene::new((0..n).map(|i| card(&format!("card{i}"), i as f64 * 200.0)).collect()).unwrap()
}

fn start(
    orch: Orchestrator,
    scene: Scene,
    options: Options,
) -> (RunHandle, Rc<RefCell<RecordingSurface>>, EventLoop) {
    let lp = EventLoop::new();
    let rec = Rc::new(RefCell::new(RecordingSurface::new()));
    let handle = orch.run(scene, options, rec.clone(), lp.clone()).unwrap();
    (handle, rec, lp)
}

fn log_events(orch: &mut Orchestrator, log: &Log, priority: i32) {
    for event in Lifecycle::ORDER {
        let log = log.clone();
        orch.bus_mut().add_handler(
            event.name(),
            handler(move |_: &mut RunContext, args: &LifecycleArgs| {
                let tag = match args {
                    LifecycleArgs::Queue(id) => format!("{event}:{}", id.0),
                    _ => event.to_string(),
                };
                log.borrow_mut().push(tag);
                Ok(())
            }),
            priority,
        );
    }
}

#[test]
fn single_box_showcase_timeline() {
    let (handle, rec, _lp) = start(Orchestrator::new(), scene(1), options());
    assert!(!handle.is_complete());
    let report = handle.wait(Pacing::Virtual).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].label.as_deref(), Some("stroke:card0"));
    assert_eq!(report.started_at, Millis(100));
    assert_eq!(report.finished_at, Millis(1300));

    let rec = rec.borrow();
    let path = Target::Path { draft: DraftId(0) };
    let el = Target::element("card0");
    assert_eq!(rec.visible_at(&Target::Root, Millis(0)), Some(true));
    assert_eq!(rec.visible_at(&el, Millis(500)), Some(false));
    assert_eq!(rec.visible_at(&path, Millis(50)), Some(false));
    assert_eq!(rec.visible_at(&path, Millis(100)), Some(true));
    assert_eq!(rec.value_at(&path, Property::DashOffset, Millis(100)), Some(300.0));
    assert_eq!(rec.value_at(&path, Property::DashOffset, Millis(600)), Some(150.0));
    assert_eq!(rec.value_at(&path, Property::DashOffset, Millis(1100)), Some(0.0));
    assert_eq!(rec.visible_at(&el, Millis(1100)), Some(true));
    assert_eq!(rec.value_at(&path, Property::Opacity, Millis(1250)), Some(0.25));

    let last = rec.entries().last().unwrap();
    assert_eq!(last.at, Millis(1300));
    assert_eq!(
        last.command,
        RenderCommand::SetPointerEvents {
            target: Target::Surface { draft: DraftId(0) },
            enabled: false
        }
    );
}

#[test]
fn lifecycle_fires_in_order_with_queue_once_per_draft() {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let mut orch = Orchestrator::new();
    log_events(&mut orch, &log, DEFAULT_PRIORITY);
    let (handle, _rec, _lp) = start(orch, scene(2), options());
    assert_eq!(
        *log.borrow(),
        ["ready", "init", "onload", "create", "queue:0", "queue:1", "animate"]
    );
    handle.wait(Pacing::Virtual).unwrap();
    assert_eq!(log.borrow().last().map(String::as_str), Some("complete"));
    assert_eq!(log.borrow().len(), 8);
}

#[test]
fn handlers_see_effect_jobs_by_priority() {
    let seen: Log = Rc::new(RefCell::new(Vec::new()));
    let mut orch = Orchestrator::new();
    for (priority, tag) in [(5, "before"), (20, "after")] {
        let seen = seen.clone();
        orch.bus_mut().add_handler(
            "queue",
            handler(move |ctx: &mut RunContext, _: &LifecycleArgs| {
                let jobs = ctx.sequencer.schedule().map_or(0, |s| s.job_count());
                seen.borrow_mut().push(format!("{tag}:{jobs}"));
                Ok(())
            }),
            priority,
        );
    }
    let (_handle, _rec, _lp) = start(orch, scene(2), options());
    assert_eq!(*seen.borrow(), ["before:0", "after:1", "before:1", "after:2"]);
}

#[test]
fn complete_handlers_receive_the_report() {
    let got = Rc::new(RefCell::new(None));
    let mut orch = Orchestrator::new();
    let sink = got.clone();
    orch.bus_mut().add_handler(
        "complete",
        handler(move |ctx: &mut RunContext, args: &LifecycleArgs| {
            if let LifecycleArgs::Complete(report) = args {
                *sink.borrow_mut() = Some((report.outcomes.len(), ctx.drafts.len()));
            }
            Ok(())
        }),
        DEFAULT_PRIORITY,
    );
    let (handle, _rec, _lp) = start(orch, scene(3), options());
    handle.wait(Pacing::Virtual);
    assert_eq!(*got.borrow(), Some((3, 3)));
}

#[test]
fn serial_animation_runs_drafts_one_after_another() {
    let mut o = options();
    o.animation.parallel = false;
    let (handle, rec, _lp) = start(Orchestrator::new(), scene(2), o);
    let report = handle.wait(Pacing::Virtual).unwrap();
    assert_eq!(report.finished_at, Millis(2500));
    let second = Target::Path { draft: DraftId(1) };
    assert_eq!(rec.borrow().visible_at(&second, Millis(1299)), Some(false));
    assert_eq!(rec.borrow().visible_at(&second, Millis(1300)), Some(true));
}

#[test]
fn parallel_animation_draws_every_draft_at_once() {
    let (handle, _rec, _lp) = start(Orchestrator::new(), scene(3), options());
    let report = handle.wait(Pacing::Virtual).unwrap();
    assert_eq!(report.finished_at, Millis(1300));
    assert!(report.outcomes.iter().all(|o| o.slot == 0));
}

#[test]
fn empty_selection_ends_after_ready() {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let mut orch = Orchestrator::new();
    log_events(&mut orch, &log, DEFAULT_PRIORITY);
    let plain = Scene::new(vec![Element::new("plain", Rect::new(0.0, 0.0, 5.0, 5.0))]).unwrap();
    let (handle, rec, lp) = start(orch, plain, options());
    assert!(handle.is_complete());
    assert!(handle.report().unwrap().outcomes.is_empty());
    assert_eq!(*log.borrow(), ["ready"]);
    assert!(lp.is_idle());
    let rec = rec.borrow();
    assert_eq!(rec.visible_at(&Target::Root, Millis(0)), Some(true));
    assert_eq!(rec.visible_at(&Target::element("plain"), Millis(0)), Some(true));
}

#[test]
fn failing_user_handler_does_not_derail_the_run() {
    let mut orch = Orchestrator::new();
    orch.bus_mut().add_handler(
        "create",
        handler(|_: &mut RunContext, _: &LifecycleArgs| anyhow::bail!("plugin exploded")),
        1,
    );
    let (handle, _rec, _lp) = start(orch, scene(1), options());
    assert!(handle.wait(Pacing::Virtual).unwrap().is_clean());
}

#[test]
fn cancel_mid_run_completes_with_cancelled_report() {
    let mut o = options();
    o.animation.parallel = false;
    let (handle, _rec, lp) = start(Orchestrator::new(), scene(2), o);
    lp.run_until(Millis(500));
    assert!(handle.cancel());
    let report = handle.wait(Pacing::Virtual).unwrap();
    assert!(report.cancelled);
    assert_eq!(report.finished_at, Millis(500));
    assert!(report.outcomes.iter().all(|o| o.status == JobStatus::Cancelled));
    assert!(lp.now() >= Millis(500));
}

#[test]
fn cancel_from_inside_a_handler_still_completes() {
    let mut orch = Orchestrator::new();
    orch.bus_mut().add_handler(
        "animate",
        handler(|ctx: &mut RunContext, _: &LifecycleArgs| {
            ctx.sequencer.cancel();
            Ok(())
        }),
        DEFAULT_PRIORITY,
    );
    let (handle, _rec, _lp) = start(orch, scene(1), options());
    let report = handle.wait(Pacing::Virtual).unwrap();
    assert!(report.cancelled);
}

#[test]
fn fadein_fades_root_then_element_and_hides_path() {
    let mut o = options();
    o.presentation.mode = PresentationMode::Fadein;
    let (handle, rec, _lp) = start(Orchestrator::new(), scene(1), o);
    handle.wait(Pacing::Virtual).unwrap();
    let rec = rec.borrow();
    let el = Target::element("card0");
    let path = Target::Path { draft: DraftId(0) };
    assert_eq!(rec.value_at(&Target::Root, Property::Opacity, Millis(150)), Some(0.5));
    assert_eq!(rec.value_at(&el, Property::Opacity, Millis(1100)), Some(0.0));
    assert_eq!(rec.value_at(&el, Property::Opacity, Millis(1250)), Some(0.5));
    assert_eq!(rec.visible_at(&path, Millis(1399)), Some(true));
    assert_eq!(rec.visible_at(&path, Millis(1400)), Some(false));
}

#[test]
fn inline_mode_leaves_root_alone() {
    let mut o = options();
    o.presentation.mode = PresentationMode::Inline;
    let (handle, rec, _lp) = start(Orchestrator::new(), scene(1), o);
    handle.wait(Pacing::Virtual).unwrap();
    assert_eq!(rec.borrow().commands_for(&Target::Root).count(), 0);
}

#[test]
fn ripple_runs_waves_through_a_nested_sequencer() {
    let mut o = options();
    o.effects = vec![EffectConfig::Ripple(RippleOptions {
        waves: 2,
        interval: Millis(50),
        ..RippleOptions::default()
    })];
    let (handle, rec, _lp) = start(Orchestrator::new(), scene(1), o);
    let report = handle.wait(Pacing::Virtual).unwrap();
    assert!(report.is_clean());
    // beat = 165ms: wave 0 draws 100..430, done 480; wave 1 draws 480..810, done 860;
    // then the draft interval of 200.
    assert_eq!(report.finished_at, Millis(1060));

    let rec = rec.borrow();
    let clones: Vec<f64> = rec
        .entries()
        .iter()
        .filter_map(|r| match &r.command {
            RenderCommand::ClonePath { opacity, .. } => Some(*opacity),
            _ => None,
        })
        .collect();
    assert_eq!(clones, vec![0.3125, 0.125]);
    let wave1 = Target::Clone {
        draft: DraftId(0),
        index: 1,
    };
    assert_eq!(rec.visible_at(&wave1, Millis(479)), Some(false));
    assert_eq!(rec.visible_at(&wave1, Millis(480)), Some(true));
    let reach = rec.value_at(&wave1, Property::ScaleX, Millis(810)).unwrap();
    assert!((reach - 1.2).abs() < 1e-9, "{reach}");
}

#[test]
fn waves_from_json_flood_the_element() {
    let json = r#"{
        "presentation": {"delay": 100},
        "stroke": {"opacity": 0.5},
        "animation": {"interval": 200},
        "effects": [{"kind": "waves", "duration": 1000, "fps": 10, "resolution": 1,
                     "bubbles": {"amount": 0}}]
    }"#;
    let o = Options::from_reader(json.as_bytes()).unwrap();
    assert_eq!(o.effects[0].name(), "waves");
    let (handle, rec, _lp) = start(Orchestrator::new(), scene(1), o);
    let report = handle.wait(Pacing::Virtual).unwrap();
    assert!(report.is_clean());
    // 12 frames of 100ms from the 100ms start delay, then the draft interval.
    assert_eq!(report.finished_at, Millis(1500));

    let rec = rec.borrow();
    let element = Target::element("card0");
    assert!(rec.clip_at(&element, Millis(700)).is_some());
    assert_eq!(rec.clip_at(&element, Millis(1300)), None);
    assert_eq!(rec.visible_at(&element, Millis(1400)), Some(true));
}

#[test]
fn invalid_options_are_rejected_up_front() {
    let mut o = options();
    o.stroke.width = f64::NAN;
    let lp = EventLoop::new();
    let rec = Rc::new(RefCell::new(RecordingSurface::new()));
    assert!(Orchestrator::new().run(scene(1), o, rec, lp.clone()).is_err());
    assert!(lp.is_idle());
}
