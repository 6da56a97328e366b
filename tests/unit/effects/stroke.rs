use std::{cell::RefCell, rc::Rc};

use super::*;
use crate::{
    animation::ease::Ease,
    foundation::{
        core::{DraftId, Millis, Rect},
        rng::Rng64,
    },
    orchestrate::{
        options::{Interval, Opacity, Options, PresentationMode},
        scene::{Element, ElementSettings},
    },
    render::{recording::RecordingSurface, surface::Target},
    runtime::event_loop::EventLoop,
};

fn setup(mode: PresentationMode, ease: Ease) -> (Options, Draft) {
    let mut options = Options::default();
    options.presentation.mode = mode;
    options.presentation.duration = Millis(400);
    options.stroke.opacity = Opacity::Fixed(0.5);
    options.animation.duration = Millis(600);
    options.animation.interval = Interval::Fixed(Millis(100));
    options.animation.ease = ease;
    let settings = ElementSettings {
        stroke: options.stroke.clone(),
        animation: options.animation,
    };
    let el = Element::new("btn", Rect::new(10.0, 10.0, 60.0, 40.0));
    let draft = Draft::build(DraftId(3), &el, &settings, &mut Rng64::new(1)).unwrap();
    (options, draft)
}

fn play(mode: PresentationMode) -> (crate::sequencer::ScheduleReport, RecordingSurface, Draft) {
    play_eased(mode, Ease::Linear)
}

fn play_eased(
    mode: PresentationMode,
    ease: Ease,
) -> (crate::sequencer::ScheduleReport, RecordingSurface, Draft) {
    let (options, draft) = setup(mode, ease);
    let lp = EventLoop::new();
    let rec = Rc::new(RefCell::new(RecordingSurface::new()));
    let painter = Painter::new(rec.clone(), lp.clone());
    let mut seq = Sequencer::new(lp.clone());
    Stroke
        .queue(
            &draft,
            &mut seq,
            EffectEnv {
                painter: &painter,
                options: &options,
            },
        )
        .unwrap();
    assert_eq!(seq.slot_sizes(), vec![1]);

    let report = Rc::new(RefCell::new(None));
    let sink = report.clone();
    seq.start(Millis::ZERO, move |r| *sink.borrow_mut() = Some(r))
        .unwrap();
    lp.run_until_idle();
    let report = report.borrow_mut().take().unwrap();
    let rec = rec.borrow().clone();
    (report, rec, draft)
}

#[test]
fn dash_offset_runs_down_over_the_duration() {
    let (report, rec, draft) = play(PresentationMode::Showcase);
    assert!(report.is_clean());
    assert_eq!(report.outcomes[0].label.as_deref(), Some("stroke:btn"));
    assert_eq!(report.finished_at, Millis(700));

    let path = Target::Path { draft: DraftId(3) };
    let len = draft.outline.length();
    assert_eq!(rec.visible_at(&path, Millis(0)), Some(true));
    assert_eq!(rec.value_at(&path, Property::DashOffset, Millis(0)), Some(len));
    let mid = rec.value_at(&path, Property::DashOffset, Millis(300)).unwrap();
    assert!((mid - len / 2.0).abs() < 1e-9);
    assert_eq!(rec.value_at(&path, Property::DashOffset, Millis(600)), Some(0.0));
}

#[test]
fn configured_ease_shapes_the_dash_offset() {
    let (report, rec, draft) = play_eased(PresentationMode::Inline, Ease::QuadIn);
    assert!(report.is_clean());
    assert_eq!(report.finished_at, Millis(700));

    let path = Target::Path { draft: DraftId(3) };
    let len = draft.outline.length();
    // Quarter of the way through the curve at half time.
    let mid = rec.value_at(&path, Property::DashOffset, Millis(300)).unwrap();
    assert!((mid - len * 0.75).abs() < 1e-9, "{mid} vs {len}");
    assert_eq!(rec.value_at(&path, Property::DashOffset, Millis(600)), Some(0.0));
}

#[test]
fn showcase_reveals_element_and_fades_path() {
    let (_, rec, _) = play(PresentationMode::Showcase);
    let path = Target::Path { draft: DraftId(3) };
    let el = Target::element("btn");
    assert_eq!(rec.visible_at(&el, Millis(599)), None);
    assert_eq!(rec.visible_at(&el, Millis(600)), Some(true));
    assert_eq!(rec.value_at(&path, Property::Opacity, Millis(800)), Some(0.25));
}

#[test]
fn solo_leaves_the_element_alone() {
    let (report, rec, _) = play(PresentationMode::Solo);
    assert!(report.is_clean());
    assert_eq!(rec.commands_for(&Target::element("btn")).count(), 0);
}
