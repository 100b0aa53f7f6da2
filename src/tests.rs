use crate::{
    config::Settings,
    drag::{PointerEvent, PointerOutcome, PointerSource},
    notice::{Notice, SessionEvent},
    scheduler::Dispatcher,
    session::{Action, Session},
};
use eframe::egui::{Pos2, Rect, Vec2};
use std::{thread, time::{Duration, Instant}};

fn taps(events: &[SessionEvent]) -> Vec<Pos2> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Tap { position, .. } => Some(*position),
            SessionEvent::Notice(_) => None,
        })
        .collect()
}

fn notices(events: &[SessionEvent]) -> Vec<Notice> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Notice(n) => Some(n.clone()),
            SessionEvent::Tap { .. } => None,
        })
        .collect()
}

#[test]
fn test_three_targets_five_taps() {
    let mut session = Session::default();
    session.set_area(Rect::from_min_size(Pos2::ZERO, Vec2::new(300.0, 300.0)));
    let ids: Vec<_> = (0..3).map(|i| session.add_target(Some(Pos2::new(i as f32 * 100.0, 0.0)))).collect();
    session.apply(Action::SetInterval(100));
    session.apply(Action::SetMaxTaps(Some(5)));
    session.apply(Action::StartStop);

    let dispatched: Vec<_> = (0..5).filter_map(|_| session.tick()).collect();
    assert_eq!(dispatched, vec![ids[0], ids[1], ids[2], ids[0], ids[1]]);
    assert_eq!(session.total_taps(), 5);
    assert!(!session.is_running());
    assert_eq!(session.tick(), None);

    let events = session.take_events();
    assert_eq!(taps(&events).len(), 5);
    assert_eq!(notices(&events).last(), Some(&Notice::Completed { max_taps: 5 }));
}

#[test]
fn test_three_targets_five_taps_on_timer() {
    let mut dispatcher = Dispatcher::new(Session::new(Settings::default()));
    for x in [10.0, 20.0, 30.0] {
        dispatcher.apply(Action::AddTarget(Some(Pos2::new(x, 0.0))));
    }
    dispatcher.apply(Action::SetInterval(100));
    dispatcher.apply(Action::SetMaxTaps(Some(5)));
    dispatcher.session().lock().take_events();

    let started = Instant::now();
    dispatcher.apply(Action::StartStop);
    let deadline = started + Duration::from_secs(10);
    while dispatcher.session().lock().is_running() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    // five ticks at 100ms spacing cannot complete sooner
    assert!(started.elapsed() >= Duration::from_millis(500));

    let mut session = dispatcher.session().lock();
    assert!(!session.is_running());
    assert_eq!(session.total_taps(), 5);
    let events = session.take_events();
    let xs: Vec<f32> = taps(&events).iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![10.0, 20.0, 30.0, 10.0, 20.0]);
}

#[test]
fn test_start_with_no_targets_reports_once() {
    let mut dispatcher = Dispatcher::new(Session::default());
    dispatcher.apply(Action::StartStop);
    let mut session = dispatcher.session().lock();
    assert!(!session.is_running());
    let events = session.take_events();
    assert_eq!(notices(&events), vec![Notice::NoTargets]);
}

#[test]
fn test_reset_twice() {
    let mut dispatcher = Dispatcher::new(Session::default());
    dispatcher.apply(Action::AddBatch { count: 5, area: Rect::from_min_size(Pos2::ZERO, Vec2::new(200.0, 200.0)) });
    dispatcher.apply(Action::StartStop);
    dispatcher.apply(Action::Reset);
    dispatcher.apply(Action::Reset);

    let session = dispatcher.session().lock();
    assert!(!session.is_running());
    assert_eq!(session.total_taps(), 0);
    assert!(session.targets().is_empty());
    assert_eq!(session.selection(), None);
    assert!(!dispatcher.is_armed());
}

#[test]
fn test_drag_while_running() {
    let mut dispatcher = Dispatcher::new(Session::new(Settings { interval_ms: 50, max_taps: None, batch_size: 5 }));
    dispatcher.apply(Action::AddTarget(Some(Pos2::new(50.0, 50.0))));
    dispatcher.apply(Action::StartStop);

    let source = PointerSource::Mouse;
    let outcome = dispatcher.pointer(PointerEvent::Press { source, pos: Pos2::new(60.0, 55.0) });
    assert!(matches!(outcome, PointerOutcome::Grabbed(_)));
    dispatcher.pointer(PointerEvent::Move { source, pos: Pos2::new(80.0, 75.0) });
    dispatcher.session().lock().take_events();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    while seen.is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
        seen = taps(&dispatcher.session().lock().take_events());
    }
    dispatcher.pointer(PointerEvent::Release { source });
    dispatcher.apply(Action::StartStop);

    assert_eq!(seen.first(), Some(&Pos2::new(70.0, 70.0)));
    assert!(!dispatcher.drag().is_dragging());
}

#[test]
fn test_delete_during_run_keeps_ticking() {
    let mut dispatcher = Dispatcher::new(Session::new(Settings { interval_ms: 50, max_taps: None, batch_size: 5 }));
    for x in [0.0, 100.0, 200.0] {
        dispatcher.apply(Action::AddTarget(Some(Pos2::new(x, 0.0))));
    }
    dispatcher.apply(Action::StartStop);
    thread::sleep(Duration::from_millis(120));

    let doomed = dispatcher.session().lock().targets().ids();
    dispatcher.apply(Action::DeleteTarget(doomed[2]));
    dispatcher.apply(Action::DeleteTarget(doomed[1]));
    let before = dispatcher.session().lock().total_taps();
    thread::sleep(Duration::from_millis(200));

    let session = dispatcher.session().lock();
    assert!(session.is_running());
    assert!(session.total_taps() > before);
    assert_eq!(session.dispatch_index(), 0);
}
