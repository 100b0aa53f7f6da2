use crate::{
    drag::{DragController, PointerEvent, PointerOutcome},
    session::{Action, Schedule, Session},
};
use parking_lot::Mutex;
use std::{sync::{atomic::{AtomicBool, Ordering}, Arc}, thread, time::Duration};
use tracing::{debug, trace};

/// Called after each applied tick so the UI can repaint.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

// Upper bound on how long a stopped job may keep sleeping.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

// -------------- Tap Job --------------

/// Worker thread for one armed schedule. Ticks are applied under the session
/// lock and only while the session still reports this job's epoch.
struct TapJob {
    running: Arc<AtomicBool>,
    schedule: Schedule,
}

impl TapJob {
    fn spawn(session: Arc<Mutex<Session>>, schedule: Schedule, waker: Option<Waker>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);

        debug!(epoch = schedule.epoch, interval_ms = schedule.interval.as_millis() as u64, "arming tap job");

        thread::spawn(move || {
            loop {
                if !sleep_while_running(&running_clone, schedule.interval) { break; }

                let keep_going = {
                    let mut s = session.lock();
                    // stop, reset and re-arm all bump the epoch while holding this lock
                    if !running_clone.load(Ordering::Relaxed) || s.schedule() != Some(schedule) {
                        None
                    } else {
                        s.tick();
                        Some(s.schedule() == Some(schedule))
                    }
                };
                let Some(keep_going) = keep_going else { break };
                if let Some(wake) = &waker { wake(); }
                if !keep_going { break; }
            }
            running_clone.store(false, Ordering::Relaxed);
            trace!(epoch = schedule.epoch, "tap job exited");
        });

        Self { running, schedule }
    }

    fn stop(&self) { self.running.store(false, Ordering::Relaxed); }
}

impl Drop for TapJob {
    fn drop(&mut self) { self.stop(); }
}

/// Sleeps `total` in short slices. Returns false if stopped meanwhile.
fn sleep_while_running(running: &AtomicBool, total: Duration) -> bool {
    let mut left = total;
    while !left.is_zero() {
        if !running.load(Ordering::Relaxed) { return false; }
        let step = left.min(SLEEP_SLICE);
        thread::sleep(step);
        left -= step;
    }
    running.load(Ordering::Relaxed)
}

// -------------- Dispatcher --------------

/// Owns the shared session and keeps exactly one tap job armed while it runs.
pub struct Dispatcher {
    session: Arc<Mutex<Session>>,
    drag: DragController,
    job: Option<TapJob>,
    waker: Option<Waker>,
}

impl Dispatcher {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            drag: DragController::new(),
            job: None,
            waker: None,
        }
    }

    pub fn with_waker(mut self, waker: Waker) -> Self {
        self.waker = Some(waker);
        self
    }

    pub fn session(&self) -> &Arc<Mutex<Session>> { &self.session }

    pub fn drag(&self) -> &DragController { &self.drag }

    pub fn is_armed(&self) -> bool {
        self.job.as_ref().is_some_and(|job| job.running.load(Ordering::Relaxed))
    }

    pub fn apply(&mut self, action: Action) {
        if matches!(action, Action::Reset) { self.drag.cancel(); }
        self.session.lock().apply(action);
        self.sync();
    }

    pub fn pointer(&mut self, event: PointerEvent) -> PointerOutcome {
        let outcome = {
            let mut s = self.session.lock();
            self.drag.handle(&mut s, event)
        };
        self.sync();
        outcome
    }

    /// Arms, re-arms or disarms the tap job to match the session.
    pub fn sync(&mut self) {
        let wanted = self.session.lock().schedule();
        let current = self.job.as_ref().map(|job| job.schedule);
        if wanted == current { return; }

        if let Some(job) = self.job.take() { job.stop(); }
        if let Some(schedule) = wanted {
            self.job = Some(TapJob::spawn(Arc::clone(&self.session), schedule, self.waker.clone()));
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() { job.stop(); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use eframe::egui::Pos2;
    use std::{sync::atomic::AtomicUsize, time::Instant};

    fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if done() { return true; }
            thread::sleep(Duration::from_millis(5));
        }
        done()
    }

    fn dispatcher_with(targets: usize, max_taps: Option<u32>) -> Dispatcher {
        let mut session = Session::new(Settings { interval_ms: 50, max_taps, batch_size: 5 });
        for i in 0..targets {
            session.place_target(Pos2::new(i as f32, 0.0));
        }
        Dispatcher::new(session)
    }

    #[test]
    fn test_job_stops_at_bound() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let mut dispatcher = dispatcher_with(3, Some(3))
            .with_waker(Arc::new(move || { counter.fetch_add(1, Ordering::Relaxed); }));

        dispatcher.apply(Action::StartStop);
        assert!(dispatcher.is_armed());
        let session = Arc::clone(dispatcher.session());
        assert!(wait_until(Duration::from_secs(5), || !session.lock().is_running()));

        thread::sleep(Duration::from_millis(150));
        assert_eq!(session.lock().total_taps(), 3);
        assert!(wakes.load(Ordering::Relaxed) >= 3);
        // the worker disarms itself without waiting for the next sync
        assert!(!dispatcher.is_armed());
    }

    #[test]
    fn test_stale_job_exits_without_waking() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let mut dispatcher = dispatcher_with(2, None)
            .with_waker(Arc::new(move || { counter.fetch_add(1, Ordering::Relaxed); }));

        dispatcher.apply(Action::StartStop);
        // stopped behind the dispatcher's back: the job only learns from the epoch
        dispatcher.session().lock().stop();
        let disarmed = wait_until(Duration::from_secs(5), || !dispatcher.is_armed());

        assert!(disarmed);
        assert_eq!(wakes.load(Ordering::Relaxed), 0);
        assert_eq!(dispatcher.session().lock().total_taps(), 0);
    }

    #[test]
    fn test_stop_cancels_pending_tick() {
        let mut dispatcher = dispatcher_with(2, None);
        dispatcher.apply(Action::StartStop);
        dispatcher.apply(Action::StartStop);
        assert!(!dispatcher.is_armed());
        thread::sleep(Duration::from_millis(150));
        assert_eq!(dispatcher.session().lock().total_taps(), 0);
    }

    #[test]
    fn test_no_targets_arms_nothing() {
        let mut dispatcher = dispatcher_with(0, None);
        dispatcher.apply(Action::StartStop);
        assert!(!dispatcher.is_armed());
        assert!(!dispatcher.session().lock().is_running());
    }

    #[test]
    fn test_interval_change_rearms() {
        let mut dispatcher = dispatcher_with(1, None);
        dispatcher.apply(Action::StartStop);
        let first = dispatcher.job.as_ref().map(|j| j.schedule);
        dispatcher.apply(Action::SetInterval(500));
        let second = dispatcher.job.as_ref().map(|j| j.schedule);
        assert_ne!(first, second);
        assert_eq!(second.map(|s| s.interval), Some(Duration::from_millis(500)));
        dispatcher.apply(Action::Reset);
        assert!(!dispatcher.is_armed());
    }

    #[test]
    fn test_sleep_while_running_observes_stop() {
        let running = AtomicBool::new(false);
        let started = Instant::now();
        assert!(!sleep_while_running(&running, Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
