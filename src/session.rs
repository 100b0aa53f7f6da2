use crate::{
    config::{clamp_interval, clamp_max_taps, Settings},
    error::DispatchError,
    geometry::{area_center, hits_delete_handle, hits_target, scatter_point},
    notice::{Notice, SessionEvent},
    targets::{Target, TargetId, TargetStore},
};
use eframe::egui::{Pos2, Rect};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Inbound actions from the control panel and the work area.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    AddTarget(Option<Pos2>),
    AddBatch { count: usize, area: Rect },
    MoveTarget(TargetId, Pos2),
    DeleteTarget(TargetId),
    Select(Option<TargetId>),
    SetInterval(u64),
    SetMaxTaps(Option<u32>),
    StartStop,
    Reset,
}

/// What the scheduler should have armed right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub epoch: u64,
    pub interval: Duration,
}

/// Running flag, counters, selection and the target store. Every handler
/// leaves this consistent before returning.
#[derive(Debug)]
pub struct Session {
    store: TargetStore,
    selection: Option<TargetId>,
    running: bool,
    interval_ms: u64,
    max_taps: Option<u32>,
    total_taps: u64,
    dispatch_index: usize,
    // Bumped whenever the armed schedule must be torn down.
    epoch: u64,
    area: Rect,
    batch_size: usize,
    events: Vec<SessionEvent>,
}

impl Default for Session {
    fn default() -> Self { Self::new(Settings::default()) }
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            store: TargetStore::new(),
            selection: None,
            running: false,
            interval_ms: clamp_interval(settings.interval_ms),
            max_taps: settings.max_taps.map(clamp_max_taps),
            total_taps: 0,
            dispatch_index: 0,
            epoch: 0,
            area: Rect::NOTHING,
            batch_size: settings.batch_size.max(1),
            events: Vec::new(),
        }
    }

    pub fn targets(&self) -> &TargetStore { &self.store }
    pub fn selection(&self) -> Option<TargetId> { self.selection }
    pub fn is_running(&self) -> bool { self.running }
    pub fn interval_ms(&self) -> u64 { self.interval_ms }
    pub fn max_taps(&self) -> Option<u32> { self.max_taps }
    pub fn total_taps(&self) -> u64 { self.total_taps }
    pub fn dispatch_index(&self) -> usize { self.dispatch_index }
    pub fn batch_size(&self) -> usize { self.batch_size }
    pub fn area(&self) -> Rect { self.area }

    /// Work area the UI currently lays targets out in.
    pub fn set_area(&mut self, area: Rect) { self.area = area; }

    pub fn schedule(&self) -> Option<Schedule> {
        self.running.then(|| Schedule {
            epoch: self.epoch,
            interval: Duration::from_millis(self.interval_ms),
        })
    }

    /// `min(round(total / max * 100), 100)` when a bound is configured.
    pub fn progress_percent(&self) -> Option<u8> {
        self.max_taps.map(|max| {
            let pct = (self.total_taps as f64 / max as f64 * 100.0).round();
            pct.min(100.0) as u8
        })
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> { std::mem::take(&mut self.events) }

    fn notify(&mut self, notice: Notice) { self.events.push(SessionEvent::Notice(notice)); }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::AddTarget(pos) => { self.add_target(pos); }
            Action::AddBatch { count, area } => {
                self.add_batch(&mut rand::thread_rng(), count, area);
            }
            Action::MoveTarget(id, pos) => self.move_target(id, pos),
            Action::DeleteTarget(id) => { self.delete_target(id); }
            Action::Select(id) => self.select(id),
            Action::SetInterval(ms) => self.set_interval(ms),
            Action::SetMaxTaps(n) => self.set_max_taps(n),
            Action::StartStop => self.start_stop(),
            Action::Reset => self.reset(),
        }
    }

    // -------------- Targets --------------

    /// Adds a target (at the area centre when no position is given) and selects it.
    pub fn add_target(&mut self, position: Option<Pos2>) -> TargetId {
        let id = self.place_target(position.unwrap_or_else(|| area_center(self.area)));
        self.notify(Notice::TargetAdded);
        id
    }

    /// Empty-area tap: add and select without a notice.
    pub fn place_target(&mut self, position: Pos2) -> TargetId {
        let id = self.store.add(position);
        self.selection = Some(id);
        debug!(%id, x = position.x, y = position.y, "target added");
        id
    }

    /// Scatters `count` targets inside the inset of `area`. Selection is untouched.
    pub fn add_batch<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize, area: Rect) -> Vec<TargetId> {
        if count == 0 { return Vec::new(); }
        let positions: Vec<Pos2> = (0..count).map(|_| scatter_point(rng, area)).collect();
        let ids = self.store.add_many(positions);
        debug!(count, total = self.store.len(), "target batch added");
        self.notify(Notice::BatchAdded { count });
        ids
    }

    /// Unknown ids are ignored: a late drag move after a delete is a no-op.
    pub fn move_target(&mut self, id: TargetId, position: Pos2) {
        if !self.store.move_to(id, position) {
            debug!(%id, "move ignored for missing target");
        }
    }

    pub fn delete_target(&mut self, id: TargetId) -> bool {
        let Some(slot) = self.store.remove(id) else { return false };
        if self.selection == Some(id) { self.selection = None; }
        debug!(%id, slot, remaining = self.store.len(), "target deleted");
        self.notify(Notice::TargetDeleted);
        true
    }

    /// Selecting replaces any previous selection. Missing ids are ignored.
    pub fn select(&mut self, id: Option<TargetId>) {
        match id {
            Some(id) if !self.store.contains(id) => {}
            _ => self.selection = id,
        }
    }

    /// Topmost target under the pointer; later targets draw above earlier ones.
    pub fn target_at(&self, pointer: Pos2) -> Option<TargetId> {
        self.store.iter().rev().find(|t| hits_target(t.position, pointer)).map(|t| t.id)
    }

    /// Only the selected target shows a delete handle.
    pub fn delete_handle_at(&self, pointer: Pos2) -> Option<TargetId> {
        let target = self.selection.and_then(|id| self.store.get(id))?;
        hits_delete_handle(target.position, pointer).then_some(target.id)
    }

    // -------------- Settings --------------

    /// Clamped. Changing it while running re-arms the schedule with the new interval.
    pub fn set_interval(&mut self, ms: u64) {
        let ms = clamp_interval(ms);
        if ms == self.interval_ms { return; }
        self.interval_ms = ms;
        if self.running {
            self.epoch += 1;
            debug!(interval_ms = ms, "interval changed while running, re-arming");
        }
    }

    /// `None` runs unbounded.
    pub fn set_max_taps(&mut self, max: Option<u32>) {
        self.max_taps = max.map(clamp_max_taps);
    }

    // -------------- Run state --------------

    fn bound_reached(&self) -> bool {
        self.max_taps.is_some_and(|max| self.total_taps >= u64::from(max))
    }

    pub fn start(&mut self) -> Result<(), DispatchError> {
        if self.running { return Ok(()); }
        if self.store.is_empty() {
            return Err(DispatchError::NoTargets);
        }
        if let Some(max_taps) = self.max_taps.filter(|_| self.bound_reached()) {
            info!(max_taps, "bound already reached, not starting");
            self.notify(Notice::Completed { max_taps });
            return Ok(());
        }
        self.running = true;
        self.epoch += 1;
        info!(targets = self.store.len(), interval_ms = self.interval_ms, max_taps = ?self.max_taps, "dispatch started");
        self.notify(Notice::Started);
        Ok(())
    }

    pub fn stop(&mut self) {
        if !self.running { return; }
        self.running = false;
        self.epoch += 1;
        info!(total_taps = self.total_taps, "dispatch stopped");
        self.notify(Notice::Stopped);
    }

    pub fn start_stop(&mut self) {
        if self.running {
            self.stop();
            return;
        }
        if let Err(err) = self.start() {
            warn!(%err, "start rejected");
            self.running = false;
            self.notify(err.into());
        }
    }

    fn complete(&mut self) {
        self.running = false;
        self.epoch += 1;
        let max_taps = self.max_taps.unwrap_or_default();
        info!(max_taps, "tap bound reached");
        self.notify(Notice::Completed { max_taps });
    }

    /// Back to an empty, stopped session. Interval and bound are kept.
    pub fn reset(&mut self) {
        if self.running { self.epoch += 1; }
        self.running = false;
        self.store.clear();
        self.selection = None;
        self.total_taps = 0;
        self.dispatch_index = 0;
        info!("session reset");
        self.notify(Notice::Reset);
    }

    /// One scheduler firing. Returns the dispatched target, if any.
    pub fn tick(&mut self) -> Option<TargetId> {
        if !self.running { return None; }
        if self.bound_reached() {
            self.complete();
            return None;
        }
        let count = self.store.len();
        if count == 0 {
            debug!("tick with no targets");
            return None;
        }
        if self.dispatch_index >= count {
            self.dispatch_index %= count;
        }
        let Target { id, position } = *self.store.at(self.dispatch_index)?;
        self.events.push(SessionEvent::Tap { target: id, position });
        self.total_taps += 1;
        self.dispatch_index = (self.dispatch_index + 1) % count;
        debug!(%id, total_taps = self.total_taps, "tap");
        if self.bound_reached() { self.complete(); }
        Some(id)
    }
}
