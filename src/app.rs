use crate::{
    config::{self, Settings},
    drag::{PointerEvent, PointerSource},
    geometry::{delete_handle_center, DELETE_HANDLE_RADIUS, TARGET_RADIUS},
    notice::{Notice, NoticeLevel, SessionEvent},
    scheduler::Dispatcher,
    session::{Action, Session},
    targets::{Target, TargetId},
};
use eframe::{egui, egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Vec2}};
use std::{sync::Arc, time::{Duration, Instant}};

const RIPPLE_LIFETIME: Duration = Duration::from_millis(600);
const TOAST_LIFETIME: Duration = Duration::from_millis(2500);

const ACCENT: Color32 = Color32::from_rgb(90, 140, 255);
const MUTED: Color32 = Color32::from_gray(110);
const DANGER: Color32 = Color32::from_rgb(220, 70, 70);

struct Ripple { pos: Pos2, born: Instant }

struct Toast { notice: Notice, born: Instant }

/// What the work area needs to draw one frame.
struct Snapshot {
    targets: Vec<Target>,
    selection: Option<TargetId>,
    running: bool,
    interval_ms: u64,
    max_taps: Option<u32>,
    total_taps: u64,
    progress: Option<u8>,
    batch_size: usize,
    /// 0-based slot the next tick dispatches.
    next: Option<usize>,
}

impl Snapshot {
    fn of(session: &Session) -> Self {
        Self {
            targets: session.targets().iter().copied().collect(),
            selection: session.selection(),
            running: session.is_running(),
            interval_ms: session.interval_ms(),
            max_taps: session.max_taps(),
            total_taps: session.total_taps(),
            progress: session.progress_percent(),
            batch_size: session.batch_size(),
            next: (!session.targets().is_empty())
                .then(|| session.dispatch_index() % session.targets().len()),
        }
    }
}

pub struct TapApp {
    dispatcher: Dispatcher,
    ripples: Vec<Ripple>,
    toasts: Vec<Toast>,
    panel_minimized: bool,
    // restored when the tap limit is switched back on
    last_max_taps: u32,
}

impl TapApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        let ctx = cc.egui_ctx.clone();
        let dispatcher = Dispatcher::new(Session::new(settings))
            .with_waker(Arc::new(move || ctx.request_repaint()));
        Self {
            dispatcher,
            ripples: Vec::new(),
            toasts: Vec::new(),
            panel_minimized: false,
            last_max_taps: settings.max_taps.unwrap_or(config::DEFAULT_MAX_TAPS),
        }
    }

    fn drain_events(&mut self) {
        let now = Instant::now();
        let events = self.dispatcher.session().lock().take_events();
        for event in events {
            match event {
                SessionEvent::Tap { position, .. } => self.ripples.push(Ripple { pos: position, born: now }),
                SessionEvent::Notice(notice) => self.toasts.push(Toast { notice, born: now }),
            }
        }
        self.ripples.retain(|r| now.duration_since(r.born) < RIPPLE_LIFETIME);
        self.toasts.retain(|t| now.duration_since(t.born) < TOAST_LIFETIME);
    }

    /// Feeds raw pointer input to the drag controller. Presses only count
    /// inside the work area; moves and releases are tracked everywhere.
    fn route_pointer(&mut self, ctx: &egui::Context, work: Rect) {
        let (events, touching) = ctx.input(|i| (i.events.clone(), i.any_touches()));
        let fresh = if touching { PointerSource::Touch } else { PointerSource::Mouse };

        for event in &events {
            let active = self.dispatcher.drag().gesture().map(|g| g.source);
            if let Some(routed) = translate_pointer(event, work, fresh, active) {
                self.dispatcher.pointer(routed);
            }
        }
    }

    fn header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Tap Dispatcher");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let label = if self.panel_minimized { "Show settings" } else { "Hide settings" };
                if ui.button(label).clicked() { self.panel_minimized = !self.panel_minimized; }
            });
        });
    }

    fn controls(&mut self, ui: &mut egui::Ui, snap: &Snapshot) {
        let mut actions = Vec::new();

        ui.horizontal(|ui| {
            ui.label("Targets:");
            ui.strong(snap.targets.len().to_string());
            if let Some(index) = snap.selection.and_then(|id| snap.targets.iter().position(|t| t.id == id)) {
                ui.label("|");
                ui.label("Selected:");
                ui.strong((index + 1).to_string());
            }
            if let Some(next) = snap.next.filter(|_| snap.running) {
                ui.label("|");
                ui.label("Next:");
                ui.strong((next + 1).to_string());
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let status = if self.dispatcher.is_armed() { "Running" } else { "Stopped" };
                ui.label(format!("Status: {status}"));
            });
        });
        ui.separator();

        ui.horizontal_wrapped(|ui| {
            ui.group(|ui| {
                ui.label("Interval (ms)");
                if let Some(ms) = stepper(ui, snap.interval_ms, config::INTERVAL_STEP_MS, config::MIN_INTERVAL_MS, config::MAX_INTERVAL_MS) {
                    actions.push(Action::SetInterval(ms));
                }
            });

            ui.group(|ui| {
                let mut limited = snap.max_taps.is_some();
                if ui.checkbox(&mut limited, "Limit taps").clicked() {
                    actions.push(Action::SetMaxTaps(limited.then_some(self.last_max_taps)));
                }
                if let Some(max) = snap.max_taps {
                    let step = u64::from(config::MAX_TAPS_STEP);
                    let (lo, hi) = (u64::from(config::MIN_MAX_TAPS), u64::from(config::MAX_MAX_TAPS));
                    if let Some(n) = stepper(ui, u64::from(max), step, lo, hi) {
                        let n = u32::try_from(n).unwrap_or(config::MAX_MAX_TAPS);
                        self.last_max_taps = n;
                        actions.push(Action::SetMaxTaps(Some(n)));
                    }
                }
            });

            ui.group(|ui| {
                ui.label("Total taps");
                ui.strong(snap.total_taps.to_string());
            });
        });

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let start_label = if snap.running { "⏸ Stop" } else { "▶ Start" };
            if ui.button(start_label).clicked() { actions.push(Action::StartStop); }
            if ui.button("+ Add Target").clicked() { actions.push(Action::AddTarget(None)); }
            if ui.button(format!("+ Add {} Targets", snap.batch_size)).clicked() {
                let area = self.dispatcher.session().lock().area();
                actions.push(Action::AddBatch { count: snap.batch_size, area });
            }
            if ui.button("⟲ Reset").clicked() { actions.push(Action::Reset); }
        });

        for action in actions { self.dispatcher.apply(action); }
    }

    fn paint_work_area(&self, painter: &egui::Painter, work: Rect, snap: &Snapshot) {
        let to_screen = |p: Pos2| work.min + p.to_vec2();
        let dragging = self.dispatcher.drag().dragging();
        let font = FontId::proportional(18.0);

        for (index, target) in snap.targets.iter().enumerate() {
            let center = to_screen(target.position);
            let selected = snap.selection == Some(target.id);
            let radius = if dragging == Some(target.id) { TARGET_RADIUS * 1.1 } else { TARGET_RADIUS };
            let (fill, stroke) = if selected {
                (ACCENT.linear_multiply(0.15), Stroke::new(2.0, ACCENT))
            } else {
                (Color32::from_black_alpha(120), Stroke::new(2.0, MUTED))
            };
            painter.circle(center, radius, fill, stroke);
            painter.text(center, Align2::CENTER_CENTER, (index + 1).to_string(), font.clone(), Color32::WHITE);

            if selected {
                let handle = to_screen(delete_handle_center(target.position));
                painter.circle_filled(handle, DELETE_HANDLE_RADIUS, DANGER);
                painter.text(handle, Align2::CENTER_CENTER, "×", FontId::proportional(14.0), Color32::WHITE);
            }
        }

        let now = Instant::now();
        for ripple in &self.ripples {
            let t = now.duration_since(ripple.born).as_secs_f32() / RIPPLE_LIFETIME.as_secs_f32();
            let t = t.clamp(0.0, 1.0);
            let alpha = (0.8 * (1.0 - t) * 255.0) as u8;
            painter.circle_filled(to_screen(ripple.pos), 32.0 * t, Color32::from_rgba_unmultiplied(90, 140, 255, alpha / 4));
            painter.circle_stroke(to_screen(ripple.pos), 32.0 * t, Stroke::new(1.5, Color32::from_rgba_unmultiplied(90, 140, 255, alpha)));
        }

        if snap.targets.is_empty() {
            painter.text(work.center(), Align2::CENTER_CENTER, "Tap anywhere to place a target", font, MUTED);
        }
    }

    fn progress_badge(&self, ctx: &egui::Context, snap: &Snapshot) {
        if !snap.running { return; }
        let text = match (snap.progress, snap.max_taps) {
            (Some(pct), Some(max)) => format!("{pct}% done ({}/{max})", snap.total_taps),
            _ => format!("{} taps", snap.total_taps),
        };
        egui::Area::new(egui::Id::new("progress"))
            .anchor(Align2::RIGHT_TOP, Vec2::new(-12.0, 48.0))
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).fill(ACCENT).show(ui, |ui| {
                    ui.colored_label(Color32::WHITE, text);
                });
            });
    }

    fn toasts(&self, ctx: &egui::Context) {
        if self.toasts.is_empty() { return; }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(Align2::CENTER_TOP, Vec2::new(0.0, 48.0))
            .interactable(false)
            .show(ctx, |ui| {
                for toast in &self.toasts {
                    let color = match toast.notice.level() {
                        NoticeLevel::Success => Color32::from_rgb(80, 190, 120),
                        NoticeLevel::Info => Color32::LIGHT_GRAY,
                        NoticeLevel::Error => DANGER,
                    };
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.colored_label(color, toast.notice.message());
                    });
                }
            });
    }
}

/// Maps one egui input event to a layout-local pointer event. `active` is the
/// source of the gesture in flight; moves and releases keep using it. Leaving
/// the window is not a release.
fn translate_pointer(
    event: &egui::Event,
    work: Rect,
    fresh: PointerSource,
    active: Option<PointerSource>,
) -> Option<PointerEvent> {
    let to_local = |p: Pos2| p - work.min.to_vec2();
    let source = active.unwrap_or(fresh);
    match *event {
        egui::Event::PointerButton { pos, button: egui::PointerButton::Primary, pressed: true, .. } => {
            work.contains(pos).then(|| PointerEvent::Press { source: fresh, pos: to_local(pos) })
        }
        egui::Event::PointerButton { button: egui::PointerButton::Primary, pressed: false, .. } => {
            Some(PointerEvent::Release { source })
        }
        egui::Event::PointerMoved(pos) => Some(PointerEvent::Move { source, pos: to_local(pos) }),
        _ => None,
    }
}

/// -/+ number control clamped to `[min, max]`. Returns the new value on change.
fn stepper(ui: &mut egui::Ui, value: u64, step: u64, min: u64, max: u64) -> Option<u64> {
    let mut changed = None;
    ui.horizontal(|ui| {
        if ui.add_enabled(value > min, egui::Button::new("−")).clicked() {
            changed = Some(value.saturating_sub(step).max(min));
        }
        ui.monospace(value.to_string());
        if ui.add_enabled(value < max, egui::Button::new("+")).clicked() {
            changed = Some(value.saturating_add(step).min(max));
        }
    });
    changed
}

impl eframe::App for TapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.dispatcher.sync();
        self.drain_events();
        let snap = Snapshot::of(&self.dispatcher.session().lock());

        egui::TopBottomPanel::top("top").show(ctx, |ui| self.header(ui));

        egui::TopBottomPanel::bottom("controls").show_animated(ctx, !self.panel_minimized, |ui| {
            ui.add_space(6.0);
            self.controls(ui, &snap);
            ui.add_space(6.0);
        });

        let work = egui::CentralPanel::default()
            .show(ctx, |ui| {
                let (work, _) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
                work
            })
            .inner;

        self.dispatcher.session().lock().set_area(work);
        self.route_pointer(ctx, work);

        // pointer handling may have moved, placed or deleted targets
        self.drain_events();
        let snap = Snapshot::of(&self.dispatcher.session().lock());
        let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Middle, egui::Id::new("work_area"))).with_clip_rect(work);
        self.paint_work_area(&painter, work, &snap);
        self.progress_badge(ctx, &snap);
        self.toasts(ctx);

        if !self.ripples.is_empty() || !self.toasts.is_empty() || self.dispatcher.drag().is_dragging() {
            ctx.request_repaint();
        }
    }
}
