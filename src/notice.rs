use crate::{error::DispatchError, targets::TargetId};
use eframe::egui::Pos2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel { Success, Info, Error }

/// User-facing notices the session raises for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Started,
    Stopped,
    Completed { max_taps: u32 },
    NoTargets,
    TargetAdded,
    BatchAdded { count: usize },
    TargetDeleted,
    Reset,
}

impl Notice {
    pub fn level(&self) -> NoticeLevel {
        match self {
            Notice::Stopped => NoticeLevel::Info,
            Notice::NoTargets => NoticeLevel::Error,
            _ => NoticeLevel::Success,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::Started => "Auto tap started".to_string(),
            Notice::Stopped => "Auto tap stopped".to_string(),
            Notice::Completed { max_taps } => format!("Finished {max_taps} taps!"),
            Notice::NoTargets => DispatchError::NoTargets.to_string(),
            Notice::TargetAdded => "New target added".to_string(),
            Notice::BatchAdded { count } => format!("Added {count} targets"),
            Notice::TargetDeleted => "Target deleted".to_string(),
            Notice::Reset => "Everything has been reset".to_string(),
        }
    }
}

impl From<DispatchError> for Notice {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NoTargets => Notice::NoTargets,
        }
    }
}

/// Outbound event queue entry, drained by the UI each frame.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// One dispatch at a target's position at tick time.
    Tap { target: TargetId, position: Pos2 },
    Notice(Notice),
}
