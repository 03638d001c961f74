//! Status line feedback shown in the top bar.

use eframe::egui::Color32;

/// Kind of feedback, which decides how it is colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

impl StatusKind {
    pub fn color(&self) -> Color32 {
        match self {
            Self::Info => Color32::GRAY,
            Self::Success => Color32::from_rgb(110, 200, 110),
            Self::Error => Color32::from_rgb(255, 90, 90),
        }
    }
}

/// A single line of user feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

impl Default for StatusMessage {
    fn default() -> Self {
        Self::info("Select an aquifer")
    }
}
