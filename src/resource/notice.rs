use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Transient, dismisses itself
    Success,
    /// Blocking, stays until acknowledged
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    issued_at: Instant,
    lifetime: Option<Duration>,
}

impl Notice {
    pub fn success(message: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            issued_at: Instant::now(),
            lifetime: Some(lifetime),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            issued_at: Instant::now(),
            lifetime: None,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.kind == NoticeKind::Error
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        match self.lifetime {
            Some(lifetime) => now.saturating_duration_since(self.issued_at) < lifetime,
            None => true,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible_at(Instant::now())
    }
}
