//! User-visible status messages.

/// Default toast display duration in milliseconds.
const DEFAULT_DURATION_MS: u64 = 3000;

/// Error toast display duration in milliseconds (longer for visibility).
const ERROR_DURATION_MS: u64 = 6000;

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
    Warning,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub message: Option<String>,
    pub duration_ms: u64,
}

impl Toast {
    pub fn new(kind: ToastKind, title: impl Into<String>, message: Option<String>) -> Self {
        let duration_ms = match kind {
            ToastKind::Error => ERROR_DURATION_MS,
            _ => DEFAULT_DURATION_MS,
        };
        Self {
            kind,
            title: title.into(),
            message,
            duration_ms,
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(ToastKind::Success, title, None)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(ToastKind::Info, title, None)
    }

    pub fn warning_with(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToastKind::Warning, title, Some(message.into()))
    }

    pub fn error_with(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToastKind::Error, title, Some(message.into()))
    }

    /// Body text, empty when none.
    pub fn body(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

/// Delivers toasts to the user.
pub trait Notifier {
    fn notify(&mut self, toast: Toast);
}

/// [`Notifier`] that records toasts in memory instead of showing them.
///
/// Lets code that reports through a [`Notifier`] be checked without a
/// desktop notification service.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent toast.
    pub fn last(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    /// Toasts in the order they were shown.
    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

impl Notifier for ToastQueue {
    fn notify(&mut self, toast: Toast) {
        tracing::debug!(kind = ?toast.kind, title = %toast.title, "toast queued");
        self.toasts.push(toast);
    }
}
