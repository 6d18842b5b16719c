use tracing::{error, info};

/// Category attached to error notifications, so the embedding UI can decide
/// how to present the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RequestFailed,
    TimeoutAutoSubmit,
}

/// Out-of-band notifications emitted by the core instead of calling into any
/// toast machinery directly. Field-scoped validation errors never go through
/// here; they are returned to the caller for inline rendering.
pub trait EventSink: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, kind: ErrorKind, message: &str);
}

/// Default sink: routes notifications to the log.
pub struct LogSink;

impl EventSink for LogSink {
    fn notify_success(&self, message: &str) {
        info!("{}", message);
    }

    fn notify_error(&self, kind: ErrorKind, message: &str) {
        error!("[{:?}] {}", kind, message);
    }
}
