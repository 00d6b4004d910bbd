//! Link-state change subscription

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// An active subscription to WiFi link-state transitions
///
/// At most one instance exists per peripheral at a time, owned by the
/// notify-enabled characteristic. The `connected` flag is updated only by
/// the backend's source task; events arrive in a single ordered channel,
/// one per transition. Closing (or dropping) the watch cancels the source
/// subscription.
pub struct ConnectionWatch {
    connected: Arc<AtomicBool>,
    events: Option<mpsc::UnboundedReceiver<bool>>,
    source: Option<JoinHandle<()>>,
}

impl ConnectionWatch {
    /// Assemble a watch from its parts
    ///
    /// `source` is the backend task feeding the channel; mocks pass `None`.
    pub(crate) fn new(
        connected: Arc<AtomicBool>,
        events: mpsc::UnboundedReceiver<bool>,
        source: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            connected,
            events: Some(events),
            source,
        }
    }

    /// Current known connected flag
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Take the transition event channel; `None` if already taken
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<bool>> {
        self.events.take()
    }

    /// Cancel the underlying subscription
    pub fn close(&mut self) {
        if let Some(source) = self.source.take() {
            source.abort();
        }
        self.events = None;
    }
}

impl Drop for ConnectionWatch {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ConnectionWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionWatch")
            .field("connected", &self.connected())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_watch_reports_flag_and_events() {
        let flag = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watch = ConnectionWatch::new(flag.clone(), rx, None);

        assert!(!watch.connected());

        flag.store(true, Ordering::SeqCst);
        tx.send(true).unwrap();

        assert!(watch.connected());
        let mut events = watch.take_events().unwrap();
        assert_eq!(events.recv().await, Some(true));
    }

    #[tokio::test]
    async fn test_events_taken_once() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut watch = ConnectionWatch::new(Arc::new(AtomicBool::new(false)), rx, None);

        assert!(watch.take_events().is_some());
        assert!(watch.take_events().is_none());
    }

    #[tokio::test]
    async fn test_close_aborts_source() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let source = tokio::spawn(std::future::pending::<()>());
        let mut watch = ConnectionWatch::new(Arc::new(AtomicBool::new(false)), rx, Some(source));

        watch.close();
        // close is idempotent
        watch.close();
    }
}
