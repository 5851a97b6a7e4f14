//! Event Listeners
//!
//! Synchronous fan-out of recorded events. Listeners run in registration
//! order; a listener that errors or panics is logged and skipped, and never
//! stops delivery to the rest or reaches the caller.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;
use tracing::warn;

use crate::security::event::SecurityEvent;

/// Failure reported by a listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Listener could not handle the event.
    #[error("listener failed: {0}")]
    Failed(String),
    /// Listener panicked during delivery.
    #[error("listener panicked: {0}")]
    Panicked(String),
}

/// Receiver of recorded security events.
pub trait SecurityListener: Send + Sync {
    /// Handle one event.
    fn on_event(&self, event: &SecurityEvent) -> Result<(), ListenerError>;
}

impl<F> SecurityListener for F
where
    F: Fn(&SecurityEvent) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_event(&self, event: &SecurityEvent) -> Result<(), ListenerError> {
        self(event)
    }
}

/// Handle returned on registration, used to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Ordered set of listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<(ListenerId, Box<dyn SecurityListener>)>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener at the end of the delivery order.
    pub fn register(&mut self, listener: Box<dyn SecurityListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver an event to every listener. Returns the number that failed.
    pub fn notify(&self, event: &SecurityEvent) -> usize {
        let mut failures = 0;

        for (id, listener) in &self.listeners {
            let outcome = catch_unwind(AssertUnwindSafe(|| listener.on_event(event)))
                .unwrap_or_else(|payload| Err(ListenerError::Panicked(panic_message(&*payload))));

            if let Err(e) = outcome {
                failures += 1;
                warn!("Listener {:?} failed on {} event {}: {}", id, event.kind, event.id, e);
            }
        }

        failures
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::event::{SecurityEventKind, Severity};
    use std::sync::{Arc, Mutex};

    fn event() -> SecurityEvent {
        SecurityEvent::new(SecurityEventKind::StateTampering, Severity::High, "test")
    }

    fn recorder(log: Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Box<dyn SecurityListener> {
        Box::new(move |_: &SecurityEvent| -> Result<(), ListenerError> {
            log.lock().unwrap().push(name);
            Ok(())
        })
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        registry.register(recorder(log.clone(), "first"));
        registry.register(recorder(log.clone(), "second"));

        assert_eq!(registry.notify(&event()), 0);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_failing_listener_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        registry.register(Box::new(|_: &SecurityEvent| -> Result<(), ListenerError> {
            Err(ListenerError::Failed("boom".into()))
        }));
        registry.register(Box::new(|_: &SecurityEvent| -> Result<(), ListenerError> {
            panic!("listener bug")
        }));
        registry.register(recorder(log.clone(), "survivor"));

        assert_eq!(registry.notify(&event()), 2);
        assert_eq!(*log.lock().unwrap(), vec!["survivor"]);
    }

    #[test]
    fn test_unregister() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        let id = registry.register(recorder(log.clone(), "gone"));
        registry.register(recorder(log.clone(), "kept"));

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert_eq!(registry.len(), 1);

        registry.notify(&event());
        assert_eq!(*log.lock().unwrap(), vec!["kept"]);
    }
}
