//! Per-event listener registry
//!
//! Subscribers register one callback per event kind they care about; every
//! kind keeps its own ordered list, and all callbacks for a kind run in
//! registration order on the socket's driver task. A registration is
//! identified by a [`ListenerId`], which is the token used to unsubscribe.
//!
//! Single-slot handlers (the `set_*_handler` methods on the socket) are a
//! convenience layered on top of this registry: the socket remembers one
//! listener id per event kind and replaces it on every call.

use std::fmt;

use eversocket_core::event::{CloseFrame, ConnectingEvent, ErrorEvent, EventKind, OpenEvent};
use eversocket_core::message::Message;

/// Token identifying one listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

pub(crate) type Callback<E> = Box<dyn FnMut(&E) + Send>;

/// A typed callback waiting to be installed, tagged by event kind
pub(crate) enum Subscription {
    Connecting(Callback<ConnectingEvent>),
    Open(Callback<OpenEvent>),
    Close(Callback<CloseFrame>),
    Message(Callback<Message>),
    Error(Callback<ErrorEvent>),
}

impl Subscription {
    pub(crate) fn kind(&self) -> EventKind {
        match self {
            Subscription::Connecting(_) => EventKind::Connecting,
            Subscription::Open(_) => EventKind::Open,
            Subscription::Close(_) => EventKind::Close,
            Subscription::Message(_) => EventKind::Message,
            Subscription::Error(_) => EventKind::Error,
        }
    }
}

struct Registry<E> {
    entries: Vec<(ListenerId, Callback<E>)>,
}

impl<E> Registry<E> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn insert(&mut self, id: ListenerId, callback: Callback<E>) {
        self.entries.push((id, callback));
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    fn emit(&mut self, event: &E) {
        for (_, callback) in &mut self.entries {
            callback(event);
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// All listener registries of one socket, owned by its driver task
pub(crate) struct Listeners {
    connecting: Registry<ConnectingEvent>,
    open: Registry<OpenEvent>,
    close: Registry<CloseFrame>,
    message: Registry<Message>,
    error: Registry<ErrorEvent>,
    slots: [Option<ListenerId>; 5],
}

fn slot_index(kind: EventKind) -> usize {
    match kind {
        EventKind::Connecting => 0,
        EventKind::Open => 1,
        EventKind::Close => 2,
        EventKind::Message => 3,
        EventKind::Error => 4,
    }
}

impl Listeners {
    pub(crate) fn new() -> Self {
        Self {
            connecting: Registry::new(),
            open: Registry::new(),
            close: Registry::new(),
            message: Registry::new(),
            error: Registry::new(),
            slots: [None; 5],
        }
    }

    /// Install a listener. When `single_slot` is set, any previous
    /// single-slot listener for the same event kind is removed first.
    pub(crate) fn insert(&mut self, id: ListenerId, subscription: Subscription, single_slot: bool) {
        if single_slot {
            let slot = slot_index(subscription.kind());
            if let Some(previous) = self.slots[slot].replace(id) {
                self.remove(previous);
            }
        }
        match subscription {
            Subscription::Connecting(callback) => self.connecting.insert(id, callback),
            Subscription::Open(callback) => self.open.insert(id, callback),
            Subscription::Close(callback) => self.close.insert(id, callback),
            Subscription::Message(callback) => self.message.insert(id, callback),
            Subscription::Error(callback) => self.error.insert(id, callback),
        }
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        for slot in &mut self.slots {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        self.connecting.remove(id)
            || self.open.remove(id)
            || self.close.remove(id)
            || self.message.remove(id)
            || self.error.remove(id)
    }

    pub(crate) fn emit_connecting(&mut self, event: &ConnectingEvent) {
        self.connecting.emit(event);
    }

    pub(crate) fn emit_open(&mut self, event: &OpenEvent) {
        self.open.emit(event);
    }

    pub(crate) fn emit_close(&mut self, event: &CloseFrame) {
        self.close.emit(event);
    }

    pub(crate) fn emit_message(&mut self, event: &Message) {
        self.message.emit(event);
    }

    pub(crate) fn emit_error(&mut self, event: &ErrorEvent) {
        self.error.emit(event);
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("connecting", &self.connecting.len())
            .field("open", &self.open.len())
            .field("close", &self.close.len())
            .field("message", &self.message.len())
            .field("error", &self.error.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_subscription(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> Subscription {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        Subscription::Message(Box::new(move |message: &Message| {
            log.lock()
                .unwrap()
                .push(format!("{}:{}", tag, message.as_text().unwrap_or("")));
        }))
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::new();
        listeners.insert(ListenerId::new(1), recording_subscription(&log, "first"), false);
        listeners.insert(ListenerId::new(2), recording_subscription(&log, "second"), false);

        listeners.emit_message(&Message::text("hi"));

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:hi".to_string(), "second:hi".to_string()]
        );
    }

    #[test]
    fn test_listener_removal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::new();
        listeners.insert(ListenerId::new(1), recording_subscription(&log, "kept"), false);
        listeners.insert(ListenerId::new(2), recording_subscription(&log, "gone"), false);

        assert!(listeners.remove(ListenerId::new(2)));
        assert!(!listeners.remove(ListenerId::new(2)));

        listeners.emit_message(&Message::text("x"));
        assert_eq!(*log.lock().unwrap(), vec!["kept:x".to_string()]);
    }

    #[test]
    fn test_single_slot_replaces_previous() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::new();
        listeners.insert(ListenerId::new(1), recording_subscription(&log, "old"), true);
        listeners.insert(ListenerId::new(2), recording_subscription(&log, "new"), true);

        listeners.emit_message(&Message::text("x"));
        assert_eq!(*log.lock().unwrap(), vec!["new:x".to_string()]);
    }

    #[test]
    fn test_single_slot_does_not_touch_plain_listeners() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::new();
        listeners.insert(ListenerId::new(1), recording_subscription(&log, "plain"), false);
        listeners.insert(ListenerId::new(2), recording_subscription(&log, "slot"), true);
        listeners.insert(ListenerId::new(3), recording_subscription(&log, "slot2"), true);

        listeners.emit_message(&Message::text("x"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["plain:x".to_string(), "slot2:x".to_string()]
        );
    }
}
