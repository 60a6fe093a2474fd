//! Mutation event notification
//!
//! Every mutation produces one `MutationEvent` describing its outcome. The
//! hub fans events out to registered handlers, either inline on the mutating
//! call or deferred into a queue the host drains at its own pace.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// The kind of mutation that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Records added
    Insert,
    /// Records changed in place
    Update,
    /// Insert-or-update by identity or primary key
    Upsert,
    /// Records removed
    Delete,
}

impl Operation {
    /// Operation name as it appears in events
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Upsert => "upsert",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a handler subscribes to.
///
/// Operation kinds fire for every mutation of that operation, even when it
/// touched nothing. Changeset kinds fire only when the matching record list
/// is non-empty. `All` fires for every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Any insert call
    Insert,
    /// Any update call
    Update,
    /// Any upsert call
    Upsert,
    /// Any delete call
    Delete,
    /// Events carrying at least one inserted record
    Inserted,
    /// Events carrying at least one updated record
    Updated,
    /// Events carrying at least one deleted record
    Deleted,
    /// Events carrying at least one failed record
    Failed,
    /// Every event
    All,
}

impl EventKind {
    /// Whether an event should reach a handler of this kind
    pub fn matches(&self, event: &MutationEvent) -> bool {
        match self {
            Self::Insert => event.operation == Operation::Insert,
            Self::Update => event.operation == Operation::Update,
            Self::Upsert => event.operation == Operation::Upsert,
            Self::Delete => event.operation == Operation::Delete,
            Self::Inserted => !event.inserted.is_empty(),
            Self::Updated => !event.updated.is_empty(),
            Self::Deleted => !event.deleted.is_empty(),
            Self::Failed => !event.failed.is_empty(),
            Self::All => true,
        }
    }
}

/// The outcome of one mutation call.
#[derive(Debug, Clone, Serialize)]
pub struct MutationEvent {
    /// The mutation that ran
    pub operation: Operation,
    /// Records added, with identities assigned
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inserted: Vec<Value>,
    /// Records changed, in their post-change shape
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub updated: Vec<Value>,
    /// Records removed, in their last stored shape
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<Value>,
    /// Records the mutation could not apply to
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<Value>,
}

impl MutationEvent {
    /// Creates an empty event for an operation.
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            inserted: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// When handlers run relative to the mutating call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Handlers run before the mutating call returns
    #[default]
    Inline,
    /// Events queue until the host calls `drain_pending`
    Deferred,
}

type HandlerFn = Box<dyn FnMut(&MutationEvent)>;

struct Handler {
    kind: EventKind,
    callback: HandlerFn,
}

/// Registry and dispatcher for mutation event handlers.
#[derive(Default)]
pub struct EventHub {
    mode: DispatchMode,
    handlers: Vec<Handler>,
    pending: VecDeque<MutationEvent>,
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("mode", &self.mode)
            .field("handlers", &self.handlers.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl EventHub {
    /// Creates a hub with the given dispatch mode.
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            mode,
            handlers: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Current dispatch mode
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Switches dispatch mode. Already-queued events stay queued.
    pub fn set_mode(&mut self, mode: DispatchMode) {
        self.mode = mode;
    }

    /// Registers a handler for an event kind.
    pub fn on(&mut self, kind: EventKind, callback: impl FnMut(&MutationEvent) + 'static) {
        self.handlers.push(Handler {
            kind,
            callback: Box::new(callback),
        });
    }

    /// Removes every handler registered for a kind.
    pub fn off(&mut self, kind: EventKind) {
        self.handlers.retain(|handler| handler.kind != kind);
    }

    /// Publishes an event per the dispatch mode.
    pub fn publish(&mut self, event: MutationEvent) {
        match self.mode {
            DispatchMode::Inline => self.dispatch(&event),
            DispatchMode::Deferred => self.pending.push_back(event),
        }
    }

    /// Dispatches every queued event, in publication order.
    ///
    /// Returns how many events were dispatched. A no-op in inline mode.
    pub fn drain_pending(&mut self) -> usize {
        let mut dispatched = 0;
        while let Some(event) = self.pending.pop_front() {
            self.dispatch(&event);
            dispatched += 1;
        }
        dispatched
    }

    fn dispatch(&mut self, event: &MutationEvent) {
        for handler in &mut self.handlers {
            if handler.kind.matches(event) {
                (handler.callback)(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counter() -> (Rc<RefCell<usize>>, impl FnMut(&MutationEvent)) {
        let count = Rc::new(RefCell::new(0));
        let inner = Rc::clone(&count);
        (count, move |_: &MutationEvent| *inner.borrow_mut() += 1)
    }

    #[test]
    fn test_operation_kind_fires_even_when_empty() {
        let mut hub = EventHub::new(DispatchMode::Inline);
        let (count, callback) = counter();
        hub.on(EventKind::Update, callback);

        hub.publish(MutationEvent::new(Operation::Update));
        hub.publish(MutationEvent::new(Operation::Insert));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_changeset_kind_requires_non_empty_list() {
        let mut hub = EventHub::new(DispatchMode::Inline);
        let (count, callback) = counter();
        hub.on(EventKind::Updated, callback);

        hub.publish(MutationEvent::new(Operation::Update));
        assert_eq!(*count.borrow(), 0);

        let mut event = MutationEvent::new(Operation::Update);
        event.updated.push(json!({"a": 1}));
        hub.publish(event);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_all_kind_sees_every_event() {
        let mut hub = EventHub::new(DispatchMode::Inline);
        let (count, callback) = counter();
        hub.on(EventKind::All, callback);

        hub.publish(MutationEvent::new(Operation::Insert));
        hub.publish(MutationEvent::new(Operation::Delete));
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_failed_kind() {
        let mut hub = EventHub::new(DispatchMode::Inline);
        let (count, callback) = counter();
        hub.on(EventKind::Failed, callback);

        let mut event = MutationEvent::new(Operation::Insert);
        event.failed.push(json!({"bad": true}));
        hub.publish(event);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_off_removes_handlers_for_kind() {
        let mut hub = EventHub::new(DispatchMode::Inline);
        let (count, callback) = counter();
        hub.on(EventKind::Insert, callback);
        hub.off(EventKind::Insert);

        hub.publish(MutationEvent::new(Operation::Insert));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_deferred_queues_until_drained() {
        let mut hub = EventHub::new(DispatchMode::Deferred);
        let (count, callback) = counter();
        hub.on(EventKind::All, callback);

        hub.publish(MutationEvent::new(Operation::Insert));
        hub.publish(MutationEvent::new(Operation::Delete));
        assert_eq!(*count.borrow(), 0);

        assert_eq!(hub.drain_pending(), 2);
        assert_eq!(*count.borrow(), 2);
        assert_eq!(hub.drain_pending(), 0);
    }

    #[test]
    fn test_event_serialization_skips_empty_lists() {
        let mut event = MutationEvent::new(Operation::Insert);
        event.inserted.push(json!({"_id": 0}));
        let text = serde_json::to_string(&event).unwrap();
        assert!(text.contains("\"operation\":\"insert\""));
        assert!(text.contains("\"inserted\""));
        assert!(!text.contains("\"failed\""));
    }
}
