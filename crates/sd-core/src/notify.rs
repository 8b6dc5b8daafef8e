//! Change notification.
//!
//! Listeners are plain boxed closures. While an update bracket is open,
//! posted events are queued; the outermost `end_update` dispatches them once
//! each, in the order they were first posted.

use crate::id::NodeId;
use crate::metadata::PropertyName;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// The whole tree was swapped for a freshly loaded one.
    DocumentReplaced,
    /// Nodes were attached, detached or reordered.
    StructureChanged,
    PropertyChanged {
        node: NodeId,
        property: PropertyName,
    },
    SelectionChanged,
    JobStackChanged {
        revision: u64,
    },
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Listener = Box<dyn FnMut(&ChangeEvent)>;

#[derive(Default)]
pub struct ChangeSubject {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
    depth: usize,
    pending: Vec<ChangeEvent>,
}

impl ChangeSubject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false when the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn begin_update(&mut self) {
        self.depth += 1;
    }

    pub fn end_update(&mut self) {
        assert!(self.depth > 0, "end_update without matching begin_update");
        self.depth -= 1;
        if self.depth == 0 {
            self.flush();
        }
    }

    pub fn in_update(&self) -> bool {
        self.depth > 0
    }

    pub fn post(&mut self, event: ChangeEvent) {
        if !self.pending.contains(&event) {
            self.pending.push(event);
        }
        if self.depth == 0 {
            self.flush();
        }
    }

    fn flush(&mut self) {
        let events = std::mem::take(&mut self.pending);
        for event in &events {
            log::trace!("dispatching {event:?} to {} listener(s)", self.listeners.len());
            for (_, listener) in self.listeners.iter_mut() {
                listener(event);
            }
        }
    }
}

impl fmt::Debug for ChangeSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSubject")
            .field("listeners", &self.listeners.len())
            .field("depth", &self.depth)
            .field("pending", &self.pending)
            .finish()
    }
}
