//! Per-instance callbacks fired after successful operations.
//!
//! Hooks run once the collection is consistent again, so a callback may
//! safely inspect the collection it is attached to through other handles.
//! They are an observation point only and never influence the operation.

use std::fmt;
use std::rc::Rc;

/// Kind of operation that just completed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Event {
    Create,
    Read,
    Update,
    Delete,
    Resize,
}

/// Receiver of collection events.
pub trait Callbacks {
    fn on_event(&self, event: Event);
}

impl<F> Callbacks for F
where
    F: Fn(Event),
{
    fn on_event(&self, event: Event) {
        self(event)
    }
}

/// Optional callback slot embedded in every collection. Clones share the
/// same receiver.
#[derive(Clone, Default)]
pub(crate) struct Hooks(Option<Rc<dyn Callbacks>>);

impl Hooks {
    pub(crate) fn set<C: Callbacks + 'static>(&mut self, callbacks: C) {
        self.0 = Some(Rc::new(callbacks));
    }

    pub(crate) fn clear(&mut self) {
        self.0 = None;
    }

    #[inline]
    pub(crate) fn fire(&self, event: Event) {
        if let Some(cb) = &self.0 {
            cb.on_event(event);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hooks").field(&self.0.is_some()).finish()
    }
}
