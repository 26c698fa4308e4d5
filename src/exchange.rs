//! Exchange bus — moving non-serializable values across the wire boundary.
//!
//! Protocol messages are JSON strings, so a live rich object (a plot canvas,
//! a widget handle) cannot travel through them directly. The bus stores the
//! object under a small integer id; the message carries only the id, and the
//! consumer on the other side of the boundary pops the object back out.
//!
//! Lifecycle discipline is manual: every `push` must be matched by exactly
//! one `pop`, or the slot lives for the rest of the process.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Mutex;

use crate::types::{Error, Result};

/// A value that cannot cross the string-serialization boundary.
pub type RichObject = Box<dyn Any + Send>;

/// Keyed slot store with smallest-free-id allocation.
///
/// Ids are recycled: after a `pop`, the freed id is the first candidate for
/// the next `push`. A free-list plus a high-watermark counter keeps
/// allocation at O(log n) instead of scanning from zero.
pub struct ExchangeBus<T> {
    slots: HashMap<u64, T>,
    free: BTreeSet<u64>,
    next: u64,
}

impl<T> ExchangeBus<T> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            free: BTreeSet::new(),
            next: 0,
        }
    }

    /// Store a value and return the id to pop it with.
    ///
    /// The id is the smallest non-negative integer not currently assigned.
    pub fn push(&mut self, value: T) -> u64 {
        let id = match self.free.pop_first() {
            Some(recycled) => recycled,
            None => {
                let id = self.next;
                self.next += 1;
                id
            }
        };
        self.slots.insert(id, value);
        id
    }

    /// Remove and return the value stored under `id`.
    ///
    /// An absent id is not an error: the slot may simply have been popped
    /// already, so callers get `None`.
    pub fn pop(&mut self, id: u64) -> Option<T> {
        let value = self.slots.remove(&id);
        if value.is_some() {
            self.free.insert(id);
        }
        value
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<T> Default for ExchangeBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ExchangeBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeBus")
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .field("next", &self.next)
            .finish()
    }
}

/// Shared state for one adapter and its render-side consumer.
///
/// The adapter pushes rich display objects here; the rendering code on the
/// receiving side of the reference handoff pops them by id. Each adapter owns
/// its own context, so independent connections cannot see each other's slots.
pub struct SessionContext {
    bus: Mutex<ExchangeBus<RichObject>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            bus: Mutex::new(ExchangeBus::new()),
        }
    }

    /// Park a rich object on the bus, returning its reference id.
    pub fn push_object(&self, object: RichObject) -> Result<u64> {
        let mut bus = self
            .bus
            .lock()
            .map_err(|_| Error::internal("exchange bus lock poisoned"))?;
        Ok(bus.push(object))
    }

    /// Retrieve and remove a rich object by reference id.
    pub fn pop_object(&self, id: u64) -> Result<Option<RichObject>> {
        let mut bus = self
            .bus
            .lock()
            .map_err(|_| Error::internal("exchange bus lock poisoned"))?;
        Ok(bus.pop(id))
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bus.lock() {
            Ok(bus) => f.debug_struct("SessionContext").field("bus", &*bus).finish(),
            Err(_) => f.debug_struct("SessionContext").field("bus", &"<poisoned>").finish(),
        }
    }
}
