//! Frame callbacks and the ordered sets that hold them.

use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;

/// What a frame callback wants to happen after it ran.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Flow {
    /// Stay registered for the next tick.
    #[default]
    Continue,
    /// Unregister from the category the callback was invoked from.
    Remove,
}

impl From<()> for Flow {
    fn from(_: ()) -> Self {
        Flow::Continue
    }
}

/// `false` unsubscribes, `true` keeps the callback.
impl From<bool> for Flow {
    fn from(keep: bool) -> Self {
        if keep {
            Flow::Continue
        } else {
            Flow::Remove
        }
    }
}

/// The four callback categories, in firing order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Before,
    Main,
    After,
    /// Fires last, and only while one of the other three categories is non-empty.
    Base,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Before, Phase::Main, Phase::After, Phase::Base];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Before => "before",
            Phase::Main => "main",
            Phase::After => "after",
            Phase::Base => "base",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type FrameCallback = dyn Fn(f64, f64) -> Flow + 'static;

/// A shareable frame callback invoked as `callback(dt, elapsed)`.
///
/// Identity is the allocation: clones of one `FrameFn` are the same callback,
/// two `FrameFn`s built from identical closures are not.
#[derive(Clone)]
pub struct FrameFn {
    callback: Rc<FrameCallback>,
}

impl FrameFn {
    /// Wraps a closure returning `()`, `bool` or [`Flow`].
    pub fn new<R, F>(callback: F) -> Self
    where
        R: Into<Flow>,
        F: Fn(f64, f64) -> R + 'static,
    {
        Self {
            callback: Rc::new(move |dt, elapsed| callback(dt, elapsed).into()),
        }
    }

    pub fn call(&self, dt: f64, elapsed: f64) -> Flow {
        (self.callback)(dt, elapsed)
    }

    pub fn ptr_eq(&self, other: &FrameFn) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }
}

impl PartialEq for FrameFn {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for FrameFn {}

impl fmt::Debug for FrameFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FrameFn")
            .field(&Rc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}

/// Point-in-time copy of a [`CallbackSet`], used while a tick iterates.
pub type Snapshot = SmallVec<[FrameFn; 4]>;

/// Insertion-ordered set of [`FrameFn`]s with identity uniqueness.
#[derive(Clone, Debug, Default)]
pub struct CallbackSet {
    entries: SmallVec<[FrameFn; 4]>,
}

impl CallbackSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `callback` at the end. Returns `false` if it was already present.
    pub fn insert(&mut self, callback: FrameFn) -> bool {
        if self.contains(&callback) {
            return false;
        }
        self.entries.push(callback);
        true
    }

    /// Removes `callback`. Returns `false` if it was not present.
    pub fn remove(&mut self, callback: &FrameFn) -> bool {
        match self.entries.iter().position(|entry| entry.ptr_eq(callback)) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, callback: &FrameFn) -> bool {
        self.entries.iter().any(|entry| entry.ptr_eq(callback))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn snapshot(&self) -> Snapshot {
        self.entries.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameFn> {
        self.entries.iter()
    }
}

#[cfg(test)]
#[path = "tests/callbacks_tests.rs"]
mod tests;
