//! Arena handles.

use std::fmt;

/// Handle to a heap-allocated Value.
///
/// An `ObjId` is only meaningful through the Context whose arena allocated
/// it. Handles are non-owning; reachability alone keeps the slot alive.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjId(pub usize);

impl fmt::Debug for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjId({})", self.0)
    }
}
