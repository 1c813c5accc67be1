//! Value-model primitives shared by the Plume runtime.

mod id;
mod key;
mod pos;

pub use id::ObjId;
pub use key::{fast_hasher, fast_map_new, fast_map_with_capacity, FastHashMap, HashKey};
pub use pos::SourcePos;
