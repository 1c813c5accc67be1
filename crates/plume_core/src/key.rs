//! Mapping keys with precomputed hashes.
//!
//! A `HashKey` is a self-contained snapshot of an immutable value. Only
//! immutable values can be snapshotted, which is exactly the hashability
//! rule: anything else must be rejected by the caller before it gets here.

use ahash::RandomState;
use hashbrown::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;

pub fn fast_hasher() -> RandomState {
    RandomState::with_seeds(0, 0, 0, 0)
}

pub fn fast_map_new<K: Eq + Hash, V>() -> FastHashMap<K, V> {
    HashMap::with_hasher(fast_hasher())
}

pub fn fast_map_with_capacity<K: Eq + Hash, V>(cap: usize) -> FastHashMap<K, V> {
    HashMap::with_capacity_and_hasher(cap, fast_hasher())
}

/// Snapshot of an immutable value, usable as a mapping key.
///
/// String keys carry a precomputed content hash so equality can reject
/// mismatches without touching the bytes. Floats with an integral value
/// are normalized to `Int` when constructed so that values comparing equal
/// across int/float also hash equal.
#[derive(Clone, Debug)]
pub enum HashKey {
    None,
    Bool(bool),
    Int(i64),
    /// Raw IEEE-754 bits of a non-integral float, with -0.0 folded to 0.0.
    Float(u64),
    Str { hash: u64, data: Rc<str> },
    Tuple(Rc<[HashKey]>),
}

impl HashKey {
    pub fn from_str(s: &str) -> Self {
        HashKey::Str {
            hash: Self::hash_str(s),
            data: Rc::from(s),
        }
    }

    /// Build a float key, collapsing integral values to `Int`.
    pub fn from_float(f: f64) -> Self {
        if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
            return HashKey::Int(f as i64);
        }
        let bits = if f == 0.0 { 0.0f64.to_bits() } else { f.to_bits() };
        HashKey::Float(bits)
    }

    #[inline]
    pub fn hash_str(s: &str) -> u64 {
        let mut hasher = ahash::AHasher::default();
        hasher.write(s.as_bytes());
        hasher.finish()
    }

    pub fn is_str(&self) -> bool {
        matches!(self, HashKey::Str { .. })
    }

    /// The string content of a `Str` key, if that is what this is.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HashKey::Str { data, .. } => Some(data),
            _ => None,
        }
    }

    /// A stable 64-bit digest, used to derive the user-visible `hash()`.
    pub fn digest(&self) -> u64 {
        let mut hasher = ahash::AHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for HashKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HashKey::None, HashKey::None) => true,
            (HashKey::Bool(a), HashKey::Bool(b)) => a == b,
            (HashKey::Int(a), HashKey::Int(b)) => a == b,
            (HashKey::Float(a), HashKey::Float(b)) => a == b,
            (HashKey::Str { hash: h1, data: d1 }, HashKey::Str { hash: h2, data: d2 }) => {
                if h1 != h2 {
                    return false;
                }
                if Rc::ptr_eq(d1, d2) {
                    return true;
                }
                d1 == d2
            }
            (HashKey::Tuple(a), HashKey::Tuple(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for HashKey {}

impl Hash for HashKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            HashKey::None => state.write_u8(0),
            HashKey::Bool(b) => {
                state.write_u8(1);
                b.hash(state);
            }
            HashKey::Int(i) => {
                state.write_u8(2);
                i.hash(state);
            }
            HashKey::Float(bits) => {
                state.write_u8(3);
                bits.hash(state);
            }
            HashKey::Str { data, .. } => {
                state.write_u8(4);
                data.as_bytes().hash(state);
            }
            HashKey::Tuple(items) => {
                state.write_u8(5);
                for item in items.iter() {
                    item.hash(state);
                }
                state.write_usize(items.len());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest_of(k: &HashKey) -> u64 {
        k.digest()
    }

    #[test]
    fn integral_floats_collapse_to_int_keys() {
        assert_eq!(HashKey::from_float(3.0), HashKey::Int(3));
        assert_eq!(digest_of(&HashKey::from_float(3.0)), digest_of(&HashKey::Int(3)));
        assert_ne!(HashKey::from_float(3.5), HashKey::Int(3));
    }

    #[test]
    fn negative_zero_folds_to_zero() {
        assert_eq!(HashKey::from_float(-0.0), HashKey::from_float(0.0));
        assert_eq!(HashKey::from_float(-0.0), HashKey::Int(0));
    }

    #[test]
    fn str_keys_compare_by_content_past_the_hash() {
        let a = HashKey::from_str("alpha");
        let b = HashKey::from_str("alpha");
        let c = HashKey::from_str("beta");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(digest_of(&a), digest_of(&b));
    }

    #[test]
    fn tuples_compare_elementwise() {
        let a = HashKey::Tuple(Rc::from(vec![HashKey::Int(1), HashKey::from_str("x")]));
        let b = HashKey::Tuple(Rc::from(vec![HashKey::Int(1), HashKey::from_str("x")]));
        let c = HashKey::Tuple(Rc::from(vec![HashKey::Int(2), HashKey::from_str("x")]));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(digest_of(&a), digest_of(&b));
    }

    #[test]
    fn bools_and_ints_stay_distinct() {
        assert_ne!(HashKey::Bool(true), HashKey::Int(1));
        assert_ne!(digest_of(&HashKey::Bool(false)), digest_of(&HashKey::Int(0)));
    }
}
