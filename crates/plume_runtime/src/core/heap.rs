//! The arena and the mark phase of collection.
//!
//! Slots are recycled through a free list. Marks live in a word-packed
//! bitset rebuilt on every collection. The root set and the sweep protocol
//! are owned by the Context; the heap only knows how to allocate, mark
//! transitively, and release slots.

use plume_core::ObjId;

use crate::core::value::{FuncImpl, Obj, Payload};

pub struct Heap {
    slots: Vec<Option<Obj>>,
    free_list: Vec<usize>,
    marks: Vec<u64>,
    live: usize,
}

impl Heap {
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(1024),
            free_list: Vec::new(),
            marks: Vec::new(),
            live: 0,
        }
    }

    pub fn alloc(&mut self, obj: Obj) -> ObjId {
        self.live += 1;
        if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = Some(obj);
            ObjId(idx)
        } else {
            let idx = self.slots.len();
            self.slots.push(Some(obj));
            ObjId(idx)
        }
    }

    pub fn get(&self, id: ObjId) -> &Obj {
        self.slots[id.0].as_ref().expect("value was swept")
    }

    pub fn get_mut(&mut self, id: ObjId) -> &mut Obj {
        self.slots[id.0].as_mut().expect("value was swept")
    }

    pub fn contains(&self, id: ObjId) -> bool {
        self.slots.get(id.0).is_some_and(|s| s.is_some())
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Total slots ever allocated, live or free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_marked(&self, id: ObjId) -> bool {
        let word = id.0 >> 6;
        let bit = id.0 & 63;
        self.marks.get(word).is_some_and(|w| (w & (1 << bit)) != 0)
    }

    /// Set the mark bit; returns false if it was already set.
    fn set_mark(&mut self, id: ObjId) -> bool {
        let word = id.0 >> 6;
        let bit = id.0 & 63;
        if word >= self.marks.len() {
            self.marks.resize(word + 1, 0);
        }
        let w = &mut self.marks[word];
        let mask = 1 << bit;
        if (*w & mask) != 0 {
            return false;
        }
        *w |= mask;
        true
    }

    pub fn clear_marks(&mut self) {
        self.marks.clear();
    }

    /// Mark everything transitively reachable from `roots`.
    pub fn mark_from(&mut self, roots: &[ObjId]) {
        let mut pending: Vec<ObjId> = roots.to_vec();

        while let Some(id) = pending.pop() {
            if !self.set_mark(id) {
                continue;
            }
            let Some(obj) = self.slots.get(id.0).and_then(|s| s.as_ref()) else {
                continue;
            };

            match &obj.payload {
                Payload::Tuple(items) | Payload::List(items) => {
                    pending.extend_from_slice(items);
                }
                Payload::Map(map) => {
                    for entry in map.values() {
                        pending.push(entry.key);
                        pending.push(entry.value);
                    }
                }
                Payload::Set(set) => {
                    pending.extend(set.values().copied());
                }
                Payload::Func(f) => {
                    if let Some(receiver) = f.self_obj {
                        pending.push(receiver);
                    }
                    if let FuncImpl::Script(sf) = &f.imp {
                        for p in &sf.params {
                            if let Some(d) = p.default {
                                pending.push(d);
                            }
                        }
                        for &(_, v) in &sf.captures {
                            pending.push(v);
                        }
                    }
                }
                Payload::Class(c) => {
                    pending.extend_from_slice(&c.bases);
                    c.instance_attrs.for_each(&mut |_, v| pending.push(v));
                }
                _ => {}
            }

            obj.attrs.for_each(&mut |_, v| pending.push(v));
            pending.extend_from_slice(&obj.links);
        }
    }

    /// Live slots that the last mark phase did not reach.
    pub fn unreachable(&self) -> Vec<ObjId> {
        let mut dead = Vec::new();
        for idx in 0..self.slots.len() {
            if self.slots[idx].is_some() && !self.is_marked(ObjId(idx)) {
                dead.push(ObjId(idx));
            }
        }
        dead
    }

    /// Drop a slot and put it on the free list.
    pub fn release(&mut self, id: ObjId) {
        if self.slots[id.0].take().is_some() {
            self.live -= 1;
            self.free_list.push(id.0);
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
