//! Per-value attribute tables with a parent chain.
//!
//! Lookup order is depth-first, left-to-right pre-order over parents: local
//! entries first, then the first parent and its parents recursively, then
//! the next parent. Writes always land in the local map. Tables are shared
//! by handle so a class's instance template can parent many tables at once.

use plume_core::ObjId;
use std::cell::RefCell;
use std::rc::Rc;

use crate::core::value::{ordered_map_new, OrderedMap};

struct Table {
    entries: OrderedMap<String, ObjId>,
    parents: Vec<AttrTable>,
}

#[derive(Clone)]
pub struct AttrTable {
    inner: Rc<RefCell<Table>>,
}

impl AttrTable {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Table {
                entries: ordered_map_new(),
                parents: Vec::new(),
            })),
        }
    }

    pub fn ptr_eq(&self, other: &AttrTable) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Resolve `name` through the local map and then the parent chain.
    pub fn get(&self, name: &str) -> Option<ObjId> {
        let table = self.inner.borrow();
        if let Some(&v) = table.entries.get(name) {
            return Some(v);
        }
        for parent in &table.parents {
            if let Some(v) = parent.get(name) {
                return Some(v);
            }
        }
        None
    }

    /// Local entry only, no parent search.
    pub fn get_local(&self, name: &str) -> Option<ObjId> {
        self.inner.borrow().entries.get(name).copied()
    }

    /// Skip the local map and search only the parents, in order.
    pub fn get_from_base(&self, name: &str) -> Option<ObjId> {
        let table = self.inner.borrow();
        for parent in &table.parents {
            if let Some(v) = parent.get(name) {
                return Some(v);
            }
        }
        None
    }

    pub fn set(&self, name: &str, value: ObjId) {
        self.inner
            .borrow_mut()
            .entries
            .insert(name.to_string(), value);
    }

    /// Append (or prepend) a parent table. A table cannot parent itself.
    pub fn add_parent(&self, parent: &AttrTable, prepend: bool) {
        if self.ptr_eq(parent) {
            return;
        }
        let mut table = self.inner.borrow_mut();
        if prepend {
            table.parents.insert(0, parent.clone());
        } else {
            table.parents.push(parent.clone());
        }
    }

    /// Clone the local map; share the parent list. Used to materialize an
    /// instance's attributes from its class template.
    pub fn copy(&self) -> AttrTable {
        let table = self.inner.borrow();
        AttrTable {
            inner: Rc::new(RefCell::new(Table {
                entries: table.entries.clone(),
                parents: table.parents.clone(),
            })),
        }
    }

    /// Visit local entries in insertion order.
    pub fn for_each(&self, f: &mut dyn FnMut(&str, ObjId)) {
        for (name, &v) in self.inner.borrow().entries.iter() {
            f(name, v);
        }
    }

    pub fn local_len(&self) -> usize {
        self.inner.borrow().entries.len()
    }
}

impl Default for AttrTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> ObjId {
        ObjId(n)
    }

    #[test]
    fn local_entries_shadow_parents() {
        let parent = AttrTable::new();
        parent.set("x", id(1));
        let child = AttrTable::new();
        child.add_parent(&parent, false);
        assert_eq!(child.get("x"), Some(id(1)));
        child.set("x", id(2));
        assert_eq!(child.get("x"), Some(id(2)));
        assert_eq!(parent.get("x"), Some(id(1)));
        assert_eq!(child.get_from_base("x"), Some(id(1)));
    }

    #[test]
    fn resolution_is_depth_first_left_to_right() {
        let grandparent = AttrTable::new();
        grandparent.set("x", id(1));
        let left = AttrTable::new();
        left.add_parent(&grandparent, false);
        let right = AttrTable::new();
        right.set("x", id(2));
        let child = AttrTable::new();
        child.add_parent(&left, false);
        child.add_parent(&right, false);
        // The left parent's ancestors win over the right parent's locals.
        assert_eq!(child.get("x"), Some(id(1)));
    }

    #[test]
    fn copy_clones_locals_and_shares_parents() {
        let parent = AttrTable::new();
        parent.set("m", id(7));
        let orig = AttrTable::new();
        orig.add_parent(&parent, false);
        orig.set("a", id(1));

        let dup = orig.copy();
        dup.set("a", id(2));
        assert_eq!(orig.get("a"), Some(id(1)));
        assert_eq!(dup.get("a"), Some(id(2)));

        // Parent mutations are visible through both.
        parent.set("m", id(8));
        assert_eq!(orig.get("m"), Some(id(8)));
        assert_eq!(dup.get("m"), Some(id(8)));
    }

    #[test]
    fn for_each_sees_locals_in_insertion_order() {
        let t = AttrTable::new();
        t.set("b", id(1));
        t.set("a", id(2));
        t.set("b", id(3));
        let mut names = Vec::new();
        t.for_each(&mut |name, _| names.push(name.to_string()));
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn prepended_parent_is_searched_first() {
        let first = AttrTable::new();
        first.set("x", id(1));
        let second = AttrTable::new();
        second.set("x", id(2));
        let t = AttrTable::new();
        t.add_parent(&first, false);
        t.add_parent(&second, true);
        assert_eq!(t.get("x"), Some(id(2)));
    }
}
