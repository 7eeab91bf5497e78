//! Parent/child chains of links.
//!
//! A [`Chain`] stores values in an arena and relates them by index, so
//! parent and child pointers never form ownership cycles. Each link has at
//! most one parent and one child; a chain is therefore a path, walked upward
//! to its [`top`](Chain::top) or downward to its [`bottom`](Chain::bottom).
//!
//! The chain is a plain data structure. Share it across threads behind a
//! `parking_lot::Mutex`.
//!
//! ```
//! use promissory::Chain;
//!
//! let mut chain = Chain::new();
//! let source = chain.insert("source");
//! let mapped = chain.insert("mapped");
//! chain.append(mapped, source);
//! assert_eq!(chain.top(mapped), Some(source));
//! assert_eq!(chain.bottom(source), Some(mapped));
//! ```

use crate::util::{Arena, ArenaIndex};

/// Handle to a link in a [`Chain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(ArenaIndex);

#[derive(Debug)]
struct Link<T> {
    value: T,
    parent: Option<LinkId>,
    child: Option<LinkId>,
}

/// Arena-backed store of parent/child links.
#[derive(Debug)]
pub struct Chain<T> {
    links: Arena<Link<T>>,
}

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Chain<T> {
    /// Creates an empty chain store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            links: Arena::new(),
        }
    }

    /// Returns the number of links.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns true if there are no links.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Adds an unattached link.
    pub fn insert(&mut self, value: T) -> LinkId {
        LinkId(self.links.insert(Link {
            value,
            parent: None,
            child: None,
        }))
    }

    /// Attaches `child` below the deepest descendant of `parent`.
    ///
    /// Returns the link `child` was attached to. Returns `None`, changing
    /// nothing, if either link is unknown, `child` already has a parent, or
    /// both links are already on the same chain.
    pub fn append(&mut self, child: LinkId, parent: LinkId) -> Option<LinkId> {
        if self.links.get(child.0)?.parent.is_some() {
            return None;
        }
        let deepest = self.bottom(parent)?;
        if self.top(deepest) == Some(child) {
            return None;
        }

        self.links.get_mut(deepest.0)?.child = Some(child);
        self.links.get_mut(child.0)?.parent = Some(deepest);
        Some(deepest)
    }

    /// Returns the parent of `link`.
    #[must_use]
    pub fn parent(&self, link: LinkId) -> Option<LinkId> {
        self.links.get(link.0)?.parent
    }

    /// Returns the child of `link`.
    #[must_use]
    pub fn child(&self, link: LinkId) -> Option<LinkId> {
        self.links.get(link.0)?.child
    }

    /// Walks parents up to the link that has none.
    #[must_use]
    pub fn top(&self, link: LinkId) -> Option<LinkId> {
        let mut current = link;
        while let Some(next) = self.links.get(current.0)?.parent {
            current = next;
        }
        Some(current)
    }

    /// Walks children down to the link that has none.
    #[must_use]
    pub fn bottom(&self, link: LinkId) -> Option<LinkId> {
        let mut current = link;
        while let Some(next) = self.links.get(current.0)?.child {
            current = next;
        }
        Some(current)
    }

    /// Returns the value stored at `link`.
    #[must_use]
    pub fn get(&self, link: LinkId) -> Option<&T> {
        self.links.get(link.0).map(|l| &l.value)
    }

    /// Returns the value stored at `link` mutably.
    pub fn get_mut(&mut self, link: LinkId) -> Option<&mut T> {
        self.links.get_mut(link.0).map(|l| &mut l.value)
    }

    /// Removes `link`, joining its parent and child directly.
    pub fn remove(&mut self, link: LinkId) -> Option<T> {
        let removed = self.links.remove(link.0)?;
        if let Some(parent) = removed.parent.and_then(|p| self.links.get_mut(p.0)) {
            parent.child = removed.child;
        }
        if let Some(child) = removed.child.and_then(|c| self.links.get_mut(c.0)) {
            child.parent = removed.parent;
        }
        Some(removed.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linked(values: &[&'static str]) -> (Chain<&'static str>, Vec<LinkId>) {
        let mut chain = Chain::new();
        let ids: Vec<_> = values.iter().map(|v| chain.insert(*v)).collect();
        for pair in ids.windows(2) {
            chain.append(pair[1], pair[0]);
        }
        (chain, ids)
    }

    #[test]
    fn top_and_bottom_of_pair() {
        let (chain, ids) = linked(&["expected", "child"]);
        assert_eq!(chain.top(ids[1]).and_then(|l| chain.get(l)), Some(&"expected"));
        assert_eq!(chain.bottom(ids[0]).and_then(|l| chain.get(l)), Some(&"child"));
    }

    #[test]
    fn append_attaches_to_deepest_descendant() {
        let (mut chain, ids) = linked(&["a", "b", "c"]);
        let d = chain.insert("d");
        assert_eq!(chain.append(d, ids[0]), Some(ids[2]));
        assert_eq!(chain.parent(d), Some(ids[2]));
        assert_eq!(chain.bottom(ids[0]), Some(d));
    }

    #[test]
    fn append_refuses_cycles_and_reparenting() {
        let (mut chain, ids) = linked(&["a", "b"]);
        // `a` heads the chain `b` is on.
        assert_eq!(chain.append(ids[0], ids[1]), None);
        // `b` already has a parent.
        let other = chain.insert("other");
        assert_eq!(chain.append(ids[1], other), None);
        assert_eq!(chain.child(other), None);
    }

    #[test]
    fn remove_splices_neighbours() {
        let (mut chain, ids) = linked(&["a", "b", "c"]);
        assert_eq!(chain.remove(ids[1]), Some("b"));
        assert_eq!(chain.child(ids[0]), Some(ids[2]));
        assert_eq!(chain.parent(ids[2]), Some(ids[0]));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.get(ids[1]), None);
    }

    #[test]
    fn unknown_links_resolve_to_none() {
        let (mut chain, ids) = linked(&["a"]);
        chain.remove(ids[0]);
        assert_eq!(chain.top(ids[0]), None);
        assert_eq!(chain.bottom(ids[0]), None);
        assert!(chain.is_empty());
    }

    #[test]
    fn get_mut_edits_value() {
        let mut chain = Chain::new();
        let id = chain.insert(1);
        if let Some(v) = chain.get_mut(id) {
            *v += 1;
        }
        assert_eq!(chain.get(id), Some(&2));
    }
}
