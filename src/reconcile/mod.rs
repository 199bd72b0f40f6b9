//! Per-family state reconciliation.
//!
//! Each reconciler owns one collection scoped to a parent id and folds
//! three classes of inbound signal into it: snapshots (replace the
//! whole collection), upserts (replace-or-insert by identity), and
//! removals. Events whose parent id does not match the scoped parent
//! are silently dropped — the transport is broadcast-style, and this
//! filter is what keeps simultaneously mounted views from
//! cross-contaminating each other.
//!
//! Dispatched commands never touch these collections; only inbound
//! events do.

pub mod documents;
pub mod invitations;
pub mod messages;
pub mod usages;
pub mod versions;

use cowrite_protocol::{AiToolUsage, Collaborator, Document, Invitation, Message, Version};

/// Entity with a client-visible identity, keying its collection.
pub trait Identified {
    fn identity(&self) -> i64;
}

impl Identified for Document {
    fn identity(&self) -> i64 {
        self.id
    }
}

impl Identified for Version {
    fn identity(&self) -> i64 {
        self.id
    }
}

impl Identified for Invitation {
    fn identity(&self) -> i64 {
        self.id
    }
}

impl Identified for Message {
    fn identity(&self) -> i64 {
        self.id
    }
}

impl Identified for AiToolUsage {
    fn identity(&self) -> i64 {
        self.id
    }
}

impl Identified for Collaborator {
    fn identity(&self) -> i64 {
        self.id
    }
}

/// Where a fresh entity lands in its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAt {
    /// Most-recent-first collections (documents, versions, usages).
    Head,
    /// Chronological, append-only collections (messages).
    Tail,
}

/// Replace-or-insert by identity. Duplicate deliveries of the same
/// entity are idempotent: an existing entry is replaced in place, never
/// duplicated.
pub fn upsert<T: Identified>(items: &mut Vec<T>, item: T, at: InsertAt) {
    if let Some(slot) = items.iter_mut().find(|e| e.identity() == item.identity()) {
        *slot = item;
        return;
    }
    match at {
        InsertAt::Head => items.insert(0, item),
        InsertAt::Tail => items.push(item),
    }
}

/// Filter an identity out of the collection. Returns whether an entry
/// was actually removed.
pub fn remove<T: Identified>(items: &mut Vec<T>, identity: i64) -> bool {
    let before = items.len();
    items.retain(|e| e.identity() != identity);
    items.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: i64) -> Document {
        Document {
            id,
            title: format!("doc {}", id),
            content: String::new(),
            session_id: 1,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn upsert_inserts_at_head() {
        let mut items = vec![doc(1)];
        upsert(&mut items, doc(2), InsertAt::Head);
        assert_eq!(items.iter().map(|d| d.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut items = vec![doc(1), doc(2)];
        let mut updated = doc(1);
        updated.title = "renamed".into();
        upsert(&mut items, updated, InsertAt::Head);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "renamed");
        assert_eq!(items[1].id, 2);
    }

    #[test]
    fn remove_filters_by_identity() {
        let mut items = vec![doc(1), doc(2)];
        assert!(remove(&mut items, 1));
        assert!(!remove(&mut items, 1));
        assert_eq!(items.len(), 1);
    }
}
