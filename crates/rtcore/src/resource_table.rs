// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Resource Table: process-wide lifecycle owner for every native handle
//! guest code touches.
//!
//! Implemented as an arena-with-indices slab, generation-gated per the
//! arena-with-indices design note: dropping a slot bumps its generation so a
//! later `get`/`drop` against a stale `Rid` fails even if the index is
//! reissued to a new resource.

use crate::rid::Rid;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

/// Marker trait for anything storable in the table.
///
/// `close` is called exactly once, when the last guest handle to the
/// resource is dropped via `ResourceTable::drop`. Resources that hold no
/// OS-level state (and rely on `Drop` for cleanup) can leave it as a no-op.
pub trait Resource: Send + Sync + 'static {
    fn close(&self) {}

    /// Human-readable type tag used in diagnostics and error messages.
    fn type_tag(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    #[error("invalid resource handle")]
    InvalidHandle,
}

type Closer = Box<dyn Fn(Arc<dyn Any + Send + Sync>) + Send + Sync>;

struct Occupied {
    generation: u32,
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    closer: Closer,
}

enum Slot {
    Empty { generation: u32 },
    Occupied(Occupied),
}

struct Inner {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    reuse_slots: bool,
}

/// Process-wide (or per-runtime-instance) registry of native resources.
pub struct ResourceTable {
    inner: Mutex<Inner>,
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceTable {
    /// Generation-gated slot reuse (the default): freed slots are recycled
    /// but stale `Rid`s referencing the old generation are rejected.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: Vec::new(),
                free_list: Vec::new(),
                reuse_slots: true,
            }),
        }
    }

    /// Strict no-reuse-for-life-of-process variant: every `insert` gets a
    /// brand new slot index, freed indices are never recycled. Useful in
    /// tests that want to assert slot indices never collide.
    pub fn new_no_reuse() -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: Vec::new(),
                free_list: Vec::new(),
                reuse_slots: false,
            }),
        }
    }

    /// Insert a new resource, returning its handle. O(1) amortized.
    pub fn insert<T: Resource>(&self, value: T) -> Rid {
        let type_name = std::any::type_name::<T>();
        let arc: Arc<dyn Any + Send + Sync> = Arc::new(value);
        let closer: Closer = Box::new(|v: Arc<dyn Any + Send + Sync>| {
            if let Ok(t) = v.downcast::<T>() {
                t.close();
            }
        });

        let mut inner = self.inner.lock();
        let reuse = inner.reuse_slots;
        let index = if reuse {
            inner.free_list.pop()
        } else {
            None
        };

        match index {
            Some(index) => {
                let generation = match &inner.slots[index as usize] {
                    Slot::Empty { generation } => *generation,
                    Slot::Occupied(_) => unreachable!("free list pointed at occupied slot"),
                };
                inner.slots[index as usize] = Slot::Occupied(Occupied {
                    generation,
                    value: arc,
                    type_name,
                    closer,
                });
                Rid::new(index, generation)
            }
            None => {
                let index = inner.slots.len() as u32;
                inner.slots.push(Slot::Occupied(Occupied {
                    generation: 0,
                    value: arc,
                    type_name,
                    closer,
                }));
                Rid::new(index, 0)
            }
        }
    }

    /// Fetch a shared reference to a resource of the expected concrete type.
    ///
    /// The returned `Arc` may safely outlive this call (and any lock on the
    /// table) — the resource's own internal synchronization governs
    /// concurrent use, per the "does not hold an exclusive lock for the
    /// duration" concurrency contract.
    pub fn get<T: Resource>(&self, rid: Rid) -> Result<Arc<T>, TableError> {
        let inner = self.inner.lock();
        match inner.slots.get(rid.index() as usize) {
            Some(Slot::Occupied(occ)) if occ.generation == rid.generation() => {
                Arc::clone(&occ.value)
                    .downcast::<T>()
                    .map_err(|_| TableError::InvalidHandle)
            }
            _ => Err(TableError::InvalidHandle),
        }
    }

    /// Returns the type tag of whatever occupies `rid`, regardless of the
    /// caller's expected type. Used for diagnostics, not gating.
    pub fn type_name(&self, rid: Rid) -> Option<&'static str> {
        let inner = self.inner.lock();
        match inner.slots.get(rid.index() as usize) {
            Some(Slot::Occupied(occ)) if occ.generation == rid.generation() => {
                Some(occ.type_name)
            }
            _ => None,
        }
    }

    /// Drop a resource, invoking its finalizer. Double-drop (or dropping an
    /// unknown handle) yields `InvalidHandle`, never a silent no-op.
    pub fn drop(&self, rid: Rid) -> Result<(), TableError> {
        let closer_call = {
            let mut inner = self.inner.lock();
            let index = rid.index() as usize;
            match inner.slots.get(index) {
                Some(Slot::Occupied(occ)) if occ.generation == rid.generation() => {
                    let next_gen = occ.generation.wrapping_add(1);
                    let Slot::Occupied(occ) =
                        std::mem::replace(&mut inner.slots[index], Slot::Empty { generation: next_gen })
                    else {
                        unreachable!()
                    };
                    if inner.reuse_slots {
                        inner.free_list.push(index as u32);
                    }
                    Some((occ.closer, occ.value))
                }
                _ => None,
            }
        };

        match closer_call {
            Some((closer, value)) => {
                closer(value);
                Ok(())
            }
            None => Err(TableError::InvalidHandle),
        }
    }

    /// Number of currently live resources.
    pub fn live_count(&self) -> usize {
        let inner = self.inner.lock();
        inner
            .slots
            .iter()
            .filter(|s| matches!(s, Slot::Occupied(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug)]
    struct Probe(Arc<AtomicBool>);
    impl Resource for Probe {
        fn close(&self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Debug)]
    struct Other;
    impl Resource for Other {}

    #[test]
    fn insert_get_drop_cycle_leaves_no_leak() {
        let table = ResourceTable::new();
        let closed = Arc::new(AtomicBool::new(false));
        let rid = table.insert(Probe(Arc::clone(&closed)));

        assert_eq!(table.live_count(), 1);
        let got = table.get::<Probe>(rid).unwrap();
        assert!(!got.0.load(Ordering::SeqCst));

        table.drop(rid).unwrap();
        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(table.live_count(), 0);
    }

    #[test]
    fn dropped_rid_is_invalid_afterward_never_reused_successfully() {
        let table = ResourceTable::new();
        let rid = table.insert(Probe(Arc::new(AtomicBool::new(false))));
        table.drop(rid).unwrap();

        assert_eq!(table.get::<Probe>(rid).unwrap_err(), TableError::InvalidHandle);
        assert_eq!(table.drop(rid).unwrap_err(), TableError::InvalidHandle);
    }

    #[test]
    fn wrong_type_lookup_fails_even_for_live_rid() {
        let table = ResourceTable::new();
        let rid = table.insert(Probe(Arc::new(AtomicBool::new(false))));
        assert_eq!(table.get::<Other>(rid).unwrap_err(), TableError::InvalidHandle);
    }

    #[test]
    fn slot_reuse_is_gated_by_generation() {
        let table = ResourceTable::new();
        let rid1 = table.insert(Other);
        table.drop(rid1).unwrap();
        let rid2 = table.insert(Other);

        // Same slot index, different generation: rid1 must stay dead.
        assert_eq!(rid1.index(), rid2.index());
        assert_ne!(rid1.generation(), rid2.generation());
        assert!(table.get::<Other>(rid1).is_err());
        assert!(table.get::<Other>(rid2).is_ok());
    }

    #[test]
    fn no_reuse_table_never_recycles_slot_indices() {
        let table = ResourceTable::new_no_reuse();
        let rid1 = table.insert(Other);
        table.drop(rid1).unwrap();
        let rid2 = table.insert(Other);
        assert_ne!(rid1.index(), rid2.index());
    }

    #[test]
    fn live_count_tracks_concurrent_inserts_and_drops() {
        let table = ResourceTable::new();
        let rids: Vec<_> = (0..10).map(|_| table.insert(Other)).collect();
        assert_eq!(table.live_count(), 10);
        for rid in rids.iter().take(4) {
            table.drop(*rid).unwrap();
        }
        assert_eq!(table.live_count(), 6);
    }
}
