// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fs.watch`: a resource-table entry wrapping a `notify` watcher and a
//! bounded broadcast of `{kind, paths}` events, per §4.6/§9's generic
//! "bounded ring per subscriber, drop-oldest" broadcast primitive. The
//! spec's op list uses a single `rid` for both `watch_next` and
//! `watch_close` (§6), so one resource owns the OS watch and its one
//! guest-facing receiver together.

use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rtx_core::{Broadcaster, Receiver, Resource};
use serde::{Deserialize, Serialize};

use crate::error::FsError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchEvent {
    pub kind: String,
    pub paths: Vec<String>,
}

/// `notify`'s rename events arrive as `Modify(Name(_))` on most backends;
/// fold that into a single `"rename"` kind so guest code sees the wire
/// shape promised by §4.6 without knowing the backend's split
/// representation.
fn classify_for_wire(event: &Event) -> Option<&'static str> {
    match &event.kind {
        EventKind::Modify(notify::event::ModifyKind::Name(_)) => Some("rename"),
        EventKind::Create(_) => Some("create"),
        EventKind::Modify(_) => Some("modify"),
        EventKind::Remove(_) => Some("remove"),
        EventKind::Access(_) | EventKind::Other | EventKind::Any => None,
    }
}

pub struct FileWatcher {
    // Held only to keep the OS watch alive for the resource's lifetime.
    _inner: StdMutex<RecommendedWatcher>,
    bus: Arc<Broadcaster<WatchEvent>>,
    receiver: Receiver<WatchEvent>,
}

impl FileWatcher {
    pub fn create(path: &Path, recursive: bool) -> Result<Self, FsError> {
        let bus: Arc<Broadcaster<WatchEvent>> = Arc::new(Broadcaster::new(64));
        let bus_for_handler = Arc::clone(&bus);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else { return };
            let Some(kind) = classify_for_wire(&event) else {
                return;
            };
            let paths = event
                .paths
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            bus_for_handler.publish(WatchEvent {
                kind: kind.to_string(),
                paths,
            });
        })
        .map_err(|e| FsError::WatchError(e.to_string()))?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(path, mode)
            .map_err(|e| FsError::WatchError(e.to_string()))?;

        let receiver = bus.subscribe();

        Ok(Self {
            _inner: StdMutex::new(watcher),
            bus,
            receiver,
        })
    }

    pub async fn next(&self) -> Option<WatchEvent> {
        self.receiver.recv().await
    }

    pub fn overflow_count(&self) -> u64 {
        self.receiver.overflow_count()
    }
}

impl Resource for FileWatcher {
    fn close(&self) {
        self.bus.close_all();
    }
}
