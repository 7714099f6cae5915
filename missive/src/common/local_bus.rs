/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{instrument, trace};

use crate::common::{ObserverHandle, QueueAffinity};
use crate::message::{Envelope, MessageName, SenderFilter};
use crate::traits::{BusCallback, NotificationBus};

struct ObserverEntry {
    handle: ObserverHandle,
    name: MessageName,
    filter: SenderFilter,
    affinity: Option<QueueAffinity>,
    callback: BusCallback,
    active: AtomicBool,
}

impl ObserverEntry {
    fn accepts(&self, envelope: &Envelope) -> bool {
        self.name == envelope.name && self.filter.matches(envelope.sender.as_ref())
    }

    fn invoke(&self, envelope: &Envelope) {
        // A removal that lands between snapshot and invocation wins.
        if self.active.load(Ordering::Acquire) {
            (self.callback)(envelope);
        }
    }
}

/// An in-process [`NotificationBus`].
///
/// Observers are kept in registration order and every post is delivered to
/// them in that order. Callbacks without affinity run inline on the posting
/// thread; callbacks with affinity are enqueued on their queue. The observer
/// list is never locked while a callback runs, so callbacks may register,
/// remove and post freely.
#[derive(Default)]
pub struct LocalBus {
    observers: RwLock<Vec<Arc<ObserverEntry>>>,
    posted: AtomicU64,
}

impl LocalBus {
    /// An empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live registrations.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// Number of envelopes posted so far.
    #[must_use]
    pub fn posted_count(&self) -> u64 {
        self.posted.load(Ordering::Relaxed)
    }
}

impl NotificationBus for LocalBus {
    fn add_observer(
        &self,
        name: MessageName,
        filter: SenderFilter,
        affinity: Option<QueueAffinity>,
        callback: BusCallback,
    ) -> ObserverHandle {
        let handle = ObserverHandle::new();
        trace!(observer = handle.id(), %name, ?filter, "Adding observer");
        self.observers.write().push(Arc::new(ObserverEntry {
            handle: handle.clone(),
            name,
            filter,
            affinity,
            callback,
            active: AtomicBool::new(true),
        }));
        handle
    }

    fn remove_observer(&self, handle: &ObserverHandle) {
        let mut observers = self.observers.write();
        if let Some(index) = observers.iter().position(|entry| entry.handle == *handle) {
            let entry = observers.remove(index);
            entry.active.store(false, Ordering::Release);
            trace!(observer = handle.id(), name = %entry.name, "Removed observer");
        }
    }

    #[instrument(level = "trace", skip_all, fields(name = %envelope.name))]
    fn post(&self, envelope: Envelope) {
        self.posted.fetch_add(1, Ordering::Relaxed);
        let matching: Vec<Arc<ObserverEntry>> = self
            .observers
            .read()
            .iter()
            .filter(|entry| entry.accepts(&envelope))
            .cloned()
            .collect();
        trace!(observers = matching.len(), "Delivering envelope");
        if matching.is_empty() {
            return;
        }

        let envelope = Arc::new(envelope);
        for entry in matching {
            match entry.affinity.clone() {
                None => entry.invoke(&envelope),
                Some(affinity) => {
                    let envelope = Arc::clone(&envelope);
                    affinity.run(move || entry.invoke(&envelope));
                }
            }
        }
    }
}

impl fmt::Debug for LocalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBus")
            .field("observers", &self.observer_count())
            .field("posted", &self.posted_count())
            .finish()
    }
}
