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
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

struct ObserverKey {
    id: u64,
}

/// A bus's identity for one registration.
///
/// Handles compare by the identity of a shared allocation, never by content:
/// clones of one handle are equal, two handles from two
/// [`ObserverHandle::new`] calls never are. The allocation lives as long as
/// any clone, so an identity cannot be reused while it is still observable.
#[derive(Clone)]
pub struct ObserverHandle(Arc<ObserverKey>);

impl ObserverHandle {
    /// Mints a fresh registration identity. Bus implementations call this
    /// from [`add_observer`](crate::NotificationBus::add_observer).
    #[must_use]
    pub fn new() -> Self {
        let id = NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed);
        Self(Arc::new(ObserverKey { id }))
    }

    /// Diagnostic number, unique per process. Not used for equality.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }
}

impl Default for ObserverHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ObserverHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ObserverHandle {}

impl Hash for ObserverHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for ObserverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObserverHandle").field(&self.0.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn clones_share_identity() {
        let handle = ObserverHandle::new();
        let copy = handle.clone();
        assert_eq!(handle, copy);
        let set: HashSet<_> = [handle, copy].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn fresh_handles_differ() {
        let a = ObserverHandle::new();
        let b = ObserverHandle::new();
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }
}
