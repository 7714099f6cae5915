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

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters kept by a [`MessageCenter`](crate::MessageCenter).
#[derive(Debug, Default)]
pub struct RegistryStats {
    registrations_added: AtomicUsize,
    registrations_removed: AtomicUsize,
    messages_posted: AtomicUsize,
    decode_mismatches: AtomicUsize,
    handler_failures: AtomicUsize,
    encode_failures: AtomicUsize,
}

impl RegistryStats {
    /// Subscriptions registered so far.
    #[must_use]
    pub fn registrations_added(&self) -> usize {
        self.registrations_added.load(Ordering::Relaxed)
    }

    /// Subscriptions cancelled so far.
    #[must_use]
    pub fn registrations_removed(&self) -> usize {
        self.registrations_removed.load(Ordering::Relaxed)
    }

    /// Typed posts handed to the bus.
    #[must_use]
    pub fn messages_posted(&self) -> usize {
        self.messages_posted.load(Ordering::Relaxed)
    }

    /// Matching envelopes that did not decode and were dropped.
    #[must_use]
    pub fn decode_mismatches(&self) -> usize {
        self.decode_mismatches.load(Ordering::Relaxed)
    }

    /// Deliveries whose handler returned an error or panicked.
    #[must_use]
    pub fn handler_failures(&self) -> usize {
        self.handler_failures.load(Ordering::Relaxed)
    }

    /// Posts refused because the message could not be encoded.
    #[must_use]
    pub fn encode_failures(&self) -> usize {
        self.encode_failures.load(Ordering::Relaxed)
    }

    pub(crate) fn record_registration(&self) {
        self.registrations_added.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unregistration(&self) {
        self.registrations_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_post(&self) {
        self.messages_posted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decode_mismatch(&self) {
        self.decode_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handler_failure(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_encode_failure(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }
}
