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

use std::sync::Arc;

use crate::common::{ObserverHandle, QueueAffinity};
use crate::message::{Envelope, MessageName, SenderFilter};

/// Closure a bus invokes for every matching envelope.
pub type BusCallback = Arc<dyn Fn(&Envelope) + Send + Sync>;

/// The untyped, string-keyed notification bus Missive is layered on.
///
/// Implementations must allow all three operations to be called concurrently
/// from any thread, including from inside a callback they are running.
///
/// [`LocalBus`](crate::LocalBus) is the in-process implementation.
pub trait NotificationBus: Send + Sync + 'static {
    /// Registers `callback` for envelopes named `name` whose sender passes
    /// `filter`.
    ///
    /// The registration must be effective when this returns. With an
    /// `affinity`, the callback must run on that queue rather than on the
    /// posting thread. Envelopes are delivered to registrations in the order
    /// they were added.
    fn add_observer(
        &self,
        name: MessageName,
        filter: SenderFilter,
        affinity: Option<QueueAffinity>,
        callback: BusCallback,
    ) -> ObserverHandle;

    /// Removes a registration. Unknown or already removed handles are ignored.
    fn remove_observer(&self, handle: &ObserverHandle);

    /// Delivers `envelope` once to every matching registration.
    fn post(&self, envelope: Envelope);
}
