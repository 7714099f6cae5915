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

use crate::common::ObserverHandle;
use crate::message::MessageName;

/// Opaque handle for one subscription, used to cancel it.
///
/// Equality and hashing follow the identity of the underlying bus
/// registration only. Two tokens from two `register` calls are never equal,
/// even with identical arguments. A token stays comparable and hashable after
/// it has been cancelled; cancelling it again is a no-op.
#[derive(Clone)]
pub struct SubscriptionToken {
    handle: ObserverHandle,
    message: MessageName,
}

impl SubscriptionToken {
    pub(crate) fn new(handle: ObserverHandle, message: MessageName) -> Self {
        Self { handle, message }
    }

    pub(crate) fn handle(&self) -> &ObserverHandle {
        &self.handle
    }

    /// Diagnostic id of the underlying registration.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.handle.id()
    }

    /// Name of the message type this token subscribes to.
    #[must_use]
    pub fn message_name(&self) -> &MessageName {
        &self.message
    }
}

impl PartialEq for SubscriptionToken {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for SubscriptionToken {}

impl Hash for SubscriptionToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl fmt::Debug for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionToken")
            .field("id", &self.handle.id())
            .field("message", &self.message.as_str())
            .finish()
    }
}
