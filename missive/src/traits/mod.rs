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

//! The contracts Missive is built on.
//!
//! * [`MessageCodec`]: maps a typed message to and from a bus envelope.
//! * [`AsyncMessage`] / [`AffinityMessage`]: select the dispatch discipline
//!   a message type is observed with.
//! * [`NotificationBus`]: the untyped bus Missive sits on top of.
//! * [`DeliveryOutcome`]: what a handler may return.

pub use delivery_outcome::DeliveryOutcome;
pub use message_codec::{AffinityMessage, AsyncMessage, MessageCodec};
pub use notification_bus::{BusCallback, NotificationBus};

mod delivery_outcome;
mod message_codec;
mod notification_bus;
