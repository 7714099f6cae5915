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

use crate::common::{Result, SubjectType};
use crate::message::{Envelope, MessageName};

/// Maps a strongly-typed message to and from the bus's opaque envelope.
///
/// This is the only place type information is recovered from the untyped
/// transport. Implementations must be pure:
///
/// * [`decode`](Self::decode) is total. Envelopes with another name or a
///   payload of the wrong shape yield `None`; consumers drop those silently.
/// * [`encode`](Self::encode) is deterministic and populates [`NAME`](Self::NAME).
/// * `decode(&m.encode())` reconstructs a value observably equal to `m`.
///
/// Most types get this from `#[missive_message]`; a hand-written codec looks
/// like:
///
/// ```rust,ignore
/// impl MessageCodec for Greeting {
///     type Subject = Room;
///     const NAME: MessageName = MessageName::from_static("room.greeting");
///
///     fn decode(envelope: &Envelope) -> Option<Self> {
///         if envelope.name != Self::NAME {
///             return None;
///         }
///         let content = envelope.payload.get_str("content")?;
///         Some(Self { content: content.to_owned() })
///     }
///
///     fn encode(&self) -> Envelope {
///         Envelope::new(Self::NAME, Payload::new().with("content", self.content.clone()))
///     }
/// }
/// ```
///
/// Two message types sharing a `NAME` on the same bus is a configuration
/// error; [`MessageCenter`](crate::MessageCenter) rejects it unless
/// uniqueness enforcement is switched off.
pub trait MessageCodec: Sized + Send + 'static {
    /// The type of object this message is posted on behalf of.
    type Subject: Send + Sync + 'static;

    /// Fixed bus-level name for this message type.
    const NAME: MessageName;

    /// Recovers a message from an envelope, or `None` if it is not one.
    fn decode(envelope: &Envelope) -> Option<Self>;

    /// Builds the anonymous envelope for this message.
    fn encode(&self) -> Envelope;

    /// Builds the envelope, or reports why this value cannot be carried.
    ///
    /// [`MessageCenter`](crate::MessageCenter) posts through this method and
    /// refuses to post values it rejects. Codecs that can always encode keep
    /// the default.
    ///
    /// # Errors
    ///
    /// [`MissiveError::Encode`](crate::MissiveError::Encode) for values the
    /// payload cannot represent.
    fn try_encode(&self) -> Result<Envelope> {
        Ok(self.encode())
    }

    /// Returns [`NAME`](Self::NAME).
    #[inline]
    fn name() -> MessageName {
        Self::NAME
    }

    /// Returns the [`SubjectType`] of [`Subject`](Self::Subject).
    #[inline]
    fn subject_type() -> SubjectType {
        SubjectType::of::<Self::Subject>()
    }
}

/// Marks a message as observable with concurrent dispatch.
///
/// Each delivery is spawned as an independent tokio task running an `async`
/// handler; deliveries to one observer are not ordered.
pub trait AsyncMessage: MessageCodec + Sync {}

/// Marks a message as observable with affinity dispatch.
///
/// Deliveries run one at a time, in bus order, on the shared
/// [`SerialQueue`](crate::SerialQueue).
pub trait AffinityMessage: MessageCodec {}
