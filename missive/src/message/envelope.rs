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

use std::borrow::Cow;
use std::fmt;

use crate::common::{SubjectId, SubjectType};
use crate::message::Payload;

/// The bus-level key a message type is posted and observed under.
///
/// Names built with [`MessageName::from_static`] are usable in `const`
/// position, which is how [`MessageCodec::NAME`](crate::MessageCodec::NAME) is
/// declared.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageName(Cow<'static, str>);

impl MessageName {
    /// Creates a name from a string literal.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates a name from a runtime string.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for MessageName {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for MessageName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for MessageName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for MessageName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Who an envelope was posted on behalf of.
///
/// A sender always names its subject type. It names a concrete instance only
/// when the message was posted from a specific [`Subject`](crate::Subject);
/// posting "from the type" leaves `instance` empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Sender {
    subject_type: SubjectType,
    instance: Option<SubjectId>,
}

impl Sender {
    /// A sender identifying one subject instance.
    #[must_use]
    pub const fn instance(subject_type: SubjectType, id: SubjectId) -> Self {
        Self {
            subject_type,
            instance: Some(id),
        }
    }

    /// A sender that carries only its subject type.
    #[must_use]
    pub const fn of_type(subject_type: SubjectType) -> Self {
        Self {
            subject_type,
            instance: None,
        }
    }

    /// The declared subject type of the sender.
    #[must_use]
    pub const fn subject_type(&self) -> SubjectType {
        self.subject_type
    }

    /// The sending instance, if the envelope was posted from one.
    #[must_use]
    pub const fn instance_id(&self) -> Option<SubjectId> {
        self.instance
    }
}

/// The bus's native delivery unit.
///
/// Envelopes are owned by the bus. Typed code only builds one in
/// [`MessageCodec::encode`](crate::MessageCodec::encode) and reads one in
/// [`MessageCodec::decode`](crate::MessageCodec::decode).
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    /// Bus-level routing key.
    pub name: MessageName,
    /// Poster identity; `None` for anonymous posts.
    pub sender: Option<Sender>,
    /// Opaque key-value body.
    pub payload: Payload,
}

impl Envelope {
    /// Creates an anonymous envelope.
    #[must_use]
    pub fn new(name: impl Into<MessageName>, payload: Payload) -> Self {
        Self {
            name: name.into(),
            sender: None,
            payload,
        }
    }

    /// Replaces the sender, returning the updated envelope.
    #[must_use]
    pub fn with_sender(mut self, sender: Option<Sender>) -> Self {
        self.sender = sender;
        self
    }
}
