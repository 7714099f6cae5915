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

use thiserror::Error;

use crate::message::MessageName;

/// Configuration mistakes reported by the call that introduced them.
///
/// Delivery-time problems never show up here: undecodable envelopes are
/// dropped, failing handlers are logged, and cancelling a token twice is a
/// no-op.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MissiveError {
    /// A stream was opened with a zero-sized buffer.
    #[error("buffer size must be a positive integer, got {0}")]
    InvalidBufferSize(usize),

    /// Concurrent dispatch was requested outside a tokio runtime.
    #[error("concurrent dispatch requires a tokio runtime, but none is running")]
    NoRuntime,

    /// A message value could not be represented as an envelope payload.
    #[error("message `{name}` could not be encoded: {reason}")]
    Encode {
        /// Name of the message type.
        name: MessageName,
        /// What the serializer rejected.
        reason: String,
    },

    /// Two distinct message types declared the same bus-level name.
    #[error("message name `{name}` is already used by `{existing}`; `{requested}` cannot share it")]
    NameCollision {
        /// The contested name.
        name: MessageName,
        /// Type that claimed the name first.
        existing: &'static str,
        /// Type that tried to reuse it.
        requested: &'static str,
    },
}

/// Result alias used across Missive.
pub type Result<T> = std::result::Result<T, MissiveError>;
