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

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Missive
//!
//! A typed publish/subscribe layer over an untyped, string-keyed notification
//! bus. The bus (anything implementing [`NotificationBus`]) moves opaque
//! [`Envelope`]s keyed by a [`MessageName`] and an optional [`Sender`];
//! Missive keeps every subscriber strongly typed on top of it.
//!
//! ## Key Concepts
//!
//! - **Messages ([`MessageCodec`])**: value types with a fixed bus-level name, a
//!   subject type, and a pure mapping to and from an envelope. The envelope is
//!   decoded exactly once, at the bus callback; nothing past that point sees it.
//! - **Subjects ([`Subject`], [`SubjectScope`])**: a subscription targets one
//!   subject instance, every subject of a type, or any sender at all.
//! - **Dispatch ([`Dispatcher`])**: [`AsyncMessage`]s are delivered as
//!   independently spawned tokio tasks; [`AffinityMessage`]s are delivered one at
//!   a time, in bus order, on the shared [`SerialQueue`].
//! - **Tokens ([`SubscriptionToken`])**: identity-compared handles, the only way
//!   to cancel a subscription through [`MessageCenter::unregister`].
//! - **Streams ([`MessageStream`])**: bounded, newest-wins buffers exposing a
//!   subscription as a `futures::Stream`; dropping the stream unsubscribes.
//! - **Reference bus ([`LocalBus`])**: an in-process bus implementation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use missive::prelude::*;
//!
//! pub struct Document;
//!
//! #[missive_message(name = "document.saved", subject = Document)]
//! pub struct DocumentSaved {
//!     pub path: String,
//! }
//!
//! let center = MessageCenter::local();
//! let document = Subject::new(Document);
//! let token = center.observe(&document, |saved: DocumentSaved| async move {
//!     println!("saved {}", saved.path);
//! })?;
//! center.post_from(&DocumentSaved { path: "a.txt".into() }, &document);
//! center.unregister(&token);
//! ```

// Lets code generated by `missive_message` refer to `::missive` inside this crate too.
extern crate self as missive;

/// Registry, dispatch, streams, subjects, tokens and the reference bus.
pub(crate) mod common;

/// Envelope types and serde-backed codec helpers.
pub(crate) mod message;

/// The codec contract, dispatch markers and the bus boundary.
pub(crate) mod traits;

pub use common::{
    AffinityConfig, AffinityDispatch, BehaviorConfig, ConcurrentDispatch, Discipline, Dispatcher,
    LimitsConfig, LocalBus, MessageCenter, MessageStream, MissiveConfig, MissiveError,
    ObserverHandle, QueueAffinity, RegistryStats, Result, SerialQueue, Subject, SubjectId,
    SubjectScope, SubjectType, SubscriptionToken, CONFIG, DEFAULT_BUFFER_SIZE,
};
pub use message::{Envelope, MessageName, Payload, Sender, SenderFilter};
pub use missive_macro::missive_message;
pub use traits::{
    AffinityMessage, AsyncMessage, BusCallback, DeliveryOutcome, MessageCodec, NotificationBus,
};

/// Serde-backed codec helpers.
///
/// These are what `#[missive_message]` expands to; hand-written codecs may use
/// them as well.
pub mod codec {
    pub use crate::message::{decode_serde, encode_serde, try_encode_serde};
}

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// * [`missive_message`]: attribute macro for defining messages.
/// * [`MessageCenter`], [`LocalBus`], [`Subject`], [`SubjectScope`],
///   [`SubscriptionToken`], [`MessageStream`], [`SerialQueue`]: core types.
/// * [`MessageCodec`], [`AsyncMessage`], [`AffinityMessage`],
///   [`NotificationBus`]: core traits.
/// * [`Envelope`], [`MessageName`], [`Payload`], [`Sender`]: envelope types.
/// * `futures::StreamExt`, for consuming message streams.
pub mod prelude {
    pub use futures::StreamExt;
    pub use missive_macro::missive_message;

    pub use crate::common::{
        Dispatcher, LocalBus, MessageCenter, MessageStream, MissiveError, SerialQueue, Subject,
        SubjectScope, SubscriptionToken,
    };
    pub use crate::message::{Envelope, MessageName, Payload, Sender};
    pub use crate::traits::{AffinityMessage, AsyncMessage, MessageCodec, NotificationBus};
}

#[doc(hidden)]
pub mod __private {
    pub use serde;
}
