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

//! Delivery of decoded messages to observer handlers.
//!
//! Two disciplines exist:
//!
//! * [`ConcurrentDispatch`] spawns every delivery as its own tokio task. There
//!   is no ordering between deliveries, even to the same handler, and `post`
//!   does not wait for them.
//! * [`AffinityDispatch`] runs deliveries on one [`SerialQueue`], one at a
//!   time, in the order the bus delivered them.
//!
//! Either way a handler that returns `Err` or panics is contained here: the
//! failure is logged and counted, the poster never sees it, and the
//! subscription stays registered.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::runtime::Handle;
use tracing::{debug, error, trace, warn};

use crate::common::{MissiveError, QueueAffinity, RegistryStats, Result, SerialQueue};
use crate::message::{Envelope, MessageName};
use crate::traits::{AffinityMessage, AsyncMessage, DeliveryOutcome, MessageCodec};

type AsyncHandler<M> = Arc<dyn Fn(M) -> BoxFuture<'static, Option<String>> + Send + Sync>;
type SyncHandler<M> = Arc<dyn Fn(M) -> Option<String> + Send + Sync>;

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// What a delivery needs to know about its registration for reporting.
#[derive(Clone)]
pub(crate) struct DeliveryContext {
    pub(crate) message: MessageName,
    pub(crate) stats: Arc<RegistryStats>,
    pub(crate) log_decode_mismatches: bool,
}

impl DeliveryContext {
    pub(crate) fn report(&self, failure: Option<String>) {
        if let Some(reason) = failure {
            self.stats.record_handler_failure();
            warn!(message = %self.message, %reason, "Message handler failed");
        }
    }

    pub(crate) fn report_panic(&self, payload: &(dyn Any + Send)) {
        self.stats.record_handler_failure();
        error!(
            message = %self.message,
            panic = %panic_message(payload),
            "Message handler panicked"
        );
    }

    pub(crate) fn decode_mismatch(&self, envelope: &Envelope) {
        self.stats.record_decode_mismatch();
        if self.log_decode_mismatches {
            debug!(
                message = %self.message,
                payload = ?envelope.payload,
                "Envelope did not decode; dropped"
            );
        }
    }
}

/// The two dispatch disciplines, for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Discipline {
    /// One spawned task per delivery.
    Concurrent,
    /// Serialized on a [`SerialQueue`].
    Affinity,
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concurrent => f.write_str("concurrent"),
            Self::Affinity => f.write_str("affinity"),
        }
    }
}

/// Delivers every decoded message as an independent tokio task.
pub struct ConcurrentDispatch<M> {
    handler: AsyncHandler<M>,
    runtime: Handle,
}

impl<M: AsyncMessage> ConcurrentDispatch<M> {
    /// Wraps an async handler, binding it to the current tokio runtime.
    ///
    /// # Errors
    ///
    /// [`MissiveError::NoRuntime`] when called outside a tokio runtime.
    pub fn new<F, Fut, O>(handler: F) -> Result<Self>
    where
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
        O: DeliveryOutcome,
    {
        let runtime = Handle::try_current().map_err(|_| MissiveError::NoRuntime)?;
        Ok(Self::with_runtime(runtime, handler))
    }

    /// Wraps an async handler whose deliveries are spawned on `runtime`.
    pub fn with_runtime<F, Fut, O>(runtime: Handle, handler: F) -> Self
    where
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
        O: DeliveryOutcome,
    {
        let handler: AsyncHandler<M> = Arc::new(move |message: M| {
            let delivery = handler(message);
            async move { delivery.await.into_failure() }.boxed()
        });
        Self { handler, runtime }
    }
}

impl<M: MessageCodec> ConcurrentDispatch<M> {
    fn deliver(&self, message: M, context: &DeliveryContext) {
        let handler = Arc::clone(&self.handler);
        let context = context.clone();
        self.runtime.spawn(async move {
            // The handler call sits inside the guarded future so a panic while
            // building the future is contained too.
            let delivery = AssertUnwindSafe(async move { handler(message).await });
            match delivery.catch_unwind().await {
                Ok(failure) => context.report(failure),
                Err(payload) => context.report_panic(payload.as_ref()),
            }
        });
    }
}

/// Delivers decoded messages one at a time on a [`SerialQueue`].
pub struct AffinityDispatch<M> {
    handler: SyncHandler<M>,
    queue: SerialQueue,
}

impl<M: AffinityMessage> AffinityDispatch<M> {
    /// Wraps a handler that runs on [`SerialQueue::main`].
    pub fn new<F, O>(handler: F) -> Self
    where
        F: Fn(M) -> O + Send + Sync + 'static,
        O: DeliveryOutcome,
    {
        Self::on_queue(SerialQueue::main(), handler)
    }

    /// Wraps a handler that runs on `queue`.
    pub fn on_queue<F, O>(queue: SerialQueue, handler: F) -> Self
    where
        F: Fn(M) -> O + Send + Sync + 'static,
        O: DeliveryOutcome,
    {
        let handler: SyncHandler<M> = Arc::new(move |message: M| handler(message).into_failure());
        Self { handler, queue }
    }
}

impl<M: MessageCodec> AffinityDispatch<M> {
    /// The queue deliveries run on.
    #[must_use]
    pub fn queue(&self) -> &SerialQueue {
        &self.queue
    }

    fn deliver(&self, message: M, context: &DeliveryContext) {
        if self.queue.is_current() {
            Self::invoke(&self.handler, message, context);
            return;
        }
        // The bus did not honor the affinity hint; hop onto the queue.
        trace!(message = %context.message, queue = %self.queue.name(), "Re-queueing delivery");
        let handler = Arc::clone(&self.handler);
        let context = context.clone();
        self.queue
            .enqueue(move || Self::invoke(&handler, message, &context));
    }

    fn invoke(handler: &SyncHandler<M>, message: M, context: &DeliveryContext) {
        match panic::catch_unwind(AssertUnwindSafe(|| handler(message))) {
            Ok(failure) => context.report(failure),
            Err(payload) => context.report_panic(payload.as_ref()),
        }
    }
}

/// How a registration delivers decoded messages to its handler.
pub enum Dispatcher<M> {
    /// See [`ConcurrentDispatch`].
    Concurrent(ConcurrentDispatch<M>),
    /// See [`AffinityDispatch`].
    Affinity(AffinityDispatch<M>),
}

impl<M: MessageCodec> Dispatcher<M> {
    /// Which discipline this is.
    #[must_use]
    pub fn discipline(&self) -> Discipline {
        match self {
            Self::Concurrent(_) => Discipline::Concurrent,
            Self::Affinity(_) => Discipline::Affinity,
        }
    }

    /// The queue affinity the bus registration should carry.
    #[must_use]
    pub fn affinity(&self) -> Option<QueueAffinity> {
        match self {
            Self::Concurrent(_) => None,
            Self::Affinity(dispatch) => Some(QueueAffinity::new(dispatch.queue().clone())),
        }
    }

    pub(crate) fn deliver(&self, message: M, context: &DeliveryContext) {
        match self {
            Self::Concurrent(dispatch) => dispatch.deliver(message, context),
            Self::Affinity(dispatch) => dispatch.deliver(message, context),
        }
    }
}

impl<M: AsyncMessage> From<ConcurrentDispatch<M>> for Dispatcher<M> {
    fn from(dispatch: ConcurrentDispatch<M>) -> Self {
        Self::Concurrent(dispatch)
    }
}

impl<M: AffinityMessage> From<AffinityDispatch<M>> for Dispatcher<M> {
    fn from(dispatch: AffinityDispatch<M>) -> Self {
        Self::Affinity(dispatch)
    }
}
