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

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures::executor::{block_on_stream, BlockingStream};
use futures::stream::{FusedStream, Stream};
use futures::task::AtomicWaker;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::common::message_center::CancelHook;
use crate::common::{MessageCenter, MissiveError, Result, SubjectScope, SubscriptionToken};
use crate::message::Envelope;
use crate::traits::{AsyncMessage, BusCallback};

/// Buffer size used when none is given.
pub const DEFAULT_BUFFER_SIZE: usize = 10;

struct StreamState<M> {
    buffer: VecDeque<M>,
    capacity: usize,
    closed: bool,
    evicted: usize,
}

struct StreamShared<M> {
    state: Mutex<StreamState<M>>,
    waker: AtomicWaker,
}

impl<M> StreamShared<M> {
    fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(StreamState {
                buffer: VecDeque::with_capacity(capacity),
                capacity,
                closed: false,
                evicted: 0,
            }),
            waker: AtomicWaker::new(),
        }
    }

    fn push(&self, message: M) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            if state.buffer.len() == state.capacity {
                state.buffer.pop_front();
                state.evicted += 1;
            }
            state.buffer.push_back(message);
        }
        self.waker.wake();
    }

    fn pop(&self) -> Poll<Option<M>> {
        let mut state = self.state.lock();
        match state.buffer.pop_front() {
            Some(message) => Poll::Ready(Some(message)),
            None if state.closed => Poll::Ready(None),
            None => Poll::Pending,
        }
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn close(&self) {
        {
            let mut state = self.state.lock();
            state.closed = true;
            state.buffer.clear();
        }
        self.waker.wake();
    }
}

/// A subscription exposed as a bounded, newest-wins [`Stream`].
///
/// Decoded messages are buffered until the stream is polled. When the buffer
/// is full the oldest message is evicted to make room, so a slow consumer
/// always sees the most recent `capacity` messages in posting order.
///
/// The stream ends when it is [closed](Self::close) or dropped; either
/// cancels the underlying subscription exactly once and discards whatever is
/// still buffered. Cancelling its token through the center, directly or with
/// [`MessageCenter::unregister_all`], ends it the same way. An open stream
/// never ends on its own.
pub struct MessageStream<M> {
    shared: Arc<StreamShared<M>>,
    center: MessageCenter,
    token: SubscriptionToken,
    terminated: bool,
}

impl<M: AsyncMessage> MessageStream<M> {
    pub(crate) fn open(center: MessageCenter, scope: SubjectScope, buffer_size: usize) -> Result<Self> {
        if buffer_size == 0 {
            return Err(MissiveError::InvalidBufferSize(buffer_size));
        }

        let shared = Arc::new(StreamShared::new(buffer_size));
        let sink = Arc::clone(&shared);
        let context = center.delivery_context::<M>();
        let callback: BusCallback = Arc::new(move |envelope: &Envelope| {
            match M::decode(envelope) {
                Some(message) => sink.push(message),
                None => context.decode_mismatch(envelope),
            }
        });
        let weak: Weak<StreamShared<M>> = Arc::downgrade(&shared);
        let on_cancel: CancelHook = Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.close();
            }
        });
        let token = center.register_callback::<M>(scope, None, callback, Some(on_cancel))?;
        debug!(token = token.id(), message = %M::NAME, buffer_size, "Stream opened");

        Ok(Self {
            shared,
            center,
            token,
            terminated: false,
        })
    }
}

impl<M> MessageStream<M> {
    /// Ends the stream and cancels its subscription.
    ///
    /// Buffered messages are discarded. Calling this more than once, or
    /// dropping the stream afterwards, does nothing further.
    pub fn close(&mut self) {
        self.terminate();
    }

    fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.center.unregister(&self.token);
        self.shared.close();
        trace!(token = self.token.id(), "Stream terminated");
    }

    /// Takes the next buffered message without waiting.
    pub fn try_next(&mut self) -> Option<M> {
        if self.terminated {
            return None;
        }
        match self.shared.pop() {
            Poll::Ready(message) => message,
            Poll::Pending => None,
        }
    }

    /// Number of buffered messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.state.lock().buffer.len()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of buffered messages.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.state.lock().capacity
    }

    /// Whether the stream has ended.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.terminated || self.shared.is_closed()
    }

    /// How many messages were evicted to make room for newer ones.
    #[must_use]
    pub fn dropped_count(&self) -> usize {
        self.shared.state.lock().evicted
    }

    /// The subscription backing this stream.
    #[must_use]
    pub fn token(&self) -> &SubscriptionToken {
        &self.token
    }

    /// Consumes the stream as a blocking iterator.
    ///
    /// Each `next` parks the calling thread until a message arrives or the
    /// stream ends. Do not call it from inside an async runtime.
    #[must_use]
    pub fn blocking_iter(self) -> BlockingStream<Self> {
        block_on_stream(self)
    }
}

impl<M> Stream for MessageStream<M> {
    type Item = M;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<M>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }
        if let Poll::Ready(next) = this.shared.pop() {
            return Poll::Ready(next);
        }
        this.shared.waker.register(cx.waker());
        // A push or close may have landed between the first check and registering.
        this.shared.pop()
    }
}

impl<M> FusedStream for MessageStream<M> {
    fn is_terminated(&self) -> bool {
        self.is_closed()
    }
}

impl<M> Drop for MessageStream<M> {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl<M> fmt::Debug for MessageStream<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("MessageStream")
            .field("token", &self.token)
            .field("buffered", &state.buffer.len())
            .field("capacity", &state.capacity)
            .field("evicted", &state.evicted)
            .field("closed", &state.closed)
            .field("terminated", &self.terminated)
            .finish()
    }
}
