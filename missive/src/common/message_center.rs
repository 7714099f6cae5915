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

use std::any::{type_name, TypeId};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, error, instrument, trace};

use crate::common::{
    AffinityDispatch, ConcurrentDispatch, DeliveryContext, Dispatcher, LocalBus, MessageStream,
    MissiveConfig, MissiveError, ObserverHandle, QueueAffinity, RegistryStats, Result, Subject,
    SubjectScope, SubscriptionToken, CONFIG, DEFAULT_BUFFER_SIZE,
};
use crate::message::{Envelope, MessageName, Sender};
use crate::traits::{
    AffinityMessage, AsyncMessage, BusCallback, DeliveryOutcome, MessageCodec, NotificationBus,
};

/// Runs once when the registration it belongs to is cancelled.
pub(crate) type CancelHook = Box<dyn FnOnce() + Send + Sync>;

struct Registration {
    message: MessageName,
    on_cancel: Option<CancelHook>,
}

impl Registration {
    fn cancel(self) -> MessageName {
        if let Some(hook) = self.on_cancel {
            hook();
        }
        self.message
    }
}

struct CenterInner {
    bus: Arc<dyn NotificationBus>,
    registrations: DashMap<ObserverHandle, Registration>,
    name_claims: DashMap<MessageName, (TypeId, &'static str)>,
    stats: Arc<RegistryStats>,
    config: MissiveConfig,
}

/// The typed registry in front of a [`NotificationBus`].
///
/// `MessageCenter` is cheap to clone; clones share one registry. Every
/// operation is safe to call from any thread, including from inside a handler.
///
/// Subscriptions registered here are owned by the center until they are
/// cancelled with [`unregister`](Self::unregister) or
/// [`unregister_all`](Self::unregister_all). Dropping a token does not
/// unsubscribe; dropping a [`MessageStream`] does.
#[derive(Clone)]
pub struct MessageCenter {
    inner: Arc<CenterInner>,
}

impl MessageCenter {
    /// A center over `bus`, configured from [`CONFIG`].
    pub fn new(bus: impl NotificationBus) -> Self {
        Self::from_shared(Arc::new(bus))
    }

    /// A center over an already shared bus, configured from [`CONFIG`].
    pub fn from_shared(bus: Arc<dyn NotificationBus>) -> Self {
        Self::with_config(bus, CONFIG.clone())
    }

    /// A center over `bus` with an explicit configuration.
    ///
    /// A zero `limits.default_buffer_size` is replaced by
    /// [`DEFAULT_BUFFER_SIZE`].
    pub fn with_config(bus: Arc<dyn NotificationBus>, mut config: MissiveConfig) -> Self {
        if config.limits.default_buffer_size == 0 {
            error!(
                fallback = DEFAULT_BUFFER_SIZE,
                "limits.default_buffer_size must be positive; using the default"
            );
            config.limits.default_buffer_size = DEFAULT_BUFFER_SIZE;
        }
        Self {
            inner: Arc::new(CenterInner {
                bus,
                registrations: DashMap::new(),
                name_claims: DashMap::new(),
                stats: Arc::new(RegistryStats::default()),
                config,
            }),
        }
    }

    /// A center over a fresh [`LocalBus`].
    #[must_use]
    pub fn local() -> Self {
        Self::new(LocalBus::new())
    }

    /// The underlying bus.
    #[must_use]
    pub fn bus(&self) -> &Arc<dyn NotificationBus> {
        &self.inner.bus
    }

    /// The configuration in effect.
    #[must_use]
    pub fn config(&self) -> &MissiveConfig {
        &self.inner.config
    }

    /// Registry counters.
    #[must_use]
    pub fn stats(&self) -> &RegistryStats {
        &self.inner.stats
    }

    /// Subscribes `dispatcher` to every `M` posted within `scope`.
    ///
    /// The subscription is active when this returns. Matching envelopes are
    /// decoded once at the bus callback; those that do not decode are dropped
    /// without reaching the handler.
    ///
    /// # Errors
    ///
    /// [`MissiveError::NameCollision`] when another message type already uses
    /// `M::NAME` on this center.
    #[instrument(level = "debug", skip(self, dispatcher))]
    pub fn register<M: MessageCodec>(
        &self,
        scope: SubjectScope,
        dispatcher: Dispatcher<M>,
    ) -> Result<SubscriptionToken> {
        let affinity = dispatcher.affinity();
        let context = self.delivery_context::<M>();
        let callback: BusCallback = Arc::new(move |envelope: &Envelope| {
            match M::decode(envelope) {
                Some(message) => dispatcher.deliver(message, &context),
                None => context.decode_mismatch(envelope),
            }
        });
        self.register_callback::<M>(scope, affinity, callback, None)
    }

    pub(crate) fn register_callback<M: MessageCodec>(
        &self,
        scope: SubjectScope,
        affinity: Option<QueueAffinity>,
        callback: BusCallback,
        on_cancel: Option<CancelHook>,
    ) -> Result<SubscriptionToken> {
        self.claim_name::<M>()?;
        let handle = self
            .inner
            .bus
            .add_observer(M::NAME, scope.sender_filter(), affinity, callback);
        self.inner.registrations.insert(
            handle.clone(),
            Registration {
                message: M::NAME,
                on_cancel,
            },
        );
        self.inner.stats.record_registration();
        debug!(token = handle.id(), message = %M::NAME, ?scope, "Subscription registered");
        Ok(SubscriptionToken::new(handle, M::NAME))
    }

    /// Concurrently handles `M` posted by `subject`.
    ///
    /// # Errors
    ///
    /// [`MissiveError::NoRuntime`] outside a tokio runtime, or
    /// [`MissiveError::NameCollision`].
    pub fn observe<M, F, Fut, O>(
        &self,
        subject: &Subject<M::Subject>,
        handler: F,
    ) -> Result<SubscriptionToken>
    where
        M: AsyncMessage,
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
        O: DeliveryOutcome,
    {
        self.register(
            SubjectScope::instance(subject),
            Dispatcher::Concurrent(ConcurrentDispatch::new(handler)?),
        )
    }

    /// Concurrently handles `M` posted by any subject of `M::Subject`, or by
    /// nobody.
    ///
    /// # Errors
    ///
    /// As [`observe`](Self::observe).
    pub fn observe_type<M, F, Fut, O>(&self, handler: F) -> Result<SubscriptionToken>
    where
        M: AsyncMessage,
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
        O: DeliveryOutcome,
    {
        self.register(
            SubjectScope::of_type::<M::Subject>(),
            Dispatcher::Concurrent(ConcurrentDispatch::new(handler)?),
        )
    }

    /// Concurrently handles every `M`, whoever posted it.
    ///
    /// # Errors
    ///
    /// As [`observe`](Self::observe).
    pub fn observe_any<M, F, Fut, O>(&self, handler: F) -> Result<SubscriptionToken>
    where
        M: AsyncMessage,
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
        O: DeliveryOutcome,
    {
        self.register(
            SubjectScope::any(),
            Dispatcher::Concurrent(ConcurrentDispatch::new(handler)?),
        )
    }

    /// Handles `M` posted by `subject` on [`SerialQueue::main`](crate::SerialQueue::main).
    ///
    /// # Errors
    ///
    /// [`MissiveError::NameCollision`].
    pub fn observe_serial<M, F, O>(
        &self,
        subject: &Subject<M::Subject>,
        handler: F,
    ) -> Result<SubscriptionToken>
    where
        M: AffinityMessage,
        F: Fn(M) -> O + Send + Sync + 'static,
        O: DeliveryOutcome,
    {
        self.register(
            SubjectScope::instance(subject),
            Dispatcher::Affinity(AffinityDispatch::new(handler)),
        )
    }

    /// Serially handles `M` posted by any subject of `M::Subject`, or by
    /// nobody.
    ///
    /// # Errors
    ///
    /// [`MissiveError::NameCollision`].
    pub fn observe_type_serial<M, F, O>(&self, handler: F) -> Result<SubscriptionToken>
    where
        M: AffinityMessage,
        F: Fn(M) -> O + Send + Sync + 'static,
        O: DeliveryOutcome,
    {
        self.register(
            SubjectScope::of_type::<M::Subject>(),
            Dispatcher::Affinity(AffinityDispatch::new(handler)),
        )
    }

    /// Serially handles every `M`, whoever posted it.
    ///
    /// # Errors
    ///
    /// [`MissiveError::NameCollision`].
    pub fn observe_any_serial<M, F, O>(&self, handler: F) -> Result<SubscriptionToken>
    where
        M: AffinityMessage,
        F: Fn(M) -> O + Send + Sync + 'static,
        O: DeliveryOutcome,
    {
        self.register(
            SubjectScope::any(),
            Dispatcher::Affinity(AffinityDispatch::new(handler)),
        )
    }

    /// Cancels a subscription.
    ///
    /// Returns `true` if this call removed it. Tokens that were already
    /// cancelled, or that came from another center, return `false` and change
    /// nothing. Deliveries already handed to a dispatcher may still run.
    pub fn unregister(&self, token: &SubscriptionToken) -> bool {
        let Some((handle, registration)) = self.inner.registrations.remove(token.handle()) else {
            trace!(token = token.id(), "Token not registered here; ignoring");
            return false;
        };
        self.inner.bus.remove_observer(&handle);
        let message = registration.cancel();
        self.inner.stats.record_unregistration();
        debug!(token = handle.id(), %message, "Subscription cancelled");
        true
    }

    /// Cancels every subscription registered through this center and
    /// returns how many there were.
    pub fn unregister_all(&self) -> usize {
        let handles: Vec<ObserverHandle> = self
            .inner
            .registrations
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        let mut removed = 0;
        for handle in handles {
            if let Some((handle, registration)) = self.inner.registrations.remove(&handle) {
                self.inner.bus.remove_observer(&handle);
                registration.cancel();
                self.inner.stats.record_unregistration();
                removed += 1;
            }
        }
        debug!(removed, "All subscriptions cancelled");
        removed
    }

    /// Whether `token` is still registered with this center.
    #[must_use]
    pub fn is_registered(&self, token: &SubscriptionToken) -> bool {
        self.inner.registrations.contains_key(token.handle())
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.inner.registrations.len()
    }

    /// Posts `message` with no sender.
    ///
    /// Reaches [`SubjectScope::Any`] and type-level subscriptions only.
    pub fn post<M: MessageCodec>(&self, message: &M) {
        self.post_with_sender(message, None);
    }

    /// Posts `message` on behalf of `subject`.
    pub fn post_from<M: MessageCodec>(&self, message: &M, subject: &Subject<M::Subject>) {
        self.post_with_sender(message, Some(subject.sender()));
    }

    /// Posts `message` on behalf of the subject type as a whole.
    ///
    /// Reaches type-level and [`SubjectScope::Any`] subscriptions, never
    /// instance ones.
    pub fn post_from_type<M: MessageCodec>(&self, message: &M) {
        self.post_with_sender(message, Some(Sender::of_type(M::subject_type())));
    }

    fn post_with_sender<M: MessageCodec>(&self, message: &M, sender: Option<Sender>) {
        if let Err(err) = self.claim_name::<M>() {
            error!(error = %err, "Refusing to post message");
            return;
        }
        let envelope = match message.try_encode() {
            Ok(envelope) => envelope.with_sender(sender),
            Err(err) => {
                self.inner.stats.record_encode_failure();
                error!(error = %err, "Refusing to post message");
                return;
            }
        };
        trace!(message = %envelope.name, sender = ?envelope.sender, "Posting");
        self.inner.stats.record_post();
        self.inner.bus.post(envelope);
    }

    /// Opens a bounded stream of `M` posted within `scope`.
    ///
    /// # Errors
    ///
    /// [`MissiveError::InvalidBufferSize`] for a zero `buffer_size`, or
    /// [`MissiveError::NameCollision`].
    pub fn open<M: AsyncMessage>(
        &self,
        scope: SubjectScope,
        buffer_size: usize,
    ) -> Result<MessageStream<M>> {
        MessageStream::open(self.clone(), scope, buffer_size)
    }

    /// [`open`](Self::open) with `limits.default_buffer_size`.
    ///
    /// # Errors
    ///
    /// As [`open`](Self::open).
    pub fn open_default<M: AsyncMessage>(&self, scope: SubjectScope) -> Result<MessageStream<M>> {
        self.open(scope, self.inner.config.limits.default_buffer_size)
    }

    /// A default-sized stream of `M` posted by `subject`.
    ///
    /// # Errors
    ///
    /// As [`open`](Self::open).
    pub fn messages<M: AsyncMessage>(
        &self,
        subject: &Subject<M::Subject>,
    ) -> Result<MessageStream<M>> {
        self.open_default(SubjectScope::instance(subject))
    }

    /// A default-sized stream of `M` at type level.
    ///
    /// # Errors
    ///
    /// As [`open`](Self::open).
    pub fn messages_of_type<M: AsyncMessage>(&self) -> Result<MessageStream<M>> {
        self.open_default(SubjectScope::of_type::<M::Subject>())
    }

    /// A default-sized stream of every `M`.
    ///
    /// # Errors
    ///
    /// As [`open`](Self::open).
    pub fn messages_any<M: AsyncMessage>(&self) -> Result<MessageStream<M>> {
        self.open_default(SubjectScope::any())
    }

    pub(crate) fn delivery_context<M: MessageCodec>(&self) -> DeliveryContext {
        DeliveryContext {
            message: M::NAME,
            stats: Arc::clone(&self.inner.stats),
            log_decode_mismatches: self.inner.config.behavior.log_decode_mismatches,
        }
    }

    fn claim_name<M: MessageCodec>(&self) -> Result<()> {
        if !self.inner.config.behavior.enforce_unique_names {
            return Ok(());
        }
        let requested = TypeId::of::<M>();
        match self.inner.name_claims.entry(M::NAME) {
            Entry::Occupied(claim) => {
                let (existing, existing_name) = *claim.get();
                if existing == requested {
                    Ok(())
                } else {
                    Err(MissiveError::NameCollision {
                        name: M::NAME,
                        existing: existing_name,
                        requested: type_name::<M>(),
                    })
                }
            }
            Entry::Vacant(slot) => {
                slot.insert((requested, type_name::<M>()));
                Ok(())
            }
        }
    }
}

impl fmt::Debug for MessageCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageCenter")
            .field("subscriptions", &self.active_subscriptions())
            .field("stats", &self.inner.stats)
            .finish_non_exhaustive()
    }
}
