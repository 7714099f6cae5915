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
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::message::{Sender, SenderFilter};

static NEXT_SUBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Runtime descriptor of a subject type.
///
/// Compares by [`TypeId`]; the type name is kept for diagnostics only.
#[derive(Clone, Copy)]
pub struct SubjectType {
    id: TypeId,
    name: &'static str,
}

impl SubjectType {
    /// Describes `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The described type's [`TypeId`].
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.id
    }

    /// The described type's name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for SubjectType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SubjectType {}

impl Hash for SubjectType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Process-unique identity of a [`Subject`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(u64);

impl SubjectId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SUBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subject#{}", self.0)
    }
}

struct SubjectInner<T> {
    id: SubjectId,
    value: T,
}

/// A shared object that messages can be posted on behalf of.
///
/// Each `Subject::new` mints a new identity; clones keep it. Instance-scoped
/// subscriptions match on that identity, never on the wrapped value.
pub struct Subject<T> {
    inner: Arc<SubjectInner<T>>,
}

impl<T: Send + Sync + 'static> Subject<T> {
    /// Wraps `value` under a fresh identity.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                id: SubjectId::next(),
                value,
            }),
        }
    }

    /// This subject's identity.
    #[must_use]
    pub fn id(&self) -> SubjectId {
        self.inner.id
    }

    /// The envelope sender describing this instance.
    #[must_use]
    pub fn sender(&self) -> Sender {
        Sender::instance(SubjectType::of::<T>(), self.inner.id)
    }
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Deref for Subject<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner.value
    }
}

impl<T> PartialEq for Subject<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<T> Eq for Subject<T> {}

impl<T> Hash for Subject<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("id", &self.inner.id)
            .field("value", &self.inner.value)
            .finish()
    }
}

/// Which posts a subscription receives, fixed at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubjectScope {
    /// Posts made from one specific subject.
    Instance {
        /// The subject's identity.
        id: SubjectId,
        /// The subject's type, kept for diagnostics.
        subject_type: SubjectType,
    },
    /// Posts from any subject of the type, posts from the bare type, and
    /// anonymous posts.
    TypeLevel(SubjectType),
    /// Every post of the message type.
    Any,
}

impl SubjectScope {
    /// Scope for one subject instance.
    #[must_use]
    pub fn instance<T: Send + Sync + 'static>(subject: &Subject<T>) -> Self {
        Self::Instance {
            id: subject.id(),
            subject_type: SubjectType::of::<T>(),
        }
    }

    /// Scope for every subject of type `T`.
    #[must_use]
    pub fn of_type<T: ?Sized + 'static>() -> Self {
        Self::TypeLevel(SubjectType::of::<T>())
    }

    /// Scope matching everything.
    #[must_use]
    pub const fn any() -> Self {
        Self::Any
    }

    /// The bus-level filter this scope registers with.
    #[must_use]
    pub fn sender_filter(&self) -> SenderFilter {
        match self {
            Self::Instance { id, .. } => SenderFilter::Instance(*id),
            Self::TypeLevel(subject_type) => SenderFilter::Type(*subject_type),
            Self::Any => SenderFilter::Any,
        }
    }

    /// Whether a post from `sender` falls in this scope.
    #[must_use]
    pub fn matches(&self, sender: Option<&Sender>) -> bool {
        self.sender_filter().matches(sender)
    }
}
