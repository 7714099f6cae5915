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

use crate::common::{SubjectId, SubjectType};
use crate::message::Sender;

/// The sender-side half of a bus registration.
///
/// Derived from a [`SubjectScope`](crate::SubjectScope) and handed to
/// [`NotificationBus::add_observer`](crate::NotificationBus::add_observer).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SenderFilter {
    /// Only envelopes posted from this subject instance.
    Instance(SubjectId),
    /// Envelopes whose sender is of this subject type, with or without an
    /// instance, and anonymous envelopes.
    Type(SubjectType),
    /// Every envelope, regardless of sender.
    Any,
}

impl SenderFilter {
    /// Whether an envelope from `sender` passes this filter.
    #[must_use]
    pub fn matches(&self, sender: Option<&Sender>) -> bool {
        match (self, sender) {
            (Self::Any, _) => true,
            (Self::Instance(id), Some(sender)) => sender.instance_id() == Some(*id),
            (Self::Instance(_), None) => false,
            (Self::Type(subject_type), Some(sender)) => sender.subject_type() == *subject_type,
            (Self::Type(_), None) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Subject;

    struct Door;
    struct Window;

    #[test]
    fn any_accepts_everything() {
        let door = Subject::new(Door);
        assert!(SenderFilter::Any.matches(None));
        assert!(SenderFilter::Any.matches(Some(&door.sender())));
    }

    #[test]
    fn instance_requires_the_same_subject() {
        let front = Subject::new(Door);
        let back = Subject::new(Door);
        let filter = SenderFilter::Instance(front.id());
        assert!(filter.matches(Some(&front.sender())));
        assert!(!filter.matches(Some(&back.sender())));
        assert!(!filter.matches(Some(&Sender::of_type(SubjectType::of::<Door>()))));
        assert!(!filter.matches(None));
    }

    #[test]
    fn type_accepts_instances_bare_type_and_anonymous() {
        let filter = SenderFilter::Type(SubjectType::of::<Door>());
        assert!(filter.matches(Some(&Subject::new(Door).sender())));
        assert!(filter.matches(Some(&Sender::of_type(SubjectType::of::<Door>()))));
        assert!(filter.matches(None));
        assert!(!filter.matches(Some(&Subject::new(Window).sender())));
        assert!(!filter.matches(Some(&Sender::of_type(SubjectType::of::<Window>()))));
    }
}
