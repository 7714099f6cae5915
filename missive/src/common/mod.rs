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

pub use config::{AffinityConfig, BehaviorConfig, LimitsConfig, MissiveConfig, CONFIG};
pub use dispatch::{AffinityDispatch, ConcurrentDispatch, Discipline, Dispatcher};
pub(crate) use dispatch::DeliveryContext;
pub use error::{MissiveError, Result};
pub use local_bus::LocalBus;
pub use message_center::MessageCenter;
pub use message_stream::{MessageStream, DEFAULT_BUFFER_SIZE};
pub use observer_handle::ObserverHandle;
pub use serial_queue::{QueueAffinity, SerialQueue};
pub use stats::RegistryStats;
pub use subject::{Subject, SubjectId, SubjectScope, SubjectType};
pub use subscription_token::SubscriptionToken;

mod config;
mod dispatch;
mod error;
mod local_bus;
mod message_center;
mod message_stream;
mod observer_handle;
mod serial_queue;
mod stats;
mod subject;
mod subscription_token;
