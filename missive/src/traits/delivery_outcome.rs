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

use std::fmt::Display;

/// The value a message handler returns.
///
/// Handlers either return nothing or a `Result`. An `Err` is reported at the
/// dispatch boundary (logged and counted in
/// [`RegistryStats::handler_failures`](crate::RegistryStats::handler_failures));
/// it never reaches the poster and never cancels the subscription.
pub trait DeliveryOutcome: Send + 'static {
    /// Converts the outcome into a failure description, if it is one.
    fn into_failure(self) -> Option<String>;
}

impl DeliveryOutcome for () {
    #[inline]
    fn into_failure(self) -> Option<String> {
        None
    }
}

impl<E> DeliveryOutcome for Result<(), E>
where
    E: Display + Send + 'static,
{
    fn into_failure(self) -> Option<String> {
        self.err().map(|err| err.to_string())
    }
}
