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

//! Test support for crates built on Missive.
//!
//! ```rust,ignore
//! use missive_test::prelude::*;
//!
//! #[missive_test]
//! async fn delivers_to_observer() -> anyhow::Result<()> {
//!     // ... register observers, post, assert
//!     Ok(())
//! }
//! ```
//!
//! The test function must be `async` and return a value with an `unwrap`
//! method, typically `anyhow::Result<()>`.

pub use missive_test_macro::missive_test;

/// Commonly used test items.
pub mod prelude {
    pub use missive_test_macro::missive_test;
}

/// Paths used by the code the `#[missive_test]` attribute expands to.
#[doc(hidden)]
pub mod __private {
    pub use parking_lot;
    pub use tokio;
    pub use tracing;
}
