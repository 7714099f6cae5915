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

use std::sync::Arc;

use missive::prelude::*;
use missive::{LocalBus, MissiveConfig};

use crate::setup::*;

mod setup;

#[test]
fn partial_documents_keep_defaults() -> anyhow::Result<()> {
    let config = MissiveConfig::from_toml_str(
        r#"
        [limits]
        default_buffer_size = 25
        "#,
    )?;
    assert_eq!(config.limits.default_buffer_size, 25);
    assert!(config.behavior.enforce_unique_names);
    assert!(!config.behavior.log_decode_mismatches);
    assert_eq!(config.affinity.thread_name, "missive-serial");
    Ok(())
}

#[test]
fn malformed_documents_are_rejected() {
    assert!(MissiveConfig::from_toml_str("[limits]\ndefault_buffer_size = \"many\"").is_err());
}

#[test]
fn zero_buffer_size_is_rejected_at_load() {
    let err = MissiveConfig::from_toml_str(
        r#"
        [limits]
        default_buffer_size = 0
        "#,
    )
    .expect_err("zero buffer size");
    assert!(err.to_string().contains("default_buffer_size"));
}

#[test]
fn configuration_reaches_the_center() -> anyhow::Result<()> {
    let config = MissiveConfig::from_toml_str(
        r#"
        [limits]
        default_buffer_size = 4

        [behavior]
        enforce_unique_names = false
        log_decode_mismatches = true
        "#,
    )?;
    let center = MessageCenter::with_config(Arc::new(LocalBus::new()), config.clone());
    assert_eq!(center.config(), &config);

    let stream = center.messages_any::<Ping>()?;
    assert_eq!(stream.capacity(), 4);

    // With enforcement off a second type may reuse a claimed name.
    center.observe_any_serial(|_: TestAsyncMessageTwin| {})?;
    center.observe_any_serial(|_: CounterTick| {})?;
    assert_eq!(center.active_subscriptions(), 3);
    Ok(())
}

/// Reuses `test.counter_tick` under another type.
#[missive_message(name = "test.counter_tick", subject = TestSubject, dispatch = "affinity")]
struct TestAsyncMessageTwin {
    value: u32,
}
