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

//! Handlers here panic on purpose, so these tests run on plain tokio runtimes
//! rather than under `#[missive_test]`, whose panic hook fails the test on any
//! panic in the process.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use missive::prelude::*;
use tokio::sync::mpsc;

use crate::setup::*;

mod setup;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_concurrent_handler_does_not_affect_others() -> anyhow::Result<()> {
    initialize_tracing();
    let center = MessageCenter::local();

    center.observe_any(|tick: CounterTick| async move {
        if tick.value == 1 {
            panic!("handler exploded on tick {}", tick.value);
        }
    })?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let token = center.observe_any(move |tick: CounterTick| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(tick.value);
        }
    })?;

    center.post(&CounterTick { value: 1 });
    center.post(&CounterTick { value: 2 });

    let mut received = expect_exactly(&mut rx, 2).await?;
    received.sort_unstable();
    assert_eq!(received, vec![1, 2]);
    wait_until(|| center.stats().handler_failures() == 1).await?;
    assert!(center.is_registered(&token));
    assert_eq!(center.active_subscriptions(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_serial_handler_keeps_its_subscription() -> anyhow::Result<()> {
    initialize_tracing();
    let center = MessageCenter::local();
    let handled = Arc::new(AtomicUsize::new(0));

    let count = Arc::clone(&handled);
    let token = center.observe_any_serial(move |tick: CounterTick| {
        if tick.value == 1 {
            panic!("serial handler exploded");
        }
        count.fetch_add(1, Ordering::SeqCst);
    })?;

    center.post(&CounterTick { value: 1 });
    center.post(&CounterTick { value: 2 });
    center.post(&CounterTick { value: 3 });
    SerialQueue::main().flush().await;

    assert_eq!(handled.load(Ordering::SeqCst), 2);
    assert_eq!(center.stats().handler_failures(), 1);
    assert!(center.is_registered(&token));
    Ok(())
}
