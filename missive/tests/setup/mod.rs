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
#![allow(dead_code)]

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep, timeout, Instant};
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub use messages::*;
pub use subjects::*;

mod messages;
mod subjects;

static INIT: Once = Once::new();

/// How long a test waits for an asynchronous delivery before giving up.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Initializes the global tracing subscriber for tests, writing to
/// `logs/missive_tests.txt`.
pub fn initialize_tracing() {
    INIT.call_once(|| {
        std::fs::create_dir_all("logs").expect("could not create logs dir");

        let file_appender = RollingFileAppender::new(Rotation::NEVER, "logs", "missive_tests.txt");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // Keep the writer alive until the process exits.
        Box::leak(Box::new(guard));

        let filter = EnvFilter::new("info")
            .add_directive("missive::common::message_center=debug".parse().unwrap())
            .add_directive("missive::common::message_stream=debug".parse().unwrap())
            .add_directive("missive::common::dispatch=trace".parse().unwrap())
            .add_directive("missive::common::local_bus=info".parse().unwrap())
            .add_directive("missive::common::serial_queue=info".parse().unwrap())
            .add_directive("scope_tests=debug".parse().unwrap())
            .add_directive("dispatch_tests=debug".parse().unwrap())
            .add_directive("stream_tests=debug".parse().unwrap())
            .add_directive("concurrency_tests=debug".parse().unwrap());

        let subscriber = FmtSubscriber::builder()
            .with_span_events(FmtSpan::NONE)
            .with_max_level(Level::TRACE)
            .compact()
            .with_line_number(true)
            .without_time()
            .with_target(true)
            .with_env_filter(filter)
            .with_writer(non_blocking)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    });
}

/// Receives exactly `count` items, then checks that no further item shows up
/// shortly after.
pub async fn expect_exactly<T: std::fmt::Debug>(
    rx: &mut UnboundedReceiver<T>,
    count: usize,
) -> anyhow::Result<Vec<T>> {
    let mut received = Vec::with_capacity(count);
    for _ in 0..count {
        let item = timeout(DELIVERY_TIMEOUT, rx.recv())
            .await
            .context("timed out waiting for a delivery")?
            .context("delivery channel closed")?;
        received.push(item);
    }
    if let Ok(Some(extra)) = timeout(Duration::from_millis(100), rx.recv()).await {
        bail!("unexpected extra delivery {extra:?} after {received:?}");
    }
    Ok(received)
}

/// Polls `condition` until it holds or [`DELIVERY_TIMEOUT`] passes.
pub async fn wait_until<F>(mut condition: F) -> anyhow::Result<()>
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + DELIVERY_TIMEOUT;
    while !condition() {
        if Instant::now() >= deadline {
            bail!("condition not met within {DELIVERY_TIMEOUT:?}");
        }
        sleep(Duration::from_millis(5)).await;
    }
    Ok(())
}

/// Runs `future` with the delivery timeout applied.
pub async fn within<F: Future>(future: F) -> anyhow::Result<F::Output> {
    timeout(DELIVERY_TIMEOUT, future)
        .await
        .context("timed out")
}
