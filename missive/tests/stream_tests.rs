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

use futures::stream::FusedStream;
use missive::prelude::*;
use missive::{LocalBus, MissiveConfig, DEFAULT_BUFFER_SIZE};
use missive_test::prelude::*;

use crate::setup::*;

mod setup;

#[missive_test]
async fn slow_consumer_sees_the_newest_messages() -> anyhow::Result<()> {
    initialize_tracing();
    let center = MessageCenter::local();
    let mut stream = center.open::<CounterTick>(SubjectScope::any(), 2)?;

    for value in 1..=4 {
        center.post(&CounterTick { value });
    }

    assert_eq!(within(stream.next()).await?, Some(CounterTick { value: 3 }));
    assert_eq!(within(stream.next()).await?, Some(CounterTick { value: 4 }));
    assert_eq!(stream.dropped_count(), 2);
    assert!(stream.is_empty());
    Ok(())
}

#[missive_test]
async fn waiting_consumer_is_woken_by_a_post() -> anyhow::Result<()> {
    initialize_tracing();
    let center = MessageCenter::local();
    let subject = Subject::new(TestSubject::new("S"));
    let mut stream = center.messages::<TestAsyncMessage>(&subject)?;

    let consumer = tokio::spawn(async move { stream.next().await.map(|m| m.content) });
    tokio::task::yield_now().await;
    center.post_from(&TestAsyncMessage::new("wake up"), &subject);

    assert_eq!(within(consumer).await??, Some("wake up".to_string()));
    Ok(())
}

#[missive_test]
async fn streams_respect_their_scope() -> anyhow::Result<()> {
    initialize_tracing();
    let center = MessageCenter::local();
    let watched = Subject::new(TestSubject::new("watched"));
    let other = Subject::new(TestSubject::new("other"));
    let mut instance = center.messages::<TestAsyncMessage>(&watched)?;
    let mut type_level = center.messages_of_type::<TestAsyncMessage>()?;
    let mut any = center.messages_any::<TestAsyncMessage>()?;

    center.post_from(&TestAsyncMessage::new("watched"), &watched);
    center.post_from(&TestAsyncMessage::new("other"), &other);
    center.post(&TestAsyncMessage::new("anonymous"));

    let drain = |stream: &mut MessageStream<TestAsyncMessage>| {
        std::iter::from_fn(|| stream.try_next())
            .map(|m| m.content)
            .collect::<Vec<_>>()
    };
    assert_eq!(drain(&mut instance), vec!["watched"]);
    assert_eq!(drain(&mut type_level), vec!["watched", "other", "anonymous"]);
    assert_eq!(drain(&mut any), vec!["watched", "other", "anonymous"]);
    Ok(())
}

#[missive_test]
async fn dropping_a_stream_unsubscribes() -> anyhow::Result<()> {
    initialize_tracing();
    let bus = Arc::new(LocalBus::new());
    let center = MessageCenter::from_shared(bus.clone());

    let stream = center.messages_any::<Ping>()?;
    let token = stream.token().clone();
    assert!(center.is_registered(&token));
    assert_eq!(bus.observer_count(), 1);

    drop(stream);
    assert!(!center.is_registered(&token));
    assert_eq!(bus.observer_count(), 0);
    assert_eq!(center.stats().registrations_removed(), 1);
    Ok(())
}

#[missive_test]
async fn closed_stream_ends_and_discards_buffer() -> anyhow::Result<()> {
    initialize_tracing();
    let center = MessageCenter::local();
    let mut stream = center.messages_any::<Ping>()?;
    center.post(&Ping);
    assert_eq!(stream.len(), 1);

    stream.close();
    center.post(&Ping);

    assert!(stream.is_closed());
    assert!(stream.is_terminated());
    assert_eq!(stream.len(), 0);
    assert_eq!(within(stream.next()).await?, None);
    assert_eq!(center.active_subscriptions(), 0);
    Ok(())
}

#[missive_test]
async fn cancelling_a_stream_token_wakes_its_consumer() -> anyhow::Result<()> {
    initialize_tracing();
    let center = MessageCenter::local();
    let stream = center.messages_any::<Ping>()?;
    let token = stream.token().clone();

    let consumer = tokio::spawn(async move {
        let mut stream = stream;
        let next = stream.next().await;
        (next, stream.is_closed())
    });
    tokio::task::yield_now().await;

    assert!(center.unregister(&token));
    assert_eq!(within(consumer).await??, (None, true));
    assert_eq!(center.active_subscriptions(), 0);
    Ok(())
}

#[missive_test]
async fn unregister_all_ends_every_stream() -> anyhow::Result<()> {
    initialize_tracing();
    let center = MessageCenter::local();
    let mut pings = center.messages_any::<Ping>()?;
    let mut ticks = center.open::<CounterTick>(SubjectScope::any(), 4)?;
    center.post(&CounterTick { value: 1 });

    assert_eq!(center.unregister_all(), 2);

    assert_eq!(within(pings.next()).await?, None);
    assert_eq!(within(ticks.next()).await?, None);
    assert!(pings.is_closed() && pings.is_terminated());
    assert!(ticks.is_closed() && ticks.is_terminated());
    Ok(())
}

#[missive_test]
async fn open_validates_buffer_size() -> anyhow::Result<()> {
    initialize_tracing();
    let center = MessageCenter::local();

    let err = center
        .open::<Ping>(SubjectScope::any(), 0)
        .expect_err("zero-sized buffer");
    assert_eq!(err, MissiveError::InvalidBufferSize(0));
    assert_eq!(center.active_subscriptions(), 0);

    let stream = center.open::<Ping>(SubjectScope::any(), 1)?;
    assert_eq!(stream.capacity(), 1);
    Ok(())
}

#[test]
fn default_streams_use_the_configured_size() {
    let center = MessageCenter::with_config(Arc::new(LocalBus::new()), MissiveConfig::default());
    let stream = center.messages_any::<Ping>().expect("open");
    assert_eq!(stream.capacity(), DEFAULT_BUFFER_SIZE);
    assert_eq!(DEFAULT_BUFFER_SIZE, 10);

    let mut config = MissiveConfig::default();
    config.limits.default_buffer_size = 3;
    let center = MessageCenter::with_config(Arc::new(LocalBus::new()), config);
    let stream = center.open_default::<Ping>(SubjectScope::any()).expect("open");
    assert_eq!(stream.capacity(), 3);

    let mut config = MissiveConfig::default();
    config.limits.default_buffer_size = 0;
    let center = MessageCenter::with_config(Arc::new(LocalBus::new()), config);
    let stream = center.messages_any::<Ping>().expect("open");
    assert_eq!(stream.capacity(), DEFAULT_BUFFER_SIZE);
}

#[test]
fn blocking_iterator_yields_buffered_messages() {
    let center = MessageCenter::local();
    let stream = center.messages_any::<CounterTick>().expect("open");
    for value in 1..=3 {
        center.post(&CounterTick { value });
    }

    let consumer = std::thread::spawn(move || {
        stream
            .blocking_iter()
            .take(3)
            .map(|tick| tick.value)
            .collect::<Vec<_>>()
    });

    assert_eq!(consumer.join().expect("consumer thread"), vec![1, 2, 3]);
}
