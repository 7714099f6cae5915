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

use missive::prelude::*;

use crate::setup::TestSubject;

#[missive_message(name = "TestAsyncMessage", subject = TestSubject)]
pub struct TestAsyncMessage {
    pub content: String,
}

impl TestAsyncMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[missive_message(name = "test.counter_tick", subject = TestSubject, dispatch = "both")]
#[derive(PartialEq, Eq)]
pub struct CounterTick {
    pub value: u32,
}

#[missive_message(name = "test.ping", dispatch = "both")]
#[derive(PartialEq, Eq)]
pub struct Ping;

#[missive_message(name = "test.reading")]
#[derive(PartialEq)]
pub struct Reading {
    pub celsius: f64,
    pub samples: Vec<f32>,
}

impl Reading {
    pub fn new(celsius: f64) -> Self {
        Self {
            celsius,
            samples: vec![1.5, -2.25],
        }
    }
}

/// A message with a hand-written codec and a flat payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handoff {
    pub from: String,
    pub to: String,
}

impl MessageCodec for Handoff {
    type Subject = TestSubject;
    const NAME: MessageName = MessageName::from_static("test.handoff");

    fn decode(envelope: &Envelope) -> Option<Self> {
        if envelope.name != Self::NAME {
            return None;
        }
        Some(Self {
            from: envelope.payload.get_str("from")?.to_owned(),
            to: envelope.payload.get_str("to")?.to_owned(),
        })
    }

    fn encode(&self) -> Envelope {
        Envelope::new(
            Self::NAME,
            Payload::new()
                .with("from", self.from.clone())
                .with("to", self.to.clone()),
        )
    }
}

impl AsyncMessage for Handoff {}
impl AffinityMessage for Handoff {}
