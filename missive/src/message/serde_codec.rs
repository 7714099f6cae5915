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

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::common::{MissiveError, Result};
use crate::message::{Envelope, MessageName, Payload};

/// Encodes `message` as an anonymous envelope named `name`.
///
/// The payload is the serde representation of the message.
///
/// # Errors
///
/// [`MissiveError::Encode`] when serde refuses the value or it carries a NaN
/// or infinite float.
pub fn try_encode_serde<M: Serialize + ?Sized>(message: &M, name: MessageName) -> Result<Envelope> {
    match Payload::from_serializable(message) {
        Ok(payload) => Ok(Envelope::new(name, payload)),
        Err(err) => Err(MissiveError::Encode {
            name,
            reason: err.to_string(),
        }),
    }
}

/// Infallible form of [`try_encode_serde`].
///
/// A value that cannot be encoded is logged and yields an envelope with an
/// empty payload, which every decoder for a non-unit type rejects.
/// [`MessageCenter`](crate::MessageCenter) posts through
/// [`MessageCodec::try_encode`](crate::MessageCodec::try_encode) and never
/// sends such an envelope.
pub fn encode_serde<M: Serialize + ?Sized>(message: &M, name: MessageName) -> Envelope {
    try_encode_serde(message, name.clone()).unwrap_or_else(|err| {
        error!(error = %err, "Message could not be serialized; using an empty payload");
        Envelope::new(name, Payload::new())
    })
}

/// Decodes an envelope produced by [`encode_serde`].
///
/// Returns `None` when the envelope carries a different name or its payload
/// does not have the shape of `M`.
pub fn decode_serde<M: DeserializeOwned>(envelope: &Envelope, name: &MessageName) -> Option<M> {
    if envelope.name != *name {
        return None;
    }
    envelope.payload.to_deserialized()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Renamed {
        from: String,
        to: String,
    }

    const RENAMED: MessageName = MessageName::from_static("file.renamed");

    #[test]
    fn decode_rejects_other_names() {
        let message = Renamed {
            from: "a".into(),
            to: "b".into(),
        };
        let mut envelope = encode_serde(&message, RENAMED);
        assert_eq!(envelope.name, RENAMED);
        assert_eq!(decode_serde::<Renamed>(&envelope, &RENAMED), Some(message));

        envelope.name = MessageName::from_static("file.deleted");
        assert_eq!(decode_serde::<Renamed>(&envelope, &RENAMED), None);
    }

    #[derive(Debug, Serialize)]
    struct Reading {
        celsius: f64,
    }

    #[test]
    fn non_finite_floats_fail_to_encode() {
        const READING: MessageName = MessageName::from_static("sensor.reading");
        for celsius in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = try_encode_serde(&Reading { celsius }, READING).expect_err("non-finite");
            assert!(matches!(err, MissiveError::Encode { ref name, .. } if *name == READING));
        }
        assert!(try_encode_serde(&Reading { celsius: -40.0 }, READING).is_ok());
    }
}
