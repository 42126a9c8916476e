//! Converts ordered lists of [Value]s to and from the binary payload handed across the scheduling
//! boundary.
//!
//! Each value becomes one [Payload] carrying the serde_json form of the value, marked with the
//! `json/value` encoding. The list is wrapped in [Payloads] and protobuf-encoded. The codec
//! holds no state.

use crate::{errors::SerializationError, types::TypeTag, value::Value};
use prost::Message;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

pub static ENCODING_PAYLOAD_KEY: &str = "encoding";
pub static JSON_VALUE_ENCODING: &str = "json/value";

#[derive(Clone, PartialEq, prost::Message)]
pub struct Payload {
    #[prost(map = "string, bytes", tag = "1")]
    pub metadata: HashMap<String, Vec<u8>>,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Payloads {
    #[prost(message, repeated, tag = "1")]
    pub payloads: Vec<Payload>,
}

impl Payload {
    /// Returns the encoding this payload claims, if it is present and valid utf-8
    pub fn encoding(&self) -> Option<&str> {
        self.metadata
            .get(ENCODING_PAYLOAD_KEY)
            .and_then(|e| std::str::from_utf8(e).ok())
    }
}

/// Serialize one value into a payload
pub fn to_payload(value: &Value) -> Result<Payload, SerializationError> {
    value.check_encodable()?;
    let data = serde_json::to_vec(value)?;
    let mut metadata = HashMap::new();
    metadata.insert(
        ENCODING_PAYLOAD_KEY.to_string(),
        JSON_VALUE_ENCODING.as_bytes().to_vec(),
    );
    Ok(Payload { metadata, data })
}

/// Deserialize one payload into a value
pub fn from_payload(payload: &Payload) -> Result<Value, SerializationError> {
    match payload.encoding() {
        Some(enc) if enc == JSON_VALUE_ENCODING => Ok(serde_json::from_slice(&payload.data)?),
        other => Err(SerializationError::WrongEncoding(other.map(ToOwned::to_owned))),
    }
}

/// Encodes an ordered list of values into a single binary blob. Fails on the first value which
/// is, or contains, a kind that cannot be serialized.
pub fn encode_args(values: &[Value]) -> Result<Vec<u8>, SerializationError> {
    let payloads = values
        .iter()
        .map(to_payload)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Payloads { payloads }.encode_to_vec())
}

/// Decodes a blob produced by [encode_args], checking each value against the corresponding
/// entry of `target`
pub fn decode_args(data: &[u8], target: &[TypeTag]) -> Result<Vec<Value>, SerializationError> {
    let values = decode_untyped(data)?;
    if values.len() != target.len() {
        return Err(SerializationError::ArityMismatch {
            expected: target.len(),
            actual: values.len(),
        });
    }
    for (i, (value, expected)) in values.iter().zip(target).enumerate() {
        if !value.conforms_to(expected) {
            return Err(SerializationError::TypeMismatch {
                index: i + 1,
                expected: expected.clone(),
                actual: value.type_tag(),
            });
        }
    }
    Ok(values)
}

/// Decodes a blob produced by [encode_args] without checking value types
pub fn decode_untyped(data: &[u8]) -> Result<Vec<Value>, SerializationError> {
    Payloads::decode(data)?
        .payloads
        .iter()
        .map(from_payload)
        .collect()
}

pub fn encode_one(value: &Value) -> Result<Vec<u8>, SerializationError> {
    encode_args(std::slice::from_ref(value))
}

pub fn decode_one(data: &[u8], target: &TypeTag) -> Result<Value, SerializationError> {
    let mut values = decode_args(data, std::slice::from_ref(target))?;
    Ok(values.remove(0))
}

/// Decodes a single value straight into a serde type
pub fn decode_typed<T: DeserializeOwned>(data: &[u8]) -> Result<T, SerializationError> {
    decode_one(data, &TypeTag::Any)?.deserialize_into()
}
