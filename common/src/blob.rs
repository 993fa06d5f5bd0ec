//! Codecs for the device's compact binary payloads: the settings sub-blob
//! reported inside the status response, and the alarm command payload.
//! Both travel hex-armoured over the line-based wire protocol.

use std::collections::BTreeMap;

use ciborium::value::Value;
use thiserror::Error;

use crate::types::VibrationPattern;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid hex payload: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("cbor decode failed: {0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),
    #[error("cbor encode failed: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),
    #[error("device settings blob is not a cbor map")]
    NotAMap,
    #[error("device settings blob has a non-text key")]
    NonTextKey,
}

/// Fixed bidirectional rename table between the device's terse key names
/// and the readable ones exposed to callers. Unknown keys pass through.
const KEY_ALIASES: &[(&str, &str)] = &[("lb", "ledBrightness")];

fn readable_key(device_key: &str) -> &str {
    KEY_ALIASES
        .iter()
        .find(|(device, _)| *device == device_key)
        .map(|(_, readable)| *readable)
        .unwrap_or(device_key)
}

fn device_key(readable: &str) -> &str {
    KEY_ALIASES
        .iter()
        .find(|(_, readable_name)| *readable_name == readable)
        .map(|(device, _)| *device)
        .unwrap_or(readable)
}

/// Decodes the hex-armoured CBOR settings blob into a readable-keyed map.
pub fn decode_device_settings(hex_blob: &str) -> Result<BTreeMap<String, Value>, BlobError> {
    let bytes = hex::decode(hex_blob.trim())?;
    let value: Value = ciborium::de::from_reader(bytes.as_slice())?;
    let Value::Map(entries) = value else {
        return Err(BlobError::NotAMap);
    };

    let mut settings = BTreeMap::new();
    for (key, value) in entries {
        let Value::Text(key) = key else {
            return Err(BlobError::NonTextKey);
        };
        settings.insert(readable_key(&key).to_string(), value);
    }
    Ok(settings)
}

/// Encodes a readable-keyed settings map back to the device's wire form.
pub fn encode_device_settings(settings: &BTreeMap<String, Value>) -> Result<String, BlobError> {
    let entries: Vec<(Value, Value)> = settings
        .iter()
        .map(|(key, value)| (Value::Text(device_key(key).to_string()), value.clone()))
        .collect();

    let mut bytes = Vec::new();
    ciborium::ser::into_writer(&Value::Map(entries), &mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Payload for the per-side alarm command, using the device's short
/// field names: pl (intensity), du (duration), pi (pattern), tt (epoch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmPayload {
    pub intensity: u8,
    pub duration_seconds: u32,
    pub pattern: VibrationPattern,
    pub fired_at_epoch: i64,
}

pub fn encode_alarm_payload(payload: &AlarmPayload) -> Result<String, BlobError> {
    let map = Value::Map(vec![
        (
            Value::Text("pl".to_string()),
            Value::Integer(payload.intensity.into()),
        ),
        (
            Value::Text("du".to_string()),
            Value::Integer(payload.duration_seconds.into()),
        ),
        (
            Value::Text("pi".to_string()),
            Value::Text(payload.pattern.as_str().to_string()),
        ),
        (
            Value::Text("tt".to_string()),
            Value::Integer(payload.fired_at_epoch.into()),
        ),
    ]);

    let mut bytes = Vec::new();
    ciborium::ser::into_writer(&map, &mut bytes)?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn settings_round_trip_with_key_aliasing() {
        let mut settings = BTreeMap::new();
        settings.insert("ledBrightness".to_string(), Value::Integer(80.into()));
        settings.insert("unknownKey".to_string(), Value::Bool(true));

        let encoded = encode_device_settings(&settings).unwrap();

        // On the wire the readable name is replaced by the device key.
        let raw: Value = ciborium::de::from_reader(hex::decode(&encoded).unwrap().as_slice()).unwrap();
        let Value::Map(entries) = raw else { panic!("expected map") };
        assert!(entries
            .iter()
            .any(|(key, _)| matches!(key, Value::Text(text) if text == "lb")));

        let decoded = decode_device_settings(&encoded).unwrap();
        assert_eq!(decoded, settings);
    }

    #[test]
    fn rejects_non_map_blobs() {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&Value::Integer(7.into()), &mut bytes).unwrap();
        let err = decode_device_settings(&hex::encode(bytes)).unwrap_err();
        assert!(matches!(err, BlobError::NotAMap));
    }

    #[test]
    fn alarm_payload_carries_device_field_names() {
        let payload = AlarmPayload {
            intensity: 60,
            duration_seconds: 300,
            pattern: VibrationPattern::Double,
            fired_at_epoch: 1_700_000_000,
        };
        let encoded = encode_alarm_payload(&payload).unwrap();

        let raw: Value = ciborium::de::from_reader(hex::decode(&encoded).unwrap().as_slice()).unwrap();
        let Value::Map(entries) = raw else { panic!("expected map") };
        let text_key = |wanted: &str| {
            entries
                .iter()
                .find(|(key, _)| matches!(key, Value::Text(text) if text == wanted))
                .map(|(_, value)| value.clone())
        };

        assert_eq!(text_key("pl"), Some(Value::Integer(60.into())));
        assert_eq!(text_key("du"), Some(Value::Integer(300.into())));
        assert_eq!(text_key("pi"), Some(Value::Text("double".to_string())));
        assert_eq!(text_key("tt"), Some(Value::Integer(1_700_000_000i64.into())));
    }
}
