//! Wire messages and the serialize / unserialize capability.
//!
//! Message bodies travel as JSON, the encoding rosbridge v2 uses for the
//! `msg`, `args` and `values` fields.  Byte arrays (`uint8[]`) are carried
//! as base64 strings; see [`base64_bytes`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use simbridge_types::BridgeError;

/// A protocol-native record with a fixed schema name.
pub trait WireMessage: Serialize + DeserializeOwned + Send + 'static {
    /// Protocol type descriptor, e.g. `"sensor_msgs/Imu"`.
    const TYPE_NAME: &'static str;
}

/// Encode a wire message into its raw payload.
pub fn serialize<T: Serialize + ?Sized>(msg: &T) -> Result<Vec<u8>, BridgeError> {
    Ok(serde_json::to_vec(msg)?)
}

/// Decode a raw payload into a wire message.
pub fn unserialize<W: DeserializeOwned>(raw: &[u8]) -> Result<W, BridgeError> {
    Ok(serde_json::from_slice(raw)?)
}

/// `#[serde(with = "base64_bytes")]` for `uint8[]` fields.
///
/// Serializes any byte container as a standard base64 string.  Decoding
/// accepts either a base64 string or a plain JSON array of numbers, since
/// peers differ in which one they emit.
pub mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Encoded(String),
        Raw(Vec<u8>),
    }

    pub fn serialize<S, B>(bytes: &B, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        B: AsRef<[u8]> + ?Sized,
    {
        serializer.serialize_str(&STANDARD.encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Encoded(text) => STANDARD
                .decode(text.as_bytes())
                .map_err(serde::de::Error::custom),
            Repr::Raw(bytes) => Ok(bytes),
        }
    }
}
