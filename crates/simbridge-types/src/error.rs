use thiserror::Error;

/// Global error type spanning registration, conversion and transport failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// A conflicting or duplicate binding was registered at startup.
    #[error("Registration Error: {0}")]
    Registration(String),

    /// No creator is registered for the requested data type.
    #[error("Not Registered: no {kind} creator for {type_name}")]
    NotRegistered { kind: String, type_name: String },

    /// A field value has no documented mapping into the target message.
    #[error("Out Of Range: {0}")]
    OutOfRange(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Connection Closed")]
    ConnectionClosed,
}

impl BridgeError {
    pub fn registration(msg: impl Into<String>) -> Self {
        Self::Registration(msg.into())
    }

    pub fn not_registered(kind: &str, type_name: &str) -> Self {
        Self::NotRegistered {
            kind: kind.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_error_display() {
        let err = BridgeError::registration("duplicate publisher for ImuData");
        assert!(err.to_string().contains("Registration Error"));

        let err = BridgeError::not_registered("publisher", "ClockData");
        assert_eq!(
            err.to_string(),
            "Not Registered: no publisher creator for ClockData"
        );
    }

    #[test]
    fn json_errors_become_serialization_errors() {
        let err: BridgeError = serde_json::from_str::<u32>("not json")
            .map_err(BridgeError::from)
            .unwrap_err();
        assert!(matches!(err, BridgeError::Serialization(_)));
    }
}
