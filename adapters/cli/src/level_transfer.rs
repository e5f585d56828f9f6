use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use thief_master_core::LevelData;

const SHARE_DOMAIN: &str = "level";
const SHARE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded level payload.
pub(crate) const SHARE_HEADER: &str = "level:v1";
/// Delimiter used to separate the prefix, version and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes a level into a single-line string suitable for clipboard transfer.
pub(crate) fn encode(level: &LevelData) -> Result<String, LevelTransferError> {
    let json = serde_json::to_vec(level).map_err(LevelTransferError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!("{SHARE_HEADER}{FIELD_DELIMITER}{encoded}"))
}

/// Decodes a level from its share string representation.
pub(crate) fn decode(value: &str) -> Result<LevelData, LevelTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LevelTransferError::EmptyPayload);
    }

    let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
    let domain = parts.next().ok_or(LevelTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(LevelTransferError::MissingVersion)?;
    let payload = parts.next().ok_or(LevelTransferError::MissingPayload)?;

    if domain != SHARE_DOMAIN {
        return Err(LevelTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != SHARE_VERSION {
        return Err(LevelTransferError::UnsupportedVersion(version.to_owned()));
    }

    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(LevelTransferError::InvalidEncoding)?;
    serde_json::from_slice(&bytes).map_err(LevelTransferError::InvalidPayload)
}

/// Errors that can occur while exchanging level share strings.
#[derive(Debug)]
pub(crate) enum LevelTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the share string.
    MissingPrefix,
    /// The share string did not contain a version segment.
    MissingVersion,
    /// The share string did not include the payload segment.
    MissingPayload,
    /// The share string used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The share string used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for LevelTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "level string was empty"),
            Self::MissingPrefix => write!(f, "level string is missing the prefix"),
            Self::MissingVersion => write!(f, "level string is missing the version"),
            Self::MissingPayload => write!(f, "level string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "level prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "level version '{version}' is not supported")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode level payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse level payload: {error}")
            }
        }
    }
}

impl Error for LevelTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}
