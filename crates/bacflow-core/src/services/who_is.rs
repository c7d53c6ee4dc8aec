use crate::apdu::{unconfirmed::service, UnconfirmedRequestHeader};
use crate::encoding::{
    primitives::{decode_optional_ctx_unsigned, encode_ctx_unsigned},
    reader::Reader,
    writer::Writer,
};
use crate::types::MAX_INSTANCE;
use crate::{DecodeError, EncodeError};

pub const SERVICE_WHO_IS: u8 = service::WHO_IS;

/// Who-Is with an optional device-instance range. The limits travel as a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhoIsRequest {
    pub low_limit: Option<u32>,
    pub high_limit: Option<u32>,
}

impl WhoIsRequest {
    pub const fn global() -> Self {
        Self {
            low_limit: None,
            high_limit: None,
        }
    }

    pub fn range(low: u32, high: u32) -> Result<Self, EncodeError> {
        if low > high || high > MAX_INSTANCE {
            return Err(EncodeError::ValueOutOfRange);
        }
        Ok(Self {
            low_limit: Some(low),
            high_limit: Some(high),
        })
    }

    /// Whether a device instance answers this request.
    pub fn matches(&self, instance: u32) -> bool {
        match (self.low_limit, self.high_limit) {
            (Some(low), Some(high)) => (low..=high).contains(&instance),
            _ => true,
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        UnconfirmedRequestHeader {
            service_choice: SERVICE_WHO_IS,
        }
        .encode(w)?;
        match (self.low_limit, self.high_limit) {
            (Some(low), Some(high)) => {
                encode_ctx_unsigned(w, 0, low)?;
                encode_ctx_unsigned(w, 1, high)
            }
            (None, None) => Ok(()),
            _ => Err(EncodeError::Message("who-is limits must be given together")),
        }
    }

    pub fn decode_after_header(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let low_limit = decode_optional_ctx_unsigned(r, 0)?;
        let high_limit = decode_optional_ctx_unsigned(r, 1)?;
        if low_limit.is_some() != high_limit.is_some() {
            return Err(DecodeError::InvalidValue);
        }
        Ok(Self {
            low_limit,
            high_limit,
        })
    }
}
