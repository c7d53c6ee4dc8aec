use bacflow_core::types::{ErrorClass, ErrorCode};
use bacflow_datalink::DataLinkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("datalink error: {0}")]
    DataLink(#[from] DataLinkError),
    #[error("encode error: {0}")]
    Encode(#[from] bacflow_core::EncodeError),
    #[error("decode error: {0}")]
    Decode(#[from] bacflow_core::DecodeError),
    #[error("no free invoke id before the deadline")]
    NoTransactionCapacity,
    #[error("no reply before the timeout")]
    ReplyTimeout,
    #[error("unexpected reply type")]
    UnexpectedPayloadType,
    #[error("request of {size} bytes exceeds the device's max APDU of {max}")]
    PayloadTooLarge { size: usize, max: usize },
    #[error("remote service error for service choice {service_choice}")]
    RemoteServiceError {
        service_choice: u8,
        error_class_raw: Option<u32>,
        error_code_raw: Option<u32>,
        error_class: Option<ErrorClass>,
        error_code: Option<ErrorCode>,
    },
    #[error("remote reject reason {reason}")]
    RemoteReject { reason: u8 },
    #[error("remote abort reason {reason} (server={server})")]
    RemoteAbort { reason: u8, server: bool },
    #[error("segmented replies are not supported")]
    SegmentationNotSupported,
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: usize,
        last: Box<ClientError>,
    },
}

impl ClientError {
    /// Errors the remote device produced on purpose; retrying cannot help.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteServiceError { .. }
                | Self::RemoteReject { .. }
                | Self::RemoteAbort { .. }
                | Self::SegmentationNotSupported
        )
    }

    /// The error behind a [`RetriesExhausted`](Self::RetriesExhausted) wrapper.
    pub fn root(&self) -> &ClientError {
        match self {
            Self::RetriesExhausted { last, .. } => last.root(),
            other => other,
        }
    }
}
