/// Confirmed-service request/response headers and error types.
pub mod confirmed;
/// APDU kind discriminant and the tagged header union.
pub mod pdu;
/// Unconfirmed-service request header.
pub mod unconfirmed;

pub use confirmed::{
    decode_error_pair, decode_error_values, AbortPdu, BacnetError, ComplexAckHeader,
    ConfirmedRequestHeader, RejectPdu, SegmentAck, SimpleAck,
};
pub use pdu::{Apdu, ApduType};
pub use unconfirmed::UnconfirmedRequestHeader;
