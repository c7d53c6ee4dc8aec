//! Whole-frame encoding and decoding: BVLC, NPDU, APDU header, service data.

use crate::apdu::Apdu;
use crate::bvlc::{BvlcFunction, BvlcHeader, LinkFrame, FORWARDED_ORIGIN_LEN};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::npdu::Npdu;
use crate::{DecodeError, EncodeError};

/// Largest frame a BACnet/IP datagram carries.
pub const MAX_FRAME_LEN: usize = 1497;

/// Writes a complete frame; `body` writes the APDU and its service data.
///
/// The BVLC length is back-filled once the body is known. Returns the
/// number of bytes written.
pub fn encode_frame_with<F>(
    w: &mut Writer<'_>,
    function: BvlcFunction,
    npdu: &Npdu,
    body: F,
) -> Result<usize, EncodeError>
where
    F: FnOnce(&mut Writer<'_>) -> Result<(), EncodeError>,
{
    let start = w.position();
    BvlcHeader {
        function,
        length: 0,
    }
    .encode(w)?;
    npdu.encode(w)?;
    body(w)?;
    let total = w.position() - start;
    let length = u16::try_from(total).map_err(|_| EncodeError::ValueOutOfRange)?;
    w.patch_be_u16(start + 2, length)?;
    Ok(total)
}

/// Writes link header, NPDU, the APDU header (if any) and `app_data`.
pub fn encode_frame(
    w: &mut Writer<'_>,
    function: BvlcFunction,
    npdu: &Npdu,
    apdu: Option<&Apdu>,
    app_data: &[u8],
) -> Result<usize, EncodeError> {
    encode_frame_with(w, function, npdu, |w| {
        if let Some(apdu) = apdu {
            apdu.encode(w)?;
        }
        w.write_all(app_data)
    })
}

/// A decoded data frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame<'a> {
    pub link: BvlcHeader,
    pub origin: Option<[u8; FORWARDED_ORIGIN_LEN]>,
    pub npdu: Npdu,
    /// `None` when the NPDU is a network-layer message.
    pub apdu: Option<Apdu>,
    /// Service data after the APDU header, or the network message body.
    pub data: &'a [u8],
}

/// Decodes a data frame down to the start of the service data.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame<'_>, DecodeError> {
    let link = LinkFrame::decode(bytes)?;
    if !link.carries_npdu() {
        return Err(DecodeError::Message("link frame carries no npdu"));
    }
    decode_npdu_payload(&link)
}

/// Decodes the NPDU and APDU of an already split link frame.
pub fn decode_npdu_payload<'a>(link: &LinkFrame<'a>) -> Result<Frame<'a>, DecodeError> {
    let mut r = Reader::new(link.payload);
    let npdu = Npdu::decode(&mut r)?;
    let apdu = if npdu.is_network_message() {
        None
    } else {
        Some(Apdu::decode(&mut r)?)
    };
    let data = r.read_rest();
    Ok(Frame {
        link: link.header,
        origin: link.origin,
        npdu,
        apdu,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::{decode_frame, encode_frame};
    use crate::apdu::{Apdu, ApduType, UnconfirmedRequestHeader};
    use crate::bvlc::BvlcFunction;
    use crate::encoding::writer::Writer;
    use crate::npdu::{NetworkMessage, Npdu};
    use crate::types::Address;
    use crate::DecodeError;

    #[test]
    fn length_field_covers_whole_frame() {
        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        let apdu = Apdu::UnconfirmedRequest(UnconfirmedRequestHeader { service_choice: 8 });
        let n = encode_frame(
            &mut w,
            BvlcFunction::OriginalBroadcastNpdu,
            &Npdu::application(&Address::global_broadcast(), false),
            Some(&apdu),
            &[0x09, 0x01],
        )
        .unwrap();
        let bytes = w.as_written();
        assert_eq!(n, bytes.len());
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]) as usize, bytes.len());
        assert_eq!(
            bytes,
            &[0x81, 0x0B, 0x00, 0x0E, 0x01, 0x20, 0xFF, 0xFF, 0x00, 0xFF, 0x10, 0x08, 0x09, 0x01]
        );

        let frame = decode_frame(bytes).unwrap();
        assert_eq!(frame.apdu, Some(apdu));
        assert_eq!(frame.data, &[0x09, 0x01]);
        assert_eq!(frame.npdu.destination.map(|d| d.net), Some(0xFFFF));
    }

    #[test]
    fn network_message_has_no_apdu() {
        let mut npdu = Npdu::new();
        npdu.network_message = Some(NetworkMessage {
            message_type: 0x00,
            vendor_id: None,
        });
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        let function = BvlcFunction::OriginalUnicastNpdu;
        encode_frame(&mut w, function, &npdu, None, &[0x00, 0x05]).unwrap();
        let frame = decode_frame(w.as_written()).unwrap();
        assert!(frame.apdu.is_none());
        assert_eq!(frame.data, &[0x00, 0x05]);
    }

    #[test]
    fn forwarded_frame_decodes_like_original() {
        let bytes = [
            0x81, 0x04, 0x00, 0x0F, 192, 168, 0, 5, 0xBA, 0xC0, 0x01, 0x00, 0x20, 0x01, 0x0F,
        ];
        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.origin, Some([192, 168, 0, 5, 0xBA, 0xC0]));
        let apdu = frame.apdu.unwrap();
        assert_eq!(apdu.kind(), ApduType::SimpleAck);
        assert_eq!(apdu.invoke_id(), Some(1));
    }

    #[test]
    fn control_frames_are_rejected() {
        let err = decode_frame(&[0x81, 0x00, 0x00, 0x06, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, DecodeError::Message(_)));
    }

    #[test]
    fn too_short_is_malformed() {
        assert_eq!(decode_frame(&[0x81]).unwrap_err(), DecodeError::MalformedFrame);
        assert_eq!(
            decode_frame(&[0x81, 0x0A, 0x00, 0x05, 0x01]).unwrap_err(),
            DecodeError::MalformedFrame
        );
    }
}
