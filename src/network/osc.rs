//! OSC 1.0 wire codec
//!
//! Decodes datagrams into [`ControlMessage`]s and encodes outbound messages.
//! Supported argument tags: `i` (int32), `h` (int64), `f` (float32),
//! `s` (string), and `T`/`F` which decode to `Int(1)`/`Int(0)`. Bundles are
//! flattened in element order; their time tags are ignored.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::control::{Argument, ControlMessage};

const BUNDLE_TAG: &[u8] = b"#bundle\0";
/// Bundles nested deeper than this are rejected
const MAX_BUNDLE_DEPTH: usize = 8;

/// Errors while decoding a datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OscError {
    /// Packet ended inside a field
    Truncated,
    /// String was not valid UTF-8
    InvalidString,
    /// Address did not start with '/'
    BadAddress(String),
    /// Type tag string did not start with ','
    BadTypeTags,
    /// Argument type not understood by this node
    UnsupportedType(char),
    /// Malformed bundle element or nesting too deep
    BadBundle,
}

impl std::fmt::Display for OscError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OscError::Truncated => write!(f, "OSC packet truncated"),
            OscError::InvalidString => write!(f, "OSC string is not valid UTF-8"),
            OscError::BadAddress(a) => write!(f, "OSC address must start with '/': {:?}", a),
            OscError::BadTypeTags => write!(f, "OSC type tag string must start with ','"),
            OscError::UnsupportedType(t) => write!(f, "Unsupported OSC type tag '{}'", t),
            OscError::BadBundle => write!(f, "Malformed OSC bundle"),
        }
    }
}

impl std::error::Error for OscError {}

/// Decode one datagram into its messages
pub fn decode_packet(data: &[u8]) -> Result<Vec<ControlMessage>, OscError> {
    let mut messages = Vec::new();
    decode_into(data, 0, &mut messages)?;
    Ok(messages)
}

fn decode_into(data: &[u8], depth: usize, out: &mut Vec<ControlMessage>) -> Result<(), OscError> {
    if data.starts_with(BUNDLE_TAG) {
        if depth >= MAX_BUNDLE_DEPTH {
            return Err(OscError::BadBundle);
        }
        let mut buf = &data[BUNDLE_TAG.len()..];
        if buf.remaining() < 8 {
            return Err(OscError::Truncated);
        }
        buf.advance(8); // time tag

        while buf.has_remaining() {
            if buf.remaining() < 4 {
                return Err(OscError::Truncated);
            }
            let size = buf.get_i32();
            let size = usize::try_from(size).map_err(|_| OscError::BadBundle)?;
            if size % 4 != 0 || size > buf.remaining() {
                return Err(OscError::BadBundle);
            }
            decode_into(&buf[..size], depth + 1, out)?;
            buf.advance(size);
        }
        return Ok(());
    }

    out.push(decode_message(data)?);
    Ok(())
}

fn decode_message(data: &[u8]) -> Result<ControlMessage, OscError> {
    let mut buf = data;
    let address = read_string(&mut buf)?;
    if !address.starts_with('/') {
        return Err(OscError::BadAddress(address));
    }

    // Some senders omit the type tag string for argument-less messages
    if !buf.has_remaining() {
        return Ok(ControlMessage::bare(address));
    }

    let tags = read_string(&mut buf)?;
    let tags = tags.strip_prefix(',').ok_or(OscError::BadTypeTags)?;

    let mut args = Vec::with_capacity(tags.len());
    for tag in tags.chars() {
        let arg = match tag {
            'i' => {
                ensure(&buf, 4)?;
                Argument::Int(buf.get_i32())
            }
            'h' => {
                ensure(&buf, 8)?;
                Argument::Long(buf.get_i64())
            }
            'f' => {
                ensure(&buf, 4)?;
                Argument::Float(buf.get_f32())
            }
            's' => Argument::String(read_string(&mut buf)?),
            'T' => Argument::Int(1),
            'F' => Argument::Int(0),
            other => return Err(OscError::UnsupportedType(other)),
        };
        args.push(arg);
    }

    Ok(ControlMessage::new(address, args))
}

fn ensure(buf: &&[u8], n: usize) -> Result<(), OscError> {
    if buf.remaining() < n {
        Err(OscError::Truncated)
    } else {
        Ok(())
    }
}

/// Read a NUL-terminated string padded to a 4-byte boundary
fn read_string(buf: &mut &[u8]) -> Result<String, OscError> {
    let end = buf.iter().position(|&b| b == 0).ok_or(OscError::Truncated)?;
    let padded = (end + 4) & !3;
    if padded > buf.len() {
        return Err(OscError::Truncated);
    }
    let s = std::str::from_utf8(&buf[..end])
        .map_err(|_| OscError::InvalidString)?
        .to_string();
    buf.advance(padded);
    Ok(s)
}

fn write_string(out: &mut BytesMut, s: &str) {
    out.put_slice(s.as_bytes());
    let padding = 4 - (s.len() % 4);
    out.put_bytes(0, padding);
}

/// Encode a message as a single OSC packet
pub fn encode_message(message: &ControlMessage) -> Bytes {
    let mut out = BytesMut::with_capacity(64);
    write_string(&mut out, &message.address);

    let mut tags = String::with_capacity(message.args.len() + 1);
    tags.push(',');
    for arg in &message.args {
        tags.push(match arg {
            Argument::Int(_) => 'i',
            Argument::Long(_) => 'h',
            Argument::Float(_) => 'f',
            Argument::String(_) => 's',
        });
    }
    write_string(&mut out, &tags);

    for arg in &message.args {
        match arg {
            Argument::Int(v) => out.put_i32(*v),
            Argument::Long(v) => out.put_i64(*v),
            Argument::Float(v) => out.put_f32(*v),
            Argument::String(s) => write_string(&mut out, s),
        }
    }

    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let bytes = encode_message(&ControlMessage::new("/frame_number", vec![Argument::Int(7)]));
        // "/frame_number" (13) + NUL padded to 16, ",i" padded to 4, int32
        assert_eq!(bytes.len(), 16 + 4 + 4);
        assert_eq!(&bytes[16..20], b",i\0\0");
        assert_eq!(&bytes[20..], &7i32.to_be_bytes());
    }

    #[test]
    fn test_mixed_arguments() {
        let msg = ControlMessage::new(
            "/client/abc/output/A/crop/x",
            vec![
                Argument::Float(3.5),
                Argument::Long(-9_000_000_000),
                Argument::String("wall".into()),
                Argument::Int(1),
            ],
        );
        let decoded = decode_packet(&encode_message(&msg)).unwrap();
        assert_eq!(decoded, vec![msg]);
    }

    #[test]
    fn test_true_false_tags() {
        let mut packet = Vec::new();
        packet.extend_from_slice(b"/show_stats\0");
        packet.extend_from_slice(b",TF\0");
        let decoded = decode_packet(&packet).unwrap();
        assert_eq!(decoded[0].args, vec![Argument::Int(1), Argument::Int(0)]);
    }

    #[test]
    fn test_missing_type_tags() {
        let decoded = decode_packet(b"/frame_reset\0\0\0\0").unwrap();
        assert_eq!(decoded, vec![ControlMessage::bare("/frame_reset")]);
    }

    #[test]
    fn test_bundle_is_flattened() {
        let first = encode_message(&ControlMessage::new("/frame_number", vec![Argument::Int(1)]));
        let second = encode_message(&ControlMessage::new("/frame_number", vec![Argument::Int(2)]));

        let mut packet = BytesMut::new();
        packet.put_slice(BUNDLE_TAG);
        packet.put_u64(1);
        for element in [&first, &second] {
            packet.put_i32(element.len() as i32);
            packet.put_slice(element);
        }

        let decoded = decode_packet(&packet).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1].args, vec![Argument::Int(2)]);
    }

    #[test]
    fn test_malformed_packets() {
        assert_eq!(decode_packet(b"/abc"), Err(OscError::Truncated));
        assert_eq!(decode_packet(b"abc\0"), Err(OscError::BadAddress("abc".into())));
        assert_eq!(decode_packet(b"/a\0\0,d\0\0"), Err(OscError::UnsupportedType('d')));
        assert_eq!(decode_packet(b"/a\0\0,i\0\0\0\0"), Err(OscError::Truncated));
    }
}
