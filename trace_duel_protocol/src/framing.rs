// Length-delimited message framing over TCP.
//
// Wire format: a 4-byte big-endian length prefix, then that many bytes of
// JSON. `write_message` and `read_message` move raw bytes only; callers do the
// serde_json step themselves.
//
// `MAX_MESSAGE_SIZE` bounds the allocation a hostile length prefix can cause.
// The largest real message is an `AreaChanged` carrying a snapshot with two
// full traces and the reference shape, which stays well under the cap.

use std::io::{self, Read, Write};

/// Upper bound on a single frame's payload (1 MB).
pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;

fn too_large(kind: io::ErrorKind, len: usize) -> io::Error {
    io::Error::new(
        kind,
        format!("frame of {len} bytes exceeds limit of {MAX_MESSAGE_SIZE}"),
    )
}

/// Write one frame and flush.
pub fn write_message<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_MESSAGE_SIZE)
        .ok_or_else(|| too_large(io::ErrorKind::InvalidInput, payload.len()))?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()
}

/// Read one frame.
///
/// A stream that ends before a full frame arrives yields `UnexpectedEof`; a
/// length prefix above `MAX_MESSAGE_SIZE` yields `InvalidData` without
/// reading the body.
pub fn read_message<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut prefix = [0u8; 4];
    reader.read_exact(&mut prefix)?;
    let len = u32::from_be_bytes(prefix);
    if len > MAX_MESSAGE_SIZE {
        return Err(too_large(io::ErrorKind::InvalidData, len as usize));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}
