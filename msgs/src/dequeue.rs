use byteorder::{ByteOrder, LittleEndian};

/// Messages longer than this are logged. They are still accepted.
const LONG_MSG_LEN: usize = 2000;

/// Finds the first complete message in the buffer. Returns the range of its body, after the
/// length prefix, or `None` if more bytes are needed.
pub fn dequeue_msg(input_buffer: &[u8]) -> Option<(usize, usize)> {
    if input_buffer.len() < 4 {
        return None
    }

    let msg_ln = LittleEndian::read_u32(&input_buffer[..4]) as usize;

    if msg_ln > LONG_MSG_LEN {
        tracing::debug!("long message: {msg_ln}");
    }

    let end = msg_ln + 4;

    if input_buffer.len() < end {
        return None
    }

    Some((4, end))
}
