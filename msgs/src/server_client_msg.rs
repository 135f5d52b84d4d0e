use std::io::{Cursor, Write};

use anyhow::bail;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use plots::session::Decision;

use crate::{
    dequeue::dequeue_msg,
    fields::{read_string, write_string},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ServerClientMsg {
    AssignSessionId (u32),
    /// Answer to a block break, block place or item use.
    EventResult (Decision),
    /// Shown above the hotbar, such as the owner of a plot being entered.
    Tip (String),
    /// Output of a command that succeeded.
    Output (String),
    /// Output of a command that failed.
    Error (String),
    Teleport ([f64; 3]),
}

impl ServerClientMsg {
    pub fn dequeue_and_decode(input_buffer: &[u8]) -> Option<(usize, anyhow::Result<ServerClientMsg>)> {
        let (begin, end) = dequeue_msg(input_buffer)?;
        let msg = Self::decode(&input_buffer[begin..end]);
        Some((end, msg))
    }

    pub fn decode(input_buffer: &[u8]) -> anyhow::Result<ServerClientMsg> {
        let mut rdr = Cursor::new(input_buffer);
        let msg_type_index = rdr.read_u32::<LittleEndian>()?;

        let msg = match msg_type_index {
            0 => {
                ServerClientMsg::AssignSessionId (rdr.read_u32::<LittleEndian>()?)
            }
            1 => {
                let decision = match rdr.read_u8()? {
                    0 => Decision::Deny,
                    _ => Decision::Allow,
                };
                ServerClientMsg::EventResult (decision)
            }
            2 => {
                ServerClientMsg::Tip (read_string(&mut rdr)?)
            }
            3 => {
                ServerClientMsg::Output (read_string(&mut rdr)?)
            }
            4 => {
                ServerClientMsg::Error (read_string(&mut rdr)?)
            }
            5 => {
                let x = rdr.read_f64::<LittleEndian>()?;
                let y = rdr.read_f64::<LittleEndian>()?;
                let z = rdr.read_f64::<LittleEndian>()?;
                ServerClientMsg::Teleport ([x, y, z])
            }
            type_index => {
                bail!("unsupported msg type: {type_index}");
            }
        };

        Ok(msg)
    }

    pub fn pack(&self, wtr: &mut impl Write) -> anyhow::Result<()> {
        let mut body = Vec::new();
        match self {
            ServerClientMsg::AssignSessionId (id) => {
                body.write_u32::<LittleEndian>(0)?;
                body.write_u32::<LittleEndian>(*id)?;
            }
            ServerClientMsg::EventResult (decision) => {
                body.write_u32::<LittleEndian>(1)?;
                body.write_u8(decision.is_allowed() as u8)?;
            }
            ServerClientMsg::Tip (text) => {
                body.write_u32::<LittleEndian>(2)?;
                write_string(&mut body, text)?;
            }
            ServerClientMsg::Output (text) => {
                body.write_u32::<LittleEndian>(3)?;
                write_string(&mut body, text)?;
            }
            ServerClientMsg::Error (text) => {
                body.write_u32::<LittleEndian>(4)?;
                write_string(&mut body, text)?;
            }
            ServerClientMsg::Teleport ([x, y, z]) => {
                body.write_u32::<LittleEndian>(5)?;
                body.write_f64::<LittleEndian>(*x)?;
                body.write_f64::<LittleEndian>(*y)?;
                body.write_f64::<LittleEndian>(*z)?;
            }
        }
        wtr.write_u32::<LittleEndian>(body.len() as u32)?;
        wtr.write_all(&body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_prefix_covers_the_body() {
        let mut buffer = Vec::new();
        ServerClientMsg::Output ("Your plots:\n1: Red".to_string()).pack(&mut buffer).unwrap();
        assert_eq!(&buffer[..4], &((buffer.len() - 4) as u32).to_le_bytes());

        let (end, msg) = ServerClientMsg::dequeue_and_decode(&buffer).unwrap();
        assert_eq!(end, buffer.len());
        assert_eq!(msg.unwrap(), ServerClientMsg::Output ("Your plots:\n1: Red".to_string()));
    }

    #[test]
    fn event_results_and_teleports() {
        let mut buffer = Vec::new();
        ServerClientMsg::EventResult (Decision::Deny).pack(&mut buffer).unwrap();
        ServerClientMsg::Teleport ([2.5, 24.5, -36.5]).pack(&mut buffer).unwrap();

        let (end, msg) = ServerClientMsg::dequeue_and_decode(&buffer).unwrap();
        assert_eq!(msg.unwrap(), ServerClientMsg::EventResult (Decision::Deny));
        let (_, msg) = ServerClientMsg::dequeue_and_decode(&buffer[end..]).unwrap();
        assert_eq!(msg.unwrap(), ServerClientMsg::Teleport ([2.5, 24.5, -36.5]));
    }

    #[test]
    fn unknown_types_are_errors() {
        assert!(ServerClientMsg::decode(&[42, 0, 0, 0]).is_err());
        assert!(ServerClientMsg::decode(&[0, 0]).is_err());
    }
}
