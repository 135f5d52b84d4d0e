use std::io::{Cursor, Write};

use anyhow::{bail, Context};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use plots::{
    block::Block,
    pos::{BlockPos, Face},
};
use uuid::Uuid;

use crate::{
    dequeue::dequeue_msg,
    fields::{read_block, read_block_pos, read_string, read_uuid, write_block, write_block_pos, write_string},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ClientServerMsg {
    Disconnect,
    Join {
        id: Uuid,
        name: String,
    },
    Move (BlockPos),
    BreakBlock (BlockPos),
    PlaceBlock (BlockPos, Block),
    UseItemOnBlock {
        pos: BlockPos,
        face: Face,
        held_is_block: bool,
    },
    Command (String),
}

impl ClientServerMsg {
    pub fn dequeue_and_decode(input_buffer: &[u8]) -> Option<(usize, anyhow::Result<ClientServerMsg>)> {
        let (begin, end) = dequeue_msg(input_buffer)?;
        let msg = Self::decode(&input_buffer[begin..end]);
        Some((end, msg))
    }

    pub fn decode(input_buffer: &[u8]) -> anyhow::Result<ClientServerMsg> {
        let mut rdr = Cursor::new(input_buffer);
        let msg_type_index = rdr.read_u32::<LittleEndian>()?;

        let msg = match msg_type_index {
            0 => {
                ClientServerMsg::Disconnect
            }
            1 => {
                let id = read_uuid(&mut rdr)?;
                let name = read_string(&mut rdr)?;
                ClientServerMsg::Join { id, name }
            }
            2 => {
                ClientServerMsg::Move (read_block_pos(&mut rdr)?)
            }
            3 => {
                ClientServerMsg::BreakBlock (read_block_pos(&mut rdr)?)
            }
            4 => {
                let pos = read_block_pos(&mut rdr)?;
                let block = read_block(&mut rdr)?;
                ClientServerMsg::PlaceBlock (pos, block)
            }
            5 => {
                let pos = read_block_pos(&mut rdr)?;
                let face_index = rdr.read_u32::<LittleEndian>()?;
                let face = Face::from_u32(face_index).context("unsupported face")?;
                let held_is_block = rdr.read_u8()? != 0;
                ClientServerMsg::UseItemOnBlock { pos, face, held_is_block }
            }
            6 => {
                ClientServerMsg::Command (read_string(&mut rdr)?)
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
            ClientServerMsg::Disconnect => {
                body.write_u32::<LittleEndian>(0)?;
            }
            ClientServerMsg::Join { id, name } => {
                body.write_u32::<LittleEndian>(1)?;
                body.write_all(id.as_bytes())?;
                write_string(&mut body, name)?;
            }
            ClientServerMsg::Move (pos) => {
                body.write_u32::<LittleEndian>(2)?;
                write_block_pos(&mut body, *pos)?;
            }
            ClientServerMsg::BreakBlock (pos) => {
                body.write_u32::<LittleEndian>(3)?;
                write_block_pos(&mut body, *pos)?;
            }
            ClientServerMsg::PlaceBlock (pos, block) => {
                body.write_u32::<LittleEndian>(4)?;
                write_block_pos(&mut body, *pos)?;
                write_block(&mut body, *block)?;
            }
            ClientServerMsg::UseItemOnBlock { pos, face, held_is_block } => {
                body.write_u32::<LittleEndian>(5)?;
                write_block_pos(&mut body, *pos)?;
                body.write_u32::<LittleEndian>(face.as_u32())?;
                body.write_u8(*held_is_block as u8)?;
            }
            ClientServerMsg::Command (text) => {
                body.write_u32::<LittleEndian>(6)?;
                write_string(&mut body, text)?;
            }
        }
        wtr.write_u32::<LittleEndian>(body.len() as u32)?;
        wtr.write_all(&body)?;
        Ok(())
    }
}
