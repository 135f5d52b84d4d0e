//! Fields shared by the messages in both directions.

use std::io::{Cursor, Read, Write};

use anyhow::{bail, Context};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use plots::{block::Block, colour::Colour, pos::BlockPos};
use uuid::Uuid;

pub fn read_string(rdr: &mut Cursor<&[u8]>) -> anyhow::Result<String> {
    let len = rdr.read_u32::<LittleEndian>()? as usize;
    let remaining = rdr.get_ref().len() - rdr.position() as usize;
    if len > remaining {
        bail!("string of {len} bytes with only {remaining} bytes left");
    }
    let mut buffer = vec![0u8; len];
    rdr.read_exact(&mut buffer)?;
    String::from_utf8(buffer).context("string is not utf-8")
}

pub fn write_string(wtr: &mut impl Write, s: &str) -> anyhow::Result<()> {
    wtr.write_u32::<LittleEndian>(s.len() as u32)?;
    wtr.write_all(s.as_bytes())?;
    Ok(())
}

pub fn read_uuid(rdr: &mut Cursor<&[u8]>) -> anyhow::Result<Uuid> {
    let mut bytes = [0u8; 16];
    rdr.read_exact(&mut bytes)?;
    Ok(Uuid::from_bytes(bytes))
}

pub fn read_block_pos(rdr: &mut Cursor<&[u8]>) -> anyhow::Result<BlockPos> {
    let x = rdr.read_i32::<LittleEndian>()?;
    let y = rdr.read_i32::<LittleEndian>()?;
    let z = rdr.read_i32::<LittleEndian>()?;
    Ok(BlockPos::new(x, y, z))
}

pub fn write_block_pos(wtr: &mut impl Write, pos: BlockPos) -> anyhow::Result<()> {
    wtr.write_i32::<LittleEndian>(pos.x)?;
    wtr.write_i32::<LittleEndian>(pos.y)?;
    wtr.write_i32::<LittleEndian>(pos.z)?;
    Ok(())
}

/// Blocks are sent as their index, followed by a colour index for coloured blocks.
pub fn read_block(rdr: &mut Cursor<&[u8]>) -> anyhow::Result<Block> {
    let index = rdr.read_u32::<LittleEndian>()?;
    let colour = match Block::from_u32(index, None) {
        Some(block) => return Ok(block),
        None => {
            let colour_index = rdr.read_u32::<LittleEndian>()?;
            Colour::from_u32(colour_index).context("unsupported colour")?
        }
    };
    Block::from_u32(index, Some(colour)).context("unsupported block")
}

pub fn write_block(wtr: &mut impl Write, block: Block) -> anyhow::Result<()> {
    wtr.write_u32::<LittleEndian>(block.as_u32())?;
    if let Some(colour) = block.colour() {
        wtr.write_u32::<LittleEndian>(colour.as_u32())?;
    }
    Ok(())
}
