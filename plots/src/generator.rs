use crate::{
    block::Block,
    pos::{floor_mod, BlockPos},
    settings::{Settings, PATH_WIDTH, WORLD_HEIGHT},
};

/// Width of a chunk in blocks on the X and Z axis.
pub const CHUNK_WIDTH: i32 = 16;

/// What a column of the world is part of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Road,
    Boundary,
    Floor,
}

/// Finds the kind of the column at the absolute X and Z. All plots look the same, so only the
/// offset within the grid cell matters.
pub fn column_at(x: i32, z: i32, settings: &Settings) -> ColumnKind {
    let stride = settings.stride();
    let (relative_x, relative_z) = (floor_mod(x, stride), floor_mod(z, stride));
    if relative_x < PATH_WIDTH || relative_z < PATH_WIDTH {
        ColumnKind::Road
    } else if relative_x == PATH_WIDTH || relative_z == PATH_WIDTH || relative_x == stride - 1 || relative_z == stride - 1 {
        ColumnKind::Boundary
    } else {
        ColumnKind::Floor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> ChunkPos {
        ChunkPos { x, z }
    }

    pub fn from_block_pos(pos: BlockPos) -> ChunkPos {
        ChunkPos::new(pos.x >> 4, pos.z >> 4)
    }

    /// Absolute coordinates of the block in the low corner of the chunk.
    pub fn base(self) -> (i32, i32) {
        (self.x << 4, self.z << 4)
    }
}

/// A 16x256x16 column of blocks.
#[derive(Debug, Clone)]
pub struct Chunk {
    blocks: Box<[Block]>,
}

impl Default for Chunk {
    fn default() -> Self {
        Chunk {
            blocks: vec![Block::Air; (CHUNK_WIDTH * WORLD_HEIGHT * CHUNK_WIDTH) as usize].into_boxed_slice(),
        }
    }
}

impl Chunk {
    fn index(x: u8, y: i32, z: u8) -> Option<usize> {
        if !(0..WORLD_HEIGHT).contains(&y) || x as i32 >= CHUNK_WIDTH || z as i32 >= CHUNK_WIDTH {
            return None;
        }
        Some(((y * CHUNK_WIDTH + z as i32) * CHUNK_WIDTH + x as i32) as usize)
    }

    /// Block at local coordinates. Positions above or below the world are air.
    pub fn block(&self, x: u8, y: i32, z: u8) -> Block {
        Chunk::index(x, y, z).map(|i| self.blocks[i]).unwrap_or(Block::Air)
    }

    /// Sets the block at local coordinates. Positions above or below the world are ignored.
    pub fn set_block(&mut self, x: u8, y: i32, z: u8, block: Block) {
        if let Some(i) = Chunk::index(x, y, z) {
            self.blocks[i] = block;
        }
    }

    /// Highest non-air Y of a column.
    pub fn height_at(&self, x: u8, z: u8) -> Option<i32> {
        (0..WORLD_HEIGHT).rev().find(|&y| self.block(x, y, z) != Block::Air)
    }
}

/// Generator for a plot world. It holds no state besides the settings, so one generator may fill
/// different chunks from several threads at once.
#[derive(Debug, Clone)]
pub struct Generator {
    floor: Block,
    boundary: Block,
    road: Block,
    settings: Settings,
}

impl Generator {
    pub fn new(settings: &Settings) -> Generator {
        Generator {
            floor: settings.floor_block,
            boundary: settings.boundary_block,
            road: settings.road_block,
            settings: settings.clone(),
        }
    }

    pub fn generate_chunk(&self, pos: ChunkPos, chunk: &mut Chunk) {
        let (base_x, base_z) = pos.base();
        let base_y = self.settings.base_height;

        for local_x in 0..CHUNK_WIDTH as u8 {
            for local_z in 0..CHUNK_WIDTH as u8 {
                let (x, z) = (base_x + local_x as i32, base_z + local_z as i32);
                match column_at(x, z, &self.settings) {
                    ColumnKind::Road => {
                        fill(chunk, local_x, local_z, base_y);
                        chunk.set_block(local_x, base_y + 1, local_z, self.road);
                    }
                    ColumnKind::Boundary => {
                        fill(chunk, local_x, local_z, base_y + 1);
                        chunk.set_block(local_x, base_y + 2, local_z, self.boundary);
                    }
                    ColumnKind::Floor => {
                        fill(chunk, local_x, local_z, base_y + 1);
                        chunk.set_block(local_x, base_y + 2, local_z, self.floor);
                    }
                }
            }
        }
    }
}

/// Fills a column with dirt from the bottom of the world up to and including `height`.
fn fill(chunk: &mut Chunk, x: u8, z: u8, height: i32) {
    for y in 0..=height {
        chunk.set_block(x, y, z, Block::Dirt);
    }
}
