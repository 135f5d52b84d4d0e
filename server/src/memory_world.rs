use std::sync::Arc;

use anyhow::Context;
use dashmap::DashMap;
use plots::{
    block::Block,
    generator::{Chunk, ChunkPos, Generator, CHUNK_WIDTH},
    pos::BlockPos,
    settings::Settings,
    world::BlockWorld,
};

/// Block world kept in memory. Chunks are generated the first time they are touched.
pub struct MemoryWorld {
    generator: Generator,
    chunks: DashMap<ChunkPos, Chunk>,
}

impl MemoryWorld {
    pub fn new(settings: &Settings) -> MemoryWorld {
        MemoryWorld {
            generator: Generator::new(settings),
            chunks: DashMap::new(),
        }
    }

    fn with_chunk<T>(&self, pos: BlockPos, f: impl FnOnce(&mut Chunk, u8, u8) -> T) -> T {
        let chunk_pos = ChunkPos::from_block_pos(pos);
        let mut chunk = self.chunks.entry(chunk_pos).or_insert_with(|| self.generate(chunk_pos));
        f(chunk.value_mut(), pos.x.rem_euclid(CHUNK_WIDTH) as u8, pos.z.rem_euclid(CHUNK_WIDTH) as u8)
    }

    fn generate(&self, pos: ChunkPos) -> Chunk {
        let mut chunk = Chunk::default();
        self.generator.generate_chunk(pos, &mut chunk);
        chunk
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Generates the chunks within `radius` chunks of the origin, one blocking task per row.
    pub async fn pregenerate(self: &Arc<Self>, radius: i32) -> anyhow::Result<()> {
        let mut handles = Vec::new();
        for x in -radius..=radius {
            let world = self.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                for z in -radius..=radius {
                    let pos = ChunkPos::new(x, z);
                    if !world.chunks.contains_key(&pos) {
                        let chunk = world.generate(pos);
                        world.chunks.entry(pos).or_insert(chunk);
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.context("chunk generation failed")?;
        }
        tracing::info!(radius, chunks = self.chunk_count(), "pregenerated world");
        Ok(())
    }
}

impl BlockWorld for MemoryWorld {
    fn block(&self, pos: BlockPos) -> Block {
        self.with_chunk(pos, |chunk, x, z| chunk.block(x, pos.y, z))
    }

    fn set_block(&self, pos: BlockPos, block: Block) {
        self.with_chunk(pos, |chunk, x, z| chunk.set_block(x, pos.y, z, block))
    }

    fn play_deny_effect(&self, pos: BlockPos) {
        tracing::debug!(?pos, "deny effect");
    }
}
