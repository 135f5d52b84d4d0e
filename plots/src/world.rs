use crate::{
    block::Block,
    pos::{BlockPos, PlotAddress},
    settings::{Settings, WORLD_HEIGHT},
};

/// The block world of the host. Implementations synchronise internally: sessions of different
/// players call into it at the same time.
pub trait BlockWorld: Send + Sync {
    fn block(&self, pos: BlockPos) -> Block;

    fn set_block(&self, pos: BlockPos, block: Block);

    /// Shows the player that an action at `pos` was refused, for example with a sound and a
    /// particle.
    fn play_deny_effect(&self, pos: BlockPos);
}

/// Resets the inside of a plot: dirt below the floor, the floor block, and air above it.
pub fn reset_plot(world: &dyn BlockWorld, pos: PlotAddress, settings: &Settings) {
    let Some((min, _)) = pos.bounds(settings) else { return };
    let floor_height = settings.floor_height();
    for x in 0..settings.plot_width {
        for z in 0..settings.plot_width {
            for y in 0..WORLD_HEIGHT {
                let block = match y {
                    y if y < floor_height => Block::Dirt,
                    y if y == floor_height => settings.floor_block,
                    _ => Block::Air,
                };
                world.set_block(min.add(BlockPos::new(x, y, z)), block);
            }
        }
    }
}

/// Paints the one block wide ring around the inside of a plot, at floor height.
pub fn paint_boundary(world: &dyn BlockWorld, pos: PlotAddress, settings: &Settings, block: Block) {
    let Some((min, _)) = pos.bounds(settings) else { return };
    let width = settings.plot_width;
    for x in -1..=width {
        for z in -1..=width {
            if x == -1 || x == width || z == -1 || z == width {
                world.set_block(min.add(BlockPos::new(x, settings.floor_height(), z)), block);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::*;
    use crate::{colour::Colour, generator::column_at, generator::ColumnKind};

    /// Block world recording writes in a map. Unwritten blocks are air.
    #[derive(Default)]
    pub struct MapWorld {
        pub blocks: Mutex<HashMap<BlockPos, Block>>,
        pub denied: Mutex<Vec<BlockPos>>,
    }

    impl BlockWorld for MapWorld {
        fn block(&self, pos: BlockPos) -> Block {
            self.blocks.lock().get(&pos).copied().unwrap_or_default()
        }

        fn set_block(&self, pos: BlockPos, block: Block) {
            self.blocks.lock().insert(pos, block);
        }

        fn play_deny_effect(&self, pos: BlockPos) {
            self.denied.lock().push(pos);
        }
    }

    fn settings() -> Settings {
        Settings { plot_width: 8, ..Settings::default() }
    }

    #[test]
    fn boundary_ring_covers_the_boundary_columns() {
        let settings = settings();
        let world = MapWorld::default();
        let block = Block::Concrete { colour: Colour::Red };
        paint_boundary(&world, PlotAddress::new(-1, 0), &settings, block);

        let blocks = world.blocks.lock();
        assert_eq!(blocks.len(), 4 * 9);
        for (pos, painted) in blocks.iter() {
            assert_eq!(*painted, block);
            assert_eq!(pos.y, settings.floor_height());
            assert_eq!(column_at(pos.x, pos.z, &settings), ColumnKind::Boundary);
        }
    }

    #[test]
    fn reset_layers_dirt_floor_and_air() {
        let settings = settings();
        let world = MapWorld::default();
        reset_plot(&world, PlotAddress::new(0, 0), &settings);

        let (min, max) = PlotAddress::new(0, 0).bounds(&settings).unwrap();
        assert_eq!(world.blocks.lock().len(), (8 * 8 * WORLD_HEIGHT) as usize);
        assert_eq!(world.block(BlockPos::new(min.x, 21, min.z)), Block::Dirt);
        assert_eq!(world.block(BlockPos::new(max.x, 22, max.z)), Block::Grass);
        assert_eq!(world.block(BlockPos::new(min.x, 23, max.z)), Block::Air);
        // Nothing outside of the plot is touched.
        assert!(!world.blocks.lock().contains_key(&BlockPos::new(min.x - 1, 22, min.z)));
    }
}
