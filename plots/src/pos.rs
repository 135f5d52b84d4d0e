use byteorder::{ByteOrder, LittleEndian};

use crate::{
    error::{PlotError, Result},
    settings::{Settings, PATH_WIDTH, WORLD_HEIGHT},
};

/// Absolute position of a block in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> BlockPos {
        BlockPos { x, y, z }
    }

    pub fn add(self, other: BlockPos) -> BlockPos {
        BlockPos::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// The neighbouring block on the given face. Stays put at the edge of the coordinate range.
    pub fn side(self, face: Face) -> BlockPos {
        match face {
            Face::Down => BlockPos::new(self.x, self.y.saturating_sub(1), self.z),
            Face::Up => BlockPos::new(self.x, self.y.saturating_add(1), self.z),
            Face::North => BlockPos::new(self.x, self.y, self.z.saturating_sub(1)),
            Face::South => BlockPos::new(self.x, self.y, self.z.saturating_add(1)),
            Face::West => BlockPos::new(self.x.saturating_sub(1), self.y, self.z),
            Face::East => BlockPos::new(self.x.saturating_add(1), self.y, self.z),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Face {
    pub fn from_u32(index: u32) -> Option<Face> {
        match index {
            0 => Some(Face::Down),
            1 => Some(Face::Up),
            2 => Some(Face::North),
            3 => Some(Face::South),
            4 => Some(Face::West),
            5 => Some(Face::East),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            Face::Down => 0,
            Face::Up => 1,
            Face::North => 2,
            Face::South => 3,
            Face::West => 4,
            Face::East => 5,
        }
    }
}

/// Position of a plot on the plot grid. Like chunk positions these are not absolute coordinates
/// but coordinates scaled by the full size of a plot including its road and boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct PlotAddress {
    pub x: i32,
    pub z: i32,
}

impl PlotAddress {
    pub const fn new(x: i32, z: i32) -> PlotAddress {
        PlotAddress { x, z }
    }

    /// The plot whose grid cell holds `pos`. Rounds towards negative infinity so that X = -1 is in
    /// plot -1, not plot 0.
    pub fn from_block_pos(pos: BlockPos, settings: &Settings) -> PlotAddress {
        let stride = settings.stride();
        PlotAddress::new(pos.x.div_euclid(stride), pos.z.div_euclid(stride))
    }

    pub fn add(self, other: PlotAddress) -> PlotAddress {
        PlotAddress::new(self.x + other.x, self.z + other.z)
    }

    /// Low corner of the grid cell in 64-bit coordinates, which cannot overflow.
    fn origin(self, settings: &Settings) -> (i64, i64) {
        let stride = settings.stride() as i64;
        (self.x as i64 * stride, self.z as i64 * stride)
    }

    /// Low corner of the grid cell, at Y = 0. `None` for the cells at the far edges of the world
    /// that do not fit in 32-bit coordinates as a whole.
    pub fn absolute(self, settings: &Settings) -> Option<BlockPos> {
        let (x, z) = self.origin(settings);
        let last = settings.stride() as i64 - 1;
        let fits = |v: i64| i32::try_from(v).is_ok() && i32::try_from(v + last).is_ok();
        if !fits(x) || !fits(z) {
            return None;
        }
        Some(BlockPos::new(x as i32, 0, z as i32))
    }

    /// Inclusive bounds of the blocks that may be edited in the plot. Roads and boundaries fall
    /// outside of them. Cells that do not fit in the world have no editable blocks.
    pub fn bounds(self, settings: &Settings) -> Option<(BlockPos, BlockPos)> {
        let stride = settings.stride();
        let base = self.absolute(settings)?;
        let min = BlockPos::new(base.x + PATH_WIDTH + 1, 0, base.z + PATH_WIDTH + 1);
        let max = BlockPos::new(base.x + stride - 2, WORLD_HEIGHT - 1, base.z + stride - 2);
        Some((min, max))
    }

    /// Checks if `pos` is in the editable part of this plot.
    pub fn contains(self, pos: BlockPos, settings: &Settings) -> bool {
        self.bounds(settings).is_some_and(|(min, max)| within(pos, min, max))
    }

    /// A spot on the road at the corner of the plot where a player can safely stand.
    pub fn teleport_position(self, settings: &Settings) -> [f64; 3] {
        let (x, z) = self.origin(settings);
        [(x + 2) as f64 + 0.5, settings.road_height() as f64 + 0.5, (z + 2) as f64 + 0.5]
    }

    /// Key of the plot in the database: both coordinates as little endian 32-bit integers.
    pub fn encode(self) -> [u8; 8] {
        let mut key = [0; 8];
        LittleEndian::write_i32(&mut key[..4], self.x);
        LittleEndian::write_i32(&mut key[4..], self.z);
        key
    }

    pub fn decode(key: &[u8]) -> Result<PlotAddress> {
        if key.len() != 8 {
            return Err(PlotError::MalformedKey(key.len()));
        }
        Ok(PlotAddress::new(LittleEndian::read_i32(&key[..4]), LittleEndian::read_i32(&key[4..])))
    }
}

/// Checks if `pos` lies within the inclusive box spanned by `min` and `max`.
pub fn within(pos: BlockPos, min: BlockPos, max: BlockPos) -> bool {
    (pos.x >= min.x && pos.x <= max.x) && (pos.y >= min.y && pos.y <= max.y) && (pos.z >= min.z && pos.z <= max.z)
}

/// Modulo that is never negative, so the plot pattern continues across the origin.
pub fn floor_mod(a: i32, b: i32) -> i32 {
    a.rem_euclid(b)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn settings(plot_width: i32) -> Settings {
        Settings { plot_width, ..Settings::default() }
    }

    #[test]
    fn negative_coordinates_floor() {
        let settings = settings(32);
        assert_eq!(PlotAddress::from_block_pos(BlockPos::new(-1, 64, -1), &settings), PlotAddress::new(-1, -1));
        assert_eq!(PlotAddress::from_block_pos(BlockPos::new(-39, 64, 0), &settings), PlotAddress::new(-1, 0));
        assert_eq!(PlotAddress::from_block_pos(BlockPos::new(-40, 64, 38), &settings), PlotAddress::new(-2, 0));
        assert_eq!(PlotAddress::from_block_pos(BlockPos::new(39, 64, 0), &settings), PlotAddress::new(1, 0));
    }

    #[test]
    fn bounds_skip_road_and_boundary() {
        let settings = settings(32);
        let (min, max) = PlotAddress::new(0, 0).bounds(&settings).unwrap();
        assert_eq!(min, BlockPos::new(6, 0, 6));
        assert_eq!(max, BlockPos::new(37, 255, 37));
        assert_eq!(max.x - min.x + 1, 32);

        let (min, max) = PlotAddress::new(-1, 2).bounds(&settings).unwrap();
        assert_eq!(min, BlockPos::new(-33, 0, 84));
        assert_eq!(max, BlockPos::new(-2, 255, 115));
    }

    #[test]
    fn boundary_columns_are_not_editable() {
        let settings = settings(32);
        let (min, max) = PlotAddress::new(0, 0).bounds(&settings).unwrap();
        assert!(!within(BlockPos::new(5, 64, 20), min, max));
        assert!(!within(BlockPos::new(38, 64, 20), min, max));
        assert!(within(BlockPos::new(6, 64, 37), min, max));
        assert!(!within(BlockPos::new(20, 256, 20), min, max));
    }

    #[test]
    fn widening_plots_moves_only_the_max_corner() {
        let (min_a, max_a) = PlotAddress::new(0, 0).bounds(&settings(32)).unwrap();
        let (min_b, max_b) = PlotAddress::new(0, 0).bounds(&settings(40)).unwrap();
        assert_eq!(min_a, min_b);
        assert_eq!(max_b.x - max_a.x, 8);
        assert_eq!(max_b.z - max_a.z, 8);
        assert_eq!(max_b.y, max_a.y);
    }

    #[test]
    fn decode_rejects_other_lengths() {
        assert!(matches!(PlotAddress::decode(&[0; 7]), Err(PlotError::MalformedKey(7))));
        assert!(matches!(PlotAddress::decode(&[0; 16]), Err(PlotError::MalformedKey(16))));
    }

    #[test]
    fn key_layout_is_little_endian() {
        let key = PlotAddress::new(1, -2).encode();
        assert_eq!(key, [1, 0, 0, 0, 0xfe, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn teleport_position_is_on_the_road() {
        let settings = settings(32);
        assert_eq!(PlotAddress::new(1, 0).teleport_position(&settings), [41.5, 24.5, 2.5]);
    }

    #[test]
    fn cells_at_the_edge_of_the_world_are_not_editable() {
        let settings = settings(32);
        for pos in [
            BlockPos::new(i32::MAX, 64, 0),
            BlockPos::new(i32::MIN, 64, 0),
            BlockPos::new(0, 64, i32::MAX),
            BlockPos::new(i32::MIN, 64, i32::MIN),
        ] {
            let addr = PlotAddress::from_block_pos(pos, &settings);
            assert_eq!(addr.bounds(&settings), None);
            assert!(!addr.contains(pos, &settings));
        }
        // The cell holding i32::MAX still has a teleport spot, even though it lies past the edge.
        let addr = PlotAddress::from_block_pos(BlockPos::new(i32::MAX, 64, 0), &settings);
        assert!(addr.teleport_position(&settings)[0] > 2_000_000_000.0);
    }

    #[test]
    fn sides_stop_at_the_edge() {
        let edge = BlockPos::new(i32::MAX, 0, i32::MIN);
        assert_eq!(edge.side(Face::East), edge);
        assert_eq!(edge.side(Face::North), edge);
        assert_eq!(edge.side(Face::West), BlockPos::new(i32::MAX - 1, 0, i32::MIN));
    }

    proptest! {
        #[test]
        fn key_round_trips(x in any::<i32>(), z in any::<i32>()) {
            let addr = PlotAddress::new(x, z);
            prop_assert_eq!(PlotAddress::decode(&addr.encode()).unwrap(), addr);
        }

        #[test]
        fn every_block_of_a_cell_maps_to_its_address(
            gx in -1000i32..1000,
            gz in -1000i32..1000,
            dx in 0i32..39,
            dz in 0i32..39,
        ) {
            let settings = settings(32);
            let addr = PlotAddress::new(gx, gz);
            let pos = addr.absolute(&settings).unwrap().add(BlockPos::new(dx, 64, dz));
            prop_assert_eq!(PlotAddress::from_block_pos(pos, &settings), addr);
        }
    }
}
