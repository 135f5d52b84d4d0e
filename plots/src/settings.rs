use crate::{block::Block, colour::Colour};

/// Width of the road between plots, excluding the boundary blocks.
pub const PATH_WIDTH: i32 = 5;
/// Boundary width of 2 blocks, 1 block around all sides.
pub const BOUNDARY_WIDTH: i32 = 2;
/// Number of block layers in the world.
pub const WORLD_HEIGHT: i32 = 256;

/// Settings shared by the generator, the store and the sessions. Changing them changes the
/// appearance of plots generated from then on.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Width in blocks of the editable part of each plot.
    pub plot_width: i32,
    /// Maximum amount of plots a player may claim.
    pub maximum_plots: usize,
    /// Highest Y of the dirt filling under roads.
    pub base_height: i32,
    /// Block on the floor of each plot.
    pub floor_block: Block,
    /// Block surrounding unclaimed plots. Claimed plots get a concrete border in their colour.
    pub boundary_block: Block,
    /// Surface block of the roads.
    pub road_block: Block,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            plot_width: 128,
            maximum_plots: 16,
            base_height: 20,
            floor_block: Block::Grass,
            boundary_block: Block::StainedTerracotta { colour: Colour::Cyan },
            road_block: Block::Concrete { colour: Colour::Grey },
        }
    }
}

impl Settings {
    /// Total width of one grid cell: road, boundary and plot.
    pub fn stride(&self) -> i32 {
        PATH_WIDTH + BOUNDARY_WIDTH + self.plot_width
    }

    /// Y of the plot floor and the boundary blocks.
    pub fn floor_height(&self) -> i32 {
        self.base_height + 2
    }

    /// Y where a player stands safely on the road.
    pub fn road_height(&self) -> i32 {
        self.base_height + 4
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.plot_width < 1 {
            return Err(format!("plot_width must be positive, got {}", self.plot_width));
        }
        if self.maximum_plots == 0 {
            return Err("maximum_plots must be at least 1".to_string());
        }
        if self.base_height < 0 || self.road_height() >= WORLD_HEIGHT {
            return Err(format!("base_height {} does not fit in the world", self.base_height));
        }
        Ok(())
    }
}
