use crate::colour::Colour;

/// The block kinds the plot world writes or reads. Hosts map these onto their own block
/// registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    #[default]
    Air,
    Dirt,
    Grass,
    Stone,
    Concrete { colour: Colour },
    StainedTerracotta { colour: Colour },
    Wool { colour: Colour },
}

impl Block {
    pub fn from_u32(index: u32, colour: Option<Colour>) -> Option<Block> {
        match (index, colour) {
            (0, _) => Some(Block::Air),
            (1, _) => Some(Block::Dirt),
            (2, _) => Some(Block::Grass),
            (3, _) => Some(Block::Stone),
            (4, Some(colour)) => Some(Block::Concrete { colour }),
            (5, Some(colour)) => Some(Block::StainedTerracotta { colour }),
            (6, Some(colour)) => Some(Block::Wool { colour }),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            Block::Air => 0,
            Block::Dirt => 1,
            Block::Grass => 2,
            Block::Stone => 3,
            Block::Concrete { .. } => 4,
            Block::StainedTerracotta { .. } => 5,
            Block::Wool { .. } => 6,
        }
    }

    pub fn colour(&self) -> Option<Colour> {
        match self {
            Block::Concrete { colour } | Block::StainedTerracotta { colour } | Block::Wool { colour } => Some(*colour),
            _ => None,
        }
    }

    /// Parses a console name such as `grass` or `concrete`, taking the colour separately.
    pub fn from_name(name: &str, colour: Option<Colour>) -> Option<Block> {
        let index = match name {
            "air" => 0,
            "dirt" => 1,
            "grass" => 2,
            "stone" => 3,
            "concrete" => 4,
            "stained_terracotta" | "terracotta" => 5,
            "wool" => 6,
            _ => return None,
        };
        Block::from_u32(index, colour.or(Some(Colour::White)))
    }
}
