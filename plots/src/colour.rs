use rand::Rng;

/// One of the 16 dye colours. Plot borders are painted in the colour of the plot, and the colour
/// is used to tell a player's plots apart in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colour {
    White,
    Orange,
    Magenta,
    LightBlue,
    Yellow,
    Lime,
    Pink,
    Grey,
    LightGrey,
    Cyan,
    Purple,
    Blue,
    Brown,
    Green,
    Red,
    Black,
}

impl Colour {
    pub const ALL: [Colour; 16] = [
        Colour::White,
        Colour::Orange,
        Colour::Magenta,
        Colour::LightBlue,
        Colour::Yellow,
        Colour::Lime,
        Colour::Pink,
        Colour::Grey,
        Colour::LightGrey,
        Colour::Cyan,
        Colour::Purple,
        Colour::Blue,
        Colour::Brown,
        Colour::Green,
        Colour::Red,
        Colour::Black,
    ];

    pub fn from_u32(index: u32) -> Option<Colour> {
        Colour::ALL.get(index as usize).copied()
    }

    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    pub fn from_name(name: &str) -> Option<Colour> {
        match name {
            "white" => Some(Colour::White),
            "orange" => Some(Colour::Orange),
            "magenta" => Some(Colour::Magenta),
            "light_blue" => Some(Colour::LightBlue),
            "yellow" => Some(Colour::Yellow),
            "lime" | "light_green" => Some(Colour::Lime),
            "pink" => Some(Colour::Pink),
            "grey" | "gray" => Some(Colour::Grey),
            "light_grey" | "light_gray" | "silver" => Some(Colour::LightGrey),
            "cyan" => Some(Colour::Cyan),
            "purple" => Some(Colour::Purple),
            "blue" => Some(Colour::Blue),
            "brown" => Some(Colour::Brown),
            "green" => Some(Colour::Green),
            "red" => Some(Colour::Red),
            "black" => Some(Colour::Black),
            _ => None,
        }
    }

    /// Readable name, e.g. "Light Blue".
    pub fn display_name(&self) -> &'static str {
        match self {
            Colour::White => "White",
            Colour::Orange => "Orange",
            Colour::Magenta => "Magenta",
            Colour::LightBlue => "Light Blue",
            Colour::Yellow => "Yellow",
            Colour::Lime => "Lime",
            Colour::Pink => "Pink",
            Colour::Grey => "Grey",
            Colour::LightGrey => "Light Grey",
            Colour::Cyan => "Cyan",
            Colour::Purple => "Purple",
            Colour::Blue => "Blue",
            Colour::Brown => "Brown",
            Colour::Green => "Green",
            Colour::Red => "Red",
            Colour::Black => "Black",
        }
    }
}

/// Picks a colour for a new plot. While fewer than 16 colours are in use, a colour that is not yet
/// in `used` is returned.
pub fn random_colour(used: &[Colour], rng: &mut impl Rng) -> Colour {
    let palette = Colour::ALL.len();
    if used.len() >= palette {
        return Colour::ALL[rng.gen_range(0..palette)];
    }
    for _ in 0..palette * palette {
        let colour = Colour::ALL[rng.gen_range(0..palette)];
        if !used.contains(&colour) {
            return colour;
        }
    }
    let unused = Colour::ALL.iter().filter(|colour| !used.contains(colour)).copied().collect::<Vec<_>>();
    if unused.is_empty() {
        Colour::ALL[rng.gen_range(0..palette)]
    } else {
        unused[rng.gen_range(0..unused.len())]
    }
}
