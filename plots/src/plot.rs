use uuid::Uuid;

use crate::colour::Colour;

/// A plot in the world as stored in the database.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Plot {
    /// Owner of the plot. The owner may add helpers to the plot. `None` means the plot is free.
    pub owner: Option<Uuid>,
    /// Name last recorded for the owner.
    pub owner_name: String,
    /// Players who may edit the plot but not manage it.
    #[serde(default)]
    pub helpers: Vec<Uuid>,
    /// Colour of the plot border. Also used to tell apart the plots of a single player.
    pub colour: Colour,
}

impl Plot {
    pub fn new(owner: Uuid, owner_name: impl Into<String>, colour: Colour) -> Plot {
        Plot {
            owner: Some(owner),
            owner_name: owner_name.into(),
            helpers: Vec::new(),
            colour,
        }
    }

    pub fn owned(&self) -> bool {
        self.owner.is_some()
    }

    pub fn is_owner(&self, actor: Uuid) -> bool {
        self.owner == Some(actor)
    }

    /// Owners and helpers may edit a plot.
    pub fn can_edit(&self, actor: Uuid) -> bool {
        self.is_owner(actor) || self.helpers.contains(&actor)
    }

    /// Short text shown to a player entering the plot.
    pub fn info(&self) -> String {
        if !self.owned() {
            return free_plot_info();
        }
        format!("[{}] Now entering {}'s plot.", self.colour.display_name(), self.owner_name)
    }
}

pub fn free_plot_info() -> String {
    "This plot is currently free.\n   Use /p claim to claim it.".to_string()
}
