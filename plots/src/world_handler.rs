use crate::{
    generator::{column_at, ColumnKind},
    pos::BlockPos,
    session::Decision,
    settings::Settings,
};

/// Handles events of the world itself, making sure liquids don't spread out of plots.
pub struct WorldHandler {
    settings: Settings,
}

impl WorldHandler {
    pub fn new(settings: &Settings) -> WorldHandler {
        WorldHandler { settings: settings.clone() }
    }

    /// Liquid may not flow onto a road or a boundary.
    pub fn handle_liquid_flow(&self, into: BlockPos) -> Decision {
        match column_at(into.x, into.z, &self.settings) {
            ColumnKind::Floor => Decision::Allow,
            ColumnKind::Road | ColumnKind::Boundary => Decision::Deny,
        }
    }
}
