use super::{CommandContext, CommandOutput};
use crate::error::{PlotError, Result};

/// Teleports the player to one of the plots it owns. Plots are numbered from 1 as in `/p list`.
pub fn teleport(ctx: &CommandContext, number: usize) -> Result<CommandOutput> {
    let session = ctx.session;
    let positions = session.plot_positions();
    if number < 1 || number > positions.len() {
        return Err(PlotError::UnknownPlot(number));
    }
    let pos = positions[number - 1];
    let plot = session.db().plot(pos)?;
    Ok(CommandOutput::teleport(
        format!("[{}] Successfully teleported to your plot.", plot.colour.display_name()),
        pos.teleport_position(session.settings()),
    ))
}
