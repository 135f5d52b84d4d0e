use super::{owned_plot, CommandContext, CommandOutput};
use crate::{error::Result, world::reset_plot};

/// Resets the terrain of the plot the player is standing in without giving up the claim.
pub fn clear(ctx: &CommandContext) -> Result<CommandOutput> {
    let (pos, plot) = owned_plot(ctx)?;
    reset_plot(ctx.world, pos, ctx.session.settings());
    tracing::info!(player = %ctx.session.actor().name, ?pos, "cleared plot");
    Ok(CommandOutput::message(format!("[{}] Successfully cleared the plot.", plot.colour.display_name())))
}
