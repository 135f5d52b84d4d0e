use super::{owned_plot, CommandContext, CommandOutput};
use crate::{
    error::Result,
    world::{paint_boundary, reset_plot},
};

/// Deletes the claim on the plot the player is standing in, resetting the plot and its border.
pub fn delete(ctx: &CommandContext) -> Result<CommandOutput> {
    let session = ctx.session;
    let settings = session.settings();
    let (pos, plot) = owned_plot(ctx)?;

    session.db().remove_plot(pos)?;
    session.update_plot_positions(|positions| positions.retain(|owned| *owned != pos))?;
    reset_plot(ctx.world, pos, settings);
    paint_boundary(ctx.world, pos, settings, settings.boundary_block);

    tracing::info!(player = %session.actor().name, ?pos, "deleted plot");
    Ok(CommandOutput::message(format!(
        "[{}] Successfully deleted the plot. ({}/{})",
        plot.colour.display_name(),
        session.plot_positions().len(),
        settings.maximum_plots
    )))
}
