use std::sync::Arc;

use rand::Rng;

use super::{current_plot, CommandContext, CommandOutput};
use crate::{
    block::Block,
    colour::random_colour,
    error::{PlotError, Result},
    plot::Plot,
    world::paint_boundary,
};

/// Claims the plot the player is standing in and paints its border in a fresh colour.
pub fn claim(ctx: &CommandContext, rng: &mut impl Rng) -> Result<CommandOutput> {
    let session = ctx.session;
    let settings = session.settings();
    let pos = current_plot(ctx)?;

    match session.db().plot(pos) {
        Ok(current) => return Err(PlotError::AlreadyClaimed(current.owner_name.clone())),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }
    // Plots that cannot be read still count towards the limit.
    let owned = session.plot_positions().len();
    if owned >= settings.maximum_plots {
        return Err(PlotError::LimitExceeded { owned, maximum: settings.maximum_plots });
    }
    let used = session.plots().iter().map(|plot| plot.colour).collect::<Vec<_>>();
    let colour = random_colour(&used, rng);

    let actor = session.actor();
    session.db().claim_plot(pos, Arc::new(Plot::new(actor.id, actor.name.clone(), colour)))?;
    session.update_plot_positions(|positions| positions.push(pos))?;
    paint_boundary(ctx.world, pos, settings, Block::Concrete { colour });

    tracing::info!(player = %actor.name, ?pos, ?colour, "claimed plot");
    Ok(CommandOutput::message(format!(
        "[{}] Successfully claimed the plot. ({}/{})",
        colour.display_name(),
        owned + 1,
        settings.maximum_plots
    )))
}
