use std::sync::Arc;

use super::{owned_plot, CommandContext, CommandOutput};
use crate::{
    error::{PlotError, Result},
    plot::Plot,
};

/// Lets a connected player edit the plot the owner is standing in.
pub fn add_helper(ctx: &CommandContext, name: &str) -> Result<CommandOutput> {
    let (pos, plot) = owned_plot(ctx)?;
    let helper = ctx.registry.find_by_name(name).ok_or_else(|| PlotError::UnknownPlayer(name.to_string()))?;
    let helper = helper.actor();
    if plot.can_edit(helper.id) {
        return Ok(CommandOutput::message(format!("{} may already edit this plot.", helper.name)));
    }

    let mut updated = Plot::clone(&plot);
    updated.helpers.push(helper.id);
    ctx.session.db().store_plot(pos, Arc::new(updated))?;

    tracing::info!(player = %ctx.session.actor().name, helper = %helper.name, ?pos, "added helper");
    Ok(CommandOutput::message(format!("{} may now edit this plot.", helper.name)))
}

/// Takes away the right of a connected player to edit the plot the owner is standing in.
pub fn remove_helper(ctx: &CommandContext, name: &str) -> Result<CommandOutput> {
    let (pos, plot) = owned_plot(ctx)?;
    let helper = ctx.registry.find_by_name(name).ok_or_else(|| PlotError::UnknownPlayer(name.to_string()))?;
    let helper = helper.actor();
    if !plot.helpers.contains(&helper.id) {
        return Ok(CommandOutput::message(format!("{} is not a helper of this plot.", helper.name)));
    }

    let mut updated = Plot::clone(&plot);
    updated.helpers.retain(|id| *id != helper.id);
    ctx.session.db().store_plot(pos, Arc::new(updated))?;

    tracing::info!(player = %ctx.session.actor().name, helper = %helper.name, ?pos, "removed helper");
    Ok(CommandOutput::message(format!("{} may no longer edit this plot.", helper.name)))
}
