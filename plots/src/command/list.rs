use super::{CommandContext, CommandOutput};
use crate::error::Result;

/// Lists the plots of the player, numbered for use with `/p tp`. Every owned plot gets a line so
/// the numbers match the ones `/p tp` takes, even when a plot cannot be read.
pub fn list(ctx: &CommandContext) -> Result<CommandOutput> {
    let session = ctx.session;
    let lines = session
        .plot_positions()
        .into_iter()
        .enumerate()
        .map(|(i, pos)| match session.db().plot(pos) {
            Ok(plot) => format!("{}: {}", i + 1, plot.colour.display_name()),
            Err(e) => {
                tracing::warn!(player = %session.actor().name, ?pos, "could not read owned plot: {e}");
                format!("{}: unreadable plot at ({}, {})", i + 1, pos.x, pos.z)
            }
        })
        .collect::<Vec<_>>();
    Ok(CommandOutput::message(format!("Your plots:
{}", lines.join("
"))))
}
