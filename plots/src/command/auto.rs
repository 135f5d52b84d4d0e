use super::{CommandContext, CommandOutput};
use crate::{
    error::{PlotError, Result},
    pos::PlotAddress,
};

/// Number of rings of plots around the player searched for a free plot.
const SEARCH_RINGS: i32 = 16;

/// Teleports the player to the nearest free plot, searching rings of plots around the plot the
/// player is in.
pub fn auto(ctx: &CommandContext) -> Result<CommandOutput> {
    let session = ctx.session;
    let settings = session.settings();
    let center = PlotAddress::from_block_pos(ctx.position, settings);

    for r in 0..SEARCH_RINGS {
        for x in -r..=r {
            for z in -r..=r {
                if x.abs() != r && z.abs() != r {
                    continue;
                }
                let pos = center.add(PlotAddress::new(x, z));
                match session.db().plot(pos) {
                    Ok(_) => {}
                    Err(e) if e.is_not_found() => {
                        return Ok(CommandOutput::teleport(
                            "A free plot was successfully found nearby.",
                            pos.teleport_position(settings),
                        ));
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }
    Err(PlotError::NoFreePlot)
}
