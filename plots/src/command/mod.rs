//! The `/plot` command and its sub commands.

use std::sync::Arc;

use crate::{
    error::{PlotError, Result},
    plot::Plot,
    pos::{BlockPos, PlotAddress},
    session::{Session, SessionRegistry},
    world::BlockWorld,
};

mod auto;
mod claim;
mod clear;
mod delete;
mod helper;
mod list;
mod teleport;

pub use auto::auto;
pub use claim::claim;
pub use clear::clear;
pub use delete::delete;
pub use helper::{add_helper, remove_helper};
pub use list::list;
pub use teleport::teleport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Claim,
    List,
    Teleport(usize),
    Delete,
    Clear,
    Auto,
    AddHelper(String),
    RemoveHelper(String),
}

impl Command {
    /// Parses a command line such as `/p tp 2` or `claim`. The `/p` or `/plot` prefix is optional.
    pub fn parse(input: &str) -> Result<Command> {
        let input = input.trim().trim_start_matches('/');
        let input = match split_word(input) {
            ("p" | "plot", rem) => rem,
            _ => input,
        };
        let (sub, rem) = split_word(input);

        match sub {
            "claim" => Ok(Command::Claim),
            "list" => Ok(Command::List),
            "tp" | "teleport" => {
                let number = rem.parse::<usize>().map_err(|_| PlotError::UnknownCommand(format!("{sub} {rem}")))?;
                Ok(Command::Teleport(number))
            }
            "delete" => Ok(Command::Delete),
            "clear" => Ok(Command::Clear),
            "auto" => Ok(Command::Auto),
            "helper" => match split_word(rem) {
                ("add", name) if !name.is_empty() => Ok(Command::AddHelper(name.to_string())),
                ("remove", name) if !name.is_empty() => Ok(Command::RemoveHelper(name.to_string())),
                _ => Err(PlotError::UnknownCommand(format!("helper {rem}"))),
            },
            _ => Err(PlotError::UnknownCommand(input.to_string())),
        }
    }

    pub fn run(&self, ctx: &CommandContext) -> Result<CommandOutput> {
        match self {
            Command::Claim => claim(ctx, &mut rand::thread_rng()),
            Command::List => list(ctx),
            Command::Teleport(number) => teleport(ctx, *number),
            Command::Delete => delete(ctx),
            Command::Clear => clear(ctx),
            Command::Auto => auto(ctx),
            Command::AddHelper(name) => add_helper(ctx, name),
            Command::RemoveHelper(name) => remove_helper(ctx, name),
        }
    }
}

fn split_word(input: &str) -> (&str, &str) {
    match input.find(' ') {
        Some(i) => (&input[..i], input[i + 1..].trim()),
        None => (input, ""),
    }
}

/// Everything a command needs to know about the player running it.
pub struct CommandContext<'a> {
    pub session: &'a Session,
    /// Block the player is standing in.
    pub position: BlockPos,
    pub world: &'a dyn BlockWorld,
    pub registry: &'a SessionRegistry,
}

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub message: String,
    /// Where to move the player, if the command moves the player.
    pub teleport: Option<[f64; 3]>,
}

impl CommandOutput {
    pub fn message(message: impl Into<String>) -> CommandOutput {
        CommandOutput { message: message.into(), teleport: None }
    }

    pub fn teleport(message: impl Into<String>, to: [f64; 3]) -> CommandOutput {
        CommandOutput { message: message.into(), teleport: Some(to) }
    }
}

/// The plot the player is standing in. Fails if the player is on a road or boundary.
fn current_plot(ctx: &CommandContext) -> Result<PlotAddress> {
    let settings = ctx.session.settings();
    let pos = PlotAddress::from_block_pos(ctx.position, settings);
    if !pos.contains(ctx.position, settings) {
        return Err(PlotError::OutOfBounds);
    }
    Ok(pos)
}

/// The plot the player is standing in, which must be owned by the player.
fn owned_plot(ctx: &CommandContext) -> Result<(PlotAddress, Arc<Plot>)> {
    let pos = current_plot(ctx)?;
    let plot = match ctx.session.db().plot(pos) {
        Ok(plot) => plot,
        Err(e) if e.is_not_found() => return Err(PlotError::NotOwner),
        Err(e) => return Err(e),
    };
    if !plot.is_owner(ctx.session.actor().id) {
        return Err(PlotError::NotOwner);
    }
    Ok((pos, plot))
}
