use anyhow::{bail, Context};
use msgs::client_server_msg::ClientServerMsg;
use plots::{
    block::Block,
    colour::Colour,
    pos::{BlockPos, Face},
};

#[derive(Debug, PartialEq)]
pub enum ConsoleCmd {
    Send (ClientServerMsg),
    Quit,
}

impl ConsoleCmd {
    pub fn parse(input: &str) -> anyhow::Result<ConsoleCmd> {
        let (message_type, rem) = match input.find(' ') {
            Some(i) => (&input[..i], input[i+1..].trim()),
            None => (input, ""),
        };
        let mut args = rem.split_whitespace();

        let msg = match message_type {
            "move" => ClientServerMsg::Move(parse_pos(&mut args)?),
            "break" => ClientServerMsg::BreakBlock(parse_pos(&mut args)?),
            "place" => {
                let pos = parse_pos(&mut args)?;
                let block = parse_block(&mut args)?.context("missing block")?;
                ClientServerMsg::PlaceBlock(pos, block)
            }
            "use" => {
                let pos = parse_pos(&mut args)?;
                let face = parse_face(args.next().context("missing face")?)?;
                let held_is_block = parse_block(&mut args)?.is_some();
                ClientServerMsg::UseItemOnBlock { pos, face, held_is_block }
            }
            "p" | "plot" => {
                if rem.is_empty() {
                    bail!("missing plot command");
                }
                ClientServerMsg::Command(format!("/p {rem}"))
            }
            "quit" => return Ok(ConsoleCmd::Quit),
            _ => bail!("cmd not recognized"),
        };
        Ok(ConsoleCmd::Send(msg))
    }
}

fn parse_pos<'a>(args: &mut impl Iterator<Item = &'a str>) -> anyhow::Result<BlockPos> {
    let mut coordinate = || -> anyhow::Result<i32> {
        let arg = args.next().context("expected x y z")?;
        arg.parse().with_context(|| format!("not a coordinate: {arg}"))
    };
    let x = coordinate()?;
    let y = coordinate()?;
    let z = coordinate()?;
    Ok(BlockPos::new(x, y, z))
}

/// Parses an optional block name followed by an optional colour.
fn parse_block<'a>(args: &mut impl Iterator<Item = &'a str>) -> anyhow::Result<Option<Block>> {
    let Some(name) = args.next() else { return Ok(None) };
    let colour = match args.next() {
        Some(colour) => Some(Colour::from_name(colour).with_context(|| format!("unknown colour: {colour}"))?),
        None => None,
    };
    let block = Block::from_name(name, colour).with_context(|| format!("unknown block: {name}"))?;
    Ok(Some(block))
}

fn parse_face(arg: &str) -> anyhow::Result<Face> {
    let face = match arg {
        "down" => Face::Down,
        "up" => Face::Up,
        "north" => Face::North,
        "south" => Face::South,
        "west" => Face::West,
        "east" => Face::East,
        _ => {
            let index = arg.parse::<u32>().with_context(|| format!("unknown face: {arg}"))?;
            Face::from_u32(index).with_context(|| format!("unknown face: {arg}"))?
        }
    };
    Ok(face)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_block_events() {
        assert_eq!(
            ConsoleCmd::parse("place 10 23 -4 wool red").unwrap(),
            ConsoleCmd::Send(ClientServerMsg::PlaceBlock(BlockPos::new(10, 23, -4), Block::Wool { colour: Colour::Red }))
        );
        assert_eq!(
            ConsoleCmd::parse("use 1 2 3 east").unwrap(),
            ConsoleCmd::Send(ClientServerMsg::UseItemOnBlock { pos: BlockPos::new(1, 2, 3), face: Face::East, held_is_block: false })
        );
        assert_eq!(
            ConsoleCmd::parse("use 1 2 3 0 stone").unwrap(),
            ConsoleCmd::Send(ClientServerMsg::UseItemOnBlock { pos: BlockPos::new(1, 2, 3), face: Face::Down, held_is_block: true })
        );
    }

    #[test]
    fn plot_commands_get_a_prefix() {
        assert_eq!(ConsoleCmd::parse("p tp 2").unwrap(), ConsoleCmd::Send(ClientServerMsg::Command("/p tp 2".to_string())));
        assert_eq!(ConsoleCmd::parse("quit").unwrap(), ConsoleCmd::Quit);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(ConsoleCmd::parse("move 1 2").is_err());
        assert!(ConsoleCmd::parse("break a b c").is_err());
        assert!(ConsoleCmd::parse("place 1 2 3").is_err());
        assert!(ConsoleCmd::parse("place 1 2 3 lava").is_err());
        assert!(ConsoleCmd::parse("use 1 2 3 sideways").is_err());
        assert!(ConsoleCmd::parse("p").is_err());
    }
}
