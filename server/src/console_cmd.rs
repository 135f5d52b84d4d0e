use anyhow::bail;

#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleCmd {
    Sessions,
    Plots,
    Kick (String),
    Say (String),
    Stop,
}

impl ConsoleCmd {
    pub fn parse(input: &str) -> anyhow::Result<ConsoleCmd> {
        let (message_type, rem) = match input.find(' ') {
            Some(i) => (&input[..i], input[i+1..].trim()),
            None => (input, ""),
        };

        match message_type {
            "sessions" => Ok(ConsoleCmd::Sessions),
            "plots" => Ok(ConsoleCmd::Plots),
            "kick" if !rem.is_empty() => Ok(ConsoleCmd::Kick(rem.to_owned())),
            "say" if !rem.is_empty() => Ok(ConsoleCmd::Say(rem.to_owned())),
            "stop" => Ok(ConsoleCmd::Stop),
            _ => bail!("cmd not recognized"),
        }
    }
}
