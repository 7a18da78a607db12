//! A single parsed wire line.

mod parse;
mod serialize;

use crate::prefix::Prefix;

/// One parsed inbound (or to-be-serialized outbound) IRC line.
///
/// Immutable after construction. `kind` is the verb or three-digit numeric,
/// `args` are the whitespace-split tokens before the trailing parameter, and
/// `message` is the optional `" :"`-introduced trailing parameter;
/// `None` is distinct from `Some(String::new())`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    /// The message source, if any.
    pub prefix: Option<Prefix>,
    /// The verb (e.g. `"PRIVMSG"`) or three-digit numeric (e.g. `"001"`).
    pub kind: String,
    /// Whitespace-split tokens preceding the trailing parameter.
    pub args: Vec<String>,
    /// The trailing `" :"`-introduced parameter, if one was present.
    pub message: Option<String>,
    /// The original, unparsed line.
    pub raw: String,
}

impl Command {
    /// Parse a single UTF-8 line already stripped of its trailing CRLF.
    pub fn parse(line: &str) -> Result<Command, crate::error::CommandParseError> {
        parse::parse(line)
    }

    /// The sender's nick, if this is a user-origin message.
    pub fn sender_nick(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(|p| p.nick())
    }

    /// Serialize back to wire form (sans CRLF), for outbound commands the
    /// core itself constructs (`PONG`, `JOIN`, …).
    pub fn to_line(&self) -> String {
        serialize::serialize(self)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_line())
    }
}
