use super::Command;
use crate::error::CommandParseError;
use crate::prefix::Prefix;

/// Parse a stripped wire line into a [`Command`].
///
/// The trailing `" :"` split happens on the *whole* line first (so a
/// trailing parameter may itself contain further `" :"` sequences), then
/// the remainder is whitespace-split into tokens; a leading `:`-token is
/// popped as the prefix, and the token after that is the `kind`.
pub(super) fn parse(line: &str) -> Result<Command, CommandParseError> {
    if line.is_empty() {
        return Err(CommandParseError::EmptyLine);
    }

    let (left, message) = match line.split_once(" :") {
        Some((left, message)) => (left, Some(message.to_string())),
        None => (line, None),
    };

    let mut tokens: Vec<&str> = left.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(CommandParseError::EmptyLine);
    }

    let prefix = if tokens[0].starts_with(':') {
        let token = tokens.remove(0);
        Some(Prefix::parse(&token[1..]))
    } else {
        None
    };

    if tokens.is_empty() {
        return Err(CommandParseError::MissingKind);
    }
    let kind = tokens.remove(0).to_string();
    let args = tokens.into_iter().map(String::from).collect();

    Ok(Command {
        prefix,
        kind,
        args,
        message,
        raw: line.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ping() {
        let cmd = parse("PING :irc.example.net").unwrap();
        assert_eq!(cmd.kind, "PING");
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.message.as_deref(), Some("irc.example.net"));
        assert!(cmd.prefix.is_none());
    }

    #[test]
    fn parses_full_user_prefix() {
        let cmd = parse(":bob!u@h PRIVMSG #chan :hello world").unwrap();
        let prefix = cmd.prefix.unwrap();
        assert_eq!(prefix.nick.as_deref(), Some("bob"));
        assert_eq!(prefix.user.as_deref(), Some("u"));
        assert_eq!(prefix.host.as_deref(), Some("h"));
        assert_eq!(cmd.kind, "PRIVMSG");
        assert_eq!(cmd.args, vec!["#chan".to_string()]);
        assert_eq!(cmd.message.as_deref(), Some("hello world"));
    }

    #[test]
    fn parses_server_only_prefix() {
        let cmd = parse(":irc.example.net 001 me :Welcome").unwrap();
        let prefix = cmd.prefix.unwrap();
        assert_eq!(prefix.nick, None);
        assert_eq!(prefix.host.as_deref(), Some("irc.example.net"));
        assert_eq!(cmd.kind, "001");
    }

    #[test]
    fn message_is_distinct_from_absent() {
        let with_empty = parse("PRIVMSG #chan :").unwrap();
        assert_eq!(with_empty.message.as_deref(), Some(""));

        let without = parse("JOIN #chan").unwrap();
        assert_eq!(without.message, None);
    }

    #[test]
    fn trailing_may_contain_colon_space() {
        let cmd = parse("PRIVMSG #chan :hello :world").unwrap();
        assert_eq!(cmd.message.as_deref(), Some("hello :world"));
    }

    #[test]
    fn empty_line_is_an_error() {
        assert_eq!(parse(""), Err(CommandParseError::EmptyLine));
    }

    #[test]
    fn prefix_with_no_kind_is_an_error() {
        assert_eq!(parse(":irc.example.net"), Err(CommandParseError::MissingKind));
    }
}
