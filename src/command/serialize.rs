use super::Command;

/// Reconstruct the wire form of a [`Command`] from its structured fields.
///
/// Round-trips for any command built by the core itself (args and message
/// containing no embedded CRLF); a `Command` produced by [`super::parse`]
/// from an arbitrary wire line round-trips through this exactly when the
/// original line's whitespace was already single-space-separated, which is
/// the subset [`crate::command`] module docs promise.
pub(super) fn serialize(cmd: &Command) -> String {
    let mut out = String::new();
    if let Some(prefix) = &cmd.prefix {
        out.push(':');
        out.push_str(&prefix.to_string());
        out.push(' ');
    }
    out.push_str(&cmd.kind);
    for arg in &cmd.args {
        out.push(' ');
        out.push_str(arg);
    }
    if let Some(message) = &cmd.message {
        out.push_str(" :");
        out.push_str(message);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::Command;
    use crate::prefix::Prefix;

    #[test]
    fn roundtrips_simple_line() {
        let line = "PING :irc.example.net";
        let cmd = Command::parse(line).unwrap();
        assert_eq!(cmd.to_line(), line);
    }

    #[test]
    fn roundtrips_with_prefix_and_args() {
        let line = ":bob!u@h PRIVMSG #chan :hello world";
        let cmd = Command::parse(line).unwrap();
        assert_eq!(cmd.to_line(), line);
    }

    #[test]
    fn constructs_without_parsing() {
        let cmd = Command {
            prefix: None,
            kind: "JOIN".to_string(),
            args: vec!["#chan".to_string()],
            message: None,
            raw: String::new(),
        };
        assert_eq!(cmd.to_line(), "JOIN #chan");
        let _ = Prefix::default();
    }
}
