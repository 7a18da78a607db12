//! IRC message prefix (source) parsing.

/// Source of an inbound [`crate::command::Command`]: either absent, or a
/// nick/user/host triple where only `nick` is guaranteed present (a
/// server-origin prefix carries just a hostname, which we fold into the
/// `host` field).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Prefix {
    /// Present for user-origin messages.
    pub nick: Option<String>,
    /// Present for user-origin messages.
    pub user: Option<String>,
    /// Always present when the prefix itself is present.
    pub host: Option<String>,
}

impl Prefix {
    /// Parse the token that followed the leading `:`, already stripped of
    /// its colon. Splits on `!` or `@`; three resulting fields are
    /// `nick!user@host`, anything else is treated as a bare server name.
    pub fn parse(token: &str) -> Prefix {
        let fields: Vec<&str> = token.split(['!', '@']).collect();
        if fields.len() == 3 {
            Prefix {
                nick: Some(fields[0].to_string()),
                user: Some(fields[1].to_string()),
                host: Some(fields[2].to_string()),
            }
        } else {
            Prefix {
                nick: None,
                user: None,
                host: Some(token.to_string()),
            }
        }
    }

    /// The nick field, if this is a user-origin prefix.
    pub fn nick(&self) -> Option<&str> {
        self.nick.as_deref()
    }
}

impl std::fmt::Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.nick, &self.user, &self.host) {
            (Some(nick), Some(user), Some(host)) => write!(f, "{nick}!{user}@{host}"),
            (_, _, Some(host)) => write!(f, "{host}"),
            _ => Ok(()),
        }
    }
}
