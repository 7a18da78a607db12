//! Client-To-Client Protocol helpers.
//!
//! CTCP messages are PRIVMSG/NOTICE bodies delimited by `\x01`. This crate
//! only needs enough of CTCP to wrap `ACTION` (`/me`) and recognize
//! `VERSION` queries; it does not implement the full CTCP command set.

const DELIM: char = '\x01';

/// Wrap `message` as a CTCP ACTION body, e.g. for `/me waves`.
pub fn wrap_action(message: &str) -> String {
    format!("{DELIM}ACTION{message}{DELIM}")
}

/// True if `message` is exactly a CTCP VERSION query (`\x01VERSION\x01`,
/// with or without trailing query text).
pub fn is_version_query(message: &str) -> bool {
    let Some(body) = message.strip_prefix(DELIM) else {
        return false;
    };
    let Some(body) = body.strip_suffix(DELIM) else {
        return false;
    };
    body.starts_with("VERSION")
}

/// Wrap a version reply string as the CTCP body a NOTICE should carry.
pub fn wrap_version_reply(version: &str) -> String {
    format!("{DELIM}VERSION {version}{DELIM}")
}
