//! Integration tests for wire-line parsing and serialization.

use perch::command::Command;
use perch::prefix::Prefix;

#[test]
fn round_trip_simple_line() {
    let original = "PING :irc.example.com";
    let cmd = Command::parse(original).expect("failed to parse line");
    assert_eq!(cmd.to_line(), original);
}

#[test]
fn round_trip_with_full_prefix() {
    let original = ":nick!user@host PRIVMSG #channel :Hello, world!";
    let cmd = Command::parse(original).expect("failed to parse line");
    assert_eq!(cmd.to_line(), original);
}

#[test]
fn round_trip_numeric_reply() {
    let original = ":server 001 nickname :Welcome to the IRC Network";
    let cmd = Command::parse(original).expect("failed to parse line");
    assert_eq!(cmd.to_line(), original);
}

#[test]
fn round_trip_server_only_prefix() {
    let original = ":irc.example.net 376 nickname :End of MOTD";
    let cmd = Command::parse(original).expect("failed to parse line");
    assert_eq!(cmd.to_line(), original);
}

#[test]
fn empty_trailing_parameter_is_preserved() {
    let original = "PRIVMSG #channel :";
    let cmd = Command::parse(original).expect("failed to parse line");
    assert_eq!(cmd.message.as_deref(), Some(""));
    assert_eq!(cmd.to_line(), original);
}

#[test]
fn absent_trailing_parameter_stays_absent() {
    let cmd = Command::parse("JOIN #channel").unwrap();
    assert_eq!(cmd.message, None);
    assert_eq!(cmd.to_line(), "JOIN #channel");
}

#[test]
fn trailing_parameter_may_itself_contain_colon_space() {
    let original = "PRIVMSG #channel :hello :world";
    let cmd = Command::parse(original).unwrap();
    assert_eq!(cmd.message.as_deref(), Some("hello :world"));
    assert_eq!(cmd.to_line(), original);
}

#[test]
fn special_characters_round_trip() {
    let original = ":nick!user@host PRIVMSG #channel :Message with \u{00fc}\u{00f1}\u{00ed}\u{00e7}\u{00f8}d\u{00e9} and emoji \u{1f389}";
    let cmd = Command::parse(original).unwrap();
    assert_eq!(cmd.to_line(), original);
}

#[test]
fn mode_command_round_trip() {
    let original = ":server MODE #channel +o nick";
    let cmd = Command::parse(original).unwrap();
    assert_eq!(cmd.to_line(), original);
}

#[test]
fn join_command_variations_round_trip() {
    let cases = [
        "JOIN #channel",
        "JOIN #channel key",
        ":nick!user@host JOIN #channel",
        "JOIN #channel1,#channel2 key1,key2",
    ];
    for original in cases {
        let cmd = Command::parse(original).unwrap_or_else(|e| panic!("failed to parse {original:?}: {e}"));
        assert_eq!(cmd.to_line(), original, "round trip failed for {original:?}");
    }
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

#[test]
fn sender_nick_reads_from_prefix() {
    let cmd = Command::parse(":alice!u@h PRIVMSG #chan :hi").unwrap();
    assert_eq!(cmd.sender_nick(), Some("alice"));

    let cmd = Command::parse(":irc.example.net 001 me :Welcome").unwrap();
    assert_eq!(cmd.sender_nick(), None);
}

#[test]
fn empty_line_is_rejected() {
    assert!(Command::parse("").is_err());
}
