//! Mode-string toggling.
//!
//! The core only needs to know which letters a `MODE` string *adds*, to
//! detect NickServ's `+r` confirmation. This intentionally does not model
//! the full RFC 2812 mode grammar (argument-taking modes, list modes) the
//! way a general protocol library would; the core never needs to act on
//! anything but the toggle set itself.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ModeDelta {
    /// Letters added (appeared after a `+`).
    pub added: Vec<char>,
    /// Letters removed (appeared after a `-`).
    pub removed: Vec<char>,
}

impl ModeDelta {
    /// Parse a mode string like `+r` or `+i-w+s` into added/removed sets.
    pub fn parse(modes: &str) -> ModeDelta {
        let mut delta = ModeDelta::default();
        let mut adding = true;
        for ch in modes.chars() {
            match ch {
                '+' => adding = true,
                '-' => adding = false,
                c => {
                    if adding {
                        delta.added.push(c);
                    } else {
                        delta.removed.push(c);
                    }
                }
            }
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_add() {
        let d = ModeDelta::parse("+r");
        assert_eq!(d.added, vec!['r']);
        assert!(d.removed.is_empty());
    }

    #[test]
    fn parses_mixed_toggles() {
        let d = ModeDelta::parse("+i-w+r");
        assert_eq!(d.added, vec!['i', 'r']);
        assert_eq!(d.removed, vec!['w']);
    }

    #[test]
    fn no_leading_sign_defaults_to_add() {
        let d = ModeDelta::parse("r");
        assert_eq!(d.added, vec!['r']);
    }
}
