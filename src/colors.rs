//! IRC formatting-control stripping.
//!
//! Bold (`\x02`), color (`\x03`, optionally followed by one or two
//! two-digit foreground/background pairs), italic (`\x1D`... not all clients
//! agree on the code point, but this crate follows the original bot's
//! control set), underline (`\x1F`), reset (`\x0F`), and reverse (`\x16`).

/// Strip formatting control codes from `s`, returning a plain-text copy.
/// Idempotent: `strip(strip(s)) == strip(s)`.
pub fn strip_controls(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x02' | '\x1F' | '\x0F' | '\x16' => {}
            '\x03' => {
                // Optional "NN" or "NN,MM" color code following the byte;
                // each group is exactly two digits or not consumed at all.
                let mut lookahead = chars.clone();
                if lookahead.next().is_some_and(|d| d.is_ascii_digit())
                    && lookahead.next().is_some_and(|d| d.is_ascii_digit())
                {
                    chars.next();
                    chars.next();
                    let mut lookahead = chars.clone();
                    if lookahead.next() == Some(',')
                        && lookahead.next().is_some_and(|d| d.is_ascii_digit())
                        && lookahead.next().is_some_and(|d| d.is_ascii_digit())
                    {
                        chars.next();
                        chars.next();
                        chars.next();
                    }
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bold_and_reset() {
        assert_eq!(strip_controls("\x02hello\x0F"), "hello");
    }

    #[test]
    fn strips_color_with_digits() {
        assert_eq!(strip_controls("\x0304red\x03 plain"), "red plain");
        assert_eq!(strip_controls("\x0304,08both"), "both");
    }

    #[test]
    fn single_digit_group_is_not_a_color_code() {
        assert_eq!(strip_controls("\x034,8both"), "4,8both");
    }

    #[test]
    fn is_idempotent() {
        let s = "\x02\x0304,08mixed\x0Fmessage\x16";
        let once = strip_controls(s);
        let twice = strip_controls(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(strip_controls("just words"), "just words");
    }
}
