//! Token cursor over one keymap line
//!
//! Tokens are separated by spaces or tabs. A word only matches a whole
//! token, so `C` never matches the front of `C#4`.

use super::names::lookup;

#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    rest: &'a str,
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

impl<'a> Cursor<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { rest: line.trim_end_matches(['\r', '\n']) }
    }

    /// Next token without consuming it
    pub fn peek(&self) -> Option<&'a str> {
        let rest = self.rest.trim_start_matches(is_blank);
        let end = rest.find(is_blank).unwrap_or(rest.len());
        (end > 0).then(|| &rest[..end])
    }

    fn advance(&mut self) {
        let rest = self.rest.trim_start_matches(is_blank);
        let end = rest.find(is_blank).unwrap_or(rest.len());
        self.rest = &rest[end..];
    }

    /// Consume the next token unconditionally
    pub fn token(&mut self) -> Option<&'a str> {
        let token = self.peek()?;
        self.advance();
        Some(token)
    }

    pub fn is_empty(&self) -> bool {
        self.peek().is_none()
    }

    /// Consume the next token if it equals `word`, ignoring case
    pub fn word(&mut self, word: &str) -> bool {
        match self.peek() {
            Some(token) if token.eq_ignore_ascii_case(word) => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    /// Consume the next token if it names an entry in `table`
    pub fn name<S: AsRef<str>>(&mut self, table: &[(S, u8)]) -> Option<u8> {
        let value = lookup(table, self.peek()?)?;
        self.advance();
        Some(value)
    }

    /// Consume a decimal (optionally signed) or `$hex` number
    pub fn number(&mut self) -> Option<i32> {
        let value = parse_number(self.peek()?)?;
        self.advance();
        Some(value)
    }

    /// A name from `table`, or a number when no name matches
    pub fn value<S: AsRef<str>>(&mut self, table: &[(S, u8)]) -> Option<i32> {
        self.name(table).map(i32::from).or_else(|| self.number())
    }

    /// Everything left on the line, trimmed
    pub fn rest_of_line(&mut self) -> &'a str {
        let rest = self.rest.trim_matches(is_blank);
        self.rest = "";
        rest
    }
}

/// `-12`, `+3`, `64` or `$1e`
pub fn parse_number(token: &str) -> Option<i32> {
    if let Some(hex) = token.strip_prefix('$') {
        if hex.is_empty() || hex.len() > 8 {
            return None;
        }
        return u32::from_str_radix(hex, 16).ok().map(|v| v as i32);
    }

    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::names::{notes, OPS};

    #[test]
    fn test_tokens() {
        let mut cursor = Cursor::new("  Keydown\tA   Note 0 C4\r\n");
        assert_eq!(cursor.peek(), Some("Keydown"));
        assert!(cursor.word("keydown"));
        assert_eq!(cursor.token(), Some("A"));
        assert!(!cursor.word("NoteOff"));
        assert!(cursor.word("NOTE"));
        assert_eq!(cursor.number(), Some(0));
        assert_eq!(cursor.value(notes()), Some(60));
        assert!(cursor.is_empty());
        assert_eq!(cursor.token(), None);
    }

    #[test]
    fn test_whole_token_match() {
        let mut cursor = Cursor::new("C#4");
        assert!(!cursor.word("C"));
        assert_eq!(cursor.value(notes()), Some(61));
    }

    #[test]
    fn test_value_falls_back_to_number() {
        let mut cursor = Cursor::new("Inc 5 $7f x");
        assert_eq!(cursor.value(OPS), Some(1));
        assert_eq!(cursor.value(OPS), Some(5));
        assert_eq!(cursor.value(OPS), Some(127));
        assert_eq!(cursor.value(OPS), None);
        assert_eq!(cursor.token(), Some("x"));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_number("-12"), Some(-12));
        assert_eq!(parse_number("+3"), Some(3));
        assert_eq!(parse_number("$1E"), Some(30));
        assert_eq!(parse_number("$903c7f00"), Some(0x903c7f00u32 as i32));
        assert_eq!(parse_number("$"), None);
        assert_eq!(parse_number("12a"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("1.8"), None);
    }

    #[test]
    fn test_rest_of_line() {
        let mut cursor = Cursor::new("Label A  Hello world  \r\n");
        cursor.token();
        cursor.token();
        assert_eq!(cursor.rest_of_line(), "Hello world");
        assert!(cursor.is_empty());
    }
}
