use crate::Key;
use crate::error::{ParseError, ParseErrorKind};

/// Tokenizer switches.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct LexerSettings {
    /// Reject characters other than parentheses, digits, `-` and ASCII whitespace. When off they
    /// are skipped.
    pub enforce_charset: bool,
    /// Reject a `-` directly after a digit. When off it starts the next number.
    pub strict_numbers: bool,
}

impl LexerSettings {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enforce_charset: true,
            strict_numbers: true,
        }
    }
}

impl Default for LexerSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Token {
    Open,
    Close,
    Number(Key),
}

/// A token with the byte offset it starts at.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Spanned {
    pub(crate) offset: usize,
    pub(crate) token: Token,
}

/// Streams the tokens of a serialized tree. Stops after the first error.
pub(crate) struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    settings: LexerSettings,
}

impl<'a> Lexer<'a> {
    pub(crate) const fn new(input: &'a str, settings: LexerSettings) -> Self {
        Self {
            input,
            pos: 0,
            settings,
        }
    }

    fn fail(&mut self, kind: ParseErrorKind, offset: usize) -> ParseError {
        self.pos = self.input.len();
        kind.at(offset)
    }

    fn number(&mut self, start: usize) -> Result<Spanned, ParseError> {
        let bytes = self.input.as_bytes();
        let mut end = start;
        if bytes[end] == b'-' {
            end += 1;
        }
        let digits = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }

        if end == digits {
            return Err(self.fail(ParseErrorKind::LoneMinus, start));
        }
        if self.settings.strict_numbers && bytes.get(end) == Some(&b'-') {
            return Err(self.fail(ParseErrorKind::MinusAfterDigit, end));
        }

        let Ok(value) = self.input[start..end].parse::<Key>() else {
            return Err(self.fail(ParseErrorKind::NumberOutOfRange, start));
        };
        self.pos = end;
        Ok(Spanned {
            offset: start,
            token: Token::Number(value),
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Spanned, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.pos;
            let c = self.input[start..].chars().next()?;
            let token = match c {
                '(' => Token::Open,
                ')' => Token::Close,
                '-' | '0'..='9' => return Some(self.number(start)),
                c if c.is_ascii_whitespace() => {
                    self.pos += c.len_utf8();
                    continue;
                }
                c if self.settings.enforce_charset => {
                    return Some(Err(self.fail(ParseErrorKind::InvalidCharacter(c), start)));
                }
                c => {
                    self.pos += c.len_utf8();
                    continue;
                }
            };
            self.pos += 1;
            return Some(Ok(Spanned {
                offset: start,
                token,
            }));
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    fn lax() -> LexerSettings {
        LexerSettings {
            enforce_charset: false,
            strict_numbers: false,
        }
    }

    fn tokens(input: &str, settings: LexerSettings) -> Result<Vec<Token>, ParseError> {
        Lexer::new(input, settings).map(|spanned| spanned.map(|s| s.token)).collect()
    }

    #[test]
    fn splits_on_parentheses_and_whitespace() {
        assert_eq!(
            tokens("((1)\t-20\n(300))", LexerSettings::new()),
            Ok(alloc::vec![
                Token::Open,
                Token::Open,
                Token::Number(1),
                Token::Close,
                Token::Number(-20),
                Token::Open,
                Token::Number(300),
                Token::Close,
                Token::Close,
            ])
        );
        assert_eq!(tokens("", LexerSettings::new()), Ok(Vec::new()));
    }

    #[test]
    fn offsets_point_at_token_starts() {
        let offsets: Vec<usize> = Lexer::new(" (12  -3)", LexerSettings::new()).map(|s| s.unwrap().offset).collect();
        assert_eq!(offsets, [1, 2, 6, 8]);
    }

    #[test]
    fn number_syntax() {
        assert_eq!(tokens("(1 - 2)", lax()), Err(ParseErrorKind::LoneMinus.at(3)));
        assert_eq!(tokens("(-)", LexerSettings::new()), Err(ParseErrorKind::LoneMinus.at(1)));
        assert_eq!(tokens("(12-3)", LexerSettings::new()), Err(ParseErrorKind::MinusAfterDigit.at(3)));
        assert_eq!(tokens("(12-3)", lax()), Ok(alloc::vec![Token::Open, Token::Number(12), Token::Number(-3), Token::Close]));
        assert_eq!(
            tokens("(9223372036854775808)", LexerSettings::new()),
            Err(ParseErrorKind::NumberOutOfRange.at(1))
        );
        assert_eq!(
            tokens("(-9223372036854775808)", LexerSettings::new()),
            Ok(alloc::vec![Token::Open, Token::Number(i64::MIN), Token::Close])
        );
    }

    #[test]
    fn charset() {
        assert_eq!(tokens("(1, 2)", LexerSettings::new()), Err(ParseErrorKind::InvalidCharacter(',').at(2)));
        assert_eq!(tokens("(1, é2)", lax()), Ok(alloc::vec![Token::Open, Token::Number(1), Token::Number(2), Token::Close]));
    }

    #[test]
    fn only_ascii_whitespace_separates() {
        assert_eq!(
            tokens("(1\u{a0}2)", LexerSettings::new()),
            Err(ParseErrorKind::InvalidCharacter('\u{a0}').at(2))
        );
        assert_eq!(tokens("(1\u{a0}2)", lax()), Ok(alloc::vec![Token::Open, Token::Number(1), Token::Number(2), Token::Close]));
        assert_eq!(tokens("(1\r\n\x0c2)", LexerSettings::new()), Ok(alloc::vec![Token::Open, Token::Number(1), Token::Number(2), Token::Close]));
    }

    #[test]
    fn stops_after_an_error() {
        let mut lexer = Lexer::new("x (1)", LexerSettings::new());
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());
    }
}
