use crate::token::Token;

/// What happened after feeding one more byte into the literal matcher?
pub(crate) enum Step {
    /// Byte matched, but the literal is not finished yet.
    NeedMore,
    /// Byte matched *and* it was the last byte of the literal.
    Done(Token),
    /// Byte did **not** match the expected one.
    Reject,
}

/// Matches the remainder of `true`, `false` or `null` once the first byte
/// has been seen.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct ExpectedLiteral {
    rest: &'static [u8],
    token: Token,
}

impl ExpectedLiteral {
    /// Starts matching after the first byte (`n`, `t`, or `f`).
    pub(crate) fn new(first: u8) -> Option<Self> {
        let (rest, token): (&'static [u8], Token) = match first {
            b'n' => (b"ull", Token::Null),
            b't' => (b"rue", Token::True),
            b'f' => (b"alse", Token::False),
            _ => return None,
        };
        Some(Self { rest, token })
    }

    /// Full spelling of the literal being matched.
    pub(crate) fn spelling(&self) -> &'static str {
        self.token.as_static_str().unwrap_or_default()
    }

    /// The part of the spelling matched so far, first byte included.
    pub(crate) fn matched(&self) -> &'static str {
        let spelling = self.spelling();
        &spelling[..spelling.len() - self.rest.len()]
    }

    pub(crate) fn step(&mut self, b: u8) -> Step {
        match self.rest.split_first() {
            Some((&expected, rest)) if expected == b => {
                self.rest = rest;
                if rest.is_empty() {
                    Step::Done(self.token)
                } else {
                    Step::NeedMore
                }
            }
            _ => Step::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &[u8]) -> Option<Token> {
        let mut lit = ExpectedLiteral::new(input[0])?;
        for &b in &input[1..] {
            match lit.step(b) {
                Step::NeedMore => {}
                Step::Done(token) => return Some(token),
                Step::Reject => return None,
            }
        }
        None
    }

    #[test]
    fn matches_all_literals() {
        assert_eq!(run(b"null"), Some(Token::Null));
        assert_eq!(run(b"true"), Some(Token::True));
        assert_eq!(run(b"false"), Some(Token::False));
    }

    #[test]
    fn rejects_misspellings() {
        assert_eq!(run(b"nul"), None);
        assert_eq!(run(b"tru3"), None);
        assert_eq!(run(b"x"), None);
        assert_eq!(ExpectedLiteral::new(b'f').map(|l| l.spelling()), Some("false"));
    }

    #[test]
    fn matched_prefix_grows_with_each_byte() {
        let mut lit = ExpectedLiteral::new(b't').unwrap();
        assert_eq!(lit.matched(), "t");
        assert!(matches!(lit.step(b'r'), Step::NeedMore));
        assert_eq!(lit.matched(), "tr");
        assert!(matches!(lit.step(b'x'), Step::Reject));
        assert_eq!(lit.matched(), "tr");
    }
}
