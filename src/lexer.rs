//! Streaming PGN tokenizer.
//!
//! [`Lexer`] consumes a byte source and produces [`Token`]s on demand. It is
//! strictly sequential and blocking. End-of-input is reported as a token,
//! never as an error; I/O failures and tokens left open at end-of-input are
//! fatal [`PgnError`]s.

use std::io::{self, Read};

use crate::errors::{PgnError, PgnErrorKind};
use crate::token::{Token, TokenKind};

const BUFFER_SIZE: usize = 8192;

/// Buffered reader with a one-byte push-back window.
#[derive(Debug)]
struct ByteSource<R> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
}

impl<R: Read> ByteSource<R> {
    fn new(inner: R) -> ByteSource<R> {
        ByteSource {
            inner,
            buf: Vec::with_capacity(BUFFER_SIZE),
            pos: 0,
        }
    }

    /// Makes at least one byte available, unless the input is exhausted.
    fn fill(&mut self) -> io::Result<bool> {
        if self.pos < self.buf.len() {
            return Ok(true);
        }
        self.buf.resize(BUFFER_SIZE, 0);
        let size = self.inner.read(&mut self.buf)?;
        self.buf.truncate(size);
        self.pos = 0;
        Ok(size > 0)
    }

    fn next(&mut self) -> io::Result<Option<u8>> {
        if !self.fill()? {
            return Ok(None);
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(byte))
    }

    /// Unreads the byte most recently returned by [`ByteSource::next`]. Only
    /// valid directly after a successful `next`; the byte is still in the
    /// buffer then.
    fn unread(&mut self) {
        debug_assert!(self.pos > 0);
        self.pos = self.pos.saturating_sub(1);
    }

    /// The not yet consumed part of the buffer.
    fn buffered(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    fn consume(&mut self, amount: usize) {
        self.pos += amount;
    }
}

/// Tokenizer over a PGN byte stream.
///
/// Tracks a 1-based line counter that is incremented for every linefeed,
/// including linefeeds inside strings and comments. Exhausted input yields
/// [`TokenKind::EndOfInput`] on every subsequent call.
#[derive(Debug)]
pub struct Lexer<R> {
    src: ByteSource<R>,
    line: u32,
    started: bool,
}

fn is_symbol_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(byte, b'_' | b'+' | b'#' | b'=' | b'?' | b'!' | b'/' | b'-')
}

impl<R: Read> Lexer<R> {
    pub fn new(inner: R) -> Lexer<R> {
        Lexer {
            src: ByteSource::new(inner),
            line: 1,
            started: false,
        }
    }

    /// The line the lexer is currently on.
    pub fn line_number(&self) -> u32 {
        self.line
    }

    /// Unreads the last byte handed out, so the next scan sees it again.
    ///
    /// Used to resynchronize on a single-character token that has already
    /// been consumed, e.g. the `[` opening the next game's tag section.
    pub fn skip_back(&mut self) {
        self.src.unread();
    }

    fn next_byte(&mut self) -> Result<Option<u8>, PgnError> {
        self.src.next().map_err(|e| PgnError::io(e, self.line))
    }

    fn skip_bom(&mut self) -> Result<(), PgnError> {
        self.src.fill().map_err(|e| PgnError::io(e, self.line))?;
        if self.src.buffered().starts_with(b"\xef\xbb\xbf") {
            self.src.consume(3);
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) -> Result<(), PgnError> {
        while let Some(byte) = self.next_byte()? {
            match byte {
                b'\n' => self.line += 1,
                b' ' | b'\t' | b'\r' => (),
                _ => {
                    self.src.unread();
                    break;
                }
            }
        }
        Ok(())
    }

    /// Produces the next token. Whitespace between tokens is skipped.
    pub fn next_token(&mut self) -> Result<Token, PgnError> {
        if !self.started {
            self.started = true;
            self.skip_bom()?;
        }
        self.skip_whitespace()?;
        let line = self.line;
        let Some(byte) = self.next_byte()? else {
            return Ok(Token::bare(TokenKind::EndOfInput, line));
        };
        match byte {
            b'[' => Ok(Token::bare(TokenKind::OpenBracket, line)),
            b']' => Ok(Token::bare(TokenKind::CloseBracket, line)),
            b'(' => Ok(Token::bare(TokenKind::OpenParen, line)),
            b')' => Ok(Token::bare(TokenKind::CloseParen, line)),
            b'.' => Ok(Token::bare(TokenKind::Dot, line)),
            b'"' => self.read_string(line),
            b'{' => self.read_comment(line),
            b'$' => self.read_nag(line),
            b'*' => Ok(Token::new(TokenKind::GameResult, line, "*")),
            b'0'..=b'9' => self.read_number_or_result(byte, line),
            byte if byte.is_ascii_alphabetic() => self.read_symbol(byte, line),
            other => Ok(Token::new(
                TokenKind::Invalid,
                line,
                (other as char).to_string(),
            )),
        }
    }

    /// Reads until the closing quote. Newlines are taken literally and still
    /// bump the line counter.
    fn read_string(&mut self, start_line: u32) -> Result<Token, PgnError> {
        let mut value = Vec::new();
        loop {
            let window = self.src.buffered();
            if window.is_empty() {
                let more = self.src.fill().map_err(|e| PgnError::io(e, self.line))?;
                if !more {
                    return Err(PgnError::new(
                        PgnErrorKind::InputError,
                        start_line,
                        "unterminated string",
                    ));
                }
                continue;
            }
            match memchr::memchr2(b'"', b'\n', window) {
                Some(at) if window[at] == b'"' => {
                    value.extend_from_slice(&window[..at]);
                    self.src.consume(at + 1);
                    break;
                }
                Some(at) => {
                    value.extend_from_slice(&window[..=at]);
                    self.src.consume(at + 1);
                    self.line += 1;
                }
                None => {
                    value.extend_from_slice(window);
                    let len = window.len();
                    self.src.consume(len);
                }
            }
        }
        Ok(Token::new(
            TokenKind::String,
            start_line,
            String::from_utf8_lossy(&value).into_owned(),
        ))
    }

    /// Reads until the closing brace. Runs of whitespace are normalized to a
    /// single space; normalization works on bytes, so multi-byte characters
    /// pass through untouched.
    fn read_comment(&mut self, start_line: u32) -> Result<Token, PgnError> {
        let mut value = Vec::new();
        let mut pending_space = false;
        loop {
            match self.next_byte()? {
                None => {
                    return Err(PgnError::new(
                        PgnErrorKind::InputError,
                        start_line,
                        "unterminated comment",
                    ));
                }
                Some(b'}') => break,
                Some(b'\n') => {
                    self.line += 1;
                    pending_space = true;
                }
                Some(b' ') | Some(b'\t') | Some(b'\r') => pending_space = true,
                Some(byte) => {
                    if pending_space && !value.is_empty() {
                        value.push(b' ');
                    }
                    pending_space = false;
                    value.push(byte);
                }
            }
        }
        Ok(Token::new(
            TokenKind::Comment,
            start_line,
            String::from_utf8_lossy(&value).into_owned(),
        ))
    }

    fn read_nag(&mut self, line: u32) -> Result<Token, PgnError> {
        let mut digits = String::new();
        while let Some(byte) = self.next_byte()? {
            if byte.is_ascii_digit() {
                digits.push(byte as char);
            } else {
                self.src.unread();
                break;
            }
        }
        Ok(Token::new(TokenKind::Nag, line, digits))
    }

    /// A leading digit starts either a move number or a game result. Seeing
    /// `/` or `-` switches to a result scan; the accumulated text then has to
    /// be one of the three decisive markers to count as a result.
    fn read_number_or_result(&mut self, first: u8, line: u32) -> Result<Token, PgnError> {
        let mut text = String::new();
        text.push(first as char);
        let mut result_scan = false;
        while let Some(byte) = self.next_byte()? {
            match byte {
                b'0'..=b'9' => text.push(byte as char),
                b'/' | b'-' => {
                    result_scan = true;
                    text.push(byte as char);
                }
                _ => {
                    self.src.unread();
                    break;
                }
            }
        }
        let kind = if !result_scan {
            TokenKind::Number
        } else if matches!(text.as_str(), "1-0" | "0-1" | "1/2-1/2") {
            TokenKind::GameResult
        } else {
            TokenKind::Invalid
        };
        Ok(Token::new(kind, line, text))
    }

    fn read_symbol(&mut self, first: u8, line: u32) -> Result<Token, PgnError> {
        let mut text = String::new();
        text.push(first as char);
        while let Some(byte) = self.next_byte()? {
            if is_symbol_byte(byte) {
                text.push(byte as char);
            } else {
                self.src.unread();
                break;
            }
        }
        Ok(Token::new(TokenKind::Symbol, line, text))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn lexer(data: &str) -> Lexer<Cursor<&str>> {
        Lexer::new(Cursor::new(data))
    }

    fn check_token<R: Read>(lexer: &mut Lexer<R>, kind: TokenKind, line: i64, value: &str) {
        let token = lexer.next_token().expect("token");
        assert_eq!(token.kind, kind, "kind for {value:?}");
        if line != -1 {
            assert_eq!(i64::from(token.line), line, "line for {value:?}");
        }
        assert_eq!(token.value, value);
    }

    fn check_tag<R: Read>(lexer: &mut Lexer<R>, name: &str, value: &str, line: i64) {
        check_token(lexer, TokenKind::OpenBracket, line, "");
        check_token(lexer, TokenKind::Symbol, line, name);
        check_token(lexer, TokenKind::String, line, value);
        check_token(lexer, TokenKind::CloseBracket, line, "");
    }

    fn check_full_move<R: Read>(lexer: &mut Lexer<R>, number: u32, white: &str, black: &str) {
        check_token(lexer, TokenKind::Number, -1, &number.to_string());
        check_token(lexer, TokenKind::Dot, -1, "");
        check_token(lexer, TokenKind::Symbol, -1, white);
        check_token(lexer, TokenKind::Symbol, -1, black);
    }

    #[test]
    fn single_linear_game() {
        let data = "[Event \"Test Event\"]\n\
                    [Site \"Test Site\"]\n\
                    [Date \"2020.01.01\"]\n\
                    [Round \"1\"]\n\
                    [White \"White\"]\n\
                    [Black \"Black\"]\n\
                    [Result \"1-0\"]\n\n\
                    1. e4 e5 Nf3 2. .. Nc6 3 Bb5+ 1-0";
        let mut lexer = lexer(data);
        assert_eq!(lexer.line_number(), 1);

        check_tag(&mut lexer, "Event", "Test Event", 1);
        check_tag(&mut lexer, "Site", "Test Site", 2);
        check_tag(&mut lexer, "Date", "2020.01.01", 3);
        check_tag(&mut lexer, "Round", "1", 4);
        check_tag(&mut lexer, "White", "White", 5);
        check_tag(&mut lexer, "Black", "Black", 6);
        check_tag(&mut lexer, "Result", "1-0", 7);

        check_token(&mut lexer, TokenKind::Number, 9, "1");
        check_token(&mut lexer, TokenKind::Dot, 9, "");
        check_token(&mut lexer, TokenKind::Symbol, 9, "e4");
        check_token(&mut lexer, TokenKind::Symbol, 9, "e5");
        check_token(&mut lexer, TokenKind::Symbol, 9, "Nf3");
        check_token(&mut lexer, TokenKind::Number, 9, "2");
        check_token(&mut lexer, TokenKind::Dot, 9, "");
        check_token(&mut lexer, TokenKind::Dot, 9, "");
        check_token(&mut lexer, TokenKind::Dot, 9, "");
        check_token(&mut lexer, TokenKind::Symbol, 9, "Nc6");
        check_token(&mut lexer, TokenKind::Number, 9, "3");
        check_token(&mut lexer, TokenKind::Symbol, 9, "Bb5+");
        check_token(&mut lexer, TokenKind::GameResult, 9, "1-0");
        check_token(&mut lexer, TokenKind::EndOfInput, 9, "");
        check_token(&mut lexer, TokenKind::EndOfInput, 9, "");
    }

    #[test]
    fn commented_game() {
        let data = concat!(
            "[Event \"IBM Kasparov vs. Deep Blue Rematch\"]\n",
            "[Site \"New York, NY USA\"]\n",
            "[Date \"1997.05.11\"]\n",
            "[Round \"6\"]\n",
            "[White \"Deep Blue\"]\n",
            "[Black \"Kasparov, Garry\"]\n",
            "[Opening \"Caro-Kann: 4...Nd7\"]\n",
            "[ECO \"B17\"]\n",
            "[Result \"1-0\"]\n\n",
            "{Beispielpartie in PGN}\n\n",
            "1. e4 c6 2. d4 d5 3. Nc3 dxe4 4. Nxe4 Nd7 5. Ng5 Ngf6 6. Bd3 e6 ",
            "7. N1f3 h6 8. Nxe6 Qe7 9. O-O fxe6 10. Bg6+ Kd8 ",
            "{Kasparov schüttelt kurz den Kopf} 11. Bf4 b5 12. a4 Bb7 ",
            "13. Re1 Nd5 14. Bg3 Kc8 15. axb5 cxb5 16. Qd3 Bc6 17. Bf5 exf5 ",
            "18. Rxe7 Bxe7 19. c4 1-0\n",
        );
        let mut lexer = lexer(data);

        check_tag(&mut lexer, "Event", "IBM Kasparov vs. Deep Blue Rematch", 1);
        check_tag(&mut lexer, "Site", "New York, NY USA", 2);
        check_tag(&mut lexer, "Date", "1997.05.11", 3);
        check_tag(&mut lexer, "Round", "6", 4);
        check_tag(&mut lexer, "White", "Deep Blue", 5);
        check_tag(&mut lexer, "Black", "Kasparov, Garry", 6);
        check_tag(&mut lexer, "Opening", "Caro-Kann: 4...Nd7", 7);
        check_tag(&mut lexer, "ECO", "B17", 8);
        check_tag(&mut lexer, "Result", "1-0", 9);
        check_token(&mut lexer, TokenKind::Comment, 11, "Beispielpartie in PGN");

        check_full_move(&mut lexer, 1, "e4", "c6");
        check_full_move(&mut lexer, 2, "d4", "d5");
        check_full_move(&mut lexer, 3, "Nc3", "dxe4");
        check_full_move(&mut lexer, 4, "Nxe4", "Nd7");
        check_full_move(&mut lexer, 5, "Ng5", "Ngf6");
        check_full_move(&mut lexer, 6, "Bd3", "e6");
        check_full_move(&mut lexer, 7, "N1f3", "h6");
        check_full_move(&mut lexer, 8, "Nxe6", "Qe7");
        check_full_move(&mut lexer, 9, "O-O", "fxe6");
        check_full_move(&mut lexer, 10, "Bg6+", "Kd8");
        check_token(
            &mut lexer,
            TokenKind::Comment,
            13,
            "Kasparov schüttelt kurz den Kopf",
        );
        check_full_move(&mut lexer, 11, "Bf4", "b5");
        check_full_move(&mut lexer, 12, "a4", "Bb7");
        check_full_move(&mut lexer, 13, "Re1", "Nd5");
        check_full_move(&mut lexer, 14, "Bg3", "Kc8");
        check_full_move(&mut lexer, 15, "axb5", "cxb5");
        check_full_move(&mut lexer, 16, "Qd3", "Bc6");
        check_full_move(&mut lexer, 17, "Bf5", "exf5");
        check_full_move(&mut lexer, 18, "Rxe7", "Bxe7");
        check_token(&mut lexer, TokenKind::Number, 13, "19");
        check_token(&mut lexer, TokenKind::Dot, 13, "");
        check_token(&mut lexer, TokenKind::Symbol, 13, "c4");
        check_token(&mut lexer, TokenKind::GameResult, 13, "1-0");
    }

    #[test]
    fn game_with_variations() {
        let data = concat!(
            "[Event \"Yugoslavian Club Championship\"]\n",
            "[Site \"Vrnjacka-Banja\"]\n",
            "[Date \"1999\"]\n",
            "[White \"Beliavsky, Alexander\"]\n",
            "[Black \"Sakaev, Konstantin\"]\n",
            "[WhiteELO \"2618\"]\n",
            "[BlackELO \"2648\"]\n",
            "[Result \"1/2-1/2\"]\n",
            "[Source \"Russian Chess\"]\n",
            "[Annotator \"GM Konstantin Sakaev\"]\n",
            " \n",
            "1. d4 d5 2. c4 dxc4 3. e4 Nf6 4. e5 Nd5 5. Bxc4 Nb6 6. Bb3 Nc6 \n",
            "7. Ne2 Bf5 8. a3 e6 9. Nbc3 Qd7 10. O-O O-O-O 11. Be3 h5 $1 \n",
            "(11...f6 12. exf6 gxf6 13. Re1 $1 $14)\n",
            "24. Rfe1\n",
            "({Better is} 24. f3 $1 Re2 25. Rf2 Rde8 26. Kf1 R2e6 $15)\n",
        );
        let mut lexer = lexer(data);

        check_tag(&mut lexer, "Event", "Yugoslavian Club Championship", 1);
        check_tag(&mut lexer, "Site", "Vrnjacka-Banja", 2);
        check_tag(&mut lexer, "Date", "1999", 3);
        check_tag(&mut lexer, "White", "Beliavsky, Alexander", 4);
        check_tag(&mut lexer, "Black", "Sakaev, Konstantin", 5);
        check_tag(&mut lexer, "WhiteELO", "2618", 6);
        check_tag(&mut lexer, "BlackELO", "2648", 7);
        check_tag(&mut lexer, "Result", "1/2-1/2", 8);
        check_tag(&mut lexer, "Source", "Russian Chess", 9);
        check_tag(&mut lexer, "Annotator", "GM Konstantin Sakaev", 10);

        check_full_move(&mut lexer, 1, "d4", "d5");
        check_full_move(&mut lexer, 2, "c4", "dxc4");
        check_full_move(&mut lexer, 3, "e4", "Nf6");
        check_full_move(&mut lexer, 4, "e5", "Nd5");
        check_full_move(&mut lexer, 5, "Bxc4", "Nb6");
        check_full_move(&mut lexer, 6, "Bb3", "Nc6");
        check_full_move(&mut lexer, 7, "Ne2", "Bf5");
        check_full_move(&mut lexer, 8, "a3", "e6");
        check_full_move(&mut lexer, 9, "Nbc3", "Qd7");
        check_full_move(&mut lexer, 10, "O-O", "O-O-O");
        check_full_move(&mut lexer, 11, "Be3", "h5");
        check_token(&mut lexer, TokenKind::Nag, 13, "1");
        check_token(&mut lexer, TokenKind::OpenParen, 14, "");
        check_token(&mut lexer, TokenKind::Number, 14, "11");
        check_token(&mut lexer, TokenKind::Dot, 14, "");
        check_token(&mut lexer, TokenKind::Dot, 14, "");
        check_token(&mut lexer, TokenKind::Dot, 14, "");
        check_token(&mut lexer, TokenKind::Symbol, 14, "f6");
        check_full_move(&mut lexer, 12, "exf6", "gxf6");
        check_token(&mut lexer, TokenKind::Number, 14, "13");
        check_token(&mut lexer, TokenKind::Dot, 14, "");
        check_token(&mut lexer, TokenKind::Symbol, 14, "Re1");
        check_token(&mut lexer, TokenKind::Nag, 14, "1");
        check_token(&mut lexer, TokenKind::Nag, 14, "14");
        check_token(&mut lexer, TokenKind::CloseParen, 14, "");
        check_token(&mut lexer, TokenKind::Number, 15, "24");
        check_token(&mut lexer, TokenKind::Dot, 15, "");
        check_token(&mut lexer, TokenKind::Symbol, 15, "Rfe1");
        check_token(&mut lexer, TokenKind::OpenParen, 16, "");
        check_token(&mut lexer, TokenKind::Comment, 16, "Better is");
        check_token(&mut lexer, TokenKind::Number, 16, "24");
        check_token(&mut lexer, TokenKind::Dot, 16, "");
        check_token(&mut lexer, TokenKind::Symbol, 16, "f3");
        check_token(&mut lexer, TokenKind::Nag, 16, "1");
        check_token(&mut lexer, TokenKind::Symbol, 16, "Re2");
    }

    #[test]
    fn result_forms() {
        let mut lexer = lexer("1-0 0-1 1/2-1/2 * 42 1-1 1/2");
        check_token(&mut lexer, TokenKind::GameResult, 1, "1-0");
        check_token(&mut lexer, TokenKind::GameResult, 1, "0-1");
        check_token(&mut lexer, TokenKind::GameResult, 1, "1/2-1/2");
        check_token(&mut lexer, TokenKind::GameResult, 1, "*");
        check_token(&mut lexer, TokenKind::Number, 1, "42");
        check_token(&mut lexer, TokenKind::Invalid, 1, "1-1");
        check_token(&mut lexer, TokenKind::Invalid, 1, "1/2");
    }

    #[test]
    fn comment_whitespace_is_normalized() {
        let mut lexer = lexer("{An excellent\nreply,\t avoiding \r\n complications}");
        check_token(
            &mut lexer,
            TokenKind::Comment,
            1,
            "An excellent reply, avoiding complications",
        );
        assert_eq!(lexer.line_number(), 3);
    }

    #[test]
    fn newlines_in_strings_bump_the_line_counter() {
        let mut lexer = lexer("[Event \"two\nlines\"]\n[Site \"s\"]");
        check_token(&mut lexer, TokenKind::OpenBracket, 1, "");
        check_token(&mut lexer, TokenKind::Symbol, 1, "Event");
        check_token(&mut lexer, TokenKind::String, 1, "two\nlines");
        check_token(&mut lexer, TokenKind::CloseBracket, 2, "");
        check_tag(&mut lexer, "Site", "s", 3);
    }

    #[test]
    fn unterminated_comment_is_an_input_error() {
        let mut lexer = lexer("1. e4 {no end\nin sight");
        check_token(&mut lexer, TokenKind::Number, 1, "1");
        check_token(&mut lexer, TokenKind::Dot, 1, "");
        check_token(&mut lexer, TokenKind::Symbol, 1, "e4");
        let err = lexer.next_token().expect_err("error");
        assert_eq!(err.kind, PgnErrorKind::InputError);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn invalid_bytes() {
        let mut lexer = lexer(", } %");
        check_token(&mut lexer, TokenKind::Invalid, 1, ",");
        check_token(&mut lexer, TokenKind::Invalid, 1, "}");
        check_token(&mut lexer, TokenKind::Invalid, 1, "%");
    }

    #[test]
    fn nag_token_collects_digits() {
        let mut lexer = lexer("$1 $141 $");
        check_token(&mut lexer, TokenKind::Nag, 1, "1");
        check_token(&mut lexer, TokenKind::Nag, 1, "141");
        check_token(&mut lexer, TokenKind::Nag, 1, "");
    }

    #[test]
    fn bom_is_skipped() {
        let mut lexer = lexer("\u{feff}[Event \"e\"]");
        check_token(&mut lexer, TokenKind::OpenBracket, 1, "");
        check_token(&mut lexer, TokenKind::Symbol, 1, "Event");
    }

    #[test]
    fn skip_back_unreads_one_byte() {
        let mut lexer = lexer("Qe2[");
        check_token(&mut lexer, TokenKind::Symbol, 1, "Qe2");
        check_token(&mut lexer, TokenKind::OpenBracket, 1, "");
        lexer.skip_back();
        check_token(&mut lexer, TokenKind::OpenBracket, 1, "");
    }
}
