use super::types::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    If,
    Elseif,
    Else,
    While,
    For,
    End,
    Break,
    Continue,
    Return,
    Function,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Self> {
        let kw = match word {
            "if" => Self::If,
            "elseif" => Self::Elseif,
            "else" => Self::Else,
            "while" => Self::While,
            "for" => Self::For,
            "end" | "endif" | "endwhile" | "endfor" => Self::End,
            "break" => Self::Break,
            "continue" => Self::Continue,
            "return" => Self::Return,
            "function" => Self::Function,
            _ => return None,
        };
        Some(kw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),
    Keyword(Keyword),
    Plus,
    Minus,
    Star,
    Slash,
    Backslash,
    Caret,
    DotStar,
    DotSlash,
    DotCaret,
    PlusPlus,
    MinusMinus,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    Equal,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Not,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Newline,
    Colon,
    Dot,
    Transpose,
    Eof,
}

impl TokenKind {
    /// Tokens after which a quote means transpose rather than a string.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Ident(_)
                | TokenKind::Number(_)
                | TokenKind::Str(_)
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::Transpose
                | TokenKind::Keyword(Keyword::End)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) column: usize,
}

pub(crate) struct Lexer {
    chars: Vec<char>,
    pos: usize,
    prev: Option<TokenKind>,
    adjacent: bool,
}

impl Lexer {
    pub(crate) fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            prev: None,
            adjacent: false,
        }
    }

    pub(crate) fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            self.prev = Some(token.kind.clone());
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace_and_comments(&mut self) {
        let start = self.pos;
        while let Some(ch) = self.current() {
            match ch {
                ' ' | '\t' | '\r' => self.advance(),
                '%' | '#' => {
                    while let Some(c) = self.current() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                '.' if self.peek() == Some('.') && self.chars.get(self.pos + 2) == Some(&'.') => {
                    // continuation: skip to the next line
                    while let Some(c) = self.current() {
                        self.advance();
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
        self.adjacent = self.pos == start;
    }

    /// Consume `second` if it follows, yielding `double`; otherwise `single`.
    fn pair(&mut self, second: char, double: TokenKind, single: TokenKind) -> TokenKind {
        self.advance();
        if self.current() == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace_and_comments();
        let column = self.pos;
        let Some(ch) = self.current() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                column,
            });
        };

        let kind = match ch {
            '\n' => {
                self.advance();
                TokenKind::Newline
            }
            '+' => {
                self.advance();
                match self.current() {
                    Some('+') => {
                        self.advance();
                        TokenKind::PlusPlus
                    }
                    Some('=') => {
                        self.advance();
                        TokenKind::PlusEqual
                    }
                    _ => TokenKind::Plus,
                }
            }
            '-' => {
                self.advance();
                match self.current() {
                    Some('-') => {
                        self.advance();
                        TokenKind::MinusMinus
                    }
                    Some('=') => {
                        self.advance();
                        TokenKind::MinusEqual
                    }
                    _ => TokenKind::Minus,
                }
            }
            '*' => self.pair('=', TokenKind::StarEqual, TokenKind::Star),
            '/' => self.pair('=', TokenKind::SlashEqual, TokenKind::Slash),
            '\\' => {
                self.advance();
                TokenKind::Backslash
            }
            '^' => {
                self.advance();
                TokenKind::Caret
            }
            '=' => self.pair('=', TokenKind::EqualEqual, TokenKind::Equal),
            '~' | '!' => self.pair('=', TokenKind::NotEqual, TokenKind::Not),
            '<' => self.pair('=', TokenKind::LessEqual, TokenKind::Less),
            '>' => self.pair('=', TokenKind::GreaterEqual, TokenKind::Greater),
            '&' => self.pair('&', TokenKind::AmpAmp, TokenKind::Amp),
            '|' => self.pair('|', TokenKind::PipePipe, TokenKind::Pipe),
            '(' => {
                self.advance();
                TokenKind::LParen
            }
            ')' => {
                self.advance();
                TokenKind::RParen
            }
            '[' => {
                self.advance();
                TokenKind::LBracket
            }
            ']' => {
                self.advance();
                TokenKind::RBracket
            }
            '{' => {
                self.advance();
                TokenKind::LBrace
            }
            '}' => {
                self.advance();
                TokenKind::RBrace
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            ';' => {
                self.advance();
                TokenKind::Semicolon
            }
            ':' => {
                self.advance();
                TokenKind::Colon
            }
            '.' => match self.peek() {
                Some(d) if d.is_ascii_digit() => self.number()?,
                Some('*') => {
                    self.pos += 2;
                    TokenKind::DotStar
                }
                Some('/') => {
                    self.pos += 2;
                    TokenKind::DotSlash
                }
                Some('^') => {
                    self.pos += 2;
                    TokenKind::DotCaret
                }
                Some('\'') => {
                    self.pos += 2;
                    TokenKind::Transpose
                }
                _ => {
                    self.advance();
                    TokenKind::Dot
                }
            },
            '\'' if self.adjacent && self.prev.as_ref().is_some_and(TokenKind::ends_operand) => {
                self.advance();
                TokenKind::Transpose
            }
            '\'' | '"' => self.string(ch)?,
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_alphabetic() || c == '_' => self.word(),
            other => {
                return Err(ParseError::new(
                    format!("unexpected character '{other}'"),
                    column,
                ))
            }
        };

        Ok(Token { kind, column })
    }

    fn number(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        while self.current().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.current() == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.current().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        } else if self.current() == Some('.')
            && !matches!(self.peek(), Some('*' | '/' | '^' | '\''))
        {
            // trailing dot, as in `1.`
            self.advance();
        }
        if matches!(self.current(), Some('e' | 'E')) {
            let save = self.pos;
            self.advance();
            if matches!(self.current(), Some('+' | '-')) {
                self.advance();
            }
            if self.current().is_some_and(|c| c.is_ascii_digit()) {
                while self.current().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            } else {
                self.pos = save;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| ParseError::new(format!("malformed number '{text}'"), start))
    }

    fn string(&mut self, quote: char) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        self.advance();
        let mut value = String::new();
        loop {
            match self.current() {
                None | Some('\n') => {
                    return Err(ParseError::new("unterminated character string", start));
                }
                Some(c) if c == quote => {
                    self.advance();
                    // doubled quote is an escaped quote
                    if self.current() == Some(quote) {
                        value.push(quote);
                        self.advance();
                    } else {
                        return Ok(TokenKind::Str(value));
                    }
                }
                Some('\\') if quote == '"' => {
                    self.advance();
                    match self.current() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some(c) => value.push(c),
                        None => continue,
                    }
                    self.advance();
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    fn word(&mut self) -> TokenKind {
        let start = self.pos;
        while self
            .current()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match Keyword::lookup(&word) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident(word),
        }
    }
}
