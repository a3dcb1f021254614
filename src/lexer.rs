//! Indentation-aware tokenizer.
//!
//! Single forward pass producing a flat token stream with synthetic
//! `Indent`/`Dedent`/`Newline` markers. A two-state machine alternates
//! between measuring indentation at line starts and reading ordinary tokens;
//! dedent bursts are queued so every call still emits one token. Layout
//! tokens are suppressed while parentheses, brackets or braces are open.

use crate::diag::MeowError;
use crate::token::{self, Position, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexerState {
    LineBegin,
    TokenStart,
}

enum StepOutcome {
    Emit(Token),
    Continue,
}

pub type LexResult<T> = Result<T, MeowError>;

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    indent_stack: Vec<usize>,
    depth: usize,
    pending: Vec<Token>,
    state: LexerState,
    newline_emitted: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let normalized = source.replace("\r\n", "\n");
        Self {
            chars: normalized.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            depth: 0,
            pending: Vec::new(),
            state: LexerState::LineBegin,
            newline_emitted: true,
        }
    }

    pub fn next_token(&mut self) -> LexResult<Token> {
        loop {
            if let Some(tok) = self.pending.pop() {
                self.newline_emitted = matches!(tok.kind, TokenKind::Newline);
                return Ok(tok);
            }
            match self.step_state()? {
                StepOutcome::Emit(tok) => {
                    self.newline_emitted = matches!(tok.kind, TokenKind::Newline);
                    return Ok(tok);
                }
                StepOutcome::Continue => continue,
            }
        }
    }

    fn step_state(&mut self) -> LexResult<StepOutcome> {
        match self.state {
            LexerState::LineBegin => self.step_line_begin(),
            LexerState::TokenStart => self.step_token_start(),
        }
    }

    /// Measures leading whitespace and emits Indent/Dedent tokens as needed.
    /// Blank and comment lines are consumed here without affecting layout.
    fn step_line_begin(&mut self) -> LexResult<StepOutcome> {
        let line_start = Position::new(self.line, 1);
        let mut width = 0usize;
        let mut saw_space = false;
        let mut saw_tab = false;

        while let Some(ch) = self.peek() {
            match ch {
                ' ' => {
                    saw_space = true;
                    width += 1;
                }
                '\t' => {
                    saw_tab = true;
                    width += 4;
                }
                _ => break,
            }
            self.advance();
        }

        if saw_space && saw_tab {
            return Err(MeowError::new("E101").at(line_start));
        }

        match self.peek() {
            None => {
                self.state = LexerState::TokenStart;
                return Ok(StepOutcome::Continue);
            }
            Some('#') => {
                self.skip_comment();
                if self.peek() == Some('\n') {
                    self.advance();
                }
                return Ok(StepOutcome::Continue);
            }
            Some('\n') => {
                self.advance();
                return Ok(StepOutcome::Continue);
            }
            _ => {}
        }

        self.state = LexerState::TokenStart;
        let current = self.current_indent();

        if width > current {
            self.indent_stack.push(width);
            return Ok(StepOutcome::Emit(Token::new(
                TokenKind::Indent,
                "",
                line_start,
            )));
        }
        if width < current {
            while self.current_indent() > width {
                self.indent_stack.pop();
                self.pending
                    .push(Token::new(TokenKind::Dedent, "", line_start));
            }
            if self.current_indent() != width {
                return Err(MeowError::new("E102")
                    .at(line_start)
                    .with_detail("width", width));
            }
        }
        Ok(StepOutcome::Continue)
    }

    fn step_token_start(&mut self) -> LexResult<StepOutcome> {
        while matches!(self.peek(), Some(' ') | Some('\t') | Some('\r')) {
            self.advance();
        }

        if self.peek() == Some('#') {
            self.skip_comment();
            return Ok(StepOutcome::Continue);
        }

        let Some(ch) = self.peek() else {
            return self.handle_eof();
        };

        if ch == '\n' {
            let pos = self.position();
            self.advance();
            if self.depth == 0 {
                self.state = LexerState::LineBegin;
                return Ok(StepOutcome::Emit(Token::new(TokenKind::Newline, "\n", pos)));
            }
            return Ok(StepOutcome::Continue);
        }

        Ok(StepOutcome::Emit(self.read_token(ch)?))
    }

    /// At physical end of input: one final Newline, a Dedent per open indent,
    /// then Eof.
    fn handle_eof(&mut self) -> LexResult<StepOutcome> {
        let pos = self.position();
        if !self.newline_emitted {
            return Ok(StepOutcome::Emit(Token::new(TokenKind::Newline, "", pos)));
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.pending.push(Token::new(TokenKind::Dedent, "", pos));
        }
        if !self.pending.is_empty() {
            return Ok(StepOutcome::Continue);
        }
        Ok(StepOutcome::Emit(Token::new(TokenKind::Eof, "", pos)))
    }

    fn read_token(&mut self, ch: char) -> LexResult<Token> {
        if ch == '"' {
            return self.read_string();
        }
        if ch.is_ascii_digit() || (ch == '.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()))
        {
            return Ok(self.read_number());
        }
        if ch.is_alphabetic() || ch == '_' {
            return Ok(self.read_word());
        }
        self.read_operator(ch)
    }

    fn read_string(&mut self) -> LexResult<Token> {
        let start = self.position();
        self.advance();
        let mut value = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => return Err(MeowError::new("E103").at(start)),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        None | Some('\n') => return Err(MeowError::new("E103").at(start)),
                        Some(escaped) => {
                            match escaped {
                                'n' => value.push('\n'),
                                't' => value.push('\t'),
                                'r' => value.push('\r'),
                                '\\' => value.push('\\'),
                                '"' => value.push('"'),
                                other => {
                                    value.push('\\');
                                    value.push(other);
                                }
                            }
                            self.advance();
                        }
                    }
                }
                Some(other) => {
                    value.push(other);
                    self.advance();
                }
            }
        }

        let lexeme = value.clone();
        Ok(Token::new(TokenKind::Str(value), lexeme, start))
    }

    fn read_number(&mut self) -> Token {
        let start = self.position();
        let from = self.pos;
        let mut has_dot = false;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.'
                && !has_dot
                && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
            {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.chars[from..self.pos].iter().collect();
        let kind = if has_dot {
            TokenKind::Float(text.parse().unwrap_or(0.0))
        } else {
            match text.parse::<i64>() {
                Ok(value) => TokenKind::Integer(value),
                // Too large for i64: widen to float.
                Err(_) => TokenKind::Float(text.parse().unwrap_or(f64::INFINITY)),
            }
        };
        Token::new(kind, text, start)
    }

    /// Reads an identifier or keyword, folding two-word composites
    /// (`sinon si`, `tant que`, `pour chaque`, `demander texte/nombre`)
    /// into a single token. A composite never crosses a newline.
    fn read_word(&mut self) -> Token {
        let start = self.position();
        let word = self.read_identifier();
        let lower = word.to_lowercase();

        if token::starts_composite(&lower) {
            let checkpoint = (self.pos, self.column);
            while matches!(self.peek(), Some(' ') | Some('\t')) {
                self.advance();
            }
            if self.peek().is_some_and(|c| c.is_alphabetic() || c == '_') {
                let second = self.read_identifier();
                if let Some(kind) = token::composite(&lower, &second.to_lowercase()) {
                    return Token::new(kind, format!("{word} {second}"), start);
                }
            }
            self.pos = checkpoint.0;
            self.column = checkpoint.1;
        }

        match token::keyword(&lower) {
            Some(kind) => Token::new(kind, word, start),
            None => {
                let lexeme = word.clone();
                Token::new(TokenKind::Identifier(word), lexeme, start)
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let from = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }
        self.chars[from..self.pos].iter().collect()
    }

    fn read_operator(&mut self, ch: char) -> LexResult<Token> {
        let start = self.position();
        self.advance();

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.peek() == Some('/') {
                    self.advance();
                    TokenKind::SlashSlash
                } else {
                    TokenKind::Slash
                }
            }
            '%' => TokenKind::Percent,
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Equal
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::NotEqual
                } else {
                    return Err(MeowError::new("E100")
                        .at(start)
                        .with_instruction("!")
                        .with_detail("got", "'!'")
                        .with_detail("expected", "'!='"));
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '(' => {
                self.depth += 1;
                TokenKind::LParen
            }
            ')' => {
                self.depth = self.depth.saturating_sub(1);
                TokenKind::RParen
            }
            '[' => {
                self.depth += 1;
                TokenKind::LBracket
            }
            ']' => {
                self.depth = self.depth.saturating_sub(1);
                TokenKind::RBracket
            }
            '{' => {
                self.depth += 1;
                TokenKind::LBrace
            }
            '}' => {
                self.depth = self.depth.saturating_sub(1);
                TokenKind::RBrace
            }
            '.' => TokenKind::Dot,
            other => {
                return Err(MeowError::new("E100")
                    .at(start)
                    .with_instruction(other.to_string())
                    .with_detail("got", format!("'{other}'"))
                    .with_detail("expected", "un symbole valide"));
            }
        };

        let end = self.pos;
        let lexeme: String = self.chars[end - lexeme_len(&kind)..end].iter().collect();
        Ok(Token::new(kind, lexeme, start))
    }

    fn skip_comment(&mut self) {
        while self.peek().is_some_and(|c| c != '\n') {
            self.advance();
        }
    }

    fn current_indent(&self) -> usize {
        *self.indent_stack.last().expect("indent stack never empty")
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }
}

fn lexeme_len(kind: &TokenKind) -> usize {
    match kind {
        TokenKind::StarStar
        | TokenKind::SlashSlash
        | TokenKind::Equal
        | TokenKind::NotEqual
        | TokenKind::LessEqual
        | TokenKind::GreaterEqual => 2,
        _ => 1,
    }
}

pub fn tokenize(source: &str) -> LexResult<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = matches!(token.kind, TokenKind::Eof);
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    Ok(tokens)
}
