//! Compile end-user search text into PostgreSQL `to_tsquery` input.
//!
//! Supports `AND`, `OR`, `NOT`, parentheses and quoted phrases. Adjacent terms
//! are AND-ed, words match as prefixes, phrases match exactly. Characters with
//! a meaning in tsquery syntax never reach the output.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Phrase(String),
    Word(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Term { value: String, phrase: bool },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

pub(super) fn compile_search_term(raw: &str) -> String {
    let mut p = Parser::new(raw);
    let parsed = match p.parse_or() {
        Some(expr) if p.peek().is_none() => compile_expr(&expr),
        _ => None,
    };
    parsed.unwrap_or_else(|| fallback(raw))
}

/// AND all words, ignoring any operator structure.
fn fallback(raw: &str) -> String {
    raw.split_whitespace()
        .filter(|w| !matches!(w.to_ascii_uppercase().as_str(), "AND" | "OR" | "NOT"))
        .filter_map(prefix_lexemes)
        .collect::<Vec<_>>()
        .join(" & ")
}

fn lexemes(value: &str) -> Vec<String> {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

fn prefix_lexemes(word: &str) -> Option<String> {
    let parts = lexemes(word);
    match parts.len() {
        0 => None,
        1 => Some(format!("{}:*", parts[0])),
        _ => Some(format!(
            "({})",
            parts
                .iter()
                .map(|p| format!("{p}:*"))
                .collect::<Vec<_>>()
                .join(" & ")
        )),
    }
}

fn phrase_lexemes(phrase: &str) -> Option<String> {
    let parts = lexemes(phrase);
    match parts.len() {
        0 => None,
        1 => Some(parts[0].clone()),
        _ => Some(format!("({})", parts.join(" <-> "))),
    }
}

fn compile_expr(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Term { value, phrase } => {
            if *phrase {
                phrase_lexemes(value)
            } else {
                prefix_lexemes(value)
            }
        }
        Expr::And(a, b) => join(compile_expr(a), compile_expr(b), "&"),
        Expr::Or(a, b) => join(compile_expr(a), compile_expr(b), "|"),
        Expr::Not(inner) => compile_expr(inner).map(|s| format!("!{s}")),
    }
}

fn join(a: Option<String>, b: Option<String>, op: &str) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) => Some(format!("({a} {op} {b})")),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.consume_char();
        }
    }

    fn next_tok(&mut self) -> Option<Tok> {
        self.skip_ws();
        match self.peek_char()? {
            '(' => {
                self.consume_char();
                Some(Tok::LParen)
            }
            ')' => {
                self.consume_char();
                Some(Tok::RParen)
            }
            '"' => self.lex_phrase(),
            _ => self.lex_word(),
        }
    }

    fn lex_phrase(&mut self) -> Option<Tok> {
        if self.consume_char() != Some('"') {
            return None;
        }
        let mut out = String::new();
        while let Some(c) = self.consume_char() {
            if c == '"' {
                return Some(Tok::Phrase(out));
            }
            out.push(c);
        }
        // Unterminated phrase: treat the rest as a phrase.
        Some(Tok::Phrase(out))
    }

    fn lex_word(&mut self) -> Option<Tok> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || c == '(' || c == ')' || c == '"' {
                break;
            }
            self.consume_char();
        }
        let raw = &self.input[start..self.pos];
        if raw.is_empty() {
            return None;
        }
        match raw {
            "AND" | "&&" => Some(Tok::And),
            "OR" | "||" => Some(Tok::Or),
            "NOT" | "-" => Some(Tok::Not),
            _ => Some(Tok::Word(raw.to_string())),
        }
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Tok>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            peeked: None,
        }
    }

    fn peek(&mut self) -> Option<&Tok> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next_tok();
        }
        self.peeked.as_ref()
    }

    fn next(&mut self) -> Option<Tok> {
        if let Some(tok) = self.peeked.take() {
            return Some(tok);
        }
        self.lexer.next_tok()
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Tok::Or)) {
            self.next();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Tok::And) => {
                    self.next();
                }
                Some(Tok::Or) | Some(Tok::RParen) | None => break,
                Some(Tok::Word(_) | Tok::Phrase(_) | Tok::LParen | Tok::Not) => {}
            }

            let right = match self.peek() {
                Some(Tok::Or) | Some(Tok::RParen) | None => break,
                _ => self.parse_unary()?,
            };
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        if matches!(self.peek(), Some(Tok::Not)) {
            self.next();
            let inner = self.parse_unary()?;
            return Some(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        match self.next()? {
            Tok::LParen => {
                let inner = self.parse_or()?;
                if self.next() != Some(Tok::RParen) {
                    return None;
                }
                Some(inner)
            }
            Tok::Phrase(s) => Some(Expr::Term {
                value: s,
                phrase: true,
            }),
            Tok::Word(s) => Some(Expr::Term {
                value: s,
                phrase: false,
            }),
            _ => None,
        }
    }
}
