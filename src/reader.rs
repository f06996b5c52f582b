//! # Reader — Leitura da Sintaxe Textual de Fatos e Regras
//!
//! O núcleo só consome [`Item`]s já estruturados; este módulo é o colaborador
//! externo que transforma texto nesses itens.
//!
//! ## Sintaxe
//!
//! Um item por linha. Linhas vazias e linhas iniciadas por `#` são ignoradas.
//!
//! ```text
//! # blocos
//! fact: (isa cube block)
//! fact: (color cube red)
//! rule: ((isa ?x ?y) (isa ?y ?z)) -> (isa ?x ?z)
//! rule: (inst ?x ?y) -> (isa ?x ?y)
//! ```
//!
//! - Termos iniciados por `?` são variáveis; o resto é constante
//! - O `lhs` de uma regra pode ser uma lista `((..) (..))` ou um único
//!   statement `(..)`
//! - Termos são planos: parênteses aninhados dentro de um statement são erro
//!
//! ## Tokenização
//!
//! Uma única regex separa `(`, `)`, `->` e símbolos:
//!
//! ```text
//! "rule: ((a ?x)) -> (b ?x)"  →  ( ( a ?x ) ) -> ( b ?x )
//! ```

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::core::{Item, Statement, Term};

/// Erros de leitura.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("esperava `fact:` ou `rule:` em `{0}`")]
    MissingPrefix(String),

    #[error("esperava {expected}, encontrou `{found}`")]
    UnexpectedToken { expected: &'static str, found: String },

    #[error("fim inesperado da entrada, esperava {0}")]
    UnexpectedEnd(&'static str),

    #[error("regra sem `->`")]
    MissingArrow,

    #[error("regra sem antecedentes")]
    EmptyRule,

    #[error("variável sem nome (`?` isolado)")]
    EmptyVariable,

    #[error("conteúdo sobrando após o item: `{0}`")]
    TrailingInput(String),

    #[error("linha {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<ParseError>,
    },

    #[error("falha ao ler {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Tokenizador compartilhado, construído uma única vez.
fn token_re() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| Regex::new(r"->|\(|\)|[^\s()]+").expect("regex de tokens válida"))
}

fn tokenize(text: &str) -> Vec<&str> {
    token_re().find_iter(text).map(|m| m.as_str()).collect()
}

/// Cursor sobre os tokens de um item.
struct Tokens<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            tokens: tokenize(text),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_second(&self) -> Option<&'a str> {
        self.tokens.get(self.pos + 1).copied()
    }

    fn advance(&mut self, expected: &'static str) -> Result<&'a str, ParseError> {
        let token = self.peek().ok_or(ParseError::UnexpectedEnd(expected))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, wanted: &'static str) -> Result<(), ParseError> {
        let found = self.advance(wanted)?;
        if found == wanted {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: wanted,
                found: found.to_string(),
            })
        }
    }

    fn finish(&self) -> Result<(), ParseError> {
        if self.pos < self.tokens.len() {
            Err(ParseError::TrailingInput(self.tokens[self.pos..].join(" ")))
        } else {
            Ok(())
        }
    }

    /// `( predicado termo* )`
    fn statement(&mut self) -> Result<Statement, ParseError> {
        self.expect("(")?;
        let predicate = self.symbol("um predicado")?;
        let mut terms = Vec::new();
        loop {
            match self.peek() {
                Some(")") => {
                    self.pos += 1;
                    return Ok(Statement::new(predicate, terms));
                }
                Some(_) => terms.push(term(self.symbol("um termo ou `)`")?)?),
                None => return Err(ParseError::UnexpectedEnd("`)`")),
            }
        }
    }

    fn symbol(&mut self, expected: &'static str) -> Result<&'a str, ParseError> {
        let token = self.advance(expected)?;
        match token {
            "(" | ")" | "->" => Err(ParseError::UnexpectedToken {
                expected,
                found: token.to_string(),
            }),
            _ => Ok(token),
        }
    }

    /// `((..) (..))` ou um único `(..)`.
    fn antecedents(&mut self) -> Result<Vec<Statement>, ParseError> {
        if self.peek() == Some("(") && self.peek_second() == Some("(") {
            self.pos += 1;
            let mut lhs = Vec::new();
            while self.peek() == Some("(") {
                lhs.push(self.statement()?);
            }
            self.expect(")")?;
            if lhs.is_empty() {
                return Err(ParseError::EmptyRule);
            }
            Ok(lhs)
        } else if self.peek() == Some("(") && self.peek_second() == Some(")") {
            Err(ParseError::EmptyRule)
        } else {
            Ok(vec![self.statement()?])
        }
    }
}

fn term(token: &str) -> Result<Term, ParseError> {
    match token.strip_prefix('?') {
        Some("") => Err(ParseError::EmptyVariable),
        Some(name) => Ok(Term::var(name)),
        None => Ok(Term::constant(token)),
    }
}

/// Lê um único statement, ex: `(isa ?x block)`.
pub fn parse_statement(text: &str) -> Result<Statement, ParseError> {
    let mut tokens = Tokens::new(text);
    let statement = tokens.statement()?;
    tokens.finish()?;
    Ok(statement)
}

/// Lê um item `fact: ...` ou `rule: ... -> ...`.
///
/// # Exemplo
///
/// ```rust
/// use semantic_reasoner::core::Item;
/// use semantic_reasoner::reader::parse_input;
///
/// let item = parse_input("rule: ((isa ?x ?y) (isa ?y ?z)) -> (isa ?x ?z)").unwrap();
/// assert!(matches!(item, Item::Rule(ref r) if r.lhs.len() == 2));
/// ```
pub fn parse_input(text: &str) -> Result<Item, ParseError> {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix("fact:") {
        return Ok(Item::fact(parse_statement(rest)?));
    }
    let Some(rest) = text.strip_prefix("rule:") else {
        return Err(ParseError::MissingPrefix(text.to_string()));
    };

    let mut tokens = Tokens::new(rest);
    let lhs = tokens.antecedents()?;
    match tokens.advance("`->`")? {
        "->" => {}
        _ => return Err(ParseError::MissingArrow),
    }
    let rhs = tokens.statement()?;
    tokens.finish()?;
    Ok(Item::rule(lhs, rhs))
}

/// Lê todos os itens de um texto, um por linha.
///
/// Erros carregam o número da linha (a partir de 1).
pub fn read_str(text: &str) -> Result<Vec<Item>, ParseError> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, content)| {
            parse_input(content).map_err(|e| ParseError::AtLine {
                line,
                source: Box::new(e),
            })
        })
        .collect()
}

/// Lê um arquivo de fatos e regras.
pub fn read_tokenize(path: impl AsRef<Path>) -> Result<Vec<Item>, ParseError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let items = read_str(&text)?;
    tracing::debug!(path = %path.display(), items = items.len(), "Arquivo de regras lido");
    Ok(items)
}
