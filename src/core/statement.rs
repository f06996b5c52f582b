//! # Statement — Predicado Aplicado a Termos
//!
//! Um [`Statement`] é a **unidade atômica de conhecimento** do raciocinador:
//! um símbolo de predicado seguido de uma lista ordenada de [`Term`]s.
//!
//! ## Termos
//!
//! | Variante | Sintaxe textual | Exemplo |
//! |----------|-----------------|---------|
//! | `Constant` | nome simples | `cube`, `red`, `1` |
//! | `Variable` | prefixo `?` | `?x`, `?obj` |
//!
//! Variáveis **não são globais** — o escopo de `?x` é o statement (ou a regra)
//! onde aparece. O [matcher](crate::inference::matcher) renomeia/vincula por
//! invocação.
//!
//! ## Exemplo
//!
//! ```rust
//! use semantic_reasoner::core::{Statement, Term};
//!
//! let s = Statement::new("isa", vec![Term::var("x"), Term::constant("block")]);
//! assert_eq!(s.to_string(), "(isa ?x block)");
//! assert!(!s.is_ground());
//! ```

use std::fmt;

use serde::Serialize;

/// Termo de um statement — constante opaca ou variável nomeada.
///
/// O nome de uma variável é guardado **sem** o prefixo `?`; o prefixo
/// só existe na forma textual (veja o `Display`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "name")]
pub enum Term {
    /// Átomo comparável por igualdade exata.
    Constant(String),
    /// Placeholder nomeado, vinculado durante o matching.
    Variable(String),
}

impl Term {
    /// Atalho para criar uma constante.
    pub fn constant(name: impl Into<String>) -> Self {
        Term::Constant(name.into())
    }

    /// Atalho para criar uma variável (sem o `?`).
    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(name.into())
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Nome do termo, sem prefixo.
    pub fn name(&self) -> &str {
        match self {
            Term::Constant(name) | Term::Variable(name) => name,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Constant(name) => write!(f, "{}", name),
            Term::Variable(name) => write!(f, "?{}", name),
        }
    }
}

/// Predicado + termos ordenados.
///
/// A igualdade estrutural (`PartialEq`) compara predicado e termos
/// posicionalmente — é ela que a [`KnowledgeBase`](super::KnowledgeBase)
/// usa para deduplicar fatos e regras.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Statement {
    /// Símbolo do predicado (ex: `isa`, `color`).
    pub predicate: String,
    /// Termos na ordem em que aparecem.
    pub terms: Vec<Term>,
}

impl Statement {
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Self {
        Self {
            predicate: predicate.into(),
            terms,
        }
    }

    /// Número de termos (aridade).
    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// `true` se nenhum termo for variável.
    ///
    /// Fatos em repouso na KB devem ser ground; regras parcialmente
    /// aplicadas podem conter variáveis em aberto.
    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(|t| !t.is_variable())
    }

    /// Itera sobre os nomes das variáveis, na ordem de aparição (com repetição).
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().filter_map(|t| match t {
            Term::Variable(name) => Some(name.as_str()),
            Term::Constant(_) => None,
        })
    }
}

/// Forma textual `(predicado t1 t2 ...)`, a mesma aceita pelo
/// [`reader`](crate::reader).
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.predicate)?;
        for term in &self.terms {
            write!(f, " {}", term)?;
        }
        write!(f, ")")
    }
}
