//! # Bindings — Conjuntos de Vinculação de Variáveis
//!
//! Um [`Bindings`] é o resultado de um matching bem-sucedido: uma associação
//! ordenada `variável → termo`. Uma consulta à KB produz uma
//! [`ListOfBindings`] — um conjunto de vinculações por fato que casou.
//!
//! ```text
//! consulta: (isa ?x block)
//! fatos:    (isa cube block), (isa pyramid block)
//! ─────────────────────────────────────────────
//! [ {?x : cube}, {?x : pyramid} ]
//! ```

use std::fmt;

use serde::Serialize;

use super::fact::FactId;
use super::statement::Term;

/// Associação ordenada `nome de variável → termo`.
///
/// A ordem de inserção é preservada (útil para exibição determinística).
/// Uma variável pode ser vinculada a outra variável quando os dois lados
/// do matching têm variáveis na mesma posição.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Bindings {
    entries: Vec<(String, Term)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Termo ao qual `variable` está vinculada, se houver.
    pub fn bound_to(&self, variable: &str) -> Option<&Term> {
        self.entries
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, term)| term)
    }

    /// Vincula `variable` a `value`, ou verifica a vinculação existente.
    ///
    /// Retorna `false` se a variável já estiver vinculada a outro termo —
    /// é assim que uma segunda ocorrência da mesma variável restringe o
    /// matching.
    pub fn test_and_bind(&mut self, variable: &str, value: &Term) -> bool {
        match self.bound_to(variable) {
            Some(existing) => existing == value,
            None => {
                self.entries.push((variable.to_string(), value.clone()));
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.entries.iter().map(|(name, term)| (name.as_str(), term))
    }
}

/// Formato `?x : cube, ?y : red`.
impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(name, term)| format!("?{} : {}", name, term))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Resultado de [`kb_ask`](super::KnowledgeBase::kb_ask): uma vinculação por
/// fato que casou, junto com o fato de origem.
///
/// A proveniência serve apenas para inspeção — não entra no grafo de suporte.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ListOfBindings {
    entries: Vec<(Bindings, FactId)>,
}

impl ListOfBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bindings(&mut self, bindings: Bindings, fact: FactId) {
        self.entries.push((bindings, fact));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Só as vinculações, na ordem dos fatos na KB.
    pub fn bindings(&self) -> impl Iterator<Item = &Bindings> {
        self.entries.iter().map(|(b, _)| b)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Bindings, FactId)> {
        self.entries.iter()
    }
}

impl fmt::Display for ListOfBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (bindings, _)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", bindings)?;
        }
        Ok(())
    }
}
