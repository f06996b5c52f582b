//! # Fact e Rule — Itens da Base de Conhecimento
//!
//! A KB guarda dois tipos de item:
//!
//! - [`Fact`] — um [`Statement`] ground, ex: `(isa cube block)`
//! - [`Rule`] — antecedentes (`lhs`, E lógico) e um consequente (`rhs`),
//!   ex: `((isa ?x ?y) (isa ?y ?z)) -> (isa ?x ?z)`
//!
//! ## Grafo de Suporte
//!
//! Cada item carrega os dois sentidos do grafo de justificativas:
//!
//! | Campo | Sentido | Significado |
//! |-------|---------|-------------|
//! | `supported_by` | para trás | pares `(fato, regra)` que derivaram este item |
//! | `supports_facts` | para frente | fatos que este item ajudou a derivar |
//! | `supports_rules` | para frente | regras que este item ajudou a derivar |
//!
//! As arestas são **pares de identificadores** ([`FactId`], [`RuleId`]) e não
//! referências — a [`KnowledgeBase`](super::KnowledgeBase) é uma arena, e é a
//! única dona dos itens. Isso evita ciclos de ownership e mantém a travessia
//! das arestas reversas em O(1) por aresta durante a retração.
//!
//! ## Ciclo de Vida
//!
//! 1. Criado pelo usuário → `asserted = true`, `supported_by` vazio
//! 2. Criado pelo motor de inferência → `asserted = false`,
//!    `supported_by = [(premissa, regra)]`
//! 3. Removido **somente** por retração, quando não resta suporte

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::statement::Statement;

/// Identificador estável de um [`Fact`] dentro de uma KB.
///
/// Gerado por contador monotônico — nunca é reutilizado, mesmo após remoção.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FactId(pub(crate) u64);

/// Identificador estável de uma [`Rule`] dentro de uma KB.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RuleId(pub(crate) u64);

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Identificador de qualquer item da KB.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id")]
pub enum ItemId {
    Fact(FactId),
    Rule(RuleId),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Fact(id) => write!(f, "{}", id),
            ItemId::Rule(id) => write!(f, "{}", id),
        }
    }
}

/// Uma justificativa: "derivado combinando este fato com esta regra".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Support {
    pub fact: FactId,
    pub rule: RuleId,
}

impl Support {
    pub fn new(fact: FactId, rule: RuleId) -> Self {
        Self { fact, rule }
    }

    /// `true` se `item` é uma das duas premissas deste par.
    pub fn involves(&self, item: ItemId) -> bool {
        match item {
            ItemId::Fact(id) => self.fact == id,
            ItemId::Rule(id) => self.rule == id,
        }
    }
}

/// Fato da KB — um statement ground com seu estado de suporte.
#[derive(Clone, Debug, Serialize)]
pub struct Fact {
    pub statement: Statement,
    /// Verdadeiro independentemente de suporte inferencial.
    pub asserted: bool,
    /// Justificativas, sem duplicatas, na ordem em que chegaram.
    pub supported_by: Vec<Support>,
    pub supports_facts: BTreeSet<FactId>,
    pub supports_rules: BTreeSet<RuleId>,
}

impl Fact {
    /// Fato afirmado diretamente (sem suporte).
    pub fn new(statement: Statement) -> Self {
        Self {
            statement,
            asserted: true,
            supported_by: Vec::new(),
            supports_facts: BTreeSet::new(),
            supports_rules: BTreeSet::new(),
        }
    }

    /// Fato produzido pelo motor de inferência a partir de `support`.
    pub fn derived(statement: Statement, support: Support) -> Self {
        Self {
            asserted: false,
            supported_by: vec![support],
            ..Self::new(statement)
        }
    }

    /// Removível somente sem suporte e sem afirmação independente.
    pub fn is_removable(&self) -> bool {
        self.supported_by.is_empty() && !self.asserted
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fact: {}", self.statement)
    }
}

/// Regra da KB: `lhs` (antecedentes, em ordem de matching) → `rhs`.
///
/// Só o **primeiro** antecedente é casado contra fatos novos. Quando casa e
/// sobram antecedentes, o motor deriva uma regra mais específica com o resto
/// (veja [`InferenceEngine`](crate::inference::InferenceEngine)).
#[derive(Clone, Debug, Serialize)]
pub struct Rule {
    pub lhs: Vec<Statement>,
    pub rhs: Statement,
    pub asserted: bool,
    pub supported_by: Vec<Support>,
    pub supports_facts: BTreeSet<FactId>,
    pub supports_rules: BTreeSet<RuleId>,
}

impl Rule {
    /// Regra afirmada diretamente.
    ///
    /// `lhs` deve ter ao menos um antecedente; o [`reader`](crate::reader)
    /// rejeita regras vazias.
    pub fn new(lhs: Vec<Statement>, rhs: Statement) -> Self {
        Self {
            lhs,
            rhs,
            asserted: true,
            supported_by: Vec::new(),
            supports_facts: BTreeSet::new(),
            supports_rules: BTreeSet::new(),
        }
    }

    pub fn derived(lhs: Vec<Statement>, rhs: Statement, support: Support) -> Self {
        Self {
            asserted: false,
            supported_by: vec![support],
            ..Self::new(lhs, rhs)
        }
    }

    pub fn is_removable(&self) -> bool {
        self.supported_by.is_empty() && !self.asserted
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule: (")?;
        for (i, s) in self.lhs.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", s)?;
        }
        write!(f, ") -> {}", self.rhs)
    }
}

/// Variante etiquetada sobre {Fact, Rule} — a entrada das operações da KB.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind")]
pub enum Item {
    Fact(Fact),
    Rule(Rule),
}

impl Item {
    /// Atalho para um fato afirmado.
    pub fn fact(statement: Statement) -> Self {
        Item::Fact(Fact::new(statement))
    }

    /// Atalho para uma regra afirmada.
    pub fn rule(lhs: Vec<Statement>, rhs: Statement) -> Self {
        Item::Rule(Rule::new(lhs, rhs))
    }
}

impl From<Fact> for Item {
    fn from(fact: Fact) -> Self {
        Item::Fact(fact)
    }
}

impl From<Rule> for Item {
    fn from(rule: Rule) -> Self {
        Item::Rule(rule)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Fact(fact) => write!(f, "{}", fact),
            Item::Rule(rule) => write!(f, "{}", rule),
        }
    }
}
