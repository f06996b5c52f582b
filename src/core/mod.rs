//! # Módulo Core — Tipos Fundamentais do Raciocinador
//!
//! Este módulo agrupa os **tipos fundamentais** sobre os quais o motor de
//! encadeamento progressivo trabalha:
//!
//! - [`Term`] / [`Statement`] — predicado aplicado a constantes e variáveis
//! - [`Bindings`] / [`ListOfBindings`] — vinculações produzidas pelo matching
//! - [`Fact`] / [`Rule`] / [`Item`] — itens da KB com seu estado de suporte
//! - [`KnowledgeBase`] — arena que possui itens e grafo de suporte
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use semantic_reasoner::core::{Item, KnowledgeBase, Statement, Term};
//!
//! let mut kb = KnowledgeBase::new();
//! let cube = Statement::new("isa", vec![Term::constant("cube"), Term::constant("block")]);
//! kb.kb_assert(Item::fact(cube.clone()));
//!
//! assert!(kb.get_fact(&cube).is_some());
//! ```

/// Sub-módulo com [`Term`] e [`Statement`].
pub mod statement;

/// Sub-módulo com [`Bindings`] e [`ListOfBindings`].
pub mod bindings;

/// Sub-módulo com [`Fact`], [`Rule`], [`Item`] e os identificadores.
pub mod fact;

/// Sub-módulo com a implementação de [`KnowledgeBase`].
pub mod knowledge_base;

// Re-exports para conveniência — permite usar `crate::core::Statement` diretamente.
pub use bindings::{Bindings, ListOfBindings};
pub use fact::{Fact, FactId, Item, ItemId, Rule, RuleId, Support};
pub use knowledge_base::{GraphViolation, KnowledgeBase, RetractOutcome};
pub use statement::{Statement, Term};
