//! # Módulo Inference — Motor de Encadeamento Progressivo
//!
//! Este módulo contém o **motor de inferência** do raciocinador, responsável
//! por derivar fatos e regras novos a partir de um fato e de uma regra já
//! presentes na [KnowledgeBase](crate::core::KnowledgeBase).
//!
//! ## Componentes
//!
//! | Componente | Papel |
//! |------------|-------|
//! | [`matcher`] | unificação de statements e instanciação de templates |
//! | [`InferenceEngine`] | `fc_infer`: casa o primeiro antecedente e deriva |
//!
//! ## Exemplo
//!
//! ```text
//! fato:  (isa cube block)
//! regra: ((isa ?x ?y) (isa ?y ?z)) -> (isa ?x ?z)
//! ─────────────────────────────────────────────
//! nova regra: ((isa block ?z)) -> (isa cube ?z)
//! ```

/// Sub-módulo de unificação — `match_statements` e `instantiate`.
pub mod matcher;

/// Sub-módulo com o motor `fc_infer`.
pub mod engine;

/// Re-export do motor para acesso via `crate::inference::InferenceEngine`.
pub use engine::InferenceEngine;
