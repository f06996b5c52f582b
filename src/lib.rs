//! # Semantic Reasoner — Encadeamento Progressivo com Manutenção de Verdade
//!
//! Motor de raciocínio baseado em regras sobre uma base de conhecimento
//! mutável. A partir de fatos ground e regras condicionais, deriva tudo o que
//! é derivável, registra **por que** cada item derivado existe, e permite
//! retrair fatos propagando a remoção para quem dependia só deles.
//!
//! ## Arquitetura
//!
//! ```text
//! reader (texto → Item)          events (KbEvent → observador injetado)
//!        │                                   ▲
//!        ▼                                   │
//! KnowledgeBase ── kb_assert / kb_add ──► agenda ──► InferenceEngine::fc_infer
//!        │                                               │
//!        │◄──────────── kb_add(item derivado) ◄──────────┘
//!        │
//!        ├── kb_ask     → ListOfBindings
//!        └── kb_retract → cascata pelo grafo de suporte
//! ```
//!
//! ## Módulos
//!
//! - [`core`] — statements, bindings, fatos, regras e a [`KnowledgeBase`](core::KnowledgeBase)
//! - [`inference`] — matcher e motor `fc_infer`
//! - [`events`] — eventos de diagnóstico e observadores
//! - [`reader`] — sintaxe textual `fact:` / `rule:`

/// Módulo `core` — tipos fundamentais e a base de conhecimento.
pub mod core;

/// Módulo `events` — diagnósticos injetados na KB.
pub mod events;

/// Módulo `inference` — unificação e encadeamento progressivo.
pub mod inference;

/// Módulo `reader` — leitura de arquivos de fatos e regras.
pub mod reader;
