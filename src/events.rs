//! # Eventos de Diagnóstico da KB
//!
//! Define o enum [`KbEvent`] — tudo o que a [`KnowledgeBase`] tem a relatar
//! enquanto afirma, infere, consulta e retrai — e o trait [`KbObserver`] que
//! recebe esses eventos.
//!
//! O observador é **injetado** na construção da KB
//! ([`KnowledgeBase::with_observer`]); não existe flag global de verbosidade.
//! Observadores servem só para diagnóstico e nunca alteram o fluxo de
//! controle do raciocínio.
//!
//! ## Ciclo de Vida dos Eventos
//!
//! ```text
//! Asserting → Adding → [AttemptingInference → Derived?]* → Adding ...
//!                   ou → Merged
//! Asking → (InvalidQuery)?
//! Retracting → Removed* | Demoted | NoMatch
//! ```
//!
//! ## Serialização
//!
//! Usa `#[serde(tag = "type")]` para produzir JSON com discriminador:
//!
//! ```json
//! { "type": "Derived", "id": "f3", "item": "fact: (isa cube block)" }
//! ```
//!
//! [`KnowledgeBase`]: crate::core::KnowledgeBase
//! [`KnowledgeBase::with_observer`]: crate::core::KnowledgeBase::with_observer

use std::io::Write;

use serde::Serialize;

/// Evento emitido pela KB durante as operações.
///
/// Os campos carregam a forma textual dos itens (`Display`), prontos para
/// log ou para a saída JSON da CLI.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum KbEvent {
    /// Item afirmado pelo usuário via `kb_assert`.
    Asserting { item: String },

    /// Item entrando em `kb_add` (afirmado ou derivado).
    Adding { item: String },

    /// Item estruturalmente igual já existia; suporte/afirmação mesclados.
    Merged {
        id: String,
        item: String,
        /// Pares de suporte novos anexados.
        new_supports: usize,
        /// Se a entrada existente foi marcada como afirmada.
        asserted: bool,
    },

    /// Tentativa de casar um fato com o primeiro antecedente de uma regra.
    AttemptingInference { fact: String, rule: String },

    /// Novo item derivado e inserido na KB.
    Derived { id: String, item: String },

    /// Consulta recebida.
    Asking { query: String },

    /// Consulta inválida — não é um fato.
    InvalidQuery { query: String },

    /// Retração solicitada.
    Retracting { item: String },

    /// Item removido da KB (alvo ou cascata).
    Removed { id: String, item: String },

    /// Item mantido por suporte derivado, mas desmarcado como afirmado.
    Demoted { id: String, item: String },

    /// Nada na KB corresponde ao item retraído.
    NoMatch { item: String },
}

/// Capacidade de diagnóstico injetada na KB.
pub trait KbObserver {
    fn on_event(&mut self, event: &KbEvent);
}

/// Observador padrão: encaminha cada evento ao `tracing`.
///
/// | Evento | Nível |
/// |--------|-------|
/// | `Asserting`, `Asking`, `Retracting`, `Removed`, `Demoted` | info |
/// | `Adding`, `Merged`, `Derived` | debug |
/// | `AttemptingInference` | trace |
/// | `InvalidQuery`, `NoMatch` | warn |
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl KbObserver for TracingObserver {
    fn on_event(&mut self, event: &KbEvent) {
        match event {
            KbEvent::Asserting { item } => tracing::info!(item = %item, "Asserting"),
            KbEvent::Adding { item } => tracing::debug!(item = %item, "Adding"),
            KbEvent::Merged {
                id,
                item,
                new_supports,
                asserted,
            } => tracing::debug!(
                id = %id,
                item = %item,
                new_supports = *new_supports,
                asserted = *asserted,
                "KB: suporte mesclado em item existente"
            ),
            KbEvent::AttemptingInference { fact, rule } => {
                tracing::trace!(fact = %fact, rule = %rule, "Attempting to infer")
            }
            KbEvent::Derived { id, item } => tracing::debug!(id = %id, item = %item, "KB: item inferido"),
            KbEvent::Asking { query } => tracing::info!(query = %query, "Asking"),
            KbEvent::InvalidQuery { query } => tracing::warn!(query = %query, "Invalid ask"),
            KbEvent::Retracting { item } => tracing::info!(item = %item, "Retracting"),
            KbEvent::Removed { id, item } => tracing::info!(id = %id, item = %item, "KB: item removido"),
            KbEvent::Demoted { id, item } => {
                tracing::info!(id = %id, item = %item, "KB: item mantido por suporte, não mais afirmado")
            }
            KbEvent::NoMatch { item } => tracing::warn!(item = %item, "No matches"),
        }
    }
}

/// Guarda os eventos em memória, na ordem de emissão.
///
/// Usado nos testes para verificar o que a KB relatou.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    pub events: Vec<KbEvent>,
}

impl KbObserver for EventLog {
    fn on_event(&mut self, event: &KbEvent) {
        self.events.push(event.clone());
    }
}

/// Escreve cada evento como uma linha JSON (modo `--output json` da CLI).
///
/// Falhas de escrita são registradas no `tracing` e ignoradas: um
/// observador não pode interromper o raciocínio.
pub struct JsonLinesObserver<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> KbObserver for JsonLinesObserver<W> {
    fn on_event(&mut self, event: &KbEvent) {
        let result = serde_json::to_writer(&mut self.out, event)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(self.out));
        if let Err(e) = result {
            tracing::error!(error = %e, "Falha ao escrever evento JSON");
        }
    }
}
