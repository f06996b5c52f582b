//! # KnowledgeBase — Arena de Fatos e Regras com Manutenção de Verdade
//!
//! A [`KnowledgeBase`] é o **único dono** de todos os fatos, regras e arestas
//! do grafo de suporte. Toda mutação passa por ela — o
//! [`InferenceEngine`](crate::inference::InferenceEngine) só lê a KB e chama
//! [`kb_add`](KnowledgeBase::kb_add).
//!
//! ## Armazenamento
//!
//! - **Fatos**: `BTreeMap<FactId, Fact>` — ids monotônicos, então a iteração
//!   segue a ordem de inserção
//! - **Regras**: `BTreeMap<RuleId, Rule>`
//! - **Índices estruturais**: `Statement → FactId` e `(lhs, rhs) → RuleId` —
//!   garantem que dois itens estruturalmente iguais nunca coexistam
//!
//! ## Operações
//!
//! | Operação | Efeito |
//! |----------|--------|
//! | [`kb_assert`](KnowledgeBase::kb_assert) | entrada do usuário; delega a `kb_add` |
//! | [`kb_add`](KnowledgeBase::kb_add) | insere ou mescla, e encadeia inferências até o ponto fixo |
//! | [`kb_ask`](KnowledgeBase::kb_ask) | consulta pura, uma vinculação por fato que casa |
//! | [`kb_retract`](KnowledgeBase::kb_retract) | retração em cascata pelo grafo de suporte |
//!
//! ## Encadeamento Progressivo
//!
//! Cada item novo enfileira pares `(fato, regra)` na **agenda**: um fato novo
//! contra todas as regras presentes, uma regra nova contra todos os fatos
//! presentes. Itens derivados durante o processamento enfileiram seus próprios
//! pares, então cada par é tentado exatamente uma vez — quando o mais novo dos
//! dois chega. A agenda é drenada antes de `kb_add` retornar.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use semantic_reasoner::core::KnowledgeBase;
//! use semantic_reasoner::reader::parse_input;
//!
//! let mut kb = KnowledgeBase::new();
//! kb.kb_assert(parse_input("fact: (a 1)").unwrap());
//! kb.kb_assert(parse_input("fact: (b 2)").unwrap());
//! kb.kb_assert(parse_input("rule: ((a ?x) (b ?y)) -> (c ?x ?y)").unwrap());
//!
//! let answers = kb.kb_ask(&parse_input("fact: (c ?x ?y)").unwrap());
//! assert_eq!(answers.len(), 1);
//! ```

use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;

use serde::Serialize;

use super::bindings::ListOfBindings;
use super::fact::{Fact, FactId, Item, ItemId, Rule, RuleId, Support};
use super::statement::Statement;
use crate::events::{KbEvent, KbObserver, TracingObserver};
use crate::inference::matcher::match_statements;
use crate::inference::InferenceEngine;

/// Chave estrutural de uma regra no índice.
type RuleKey = (Vec<Statement>, Statement);

/// Resultado de [`kb_retract`](KnowledgeBase::kb_retract).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum RetractOutcome {
    /// O alvo e, em cascata, tudo que dependia só dele — na ordem de remoção.
    Removed(Vec<ItemId>),
    /// O alvo continua na KB por suporte derivado (não mais afirmado).
    Retained(ItemId),
    /// Nenhum item retraível corresponde.
    NoMatch,
}

/// Violação de consistência do grafo de suporte.
///
/// Produzidas por [`support_graph_violations`](KnowledgeBase::support_graph_violations);
/// numa KB correta a lista é sempre vazia.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphViolation {
    /// `item` tem um par de suporte citando uma premissa que não está na KB.
    MissingPremise { item: ItemId, premise: ItemId },
    /// A premissa existe mas não lista `item` entre os que ela suporta.
    MissingBackEdge { item: ItemId, premise: ItemId },
    /// Aresta para frente `from → to` sem par de suporte correspondente em `to`.
    DanglingForwardEdge { from: ItemId, to: ItemId },
}

/// Base de conhecimento — arena de [Fact]s e [Rule]s e do grafo de suporte.
///
/// O parâmetro `O` é a capacidade de diagnóstico injetada (veja
/// [`KbObserver`]). O padrão, [`TracingObserver`], envia tudo ao `tracing`.
pub struct KnowledgeBase<O: KbObserver = TracingObserver> {
    facts: BTreeMap<FactId, Fact>,
    rules: BTreeMap<RuleId, Rule>,
    fact_index: HashMap<Statement, FactId>,
    rule_index: HashMap<RuleKey, RuleId>,
    next_id: u64,
    /// Pares `(fato, regra)` pendentes de `fc_infer`.
    agenda: VecDeque<(FactId, RuleId)>,
    draining: bool,
    engine: InferenceEngine,
    observer: RefCell<O>,
}

impl KnowledgeBase<TracingObserver> {
    /// Cria uma KB vazia que registra diagnósticos via `tracing`.
    pub fn new() -> Self {
        Self::with_observer(TracingObserver)
    }
}

impl Default for KnowledgeBase<TracingObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: KbObserver> KnowledgeBase<O> {
    /// Cria uma KB vazia com o observador fornecido.
    pub fn with_observer(observer: O) -> Self {
        Self {
            facts: BTreeMap::new(),
            rules: BTreeMap::new(),
            fact_index: HashMap::new(),
            rule_index: HashMap::new(),
            next_id: 0,
            agenda: VecDeque::new(),
            draining: false,
            engine: InferenceEngine,
            observer: RefCell::new(observer),
        }
    }

    /// Acesso de leitura ao observador (ex: para inspecionar um `EventLog`).
    pub fn observer(&self) -> Ref<'_, O> {
        self.observer.borrow()
    }

    pub(crate) fn emit(&self, event: KbEvent) {
        self.observer.borrow_mut().on_event(&event);
    }

    // ─── Entradas de mutação ───────────────────────────────────

    /// Afirma um fato ou regra do usuário.
    ///
    /// Registra o evento `Asserting` e delega a [`kb_add`](Self::kb_add).
    /// Retorna o id da entrada canônica (nova ou já existente).
    pub fn kb_assert(&mut self, item: impl Into<Item>) -> ItemId {
        let item = item.into();
        self.emit(KbEvent::Asserting {
            item: item.to_string(),
        });
        self.kb_add(item)
    }

    /// Adiciona um fato ou regra, mesclando com a entrada estruturalmente
    /// igual se ela existir.
    ///
    /// - **Mescla**: pares de suporte novos são anexados (sem duplicatas); um
    ///   item sem suporte marca a entrada existente como afirmada.
    /// - **Inserção**: o item entra na arena e a inferência roda contra a
    ///   coleção oposta, até o ponto fixo.
    ///
    /// Pares de suporte cujas premissas não estão na KB são descartados —
    /// o grafo nunca aponta para itens ausentes.
    pub fn kb_add(&mut self, item: impl Into<Item>) -> ItemId {
        let item = item.into();
        self.emit(KbEvent::Adding {
            item: item.to_string(),
        });
        let id = match item {
            Item::Fact(fact) => ItemId::Fact(self.add_fact(fact)),
            Item::Rule(rule) => ItemId::Rule(self.add_rule(rule)),
        };
        self.run_agenda();
        id
    }

    fn add_fact(&mut self, fact: Fact) -> FactId {
        let supports = self.live_supports(&fact.supported_by);

        if let Some(&id) = self.fact_index.get(&fact.statement) {
            let merged = self.facts.get_mut(&id).map(|existing| {
                if fact.supported_by.is_empty() {
                    existing.asserted = true;
                }
                let added = merge_supports(&mut existing.supported_by, &supports);
                (added, existing.asserted, existing.to_string())
            });
            self.link_supports(ItemId::Fact(id), &supports);
            if let Some((new_supports, asserted, item)) = merged {
                self.emit(KbEvent::Merged {
                    id: id.to_string(),
                    item,
                    new_supports,
                    asserted,
                });
            }
            return id;
        }

        let id = FactId(self.next_id());
        let derived = !supports.is_empty();
        let entry = Fact {
            supported_by: supports.clone(),
            supports_facts: BTreeSet::new(),
            supports_rules: BTreeSet::new(),
            ..fact
        };
        let text = entry.to_string();
        self.fact_index.insert(entry.statement.clone(), id);
        self.facts.insert(id, entry);
        self.link_supports(ItemId::Fact(id), &supports);

        for &rule in self.rules.keys() {
            self.agenda.push_back((id, rule));
        }
        if derived {
            self.emit(KbEvent::Derived {
                id: id.to_string(),
                item: text,
            });
        }
        id
    }

    fn add_rule(&mut self, rule: Rule) -> RuleId {
        let supports = self.live_supports(&rule.supported_by);
        let key: RuleKey = (rule.lhs.clone(), rule.rhs.clone());

        if let Some(&id) = self.rule_index.get(&key) {
            let merged = self.rules.get_mut(&id).map(|existing| {
                if rule.supported_by.is_empty() {
                    existing.asserted = true;
                }
                let added = merge_supports(&mut existing.supported_by, &supports);
                (added, existing.asserted, existing.to_string())
            });
            self.link_supports(ItemId::Rule(id), &supports);
            if let Some((new_supports, asserted, item)) = merged {
                self.emit(KbEvent::Merged {
                    id: id.to_string(),
                    item,
                    new_supports,
                    asserted,
                });
            }
            return id;
        }

        let id = RuleId(self.next_id());
        let derived = !supports.is_empty();
        let entry = Rule {
            supported_by: supports.clone(),
            supports_facts: BTreeSet::new(),
            supports_rules: BTreeSet::new(),
            ..rule
        };
        let text = entry.to_string();
        self.rule_index.insert(key, id);
        self.rules.insert(id, entry);
        self.link_supports(ItemId::Rule(id), &supports);

        for &fact in self.facts.keys() {
            self.agenda.push_back((fact, id));
        }
        if derived {
            self.emit(KbEvent::Derived {
                id: id.to_string(),
                item: text,
            });
        }
        id
    }

    /// Drena a agenda de inferência.
    ///
    /// Chamadas reentrantes (um `kb_add` disparado por `fc_infer`) só
    /// enfileiram; o laço mais externo processa tudo.
    fn run_agenda(&mut self) {
        if self.draining {
            return;
        }
        self.draining = true;
        while let Some((fact, rule)) = self.agenda.pop_front() {
            let engine = self.engine;
            engine.fc_infer(fact, rule, self);
        }
        self.draining = false;
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Filtra pares cujas premissas não estão na KB.
    fn live_supports(&self, supports: &[Support]) -> Vec<Support> {
        supports
            .iter()
            .copied()
            .filter(|s| {
                let live = self.facts.contains_key(&s.fact) && self.rules.contains_key(&s.rule);
                if !live {
                    tracing::warn!(fact = %s.fact, rule = %s.rule, "KB: par de suporte descartado, premissa ausente");
                }
                live
            })
            .collect()
    }

    /// Registra `item` nas arestas para frente das premissas de cada par.
    fn link_supports(&mut self, item: ItemId, supports: &[Support]) {
        for s in supports {
            if let Some(fact) = self.facts.get_mut(&s.fact) {
                match item {
                    ItemId::Fact(id) => fact.supports_facts.insert(id),
                    ItemId::Rule(id) => fact.supports_rules.insert(id),
                };
            }
            if let Some(rule) = self.rules.get_mut(&s.rule) {
                match item {
                    ItemId::Fact(id) => rule.supports_facts.insert(id),
                    ItemId::Rule(id) => rule.supports_rules.insert(id),
                };
            }
        }
    }

    // ─── Consulta ──────────────────────────────────────────────

    /// Consulta a KB com um padrão de fato.
    ///
    /// Cada fato que casa com o padrão contribui uma vinculação (com o fato
    /// como proveniência). Uma regra não é uma consulta válida: o resultado
    /// é vazio e o evento `InvalidQuery` é emitido. Nunca altera a KB.
    pub fn kb_ask(&self, query: &Item) -> ListOfBindings {
        self.emit(KbEvent::Asking {
            query: query.to_string(),
        });
        match query {
            Item::Fact(fact) => self.ask(&fact.statement),
            Item::Rule(_) => {
                self.emit(KbEvent::InvalidQuery {
                    query: query.to_string(),
                });
                ListOfBindings::new()
            }
        }
    }

    /// Consulta direta por statement, sem eventos.
    pub fn ask(&self, pattern: &Statement) -> ListOfBindings {
        let mut answers = ListOfBindings::new();
        for (&id, fact) in &self.facts {
            if let Some(bindings) = match_statements(pattern, &fact.statement) {
                answers.add_bindings(bindings, id);
            }
        }
        answers
    }

    // ─── Retração ──────────────────────────────────────────────

    /// Retrai um fato (ou uma regra derivada) e propaga a remoção.
    ///
    /// - Fato sem suporte → removido; cada dependente perde os pares que
    ///   citam o fato e é reexaminado
    /// - Fato com suporte → permanece, mas deixa de ser afirmado
    /// - Regra afirmada, ou nada correspondente → [`RetractOutcome::NoMatch`]
    ///
    /// Um dependente reexaminado na cascata só é removido se ficou sem
    /// suporte **e** não é afirmado; caso contrário fica intacto.
    pub fn kb_retract(&mut self, item: &Item) -> RetractOutcome {
        self.emit(KbEvent::Retracting {
            item: item.to_string(),
        });

        let target = match item {
            Item::Fact(fact) => self.fact_index.get(&fact.statement).map(|&id| ItemId::Fact(id)),
            Item::Rule(rule) => self
                .rule_index
                .get(&(rule.lhs.clone(), rule.rhs.clone()))
                .copied()
                .filter(|id| self.rules.get(id).is_some_and(|r| !r.asserted))
                .map(ItemId::Rule),
        };

        let Some(target) = target else {
            self.emit(KbEvent::NoMatch {
                item: item.to_string(),
            });
            return RetractOutcome::NoMatch;
        };

        if self.supported_by(target).is_empty() {
            RetractOutcome::Removed(self.remove_cascade(target))
        } else {
            if let ItemId::Fact(id) = target {
                if let Some(fact) = self.facts.get_mut(&id) {
                    fact.asserted = false;
                }
            }
            self.emit(KbEvent::Demoted {
                id: target.to_string(),
                item: self.describe(target),
            });
            RetractOutcome::Retained(target)
        }
    }

    /// Remove `start` e propaga pela pilha de trabalho.
    ///
    /// Cada iteração remove um item e retira do grafo os pares que o citam,
    /// então o laço termina: o número de pares é finito.
    fn remove_cascade(&mut self, start: ItemId) -> Vec<ItemId> {
        let mut removed = Vec::new();
        let mut stack = vec![start];

        while let Some(id) = stack.pop() {
            let Some((dependants, text)) = self.detach(id) else {
                continue;
            };
            self.emit(KbEvent::Removed {
                id: id.to_string(),
                item: text,
            });
            removed.push(id);

            for dependant in dependants {
                self.strip_supports(dependant, id);
                if self.is_removable(dependant) {
                    stack.push(dependant);
                }
            }
        }
        removed
    }

    /// Tira `id` da arena e dos índices; devolve suas arestas para frente.
    fn detach(&mut self, id: ItemId) -> Option<(Vec<ItemId>, String)> {
        match id {
            ItemId::Fact(fid) => {
                let fact = self.facts.remove(&fid)?;
                self.fact_index.remove(&fact.statement);
                let text = fact.to_string();
                Some((forward_edges(&fact.supports_facts, &fact.supports_rules), text))
            }
            ItemId::Rule(rid) => {
                let rule = self.rules.remove(&rid)?;
                self.rule_index.remove(&(rule.lhs.clone(), rule.rhs.clone()));
                let text = rule.to_string();
                Some((forward_edges(&rule.supports_facts, &rule.supports_rules), text))
            }
        }
    }

    /// Remove de `dependant` todo par que cita `premise`, e a aresta para
    /// frente da outra premissa de cada par, se nenhum par restante a cita.
    fn strip_supports(&mut self, dependant: ItemId, premise: ItemId) {
        let stripped: Vec<Support> = match self.supported_by_mut(dependant) {
            Some(pairs) => {
                let (gone, kept): (Vec<Support>, Vec<Support>) =
                    pairs.iter().partition(|s| s.involves(premise));
                *pairs = kept;
                gone
            }
            None => return,
        };

        for s in stripped {
            let other = match premise {
                ItemId::Fact(_) => ItemId::Rule(s.rule),
                ItemId::Rule(_) => ItemId::Fact(s.fact),
            };
            if self.supported_by(dependant).iter().any(|p| p.involves(other)) {
                continue;
            }
            self.unlink_forward(other, dependant);
        }
    }

    fn unlink_forward(&mut self, from: ItemId, to: ItemId) {
        let (supports_facts, supports_rules) = match from {
            ItemId::Fact(id) => match self.facts.get_mut(&id) {
                Some(f) => (&mut f.supports_facts, &mut f.supports_rules),
                None => return,
            },
            ItemId::Rule(id) => match self.rules.get_mut(&id) {
                Some(r) => (&mut r.supports_facts, &mut r.supports_rules),
                None => return,
            },
        };
        match to {
            ItemId::Fact(id) => supports_facts.remove(&id),
            ItemId::Rule(id) => supports_rules.remove(&id),
        };
    }

    // ─── Inspeção ──────────────────────────────────────────────

    /// Fato estruturalmente igual a `statement`, se houver.
    pub fn get_fact(&self, statement: &Statement) -> Option<(FactId, &Fact)> {
        let id = *self.fact_index.get(statement)?;
        self.facts.get(&id).map(|f| (id, f))
    }

    /// Regra estruturalmente igual a `lhs -> rhs`, se houver.
    pub fn get_rule(&self, lhs: &[Statement], rhs: &Statement) -> Option<(RuleId, &Rule)> {
        let id = *self.rule_index.get(&(lhs.to_vec(), rhs.clone()))?;
        self.rules.get(&id).map(|r| (id, r))
    }

    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(&id)
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }

    /// Fatos na ordem de inserção.
    pub fn facts(&self) -> impl Iterator<Item = (FactId, &Fact)> {
        self.facts.iter().map(|(&id, f)| (id, f))
    }

    /// Regras na ordem de inserção.
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter().map(|(&id, r)| (id, r))
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        match id {
            ItemId::Fact(id) => self.facts.contains_key(&id),
            ItemId::Rule(id) => self.rules.contains_key(&id),
        }
    }

    /// Justificativas de um item (vazio se ausente ou só afirmado).
    pub fn supported_by(&self, id: ItemId) -> &[Support] {
        let pairs = match id {
            ItemId::Fact(id) => self.facts.get(&id).map(|f| f.supported_by.as_slice()),
            ItemId::Rule(id) => self.rules.get(&id).map(|r| r.supported_by.as_slice()),
        };
        pairs.unwrap_or(&[])
    }

    fn supported_by_mut(&mut self, id: ItemId) -> Option<&mut Vec<Support>> {
        match id {
            ItemId::Fact(id) => self.facts.get_mut(&id).map(|f| &mut f.supported_by),
            ItemId::Rule(id) => self.rules.get_mut(&id).map(|r| &mut r.supported_by),
        }
    }

    fn is_removable(&self, id: ItemId) -> bool {
        match id {
            ItemId::Fact(id) => self.facts.get(&id).is_some_and(Fact::is_removable),
            ItemId::Rule(id) => self.rules.get(&id).is_some_and(Rule::is_removable),
        }
    }

    /// Forma textual de um item (`fact: ...` / `rule: ...`), ou `?` se ausente.
    pub fn describe(&self, id: ItemId) -> String {
        let text = match id {
            ItemId::Fact(id) => self.facts.get(&id).map(|f| f.to_string()),
            ItemId::Rule(id) => self.rules.get(&id).map(|r| r.to_string()),
        };
        text.unwrap_or_else(|| "?".to_string())
    }

    /// Árvore de justificativas de um item, legível.
    ///
    /// ```text
    /// fact: (isa cube polyhedron)
    ///   <- fact: (isa cube block) + rule: ((isa ?x block)) -> (isa ?x polyhedron)
    ///     fact: (isa cube block) [asserted]
    ///     rule: ((isa ?x block)) -> (isa ?x polyhedron) [asserted]
    /// ```
    ///
    /// Um item já visitado no ramo atual aparece com `(cycle)` e não é
    /// expandido de novo.
    pub fn explain(&self, id: ItemId) -> Option<String> {
        if !self.contains(id) {
            return None;
        }
        let mut out = String::new();
        let mut path = Vec::new();
        self.explain_into(id, 0, &mut path, &mut out);
        Some(out)
    }

    fn explain_into(&self, id: ItemId, depth: usize, path: &mut Vec<ItemId>, out: &mut String) {
        let indent = "  ".repeat(depth);
        let asserted = match id {
            ItemId::Fact(id) => self.facts.get(&id).is_some_and(|f| f.asserted),
            ItemId::Rule(id) => self.rules.get(&id).is_some_and(|r| r.asserted),
        };
        let mut line = format!("{}{}", indent, self.describe(id));
        if asserted {
            line.push_str(" [asserted]");
        }
        if path.contains(&id) {
            line.push_str(" (cycle)");
            out.push_str(&line);
            out.push('\n');
            return;
        }
        out.push_str(&line);
        out.push('\n');

        path.push(id);
        for s in self.supported_by(id) {
            out.push_str(&format!(
                "{}  <- {} + {}\n",
                indent,
                self.describe(ItemId::Fact(s.fact)),
                self.describe(ItemId::Rule(s.rule))
            ));
            self.explain_into(ItemId::Fact(s.fact), depth + 2, path, out);
            self.explain_into(ItemId::Rule(s.rule), depth + 2, path, out);
        }
        path.pop();
    }

    /// Audita o grafo de suporte nos dois sentidos.
    pub fn support_graph_violations(&self) -> Vec<GraphViolation> {
        let mut violations = Vec::new();
        let items = self
            .facts
            .keys()
            .map(|&id| ItemId::Fact(id))
            .chain(self.rules.keys().map(|&id| ItemId::Rule(id)));

        for item in items {
            for s in self.supported_by(item) {
                for premise in [ItemId::Fact(s.fact), ItemId::Rule(s.rule)] {
                    if !self.contains(premise) {
                        violations.push(GraphViolation::MissingPremise { item, premise });
                    } else if !self.forward_edges(premise).contains(&item) {
                        violations.push(GraphViolation::MissingBackEdge { item, premise });
                    }
                }
            }
            for to in self.forward_edges(item) {
                if !self.supported_by(to).iter().any(|s| s.involves(item)) {
                    violations.push(GraphViolation::DanglingForwardEdge { from: item, to });
                }
            }
        }
        violations
    }

    fn forward_edges(&self, id: ItemId) -> Vec<ItemId> {
        let edges = match id {
            ItemId::Fact(id) => self
                .facts
                .get(&id)
                .map(|f| forward_edges(&f.supports_facts, &f.supports_rules)),
            ItemId::Rule(id) => self
                .rules
                .get(&id)
                .map(|r| forward_edges(&r.supports_facts, &r.supports_rules)),
        };
        edges.unwrap_or_default()
    }
}

/// Anexa os pares ausentes; retorna quantos foram anexados.
fn merge_supports(existing: &mut Vec<Support>, incoming: &[Support]) -> usize {
    let mut added = 0;
    for s in incoming {
        if !existing.contains(s) {
            existing.push(*s);
            added += 1;
        }
    }
    added
}

fn forward_edges(facts: &BTreeSet<FactId>, rules: &BTreeSet<RuleId>) -> Vec<ItemId> {
    facts
        .iter()
        .map(|&id| ItemId::Fact(id))
        .chain(rules.iter().map(|&id| ItemId::Rule(id)))
        .collect()
}

/// Listagem `Knowledge Base:` com fatos e depois regras.
impl<O: KbObserver> fmt::Display for KnowledgeBase<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Knowledge Base:")?;
        for fact in self.facts.values() {
            writeln!(f, "{}", fact)?;
        }
        for rule in self.rules.values() {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Term;
    use crate::events::EventLog;
    use crate::reader::{parse_input, parse_statement};

    fn item(text: &str) -> Item {
        parse_input(text).expect("item válido")
    }

    fn st(text: &str) -> Statement {
        parse_statement(text).expect("statement válido")
    }

    fn fact_id(kb: &KnowledgeBase<impl KbObserver>, text: &str) -> FactId {
        kb.get_fact(&st(text)).expect("fato presente").0
    }

    fn has_fact(kb: &KnowledgeBase<impl KbObserver>, text: &str) -> bool {
        kb.get_fact(&st(text)).is_some()
    }

    fn assert_consistent(kb: &KnowledgeBase<impl KbObserver>) {
        let violations = kb.support_graph_violations();
        assert!(violations.is_empty(), "grafo inconsistente: {:?}", violations);
    }

    // ─── kb_add / kb_assert ────────────────────────────────────

    #[test]
    fn asserting_twice_does_not_duplicate() {
        let mut kb = KnowledgeBase::new();
        let a = kb.kb_assert(item("fact: (color box red)"));
        let b = kb.kb_assert(item("fact: (color box red)"));
        assert_eq!(a, b);
        assert_eq!(kb.fact_count(), 1);

        let r1 = kb.kb_assert(item("rule: ((color ?x red)) -> (warm ?x)"));
        let r2 = kb.kb_assert(item("rule: ((color ?x red)) -> (warm ?x)"));
        assert_eq!(r1, r2);
        assert_eq!(kb.rule_count(), 1);
        assert_eq!(kb.fact_count(), 2);
        assert_consistent(&kb);
    }

    #[test]
    fn asserting_a_derived_fact_promotes_it() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("fact: (a 1)"));
        kb.kb_assert(item("rule: ((a ?x)) -> (b ?x)"));
        let (_, derived) = kb.get_fact(&st("(b 1)")).expect("derivado");
        assert!(!derived.asserted);
        assert_eq!(derived.supported_by.len(), 1);

        kb.kb_assert(item("fact: (b 1)"));
        let (_, promoted) = kb.get_fact(&st("(b 1)")).expect("ainda presente");
        assert!(promoted.asserted);
        assert_eq!(promoted.supported_by.len(), 1);
        assert_eq!(kb.fact_count(), 2);
    }

    #[test]
    fn single_antecedent_rule_derives_fact_with_back_references() {
        let mut kb = KnowledgeBase::new();
        let f = kb.kb_assert(item("fact: (isa cube block)"));
        let r = kb.kb_assert(item("rule: ((isa ?x block)) -> (isa ?x polyhedron)"));
        let (ItemId::Fact(f), ItemId::Rule(r)) = (f, r) else {
            panic!("tipos de id inesperados");
        };

        let derived = fact_id(&kb, "(isa cube polyhedron)");
        assert_eq!(
            kb.fact(derived).expect("presente").supported_by,
            vec![Support::new(f, r)]
        );
        assert!(kb.fact(f).expect("presente").supports_facts.contains(&derived));
        assert!(kb.rule(r).expect("presente").supports_facts.contains(&derived));
        assert_consistent(&kb);
    }

    /// a(1), b(2), a(?x) ∧ b(?y) → c(?x, ?y) produz c(1, 2) via regra intermediária
    #[test]
    fn fixpoint_reaches_multi_antecedent_conclusion() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("fact: (a 1)"));
        kb.kb_assert(item("fact: (b 2)"));
        kb.kb_assert(item("rule: ((a ?x) (b ?y)) -> (c ?x ?y)"));

        let (intermediate, rule) = kb
            .get_rule(&[st("(b ?y)")], &st("(c 1 ?y)"))
            .expect("regra intermediária derivada");
        assert!(!rule.asserted);

        let (_, c) = kb.get_fact(&st("(c 1 2)")).expect("c(1,2) derivado");
        assert_eq!(c.supported_by.len(), 1);
        assert_eq!(c.supported_by[0].rule, intermediate);
        assert_eq!(c.supported_by[0].fact, fact_id(&kb, "(b 2)"));
        assert_consistent(&kb);
    }

    /// A ordem de chegada não muda o ponto fixo
    #[test]
    fn fixpoint_is_independent_of_assertion_order() {
        let mut first = KnowledgeBase::new();
        first.kb_assert(item("rule: ((a ?x) (b ?y)) -> (c ?x ?y)"));
        first.kb_assert(item("fact: (b 2)"));
        first.kb_assert(item("fact: (a 1)"));

        let mut second = KnowledgeBase::new();
        second.kb_assert(item("fact: (a 1)"));
        second.kb_assert(item("rule: ((a ?x) (b ?y)) -> (c ?x ?y)"));
        second.kb_assert(item("fact: (b 2)"));

        assert!(has_fact(&first, "(c 1 2)"));
        assert!(has_fact(&second, "(c 1 2)"));
        assert_eq!(first.fact_count(), second.fact_count());
        assert_eq!(first.rule_count(), second.rule_count());
    }

    #[test]
    fn chained_rules_propagate_transitively() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("rule: ((isa ?x ?y) (isa ?y ?z)) -> (isa ?x ?z)"));
        kb.kb_assert(item("fact: (isa cube block)"));
        kb.kb_assert(item("fact: (isa block solid)"));
        kb.kb_assert(item("fact: (isa solid thing)"));

        assert!(has_fact(&kb, "(isa cube solid)"));
        assert!(has_fact(&kb, "(isa block thing)"));
        assert!(has_fact(&kb, "(isa cube thing)"));
        assert_consistent(&kb);
    }

    #[test]
    fn second_derivation_merges_support_without_duplicates() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("rule: ((a ?x)) -> (goal)"));
        kb.kb_assert(item("rule: ((b ?x)) -> (goal)"));
        kb.kb_assert(item("fact: (a 1)"));
        kb.kb_assert(item("fact: (b 1)"));
        // mesmo par de novo não deve duplicar
        kb.kb_assert(item("fact: (a 1)"));

        let (_, goal) = kb.get_fact(&st("(goal)")).expect("derivado");
        assert_eq!(goal.supported_by.len(), 2);
        assert_consistent(&kb);
    }

    #[test]
    fn dangling_support_pairs_are_dropped() {
        let mut kb = KnowledgeBase::new();
        let fake = Support::new(FactId(90), RuleId(91));
        let id = kb.kb_add(Fact::derived(st("(ghost)"), fake));
        let ItemId::Fact(id) = id else {
            panic!("esperava fato");
        };
        assert!(kb.fact(id).expect("presente").supported_by.is_empty());
        assert_consistent(&kb);
    }

    // ─── kb_ask ────────────────────────────────────────────────

    #[test]
    fn ask_returns_one_binding_set_per_matching_fact() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("fact: (a 1)"));
        kb.kb_assert(item("fact: (a 2)"));
        kb.kb_assert(item("fact: (b 3)"));

        let answers = kb.kb_ask(&item("fact: (a ?x)"));
        let values: Vec<Option<&Term>> = answers.bindings().map(|b| b.bound_to("x")).collect();
        assert_eq!(
            values,
            vec![Some(&Term::constant("1")), Some(&Term::constant("2"))]
        );
        assert!(answers.bindings().all(|b| b.len() == 1));
        assert_eq!(answers.to_string(), "?x : 1\n?x : 2");
    }

    #[test]
    fn ask_with_rule_is_invalid_and_empty() {
        let mut kb = KnowledgeBase::with_observer(EventLog::default());
        kb.kb_assert(item("fact: (a 1)"));
        let answers = kb.kb_ask(&item("rule: ((a ?x)) -> (b ?x)"));
        assert!(answers.is_empty());
        assert!(kb
            .observer()
            .events
            .iter()
            .any(|e| matches!(e, KbEvent::InvalidQuery { .. })));
    }

    #[test]
    fn ask_without_matches_is_empty() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("fact: (a 1)"));
        assert!(kb.kb_ask(&item("fact: (z ?x)")).is_empty());
    }

    // ─── kb_retract ────────────────────────────────────────────

    #[test]
    fn retracting_isolated_fact_removes_only_it() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("fact: (a 1)"));
        let target = kb.kb_assert(item("fact: (a 2)"));
        kb.kb_assert(item("rule: ((b ?x)) -> (c ?x)"));

        let outcome = kb.kb_retract(&item("fact: (a 2)"));
        assert_eq!(outcome, RetractOutcome::Removed(vec![target]));
        assert!(has_fact(&kb, "(a 1)"));
        assert!(!has_fact(&kb, "(a 2)"));
        assert_eq!(kb.rule_count(), 1);
        assert_consistent(&kb);
    }

    #[test]
    fn retracting_sole_justification_cascades() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("fact: (a 1)"));
        kb.kb_assert(item("rule: ((a ?x)) -> (b ?x)"));
        kb.kb_assert(item("rule: ((b ?x)) -> (c ?x)"));
        assert!(has_fact(&kb, "(c 1)"));

        let outcome = kb.kb_retract(&item("fact: (a 1)"));
        let RetractOutcome::Removed(removed) = outcome else {
            panic!("esperava remoção");
        };
        assert_eq!(removed.len(), 3);
        assert!(!has_fact(&kb, "(a 1)"));
        assert!(!has_fact(&kb, "(b 1)"));
        assert!(!has_fact(&kb, "(c 1)"));
        assert_eq!(kb.rule_count(), 2);
        assert_consistent(&kb);
    }

    #[test]
    fn second_justification_keeps_derived_fact_alive() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("rule: ((a ?x)) -> (goal)"));
        kb.kb_assert(item("rule: ((b ?x)) -> (goal)"));
        kb.kb_assert(item("fact: (a 1)"));
        kb.kb_assert(item("fact: (b 1)"));

        kb.kb_retract(&item("fact: (a 1)"));
        let (_, goal) = kb.get_fact(&st("(goal)")).expect("mantido pelo segundo suporte");
        assert_eq!(goal.supported_by.len(), 1);
        assert_eq!(goal.supported_by[0].fact, fact_id(&kb, "(b 1)"));
        assert_consistent(&kb);

        kb.kb_retract(&item("fact: (b 1)"));
        assert!(!has_fact(&kb, "(goal)"));
        assert_consistent(&kb);
    }

    #[test]
    fn retracting_supported_fact_only_demotes_it() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("fact: (a 1)"));
        kb.kb_assert(item("rule: ((a ?x)) -> (b ?x)"));
        let b = kb.kb_assert(item("fact: (b 1)"));

        let outcome = kb.kb_retract(&item("fact: (b 1)"));
        assert_eq!(outcome, RetractOutcome::Retained(b));
        let (_, fact) = kb.get_fact(&st("(b 1)")).expect("mantido");
        assert!(!fact.asserted);
        assert_eq!(fact.supported_by.len(), 1);
    }

    /// Retrair e reafirmar um fato derivado-e-promovido restaura `asserted`
    #[test]
    fn reassertion_after_retraction_restores_asserted_flag() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("fact: (a 1)"));
        kb.kb_assert(item("rule: ((a ?x)) -> (b ?x)"));
        kb.kb_assert(item("fact: (b 1)"));
        kb.kb_retract(&item("fact: (b 1)"));
        let again = kb.kb_assert(item("fact: (b 1)"));

        let (id, fact) = kb.get_fact(&st("(b 1)")).expect("presente");
        assert_eq!(again, ItemId::Fact(id));
        assert!(fact.asserted);
        assert_eq!(kb.fact_count(), 2);
    }

    /// Dependente afirmado não cai na cascata, mesmo ficando sem suporte
    #[test]
    fn cascade_keeps_asserted_dependants() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("fact: (a 1)"));
        kb.kb_assert(item("rule: ((a ?x)) -> (b ?x)"));
        kb.kb_assert(item("fact: (b 1)"));

        kb.kb_retract(&item("fact: (a 1)"));
        let (_, b) = kb.get_fact(&st("(b 1)")).expect("afirmado, mantido");
        assert!(b.asserted);
        assert!(b.supported_by.is_empty());
        assert_consistent(&kb);
    }

    #[test]
    fn cascade_removes_derived_rules() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("fact: (a 1)"));
        kb.kb_assert(item("fact: (b 2)"));
        kb.kb_assert(item("rule: ((a ?x) (b ?y)) -> (c ?x ?y)"));
        assert_eq!(kb.rule_count(), 2);

        kb.kb_retract(&item("fact: (a 1)"));
        assert_eq!(kb.rule_count(), 1);
        assert!(!has_fact(&kb, "(c 1 2)"));
        assert!(has_fact(&kb, "(b 2)"));
        assert_consistent(&kb);
    }

    #[test]
    fn asserted_rules_are_not_retractable() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("fact: (a 1)"));
        kb.kb_assert(item("rule: ((a ?x)) -> (b ?x)"));
        let outcome = kb.kb_retract(&item("rule: ((a ?x)) -> (b ?x)"));
        assert_eq!(outcome, RetractOutcome::NoMatch);
        assert_eq!(kb.rule_count(), 1);
        assert!(has_fact(&kb, "(b 1)"));
    }

    #[test]
    fn supported_derived_rule_is_retained() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("fact: (a 1)"));
        kb.kb_assert(item("rule: ((a ?x) (b ?y)) -> (c ?x ?y)"));
        // regra derivada ainda tem suporte: fica
        let derived = item("rule: ((b ?y)) -> (c 1 ?y)");
        assert!(matches!(kb.kb_retract(&derived), RetractOutcome::Retained(_)));
        assert_eq!(kb.rule_count(), 2);
    }

    #[test]
    fn retracting_unknown_item_is_no_match() {
        let mut kb = KnowledgeBase::with_observer(EventLog::default());
        kb.kb_assert(item("fact: (a 1)"));
        assert_eq!(kb.kb_retract(&item("fact: (zzz)")), RetractOutcome::NoMatch);
        assert_eq!(kb.fact_count(), 1);
        assert!(matches!(
            kb.observer().events.last(),
            Some(KbEvent::NoMatch { .. })
        ));
    }

    #[test]
    fn self_supporting_fact_survives_retraction() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("fact: (a 1)"));
        kb.kb_assert(item("rule: ((a ?x)) -> (a ?x)"));
        let outcome = kb.kb_retract(&item("fact: (a 1)"));
        assert!(matches!(outcome, RetractOutcome::Retained(_)));
        assert_consistent(&kb);
    }

    #[test]
    fn blocks_world_derives_and_retracts_consistently() {
        let mut kb = KnowledgeBase::new();
        let items = crate::reader::read_str(include_str!("../../demos/blocks.kb")).expect("arquivo válido");
        for i in items {
            kb.kb_assert(i);
        }
        for s in ["(isa cube solid)", "(isa pyramid solid)", "(warm cube)", "(warm pyramid)"] {
            assert!(has_fact(&kb, s), "faltando {}", s);
        }
        assert_consistent(&kb);

        kb.kb_retract(&item("fact: (inst cube block)"));
        for s in ["(isa cube block)", "(isa cube polyhedron)", "(isa cube solid)", "(warm cube)"] {
            assert!(!has_fact(&kb, s), "deveria ter caído: {}", s);
        }
        assert!(has_fact(&kb, "(warm pyramid)"));
        assert!(has_fact(&kb, "(color cube red)"));
        assert_consistent(&kb);
    }

    // ─── inspeção ──────────────────────────────────────────────

    #[test]
    fn explain_walks_justifications() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("fact: (isa cube block)"));
        kb.kb_assert(item("rule: ((isa ?x block)) -> (isa ?x polyhedron)"));
        let id = ItemId::Fact(fact_id(&kb, "(isa cube polyhedron)"));
        let text = kb.explain(id).expect("presente");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "fact: (isa cube polyhedron)");
        assert!(lines[1].starts_with("  <- fact: (isa cube block) + rule:"));
        assert!(text.contains("fact: (isa cube block) [asserted]"));
    }

    #[test]
    fn display_lists_facts_then_rules() {
        let mut kb = KnowledgeBase::new();
        kb.kb_assert(item("rule: ((a ?x)) -> (b ?x)"));
        kb.kb_assert(item("fact: (a 1)"));
        assert_eq!(
            kb.to_string(),
            "Knowledge Base:\nfact: (a 1)\nfact: (b 1)\nrule: ((a ?x)) -> (b ?x)\n"
        );
    }

    #[test]
    fn events_follow_assert_add_derive_order() {
        let mut kb = KnowledgeBase::with_observer(EventLog::default());
        kb.kb_assert(item("fact: (a 1)"));
        kb.kb_assert(item("rule: ((a ?x)) -> (b ?x)"));
        let log = kb.observer();
        let kinds: Vec<&str> = log
            .events
            .iter()
            .map(|e| match e {
                KbEvent::Asserting { .. } => "asserting",
                KbEvent::Adding { .. } => "adding",
                KbEvent::AttemptingInference { .. } => "attempt",
                KbEvent::Derived { .. } => "derived",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                "asserting", "adding", "asserting", "adding", "attempt", "adding", "derived",
                "attempt"
            ]
        );
    }
}
