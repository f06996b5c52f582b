//! # fc_infer — Um Passo de Encadeamento Progressivo
//!
//! Dado **um** fato e **uma** regra da KB, o [`InferenceEngine`] tenta casar o
//! fato com o primeiro antecedente da regra:
//!
//! ### Regra com um antecedente → novo fato
//!
//! ```text
//! Fato:  (inst cube block)
//! Regra: ((inst ?x ?y)) -> (isa ?x ?y)
//! ─────────────────────────────────────
//! Fato:  (isa cube block)          suportado por (fato, regra)
//! ```
//!
//! ### Regra com vários antecedentes → regra mais específica
//!
//! ```text
//! Fato:  (a 1)
//! Regra: ((a ?x) (b ?y)) -> (c ?x ?y)
//! ─────────────────────────────────────
//! Regra: ((b ?y)) -> (c 1 ?y)      suportada por (fato, regra)
//! ```
//!
//! Os antecedentes são "descascados" estritamente da esquerda para a direita,
//! um fato-premissa por vez. Não há reordenação nem junção conjunta.

use crate::core::{Fact, FactId, Item, ItemId, KnowledgeBase, Rule, RuleId, Support};
use crate::events::{KbEvent, KbObserver};

use super::matcher::{instantiate, match_statements};

/// Motor de inferência — struct sem estado.
///
/// Não guarda nada entre chamadas: lê o fato e a regra da KB e entrega o
/// item derivado a [`KnowledgeBase::kb_add`], que cuida da deduplicação, das
/// arestas do grafo de suporte e do encadeamento seguinte.
#[derive(Clone, Copy, Debug, Default)]
pub struct InferenceEngine;

impl InferenceEngine {
    /// Tenta derivar conhecimento novo de `fact` e `rule`.
    ///
    /// Sem match, nada acontece. Com match, o item derivado recebe o suporte
    /// `(fact, rule)` e é adicionado à KB — se já existir um igual, só o
    /// par de suporte é mesclado.
    ///
    /// Retorna o id do item derivado (novo ou existente), ou `None` se não
    /// houve match ou se algum dos ids não está mais na KB.
    pub fn fc_infer<O: KbObserver>(
        &self,
        fact: FactId,
        rule: RuleId,
        kb: &mut KnowledgeBase<O>,
    ) -> Option<ItemId> {
        let (premise, conditional) = (kb.fact(fact)?, kb.rule(rule)?);
        kb.emit(KbEvent::AttemptingInference {
            fact: premise.statement.to_string(),
            rule: conditional.to_string(),
        });

        let (first, rest) = conditional.lhs.split_first()?;
        let bindings = match_statements(&premise.statement, first)?;
        let support = Support::new(fact, rule);
        let rhs = instantiate(&conditional.rhs, &bindings);

        let derived: Item = if rest.is_empty() {
            Fact::derived(rhs, support).into()
        } else {
            let lhs = rest.iter().map(|s| instantiate(s, &bindings)).collect();
            Rule::derived(lhs, rhs, support).into()
        };
        Some(kb.kb_add(derived))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::reader::{parse_input, parse_statement};

    fn ids(kb: &mut KnowledgeBase<EventLog>, fact: &str, rule: &str) -> (FactId, RuleId) {
        // regra antes do fato para o teste controlar a chamada de fc_infer
        let ItemId::Rule(r) = kb.kb_add(parse_input(rule).expect("regra")) else {
            panic!("esperava regra");
        };
        let ItemId::Fact(f) = kb.kb_add(parse_input(fact).expect("fato")) else {
            panic!("esperava fato");
        };
        (f, r)
    }

    #[test]
    fn no_match_has_no_side_effects() {
        let mut kb = KnowledgeBase::with_observer(EventLog::default());
        let (f, r) = ids(&mut kb, "fact: (color box red)", "rule: ((size ?x big)) -> (heavy ?x)");
        let facts = kb.fact_count();
        let rules = kb.rule_count();

        assert_eq!(InferenceEngine.fc_infer(f, r, &mut kb), None);
        assert_eq!(kb.fact_count(), facts);
        assert_eq!(kb.rule_count(), rules);
        assert!(kb.fact(f).expect("presente").supports_facts.is_empty());
    }

    #[test]
    fn repeated_inference_is_idempotent() {
        let mut kb = KnowledgeBase::with_observer(EventLog::default());
        let (f, r) = ids(&mut kb, "fact: (inst cube block)", "rule: ((inst ?x ?y)) -> (isa ?x ?y)");
        let first = InferenceEngine.fc_infer(f, r, &mut kb).expect("match");
        let second = InferenceEngine.fc_infer(f, r, &mut kb).expect("match");
        assert_eq!(first, second);

        let (_, derived) = kb
            .get_fact(&parse_statement("(isa cube block)").expect("statement"))
            .expect("derivado");
        assert_eq!(derived.supported_by, vec![Support::new(f, r)]);
    }

    #[test]
    fn multi_antecedent_rule_yields_partially_bound_rule() {
        let mut kb = KnowledgeBase::with_observer(EventLog::default());
        let (f, r) = ids(
            &mut kb,
            "fact: (isa cube block)",
            "rule: ((isa ?x ?y) (isa ?y ?z) (color ?x ?c)) -> (kind ?x ?z ?c)",
        );
        let Some(ItemId::Rule(derived)) = InferenceEngine.fc_infer(f, r, &mut kb) else {
            panic!("esperava regra derivada");
        };
        let rule = kb.rule(derived).expect("presente");
        assert_eq!(
            rule.to_string(),
            "rule: ((isa block ?z) (color cube ?c)) -> (kind cube ?z ?c)"
        );
        assert!(!rule.asserted);
        assert!(kb.fact(f).expect("presente").supports_rules.contains(&derived));
        assert!(kb.rule(r).expect("presente").supports_rules.contains(&derived));
    }

    #[test]
    fn stale_ids_are_ignored() {
        let mut kb = KnowledgeBase::with_observer(EventLog::default());
        let (f, r) = ids(&mut kb, "fact: (a 1)", "rule: ((a ?x)) -> (b ?x)");
        kb.kb_retract(&parse_input("fact: (a 1)").expect("fato"));
        assert_eq!(InferenceEngine.fc_infer(f, r, &mut kb), None);
    }
}
