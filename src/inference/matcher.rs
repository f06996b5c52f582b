//! # Matcher — Unificação de Statements
//!
//! Duas operações puras, usadas tanto pelo motor de inferência quanto pelas
//! consultas da KB:
//!
//! - [`match_statements`] — unifica dois statements e devolve as vinculações
//! - [`instantiate`] — substitui variáveis de um template pelas vinculações
//!
//! ## Regras de Unificação
//!
//! ```text
//! predicados diferentes          → falha
//! aridades diferentes            → falha
//! constante vs constante         → iguais ou falha
//! variável vs termo              → vincula (ou confere vínculo anterior)
//! ```
//!
//! Termos são planos (sem estruturas aninhadas), então não há occurs-check.
//! Falhar é o resultado **normal** da maioria das tentativas e não um erro.

use crate::core::{Bindings, Statement, Term};

/// Unifica `pattern` com `candidate`.
///
/// Percorre as posições da esquerda para a direita. Se o termo do `pattern`
/// for variável, ela é vinculada ao termo do `candidate`; senão, se o termo
/// do `candidate` for variável, ela é vinculada ao do `pattern`. Uma
/// variável já vinculada precisa reencontrar o mesmo termo.
///
/// # Exemplo
///
/// ```rust
/// use semantic_reasoner::core::{Statement, Term};
/// use semantic_reasoner::inference::matcher::match_statements;
///
/// let pattern = Statement::new("on", vec![Term::var("x"), Term::var("x")]);
/// let ok = Statement::new("on", vec![Term::constant("a"), Term::constant("a")]);
/// let bad = Statement::new("on", vec![Term::constant("a"), Term::constant("b")]);
///
/// assert!(match_statements(&pattern, &ok).is_some());
/// assert!(match_statements(&pattern, &bad).is_none());
/// ```
pub fn match_statements(pattern: &Statement, candidate: &Statement) -> Option<Bindings> {
    if pattern.predicate != candidate.predicate || pattern.arity() != candidate.arity() {
        return None;
    }

    let mut bindings = Bindings::new();
    for (p, c) in pattern.terms.iter().zip(&candidate.terms) {
        let consistent = match (p, c) {
            (Term::Variable(name), value) => bindings.test_and_bind(name, value),
            (value, Term::Variable(name)) => bindings.test_and_bind(name, value),
            (Term::Constant(a), Term::Constant(b)) => a == b,
        };
        if !consistent {
            return None;
        }
    }
    Some(bindings)
}

/// Substitui cada variável vinculada de `template`.
///
/// Variáveis sem vínculo ficam **em aberto** — os antecedentes seguintes de
/// uma regra com vários antecedentes só ficam parcialmente vinculados
/// depois do matching do primeiro.
pub fn instantiate(template: &Statement, bindings: &Bindings) -> Statement {
    let terms = template
        .terms
        .iter()
        .map(|term| match term {
            Term::Variable(name) => bindings.bound_to(name).cloned().unwrap_or_else(|| term.clone()),
            Term::Constant(_) => term.clone(),
        })
        .collect();
    Statement::new(template.predicate.clone(), terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st(pred: &str, terms: &[&str]) -> Statement {
        Statement::new(
            pred,
            terms
                .iter()
                .map(|t| match t.strip_prefix('?') {
                    Some(name) => Term::var(name),
                    None => Term::constant(*t),
                })
                .collect(),
        )
    }

    #[test]
    fn binds_variables_positionally() {
        let b = match_statements(&st("isa", &["?x", "block"]), &st("isa", &["cube", "block"]))
            .expect("deveria casar");
        assert_eq!(b.bound_to("x"), Some(&Term::constant("cube")));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn fails_on_predicate_or_arity_mismatch() {
        assert!(match_statements(&st("isa", &["?x"]), &st("inst", &["cube"])).is_none());
        assert!(match_statements(&st("isa", &["?x"]), &st("isa", &["cube", "block"])).is_none());
    }

    #[test]
    fn fails_on_constant_mismatch() {
        assert!(match_statements(&st("color", &["box", "red"]), &st("color", &["box", "blue"])).is_none());
    }

    /// Uma variável repetida precisa casar com o mesmo termo nas duas posições
    #[test]
    fn repeated_variable_constrains_later_positions() {
        let pattern = st("same", &["?x", "?x"]);
        assert!(match_statements(&pattern, &st("same", &["1", "1"])).is_some());
        assert!(match_statements(&pattern, &st("same", &["1", "2"])).is_none());
    }

    #[test]
    fn variables_on_candidate_side_also_bind() {
        // fato é o pattern, antecedente da regra é o candidate — como no motor
        let b = match_statements(&st("a", &["1"]), &st("a", &["?x"])).expect("deveria casar");
        assert_eq!(b.bound_to("x"), Some(&Term::constant("1")));
    }

    #[test]
    fn ground_match_yields_empty_bindings() {
        let b = match_statements(&st("a", &["1"]), &st("a", &["1"])).expect("deveria casar");
        assert!(b.is_empty());
    }

    #[test]
    fn instantiate_leaves_unbound_variables_open() {
        let b = match_statements(&st("a", &["?x"]), &st("a", &["1"])).expect("deveria casar");
        let out = instantiate(&st("c", &["?x", "?y"]), &b);
        assert_eq!(out, st("c", &["1", "?y"]));
    }
}
