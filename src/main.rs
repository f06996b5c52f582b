//! # reasoner — CLI do Motor de Encadeamento Progressivo
//!
//! Carrega um arquivo de fatos e regras, afirma tudo na KB (encadeando até o
//! ponto fixo), aplica as retrações pedidas, responde às consultas e imprime
//! a base de conhecimento final.
//!
//! ## Exemplo de Uso
//!
//! ```bash
//! # Consulta simples
//! reasoner blocks.kb --ask "(isa ?x block)"
//!
//! # Retração seguida de consulta, com logs detalhados
//! RUST_LOG=debug reasoner blocks.kb --retract "fact: (isa cube block)" --ask "(isa cube ?y)"
//!
//! # Justificativa de um fato derivado e auditoria do grafo de suporte
//! reasoner blocks.kb --why "(isa cube polyhedron)" --audit
//!
//! # Eventos e respostas como linhas JSON
//! reasoner blocks.kb --ask "(isa ?x ?y)" --output json
//! ```
//!
//! Logs vão para o stderr; respostas e a listagem da KB vão para o stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use semantic_reasoner::core::{Item, ItemId, KnowledgeBase, ListOfBindings, RetractOutcome};
use semantic_reasoner::events::{JsonLinesObserver, KbObserver, TracingObserver};
use semantic_reasoner::reader::{self, parse_input, parse_statement};

/// Formato da saída no stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Motor de encadeamento progressivo com manutenção de verdade.
#[derive(Parser)]
#[command(name = "reasoner", version, about = "Forward-chaining reasoner with truth maintenance")]
struct Cli {
    /// Arquivo com linhas `fact:` / `rule:`
    file: PathBuf,

    /// Consulta (statement como `(isa ?x block)` ou item `fact: ...`); repetível
    #[arg(long, value_name = "QUERY")]
    ask: Vec<String>,

    /// Item a retrair (`fact: ...` ou `rule: ...`); aplicado antes das consultas
    #[arg(long, value_name = "ITEM")]
    retract: Vec<String>,

    /// Mostra a árvore de justificativas de um fato
    #[arg(long, value_name = "STATEMENT")]
    why: Vec<String>,

    /// Audita a consistência do grafo de suporte ao final
    #[arg(long)]
    audit: bool,

    /// Formato de saída (text ou json)
    #[arg(long, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Aumenta a verbosidade dos logs (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Resposta de uma consulta no modo JSON.
#[derive(Serialize)]
struct Answer<'a> {
    query: &'a str,
    answers: &'a ListOfBindings,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG tem precedência; sem ele, o nível vem de -v.
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.output {
        OutputFormat::Text => run(&cli, KnowledgeBase::with_observer(TracingObserver)),
        OutputFormat::Json => run(
            &cli,
            KnowledgeBase::with_observer(JsonLinesObserver::new(std::io::stdout())),
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run<O: KbObserver>(cli: &Cli, mut kb: KnowledgeBase<O>) -> Result<()> {
    let items = reader::read_tokenize(&cli.file)
        .with_context(|| format!("Falha ao carregar {}", cli.file.display()))?;
    for item in items {
        kb.kb_assert(item);
    }
    tracing::info!(
        facts = kb.fact_count(),
        rules = kb.rule_count(),
        "KB carregada"
    );

    for text in &cli.retract {
        let item = parse_input(text).with_context(|| format!("Retração inválida: {}", text))?;
        let outcome = kb.kb_retract(&item);
        if cli.output == OutputFormat::Text {
            match outcome {
                RetractOutcome::Removed(ids) => println!("Retracted {} ({} removed)", text, ids.len()),
                RetractOutcome::Retained(_) => println!("Retracted {} (still supported)", text),
                RetractOutcome::NoMatch => println!("No matches for {}", text),
            }
        }
    }

    for text in &cli.ask {
        let query = parse_query(text)?;
        let answers = kb.kb_ask(&query);
        match cli.output {
            OutputFormat::Text => {
                println!("Asking {}", query);
                if answers.is_empty() {
                    println!("  (no answers)");
                }
                for bindings in answers.bindings() {
                    if bindings.is_empty() {
                        println!("  yes");
                    } else {
                        println!("  {}", bindings);
                    }
                }
            }
            OutputFormat::Json => {
                let line = serde_json::to_string(&Answer {
                    query: text,
                    answers: &answers,
                })?;
                println!("{}", line);
            }
        }
    }

    for text in &cli.why {
        let statement = parse_statement(text).with_context(|| format!("Statement inválido: {}", text))?;
        match kb.get_fact(&statement) {
            Some((id, _)) => {
                if let Some(tree) = kb.explain(ItemId::Fact(id)) {
                    print!("{}", tree);
                }
            }
            None => println!("{} is not in the knowledge base", statement),
        }
    }

    if cli.output == OutputFormat::Text {
        print!("{}", kb);
    }

    if cli.audit {
        let violations = kb.support_graph_violations();
        if !violations.is_empty() {
            for v in &violations {
                tracing::error!(violation = ?v, "Grafo de suporte inconsistente");
            }
            bail!("{} violações no grafo de suporte", violations.len());
        }
        tracing::info!("Grafo de suporte consistente");
    }

    Ok(())
}

/// Aceita `fact: (...)`, `rule: ...` (consulta inválida, reportada pela KB)
/// ou um statement solto.
fn parse_query(text: &str) -> Result<Item> {
    let trimmed = text.trim();
    let item = if trimmed.starts_with("fact:") || trimmed.starts_with("rule:") {
        parse_input(trimmed)?
    } else {
        Item::fact(parse_statement(trimmed)?)
    };
    Ok(item)
}
