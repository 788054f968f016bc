use anyhow::{Context, Result};
use colored::Colorize;
use octofhir_search_params::{CompiledQuery, ParameterOutcome, QueryCompiler, to_document};
use serde_json::{Value, json};

use crate::cli::{ExplainArgs, OutputFormat};
use crate::output::{print_failure, print_json, print_skipped, print_success, print_table};

pub fn explain(compiler: &QueryCompiler, args: &ExplainArgs, format: OutputFormat) -> Result<()> {
    let compiled = compiler.compile_query(&args.resource_type, &args.query);

    let filter = if args.strict {
        compiled
            .clone()
            .into_strict()
            .with_context(|| format!("Query for {} rejected", args.resource_type))?
    } else {
        compiled.predicate()
    };
    let document = filter.as_ref().map(to_document).unwrap_or(Value::Null);

    match format {
        OutputFormat::Json => print_json(&json!({
            "resourceType": args.resource_type,
            "parameters": parameters_json(&compiled),
            "filter": document,
        })),
        OutputFormat::Table => {
            let rows = compiled
                .parameters
                .iter()
                .map(|p| {
                    let (outcome, detail) = outcome_text(&p.outcome);
                    [p.name.clone(), p.raw_value.clone(), outcome.to_string(), detail]
                })
                .collect();
            print_table(["Parameter", "Value", "Outcome", "Detail"], rows);
            print_filter(&document);
        }
        OutputFormat::Text => {
            for p in &compiled.parameters {
                let (_, detail) = outcome_text(&p.outcome);
                let line = format!("{}={}: {}", p.name, p.raw_value, detail);
                match p.outcome {
                    ParameterOutcome::Compiled(_) => print_success(&line),
                    ParameterOutcome::Skipped(_) => print_skipped(&line),
                    ParameterOutcome::Failed(_) => print_failure(&line),
                }
            }
            print_filter(&document);
        }
    }
    Ok(())
}

fn print_filter(document: &Value) {
    println!("{}", "Filter:".cyan());
    print_json(document);
}

fn outcome_text(outcome: &ParameterOutcome) -> (&'static str, String) {
    match outcome {
        ParameterOutcome::Compiled(tree) => ("compiled", tree.to_string()),
        ParameterOutcome::Skipped(reason) => ("skipped", reason.to_string()),
        ParameterOutcome::Failed(err) => ("failed", err.to_string()),
    }
}

fn parameters_json(compiled: &CompiledQuery) -> Vec<Value> {
    compiled
        .parameters
        .iter()
        .map(|p| {
            let (outcome, detail) = outcome_text(&p.outcome);
            let mut entry = json!({
                "name": p.name,
                "value": p.raw_value,
                "outcome": outcome,
            });
            match &p.outcome {
                ParameterOutcome::Compiled(tree) => {
                    entry["predicate"] = Value::String(detail);
                    entry["filter"] = to_document(tree);
                }
                ParameterOutcome::Skipped(_) => entry["reason"] = Value::String(detail),
                ParameterOutcome::Failed(_) => entry["error"] = Value::String(detail),
            }
            entry
        })
        .collect()
}
