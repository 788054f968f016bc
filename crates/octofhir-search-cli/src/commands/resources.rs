use anyhow::{Result, bail};
use octofhir_search_params::compiler::supports;
use octofhir_search_params::{SearchParamInfo, SearchParameterDictionary};
use serde_json::{Value, json};

use crate::cli::{OutputFormat, ResourcesArgs};
use crate::output::{print_json, print_table};

pub fn resources(
    dictionary: &SearchParameterDictionary,
    args: &ResourcesArgs,
    format: OutputFormat,
) -> Result<()> {
    let resource_types = match &args.resource_type {
        Some(ty) => {
            if dictionary.get_all_for_type(ty).is_empty() {
                bail!("No search parameters for resource type {ty}");
            }
            vec![ty.clone()]
        }
        None => dictionary.list_resource_types(),
    };

    let entries: Vec<(String, std::sync::Arc<SearchParamInfo>)> = resource_types
        .iter()
        .flat_map(|ty| {
            dictionary
                .get_all_for_type(ty)
                .into_iter()
                .map(move |param| (ty.clone(), param))
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let mut doc = serde_json::Map::new();
            for (ty, param) in &entries {
                let params = doc
                    .entry(ty.clone())
                    .or_insert_with(|| Value::Object(serde_json::Map::new()));
                params[param.name.as_str()] = json!({
                    "type": param.param_type,
                    "paths": param.paths,
                    "compilable": compilable(param),
                });
            }
            print_json(&Value::Object(doc));
        }
        OutputFormat::Table | OutputFormat::Text => {
            let rows = entries
                .iter()
                .map(|(ty, param)| {
                    [
                        ty.clone(),
                        param.name.clone(),
                        param.param_type.to_string(),
                        paths_text(param),
                        if compilable(param) { "yes" } else { "no" }.to_string(),
                    ]
                })
                .collect();
            print_table(["Resource", "Parameter", "Type", "Paths", "Compilable"], rows);
        }
    }
    Ok(())
}

fn compilable(param: &SearchParamInfo) -> bool {
    param.paths.values().all(|shape| supports(param.param_type, shape))
}

fn paths_text(param: &SearchParamInfo) -> String {
    param
        .paths
        .iter()
        .map(|(path, shape)| format!("{path} ({shape})"))
        .collect::<Vec<_>>()
        .join(", ")
}
