use anyhow::{Result, anyhow};
use colored::Colorize;
use octofhir_search_params::types::{DateValue, NumberValue, QuantityValue, to_decimal_string};
use octofhir_search_params::{SearchParameterType, SearchValue};
use serde_json::{Map, Value, json};
use time::UtcOffset;

use crate::cli::{OutputFormat, ParseArgs};
use crate::output::{print_json, print_table};

pub fn parse(args: &ParseArgs, local_offset: UtcOffset, format: OutputFormat) -> Result<()> {
    let param_type = SearchParameterType::parse(&args.param_type)
        .ok_or_else(|| anyhow!("Unknown search parameter type: {}", args.param_type))?;
    let value = SearchValue::parse(param_type, &args.value)?
        .ok_or_else(|| anyhow!("Search parameter type '{param_type}' has no value parser"))?;

    let mut fields = Map::new();
    fields.insert("type".into(), json!(param_type));
    fields.insert("prefix".into(), json!(value.prefix()));
    fields.insert("canonical".into(), json!(value.to_string()));
    describe(&value, local_offset, &mut fields);

    match format {
        OutputFormat::Json => print_json(&Value::Object(fields)),
        OutputFormat::Table => {
            let rows = fields
                .iter()
                .map(|(k, v)| [k.clone(), field_text(v)])
                .collect();
            print_table(["Field", "Value"], rows);
        }
        OutputFormat::Text => {
            for (k, v) in &fields {
                println!("{}: {}", k.cyan(), field_text(v));
            }
        }
    }
    Ok(())
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "(none)".to_string(),
        other => other.to_string(),
    }
}

fn describe(value: &SearchValue, local_offset: UtcOffset, fields: &mut Map<String, Value>) {
    match value {
        SearchValue::Date(date) => describe_date(date, local_offset, fields),
        SearchValue::Number(number) => describe_number(number, fields),
        SearchValue::Quantity(quantity) => describe_quantity(quantity, fields),
        SearchValue::Reference(reference) => {
            fields.insert("url".into(), json!(reference.url()));
            fields.insert("resource_type".into(), json!(reference.resource_type()));
            fields.insert("id".into(), json!(reference.id()));
        }
        SearchValue::String(string) => {
            fields.insert("value".into(), json!(string.value));
        }
        SearchValue::Token(token) => {
            fields.insert("system".into(), json!(token.system()));
            fields.insert("code".into(), json!(token.code));
            fields.insert("any_system".into(), json!(token.any_system));
        }
        SearchValue::Uri(uri) => {
            fields.insert("uri".into(), json!(uri.uri));
        }
    }
}

fn describe_date(date: &DateValue, local_offset: UtcOffset, fields: &mut Map<String, Value>) {
    let range = date.to_range(local_offset);
    fields.insert("precision".into(), json!(format!("{:?}", date.precision)));
    fields.insert("zone".into(), json!(date.zone.to_string()));
    fields.insert("range_low_incl".into(), json!(date.range_low_incl().to_string()));
    fields.insert("range_high_excl".into(), json!(date.range_high_excl().to_string()));
    fields.insert("start".into(), json!(range.start.to_string()));
    fields.insert("end".into(), json!(range.end.to_string()));
}

fn describe_number(number: &NumberValue, fields: &mut Map<String, Value>) {
    fields.insert("value".into(), json!(to_decimal_string(&number.value)));
    fields.insert("precision".into(), json!(number.precision));
    fields.insert(
        "range_low_incl".into(),
        json!(to_decimal_string(&number.range_low_incl())),
    );
    fields.insert(
        "range_high_excl".into(),
        json!(to_decimal_string(&number.range_high_excl())),
    );
}

fn describe_quantity(quantity: &QuantityValue, fields: &mut Map<String, Value>) {
    describe_number(&quantity.number, fields);
    fields.insert("system".into(), json!(quantity.system));
    fields.insert("code".into(), json!(quantity.code));
}
