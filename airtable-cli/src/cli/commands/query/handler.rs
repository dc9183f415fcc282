//! Record command handler

use anyhow::{Context, Result};
use colored::*;
use csv::Writer;
use serde_json::Value;
use std::fs;
use std::time::Instant;

use super::{OutputArgs, OutputFormat, QueryArgs, to_fields};
use crate::api::{QueryBuilder, Record, Registry, UpdateMethod};
use crate::cli::{Cli, Commands};
use crate::config::Config;

/// Build the registry from config and environment, then run the command
pub async fn handle_command(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env();
    let registry = config
        .to_registry(None)
        .context("Failed to build table registry from configuration")?;

    let verbose = cli.verbose;
    let start = Instant::now();

    let (records, output): (Vec<Record>, OutputArgs) = match cli.command {
        Commands::Get(args) => {
            announce(verbose, "Listing", &args.table);
            let records = build_query(&registry, &args)?
                .get()
                .await
                .context("Failed to list records")?;
            (records, args.output)
        }
        Commands::First(args) => {
            announce(verbose, "Fetching first record of", &args.table);
            let record = build_query(&registry, &args)?
                .first()
                .await
                .context("Failed to fetch first record")?;
            (record.into_iter().collect(), args.output)
        }
        Commands::Find { table, id, output } => {
            announce(verbose, "Finding record in", &table);
            let record = registry
                .query(&table)?
                .find(&id)
                .await
                .with_context(|| format!("Failed to fetch record {}", id))?;
            if record.is_none() && verbose {
                println!("Record {} not found", id.yellow());
            }
            (record.into_iter().collect(), output)
        }
        Commands::Create { table, set, output } => {
            announce(verbose, "Creating record in", &table);
            let record = registry
                .query(&table)?
                .create(to_fields(&set))
                .await
                .context("Failed to create record")?;
            (vec![record], output)
        }
        Commands::Update {
            table,
            id,
            set,
            replace,
            output,
        } => {
            announce(verbose, "Updating record in", &table);
            let method = if replace {
                UpdateMethod::Put
            } else {
                UpdateMethod::Patch
            };
            let record = registry
                .query(&table)?
                .update(&id, to_fields(&set), method)
                .await
                .with_context(|| format!("Failed to update record {}", id))?;
            (vec![record], output)
        }
        Commands::FirstOrCreate {
            table,
            matching,
            set,
            output,
        } => {
            announce(verbose, "Finding or creating record in", &table);
            let record = registry
                .query(&table)?
                .first_or_create(to_fields(&matching), to_fields(&set))
                .await
                .context("Failed to find or create record")?;
            (vec![record], output)
        }
        Commands::UpdateOrCreate {
            table,
            matching,
            set,
            output,
        } => {
            announce(verbose, "Updating or creating record in", &table);
            let record = registry
                .query(&table)?
                .update_or_create(to_fields(&matching), to_fields(&set))
                .await
                .context("Failed to update or create record")?;
            (vec![record], output)
        }
    };

    let records = load_relations(&registry, records, &output.with).await?;

    if verbose {
        println!(
            "{} record(s) in {:.2}ms",
            records.len().to_string().bright_green(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        println!();
    }

    let payloads: Vec<Value> = records.iter().map(Record::to_payload).collect();
    let formatted_output = format_output(&payloads, output.format)?;
    write_output(&formatted_output, &output, verbose)
}

fn announce(verbose: bool, action: &str, table: &str) {
    if verbose {
        println!("{} {}", action, table.bright_green().bold());
    }
}

/// Apply the filter, sort, field and limit options to a fresh builder
fn build_query<'r>(registry: &'r Registry, args: &QueryArgs) -> Result<QueryBuilder<'r>> {
    let mut query = registry.query(&args.table)?;

    if !args.fields.is_empty() {
        query = query.select(args.fields.iter().cloned());
    }
    if let Some(formula) = &args.formula {
        query = query.filter_by_formula(formula);
    }
    for pair in &args.wheres {
        query = query.where_eq(&pair.key, crate::api::query::filters::literal(&pair.value));
    }
    for sort in &args.sort {
        query = query.order_by(&sort.0.field, sort.0.direction);
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }

    Ok(query)
}

async fn load_relations(
    registry: &Registry,
    mut records: Vec<Record>,
    relations: &[String],
) -> Result<Vec<Record>> {
    if relations.is_empty() {
        return Ok(records);
    }

    for record in &mut records {
        record
            .load(registry, relations)
            .await
            .with_context(|| format!("Failed to load relations {}", relations.join(", ")))?;
    }
    Ok(records)
}

fn write_output(formatted_output: &str, output: &OutputArgs, verbose: bool) -> Result<()> {
    if let Some(output_path) = &output.output {
        fs::write(output_path, formatted_output)
            .with_context(|| format!("Failed to write output to: {}", output_path.display()))?;
        if verbose {
            println!(
                "Results saved to: {}",
                output_path.display().to_string().bright_green()
            );
        }
    } else {
        println!("{}", formatted_output);
    }
    Ok(())
}

/// Format row payloads according to the requested output format
fn format_output(payloads: &[Value], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(payloads).context("Failed to format JSON output")
        }
        OutputFormat::JsonCompact => {
            serde_json::to_string(payloads).context("Failed to format JSON output")
        }
        OutputFormat::Csv => rows_to_csv(payloads),
    }
}

/// One line per row: `id`, `createdTime`, then every field seen in any row
fn rows_to_csv(payloads: &[Value]) -> Result<String> {
    if payloads.is_empty() {
        return Ok("No data\n".to_string());
    }

    let mut headers: Vec<String> = Vec::new();
    for payload in payloads {
        if let Some(Value::Object(fields)) = payload.get("fields") {
            for key in fields.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }
    }

    let mut wtr = Writer::from_writer(Vec::new());

    let mut header_row = vec!["id".to_string(), "createdTime".to_string()];
    header_row.extend(headers.iter().cloned());
    wtr.write_record(&header_row).context("Failed to write CSV header")?;

    for payload in payloads {
        let id = meta_to_string(payload.get("id"));
        let mut row = vec![id.clone(), meta_to_string(payload.get("createdTime"))];
        let fields = payload.get("fields");
        for header in &headers {
            let cell = fields
                .and_then(|fields| fields.get(header))
                .map(json_value_to_string)
                .unwrap_or_default();
            row.push(cell);
        }
        wtr.write_record(&row).with_context(|| format!("Failed to write record: {}", id))?;
    }

    let bytes = wtr.into_inner().context("Failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn meta_to_string(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Convert a JSON value to a cell; lists of strings are joined with ", "
fn json_value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_to_csv_uses_union_of_fields() {
        let payloads = vec![
            json!({"id": "rec1", "createdTime": "2024-01-01T00:00:00.000Z", "fields": {"Name": "A"}}),
            json!({"id": "rec2", "createdTime": "2024-01-02T00:00:00.000Z", "fields": {"Name": "B, Jr", "Tags": ["x", "y"]}}),
        ];

        assert_eq!(
            rows_to_csv(&payloads).unwrap(),
            "id,createdTime,Name,Tags\n\
             rec1,2024-01-01T00:00:00.000Z,A,\n\
             rec2,2024-01-02T00:00:00.000Z,\"B, Jr\",\"x, y\"\n"
        );
    }

    #[test]
    fn test_rows_to_csv_empty() {
        assert_eq!(rows_to_csv(&[]).unwrap(), "No data\n");
    }

    #[test]
    fn test_rows_to_csv_quotes_line_breaks() {
        let payloads = vec![
            json!({"id": "rec1", "fields": {"Note": "a\rb", "Quote": "say \"hi\""}}),
            json!({"id": "rec2", "fields": {"Note": "line\nbreak"}}),
        ];

        let csv = rows_to_csv(&payloads).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());

        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["id", "createdTime", "Note", "Quote"]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "a\rb");
        assert_eq!(&rows[0][3], "say \"hi\"");
        assert_eq!(&rows[1][2], "line\nbreak");
        assert_eq!(&rows[1][3], "");
    }

    #[test]
    fn test_format_output_json() {
        let payloads = vec![json!({"id": "rec1", "fields": {"Name": "A"}})];
        assert_eq!(
            format_output(&payloads, OutputFormat::JsonCompact).unwrap(),
            r#"[{"id":"rec1","fields":{"Name":"A"}}]"#
        );

        let pretty = format_output(&payloads, OutputFormat::Json).unwrap();
        assert!(pretty.contains('\n'));
    }
}
