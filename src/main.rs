use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rowq::source::{self, RecordFormat};
use rowq::{evaluate_with, DateEquality, EvalOptions, FilterExpr, Record, Schema};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, ValueEnum)]
enum Input {
    /// JSON/YAML array of flat record objects
    Records,
    /// Saved database-query response
    Notion,
}

#[derive(Clone, Copy, ValueEnum)]
enum Output {
    Json,
    Ids,
}

#[derive(Clone, Copy, ValueEnum)]
enum DateEq {
    Identity,
    Instant,
}

#[derive(Parser)]
#[command(
    name = "rowq",
    version,
    about = "Filter database rows with nested boolean filter expressions"
)]
struct Cli {
    #[arg(
        long,
        env = "ROWQ_RECORDS",
        help = "Records file (JSON or YAML), or - for stdin"
    )]
    records: Option<PathBuf>,

    #[arg(long, value_enum, env = "ROWQ_INPUT", default_value_t = Input::Records)]
    input: Input,

    #[arg(long, env = "ROWQ_SCHEMA", help = "Property types file (JSON or YAML)")]
    schema: Option<PathBuf>,

    #[arg(
        long,
        env = "ROWQ_FILTER",
        conflicts_with = "query",
        help = "Filter expression file (JSON or YAML)"
    )]
    filter: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Output::Json)]
    output: Output,

    #[arg(long, help = "List unique values for a property")]
    values: Option<String>,

    #[arg(long, help = "Show count for each value (use with --values)")]
    count: bool,

    #[arg(long, help = "List the comparators valid for a property")]
    comparators: Option<String>,

    #[arg(long, help = "Skip checking the filter against the schema")]
    lenient: bool,

    #[arg(
        long,
        value_enum,
        default_value_t = DateEq::Identity,
        help = "How equals/not_equals treat dates"
    )]
    date_equality: DateEq,

    #[arg(help = "Filter in text syntax, e.g. 'number > 5 AND status = \"Done\"'")]
    query: Option<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("ROWQ_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let schema_override = match cli.schema.as_deref().map(load_schema).transpose() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    if let Some(property) = &cli.comparators {
        if cli.records.is_none() {
            let schema = schema_override.unwrap_or_default();
            return run_comparators_mode(&schema, property);
        }
    }

    let Some(records_path) = cli.records.as_deref() else {
        eprintln!("Error: No records specified. Use --records or set ROWQ_RECORDS");
        return ExitCode::from(2);
    };

    let format = match cli.input {
        Input::Records => RecordFormat::Records,
        Input::Notion => RecordFormat::Notion,
    };

    let (records, schema) = match load_records(records_path, format, schema_override) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    if let Some(property) = &cli.comparators {
        return run_comparators_mode(&schema, property);
    }

    if let Some(property) = &cli.values {
        return run_values_mode(&records, property, cli.count);
    }

    let expr = match read_filter(&cli) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Filter error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    let expr = if cli.lenient {
        expr
    } else {
        match schema.validate(&expr) {
            Ok(resolved) => resolved,
            Err(e) => {
                eprintln!("Filter error: {}", e);
                return ExitCode::from(2);
            }
        }
    };

    let options = EvalOptions {
        date_equality: match cli.date_equality {
            DateEq::Identity => DateEquality::Identity,
            DateEq::Instant => DateEquality::Instant,
        },
    };

    run_filter_mode(&records, &expr, options, cli.output)
}

fn load_schema(path: &Path) -> Result<Schema> {
    source::load_schema(path)
        .with_context(|| format!("Failed to load schema: {}", path.display()))
}

fn load_records(
    path: &Path,
    format: RecordFormat,
    schema: Option<Schema>,
) -> Result<(Vec<Record>, Schema)> {
    let document = source::read_document(path)
        .with_context(|| format!("Failed to read records: {}", path.display()))?;
    source::load_records(document, format, schema)
        .with_context(|| format!("Failed to decode records: {}", path.display()))
}

fn read_filter(cli: &Cli) -> Result<FilterExpr> {
    if let Some(path) = &cli.filter {
        return source::load_filter(path)
            .with_context(|| format!("Failed to load filter: {}", path.display()));
    }

    match &cli.query {
        Some(query) => Ok(rowq::parse(query)?),
        None => {
            debug!("no filter given, passing all records through");
            Ok(FilterExpr::none())
        }
    }
}

fn run_comparators_mode(schema: &Schema, property: &str) -> ExitCode {
    match schema.get(property) {
        Some(ty) => println!("# {} ({})", property, ty),
        None => println!("# {} (undeclared, treated as text)", property),
    }
    for comparator in schema.comparators_for(property) {
        println!("{}\t{}", comparator, comparator.label());
    }
    ExitCode::from(0)
}

fn run_values_mode(records: &[Record], property: &str, show_count: bool) -> ExitCode {
    let values = rowq::values::collect_values(records, property);

    if values.is_empty() {
        return ExitCode::from(1);
    }

    let lines = rowq::values::format_values(values, show_count);
    for line in lines {
        println!("{}", line);
    }

    ExitCode::from(0)
}

fn run_filter_mode(
    records: &[Record],
    expr: &FilterExpr,
    options: EvalOptions,
    output: Output,
) -> ExitCode {
    let matched = evaluate_with(records, expr, options);
    info!(
        total = records.len(),
        matched = matched.len(),
        filter = %expr,
        "filter applied"
    );

    match output {
        Output::Json => match serde_json::to_string_pretty(&matched) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(2);
            }
        },
        Output::Ids => {
            for record in &matched {
                println!("{}", record.id);
            }
        }
    }

    if matched.is_empty() {
        ExitCode::from(1)
    } else {
        ExitCode::from(0)
    }
}
