//! adlens CLI - query ad-performance metrics
//!
//! Usage:
//!   adlens query --fields <list> [--group <list>] [--order <spec>] [--date-from <d>] [--date-to <d>] [--filter k=v]...
//!   adlens sql   --fields <list> ... [--dialect <dialect>]
//!   adlens fields
//!   adlens serve
//!
//! Examples:
//!   adlens query --fields channel,country,impressions,clicks --group channel,country --order -clicks --date-to 2017-06-01
//!   adlens sql --fields channel,cpi,spend --group channel --order "cpi desc" --dialect postgres

use std::path::PathBuf;
use std::process::ExitCode;

use adlens::catalog::FieldCatalog;
use adlens::config::Settings;
use adlens::execution::{render_sql, Row};
use adlens::planner::QueryCompiler;
use adlens::request::{
    QueryRequest, DATE_FROM_PARAM, DATE_TO_PARAM, FIELDS_PARAM, GROUP_PARAM, ORDER_PARAM,
};
use adlens::schema::StarSchema;
use adlens::sql::Dialect;
use adlens::Engine;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "adlens")]
#[command(about = "adlens - grouped, filtered metrics over ad-performance data")]
#[command(version)]
struct Cli {
    /// Path to adlens.toml (defaults to $ADLENS_CONFIG, ./adlens.toml, ~/.adlens/adlens.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query and print the result envelope as JSON
    Query(QueryArgs),

    /// Print the SQL a query compiles to, without running it
    Sql {
        #[command(flatten)]
        query: QueryArgs,

        /// SQL dialect to generate
        #[arg(short, long, default_value = "sqlite")]
        dialect: DialectArg,
    },

    /// List the queryable fields
    Fields,

    /// Start the HTTP API
    #[cfg(feature = "server")]
    Serve,
}

#[derive(Args)]
struct QueryArgs {
    /// Output fields, comma-separated
    #[arg(short, long)]
    fields: String,

    /// Grouping fields, comma-separated
    #[arg(short, long)]
    group: Option<String>,

    /// Sort spec, e.g. "-clicks,channel"
    #[arg(short, long, allow_hyphen_values = true)]
    order: Option<String>,

    /// Inclusive lower date bound (YYYY-MM-DD)
    #[arg(long)]
    date_from: Option<String>,

    /// Inclusive upper date bound (YYYY-MM-DD)
    #[arg(long)]
    date_to: Option<String>,

    /// Equality filter, repeatable
    #[arg(long = "filter", value_name = "FIELD=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
}

impl QueryArgs {
    /// The same parameter pairs the HTTP surface receives.
    fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![(FIELDS_PARAM.to_string(), self.fields.clone())];
        let optional = [
            (GROUP_PARAM, &self.group),
            (ORDER_PARAM, &self.order),
            (DATE_FROM_PARAM, &self.date_from),
            (DATE_TO_PARAM, &self.date_to),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                params.push((name.to_string(), value.clone()));
            }
        }
        params.extend(self.filters.iter().cloned());
        params
    }
}

fn parse_filter(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got {:?}", s))?;
    Ok((key.trim().to_string(), value.to_string()))
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Sqlite,
    Postgres,
    Mysql,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::MySql,
        }
    }
}

#[derive(Serialize)]
struct Envelope {
    result: ResultBody,
}

#[derive(Serialize)]
struct ResultBody {
    items: usize,
    data: Vec<Row>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Query(args) => cmd_query(cli.config, args).await,
        Commands::Sql { query, dialect } => cmd_sql(query, dialect),
        Commands::Fields => cmd_fields(),
        #[cfg(feature = "server")]
        Commands::Serve => cmd_serve(cli.config).await,
    }
}

fn load_settings(path: Option<PathBuf>) -> Option<Settings> {
    let result = match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    match result {
        Ok(settings) => Some(settings),
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            None
        }
    }
}

async fn cmd_query(config: Option<PathBuf>, args: QueryArgs) -> ExitCode {
    let Some(settings) = load_settings(config) else {
        return ExitCode::FAILURE;
    };

    let engine = match Engine::from_settings(&settings).await {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error opening database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let rows = match engine.parse_request(args.params()) {
        Ok(request) => engine.run(&request).await,
        Err(e) => Err(e),
    };

    match rows {
        Ok(rows) => {
            let envelope = Envelope {
                result: ResultBody {
                    items: rows.len(),
                    data: rows,
                },
            };
            match serde_json::to_string_pretty(&envelope) {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error encoding result: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_sql(args: QueryArgs, dialect: DialectArg) -> ExitCode {
    let schema = StarSchema::performance();
    let catalog = FieldCatalog::from_schema(&schema);

    let request = match QueryRequest::from_params(args.params(), &catalog) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match QueryCompiler::new(&schema, &catalog).compile(&request) {
        Ok(plan) => {
            println!("{}", render_sql(&plan, dialect.into()));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_fields() -> ExitCode {
    let catalog = FieldCatalog::from_schema(&StarSchema::performance());

    println!("Fields:");
    for entry in catalog.iter() {
        println!("  {:<18} {:<10} {}", entry.name, entry.kind.to_string(), entry.data_type);
    }

    ExitCode::SUCCESS
}

#[cfg(feature = "server")]
async fn cmd_serve(config: Option<PathBuf>) -> ExitCode {
    let Some(settings) = load_settings(config) else {
        return ExitCode::FAILURE;
    };

    match adlens::web::serve(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
