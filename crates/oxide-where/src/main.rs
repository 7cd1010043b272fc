//! oxide-where CLI
//!
//! Command-line tool for filtering JSON records with where clauses.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Value as Json};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_where_core::{parse_where, MatchOptions, Matcher, Predicate, Record};
use oxide_where_model::query::{count_matching, select};
use oxide_where_model::{Attributes, FindOptions, Projection};

/// Filter JSON records with ORM-style where clauses.
#[derive(Parser)]
#[command(name = "oxide-where")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Make `like` and `notLike` ignore case.
    #[arg(short = 'i', long, env = "OXIDE_WHERE_CASE_INSENSITIVE")]
    case_insensitive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the records that satisfy a where clause.
    Filter {
        /// JSON file holding an array of objects.
        #[arg(short, long)]
        records: PathBuf,

        #[command(flatten)]
        clause: WhereSource,

        /// Sort key; prefix with `-` for descending. May be repeated.
        #[arg(short, long)]
        order: Vec<String>,

        /// Maximum number of records to print.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Number of matching records to skip.
        #[arg(long)]
        offset: Option<usize>,

        /// Comma-separated attributes to keep; `name:alias` renames.
        #[arg(short, long, value_delimiter = ',')]
        attributes: Vec<String>,

        /// Print `{ "count": n, "rows": [...] }`, counting every match.
        #[arg(short, long)]
        count: bool,
    },

    /// Print whether one record satisfies a where clause.
    Check {
        /// The record as a JSON object.
        #[arg(short, long)]
        record: String,

        #[command(flatten)]
        clause: WhereSource,
    },
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct WhereSource {
    /// Where clause as inline JSON.
    #[arg(short, long = "where")]
    where_json: Option<String>,

    /// File holding the where clause.
    #[arg(long)]
    where_file: Option<PathBuf>,
}

impl WhereSource {
    fn predicate(&self) -> anyhow::Result<Predicate> {
        let text = match (&self.where_json, &self.where_file) {
            (Some(inline), _) => inline.clone(),
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            (None, None) => bail!("either --where or --where-file is required"),
        };
        let json: Json = serde_json::from_str(&text).context("where clause is not valid JSON")?;
        Ok(parse_where(&json)?)
    }
}

/// Paging, ordering and projection for `filter`.
#[derive(Debug, Default)]
struct FilterArgs {
    order: Vec<String>,
    limit: Option<usize>,
    offset: Option<usize>,
    attributes: Vec<String>,
    count: bool,
}

impl FilterArgs {
    fn find_options(&self, predicate: Predicate) -> FindOptions {
        let mut options = FindOptions::new().filter(predicate);
        for spec in &self.order {
            options = options.order_by(spec);
        }
        options.limit = self.limit;
        options.offset = self.offset;
        if !self.attributes.is_empty() {
            options.attributes = Attributes::Include(
                self.attributes
                    .iter()
                    .map(|spec| match spec.split_once(':') {
                        Some((source, alias)) => Projection::renamed(source, alias),
                        None => Projection::new(spec),
                    })
                    .collect(),
            );
        }
        options
    }
}

fn load_records(path: &Path) -> anyhow::Result<Vec<Record>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let json: Json = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let Json::Array(items) = json else {
        bail!("{} must hold a JSON array of objects", path.display());
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            Record::from_json(item).with_context(|| format!("record {index} is invalid"))
        })
        .collect()
}

fn run_filter(
    records: &[Record],
    predicate: Predicate,
    args: &FilterArgs,
    matcher: &Matcher,
) -> anyhow::Result<Json> {
    let total = if args.count {
        Some(count_matching(records, Some(&predicate), matcher)?)
    } else {
        None
    };
    let options = args.find_options(predicate);
    let rows: Vec<Json> = select(records, &options, matcher)?
        .iter()
        .map(Record::to_json)
        .collect();
    info!(scanned = records.len(), returned = rows.len(), "filter complete");
    Ok(match total {
        Some(count) => json!({ "count": count, "rows": rows }),
        None => Json::Array(rows),
    })
}

fn run_check(record: &str, predicate: &Predicate, matcher: &Matcher) -> anyhow::Result<bool> {
    let json: Json = serde_json::from_str(record).context("record is not valid JSON")?;
    let record = Record::from_json(&json)?;
    Ok(matcher.matches(&record, predicate)?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let matcher = Matcher::new(MatchOptions::new().case_insensitive_like(cli.case_insensitive));

    match cli.command {
        Commands::Filter {
            records,
            clause,
            order,
            limit,
            offset,
            attributes,
            count,
        } => {
            let predicate = clause.predicate()?;
            let rows = load_records(&records)?;
            let args = FilterArgs {
                order,
                limit,
                offset,
                attributes,
                count,
            };
            let output = run_filter(&rows, predicate, &args, &matcher)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Check { record, clause } => {
            let predicate = clause.predicate()?;
            println!("{}", run_check(&record, &predicate, &matcher)?);
        }
    }

    Ok(())
}
