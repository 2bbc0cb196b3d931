use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rnc_search::config::{find_config_file, get_config, load_config};
use rnc_search::models::{ParamValue, Query, SourceCitation, Subcorpus};
use rnc_search::CorpusClient;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// RNC Search - query the Russian National Corpus from the command line
#[derive(Parser, Debug)]
#[command(name = "rnc-search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query the Russian National Corpus search interface", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcorpus to search
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SubcorpusArg {
    /// Old Russian
    Old,
    /// Middle Russian
    Mid,
    /// Main (modern) corpus
    Main,
}

impl From<SubcorpusArg> for Subcorpus {
    fn from(arg: SubcorpusArg) -> Self {
        match arg {
            SubcorpusArg::Old => Subcorpus::Old,
            SubcorpusArg::Mid => Subcorpus::Mid,
            SubcorpusArg::Main => Subcorpus::Main,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the search URL for a query
    Url {
        #[arg(long, short, value_enum, default_value_t = SubcorpusArg::Main)]
        subcorpus: SubcorpusArg,

        /// Search term (lex1)
        #[arg(long)]
        lex: Option<String>,

        /// Extra parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Result page
        #[arg(long)]
        page: Option<u32>,
    },

    /// Parse a search URL and print its parameters as JSON
    ParseUrl {
        url: String,
    },

    /// Print the number of matching documents and contexts
    Count {
        /// Search term (lex1)
        #[arg(long)]
        lex: String,

        #[arg(long, short, value_enum, default_value_t = SubcorpusArg::Main)]
        subcorpus: SubcorpusArg,

        /// Extra parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// Print the entries of one result page as JSON
    Results {
        /// Search term (lex1)
        #[arg(long)]
        lex: String,

        #[arg(long, short, value_enum, default_value_t = SubcorpusArg::Main)]
        subcorpus: SubcorpusArg,

        /// Result page
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Extra parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// Parse a source citation and print its dates as JSON
    Citation {
        text: String,
    },

    /// Write the default configuration to a file
    InitConfig {
        path: PathBuf,
    },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {:?}", s))
}

fn build_query(
    subcorpus: SubcorpusArg,
    lex: Option<String>,
    params: Vec<(String, String)>,
) -> Query {
    let mut overrides: Vec<(String, ParamValue)> = params
        .into_iter()
        .map(|(k, v)| (k, ParamValue::from(v)))
        .collect();

    if let Some(lex) = lex {
        overrides.push(("lex1".to_string(), ParamValue::from(lex)));
    }

    Query::new(subcorpus.into(), overrides)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("rnc_search={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = if let Some(config_path) = &cli.config {
        load_config(config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(&config_path)?
    } else {
        get_config()
    };

    match cli.command {
        Commands::Url {
            subcorpus,
            lex,
            params,
            page,
        } => {
            let query = build_query(subcorpus, lex, params);
            match page {
                Some(page) => println!("{}", query.page_url(page)),
                None => println!("{}", query.url()),
            }
        }
        Commands::ParseUrl { url } => {
            let client = CorpusClient::new(config)?;
            let query = client.query_from_url(&url)?;
            println!("{}", serde_json::to_string_pretty(&query)?);
        }
        Commands::Count {
            lex,
            subcorpus,
            params,
        } => {
            let client = CorpusClient::new(config)?;
            let query = build_query(subcorpus, Some(lex), params);
            let (documents, contexts) = client.documents_and_contexts(&query).await?;
            println!("documents: {}", documents);
            println!("contexts: {}", contexts);
        }
        Commands::Results {
            lex,
            subcorpus,
            page,
            params,
        } => {
            let client = CorpusClient::new(config)?;
            let query = build_query(subcorpus, Some(lex), params);
            let results = client.result_page(&query, page).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Citation { text } => {
            let citation = SourceCitation::new(text);
            println!("{}", serde_json::to_string_pretty(&citation)?);
        }
        Commands::InitConfig { path } => {
            config.save(&path)?;
            tracing::info!("Wrote configuration to {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_takes_lex_flag() {
        let cli = Cli::try_parse_from([
            "rnc-search", "count", "--lex", "читать", "-s", "mid", "--param", "level1=2",
        ])
        .unwrap();
        match cli.command {
            Commands::Count { lex, subcorpus, params } => {
                assert_eq!(lex, "читать");
                assert!(matches!(subcorpus, SubcorpusArg::Mid));
                assert_eq!(params, vec![("level1".to_string(), "2".to_string())]);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["rnc-search", "count", "читать"]).is_err());
    }

    #[test]
    fn test_results_defaults_to_first_page() {
        let cli = Cli::try_parse_from(["rnc-search", "results", "--lex", "читать"]).unwrap();
        match cli.command {
            Commands::Results { lex, page, .. } => {
                assert_eq!(lex, "читать");
                assert_eq!(page, 0);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_build_query_params_round_trip() {
        let query = build_query(
            SubcorpusArg::Main,
            Some("читать".to_string()),
            vec![
                ("level1".to_string(), "2".to_string()),
                ("gramm1".to_string(), "S&V".to_string()),
            ],
        );
        assert_eq!(query.get("level1"), Some(&ParamValue::Integer(2)));
        assert_eq!(Query::from_url(&query.url()).unwrap(), query);
    }
}
