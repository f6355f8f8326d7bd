use std::path::PathBuf;

use clap::{Parser, Subcommand};
use explorer::{ExplorerConfig, ImportSettings};
use foundation::GeoBounds;
use streaming::{FixtureDir, OverpassResource, overpass_query};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Street Explorer data tools")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Overpass query used to import an area
    Query {
        /// Bounding box: south,west,north,east
        #[arg(long)]
        bbox: GeoBounds,
    },

    /// Download raw OSM XML for an area from Overpass
    Fetch {
        /// Bounding box: south,west,north,east
        #[arg(long)]
        bbox: GeoBounds,

        /// Output file
        #[arg(long, default_value = "new.osm.xml")]
        out: PathBuf,

        /// Overpass interpreter (default: $OVERPASS_URL or overpass-api.de)
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// List the built-in test cases under a fixtures directory
    Fixtures {
        /// Fixtures root (default: $TESTS_ROOT or ./tests)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Print import settings as JSON from settings-form fields
    Settings {
        /// Form field as name=value (e.g. debugEachStep=on, sidewalks=infer)
        #[arg(long = "field")]
        fields: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = ExplorerConfig::from_env();

    match args.command {
        Command::Query { bbox } => println!("{}", overpass_query(&bbox)),
        Command::Fetch {
            bbox,
            out,
            endpoint,
        } => {
            let endpoint = endpoint.unwrap_or(config.overpass_endpoint);
            let osm = OverpassResource::new(endpoint).fetch_bounds(&bbox).await?;
            tokio::fs::write(&out, osm.as_bytes()).await?;
            info!("wrote {} bytes to {out:?}", osm.len());
        }
        Command::Fixtures { root } => {
            let root = root.unwrap_or_else(|| PathBuf::from(&config.fixtures_root));
            for name in FixtureDir::new(root).scenario_names().await? {
                println!("{name}");
            }
        }
        Command::Settings { fields } => {
            let settings = settings_from_fields(&fields);
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

fn settings_from_fields(fields: &[String]) -> ImportSettings {
    ImportSettings::from_form(
        fields
            .iter()
            .map(|f| f.split_once('=').unwrap_or((f.as_str(), "on"))),
    )
}
