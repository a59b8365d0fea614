use clap::{Parser, Subcommand};
use models::{AlgorithmVariant, SongFeatures};

#[derive(Debug, Parser)]
#[command(name = "melodymatchr")]
#[command(about = "Find similar songs using the MelodyMatchr service")]
#[command(arg_required_else_help = true)]
pub struct RootArgs {
    #[arg(
        long,
        global = true,
        value_name = "URL",
        help = "Service base URL (overrides MELODYMATCHR_API_URL)"
    )]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Check that the service is reachable")]
    Health,
    #[command(about = "Search songs by name")]
    Search {
        query: String,
        #[arg(long, default_value_t = melodymatchr_http_client::DEFAULT_MAX_RESULTS)]
        max_results: usize,
    },
    #[command(about = "Autocomplete suggestions for a prefix")]
    Suggest {
        prefix: String,
        #[arg(long, default_value_t = melodymatchr_http_client::DEFAULT_MAX_RESULTS)]
        max_results: usize,
    },
    #[command(about = "Cosine similarity between two songs given as JSON")]
    Similarity {
        #[arg(long, value_name = "JSON", value_parser = parse_song)]
        a: SongFeatures,
        #[arg(long, value_name = "JSON", value_parser = parse_song)]
        b: SongFeatures,
    },
    #[command(about = "Rank candidate songs against a target")]
    Match {
        #[arg(long, value_name = "JSON", value_parser = parse_song)]
        target: SongFeatures,
        #[arg(
            long,
            value_name = "JSON",
            value_parser = parse_songs,
            help = "JSON array of songs"
        )]
        candidates: SongList,
        #[arg(long, default_value_t = melodymatchr_http_client::DEFAULT_TOP_K)]
        top_k: usize,
        #[arg(long, default_value = "heap", value_parser = parse_algorithm)]
        algorithm: AlgorithmVariant,
    },
    #[command(about = "Recommend songs similar to a named song")]
    Recommend {
        song: String,
        #[arg(long, default_value_t = 3)]
        top_k: usize,
        #[arg(long, default_value = "heap", value_parser = parse_algorithm)]
        algorithm: AlgorithmVariant,
    },
    #[command(about = "Predict similar songs from a feature vector")]
    Predict {
        #[arg(long, value_name = "JSON", value_parser = parse_song)]
        song: SongFeatures,
        #[arg(long, default_value_t = melodymatchr_http_client::DEFAULT_TOLERANCE)]
        tolerance: f64,
        #[arg(long, default_value_t = melodymatchr_http_client::DEFAULT_TOP_K)]
        top_k: usize,
    },
    #[command(about = "Type queries line by line with live suggestions")]
    Interactive {
        #[arg(long, value_parser = parse_algorithm, help = "Overrides MELODYMATCHR_ALGORITHM")]
        algorithm: Option<AlgorithmVariant>,
    },
}

/// Newtype so clap treats a JSON array as one value rather than a
/// repeated argument.
#[derive(Debug, Clone)]
pub struct SongList(pub Vec<SongFeatures>);

fn parse_song(raw: &str) -> Result<SongFeatures, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid song JSON: {e}"))
}

fn parse_songs(raw: &str) -> Result<SongList, String> {
    serde_json::from_str(raw)
        .map(SongList)
        .map_err(|e| format!("invalid song list JSON: {e}"))
}

fn parse_algorithm(raw: &str) -> Result<AlgorithmVariant, String> {
    raw.parse::<AlgorithmVariant>()
        .map_err(|_| format!("unknown algorithm {raw:?} (expected heap or hashtable)"))
}
