use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub mod config;

/// Backend code path used to rank a committed search.
///
/// The client never ranks anything itself; the variant only picks which
/// endpoint family serves the request.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[strum(ascii_case_insensitive)]
pub enum AlgorithmVariant {
    #[default]
    #[serde(rename = "heap")]
    #[strum(serialize = "heap")]
    Heap,
    #[serde(rename = "hashtable")]
    #[strum(serialize = "hashtable")]
    Hashtable,
}

impl AlgorithmVariant {
    /// Route for the name-based recommendation used when a search is committed.
    pub const fn recommend_path(self) -> &'static str {
        match self {
            Self::Heap => "/recommend/heap",
            Self::Hashtable => "/recommend/hashtable",
        }
    }

    /// Route for ranking an explicit candidate list against a target.
    pub const fn match_path(self) -> &'static str {
        match self {
            Self::Heap => "/match/heap",
            Self::Hashtable => "/match/hashtable",
        }
    }
}

/// A song as the similarity endpoints accept it: optional identity plus a
/// feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongFeatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    pub features: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub name: String,
    pub artist: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
}

/// Prefix-search hit shown in the autocomplete panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub artist: String,
}

impl Suggestion {
    /// Query text written back into the input when this suggestion is picked.
    /// The artist suffix disambiguates titles shared by several artists.
    pub fn display_query(&self) -> String {
        format!("{} - {}", self.name, self.artist)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixSearchResponse {
    pub results: Vec<Suggestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityRequest {
    pub song1: SongFeatures,
    pub song2: SongFeatures,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityResponse {
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub artist: String,
    pub similarity: f64,
}

impl MatchResult {
    /// Similarity as a whole percentage, rounded half away from zero.
    pub fn percent(&self) -> u32 {
        (self.similarity.clamp(0.0, 1.0) * 100.0).round() as u32
    }

    /// Width of the proportional match bar, in percent of the full track.
    pub fn bar_width(&self) -> f64 {
        (self.similarity * 100.0).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub target: SongFeatures,
    pub candidates: Vec<SongFeatures>,
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub matches: Vec<MatchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub song_name: String,
    pub top_k: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchedSong {
    pub name: String,
    pub artist: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub searched_song: SearchedSong,
    pub matches: Vec<MatchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub song: SongFeatures,
    pub tolerance: f64,
    pub top_k: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<PredictionResult>,
}

/// Outcome of a successful commit. Replaced wholesale by the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedResult {
    pub searched_song: String,
    pub searched_artist: String,
    pub matches: Vec<MatchResult>,
    pub algorithm: AlgorithmVariant,
}

impl CommittedResult {
    pub fn from_response(resp: RecommendResponse, algorithm: AlgorithmVariant) -> Self {
        Self {
            searched_song: resp.searched_song.name,
            searched_artist: resp.searched_song.artist,
            matches: resp.matches,
            algorithm,
        }
    }
}
