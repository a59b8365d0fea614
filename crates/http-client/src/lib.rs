use std::future::Future;

use models::config::ServiceConfig;
use models::{
    AlgorithmVariant, HealthResponse, MatchRequest, MatchResponse, MatchResult, PredictRequest,
    PredictResponse, PredictionResult, PrefixSearchResponse, RecommendRequest, RecommendResponse,
    SearchRequest, SearchResponse, SearchResult, SimilarityRequest, SimilarityResponse,
    SongFeatures, Suggestion,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

mod error;

pub use error::{RequestError, Result};

const HEALTH_PATH: &str = "/health";
const SEARCH_PATH: &str = "/search";
const PREFIX_SEARCH_PATH: &str = "/search/prefix";
const SIMILARITY_PATH: &str = "/similarity";
const PREDICT_PATH: &str = "/predict";

pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const DEFAULT_TOLERANCE: f64 = 0.1;
pub const DEFAULT_TOP_K: usize = 5;

/// The subset of service calls an interactive search session depends on.
pub trait SongService: Send + Sync + 'static {
    /// Autocomplete lookup. Must resolve to `RequestError::Cancelled` promptly
    /// once `token` is cancelled, or at least never apply side effects.
    fn search_by_prefix(
        &self,
        prefix: &str,
        max_results: usize,
        token: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<Suggestion>>> + Send;

    fn recommend(
        &self,
        song_name: &str,
        top_k: usize,
        algorithm: AlgorithmVariant,
    ) -> impl Future<Output = Result<RecommendResponse>> + Send;
}

/// Stateless wrapper around the song-similarity HTTP API.
#[derive(Debug, Clone)]
pub struct SongServiceClient {
    client: Client,
    base_url: String,
}

impl SongServiceClient {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RequestError::Network(format!("build http client: {e}")))?;
        Ok(Self::with_client(config.base_url.clone(), client))
    }

    pub fn with_client(base_url: String, client: Client) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn check_health(&self) -> Result<String> {
        let resp: HealthResponse = self.get_json(HEALTH_PATH).await?;
        Ok(resp.status)
    }

    pub async fn search_by_name(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let query = non_empty(query)?;
        let body = SearchRequest {
            query: query.to_string(),
            max_results,
        };
        let resp: SearchResponse = self.post_json(SEARCH_PATH, &body).await?;
        Ok(resp.results)
    }

    pub async fn search_by_prefix(
        &self,
        prefix: &str,
        max_results: usize,
        token: &CancellationToken,
    ) -> Result<Vec<Suggestion>> {
        let prefix = non_empty(prefix)?;
        if token.is_cancelled() {
            return Err(RequestError::Cancelled);
        }

        let body = SearchRequest {
            query: prefix.to_string(),
            max_results,
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(prefix, "prefix search cancelled");
                Err(RequestError::Cancelled)
            }
            resp = self.post_json::<_, PrefixSearchResponse>(PREFIX_SEARCH_PATH, &body) => {
                resp.map(|r| r.results)
            }
        }
    }

    pub async fn compute_similarity(&self, song1: &SongFeatures, song2: &SongFeatures) -> Result<f64> {
        let body = SimilarityRequest {
            song1: song1.clone(),
            song2: song2.clone(),
        };
        let resp: SimilarityResponse = self.post_json(SIMILARITY_PATH, &body).await?;
        Ok(resp.similarity)
    }

    /// Ranks `candidates` against `target` on the backend selected by
    /// `algorithm`. Results come back ordered by descending similarity.
    pub async fn match_against_candidates(
        &self,
        target: &SongFeatures,
        candidates: &[SongFeatures],
        top_k: usize,
        algorithm: AlgorithmVariant,
    ) -> Result<Vec<MatchResult>> {
        let body = MatchRequest {
            target: target.clone(),
            candidates: candidates.to_vec(),
            top_k,
        };
        let resp: MatchResponse = self.post_json(algorithm.match_path(), &body).await?;
        Ok(resp.matches)
    }

    /// Name-based recommendation; this is what a committed search calls.
    pub async fn recommend(
        &self,
        song_name: &str,
        top_k: usize,
        algorithm: AlgorithmVariant,
    ) -> Result<RecommendResponse> {
        let song_name = non_empty(song_name)?;
        let body = RecommendRequest {
            song_name: song_name.to_string(),
            top_k,
        };
        self.post_json(algorithm.recommend_path(), &body).await
    }

    pub async fn predict_similar(
        &self,
        song: &SongFeatures,
        tolerance: f64,
        top_k: usize,
    ) -> Result<Vec<PredictionResult>> {
        let body = PredictRequest {
            song: song.clone(),
            tolerance,
            top_k,
        };
        let resp: PredictResponse = self.post_json(PREDICT_PATH, &body).await?;
        Ok(resp.predictions)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(method = "GET", path, "service request");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(RequestError::from_transport)?;
        decode(path, resp).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(method = "POST", path, "service request");
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(RequestError::from_transport)?;
        decode(path, resp).await
    }
}

impl SongService for SongServiceClient {
    async fn search_by_prefix(
        &self,
        prefix: &str,
        max_results: usize,
        token: &CancellationToken,
    ) -> Result<Vec<Suggestion>> {
        SongServiceClient::search_by_prefix(self, prefix, max_results, token).await
    }

    async fn recommend(
        &self,
        song_name: &str,
        top_k: usize,
        algorithm: AlgorithmVariant,
    ) -> Result<RecommendResponse> {
        SongServiceClient::recommend(self, song_name, top_k, algorithm).await
    }
}

async fn decode<T: DeserializeOwned>(path: &str, resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let bytes = resp.bytes().await.map_err(RequestError::from_transport)?;

    if !status.is_success() {
        let body = String::from_utf8_lossy(&bytes);
        let detail = error::extract_detail(&body);
        tracing::warn!(path, status = status.as_u16(), ?detail, "service returned non-success");
        return Err(RequestError::Service {
            status: status.as_u16(),
            detail,
        });
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| RequestError::MalformedResponse(format!("{path}: {e}")))
}

fn non_empty(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(RequestError::EmptyQuery);
    }
    Ok(trimmed)
}
