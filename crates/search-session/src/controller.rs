use melodymatchr_http_client::RequestError;
use models::config::SessionConfig;
use models::{AlgorithmVariant, CommittedResult, RecommendResponse, Suggestion};

use crate::view::SessionView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Typing,
    SuggestionsLoading,
    SuggestionsShown,
    Committing,
    ResultShown,
    Error,
}

/// Side effect requested by a transition. The controller itself never
/// performs I/O; the runtime carries these out.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Abort the armed debounce timer and cancel the outstanding fetch.
    CancelSuggestions,
    ArmDebounce { generation: u64 },
    FetchSuggestions {
        generation: u64,
        prefix: String,
        max_results: usize,
    },
    Commit {
        query: String,
        top_k: usize,
        algorithm: AlgorithmVariant,
    },
}

#[derive(Debug, Clone)]
struct PendingCommit {
    algorithm: AlgorithmVariant,
}

/// Owns everything the user sees: query text, suggestions, panel
/// visibility and the committed result.
///
/// `generation` is bumped on every event that supersedes suggestion work. A
/// fetch result is applied only if it carries the current generation and is
/// the one fetch marked in flight, so arrival order never matters.
#[derive(Debug)]
pub struct SessionController {
    config: SessionConfig,
    state: SessionState,
    query: String,
    suggestions: Vec<Suggestion>,
    /// Trimmed query the current suggestions were fetched for.
    suggestions_for: String,
    panel_suppressed: bool,
    committed: Option<CommittedResult>,
    error: Option<String>,
    algorithm: AlgorithmVariant,
    generation: u64,
    in_flight: Option<u64>,
    pending_commit: Option<PendingCommit>,
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Self {
        let algorithm = config.algorithm;
        Self {
            config,
            state: SessionState::Idle,
            query: String::new(),
            suggestions: Vec::new(),
            suggestions_for: String::new(),
            panel_suppressed: false,
            committed: None,
            error: None,
            algorithm,
            generation: 0,
            in_flight: None,
            pending_commit: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn committed(&self) -> Option<&CommittedResult> {
        self.committed.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn algorithm(&self) -> AlgorithmVariant {
        self.algorithm
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_committing(&self) -> bool {
        self.pending_commit.is_some()
    }

    pub fn panel_visible(&self) -> bool {
        !self.panel_suppressed && !self.suggestions.is_empty()
    }

    pub fn view(&self) -> SessionView {
        SessionView::from_controller(self)
    }

    pub fn set_algorithm(&mut self, algorithm: AlgorithmVariant) {
        self.algorithm = algorithm;
    }

    /// Query text changed (keystroke, paste, programmatic update).
    pub fn on_input(&mut self, text: impl Into<String>) -> Vec<Effect> {
        self.query = text.into();
        self.supersede();
        self.panel_suppressed = false;

        let mut effects = vec![Effect::CancelSuggestions];

        if self.query.trim() != self.suggestions_for {
            self.clear_suggestions();
        }

        if self.query.trim().chars().count() < self.config.min_query_chars {
            self.clear_suggestions();
            tracing::debug!(query = %self.query, "query below threshold; suggestions cleared");
        } else {
            tracing::debug!(generation = self.generation, "debounce armed");
            effects.push(Effect::ArmDebounce {
                generation: self.generation,
            });
        }

        self.settle(SessionState::Typing);
        effects
    }

    /// The debounce timer for `generation` fired.
    pub fn on_debounce_elapsed(&mut self, generation: u64) -> Vec<Effect> {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "stale debounce ignored");
            return Vec::new();
        }

        self.in_flight = Some(generation);
        self.settle(SessionState::SuggestionsLoading);
        tracing::debug!(generation, "suggestion fetch issued");

        vec![Effect::FetchSuggestions {
            generation,
            prefix: self.query.trim().to_string(),
            max_results: self.config.max_suggestions,
        }]
    }

    /// A suggestion fetch completed. Returns whether its result was applied.
    pub fn on_suggestions(
        &mut self,
        generation: u64,
        result: Result<Vec<Suggestion>, RequestError>,
    ) -> bool {
        if generation != self.generation || self.in_flight != Some(generation) {
            tracing::debug!(generation, current = self.generation, "superseded suggestions dropped");
            return false;
        }
        self.in_flight = None;

        match result {
            // Nothing superseded the fetch, so the query is still its prefix.
            Ok(mut suggestions) => {
                suggestions.truncate(self.config.max_suggestions);
                self.suggestions = suggestions;
                self.suggestions_for = self.query.trim().to_string();
            }
            Err(e) if e.is_cancellation() => {
                tracing::debug!(generation, "suggestion fetch cancelled");
                self.clear_suggestions();
            }
            Err(e) => {
                tracing::warn!(generation, error = %e, "suggestion fetch failed");
                self.clear_suggestions();
            }
        }

        let next = if self.panel_visible() {
            SessionState::SuggestionsShown
        } else {
            SessionState::Typing
        };
        self.settle(next);
        true
    }

    pub fn commit(&mut self) -> Vec<Effect> {
        self.commit_with(self.algorithm)
    }

    /// Finalize the current query. Ignored while a commit is already pending
    /// or when the trimmed query is empty.
    pub fn commit_with(&mut self, algorithm: AlgorithmVariant) -> Vec<Effect> {
        if self.pending_commit.is_some() {
            tracing::debug!("commit already in flight; ignored");
            return Vec::new();
        }
        let query = self.query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let query = query.to_string();

        self.supersede();
        self.clear_suggestions();
        self.panel_suppressed = true;
        self.error = None;
        self.pending_commit = Some(PendingCommit { algorithm });
        self.state = SessionState::Committing;
        tracing::debug!(%query, %algorithm, "commit issued");

        vec![
            Effect::CancelSuggestions,
            Effect::Commit {
                query,
                top_k: self.config.top_k,
                algorithm,
            },
        ]
    }

    pub fn on_commit_result(&mut self, result: Result<RecommendResponse, RequestError>) {
        let Some(pending) = self.pending_commit.take() else {
            tracing::debug!("commit result without pending commit ignored");
            return;
        };

        match result {
            Ok(resp) => {
                self.committed = Some(CommittedResult::from_response(resp, pending.algorithm));
                self.error = None;
                self.state = SessionState::ResultShown;
            }
            Err(e) => {
                tracing::warn!(error = %e, "commit failed");
                self.error = Some(e.user_message());
                self.state = SessionState::Error;
            }
        }
    }

    /// Pick the suggestion at `index` from the visible panel.
    pub fn select_suggestion(&mut self, index: usize) -> Vec<Effect> {
        if !self.panel_visible() {
            return Vec::new();
        }
        let Some(suggestion) = self.suggestions.get(index) else {
            return Vec::new();
        };

        self.query = suggestion.display_query();
        self.supersede();
        self.clear_suggestions();
        self.panel_suppressed = true;
        self.settle(SessionState::Typing);

        // No debounce is armed for the synthetic text.
        vec![Effect::CancelSuggestions]
    }

    /// Pointer or focus moved outside the input and the panel.
    pub fn dismiss_panel(&mut self) {
        self.panel_suppressed = true;
        if self.state == SessionState::SuggestionsShown {
            self.state = SessionState::Typing;
        }
    }

    fn clear_suggestions(&mut self) {
        self.suggestions.clear();
        self.suggestions_for.clear();
    }

    fn supersede(&mut self) {
        self.generation += 1;
        self.in_flight = None;
    }

    // A pending commit owns the state until it resolves.
    fn settle(&mut self, next: SessionState) {
        if self.pending_commit.is_none() {
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{MatchResult, SearchedSong};

    fn controller() -> SessionController {
        SessionController::new(SessionConfig::default())
    }

    fn suggestion(name: &str, artist: &str) -> Suggestion {
        Suggestion {
            name: name.to_string(),
            artist: artist.to_string(),
        }
    }

    fn recommend_response(similarity: f64) -> RecommendResponse {
        RecommendResponse {
            searched_song: SearchedSong {
                name: "Shape of You".to_string(),
                artist: "Ed Sheeran".to_string(),
            },
            matches: vec![MatchResult {
                id: None,
                name: "Levitating".to_string(),
                artist: "Dua Lipa".to_string(),
                similarity,
            }],
        }
    }

    fn fetch_generation(effects: &[Effect]) -> u64 {
        match effects {
            [Effect::FetchSuggestions { generation, .. }] => *generation,
            other => panic!("expected a single fetch, got {other:?}"),
        }
    }

    #[test]
    fn starts_idle_and_types_on_first_keystroke() {
        let mut c = controller();
        assert_eq!(c.state(), SessionState::Idle);
        c.on_input("B");
        assert_eq!(c.state(), SessionState::Typing);
    }

    #[test]
    fn short_query_clears_suggestions_without_arming() {
        let mut c = controller();
        let effects = c.on_input("Bl");
        let g = match effects.as_slice() {
            [Effect::CancelSuggestions, Effect::ArmDebounce { generation }] => *generation,
            other => panic!("unexpected effects {other:?}"),
        };
        let fetch = c.on_debounce_elapsed(g);
        let g = fetch_generation(&fetch);
        assert!(c.on_suggestions(g, Ok(vec![suggestion("Blinding Lights", "The Weeknd")])));
        assert!(c.panel_visible());

        let effects = c.on_input(" B ");
        assert_eq!(effects, vec![Effect::CancelSuggestions]);
        assert!(c.suggestions().is_empty());
        assert!(!c.panel_visible());
    }

    #[test]
    fn stale_debounce_is_ignored() {
        let mut c = controller();
        c.on_input("Bli");
        let old = c.generation();
        c.on_input("Blin");
        assert!(c.on_debounce_elapsed(old).is_empty());
        assert_eq!(c.state(), SessionState::Typing);
    }

    #[test]
    fn fetch_uses_trimmed_query_and_configured_cap() {
        let mut c = controller();
        c.on_input("  Blinding ");
        let effects = c.on_debounce_elapsed(c.generation());
        assert_eq!(
            effects,
            vec![Effect::FetchSuggestions {
                generation: c.generation(),
                prefix: "Blinding".to_string(),
                max_results: 5,
            }]
        );
        assert_eq!(c.state(), SessionState::SuggestionsLoading);
    }

    #[test]
    fn superseded_fetch_never_lands() {
        let mut c = controller();
        c.on_input("Blin");
        let a = fetch_generation(&c.on_debounce_elapsed(c.generation()));

        c.on_input("Blind");
        let b = fetch_generation(&c.on_debounce_elapsed(c.generation()));

        assert!(c.on_suggestions(b, Ok(vec![suggestion("Blind", "B")])));
        assert!(!c.on_suggestions(a, Ok(vec![suggestion("Blin", "A")])));
        assert_eq!(c.suggestions(), &[suggestion("Blind", "B")]);
    }

    #[test]
    fn empty_result_returns_to_typing() {
        let mut c = controller();
        c.on_input("Zzz");
        let g = fetch_generation(&c.on_debounce_elapsed(c.generation()));
        assert!(c.on_suggestions(g, Ok(Vec::new())));
        assert_eq!(c.state(), SessionState::Typing);
        assert!(!c.panel_visible());
    }

    #[test]
    fn fetch_failure_degrades_to_no_suggestions() {
        let mut c = controller();
        c.on_input("Blinding");
        let g = fetch_generation(&c.on_debounce_elapsed(c.generation()));
        assert!(c.on_suggestions(g, Err(RequestError::Network("refused".to_string()))));
        assert!(c.suggestions().is_empty());
        assert_eq!(c.state(), SessionState::Typing);
        assert!(c.error().is_none());
    }

    #[test]
    fn suggestions_are_capped() {
        let mut c = controller();
        c.on_input("Song");
        let g = fetch_generation(&c.on_debounce_elapsed(c.generation()));
        let many = (0..8).map(|i| suggestion(&format!("Song {i}"), "A")).collect();
        c.on_suggestions(g, Ok(many));
        assert_eq!(c.suggestions().len(), 5);
        assert_eq!(c.state(), SessionState::SuggestionsShown);
    }

    #[test]
    fn selecting_rewrites_query_without_fetch() {
        let mut c = controller();
        c.on_input("Blinding");
        let g = fetch_generation(&c.on_debounce_elapsed(c.generation()));
        c.on_suggestions(
            g,
            Ok(vec![
                suggestion("Blinding Lights", "The Weeknd"),
                suggestion("Blinding Lights", "Cover Band"),
            ]),
        );

        let effects = c.select_suggestion(1);
        assert_eq!(effects, vec![Effect::CancelSuggestions]);
        assert_eq!(c.query(), "Blinding Lights - Cover Band");
        assert!(!c.panel_visible());
        assert_eq!(c.state(), SessionState::Typing);
    }

    #[test]
    fn selecting_out_of_range_or_hidden_is_noop() {
        let mut c = controller();
        assert!(c.select_suggestion(0).is_empty());

        c.on_input("Blinding");
        let g = fetch_generation(&c.on_debounce_elapsed(c.generation()));
        c.on_suggestions(g, Ok(vec![suggestion("Blinding Lights", "The Weeknd")]));
        assert!(c.select_suggestion(3).is_empty());
        assert_eq!(c.query(), "Blinding");
    }

    #[test]
    fn dismiss_hides_panel_until_next_keystroke() {
        let mut c = controller();
        c.on_input("Blinding");
        let g = fetch_generation(&c.on_debounce_elapsed(c.generation()));
        c.on_suggestions(g, Ok(vec![suggestion("Blinding Lights", "The Weeknd")]));

        c.dismiss_panel();
        assert!(!c.panel_visible());
        assert_eq!(c.state(), SessionState::Typing);

        // Same trimmed query: the set is still current.
        c.on_input("Blinding ");
        assert!(c.panel_visible());

        c.on_input("Blinding L");
        assert!(!c.panel_visible());
        assert!(c.suggestions().is_empty());
    }

    #[test]
    fn new_query_drops_suggestions_for_previous_one() {
        let mut c = controller();
        c.on_input("Blinding");
        let g = fetch_generation(&c.on_debounce_elapsed(c.generation()));
        c.on_suggestions(g, Ok(vec![suggestion("Blinding Lights", "The Weeknd")]));
        assert!(c.panel_visible());

        c.on_input("Shape");
        assert!(c.suggestions().is_empty());
        assert!(!c.panel_visible());
        assert_eq!(c.state(), SessionState::Typing);
    }

    #[test]
    fn keystroke_after_commit_does_not_reopen_old_panel() {
        let mut c = controller();
        c.on_input("Shape");
        let g = fetch_generation(&c.on_debounce_elapsed(c.generation()));
        c.on_suggestions(g, Ok(vec![suggestion("Shape of You", "Ed Sheeran")]));

        c.commit();
        assert!(c.suggestions().is_empty());
        c.on_commit_result(Err(RequestError::Service {
            status: 404,
            detail: Some("song not found".to_string()),
        }));

        let effects = c.on_input("Levitating");
        assert_eq!(
            effects,
            vec![
                Effect::CancelSuggestions,
                Effect::ArmDebounce {
                    generation: c.generation()
                },
            ]
        );
        assert!(!c.panel_visible());
        assert!(c.suggestions().is_empty());
        assert_eq!(c.state(), SessionState::Typing);
    }

    #[test]
    fn blank_commit_is_noop() {
        let mut c = controller();
        c.on_input("   ");
        let before = c.state();
        assert!(c.commit().is_empty());
        assert_eq!(c.state(), before);
        assert!(!c.is_committing());
    }

    #[test]
    fn second_commit_while_pending_is_ignored() {
        let mut c = controller();
        c.on_input("Shape of You");
        let effects = c.commit_with(AlgorithmVariant::Heap);
        assert_eq!(
            effects,
            vec![
                Effect::CancelSuggestions,
                Effect::Commit {
                    query: "Shape of You".to_string(),
                    top_k: 3,
                    algorithm: AlgorithmVariant::Heap,
                },
            ]
        );
        assert_eq!(c.state(), SessionState::Committing);
        assert!(c.commit().is_empty());
    }

    #[test]
    fn commit_orphans_in_flight_suggestions() {
        let mut c = controller();
        c.on_input("Shape");
        let g = fetch_generation(&c.on_debounce_elapsed(c.generation()));
        c.commit();

        assert!(!c.on_suggestions(g, Ok(vec![suggestion("Shape of You", "Ed Sheeran")])));
        assert!(!c.panel_visible());
        assert_eq!(c.state(), SessionState::Committing);
    }

    #[test]
    fn successful_commit_replaces_result() {
        let mut c = controller();
        c.on_input("Shape of You");
        c.commit();
        c.on_commit_result(Ok(recommend_response(0.88)));

        assert_eq!(c.state(), SessionState::ResultShown);
        let committed = c.committed().unwrap();
        assert_eq!(committed.searched_artist, "Ed Sheeran");
        assert_eq!(committed.matches[0].percent(), 88);
        assert_eq!(committed.algorithm, AlgorithmVariant::Heap);

        c.commit_with(AlgorithmVariant::Hashtable);
        c.on_commit_result(Ok(recommend_response(0.5)));
        let committed = c.committed().unwrap();
        assert_eq!(committed.matches[0].percent(), 50);
        assert_eq!(committed.algorithm, AlgorithmVariant::Hashtable);
    }

    #[test]
    fn failed_commit_keeps_prior_result() {
        let mut c = controller();
        c.on_input("Shape of You");
        c.commit();
        c.on_commit_result(Ok(recommend_response(0.88)));
        let prior = c.committed().cloned();

        c.on_input("Nope");
        c.commit();
        c.on_commit_result(Err(RequestError::Service {
            status: 404,
            detail: Some("song not found".to_string()),
        }));

        assert_eq!(c.state(), SessionState::Error);
        assert_eq!(c.error(), Some("song not found"));
        assert_eq!(c.committed().cloned(), prior);

        // retry clears the message while pending
        c.commit();
        assert!(c.error().is_none());
        assert_eq!(c.state(), SessionState::Committing);
    }

    #[test]
    fn typing_during_commit_keeps_committing_state() {
        let mut c = controller();
        c.on_input("Shape of You");
        c.commit();
        let effects = c.on_input("Shape of You2");
        assert!(effects.contains(&Effect::ArmDebounce {
            generation: c.generation()
        }));
        assert_eq!(c.state(), SessionState::Committing);

        c.on_commit_result(Ok(recommend_response(0.9)));
        assert_eq!(c.state(), SessionState::ResultShown);
    }
}
