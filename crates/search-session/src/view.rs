use models::{AlgorithmVariant, CommittedResult, Suggestion};

use crate::controller::{SessionController, SessionState};

/// Snapshot handed to whatever renders the session. Carries no behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub query: String,
    pub state: SessionState,
    pub suggestions: Vec<Suggestion>,
    pub panel_visible: bool,
    pub result: Option<ResultView>,
    pub error: Option<String>,
    pub searching: bool,
    pub submit_enabled: bool,
    pub algorithm: AlgorithmVariant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub searched_song: String,
    pub searched_artist: String,
    pub algorithm: AlgorithmVariant,
    pub rows: Vec<MatchRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRow {
    pub rank: usize,
    pub name: String,
    pub artist: String,
    pub percent: u32,
    pub bar_width: f64,
}

impl SessionView {
    pub fn from_controller(controller: &SessionController) -> Self {
        let searching = controller.is_committing();
        Self {
            query: controller.query().to_string(),
            state: controller.state(),
            suggestions: if controller.panel_visible() {
                controller.suggestions().to_vec()
            } else {
                Vec::new()
            },
            panel_visible: controller.panel_visible(),
            result: controller.committed().map(ResultView::from_committed),
            error: controller.error().map(str::to_string),
            searching,
            submit_enabled: !searching && !controller.query().trim().is_empty(),
            algorithm: controller.algorithm(),
        }
    }
}

impl ResultView {
    pub fn from_committed(committed: &CommittedResult) -> Self {
        let rows = committed
            .matches
            .iter()
            .enumerate()
            .map(|(idx, m)| MatchRow {
                rank: idx + 1,
                name: m.name.clone(),
                artist: m.artist.clone(),
                percent: m.percent(),
                bar_width: m.bar_width(),
            })
            .collect();

        Self {
            searched_song: committed.searched_song.clone(),
            searched_artist: committed.searched_artist.clone(),
            algorithm: committed.algorithm,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::config::SessionConfig;
    use models::{MatchResult, RecommendResponse, SearchedSong};

    fn committed_controller() -> SessionController {
        let mut c = SessionController::new(SessionConfig::default());
        c.on_input("Shape of You");
        c.commit();
        c.on_commit_result(Ok(RecommendResponse {
            searched_song: SearchedSong {
                name: "Shape of You".to_string(),
                artist: "Ed Sheeran".to_string(),
            },
            matches: vec![
                MatchResult {
                    id: None,
                    name: "Levitating".to_string(),
                    artist: "Dua Lipa".to_string(),
                    similarity: 0.88,
                },
                MatchResult {
                    id: Some("7".to_string()),
                    name: "Starboy".to_string(),
                    artist: "The Weeknd".to_string(),
                    similarity: 0.85,
                },
            ],
        }));
        c
    }

    #[test]
    fn rows_are_ranked_from_one_with_percentages() {
        let view = committed_controller().view();
        let result = view.result.unwrap();
        assert_eq!(result.searched_song, "Shape of You");
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].rank, 1);
        assert_eq!(result.rows[0].percent, 88);
        assert_eq!(result.rows[1].rank, 2);
        assert!((result.rows[1].bar_width - 85.0).abs() < 1e-9);
    }

    #[test]
    fn submit_disabled_for_blank_or_pending() {
        let mut c = SessionController::new(SessionConfig::default());
        assert!(!c.view().submit_enabled);

        c.on_input("Shape");
        assert!(c.view().submit_enabled);

        c.commit();
        let view = c.view();
        assert!(view.searching);
        assert!(!view.submit_enabled);
    }

    #[test]
    fn hidden_panel_exposes_no_suggestions() {
        let view = committed_controller().view();
        assert!(!view.panel_visible);
        assert!(view.suggestions.is_empty());
    }
}
