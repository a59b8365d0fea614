use std::fmt::Write;

use melodymatchr_session::{MatchRow, SessionState, SessionView};

const BAR_CELLS: usize = 20;

pub(crate) fn render_view(view: &SessionView) -> String {
    let mut out = String::new();

    let status = match view.state {
        SessionState::Idle => "idle",
        SessionState::Typing => "typing",
        SessionState::SuggestionsLoading => "loading suggestions",
        SessionState::SuggestionsShown => "suggestions",
        SessionState::Committing => "searching...",
        SessionState::ResultShown => "results",
        SessionState::Error => "error",
    };
    let _ = writeln!(out, "> {}  [{status}, {}]", view.query, view.algorithm);

    if view.panel_visible {
        for (idx, s) in view.suggestions.iter().enumerate() {
            let _ = writeln!(out, "    {}) {} - {}", idx + 1, s.name, s.artist);
        }
    }

    if let Some(error) = &view.error {
        let _ = writeln!(out, "  error: {error}");
    }

    if let Some(result) = &view.result {
        let _ = writeln!(
            out,
            "  Top {} recommendations for \"{}\" by {} ({})",
            result.rows.len(),
            result.searched_song,
            result.searched_artist,
            result.algorithm
        );
        for row in &result.rows {
            let _ = writeln!(out, "{}", render_row(row));
        }
    }

    out
}

fn render_row(row: &MatchRow) -> String {
    let filled = ((row.bar_width / 100.0) * BAR_CELLS as f64).round() as usize;
    let filled = filled.min(BAR_CELLS);
    format!(
        "  {:>2}. {} - {}  {:>3}% match  [{}{}]",
        row.rank,
        row.name,
        row.artist,
        row.percent,
        "#".repeat(filled),
        ".".repeat(BAR_CELLS - filled)
    )
}
