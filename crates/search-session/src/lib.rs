//! Incremental song search: debounced autocomplete plus committed,
//! ranked searches against the song-similarity service.

pub mod controller;
pub mod scheduler;
pub mod session;
pub mod view;

pub use controller::{Effect, SessionController, SessionState};
pub use scheduler::Scheduler;
pub use session::{spawn, SearchSession, SessionHandle};
pub use view::{MatchRow, ResultView, SessionView};
