use std::sync::Arc;

use melodymatchr_http_client::{RequestError, SongService};
use models::config::SessionConfig;
use models::{AlgorithmVariant, RecommendResponse, Suggestion};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::controller::{Effect, SessionController};
use crate::scheduler::Scheduler;
use crate::view::SessionView;

#[derive(Debug)]
enum Event {
    Input(String),
    Commit(Option<AlgorithmVariant>),
    SelectSuggestion(usize),
    DismissPanel,
    SetAlgorithm(AlgorithmVariant),
    DebounceElapsed {
        generation: u64,
    },
    SuggestionsResolved {
        generation: u64,
        result: Result<Vec<Suggestion>, RequestError>,
    },
    CommitResolved(Result<RecommendResponse, RequestError>),
    Shutdown,
}

/// Front-end side of a running session. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<Event>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    pub fn input(&self, text: impl Into<String>) {
        self.send(Event::Input(text.into()));
    }

    /// Commit with the session's current algorithm variant.
    pub fn commit(&self) {
        self.send(Event::Commit(None));
    }

    pub fn commit_with(&self, algorithm: AlgorithmVariant) {
        self.send(Event::Commit(Some(algorithm)));
    }

    pub fn select_suggestion(&self, index: usize) {
        self.send(Event::SelectSuggestion(index));
    }

    pub fn dismiss_panel(&self) {
        self.send(Event::DismissPanel);
    }

    pub fn set_algorithm(&self, algorithm: AlgorithmVariant) {
        self.send(Event::SetAlgorithm(algorithm));
    }

    pub fn shutdown(&self) {
        self.send(Event::Shutdown);
    }

    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    fn send(&self, event: Event) {
        if self.events.send(event).is_err() {
            tracing::debug!("search session already stopped");
        }
    }
}

/// Event loop for one search session.
///
/// Every input, timer firing and network completion is an [`Event`] on a
/// single queue, and each is handled to completion before the next one is
/// taken, so controller state is never observed half-updated.
pub struct SearchSession<S> {
    controller: SessionController,
    scheduler: Scheduler,
    service: Arc<S>,
    events_tx: mpsc::WeakUnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    view_tx: watch::Sender<SessionView>,
}

impl<S: SongService> SearchSession<S> {
    pub fn new(service: Arc<S>, config: SessionConfig) -> (Self, SessionHandle) {
        let controller = SessionController::new(config);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(controller.view());

        let session = Self {
            controller,
            scheduler: Scheduler::new(),
            service,
            events_tx: events_tx.downgrade(),
            events_rx,
            view_tx,
        };
        let handle = SessionHandle {
            events: events_tx,
            view: view_rx,
        };
        (session, handle)
    }

    /// Processes events until [`SessionHandle::shutdown`] is called or every
    /// handle is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.events_rx.recv().await {
            if matches!(event, Event::Shutdown) {
                break;
            }
            self.handle(event);
            self.view_tx.send_replace(self.controller.view());
        }
        self.scheduler.cancel_pending();
        tracing::debug!("search session stopped");
    }

    fn handle(&mut self, event: Event) {
        let effects = match event {
            Event::Input(text) => self.controller.on_input(text),
            Event::Commit(None) => self.controller.commit(),
            Event::Commit(Some(algorithm)) => self.controller.commit_with(algorithm),
            Event::SelectSuggestion(index) => self.controller.select_suggestion(index),
            Event::DismissPanel => {
                self.controller.dismiss_panel();
                Vec::new()
            }
            Event::SetAlgorithm(algorithm) => {
                self.controller.set_algorithm(algorithm);
                Vec::new()
            }
            Event::DebounceElapsed { generation } => {
                self.controller.on_debounce_elapsed(generation)
            }
            Event::SuggestionsResolved { generation, result } => {
                self.controller.on_suggestions(generation, result);
                Vec::new()
            }
            Event::CommitResolved(result) => {
                self.controller.on_commit_result(result);
                Vec::new()
            }
            Event::Shutdown => Vec::new(),
        };

        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        if let Effect::CancelSuggestions = effect {
            self.scheduler.cancel_pending();
            return;
        }

        let Some(sink) = self.events_tx.upgrade() else {
            return;
        };

        match effect {
            Effect::CancelSuggestions => {}
            Effect::ArmDebounce { generation } => {
                let delay = self.controller.config().debounce;
                self.scheduler.arm(delay, move || {
                    let _ = sink.send(Event::DebounceElapsed { generation });
                });
            }
            Effect::FetchSuggestions {
                generation,
                prefix,
                max_results,
            } => {
                let token = self.scheduler.begin_fetch();
                let service = Arc::clone(&self.service);
                tokio::spawn(async move {
                    let result = service
                        .search_by_prefix(&prefix, max_results, &token)
                        .await;
                    let _ = sink.send(Event::SuggestionsResolved { generation, result });
                });
            }
            Effect::Commit {
                query,
                top_k,
                algorithm,
            } => {
                let service = Arc::clone(&self.service);
                tokio::spawn(async move {
                    let result = service.recommend(&query, top_k, algorithm).await;
                    let _ = sink.send(Event::CommitResolved(result));
                });
            }
        }
    }
}

/// Starts a session on the current tokio runtime.
pub fn spawn<S: SongService>(
    service: Arc<S>,
    config: SessionConfig,
) -> (SessionHandle, JoinHandle<()>) {
    let (session, handle) = SearchSession::new(service, config);
    let task = tokio::spawn(session.run());
    (handle, task)
}
