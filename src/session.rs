use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ViewerConfig;
use crate::error::LoadError;
use crate::format::{detect_format, ModelFormat};
use crate::model::LoadedModel;
use crate::normalize::{fit_transform, FitTransform};
use crate::parsers::FormatParser;
use crate::source::ModelSource;
use crate::stats::{calculate_model_stats, ModelStats};

/// Identifies one load attempt. Completions carrying an older token are discarded.
pub type SessionToken = u64;

/// A successfully decoded model with the values derived from it.
#[derive(Clone)]
pub struct LoadOutcome {
    pub model: Arc<LoadedModel>,
    pub stats: ModelStats,
    pub transform: FitTransform,
}

impl LoadOutcome {
    pub fn compute(model: LoadedModel, target_size: f32) -> Self {
        let stats = calculate_model_stats(&model.scene);
        let transform = fit_transform(Some(&model), target_size);

        Self {
            model: Arc::new(model),
            stats,
            transform,
        }
    }
}

#[derive(Clone)]
pub enum SessionState {
    Idle,
    Loading {
        token: SessionToken,
        file_name: String,
        format: ModelFormat,
    },
    Loaded(LoadOutcome),
    Failed {
        token: SessionToken,
        error: LoadError,
    },
}

/// What the display layer shows for the current selection.
#[derive(Clone, Default)]
pub struct SessionSnapshot {
    pub model: Option<Arc<LoadedModel>>,
    pub stats: ModelStats,
    pub transform: FitTransform,
    pub error: Option<String>,
    pub is_loading: bool,
    pub format: Option<ModelFormat>,
}

/// Load state for one file selection.
pub struct LoadSession {
    state: SessionState,
    current_token: SessionToken,
}

impl LoadSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            current_token: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        token == self.current_token
    }

    fn next_token(&mut self) -> SessionToken {
        self.current_token += 1;
        self.current_token
    }

    /// Starts loading a new selection. Any load still in flight becomes stale.
    pub fn begin(&mut self, file_name: impl Into<String>, format: ModelFormat) -> SessionToken {
        let token = self.next_token();
        self.state = SessionState::Loading {
            token,
            file_name: file_name.into(),
            format,
        };
        token
    }

    /// Fails a new selection without decoding it, e.g. for an unsupported extension.
    pub fn fail_immediately(&mut self, file_name: &str, error: LoadError) -> SessionToken {
        log::warn!("Rejected {}: {}", file_name, error);
        let token = self.next_token();
        self.state = SessionState::Failed { token, error };
        token
    }

    /// Applies the result of the load identified by `token`.
    /// Returns `false` and leaves the state untouched if a newer selection exists.
    pub fn complete(
        &mut self,
        token: SessionToken,
        result: Result<LoadOutcome, LoadError>,
    ) -> bool {
        if !self.is_current(token) {
            log::debug!(
                "Discarding stale load result (token {}, current {})",
                token,
                self.current_token
            );
            return false;
        }

        if !matches!(self.state, SessionState::Loading { .. }) {
            return false;
        }

        self.state = match result {
            Ok(outcome) => SessionState::Loaded(outcome),
            Err(error) => SessionState::Failed { token, error },
        };

        true
    }

    /// Drops the selection. In-flight loads become stale.
    pub fn clear(&mut self) {
        self.next_token();
        self.state = SessionState::Idle;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        match &self.state {
            SessionState::Idle => SessionSnapshot::default(),
            SessionState::Loading { .. } => SessionSnapshot {
                is_loading: true,
                ..Default::default()
            },
            SessionState::Loaded(outcome) => SessionSnapshot {
                model: Some(outcome.model.clone()),
                stats: outcome.stats,
                transform: outcome.transform,
                format: Some(outcome.model.format),
                ..Default::default()
            },
            SessionState::Failed { error, .. } => SessionSnapshot {
                error: Some(error.to_string()),
                ..Default::default()
            },
        }
    }
}

impl Default for LoadSession {
    fn default() -> Self {
        Self::new()
    }
}

pub type Decoder =
    Arc<dyn Fn(ModelFormat, &ModelSource) -> Result<LoadedModel, LoadError> + Send + Sync>;

fn format_parser_decoder() -> Decoder {
    Arc::new(|format: ModelFormat, source: &ModelSource| {
        FormatParser::for_format(format).parse(format, source)
    })
}

/// Runs decodes off the async executor and publishes session snapshots.
///
/// Every `select` supersedes the previous one. Decodes are never aborted; their
/// results are dropped by the session if the selection changed meanwhile.
#[derive(Clone)]
pub struct ModelLoader {
    session: Arc<Mutex<LoadSession>>,
    snapshots: Arc<watch::Sender<SessionSnapshot>>,
    decoder: Decoder,
    config: ViewerConfig,
}

impl ModelLoader {
    pub fn new(config: ViewerConfig) -> Self {
        Self::with_decoder(config, format_parser_decoder())
    }

    pub fn with_decoder(config: ViewerConfig, decoder: Decoder) -> Self {
        let (sender, _) = watch::channel(SessionSnapshot::default());

        Self {
            session: Arc::new(Mutex::new(LoadSession::new())),
            snapshots: Arc::new(sender),
            decoder,
            config,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock_session().snapshot()
    }

    fn lock_session(&self) -> MutexGuard<'_, LoadSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &LoadSession) {
        self.snapshots.send_replace(session.snapshot());
    }

    /// Selects `source` as the current file and starts decoding it.
    /// The returned task resolves to `true` if its result was published.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since the decode is spawned onto it.
    pub fn select(&self, source: ModelSource) -> JoinHandle<bool> {
        let format = match detect_format(source.name()) {
            Ok(format) => format,
            Err(error) => {
                let mut session = self.lock_session();
                session.fail_immediately(source.name(), error);
                self.publish(&session);
                return tokio::spawn(async { true });
            }
        };

        let token = {
            let mut session = self.lock_session();
            let token = session.begin(source.name(), format);
            self.publish(&session);
            token
        };

        let loader = self.clone();
        let decoder = self.decoder.clone();
        let target_size = self.config.interactive_size;

        tokio::spawn(async move {
            let file_name = source.name().to_string();
            let decoded = tokio::task::spawn_blocking(move || {
                decoder(format, &source).map(|model| LoadOutcome::compute(model, target_size))
            })
            .await;

            let result = decoded.unwrap_or_else(|join_error| {
                Err(LoadError::ParseFailure {
                    format,
                    cause: format!("decoder task failed: {}", join_error),
                })
            });

            let mut session = loader.lock_session();
            let applied = session.complete(token, result);

            if applied {
                match session.state() {
                    SessionState::Loaded(outcome) => log::info!(
                        "Loaded {} ({}): {} meshes, {} vertices, {} faces",
                        file_name,
                        format,
                        outcome.stats.mesh_count,
                        outcome.stats.vertex_count,
                        outcome.stats.face_count
                    ),
                    SessionState::Failed { error, .. } => {
                        log::warn!("Failed to load {}: {}", file_name, error)
                    }
                    _ => {}
                }
                loader.publish(&session);
            }

            applied
        })
    }

    pub fn clear(&self) {
        let mut session = self.lock_session();
        session.clear();
        self.publish(&session);
    }
}
