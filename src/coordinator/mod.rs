//! Session/View Coordinator
//!
//! Keeps the persisted token, the in-memory [`Session`] and the rendered
//! view consistent with what the server reports.
//!
//! ## Flow
//!
//! 1. `initialize` fetches platform stats (failure -> Error view)
//! 2. A persisted token is validated against `/api/user/profile`
//! 3. The main view is rendered as Anonymous or Authenticated
//! 4. Market listings are refreshed on a best-effort basis
//!
//! Every public operation absorbs its own errors and maps them to a view
//! state, a [`Notice`] or a [`MarketsLoad`]; nothing propagates out.
//!
//! Overlapping calls are ordered by generation counters: a response that
//! arrives after a newer call started is dropped without touching state.

mod command;

pub use command::{Command, CommandError, DispatchOutcome};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::api::{
    ApiClient, ApiError, ApiResult, LoginData, MarketApi, MarketSummary, PlatformStats, User,
};
use crate::config::Config;
use crate::session::{LocalStorage, Session, TokenStore};
use crate::view::{
    project, MarketSort, Modal, Notice, Renderer, ViewModel, ViewSource, ViewState,
};

/// Tunables for the coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// `limit` sent with market listing requests
    pub markets_page_size: u32,
    /// Keep the persisted token when the profile check fails transiently
    pub keep_session_on_transient_error: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            markets_page_size: 6,
            keep_session_on_transient_error: true,
        }
    }
}

impl CoordinatorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            markets_page_size: config.api.markets_page_size,
            keep_session_on_transient_error: config.session.keep_session_on_transient_error,
        }
    }
}

/// Result of a best-effort market listing refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketsLoad {
    /// Markets region replaced with this many entries
    Loaded(usize),
    /// Request failed; previous markets are still shown
    Failed(String),
    /// A newer refresh started before this one finished
    Superseded,
}

/// What an `initialize` call ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    /// View state once the call returned
    pub view: ViewState,
    /// Outcome of the trailing market refresh, if one ran
    pub markets: Option<MarketsLoad>,
    /// A newer `initialize` took over; this call changed nothing
    pub superseded: bool,
}

/// Everything the view is projected from
#[derive(Debug, Default)]
struct CoordinatorState {
    view: ViewState,
    session: Session,
    stats: Option<PlatformStats>,
    markets: Vec<MarketSummary>,
    modal: Option<Modal>,
    notice: Option<Notice>,
}

impl CoordinatorState {
    fn project(&self, health_url: &str) -> ViewModel {
        project(&ViewSource {
            state: &self.view,
            session: &self.session,
            stats: self.stats.as_ref(),
            markets: &self.markets,
            modal: self.modal,
            notice: self.notice.as_ref(),
            health_url,
        })
    }
}

/// Owns the session and drives rendering
#[derive(Clone)]
pub struct Coordinator {
    api: Arc<dyn MarketApi>,
    storage: Arc<dyn TokenStore>,
    renderer: Arc<dyn Renderer>,
    state: Arc<RwLock<CoordinatorState>>,
    init_generation: Arc<AtomicU64>,
    markets_generation: Arc<AtomicU64>,
    /// Bumped by login and logout; a profile check that straddles one is moot
    session_epoch: Arc<AtomicU64>,
    health_url: Arc<str>,
    config: CoordinatorConfig,
}

impl Coordinator {
    /// Create a coordinator with an empty session in the Loading state
    pub fn new(
        api: Arc<dyn MarketApi>,
        storage: Arc<dyn TokenStore>,
        renderer: Arc<dyn Renderer>,
        config: CoordinatorConfig,
    ) -> Self {
        let health_url = Arc::from(api.health_url());
        Self {
            api,
            storage,
            renderer,
            state: Arc::new(RwLock::new(CoordinatorState::default())),
            init_generation: Arc::new(AtomicU64::new(0)),
            markets_generation: Arc::new(AtomicU64::new(0)),
            session_epoch: Arc::new(AtomicU64::new(0)),
            health_url,
            config,
        }
    }

    /// Wire up the HTTP client and on-disk storage from configuration
    pub fn from_config(config: &Config, renderer: Arc<dyn Renderer>) -> ApiResult<Self> {
        let api = Arc::new(ApiClient::new(&config.api)?);
        let storage = Arc::new(LocalStorage::new(&config.storage.data_dir));
        Ok(Self::new(
            api,
            storage,
            renderer,
            CoordinatorConfig::from_config(config),
        ))
    }

    // ============================================
    // Operations
    // ============================================

    /// Reconcile persisted credentials with the server and render.
    ///
    /// Also serves as the manual retry out of the Error view.
    pub async fn initialize(&self) -> InitReport {
        let generation = self.init_generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, "Initializing view");

        self.apply(Some((&*self.init_generation, generation)), |state| {
            state.view = ViewState::Loading;
        })
        .await;

        let stats = match self.api.stats().await {
            Ok(stats) => stats,
            Err(e) => {
                let failed = self
                    .apply(Some((&*self.init_generation, generation)), |state| {
                        state.view = ViewState::bootstrap_error();
                        state.stats = None;
                        state.markets.clear();
                    })
                    .await;

                if failed.is_none() {
                    return self.superseded().await;
                }
                tracing::error!(error = %e, "Failed to load platform data");
                return InitReport {
                    view: ViewState::bootstrap_error(),
                    markets: None,
                    superseded: false,
                };
            }
        };

        let epoch = self.session_epoch.load(Ordering::SeqCst);
        let validation = match self.current_token().await {
            Some(token) => {
                let profile = self.api.profile(&token).await;
                self.validate(token, profile)
            }
            None => Validation::NoToken,
        };

        let view = self
            .apply(Some((&*self.init_generation, generation)), |state| {
                // A login or logout while the check was in flight wins
                if self.session_epoch.load(Ordering::SeqCst) == epoch {
                    state.session = validation.session();
                } else {
                    tracing::debug!("Session changed during validation");
                }
                state.view = if state.session.is_authenticated() {
                    ViewState::Authenticated
                } else {
                    ViewState::Anonymous
                };
                state.markets = stats.recent_markets.clone();
                state.stats = Some(stats);
                state.view.clone()
            })
            .await;

        let Some(view) = view else {
            return self.superseded().await;
        };
        if let Validation::Rejected(token) = &validation {
            self.discard_token(token, epoch);
        }
        tracing::info!(state = %view, "View ready");

        let markets = self.load_markets(MarketSort::Newest).await;

        InitReport {
            view: self.view_state().await,
            markets: Some(markets),
            superseded: false,
        }
    }

    /// Authenticate, persist the token and refresh the whole view
    pub async fn login(&self, phone: &str, password: &str) -> Notice {
        if phone.trim().is_empty() {
            return self
                .notify(Notice::Error("Phone number is required".to_string()))
                .await;
        }

        match self.api.login(phone.trim(), password).await {
            Ok(LoginData { token, user }) => {
                self.session_epoch.fetch_add(1, Ordering::SeqCst);
                // The in-memory session still carries the token for this run
                if let Err(e) = self.storage.save_token(&token) {
                    tracing::warn!(error = %e, "Failed to persist session token");
                }
                tracing::info!(user_id = %user.id, "Logged in");

                self.apply(None, |state| {
                    state.session = Session::authenticated(token, user);
                    state.modal = None;
                    state.notice = None;
                })
                .await;

                self.initialize().await;
                self.notify(Notice::Success("Login successful!".to_string()))
                    .await
            }
            Err(e) => {
                tracing::debug!(error = %e, "Login failed");
                self.notify(Notice::Error(action_error("Login", &e))).await
            }
        }
    }

    /// Create an account; the user is pointed at the login form afterwards
    pub async fn register(&self, phone: &str, mpesa_name: &str, password: &str) -> Notice {
        match self.api.register(phone.trim(), mpesa_name.trim(), password).await {
            Ok(()) => {
                tracing::info!("Registration accepted");
                let notice = Notice::Success("Registration successful! Please login.".to_string());
                self.apply(None, |state| {
                    state.modal = Some(Modal::Login);
                    state.notice = Some(notice.clone());
                })
                .await;
                notice
            }
            Err(e) => {
                tracing::debug!(error = %e, "Registration failed");
                self.notify(Notice::Error(action_error("Registration", &e)))
                    .await
            }
        }
    }

    /// Drop the session everywhere. Calling it again changes nothing.
    pub async fn logout(&self) {
        self.session_epoch.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.storage.clear_token() {
            tracing::warn!(error = %e, "Failed to clear persisted token");
        }

        self.apply(None, |state| {
            state.session.clear();
            if state.view == ViewState::Authenticated {
                state.view = ViewState::Anonymous;
            }
            state.modal = None;
            state.notice = None;
        })
        .await;
        tracing::info!("Logged out");
    }

    /// Refresh the markets region. Failures keep the previous content.
    pub async fn load_markets(&self, sort: MarketSort) -> MarketsLoad {
        let generation = self.markets_generation.fetch_add(1, Ordering::SeqCst) + 1;

        match self.api.markets(&sort, self.config.markets_page_size).await {
            Ok(markets) => {
                let count = markets.len();
                let applied = self
                    .apply(Some((&*self.markets_generation, generation)), |state| {
                        state.markets = markets;
                    })
                    .await;

                match applied {
                    Some(()) => {
                        tracing::debug!(sort = %sort, count, "Markets loaded");
                        MarketsLoad::Loaded(count)
                    }
                    None => MarketsLoad::Superseded,
                }
            }
            Err(e) => {
                if self.markets_generation.load(Ordering::SeqCst) != generation {
                    return MarketsLoad::Superseded;
                }
                tracing::warn!(sort = %sort, error = %e, "Failed to load markets");
                MarketsLoad::Failed(e.to_string())
            }
        }
    }

    pub async fn show_login_modal(&self) {
        self.apply(None, |state| state.modal = Some(Modal::Login))
            .await;
    }

    pub async fn show_register_modal(&self) {
        self.apply(None, |state| state.modal = Some(Modal::Register))
            .await;
    }

    pub async fn close_modal(&self) {
        self.apply(None, |state| state.modal = None).await;
    }

    /// Gate for actions that need an account (trading, deposits).
    /// Opens the login modal and returns `false` when nobody is signed in.
    pub async fn require_login(&self) -> bool {
        if self.state.read().await.session.is_authenticated() {
            return true;
        }
        self.show_login_modal().await;
        false
    }

    // ============================================
    // Snapshots
    // ============================================

    pub async fn view_state(&self) -> ViewState {
        self.state.read().await.view.clone()
    }

    pub async fn session(&self) -> Session {
        self.state.read().await.session.clone()
    }

    pub async fn markets(&self) -> Vec<MarketSummary> {
        self.state.read().await.markets.clone()
    }

    pub async fn modal(&self) -> Option<Modal> {
        self.state.read().await.modal
    }

    pub async fn notice(&self) -> Option<Notice> {
        self.state.read().await.notice.clone()
    }

    /// Current frame, as the renderer last saw it
    pub async fn view_model(&self) -> ViewModel {
        self.state.read().await.project(&self.health_url)
    }

    // ============================================
    // Internals
    // ============================================

    /// Mutate state and re-render, unless `ticket` has been superseded
    async fn apply<R>(
        &self,
        ticket: Option<(&AtomicU64, u64)>,
        f: impl FnOnce(&mut CoordinatorState) -> R,
    ) -> Option<R> {
        let mut state = self.state.write().await;

        if let Some((counter, generation)) = ticket {
            let current = counter.load(Ordering::SeqCst);
            if current != generation {
                tracing::debug!(generation, current, "Discarding stale response");
                return None;
            }
        }

        let result = f(&mut state);
        self.renderer.render(&state.project(&self.health_url));
        Some(result)
    }

    async fn notify(&self, notice: Notice) -> Notice {
        self.apply(None, |state| state.notice = Some(notice.clone()))
            .await;
        notice
    }

    async fn superseded(&self) -> InitReport {
        InitReport {
            view: self.view_state().await,
            markets: None,
            superseded: true,
        }
    }

    /// Persisted token, falling back to the in-memory one when storage has
    /// none (an unwritable data dir) or cannot be read
    async fn current_token(&self) -> Option<String> {
        match self.storage.load_token() {
            Ok(Some(token)) => return Some(token),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to read persisted token"),
        }
        self.state.read().await.session.token().map(str::to_string)
    }

    /// Turn a profile check into the session it implies
    fn validate(&self, token: String, profile: ApiResult<User>) -> Validation {
        match profile {
            Ok(user) => Validation::Valid(token, user),
            Err(e) if e.is_transient() && self.config.keep_session_on_transient_error => {
                tracing::warn!(error = %e, "Could not validate session, keeping token");
                Validation::Unverified(token)
            }
            Err(e) => {
                tracing::info!(error = %e, "Session invalidated");
                Validation::Rejected(token)
            }
        }
    }

    /// Remove a rejected token from storage unless a newer session replaced it
    fn discard_token(&self, token: &str, epoch: u64) {
        if self.session_epoch.load(Ordering::SeqCst) != epoch {
            return;
        }
        match self.storage.load_token() {
            Ok(Some(stored)) if stored == token => {
                if let Err(e) = self.storage.clear_token() {
                    tracing::warn!(error = %e, "Failed to clear persisted token");
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to read persisted token"),
        }
    }
}

/// Outcome of checking a token against the profile endpoint
#[derive(Debug)]
enum Validation {
    NoToken,
    Valid(String, User),
    /// Server unreachable; keep the token for the next attempt
    Unverified(String),
    Rejected(String),
}

impl Validation {
    fn session(&self) -> Session {
        match self {
            Validation::Valid(token, user) => Session::authenticated(token.clone(), user.clone()),
            Validation::Unverified(token) => Session::unverified(token.clone()),
            Validation::NoToken | Validation::Rejected(_) => Session::anonymous(),
        }
    }
}

/// `"Login failed: <server message>"` or `"Login error: <transport error>"`
fn action_error(action: &str, err: &ApiError) -> String {
    match err {
        ApiError::Rejected(_) | ApiError::Status { .. } => {
            format!("{} failed: {}", action, err.user_message())
        }
        other => format!("{} error: {}", action, other),
    }
}
