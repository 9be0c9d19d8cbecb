//! # predict-client
//!
//! Session and view-state client for the KenyaPolitics Predict
//! prediction-market API.
//!
//! ## Modules
//!
//! - [`api`]: REST client for the backend (`MarketApi`, `ApiClient`)
//! - [`session`]: in-memory session and the persisted token slot
//! - [`view`]: view state machine, view-model projection and renderers
//! - [`coordinator`]: keeps token, user and view consistent with the server
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use predict_client::{Config, Coordinator, TerminalRenderer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let coordinator = Coordinator::from_config(&config, Arc::new(TerminalRenderer::new()))?;
//!
//!     // Validate any saved token and render the home view
//!     let report = coordinator.initialize().await;
//!     println!("View: {}", report.view);
//!
//!     let notice = coordinator.login("0712345678", "password123").await;
//!     println!("{}", notice.message());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod coordinator;
pub mod session;
pub mod view;

// Re-export top-level types for convenience
pub use api::{
    ApiClient, ApiError, ApiResult, MarketApi, MarketSummary, PlatformStats, Probability, Role,
    User,
};

pub use config::{Config, ConfigError, LoggingConfig};

pub use coordinator::{
    Command, CommandError, Coordinator, CoordinatorConfig, DispatchOutcome, InitReport,
    MarketsLoad,
};

pub use session::{LocalStorage, MemoryStorage, Session, StorageError, TokenStore};

pub use view::{
    render_text, FrameRecorder, MarketSort, Modal, Notice, Renderer, TerminalRenderer, ViewModel,
    ViewState,
};
