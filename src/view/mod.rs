//! View State
//!
//! Everything the coordinator needs to describe what the user sees:
//!
//! - **ViewState**: Loading / Error / Anonymous / Authenticated
//! - **ViewModel**: pure projection of coordinator state ([`project`])
//! - **Renderer**: the side effect that draws a [`ViewModel`]

mod model;
mod render;

pub use model::{
    format_ksh, format_percent, project, HeroModel, MarketCard, NavModel, StatsModel,
    ViewModel, ViewSource,
};
pub use render::{render_text, FrameRecorder, Renderer, TerminalRenderer};

use std::fmt;
use std::str::FromStr;

/// Title shown when bootstrap data cannot be loaded
pub const ERROR_TITLE: &str = "Service Temporarily Unavailable";

/// Message shown when bootstrap data cannot be loaded
pub const ERROR_MESSAGE: &str = "We're experiencing technical difficulties.";

/// View-level state machine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Loading,
    /// Terminal until the next full initialize
    Error { title: String, message: String },
    Anonymous,
    Authenticated,
}

impl ViewState {
    pub fn bootstrap_error() -> Self {
        ViewState::Error {
            title: ERROR_TITLE.to_string(),
            message: ERROR_MESSAGE.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ViewState::Error { .. })
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewState::Loading => write!(f, "loading"),
            ViewState::Error { .. } => write!(f, "error"),
            ViewState::Anonymous => write!(f, "anonymous"),
            ViewState::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// Dialog currently open over the main view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    Login,
    Register,
}

/// Inline message produced by a user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(msg) | Notice::Error(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

/// Sort order for market listings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MarketSort {
    #[default]
    Newest,
    Volume,
    /// Any other token the server accepts
    Custom(String),
}

impl MarketSort {
    pub fn as_str(&self) -> &str {
        match self {
            MarketSort::Newest => "newest",
            MarketSort::Volume => "volume",
            MarketSort::Custom(token) => token,
        }
    }
}

impl FromStr for MarketSort {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "" | "newest" => MarketSort::Newest,
            "volume" => MarketSort::Volume,
            other => MarketSort::Custom(other.to_string()),
        })
    }
}

impl fmt::Display for MarketSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_sort_parse() {
        assert_eq!("newest".parse::<MarketSort>().unwrap(), MarketSort::Newest);
        assert_eq!("".parse::<MarketSort>().unwrap(), MarketSort::Newest);
        assert_eq!("Volume".parse::<MarketSort>().unwrap(), MarketSort::Volume);
        assert_eq!(
            "ending".parse::<MarketSort>().unwrap(),
            MarketSort::Custom("ending".to_string())
        );
        assert_eq!(MarketSort::default().to_string(), "newest");
    }

    #[test]
    fn test_bootstrap_error() {
        let state = ViewState::bootstrap_error();
        assert!(state.is_error());
        assert_eq!(state.to_string(), "error");
    }
}
