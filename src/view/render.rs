//! Rendering
//!
//! The side-effect half of the view layer. The coordinator hands every
//! new [`ViewModel`] to a [`Renderer`].

use std::fmt::Write as _;
use std::sync::Mutex;

use crate::view::{Modal, Notice, ViewModel, ViewState};

/// Draws a view model somewhere
pub trait Renderer: Send + Sync {
    fn render(&self, view: &ViewModel);
}

/// Holds the latest frame as text and prints it on [`TerminalRenderer::present`]
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    latest: Mutex<Option<String>>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of the most recent frame
    pub fn latest(&self) -> Option<String> {
        self.latest.lock().ok().and_then(|latest| latest.clone())
    }

    /// Print the most recent frame to stdout
    pub fn present(&self) {
        if let Some(text) = self.latest() {
            print!("{}", text);
        }
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, view: &ViewModel) {
        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(render_text(view));
        }
    }
}

/// Keeps every frame in memory
#[derive(Debug, Default)]
pub struct FrameRecorder {
    frames: Mutex<Vec<ViewModel>>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<ViewModel> {
        self.frames
            .lock()
            .map(|frames| frames.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<ViewModel> {
        self.frames
            .lock()
            .ok()
            .and_then(|frames| frames.last().cloned())
    }

    pub fn len(&self) -> usize {
        self.frames.lock().map(|frames| frames.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Renderer for FrameRecorder {
    fn render(&self, view: &ViewModel) {
        if let Ok(mut frames) = self.frames.lock() {
            frames.push(view.clone());
        }
    }
}

/// Text rendering of a frame
pub fn render_text(view: &ViewModel) -> String {
    let mut out = String::new();

    match &view.state {
        ViewState::Loading => {
            out.push_str("Loading...\n");
            return out;
        }
        ViewState::Error { title, message } => {
            let _ = writeln!(out, "!! {}", title);
            let _ = writeln!(out, "{}", message);
            out.push_str("Run `predict home` again to retry.\n");
            return out;
        }
        ViewState::Anonymous | ViewState::Authenticated => {}
    }

    // Navigation
    out.push_str("KenyaPolitics Predict\n");
    if view.nav.logged_in {
        let _ = writeln!(
            out,
            "Signed in as {} | Balance: {}",
            view.nav.phone.as_deref().unwrap_or("-"),
            view.nav.balance.as_deref().unwrap_or("-")
        );
        if view.nav.show_admin_panel {
            out.push_str("Admin Panel available\n");
        }
    } else {
        out.push_str("Not signed in (predict login / predict register)\n");
    }

    if let Some(notice) = &view.notice {
        let marker = if notice.is_error() { "x" } else { "+" };
        let _ = writeln!(out, "[{}] {}", marker, notice.message());
    }

    if let Some(hero) = &view.hero {
        let _ = writeln!(out, "\n[ {} ]  [ {} ]", hero.primary_action, hero.secondary_action);
    }

    if let Some(stats) = &view.stats {
        out.push_str("\nPlatform Overview\n");
        let _ = writeln!(out, "  Active Markets: {}", stats.active_markets);
        let _ = writeln!(out, "  Total Trades:   {}", stats.total_trades);
        let _ = writeln!(out, "  Trading Volume: {}", stats.total_volume);
        let _ = writeln!(out, "  All Markets:    {}", stats.total_markets);
    }

    let _ = writeln!(out, "\nPolitical Markets ({})", view.markets.len());
    if view.can_create_market {
        out.push_str("  (admin: New Market)\n");
    }
    if view.markets.is_empty() {
        out.push_str("  No markets yet\n");
    }
    for card in &view.markets {
        let _ = writeln!(
            out,
            "\n  [{}] {}{}",
            card.category,
            card.question,
            card.ends
                .as_deref()
                .map(|d| format!("  (ends {})", d))
                .unwrap_or_default()
        );
        let _ = writeln!(
            out,
            "    YES {} ({})   NO {} ({})",
            card.yes_percent, card.volume_yes, card.no_percent, card.volume_no
        );
        let _ = writeln!(
            out,
            "    Total volume {} | Trades {} | id {}{}",
            card.total_volume,
            card.trade_count,
            card.id,
            if card.can_trade { "" } else { " | login to trade" }
        );
    }

    match view.modal {
        Some(Modal::Login) => out.push_str("\n> Login: predict login --phone <PHONE> --password <PASSWORD>\n"),
        Some(Modal::Register) => out.push_str(
            "\n> Register: predict register --phone <PHONE> --mpesa-name <NAME> --password <PASSWORD>\n",
        ),
        None => {}
    }

    let _ = writeln!(out, "\nAPI health: {}", view.health_url);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{MarketCard, NavModel};

    fn anonymous_view() -> ViewModel {
        ViewModel {
            state: ViewState::Anonymous,
            nav: NavModel {
                logged_in: false,
                phone: None,
                balance: None,
                show_admin_panel: false,
            },
            hero: None,
            stats: None,
            markets: vec![MarketCard {
                id: "m1".to_string(),
                category: "Politics".to_string(),
                question: "Q?".to_string(),
                ends: Some("1 Dec 2024".to_string()),
                yes_percent: "60.0%".to_string(),
                no_percent: "40.0%".to_string(),
                volume_yes: "KSh 6,000".to_string(),
                volume_no: "KSh 4,000".to_string(),
                total_volume: "KSh 10,000".to_string(),
                trade_count: 12,
                can_trade: false,
            }],
            can_create_market: false,
            modal: Some(Modal::Login),
            notice: Some(Notice::Error("Login failed: Invalid credentials".to_string())),
            health_url: "http://localhost:3000/health".to_string(),
        }
    }

    #[test]
    fn test_render_market_and_notice() {
        let text = render_text(&anonymous_view());

        assert!(text.contains("Political Markets (1)"));
        assert!(text.contains("YES 60.0% (KSh 6,000)"));
        assert!(text.contains("[x] Login failed: Invalid credentials"));
        assert!(text.contains("login to trade"));
        assert!(text.contains("> Login:"));
        assert!(text.contains("http://localhost:3000/health"));
    }

    #[test]
    fn test_render_error_screen() {
        let mut view = anonymous_view();
        view.state = ViewState::bootstrap_error();

        let text = render_text(&view);
        assert!(text.starts_with("!! Service Temporarily Unavailable"));
        assert!(!text.contains("Political Markets"));
    }

    #[test]
    fn test_frame_recorder() {
        let recorder = FrameRecorder::new();
        assert!(recorder.is_empty());

        recorder.render(&anonymous_view());
        recorder.render(&anonymous_view());

        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.last().unwrap().markets.len(), 1);
    }

    #[test]
    fn test_terminal_renderer_keeps_latest() {
        let renderer = TerminalRenderer::new();
        assert_eq!(renderer.latest(), None);

        let mut view = anonymous_view();
        renderer.render(&view);
        view.state = ViewState::Loading;
        renderer.render(&view);

        assert_eq!(renderer.latest().as_deref(), Some("Loading...\n"));
    }
}
