//! View Model Projection
//!
//! Pure `state -> ViewModel` projection. Nothing here performs I/O, so
//! the whole view can be checked without a rendering environment.

use chrono::{DateTime, NaiveDate};

use crate::api::{MarketSummary, PlatformStats};
use crate::session::Session;
use crate::view::{Modal, Notice, ViewState};

/// Borrowed snapshot of everything the projection reads
#[derive(Debug, Clone, Copy)]
pub struct ViewSource<'a> {
    pub state: &'a ViewState,
    pub session: &'a Session,
    pub stats: Option<&'a PlatformStats>,
    pub markets: &'a [MarketSummary],
    pub modal: Option<Modal>,
    pub notice: Option<&'a Notice>,
    pub health_url: &'a str,
}

/// Complete description of one rendered frame
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub state: ViewState,
    pub nav: NavModel,
    /// Absent while loading or on the error screen
    pub hero: Option<HeroModel>,
    pub stats: Option<StatsModel>,
    pub markets: Vec<MarketCard>,
    /// Admins get the "New Market" entry next to the sort buttons
    pub can_create_market: bool,
    pub modal: Option<Modal>,
    pub notice: Option<Notice>,
    pub health_url: String,
}

/// Navigation bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavModel {
    pub logged_in: bool,
    pub phone: Option<String>,
    pub balance: Option<String>,
    pub show_admin_panel: bool,
}

/// Hero call-to-action buttons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroModel {
    pub primary_action: &'static str,
    pub secondary_action: &'static str,
}

/// Platform overview counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsModel {
    pub active_markets: u64,
    pub total_trades: u64,
    pub total_volume: String,
    pub total_markets: u64,
}

/// One market card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketCard {
    pub id: String,
    pub category: String,
    pub question: String,
    pub ends: Option<String>,
    pub yes_percent: String,
    pub no_percent: String,
    pub volume_yes: String,
    pub volume_no: String,
    pub total_volume: String,
    pub trade_count: u64,
    /// Buy buttons are disabled for anonymous visitors
    pub can_trade: bool,
}

/// Project coordinator state into a [`ViewModel`]
pub fn project(source: &ViewSource<'_>) -> ViewModel {
    let user = source.session.user();
    let logged_in = *source.state == ViewState::Authenticated && user.is_some();
    let is_admin = logged_in && user.is_some_and(|u| u.is_admin());

    let nav = NavModel {
        logged_in,
        phone: user.filter(|_| logged_in).map(|u| u.phone.clone()),
        balance: user.filter(|_| logged_in).map(|u| format_ksh(u.balance)),
        show_admin_panel: is_admin,
    };

    let main_view = matches!(
        source.state,
        ViewState::Anonymous | ViewState::Authenticated
    );

    let hero = main_view.then(|| {
        if logged_in {
            HeroModel {
                primary_action: "Start Trading",
                secondary_action: "Add Funds",
            }
        } else {
            HeroModel {
                primary_action: "Get Started Free",
                secondary_action: "Login to Trade",
            }
        }
    });

    let stats = source.stats.filter(|_| main_view).map(|stats| StatsModel {
        active_markets: stats.platform.active_markets,
        total_trades: stats.platform.total_trades,
        total_volume: format_ksh(stats.platform.total_volume.round()),
        total_markets: stats.platform.total_markets,
    });

    let markets = if main_view {
        source
            .markets
            .iter()
            .map(|market| market_card(market, logged_in))
            .collect()
    } else {
        Vec::new()
    };

    ViewModel {
        state: source.state.clone(),
        nav,
        hero,
        stats,
        markets,
        can_create_market: is_admin,
        modal: source.modal,
        notice: source.notice.cloned(),
        health_url: source.health_url.to_string(),
    }
}

fn market_card(market: &MarketSummary, can_trade: bool) -> MarketCard {
    let probability = if market.probability.is_consistent() {
        market.probability
    } else {
        tracing::warn!(
            market_id = %market.id,
            yes = market.probability.yes_probability,
            no = market.probability.no_probability,
            "Market probabilities do not sum to 1, normalizing"
        );
        market.probability.normalized()
    };

    MarketCard {
        id: market.id.clone(),
        category: market.category.clone(),
        question: market.question.clone(),
        ends: market.resolution_date.as_deref().map(format_date),
        yes_percent: format_percent(probability.yes_probability),
        no_percent: format_percent(probability.no_probability),
        volume_yes: format_ksh(market.volume_yes),
        volume_no: format_ksh(market.volume_no),
        total_volume: format_ksh(market.total_volume),
        trade_count: market.trade_count,
        can_trade,
    }
}

/// `0.6` -> `"60.0%"`
pub fn format_percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

/// `1500.5` -> `"KSh 1,500.5"`, `50000` -> `"KSh 50,000"`.
/// Up to three fraction digits, trailing zeros dropped.
pub fn format_ksh(amount: f64) -> String {
    if !amount.is_finite() {
        return "KSh 0".to_string();
    }

    let mills = (amount.abs() * 1000.0).round() as u64;
    let sign = if amount < 0.0 && mills > 0 { "-" } else { "" };
    let whole = group_thousands(mills / 1000);

    match mills % 1000 {
        0 => format!("KSh {}{}", sign, whole),
        frac => {
            let frac = format!("{:03}", frac);
            format!("KSh {}{}.{}", sign, whole, frac.trim_end_matches('0'))
        }
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Accepts `YYYY-MM-DD` or RFC 3339; anything else is shown verbatim
fn format_date(raw: &str) -> String {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()));

    match date {
        Some(date) => date.format("%-d %b %Y").to_string(),
        None => raw.to_string(),
    }
}
