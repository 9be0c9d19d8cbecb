//! Command Dispatcher
//!
//! Every user action the view offers, addressable by a stable name.

use thiserror::Error;

use crate::coordinator::{Coordinator, InitReport, MarketsLoad};
use crate::view::{MarketSort, Notice};

/// A user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Initialize,
    Login {
        phone: String,
        password: String,
    },
    Register {
        phone: String,
        mpesa_name: String,
        password: String,
    },
    Logout,
    LoadMarkets(MarketSort),
    ShowLogin,
    ShowRegister,
    CloseModal,
}

/// What running a [`Command`] produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Initialized(InitReport),
    Notice(Notice),
    Markets(MarketsLoad),
    Done,
}

/// Errors building a [`Command`] from an action name
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Action '{action}' is missing argument '{argument}'")]
    MissingArgument {
        action: &'static str,
        argument: &'static str,
    },
}

impl Command {
    /// Names accepted by [`Command::parse`]
    pub const ACTIONS: &'static [&'static str] = &[
        "initialize",
        "login",
        "register",
        "logout",
        "load-markets",
        "show-login",
        "show-register",
        "close-modal",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Command::Initialize => "initialize",
            Command::Login { .. } => "login",
            Command::Register { .. } => "register",
            Command::Logout => "logout",
            Command::LoadMarkets(_) => "load-markets",
            Command::ShowLogin => "show-login",
            Command::ShowRegister => "show-register",
            Command::CloseModal => "close-modal",
        }
    }

    /// Build a command from an action name and positional arguments
    pub fn parse(action: &str, args: &[&str]) -> Result<Self, CommandError> {
        let arg = |index: usize, action: &'static str, argument: &'static str| {
            args.get(index)
                .map(|s| s.to_string())
                .ok_or(CommandError::MissingArgument { action, argument })
        };

        match action {
            "initialize" => Ok(Command::Initialize),
            "login" => Ok(Command::Login {
                phone: arg(0, "login", "phone")?,
                password: arg(1, "login", "password")?,
            }),
            "register" => Ok(Command::Register {
                phone: arg(0, "register", "phone")?,
                mpesa_name: arg(1, "register", "mpesa_name")?,
                password: arg(2, "register", "password")?,
            }),
            "logout" => Ok(Command::Logout),
            "load-markets" => {
                let sort = args
                    .first()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default();
                Ok(Command::LoadMarkets(sort))
            }
            "show-login" => Ok(Command::ShowLogin),
            "show-register" => Ok(Command::ShowRegister),
            "close-modal" => Ok(Command::CloseModal),
            other => Err(CommandError::UnknownAction(other.to_string())),
        }
    }
}

impl Coordinator {
    /// Run a command against this coordinator
    pub async fn dispatch(&self, command: Command) -> DispatchOutcome {
        tracing::debug!(action = command.name(), "Dispatching command");

        match command {
            Command::Initialize => DispatchOutcome::Initialized(self.initialize().await),
            Command::Login { phone, password } => {
                DispatchOutcome::Notice(self.login(&phone, &password).await)
            }
            Command::Register {
                phone,
                mpesa_name,
                password,
            } => DispatchOutcome::Notice(self.register(&phone, &mpesa_name, &password).await),
            Command::Logout => {
                self.logout().await;
                DispatchOutcome::Done
            }
            Command::LoadMarkets(sort) => DispatchOutcome::Markets(self.load_markets(sort).await),
            Command::ShowLogin => {
                self.show_login_modal().await;
                DispatchOutcome::Done
            }
            Command::ShowRegister => {
                self.show_register_modal().await;
                DispatchOutcome::Done
            }
            Command::CloseModal => {
                self.close_modal().await;
                DispatchOutcome::Done
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_action() {
        for action in Command::ACTIONS {
            let args = ["0712345678", "Jane", "secret"];
            let command = Command::parse(action, &args).unwrap();
            assert_eq!(command.name(), *action);
        }
    }

    #[test]
    fn test_parse_login() {
        let command = Command::parse("login", &["0712345678", "password123"]).unwrap();
        assert_eq!(
            command,
            Command::Login {
                phone: "0712345678".to_string(),
                password: "password123".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_missing_argument() {
        let err = Command::parse("register", &["0712345678"]).unwrap_err();
        assert_eq!(
            err,
            CommandError::MissingArgument {
                action: "register",
                argument: "mpesa_name"
            }
        );
    }

    #[test]
    fn test_parse_load_markets_sort() {
        assert_eq!(
            Command::parse("load-markets", &[]).unwrap(),
            Command::LoadMarkets(MarketSort::Newest)
        );
        assert_eq!(
            Command::parse("load-markets", &["volume"]).unwrap(),
            Command::LoadMarkets(MarketSort::Volume)
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert!(matches!(
            Command::parse("withdraw", &[]),
            Err(CommandError::UnknownAction(_))
        ));
    }
}
