//! Command line and environment configuration.
//!
//! The command and input file come from argv, the rules of the sale session
//! from `CONSIGN_*` environment variables.

use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::Amount;
use crate::model::{DiscountRule, FeeRule, Flow, RateKind, SaleSession, SessionId};

pub const USAGE: &str = "usage: consign-pricing <deposit|purchase|ledger|summary> <file.csv>";

pub const SESSION_ID_VAR: &str = "CONSIGN_SESSION_ID";
pub const DEPOSIT_FEE_VAR: &str = "CONSIGN_DEPOSIT_FEE";
pub const COMMISSION_VAR: &str = "CONSIGN_COMMISSION";
pub const DISCOUNT_VAR: &str = "CONSIGN_DISCOUNT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing arguments")]
    Usage,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("{var}: expected '<fixed|percentage>:<amount>', got '{value}'")]
    MalformedRule { var: &'static str, value: String },

    #[error("{var}: amount must be a number between 0 and 1000000000, got '{value}'")]
    InvalidAmount { var: &'static str, value: String },

    #[error("CONSIGN_SESSION_ID: expected a session number, got '{0}'")]
    InvalidSessionId(String),
}

/// What the binary has been asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Price a list of line items.
    Quote(Flow),
    /// Aggregate ledger events into seller accounts.
    Sellers,
    /// Aggregate ledger events into the session summary.
    Summary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub command: Command,
    pub path: PathBuf,
    pub session: SaleSession,
    pub discount: Option<DiscountRule>,
}

impl Config {
    /// Build the configuration from the process arguments and environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(std::env::args().skip(1), |var| std::env::var(var).ok())
    }

    /// Build the configuration from `args` (program name excluded) and a
    /// variable lookup.
    pub fn load(
        args: impl IntoIterator<Item = String>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut args = args.into_iter();
        let command = match args.next().as_deref() {
            Some("deposit") => Command::Quote(Flow::Deposit),
            Some("purchase") => Command::Quote(Flow::Purchase),
            Some("ledger") => Command::Sellers,
            Some("summary") => Command::Summary,
            Some(other) => return Err(ConfigError::UnknownCommand(other.to_string())),
            None => return Err(ConfigError::Usage),
        };
        let path = args.next().map(PathBuf::from).ok_or(ConfigError::Usage)?;

        let id = match var(SESSION_ID_VAR) {
            Some(value) => value
                .trim()
                .parse::<SessionId>()
                .map_err(|_| ConfigError::InvalidSessionId(value.clone()))?,
            None => 1,
        };

        let deposit_fee = match var(DEPOSIT_FEE_VAR) {
            Some(value) => parse_fee_rule(DEPOSIT_FEE_VAR, &value)?,
            None => {
                debug!(var = DEPOSIT_FEE_VAR, "not set, no deposit fee");
                FeeRule::fixed(Amount::ZERO)
            }
        };
        let commission = match var(COMMISSION_VAR) {
            Some(value) => parse_fee_rule(COMMISSION_VAR, &value)?,
            None => {
                debug!(var = COMMISSION_VAR, "not set, no commission");
                FeeRule::percentage(Amount::ZERO)
            }
        };
        let discount = var(DISCOUNT_VAR)
            .map(|value| parse_discount_rule(&value))
            .transpose()?;

        Ok(Self {
            command,
            path,
            session: SaleSession {
                id,
                deposit_fee,
                commission,
            },
            discount,
        })
    }
}

fn split_rule<'a>(var: &'static str, value: &'a str) -> Result<(RateKind, &'a str), ConfigError> {
    let malformed = || ConfigError::MalformedRule {
        var,
        value: value.to_string(),
    };
    let (kind, amount) = value.split_once(':').ok_or_else(malformed)?;
    let kind = match kind.trim() {
        "fixed" => RateKind::Fixed,
        "percentage" => RateKind::Percentage,
        _ => return Err(malformed()),
    };
    Ok((kind, amount.trim()))
}

/// Parse a session fee rule such as `percentage:10`. Amounts must be valid.
pub fn parse_fee_rule(var: &'static str, value: &str) -> Result<FeeRule, ConfigError> {
    let (kind, raw) = split_rule(var, value)?;
    let amount = raw
        .parse::<f64>()
        .ok()
        .and_then(Amount::checked_from_float)
        .filter(|amount| !amount.is_negative())
        .ok_or_else(|| ConfigError::InvalidAmount {
            var,
            value: raw.to_string(),
        })?;
    Ok(FeeRule { kind, amount })
}

/// Parse a discount such as `fixed:5`.
///
/// The amount is user input: anything unusable becomes a zero discount.
pub fn parse_discount_rule(value: &str) -> Result<DiscountRule, ConfigError> {
    let (kind, raw) = split_rule(DISCOUNT_VAR, value)?;
    let amount = Amount::sanitize(raw);
    if amount == Amount::ZERO && raw.parse::<f64>() != Ok(0.0) {
        warn!(var = DISCOUNT_VAR, value = raw, "invalid discount amount, using 0");
    }
    Ok(DiscountRule { kind, amount })
}
