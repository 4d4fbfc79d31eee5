//! Error types for ledger events.

use thiserror::Error;

use crate::Amount;
use crate::model::{GameId, SellerId};

/// Top-level error returned by [`Ledger::apply`](super::Ledger::apply).
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("deposit failed: {0}")]
    Deposit(#[from] DepositError),

    #[error("sale failed: {0}")]
    Sale(#[from] SaleError),

    #[error("withdrawal failed: {0}")]
    Withdraw(#[from] WithdrawError),

    #[error("payout failed: {0}")]
    Payout(#[from] PayoutError),
}

#[derive(Debug, Error)]
pub enum DepositError {
    #[error("duplicate game id {0}")]
    DuplicateGameId(GameId),
    #[error("game {0} has negative price {1}")]
    NegativePrice(GameId, Amount),
    #[error("game {0} has negative deposit fee {1}")]
    NegativeFee(GameId, Amount),
}

#[derive(Debug, Error)]
pub enum SaleError {
    #[error("game {0} was never deposited")]
    GameNotFound(GameId),
    #[error("game {0} is already sold")]
    AlreadySold(GameId),
    #[error("game {0} was withdrawn by its seller")]
    Withdrawn(GameId),
    #[error("seller {0} of game {1} not found")]
    SellerNotFound(SellerId, GameId),
}

#[derive(Debug, Error)]
pub enum WithdrawError {
    #[error("game {0} was never deposited")]
    GameNotFound(GameId),
    #[error("game {0} is already sold")]
    AlreadySold(GameId),
    #[error("game {0} is already withdrawn")]
    AlreadyWithdrawn(GameId),
    #[error("seller {0} of game {1} not found")]
    SellerNotFound(SellerId, GameId),
}

#[derive(Debug, Error)]
pub enum PayoutError {
    #[error("seller {0} not found")]
    SellerNotFound(SellerId),
    #[error("payout to seller {0} must be positive, got {1}")]
    InvalidAmount(SellerId, Amount),
    #[error("insufficient amount due to seller {0}: due {1}, requested {2}")]
    InsufficientDue(SellerId, Amount, Amount),
}
