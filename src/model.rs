//! Core domain types for consignment pricing.

use std::fmt;

use crate::Amount;

/// Sale session identifier.
pub type SessionId = u32;

/// Seller identifier.
pub type SellerId = u32;

/// Identifier of a single deposited copy of a game.
pub type GameId = u32;

/// How a rule amount is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateKind {
    /// Flat amount.
    #[default]
    Fixed,
    /// Amount is a percentage of the base it applies to.
    Percentage,
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateKind::Fixed => f.write_str("fixed"),
            RateKind::Percentage => f.write_str("percentage"),
        }
    }
}

/// Fee or commission charged per unit, set by the active sale session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeRule {
    pub kind: RateKind,
    pub amount: Amount,
}

impl FeeRule {
    pub fn fixed(amount: Amount) -> Self {
        Self {
            kind: RateKind::Fixed,
            amount,
        }
    }

    pub fn percentage(rate: Amount) -> Self {
        Self {
            kind: RateKind::Percentage,
            amount: rate,
        }
    }
}

/// Discount entered at checkout, applied once to the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountRule {
    pub kind: RateKind,
    pub amount: Amount,
}

impl DiscountRule {
    pub fn fixed(amount: Amount) -> Self {
        Self {
            kind: RateKind::Fixed,
            amount,
        }
    }

    pub fn percentage(rate: Amount) -> Self {
        Self {
            kind: RateKind::Percentage,
            amount: rate,
        }
    }
}

/// Which checkout a cart belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// A seller deposits games and pays only the deposit fee.
    Deposit,
    /// A buyer pays the price plus the session commission.
    Purchase,
}

/// A game added to a deposit list or a purchase cart.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub publisher: String,
    pub unit_price: Amount,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(
        name: impl Into<String>,
        publisher: impl Into<String>,
        unit_price: Amount,
        quantity: u32,
    ) -> Self {
        Self {
            name: name.into(),
            publisher: publisher.into(),
            unit_price,
            quantity,
        }
    }
}

/// Parse a raw quantity, treating anything that is not a non-negative integer as zero.
pub fn sanitize_quantity(input: &str) -> u32 {
    input.trim().parse().unwrap_or(0)
}

/// Fee configuration of a sale session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleSession {
    pub id: SessionId,
    /// Charged to sellers per deposited copy.
    pub deposit_fee: FeeRule,
    /// Charged to buyers per sold copy.
    pub commission: FeeRule,
}

impl SaleSession {
    /// The rule a cart of the given flow is priced with.
    pub fn fee_rule(&self, flow: Flow) -> FeeRule {
        match flow {
            Flow::Deposit => self.deposit_fee,
            Flow::Purchase => self.commission,
        }
    }
}

/// A finalized operation recorded against a sale session.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    /// A copy of a game was deposited for a seller.
    /// Without an explicit fee, the session deposit fee for one unit applies.
    Deposit {
        game: GameId,
        seller: SellerId,
        price: Amount,
        fee: Option<Amount>,
    },
    /// A deposited copy was sold.
    Sale { game: GameId },
    /// An unsold copy was taken back by its seller.
    Withdraw { game: GameId },
    /// Money owed to a seller was handed over.
    Payout { seller: SellerId, amount: Amount },
}

/// Sale state of a deposited copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Deposited,
    // Sold and Withdrawn are final
    Sold,
    Withdrawn,
}

/// Record of a deposited copy.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub seller: SellerId,
    pub price: Amount,
    pub state: GameState,
}

impl GameRecord {
    /// Create a new record in the `Deposited` state.
    pub fn new(seller: SellerId, price: Amount) -> Self {
        Self {
            seller,
            price,
            state: GameState::Deposited,
        }
    }
}
