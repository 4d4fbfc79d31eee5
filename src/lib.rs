pub mod amount;
pub mod config;
pub mod csv;
pub mod ledger;
pub mod model;
pub mod pricing;

pub use amount::Amount;
pub use ledger::Ledger;
pub use model::{
    DiscountRule, FeeRule, Flow, GameId, LedgerEvent, LineItem, RateKind, SaleSession, SellerId,
    SessionId,
};
pub use pricing::{
    Cart, Quote, compute_discount, compute_final_total, compute_item_fee, compute_subtotal,
};
