//! Pricing calculator.
//!
//! Pure functions deriving fees, item costs, discounts and totals from line
//! items and the rules of the active sale session. They have no error path:
//! raw input is sanitized to zero before it reaches them (see
//! [`Amount::sanitize`] and [`sanitize_quantity`](crate::model::sanitize_quantity)).
//! Also contains [`Cart`], which holds the line items of a checkout.

use crate::Amount;
use crate::model::{DiscountRule, FeeRule, Flow, LineItem, RateKind};

mod cart;
pub use cart::{Cart, CartError, Quote, QuotedLine};

/// Fee owed for `quantity` units at `unit_price`.
///
/// - fixed: `amount * quantity`
/// - percentage: `unit_price * quantity * amount / 100`
pub fn compute_item_fee(unit_price: Amount, quantity: u32, fee_rule: FeeRule) -> Amount {
    match fee_rule.kind {
        RateKind::Fixed => fee_rule.amount * quantity,
        RateKind::Percentage => (unit_price * quantity).percent(fee_rule.amount),
    }
}

/// Cost of a line item in the given flow.
///
/// Deposits cost the fee alone, purchases cost the price plus the fee.
pub fn compute_item_cost(item: &LineItem, fee_rule: FeeRule, flow: Flow) -> Amount {
    let fee = compute_item_fee(item.unit_price, item.quantity, fee_rule);
    match flow {
        Flow::Deposit => fee,
        Flow::Purchase => item.unit_price * item.quantity + fee,
    }
}

/// Sum of the item costs.
pub fn compute_subtotal<'a>(
    items: impl IntoIterator<Item = &'a LineItem>,
    fee_rule: FeeRule,
    flow: Flow,
) -> Amount {
    items
        .into_iter()
        .map(|item| compute_item_cost(item, fee_rule, flow))
        .sum()
}

/// Discount granted on `subtotal`, always within `[0, subtotal]`.
///
/// Percentage rates above 100 count as 100.
pub fn compute_discount(subtotal: Amount, discount_rule: DiscountRule) -> Amount {
    let raw = match discount_rule.kind {
        RateKind::Fixed => discount_rule.amount,
        RateKind::Percentage => subtotal.percent(discount_rule.amount.min(Amount::HUNDRED)),
    };
    raw.min(subtotal).max(Amount::ZERO)
}

pub fn compute_final_total(subtotal: Amount, discount: Amount) -> Amount {
    subtotal - discount
}

/// Money movements of a single sold copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleBreakdown {
    /// Paid by the buyer.
    pub total_amount: Amount,
    /// Kept by the operation.
    pub commission_amount: Amount,
    /// Owed to the seller.
    pub seller_earnings: Amount,
}

pub fn sale_breakdown(price: Amount, commission: FeeRule) -> SaleBreakdown {
    let commission_amount = compute_item_fee(price, 1, commission);
    SaleBreakdown {
        total_amount: price + commission_amount,
        commission_amount,
        seller_earnings: price,
    }
}
