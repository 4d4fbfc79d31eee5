use thiserror::Error;
use tokio_stream::{Stream, StreamExt};
use tracing::info;

use super::{compute_discount, compute_final_total, compute_item_cost, compute_item_fee};
use crate::Amount;
use crate::model::{DiscountRule, FeeRule, Flow, LineItem};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("no line item at position {0}")]
    ItemNotFound(usize),
}

/// A priced line of a [`Quote`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuotedLine {
    pub item: LineItem,
    pub fee: Amount,
    pub cost: Amount,
}

/// Totals derived from a cart at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub lines: Vec<QuotedLine>,
    pub subtotal: Amount,
    pub discount: Amount,
    pub total: Amount,
}

/// Line items of a deposit or purchase checkout, priced with one session rule.
///
/// Nothing is cached: every [`Cart::quote`] recomputes from the current items.
#[derive(Debug)]
pub struct Cart {
    flow: Flow,
    fee_rule: FeeRule,
    items: Vec<LineItem>,
    discount: Option<DiscountRule>,
}

impl Cart {
    pub fn new(flow: Flow, fee_rule: FeeRule) -> Self {
        Self {
            flow,
            fee_rule,
            items: Vec::new(),
            discount: None,
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add every item of the stream to the cart.
    pub async fn fill(&mut self, mut stream: impl Stream<Item = LineItem> + Unpin) {
        while let Some(item) = stream.next().await {
            self.add(item);
        }
    }

    /// Append an item, returning its position.
    pub fn add(&mut self, item: LineItem) -> usize {
        info!(
            flow = ?self.flow,
            name = %item.name,
            unit_price = %item.unit_price,
            quantity = item.quantity,
            "line item added"
        );
        self.items.push(item);
        self.items.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Result<LineItem, CartError> {
        if index >= self.items.len() {
            return Err(CartError::ItemNotFound(index));
        }
        let item = self.items.remove(index);
        info!(flow = ?self.flow, name = %item.name, "line item removed");
        Ok(item)
    }

    pub fn set_discount(&mut self, discount: Option<DiscountRule>) {
        self.discount = discount;
    }

    /// Drop all items and the discount once the checkout is finalized.
    pub fn clear(&mut self) {
        self.items.clear();
        self.discount = None;
    }

    pub fn quote(&self) -> Quote {
        let lines: Vec<QuotedLine> = self
            .items
            .iter()
            .map(|item| QuotedLine {
                fee: compute_item_fee(item.unit_price, item.quantity, self.fee_rule),
                cost: compute_item_cost(item, self.fee_rule, self.flow),
                item: item.clone(),
            })
            .collect();

        let subtotal: Amount = lines.iter().map(|line| line.cost).sum();
        let discount = self
            .discount
            .map_or(Amount::ZERO, |rule| compute_discount(subtotal, rule));

        Quote {
            lines,
            subtotal,
            discount,
            total: compute_final_total(subtotal, discount),
        }
    }
}
