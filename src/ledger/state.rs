use crate::Amount;
use crate::model::SellerId;
use crate::pricing::SaleBreakdown;

/// A seller's games and money within a session.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SellerAccount {
    id: SellerId,
    deposited_games: u32,
    sold_games: u32,
    withdrawn_games: u32,
    total_earnings: Amount,
    total_due: Amount,
}

impl SellerAccount {
    pub fn new(id: SellerId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn id(&self) -> SellerId {
        self.id
    }

    pub fn deposited_games(&self) -> u32 {
        self.deposited_games
    }

    pub fn sold_games(&self) -> u32 {
        self.sold_games
    }

    pub fn withdrawn_games(&self) -> u32 {
        self.withdrawn_games
    }

    /// Copies still on the shop floor.
    pub fn unsold_games(&self) -> u32 {
        self.deposited_games - self.sold_games - self.withdrawn_games
    }

    pub fn total_earnings(&self) -> Amount {
        self.total_earnings
    }

    pub fn total_due(&self) -> Amount {
        self.total_due
    }

    pub(crate) fn record_deposit(&mut self) {
        self.deposited_games += 1;
    }

    pub(crate) fn record_sale(&mut self, earnings: Amount) {
        self.sold_games += 1;
        self.total_earnings += earnings;
        self.total_due += earnings;
    }

    pub(crate) fn record_withdrawal(&mut self) {
        self.withdrawn_games += 1;
    }

    pub(crate) fn pay_out(&mut self, amount: Amount) {
        self.total_due -= amount;
    }
}

/// Session-wide totals, as shown to administrators.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FinancialSummary {
    /// Paid by buyers, net of payouts to sellers.
    pub total_treasury: Amount,
    pub total_commission: Amount,
    pub total_deposit_fees: Amount,
    pub total_due_to_sellers: Amount,
}

impl FinancialSummary {
    pub fn treasury_with_deposit_fees(&self) -> Amount {
        self.total_treasury + self.total_deposit_fees
    }

    pub(crate) fn record_sale(&mut self, sale: &SaleBreakdown) {
        self.total_treasury += sale.total_amount;
        self.total_commission += sale.commission_amount;
        self.total_due_to_sellers += sale.seller_earnings;
    }

    pub(crate) fn record_payout(&mut self, amount: Amount) {
        self.total_treasury -= amount;
        self.total_due_to_sellers -= amount;
    }
}
