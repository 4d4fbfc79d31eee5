//! Financial ledger of a sale session.
//!
//! The ledger records finalized deposits, sales, withdrawals and seller
//! payouts, and keeps per-seller accounts plus the session-wide financial
//! summary up to date.
//! Events can also be fed as an async stream.

use std::collections::HashMap;
use tokio_stream::{Stream, StreamExt};
use tracing::info;

use crate::Amount;
use crate::model::{GameId, GameRecord, GameState, LedgerEvent, SaleSession, SellerId};
use crate::pricing::{compute_item_fee, sale_breakdown};

mod state;
pub use state::{FinancialSummary, SellerAccount};

mod error;
pub use error::{DepositError, LedgerError, PayoutError, SaleError, WithdrawError};

/// Aggregates the events of one sale session.
pub struct Ledger {
    session: SaleSession,
    sellers: HashMap<SellerId, SellerAccount>,
    /// Every deposited copy, sold or not
    games: HashMap<GameId, GameRecord>,
    summary: FinancialSummary,
}

/// Public API
impl Ledger {
    pub fn new(session: SaleSession) -> Self {
        Self {
            session,
            sellers: HashMap::new(),
            games: HashMap::new(),
            summary: FinancialSummary::default(),
        }
    }

    pub fn session(&self) -> &SaleSession {
        &self.session
    }

    /// Run the ledger with the given event stream
    pub async fn run(&mut self, mut stream: impl Stream<Item = LedgerEvent> + Unpin) {
        while let Some(event) = stream.next().await {
            // a rejected event is logged and must not stop the ledger
            let _ = self.apply(event);
        }
    }

    /// Return all seller accounts.
    pub fn sellers(&self) -> impl Iterator<Item = &SellerAccount> + '_ {
        self.sellers.values()
    }

    pub fn get_seller(&self, seller: SellerId) -> Option<&SellerAccount> {
        self.sellers.get(&seller)
    }

    pub fn summary(&self) -> &FinancialSummary {
        &self.summary
    }

    /// Apply a single event on top of the current ledger state
    pub fn apply(&mut self, event: LedgerEvent) -> Result<(), LedgerError> {
        match event {
            LedgerEvent::Deposit {
                game,
                seller,
                price,
                fee,
            } => {
                let result = self.apply_deposit(game, seller, price, fee);
                self.log_result("deposit", "game", game, Some(price), &result);
                result?;
            }
            LedgerEvent::Sale { game } => {
                let result = self.apply_sale(game);
                self.log_result("sale", "game", game, None, &result);
                result?;
            }
            LedgerEvent::Withdraw { game } => {
                let result = self.apply_withdraw(game);
                self.log_result("withdrawal", "game", game, None, &result);
                result?;
            }
            LedgerEvent::Payout { seller, amount } => {
                let result = self.apply_payout(seller, amount);
                self.log_result("payout", "seller", seller, Some(amount), &result);
                result?;
            }
        }
        Ok(())
    }
}

/// Private API
impl Ledger {
    /// Small helper to log `apply` results
    fn log_result<E: std::fmt::Display>(
        &self,
        event: &str,
        subject: &str,
        id: u32,
        amount: Option<Amount>,
        result: &Result<(), E>,
    ) {
        let session = self.session.id;
        match (result, amount) {
            (Ok(()), Some(amt)) => {
                info!(session, subject, id, amount = %amt, "{event} applied");
            }
            (Ok(()), None) => {
                info!(session, subject, id, "{event} applied");
            }
            (Err(e), Some(amt)) => {
                info!(session, subject, id, amount = %amt, reason = %e, "{event} skipped");
            }
            (Err(e), None) => {
                info!(session, subject, id, reason = %e, "{event} skipped");
            }
        }
    }

    /// Apply a `LedgerEvent::Deposit`:
    /// - Ensure the game id is unique and neither price nor fee is negative
    /// - Register the copy for its seller
    /// - Collect the deposit fee (session rule for one unit when not given)
    fn apply_deposit(
        &mut self,
        game: GameId,
        seller: SellerId,
        price: Amount,
        fee: Option<Amount>,
    ) -> Result<(), DepositError> {
        if self.games.contains_key(&game) {
            return Err(DepositError::DuplicateGameId(game));
        }
        if price.is_negative() {
            return Err(DepositError::NegativePrice(game, price));
        }
        if let Some(fee) = fee.filter(|fee| fee.is_negative()) {
            return Err(DepositError::NegativeFee(game, fee));
        }

        let fee = fee.unwrap_or_else(|| compute_item_fee(price, 1, self.session.deposit_fee));

        self.sellers
            .entry(seller)
            .or_insert_with(|| SellerAccount::new(seller))
            .record_deposit();
        self.games.insert(game, GameRecord::new(seller, price));
        self.summary.total_deposit_fees += fee;

        Ok(())
    }

    /// Apply a `LedgerEvent::Sale`:
    /// - Find the deposited copy, which must be neither sold nor withdrawn
    /// - Split the buyer's payment into commission and seller earnings
    /// - Mark the copy as sold
    fn apply_sale(&mut self, game: GameId) -> Result<(), SaleError> {
        let record = self
            .games
            .get_mut(&game)
            .ok_or(SaleError::GameNotFound(game))?;

        match record.state {
            GameState::Deposited => {}
            GameState::Sold => return Err(SaleError::AlreadySold(game)),
            GameState::Withdrawn => return Err(SaleError::Withdrawn(game)),
        }

        let account = self
            .sellers
            .get_mut(&record.seller)
            .ok_or(SaleError::SellerNotFound(record.seller, game))?;

        let sale = sale_breakdown(record.price, self.session.commission);
        account.record_sale(sale.seller_earnings);
        self.summary.record_sale(&sale);
        record.state = GameState::Sold;

        Ok(())
    }

    /// Apply a `LedgerEvent::Withdraw`:
    /// - Find the deposited copy, which must still be for sale
    /// - Hand it back to its seller; the deposit fee stays collected
    fn apply_withdraw(&mut self, game: GameId) -> Result<(), WithdrawError> {
        let record = self
            .games
            .get_mut(&game)
            .ok_or(WithdrawError::GameNotFound(game))?;

        match record.state {
            GameState::Deposited => {}
            GameState::Sold => return Err(WithdrawError::AlreadySold(game)),
            GameState::Withdrawn => return Err(WithdrawError::AlreadyWithdrawn(game)),
        }

        self.sellers
            .get_mut(&record.seller)
            .ok_or(WithdrawError::SellerNotFound(record.seller, game))?
            .record_withdrawal();
        record.state = GameState::Withdrawn;

        Ok(())
    }

    /// Apply a `LedgerEvent::Payout`:
    /// - Ensure the seller exists and is owed at least `amount`
    /// - Move the money out of the treasury
    fn apply_payout(&mut self, seller: SellerId, amount: Amount) -> Result<(), PayoutError> {
        if amount <= Amount::ZERO {
            return Err(PayoutError::InvalidAmount(seller, amount));
        }

        let account = self
            .sellers
            .get_mut(&seller)
            .ok_or(PayoutError::SellerNotFound(seller))?;

        if account.total_due() < amount {
            return Err(PayoutError::InsufficientDue(
                seller,
                account.total_due(),
                amount,
            ));
        }

        account.pay_out(amount);
        self.summary.record_payout(amount);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FeeRule;

    // test utils

    fn amt(value: f64) -> Amount {
        Amount::from_float(value)
    }

    fn session() -> SaleSession {
        SaleSession {
            id: 1,
            deposit_fee: FeeRule::fixed(amt(2.0)),
            commission: FeeRule::percentage(amt(10.0)),
        }
    }

    fn deposit(game: GameId, seller: SellerId, price: f64) -> LedgerEvent {
        LedgerEvent::Deposit {
            game,
            seller,
            price: amt(price),
            fee: None,
        }
    }

    fn sale(game: GameId) -> LedgerEvent {
        LedgerEvent::Sale { game }
    }

    fn withdraw(game: GameId) -> LedgerEvent {
        LedgerEvent::Withdraw { game }
    }

    fn payout(seller: SellerId, amount: f64) -> LedgerEvent {
        LedgerEvent::Payout {
            seller,
            amount: amt(amount),
        }
    }

    #[test]
    fn new_ledger() {
        let ledger = Ledger::new(session());
        assert_eq!(ledger.sellers().count(), 0);
        assert_eq!(*ledger.summary(), FinancialSummary::default());
        assert_eq!(ledger.session().id, 1);
    }

    // Deposit

    #[test]
    fn deposit_creates_seller_and_collects_session_fee() {
        let mut ledger = Ledger::new(session());
        ledger.apply(deposit(1, 10, 20.0)).unwrap();
        ledger.apply(deposit(2, 10, 35.0)).unwrap();

        let seller = ledger.get_seller(10).unwrap();
        assert_eq!(seller.deposited_games(), 2);
        assert_eq!(seller.sold_games(), 0);
        assert_eq!(ledger.summary().total_deposit_fees, amt(4.0));
        assert_eq!(ledger.summary().total_treasury, Amount::ZERO);
    }

    #[test]
    fn deposit_with_explicit_fee_overrides_session_rule() {
        let mut ledger = Ledger::new(session());
        ledger
            .apply(LedgerEvent::Deposit {
                game: 1,
                seller: 10,
                price: amt(20.0),
                fee: Some(amt(0.5)),
            })
            .unwrap();

        assert_eq!(ledger.summary().total_deposit_fees, amt(0.5));
    }

    #[test]
    fn deposit_percentage_fee_uses_price() {
        let mut ledger = Ledger::new(SaleSession {
            deposit_fee: FeeRule::percentage(amt(5.0)),
            ..session()
        });
        ledger.apply(deposit(1, 10, 40.0)).unwrap();

        assert_eq!(ledger.summary().total_deposit_fees, amt(2.0));
    }

    #[test]
    fn duplicate_game_id_fails() {
        let mut ledger = Ledger::new(session());
        ledger.apply(deposit(1, 10, 20.0)).unwrap();

        let result = ledger.apply(deposit(1, 11, 30.0));
        assert!(matches!(
            result,
            Err(LedgerError::Deposit(DepositError::DuplicateGameId(1)))
        ));
        assert!(ledger.get_seller(11).is_none());
        assert_eq!(ledger.summary().total_deposit_fees, amt(2.0));
    }

    #[test]
    fn negative_price_fails() {
        let mut ledger = Ledger::new(session());

        let result = ledger.apply(deposit(1, 10, -5.0));
        assert!(matches!(
            result,
            Err(LedgerError::Deposit(DepositError::NegativePrice(1, _)))
        ));
        assert!(ledger.get_seller(10).is_none());
    }

    #[test]
    fn negative_fee_fails() {
        let mut ledger = Ledger::new(session());

        let result = ledger.apply(LedgerEvent::Deposit {
            game: 1,
            seller: 10,
            price: amt(20.0),
            fee: Some(amt(-2.0)),
        });
        assert!(matches!(
            result,
            Err(LedgerError::Deposit(DepositError::NegativeFee(1, _)))
        ));
        assert!(ledger.get_seller(10).is_none());
        assert_eq!(ledger.summary().total_deposit_fees, Amount::ZERO);

        // the game id is still free
        ledger.apply(deposit(1, 10, 20.0)).unwrap();
        assert_eq!(ledger.summary().total_deposit_fees, amt(2.0));
    }

    // Sale

    #[test]
    fn sale_splits_payment_between_commission_and_seller() {
        let mut ledger = Ledger::new(session());
        ledger.apply(deposit(1, 10, 20.0)).unwrap();
        ledger.apply(sale(1)).unwrap();

        let seller = ledger.get_seller(10).unwrap();
        assert_eq!(seller.sold_games(), 1);
        assert_eq!(seller.total_earnings(), amt(20.0));
        assert_eq!(seller.total_due(), amt(20.0));

        let summary = ledger.summary();
        assert_eq!(summary.total_treasury, amt(22.0));
        assert_eq!(summary.total_commission, amt(2.0));
        assert_eq!(summary.total_due_to_sellers, amt(20.0));
        assert_eq!(summary.treasury_with_deposit_fees(), amt(24.0));
    }

    #[test]
    fn sale_of_unknown_game_fails() {
        let mut ledger = Ledger::new(session());

        let result = ledger.apply(sale(42));
        assert!(matches!(
            result,
            Err(LedgerError::Sale(SaleError::GameNotFound(42)))
        ));
    }

    #[test]
    fn game_cannot_be_sold_twice() {
        let mut ledger = Ledger::new(session());
        ledger.apply(deposit(1, 10, 20.0)).unwrap();
        ledger.apply(sale(1)).unwrap();

        let result = ledger.apply(sale(1));
        assert!(matches!(
            result,
            Err(LedgerError::Sale(SaleError::AlreadySold(1)))
        ));
        assert_eq!(ledger.summary().total_treasury, amt(22.0));
        assert_eq!(ledger.get_seller(10).unwrap().sold_games(), 1);
    }

    // Withdraw

    #[test]
    fn withdraw_returns_unsold_copy_and_keeps_fee() {
        let mut ledger = Ledger::new(session());
        ledger.apply(deposit(1, 10, 20.0)).unwrap();
        ledger.apply(deposit(2, 10, 35.0)).unwrap();
        ledger.apply(withdraw(2)).unwrap();

        let seller = ledger.get_seller(10).unwrap();
        assert_eq!(seller.deposited_games(), 2);
        assert_eq!(seller.withdrawn_games(), 1);
        assert_eq!(seller.unsold_games(), 1);
        assert_eq!(seller.total_due(), Amount::ZERO);
        assert_eq!(ledger.summary().total_deposit_fees, amt(4.0));
        assert_eq!(ledger.summary().total_treasury, Amount::ZERO);
    }

    #[test]
    fn withdrawn_copy_cannot_be_sold() {
        let mut ledger = Ledger::new(session());
        ledger.apply(deposit(1, 10, 20.0)).unwrap();
        ledger.apply(withdraw(1)).unwrap();

        let result = ledger.apply(sale(1));
        assert!(matches!(
            result,
            Err(LedgerError::Sale(SaleError::Withdrawn(1)))
        ));
        assert_eq!(ledger.get_seller(10).unwrap().sold_games(), 0);
        assert_eq!(ledger.summary().total_treasury, Amount::ZERO);
    }

    #[test]
    fn only_unsold_copies_can_be_withdrawn() {
        let mut ledger = Ledger::new(session());
        ledger.apply(deposit(1, 10, 20.0)).unwrap();
        ledger.apply(deposit(2, 10, 20.0)).unwrap();
        ledger.apply(sale(1)).unwrap();
        ledger.apply(withdraw(2)).unwrap();

        assert!(matches!(
            ledger.apply(withdraw(1)),
            Err(LedgerError::Withdraw(WithdrawError::AlreadySold(1)))
        ));
        assert!(matches!(
            ledger.apply(withdraw(2)),
            Err(LedgerError::Withdraw(WithdrawError::AlreadyWithdrawn(2)))
        ));
        assert!(matches!(
            ledger.apply(withdraw(3)),
            Err(LedgerError::Withdraw(WithdrawError::GameNotFound(3)))
        ));
        assert_eq!(ledger.get_seller(10).unwrap().withdrawn_games(), 1);
    }

    // Payout

    #[test]
    fn payout_reduces_due_and_treasury() {
        let mut ledger = Ledger::new(session());
        ledger.apply(deposit(1, 10, 20.0)).unwrap();
        ledger.apply(sale(1)).unwrap();
        ledger.apply(payout(10, 15.0)).unwrap();

        let seller = ledger.get_seller(10).unwrap();
        assert_eq!(seller.total_earnings(), amt(20.0));
        assert_eq!(seller.total_due(), amt(5.0));

        let summary = ledger.summary();
        assert_eq!(summary.total_treasury, amt(7.0));
        assert_eq!(summary.total_due_to_sellers, amt(5.0));
        assert_eq!(summary.total_commission, amt(2.0));
    }

    #[test]
    fn payout_above_due_fails() {
        let mut ledger = Ledger::new(session());
        ledger.apply(deposit(1, 10, 20.0)).unwrap();
        ledger.apply(sale(1)).unwrap();

        let result = ledger.apply(payout(10, 20.01));
        assert!(matches!(
            result,
            Err(LedgerError::Payout(PayoutError::InsufficientDue(10, _, _)))
        ));
        assert_eq!(ledger.get_seller(10).unwrap().total_due(), amt(20.0));
    }

    #[test]
    fn payout_to_unknown_seller_fails() {
        let mut ledger = Ledger::new(session());

        let result = ledger.apply(payout(99, 1.0));
        assert!(matches!(
            result,
            Err(LedgerError::Payout(PayoutError::SellerNotFound(99)))
        ));
    }

    #[test]
    fn non_positive_payout_fails() {
        let mut ledger = Ledger::new(session());
        ledger.apply(deposit(1, 10, 20.0)).unwrap();

        let result = ledger.apply(payout(10, 0.0));
        assert!(matches!(
            result,
            Err(LedgerError::Payout(PayoutError::InvalidAmount(10, _)))
        ));
    }

    // Multiple sellers

    #[test]
    fn sellers_are_independent() {
        let mut ledger = Ledger::new(session());
        ledger.apply(deposit(1, 10, 20.0)).unwrap();
        ledger.apply(deposit(2, 11, 50.0)).unwrap();
        ledger.apply(sale(2)).unwrap();

        let sellers: Vec<_> = ledger.sellers().collect();
        assert_eq!(sellers.len(), 2);

        let first = sellers.iter().find(|s| s.id() == 10).unwrap();
        let second = sellers.iter().find(|s| s.id() == 11).unwrap();
        assert_eq!(first.total_due(), Amount::ZERO);
        assert_eq!(second.total_due(), amt(50.0));
    }

    //  Async run()

    #[tokio::test]
    async fn run_skips_rejected_events_and_continues() {
        let mut ledger = Ledger::new(session());
        let events = vec![
            deposit(1, 10, 20.0),
            sale(7), // never deposited
            sale(1),
            payout(10, 100.0), // more than due
            payout(10, 20.0),
        ];

        ledger.run(tokio_stream::iter(events)).await;

        let seller = ledger.get_seller(10).unwrap();
        assert_eq!(seller.sold_games(), 1);
        assert_eq!(seller.total_due(), Amount::ZERO);
        assert_eq!(ledger.summary().total_treasury, amt(2.0));
    }
}
