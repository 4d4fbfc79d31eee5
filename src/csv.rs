use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::ledger::{FinancialSummary, SellerAccount};
use crate::model::sanitize_quantity;
use crate::pricing::Quote;
use crate::{Amount, GameId, LedgerEvent, LineItem, SellerId};

/// Errors that can occur when reading or writing csv rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: price must be between 0 and 1000000000, got {price}")]
    InvalidPrice { line: usize, price: f64 },

    #[error("line {line}: {field} is out of range, got {value}")]
    InvalidAmount {
        line: usize,
        field: &'static str,
        value: f64,
    },

    #[error("line {line}: quantity must be at least 1")]
    InvalidQuantity { line: usize },

    #[error("line {line}: unrecognized event type '{event_type}'")]
    UnrecognizedType { line: usize, event_type: String },

    #[error("line {line}: {event_type} missing {field}")]
    MissingField {
        line: usize,
        event_type: String,
        field: &'static str,
    },

    #[error("failed to write csv: {0}")]
    Write(#[from] csv::Error),

    #[error("failed to flush csv writer: {0}")]
    Flush(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct ItemRow {
    name: String,
    publisher: String,
    price: f64,
    quantity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventRow {
    r#type: String,
    game: Option<GameId>,
    seller: Option<SellerId>,
    price: Option<f64>,
    fee: Option<f64>,
    amount: Option<f64>,
}

#[derive(Debug, Serialize)]
struct QuoteRow {
    line: String,
    name: Option<String>,
    publisher: Option<String>,
    unit_price: Option<String>,
    quantity: Option<u32>,
    fee: Option<String>,
    cost: String,
}

impl QuoteRow {
    fn total(label: &str, value: Amount) -> Self {
        Self {
            line: label.to_string(),
            name: None,
            publisher: None,
            unit_price: None,
            quantity: None,
            fee: None,
            cost: value.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SellerRow {
    seller: SellerId,
    deposited: u32,
    sold: u32,
    withdrawn: u32,
    earnings: String,
    due: String,
}

#[derive(Debug, Serialize)]
struct SummaryRow {
    treasury: String,
    commission: String,
    deposit_fees: String,
    due_to_sellers: String,
    treasury_with_deposit_fees: String,
}

/// Convert an optional event amount, rejecting values an [`Amount`] cannot hold.
fn event_amount(
    line: usize,
    field: &'static str,
    value: Option<f64>,
) -> Result<Option<Amount>, CsvError> {
    value
        .map(|value| {
            Amount::checked_from_float(value)
                .ok_or(CsvError::InvalidAmount { line, field, value })
        })
        .transpose()
}

fn open(path: &Path) -> Result<csv::Reader<File>, CsvError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.display().to_string(),
            source,
        })
}

/// Read the games of a deposit list or purchase cart from a csv file.
///
/// Columns: `name,publisher,price,quantity`, where an empty quantity means one copy.
/// Rows with a price outside `[0, Amount::INPUT_LIMIT]` or a quantity that is
/// not a positive integer are rejected.
pub fn read_line_items(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<LineItem, CsvError>>, CsvError> {
    let reader = open(path.as_ref())?;

    Ok(reader
        .into_deserialize::<ItemRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            let price = Amount::checked_from_float(row.price)
                .filter(|price| !price.is_negative())
                .ok_or(CsvError::InvalidPrice {
                    line,
                    price: row.price,
                })?;
            let quantity = row.quantity.as_deref().map_or(1, sanitize_quantity);
            if quantity == 0 {
                return Err(CsvError::InvalidQuantity { line });
            }
            Ok(LineItem::new(row.name, row.publisher, price, quantity))
        }))
}

/// Read ledger events from a csv file.
///
/// Columns: `type,game,seller,price,fee,amount`; each type only needs its own fields.
/// Types are `deposit`, `sale`, `withdraw` and `payout`.
pub fn read_events(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<LedgerEvent, CsvError>>, CsvError> {
    let reader = open(path.as_ref())?;

    Ok(reader
        .into_deserialize::<EventRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            let missing = |field: &'static str| CsvError::MissingField {
                line,
                event_type: row.r#type.clone(),
                field,
            };
            match row.r#type.as_str() {
                "deposit" => Ok(LedgerEvent::Deposit {
                    game: row.game.ok_or_else(|| missing("game"))?,
                    seller: row.seller.ok_or_else(|| missing("seller"))?,
                    price: event_amount(line, "price", row.price)?
                        .ok_or_else(|| missing("price"))?,
                    fee: event_amount(line, "fee", row.fee)?,
                }),
                "sale" => Ok(LedgerEvent::Sale {
                    game: row.game.ok_or_else(|| missing("game"))?,
                }),
                "withdraw" => Ok(LedgerEvent::Withdraw {
                    game: row.game.ok_or_else(|| missing("game"))?,
                }),
                "payout" => Ok(LedgerEvent::Payout {
                    seller: row.seller.ok_or_else(|| missing("seller"))?,
                    amount: event_amount(line, "amount", row.amount)?
                        .ok_or_else(|| missing("amount"))?,
                }),
                other => Err(CsvError::UnrecognizedType {
                    line,
                    event_type: other.to_string(),
                }),
            }
        }))
}

/// Write a quote in csv format, one row per line item followed by the totals
pub fn write_quote(quote: &Quote, writer: impl io::Write) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);

    for (idx, line) in quote.lines.iter().enumerate() {
        writer.serialize(QuoteRow {
            line: (idx + 1).to_string(),
            name: Some(line.item.name.clone()),
            publisher: Some(line.item.publisher.clone()),
            unit_price: Some(line.item.unit_price.to_string()),
            quantity: Some(line.item.quantity),
            fee: Some(line.fee.to_string()),
            cost: line.cost.to_string(),
        })?;
    }
    writer.serialize(QuoteRow::total("subtotal", quote.subtotal))?;
    writer.serialize(QuoteRow::total("discount", quote.discount))?;
    writer.serialize(QuoteRow::total("total", quote.total))?;

    writer.flush()?;
    Ok(())
}

/// Write seller accounts in csv format, ordered by seller id
pub fn write_sellers<'a>(
    sellers: impl IntoIterator<Item = &'a SellerAccount>,
    writer: impl io::Write,
) -> Result<(), CsvError> {
    let mut sellers: Vec<_> = sellers.into_iter().collect();
    sellers.sort_by_key(|account| account.id());

    let mut writer = csv::Writer::from_writer(writer);
    for account in sellers {
        writer.serialize(SellerRow {
            seller: account.id(),
            deposited: account.deposited_games(),
            sold: account.sold_games(),
            withdrawn: account.withdrawn_games(),
            earnings: account.total_earnings().to_string(),
            due: account.total_due().to_string(),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the session summary as a single csv row
pub fn write_summary(summary: &FinancialSummary, writer: impl io::Write) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.serialize(SummaryRow {
        treasury: summary.total_treasury.to_string(),
        commission: summary.total_commission.to_string(),
        deposit_fees: summary.total_deposit_fees.to_string(),
        due_to_sellers: summary.total_due_to_sellers.to_string(),
        treasury_with_deposit_fees: summary.treasury_with_deposit_fees().to_string(),
    })?;

    writer.flush()?;
    Ok(())
}
