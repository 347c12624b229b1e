//! Cost calculation for parsed drug entries.
//!
//! An entry is costed only when its frequency is known (duration is always
//! known after defaults). Drugs without a price-table row are priced at zero;
//! entries that cannot be costed keep `None` for units, price and cost so
//! "unpriced" stays distinct from "free".

use crate::catalog::PriceTable;
use crate::models::{DrugEntry, ParseResult};

/// Price every entry and total the defined costs.
pub fn price(entries: Vec<DrugEntry>, prices: &PriceTable) -> ParseResult {
    let medicines: Vec<DrugEntry> = entries
        .into_iter()
        .map(|entry| price_entry(entry, prices))
        .collect();

    let total: f64 = medicines.iter().filter_map(|e| e.cost).sum();

    ParseResult {
        medicines,
        total_cost: round_cents(total),
    }
}

/// Fill units, unit price and cost on a single entry.
pub fn price_entry(mut entry: DrugEntry, prices: &PriceTable) -> DrugEntry {
    let Some(frequency) = entry.frequency else {
        tracing::debug!(drug = %entry.drug, "no frequency found, entry left unpriced");
        entry.total_units = None;
        entry.unit_price = None;
        entry.cost = None;
        return entry;
    };

    let total_units = u64::from(frequency) * u64::from(entry.duration);
    let unit_price = prices.get(&entry.drug).unwrap_or_else(|| {
        tracing::warn!(drug = %entry.drug, "drug has no price-table entry, pricing at 0.0");
        0.0
    });

    entry.total_units = Some(total_units);
    entry.unit_price = Some(unit_price);
    entry.cost = Some(round_cents(total_units as f64 * unit_price));
    entry
}

/// Round a monetary amount to two decimal places.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
