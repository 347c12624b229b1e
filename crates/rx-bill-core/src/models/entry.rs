//! Parsed prescription models.

use serde::{Deserialize, Serialize};

/// One prescribed medicine with its dosing and cost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugEntry {
    /// Drug name as matched in the prescription (lowercase)
    pub drug: String,
    /// Doses per day
    pub frequency: Option<u32>,
    /// Days of treatment (1 when the prescription never says)
    pub duration: u32,
    /// Meal timing phrase, e.g. "after meals"
    pub meal_instruction: Option<String>,
    /// frequency × duration
    pub total_units: Option<u64>,
    /// Price per unit from the price table
    pub unit_price: Option<f64>,
    /// total_units × unit_price, rounded to cents
    pub cost: Option<f64>,
}

impl DrugEntry {
    /// Create an unpriced entry.
    pub fn new(drug: impl Into<String>, frequency: Option<u32>, duration: u32) -> Self {
        Self {
            drug: drug.into(),
            frequency,
            duration,
            meal_instruction: None,
            total_units: None,
            unit_price: None,
            cost: None,
        }
    }

    /// Whether the entry has enough dosing data to be costed.
    pub fn is_costable(&self) -> bool {
        self.frequency.is_some()
    }

    /// Whether a cost has been computed.
    pub fn is_priced(&self) -> bool {
        self.cost.is_some()
    }
}

/// Result of parsing and pricing one prescription.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParseResult {
    /// Entries in prescription order
    pub medicines: Vec<DrugEntry>,
    /// Sum of all defined entry costs
    pub total_cost: f64,
}

impl ParseResult {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Entries that could not be costed.
    pub fn unpriced(&self) -> impl Iterator<Item = &DrugEntry> {
        self.medicines.iter().filter(|e| !e.is_priced())
    }
}
