//! Bill export: a priced prescription plus traceability metadata.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::{DrugEntry, ParseResult};

const CSV_HEADER: &str =
    "bill_id,drug,frequency,duration,meal_instruction,total_units,unit_price,cost\n";

/// Exported bill for one prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillExport {
    /// Export metadata
    pub metadata: BillMetadata,
    /// Priced entries in prescription order
    pub medicines: Vec<DrugEntry>,
    /// Sum of all defined entry costs
    pub total_cost: f64,
}

/// Bill export metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillMetadata {
    /// Unique bill identifier
    pub bill_id: String,
    /// Hex SHA-256 of the raw prescription text
    pub prescription_sha256: String,
    /// Export timestamp
    pub generated_at: String,
    /// Entries with a computed cost
    pub priced_items: usize,
    /// Entries left unpriced (missing frequency)
    pub unpriced_items: usize,
}

impl BillExport {
    /// Create a bill export from a prescription and its parse result.
    pub fn new(prescription: &str, result: &ParseResult) -> Self {
        let unpriced_items = result.unpriced().count();

        Self {
            metadata: BillMetadata {
                bill_id: uuid::Uuid::new_v4().to_string(),
                prescription_sha256: prescription_digest(prescription),
                generated_at: chrono::Utc::now().to_rfc3339(),
                priced_items: result.medicines.len() - unpriced_items,
                unpriced_items,
            },
            medicines: result.medicines.clone(),
            total_cost: result.total_cost,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format, one row per medicine. Nulls are empty fields.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);

        for entry in &self.medicines {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                escape_csv(&self.metadata.bill_id),
                escape_csv(&entry.drug),
                optional(entry.frequency),
                entry.duration,
                escape_csv(entry.meal_instruction.as_deref().unwrap_or("")),
                optional(entry.total_units),
                optional(entry.unit_price),
                optional(entry.cost),
            ));
        }

        csv
    }
}

/// Hex SHA-256 digest of a prescription text.
pub fn prescription_digest(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
