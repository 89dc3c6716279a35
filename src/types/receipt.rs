//! Receipt Types
//!
//! Transaction receipt records uploaded to the Monzo receipts API.

use serde::{Deserialize, Serialize};

/// A receipt attached to a single transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Monzo transaction the receipt belongs to.
    pub transaction_id: String,
    /// Caller-chosen identifier; uploading the same one again replaces the receipt.
    pub external_id: String,
    /// Total in minor units.
    pub total: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub taxes: Vec<Tax>,
}

/// Line item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub description: String,
    pub quantity: i32,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub sub_items: Vec<SubItem>,
}

/// Breakdown of a line item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubItem {
    pub description: String,
    pub quantity: i32,
    pub unit: String,
    pub amount: i64,
    pub currency: String,
    #[serde(rename = "tax")]
    pub taxes: i32,
}

/// Tax line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tax {
    pub description: String,
    pub amount: i64,
    pub currency: String,
    pub tax_number: String,
}
