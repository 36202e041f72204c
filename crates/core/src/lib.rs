//! Core business logic for Reimburse.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and routing decisions live here.
//!
//! # Modules
//!
//! - `approval` - Policy resolution, approval state machine and history ledger
//! - `currency` - Conversion into a company's base currency

pub mod approval;
pub mod currency;

/// Default expense categories offered to every company.
pub const DEFAULT_CATEGORIES: [&str; 7] = [
    "Travel",
    "Meals",
    "Accommodation",
    "Office Supplies",
    "Equipment",
    "Training",
    "Other",
];

/// Default categories followed by `used` ones, without duplicates, order kept.
#[must_use]
pub fn merge_categories<I, S>(used: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut merged: Vec<String> = DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect();
    for category in used {
        let category = category.as_ref().trim();
        if !category.is_empty() && !merged.iter().any(|c| c == category) {
            merged.push(category.to_string());
        }
    }
    merged
}
