//! Label normalization for imported sales.
//!
//! Spreadsheet exports carry free-text interval and sale-type labels ("Venda única",
//! "Serviço", "Anual", ...). They are folded into [`SaleKind`] and [`BillingInterval`]
//! once, when an [`ImportedSale`](super::domain::ImportedSale) becomes a
//! [`SaleRecord`](super::domain::SaleRecord); the engine never looks at the raw text.

use serde::{Deserialize, Serialize};

use super::domain::SaleKind;

const ONE_TIME_PATTERNS: [&str; 3] = ["venda unica", "one time", "onetime"];
const SERVICE_PATTERNS: [&str; 2] = ["servico", "service"];

/// Billing cadence of a sale, as far as commission routing cares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingInterval {
    Monthly,
    Annual,
    OneTimeSale,
    Other(String),
}

impl BillingInterval {
    pub fn from_label(label: &str) -> Self {
        let normalized = normalize_label(label);
        match normalized.as_str() {
            "mensal" | "monthly" => BillingInterval::Monthly,
            "anual" | "annual" | "yearly" => BillingInterval::Annual,
            _ if matches_any(&normalized, &ONE_TIME_PATTERNS) => BillingInterval::OneTimeSale,
            _ => BillingInterval::Other(label.trim().to_string()),
        }
    }

    pub fn is_one_time_sale(&self) -> bool {
        matches!(self, BillingInterval::OneTimeSale)
    }

    pub fn is_annual(&self) -> bool {
        matches!(self, BillingInterval::Annual)
    }
}

/// Decide the sale kind from its type and interval labels.
///
/// A one-time-sale match on either label wins over a service match; anything else is recurring.
pub fn classify_sale(sale_type: Option<&str>, interval: Option<&str>) -> SaleKind {
    let labels: Vec<String> = [sale_type, interval]
        .into_iter()
        .flatten()
        .map(normalize_label)
        .collect();

    if labels
        .iter()
        .any(|label| matches_any(label, &ONE_TIME_PATTERNS))
    {
        SaleKind::OneTime
    } else if labels
        .iter()
        .any(|label| matches_any(label, &SERVICE_PATTERNS))
    {
        SaleKind::Service
    } else {
        SaleKind::Recurring
    }
}

fn matches_any(normalized: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|pattern| normalized.contains(pattern))
}

/// Lowercase, strip diacritics and collapse separators to single spaces.
fn normalize_label(label: &str) -> String {
    let folded: String = label
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}
