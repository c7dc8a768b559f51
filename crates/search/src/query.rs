//! Supplier query generation
//!
//! The target market is Russian-speaking, so query templates carry Russian
//! wholesale terms alongside the requested product text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How aggressively to widen the supplier search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// Straight supplier and wholesale-purchase queries
    #[default]
    Direct,
    /// Supplier catalogs and price lists
    Catalog,
    /// Verified and official suppliers only
    Trusted,
    /// Suppliers near the buyer
    Local,
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchStrategy::Direct => "direct",
            SearchStrategy::Catalog => "catalog",
            SearchStrategy::Trusted => "trusted",
            SearchStrategy::Local => "local",
        };
        write!(f, "{}", name)
    }
}

/// Expand one product request into the strategy's query set
///
/// The amount, when given, is appended to every query so quantity-capable
/// wholesalers rank higher.
pub fn build_queries(
    search_query: &str,
    amount: Option<&str>,
    country_code: &str,
    strategy: SearchStrategy,
) -> Vec<String> {
    let mut queries = match strategy {
        SearchStrategy::Direct => vec![
            format!("{search_query} поставщик {country_code}"),
            format!("{search_query} купить оптом {country_code}"),
            format!("{search_query} поставщики {country_code}"),
        ],
        SearchStrategy::Catalog => vec![
            format!("{search_query} каталог поставщиков {country_code}"),
            format!("{search_query} прайс-лист поставщики {country_code}"),
            format!("{search_query} оптовые поставщики {country_code}"),
        ],
        SearchStrategy::Trusted => vec![
            format!("{search_query} проверенные поставщики {country_code}"),
            format!("{search_query} надежные поставщики {country_code}"),
            format!("{search_query} официальные поставщики {country_code}"),
        ],
        SearchStrategy::Local => vec![
            format!("{search_query} местные поставщики {country_code}"),
            format!("{search_query} региональные поставщики {country_code}"),
            format!("{search_query} поставщики рядом {country_code}"),
        ],
    };

    if let Some(amount) = amount.filter(|a| !a.trim().is_empty()) {
        for q in &mut queries {
            q.push(' ');
            q.push_str(amount);
        }
    }

    queries
}
