//! Structured result extracted from a completed call

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the supplier can provide the requested product or service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
    #[default]
    Unknown,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => write!(f, "available"),
            Availability::Unavailable => write!(f, "unavailable"),
            Availability::Unknown => write!(f, "unknown"),
        }
    }
}

/// Structured supplier information extracted from a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SupplierFinding {
    /// Whether the supplier can fulfil the request
    pub availability: Availability,

    /// Quoted price, kept as free text when it cannot be normalized
    pub price: Option<String>,

    /// Any other relevant details from the conversation
    pub notes: String,
}

impl SupplierFinding {
    /// The fully-unresolved finding used when extraction cannot do better
    pub fn unknown() -> Self {
        Self::default()
    }

    /// True once both required fields have been obtained
    pub fn is_resolved(&self) -> bool {
        self.availability != Availability::Unknown
            && (self.availability == Availability::Unavailable || self.price.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_finding() {
        let finding = SupplierFinding::unknown();
        assert_eq!(finding.availability, Availability::Unknown);
        assert!(finding.price.is_none());
        assert!(!finding.is_resolved());
    }

    #[test]
    fn test_resolved_finding() {
        let finding = SupplierFinding {
            availability: Availability::Available,
            price: Some("$200".to_string()),
            notes: String::new(),
        };
        assert!(finding.is_resolved());

        // An unavailable supplier is resolved without a price
        let finding = SupplierFinding {
            availability: Availability::Unavailable,
            price: None,
            notes: String::new(),
        };
        assert!(finding.is_resolved());
    }
}
