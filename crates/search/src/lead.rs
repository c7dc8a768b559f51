//! Lead analysis over raw search hits
//!
//! Filters hits down to ones that look like actual suppliers, classifies
//! them, and pulls phone numbers and email addresses out of the snippets.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::serp::SerpHit;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?[0-9][0-9\s\-\(\)]{9,}").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}").unwrap());

/// Words that mark a hit as supplier-related, Russian and English
const SUPPLIER_KEYWORDS: &[&str] = &[
    "поставщик",
    "опт",
    "дистрибьютор",
    "производитель",
    "купить",
    "продажа",
    "supplier",
    "wholesale",
    "distributor",
    "manufacturer",
];

/// A candidate supplier distilled from one search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierLead {
    pub name: String,
    pub website: String,
    /// Phone and email pulled from the snippet, empty when none were found
    pub contact_info: String,
    pub supplier_type: String,
    pub location: String,
    pub source: String,
}

/// Distill hits into deduplicated leads
///
/// Hits without a supplier keyword in title or snippet are dropped.
/// Duplicates collapse on website, falling back to name, first hit wins.
pub fn analyze_hits(hits: &[SerpHit], country_code: &str) -> Vec<SupplierLead> {
    let mut leads: Vec<SupplierLead> = Vec::new();

    for hit in hits {
        let Some(lead) = lead_from_hit(hit, country_code) else {
            continue;
        };
        let key = if lead.website.is_empty() {
            &lead.name
        } else {
            &lead.website
        };
        let duplicate = leads.iter().any(|l| {
            let existing = if l.website.is_empty() {
                &l.name
            } else {
                &l.website
            };
            existing == key
        });
        if !duplicate {
            leads.push(lead);
        }
    }

    leads
}

fn lead_from_hit(hit: &SerpHit, country_code: &str) -> Option<SupplierLead> {
    let title = hit.title.to_lowercase();
    let snippet = hit.snippet.to_lowercase();

    let is_supplier = SUPPLIER_KEYWORDS
        .iter()
        .any(|kw| title.contains(kw) || snippet.contains(kw));
    if !is_supplier {
        return None;
    }

    Some(SupplierLead {
        name: company_name(&hit.title),
        website: hit.link.clone(),
        contact_info: contact_info(&hit.snippet),
        supplier_type: classify(&title),
        location: country_code.to_string(),
        source: hit.source.clone(),
    })
}

/// First three words of the title stand in for a company name
fn company_name(title: &str) -> String {
    let words: Vec<&str> = title.split_whitespace().take(3).collect();
    if words.is_empty() {
        title.to_string()
    } else {
        words.join(" ")
    }
}

fn classify(title: &str) -> String {
    if ["производитель", "завод", "фабрика"]
        .iter()
        .any(|w| title.contains(w))
    {
        "производитель".to_string()
    } else if ["дистрибьютор", "дистрибуция"]
        .iter()
        .any(|w| title.contains(w))
    {
        "дистрибьютор".to_string()
    } else if ["опт", "оптовый"].iter().any(|w| title.contains(w)) {
        "оптовый поставщик".to_string()
    } else {
        "поставщик".to_string()
    }
}

fn contact_info(snippet: &str) -> String {
    let mut parts = Vec::new();
    if let Some(phone) = PHONE_RE.find(snippet) {
        parts.push(format!("Тел: {}", phone.as_str().trim()));
    }
    if let Some(email) = EMAIL_RE.find(snippet) {
        parts.push(format!("Email: {}", email.as_str()));
    }
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, link: &str, snippet: &str) -> SerpHit {
        SerpHit {
            title: title.to_string(),
            link: link.to_string(),
            snippet: snippet.to_string(),
            source: "google".to_string(),
        }
    }

    #[test]
    fn test_non_supplier_hits_dropped() {
        let hits = vec![
            hit("Как выбрать стул", "https://blog.kz", "Обзор моделей"),
            hit(
                "Стулья оптом от производителя",
                "https://chairs.kz",
                "Купить оптом со склада",
            ),
        ];
        let leads = analyze_hits(&hits, "kz");
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].website, "https://chairs.kz");
        assert_eq!(leads[0].supplier_type, "производитель");
    }

    #[test]
    fn test_contact_extraction() {
        let hits = vec![hit(
            "Поставщик мебели",
            "https://mebel.kz",
            "Звоните +7 727 123 45 67 или пишите sales@mebel.kz",
        )];
        let leads = analyze_hits(&hits, "kz");
        let contact = &leads[0].contact_info;
        assert!(contact.contains("Тел: +7 727 123 45 67"));
        assert!(contact.contains("Email: sales@mebel.kz"));
    }

    #[test]
    fn test_dedup_by_website() {
        let hits = vec![
            hit("Поставщик А", "https://same.kz", "опт"),
            hit("Поставщик Б", "https://same.kz", "опт"),
            hit("Поставщик В", "https://other.kz", "опт"),
        ];
        let leads = analyze_hits(&hits, "kz");
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].name, "Поставщик А");
    }

    #[test]
    fn test_company_name_truncated_to_three_words() {
        assert_eq!(
            company_name("Оптовый поставщик офисной мебели Алматы"),
            "Оптовый поставщик офисной"
        );
    }
}
