//! Token-weighted search representation for products.
//!
//! The PostgreSQL repository delegates this to the database's generated
//! `tsv` column; this module is the reference implementation used by the
//! in-memory repository and tests. Both weigh name terms above description
//! terms and order results by score descending, product id ascending.

use std::collections::HashMap;

/// Weight for terms found in the product name (tsvector weight A).
pub const NAME_WEIGHT: f64 = 1.0;
/// Weight for terms found in the description (tsvector weight B).
pub const DESCRIPTION_WEIGHT: f64 = 0.4;

/// A product's searchable representation, rebuilt in full whenever the
/// name or description changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchDocument {
    terms: HashMap<String, f64>,
}

impl SearchDocument {
    pub fn build(name: &str, description: Option<&str>) -> Self {
        let mut terms = HashMap::new();
        for token in tokenize(name) {
            *terms.entry(token).or_insert(0.0) += NAME_WEIGHT;
        }
        for token in description.iter().flat_map(|d| tokenize(d)) {
            *terms.entry(token).or_insert(0.0) += DESCRIPTION_WEIGHT;
        }
        Self { terms }
    }

    /// Relevance of this document for a free-text query: the summed weight
    /// of every query token present in the document.
    pub fn score(&self, query: &str) -> f64 {
        tokenize(query)
            .map(|token| self.terms.get(&token).copied().unwrap_or(0.0))
            .sum()
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_terms_outweigh_description_terms() {
        let by_name = SearchDocument::build("wireless keyboard", None);
        let by_description = SearchDocument::build("accessory", Some("wireless keyboard"));

        assert!(by_name.score("keyboard") > by_description.score("keyboard"));
    }

    #[test]
    fn test_repeated_terms_accumulate() {
        let doc = SearchDocument::build("coffee", Some("coffee coffee beans"));
        assert_eq!(doc.score("coffee"), NAME_WEIGHT + 2.0 * DESCRIPTION_WEIGHT);
    }

    #[test]
    fn test_tokenization_is_case_and_punctuation_insensitive() {
        let doc = SearchDocument::build("USB-C Hub", None);
        assert!(doc.score("usb") > 0.0);
        assert!(doc.score("c") > 0.0);
        assert!(doc.score("HUB") > 0.0);
        assert_eq!(doc.score("ethernet"), 0.0);
    }

    #[test]
    fn test_multi_token_query_sums_matches() {
        let doc = SearchDocument::build("espresso machine", Some("steel"));
        let single = doc.score("espresso");
        let double = doc.score("espresso machine");
        assert!(double > single);
    }

    #[test]
    fn test_rebuild_replaces_old_terms() {
        let doc = SearchDocument::build("teapot", None);
        assert!(doc.score("teapot") > 0.0);

        let rebuilt = SearchDocument::build("kettle", None);
        assert_eq!(rebuilt.score("teapot"), 0.0);
        assert!(rebuilt.score("kettle") > 0.0);
    }
}
