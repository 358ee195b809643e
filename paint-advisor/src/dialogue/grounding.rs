// Post-generation grounding check for product replies
//
// A reply that names a product may only state facts carried by that product's
// record: no other catalog name or brand, no number the record does not
// contain, and no color, finish, environment or surface the record does not list.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::CandidateProduct;
use crate::slots::vocab::{
    self, BRAND_TERMS, COLOR_TERMS, ENVIRONMENT_TERMS, FINISH_TERMS, SURFACE_TERMS,
};

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)?").unwrap());

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Violation {
    /// Another product's name, or a brand the record does not carry
    ForeignProduct(String),
    /// A number that matches no numeric field of the record
    UngroundedNumber(String),
    /// A color, finish, environment or surface the record does not carry
    UngroundedTerm(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::ForeignProduct(name) => write!(f, "mentions other product '{}'", name),
            Violation::UngroundedNumber(n) => write!(f, "number '{}' not in record", n),
            Violation::UngroundedTerm(t) => write!(f, "attribute '{}' not in record", t),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("reply is not grounded in the selected product: {}", .violations.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("; "))]
pub struct GroundingViolation {
    pub violations: Vec<Violation>,
}

/// Checks a rendered reply against one product record
#[derive(Debug, Clone, Default)]
pub struct GroundingValidator;

impl GroundingValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate `reply` against `product`.
    ///
    /// `competing_names` are the other product names known this turn (the
    /// other candidates plus whatever the catalog can enumerate); none of them
    /// may appear. Manufacturer names are flagged unless the record carries them.
    pub fn validate(
        &self,
        reply: &str,
        product: &CandidateProduct,
        competing_names: &[String],
    ) -> Result<(), GroundingViolation> {
        let lowered = reply.to_lowercase();
        let own_name = product.name.to_lowercase();
        // Mask the product's own name so a competitor whose name is a prefix of it
        // is not reported, and so digits in the name are not re-checked
        let masked = lowered.replace(&own_name, &" ".repeat(own_name.len()));

        let mut violations = Vec::new();

        for name in competing_names {
            let name = name.trim().to_lowercase();
            if name.is_empty() || name == own_name {
                continue;
            }
            if vocab::contains_term(&masked, &name) {
                violations.push(Violation::ForeignProduct(name));
            }
        }

        let record = product.record_text().to_lowercase();
        for brand in BRAND_TERMS {
            if vocab::contains_term(&masked, brand) && !vocab::contains_term(&record, brand) {
                violations.push(Violation::ForeignProduct(brand.to_string()));
            }
        }

        let allowed_numbers = record_numbers(product);
        for token in NUMBER.find_iter(&masked) {
            let text = token.as_str();
            let grounded = parse_number(text)
                .map_or(false, |n| allowed_numbers.iter().any(|a| (a - n).abs() < 1e-6));
            if !grounded {
                violations.push(Violation::UngroundedNumber(text.to_string()));
            }
        }

        let stored_color = product.canonical_color();
        for (_, color) in vocab::scan_all(&masked, COLOR_TERMS) {
            if stored_color.as_deref() != Some(color) {
                violations.push(Violation::UngroundedTerm(color.to_string()));
            }
        }
        for (_, finish) in vocab::scan_all(&masked, FINISH_TERMS) {
            if finish != product.finish {
                violations.push(Violation::UngroundedTerm(finish.label().to_string()));
            }
        }
        for (_, env) in vocab::scan_all(&masked, ENVIRONMENT_TERMS) {
            if !product.environment.supports(env) {
                violations.push(Violation::UngroundedTerm(env.label().to_string()));
            }
        }
        for (_, surface) in vocab::scan_all(&masked, SURFACE_TERMS) {
            if !product.supports_surface(surface) {
                violations.push(Violation::UngroundedTerm(surface.label().to_string()));
            }
        }

        violations.dedup();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(GroundingViolation { violations })
        }
    }
}

fn parse_number(token: &str) -> Option<f64> {
    token.replace(',', ".").parse().ok()
}

/// Every number the record states: the price plus any digits in its text fields
fn record_numbers(product: &CandidateProduct) -> Vec<f64> {
    let mut numbers = vec![product.price];
    let mut texts: Vec<&str> = vec![&product.name];
    texts.extend(product.features.iter().map(String::as_str));
    if let Some(description) = &product.description {
        texts.push(description);
    }
    if let Some(color) = &product.color {
        texts.push(color);
    }
    for text in texts {
        numbers.extend(NUMBER.find_iter(text).filter_map(|m| parse_number(m.as_str())));
    }
    numbers
}
