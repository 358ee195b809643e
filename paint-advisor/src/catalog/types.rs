// Product records as the catalog collaborator returns them

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::slots::{Environment, Finish, Surface};

/// Stable catalog identifier, also the last tie-breaker in ranking
pub type ProductId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductEnvironment {
    #[serde(alias = "interno")]
    Interior,
    #[serde(alias = "externo")]
    Exterior,
    #[serde(alias = "ambos")]
    Both,
}

impl ProductEnvironment {
    /// Whether a product labeled with this environment may be used in `env`
    pub fn supports(&self, env: Environment) -> bool {
        match (self, env) {
            (ProductEnvironment::Both, _) => true,
            (ProductEnvironment::Interior, Environment::Interior) => true,
            (ProductEnvironment::Exterior, Environment::Exterior) => true,
            _ => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProductEnvironment::Interior => "interior",
            ProductEnvironment::Exterior => "exterior",
            ProductEnvironment::Both => "interior and exterior",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductLine {
    Premium,
    Standard,
    Economy,
}

impl Default for ProductLine {
    fn default() -> Self {
        ProductLine::Standard
    }
}

impl fmt::Display for ProductLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProductLine::Premium => "Premium",
            ProductLine::Standard => "Standard",
            ProductLine::Economy => "Economy",
        })
    }
}

/// One catalog row. Every fact a grounded reply states must come from here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateProduct {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub environment: ProductEnvironment,
    pub surface_compatibility: Vec<Surface>,
    pub finish: Finish,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub line: ProductLine,
    #[serde(default)]
    pub description: Option<String>,
}

impl CandidateProduct {
    pub fn supports_surface(&self, surface: Surface) -> bool {
        self.surface_compatibility.contains(&surface)
    }

    /// Case-insensitive feature lookup on word boundaries, e.g. `has_feature("uv")`
    pub fn has_feature(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.features
            .iter()
            .any(|feature| crate::slots::vocab::contains_term(&feature.to_lowercase(), &keyword))
    }

    /// Stored color in canonical form, if any
    pub fn canonical_color(&self) -> Option<String> {
        self.color
            .as_deref()
            .map(crate::slots::vocab::canonical_color)
            .filter(|c| !c.is_empty())
    }

    /// Whether the stored color matches `color` (both canonicalized)
    pub fn matches_color(&self, color: &str) -> bool {
        let wanted = crate::slots::vocab::canonical_color(color);
        self.canonical_color().map_or(false, |c| c == wanted)
    }

    /// A stored color that differs from the requested one.
    /// Colorless rows (tintable bases) never contradict.
    pub fn contradicts_color(&self, color: &str) -> bool {
        self.canonical_color().is_some() && !self.matches_color(color)
    }

    /// All free text on the record, lowercased, used by grounding checks
    pub fn record_text(&self) -> String {
        let mut parts = vec![
            self.name.clone(),
            format!("{:.2}", self.price),
            self.environment.label().to_string(),
            self.finish.label().to_string(),
            self.line.to_string(),
        ];
        parts.extend(self.surface_compatibility.iter().map(|s| s.label().to_string()));
        parts.extend(self.features.iter().cloned());
        if let Some(color) = &self.color {
            parts.push(color.clone());
            parts.push(crate::slots::vocab::canonical_color(color));
        }
        if let Some(description) = &self.description {
            parts.push(description.clone());
        }
        parts.join(" | ").to_lowercase()
    }
}

/// How many catalog products exist for one color
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorAvailability {
    pub color: String,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserializes_portuguese_labels() {
        let json = r#"{
            "id": 7,
            "name": "Suvinil Fosco Completo",
            "price": 189.9,
            "environment": "interno",
            "surface_compatibility": ["parede"],
            "finish": "fosco",
            "features": ["lavável", "sem odor"],
            "color": "Azul",
            "line": "premium"
        }"#;

        let product: CandidateProduct = serde_json::from_str(json).unwrap();
        assert_eq!(product.environment, ProductEnvironment::Interior);
        assert_eq!(product.surface_compatibility, vec![Surface::Wall]);
        assert_eq!(product.finish, Finish::Matte);
        assert_eq!(product.line, ProductLine::Premium);
        assert_eq!(product.canonical_color().as_deref(), Some("blue"));
        assert!(product.has_feature("sem odor"));
        assert!(!product.has_feature("odor-free"));
    }

    #[test]
    fn test_environment_support() {
        assert!(ProductEnvironment::Both.supports(Environment::Exterior));
        assert!(ProductEnvironment::Interior.supports(Environment::Interior));
        assert!(!ProductEnvironment::Interior.supports(Environment::Exterior));
        assert!(!ProductEnvironment::Exterior.supports(Environment::Unknown));
    }

    #[test]
    fn test_colorless_rows_never_contradict() {
        let json = r#"{"id": 1, "name": "Base", "price": 10.0, "environment": "both",
            "surface_compatibility": ["wall"], "finish": "matte"}"#;
        let product: CandidateProduct = serde_json::from_str(json).unwrap();
        assert!(!product.contradicts_color("green"));
        assert!(!product.matches_color("green"));
    }
}
