// Reference retriever over a catalog held in memory

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;

use super::{CandidateProduct, CatalogRetriever, ColorAvailability, RetrievalError};
use crate::slots::SlotSet;

/// Exact-filtering retriever loaded from a JSON array of products.
///
/// Environment and surface are hard filters when known. Color and finish only
/// reorder, except that rows with a contradicting stored color are dropped
/// whenever the requested color exists among the filtered rows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Vec<CandidateProduct>,
}

impl InMemoryCatalog {
    pub fn from_products(mut products: Vec<CandidateProduct>) -> Self {
        products.sort_by_key(|p| p.id);
        Self { products }
    }

    pub fn from_json_str(json: &str) -> Result<Self, RetrievalError> {
        let products: Vec<CandidateProduct> = serde_json::from_str(json)
            .map_err(|e| RetrievalError::InvalidCatalog(e.to_string()))?;

        let mut seen = std::collections::HashSet::new();
        for product in &products {
            if !seen.insert(product.id) {
                return Err(RetrievalError::InvalidCatalog(format!(
                    "duplicate product id {}",
                    product.id
                )));
            }
            if !product.price.is_finite() || product.price < 0.0 {
                return Err(RetrievalError::InvalidCatalog(format!(
                    "product {} has an invalid price",
                    product.id
                )));
            }
        }

        Ok(Self::from_products(products))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RetrievalError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn products(&self) -> &[CandidateProduct] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn filter(&self, slots: &SlotSet) -> Vec<CandidateProduct> {
        let mut rows: Vec<CandidateProduct> = self
            .products
            .iter()
            .filter(|p| !slots.environment.is_known() || p.environment.supports(slots.environment))
            .filter(|p| !slots.surface.is_known() || p.supports_surface(slots.surface))
            .cloned()
            .collect();

        if let Some(color) = &slots.color {
            if rows.iter().any(|p| p.matches_color(color)) {
                rows.retain(|p| !p.contradicts_color(color));
            }
        }

        // Preferred rows first, then catalog id
        rows.sort_by_key(|p| {
            let color_miss = slots.color.as_ref().map_or(true, |c| !p.matches_color(c));
            let finish_miss = slots.finish.map_or(true, |f| p.finish != f);
            (color_miss, finish_miss, p.id)
        });
        rows
    }
}

#[async_trait]
impl CatalogRetriever for InMemoryCatalog {
    async fn retrieve(
        &self,
        slots: &SlotSet,
        limit: usize,
    ) -> Result<Vec<CandidateProduct>, RetrievalError> {
        let mut rows = self.filter(slots);
        rows.truncate(limit);
        tracing::debug!(count = rows.len(), limit, "catalog rows retrieved");
        Ok(rows)
    }

    async fn available_colors(&self) -> Result<Vec<ColorAvailability>, RetrievalError> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for color in self.products.iter().filter_map(|p| p.canonical_color()) {
            *counts.entry(color).or_insert(0) += 1;
        }

        let mut colors: Vec<ColorAvailability> = counts
            .into_iter()
            .map(|(color, count)| ColorAvailability { color, count })
            .collect();
        colors.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.color.cmp(&b.color)));
        Ok(colors)
    }

    async fn product_names(&self) -> Result<Vec<String>, RetrievalError> {
        Ok(self.products.iter().map(|p| p.name.clone()).collect())
    }
}
