//! Product dimension builder

use std::collections::{BTreeMap, HashSet};

use tracing::info;

use super::error::DimensionError;
use super::keygen::KeySequence;
use super::rules::{CATEGORY_GROUP_OTHER, CATEGORY_GROUP_UNCATEGORIZED};
use crate::models::dimensions::ProductDimension;
use crate::models::staging::ProductRecord;

/// Builds the product dimension from staged product rows
pub struct ProductDimensionBuilder<'a> {
    pub category_groups: &'a BTreeMap<String, String>,
}

impl ProductDimensionBuilder<'_> {
    pub fn build(&self, products: &[ProductRecord]) -> Result<Vec<ProductDimension>, DimensionError> {
        let mut keys = KeySequence::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut rows = Vec::new();

        for product in products {
            if !seen.insert(product.product_id.as_str()) {
                continue;
            }

            let category_group = match &product.category {
                None => CATEGORY_GROUP_UNCATEGORIZED.to_string(),
                Some(category) => self
                    .category_groups
                    .get(category)
                    .cloned()
                    .unwrap_or_else(|| CATEGORY_GROUP_OTHER.to_string()),
            };

            let volume_cm3 = match (product.length_cm, product.height_cm, product.width_cm) {
                (Some(l), Some(h), Some(w)) => Some(l * h * w),
                _ => None,
            };

            rows.push(ProductDimension {
                product_key: keys.next_key(),
                product_id: product.product_id.clone(),
                category: product.category.clone(),
                category_group,
                weight_g: product.weight_g,
                length_cm: product.length_cm,
                height_cm: product.height_cm,
                width_cm: product.width_cm,
                volume_cm3,
                photos_qty: product.photos_qty,
                has_photos: product.photos_qty.is_some_and(|n| n > 0),
            });
        }

        info!(rows = rows.len(), "Product dimension built");
        Ok(rows)
    }
}
