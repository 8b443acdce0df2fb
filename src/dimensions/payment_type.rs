//! Payment type dimension builder

use std::collections::{BTreeMap, HashSet};

use tracing::info;

use super::error::DimensionError;
use super::keygen::KeySequence;
use super::rules::PAYMENT_CATEGORY_OTHER;
use crate::models::dimensions::PaymentTypeDimension;
use crate::models::staging::PaymentRecord;

/// Builds the small payment type lookup dimension from observed payments
pub struct PaymentTypeDimensionBuilder<'a> {
    pub categories: &'a BTreeMap<String, String>,
}

impl PaymentTypeDimensionBuilder<'_> {
    pub fn build(
        &self,
        payments: &[PaymentRecord],
    ) -> Result<Vec<PaymentTypeDimension>, DimensionError> {
        let mut keys = KeySequence::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut rows = Vec::new();

        for payment in payments {
            if !seen.insert(payment.payment_type.as_str()) {
                continue;
            }
            let category = self
                .categories
                .get(&payment.payment_type)
                .cloned()
                .unwrap_or_else(|| PAYMENT_CATEGORY_OTHER.to_string());
            rows.push(PaymentTypeDimension {
                payment_type_key: keys.next_key(),
                payment_type: payment.payment_type.clone(),
                category,
            });
        }

        info!(rows = rows.len(), "Payment type dimension built");
        Ok(rows)
    }
}
