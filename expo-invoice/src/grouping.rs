use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::Result;
use crate::model::{LineItem, RecipientGroup};
use crate::record::Record;

/// Which items end up on an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingRules {
    /// Payment method billed by invoice. Only consulted when the export
    /// has a payment-method column.
    pub accepted_payment_method: String,
}

impl Default for BillingRules {
    fn default() -> Self {
        BillingRules {
            accepted_payment_method: "Invoice".to_string(),
        }
    }
}

/// Partition records by recipient. Groups come out in order of first
/// appearance and keep their items in input order.
pub fn group_records(records: &[Record], rules: &BillingRules) -> Result<Vec<RecipientGroup>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<RecipientGroup> = Vec::new();

    for record in records {
        let item = LineItem::from_record(record)?;
        match index.get(&item.recipient) {
            Some(&i) => groups[i].items.push(item),
            None => {
                log::debug!("new recipient {:?} at record {}", item.recipient, item.row);
                index.insert(item.recipient.clone(), groups.len());
                groups.push(RecipientGroup::new(item));
            }
        }
    }

    for group in &mut groups {
        group.total = group
            .billable_items(rules)
            .map(|item| item.price)
            .sum::<Decimal>();
    }
    log::info!("{} records grouped into {} recipients", records.len(), groups.len());
    Ok(groups)
}
