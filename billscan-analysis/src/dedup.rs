//! Cross-pass deduplication and the line-item / general-charge split.

use billscan_core::{Charge, ChargeCandidate, LineItem};
use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::debug;

use crate::patterns::is_summary_description;

/// Collapse candidates sharing a description. The first occurrence wins,
/// whatever the later amounts are, and first-seen order is preserved.
///
/// Callers must feed passes in raw-text, markdown, table order.
pub fn dedup<I>(candidates: I) -> Vec<Charge>
where
    I: IntoIterator<Item = ChargeCandidate>,
{
    let mut seen: IndexMap<String, Charge> = IndexMap::new();
    let mut dropped = 0usize;

    for c in candidates {
        match seen.entry(c.description.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(c);
            }
            Entry::Occupied(kept) => {
                if kept.get().amount != c.amount {
                    debug!(
                        description = %c.description,
                        kept = kept.get().amount,
                        dropped = c.amount,
                        "duplicate description with a different amount"
                    );
                }
                dropped += 1;
            }
        }
    }

    debug!(kept = seen.len(), dropped, "deduplicated charges");
    seen.into_values().collect()
}

/// Drop table total rows and anything on the summary stop-list.
pub fn drop_summary_rows(charges: Vec<Charge>) -> Vec<Charge> {
    charges
        .into_iter()
        .filter(|c| !c.is_total_row() && !is_summary_description(&c.description))
        .collect()
}

/// Whether a charge belongs to a specific phone line or device.
pub fn is_line_item(charge: &Charge) -> bool {
    let d = charge.description.to_lowercase();
    charge.line_number.is_some()
        || charge.charge_type.is_line_bound()
        || d.contains("line")
        || d.contains("phone")
        || charge.is_device_charge
}

/// Split charges into line items and general charges, keeping order.
pub fn partition(charges: Vec<Charge>) -> (Vec<LineItem>, Vec<Charge>) {
    let (items, others): (Vec<Charge>, Vec<Charge>) = charges.into_iter().partition(is_line_item);
    (items.into_iter().map(LineItem::new).collect(), others)
}
