use crate::{ResourceKind, board::PriceTable};

/// Returns the resource with the strictly highest price.
///
/// Ties go to the kind seen first, which is declaration order for a
/// [`PriceTable`]. Returns `None` for an empty table.
pub fn most_valuable_resource(prices: &PriceTable) -> Option<ResourceKind> {
    let mut best: Option<(ResourceKind, u32)> = None;
    for (kind, price) in prices.iter() {
        match best {
            Some((_, best_price)) if price <= best_price => {}
            _ => best = Some((kind, price)),
        }
    }
    best.map(|(kind, _)| kind)
}
