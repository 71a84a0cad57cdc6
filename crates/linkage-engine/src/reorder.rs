//! Dense 1..N ordering of an intake's active links.

use linkage_core::entities::EntityLink;
use linkage_core::requests::LinkOrder;

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq)]
pub struct ReorderOutcome {
    /// The list in its new order, `link_order` rewritten.
    pub links: Vec<EntityLink>,
    /// Persist instructions for every position. Empty for a no-op move.
    pub orders: Vec<LinkOrder>,
}

impl ReorderOutcome {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Move `moved_id` to the slot currently held by `target_id`.
///
/// The moved link is taken out and reinserted at the target's index, so a
/// link dragged downwards lands after the target and one dragged upwards
/// lands before it. The whole list is renumbered.
///
/// # Errors
///
/// `NotFound` when either id is absent from `current`. Moving a present link
/// onto itself is a no-op.
pub fn reorder(
    current: &[EntityLink],
    moved_id: &str,
    target_id: &str,
) -> Result<ReorderOutcome, EngineError> {
    let position = |id: &str| {
        current
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    };
    let from = position(moved_id)?;
    if moved_id == target_id {
        return Ok(ReorderOutcome {
            links: current.to_vec(),
            orders: Vec::new(),
        });
    }
    let to = position(target_id)?;

    let mut links = current.to_vec();
    let moved = links.remove(from);
    links.insert(to, moved);
    let orders = renumber(&mut links);
    Ok(ReorderOutcome { links, orders })
}

/// Rewrite `link_order` to `index + 1` and return the full instruction set.
pub fn renumber(links: &mut [EntityLink]) -> Vec<LinkOrder> {
    links
        .iter_mut()
        .zip(1u32..)
        .map(|(link, order)| {
            link.link_order = order;
            LinkOrder {
                link_id: link.id.clone(),
                link_order: order,
            }
        })
        .collect()
}

/// Active links sorted by `link_order`, ties broken by id.
#[must_use]
pub fn active_in_order(links: &[EntityLink]) -> Vec<EntityLink> {
    let mut active: Vec<EntityLink> = links.iter().filter(|l| l.is_active()).cloned().collect();
    active.sort_by(|a, b| a.link_order.cmp(&b.link_order).then_with(|| a.id.cmp(&b.id)));
    active
}

/// Whether the active links carry exactly the orders `1..=N`.
#[must_use]
pub fn is_contiguous(links: &[EntityLink]) -> bool {
    let mut orders: Vec<u32> = links
        .iter()
        .filter(|l| l.is_active())
        .map(|l| l.link_order)
        .collect();
    orders.sort_unstable();
    orders.iter().copied().eq(1..=u32::try_from(orders.len()).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ids, ordered};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn same_id_is_a_noop() {
        let links = ordered(3);
        let outcome = reorder(&links, "L2", "L2").unwrap();
        assert!(outcome.is_noop());
        assert_eq!(outcome.links, links);
    }

    #[test]
    fn same_unknown_id_is_not_found() {
        let err = reorder(&ordered(2), "nope", "nope").unwrap_err();
        assert!(matches!(err, EngineError::NotFound(ref id) if id == "nope"));
    }

    #[rstest]
    #[case("L1", "L3", vec!["L2", "L3", "L1", "L4"])]
    #[case("L4", "L2", vec!["L1", "L4", "L2", "L3"])]
    #[case("L1", "L2", vec!["L2", "L1", "L3", "L4"])]
    #[case("L4", "L1", vec!["L4", "L1", "L2", "L3"])]
    fn moves_take_the_target_slot(
        #[case] moved: &str,
        #[case] target: &str,
        #[case] expected: Vec<&str>,
    ) {
        let outcome = reorder(&ordered(4), moved, target).unwrap();
        assert_eq!(ids(&outcome.links), expected);
        let emitted: Vec<(&str, u32)> = outcome
            .orders
            .iter()
            .map(|o| (o.link_id.as_str(), o.link_order))
            .collect();
        let want: Vec<(&str, u32)> = expected.iter().copied().zip(1..).collect();
        assert_eq!(emitted, want);
        assert!(is_contiguous(&outcome.links));
    }

    #[rstest]
    #[case("L9", "L1")]
    #[case("L1", "L9")]
    fn missing_id_is_not_found(#[case] moved: &str, #[case] target: &str) {
        let err = reorder(&ordered(3), moved, target).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(ref id) if id == "L9"));
    }

    #[test]
    fn input_is_left_untouched() {
        let links = ordered(3);
        let before = links.clone();
        let _ = reorder(&links, "L3", "L1").unwrap();
        assert_eq!(links, before);
    }

    #[test]
    fn contiguity_ignores_deleted_rows() {
        let mut links = ordered(3);
        links[1].deleted_at = Some(links[1].created_at);
        assert!(!is_contiguous(&links));
        let mut active = active_in_order(&links);
        renumber(&mut active);
        assert!(is_contiguous(&active));
        assert_eq!(ids(&active), vec!["L1", "L3"]);
    }
}
