//! Master item order for a slot.
//!
//! Each file lists its line items in its own order and may add items the
//! others lack. The master order keeps every item once, placing a new item
//! right after the closest preceding item that was already known.

use std::collections::HashMap;

use crate::label::ItemLabel;

#[derive(Debug, Clone, Default)]
pub struct MasterItemOrder {
    items: Vec<ItemLabel>,
    positions: HashMap<ItemLabel, usize>,
}

impl MasterItemOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn contains(&self, item: &ItemLabel) -> bool {
        self.positions.contains_key(item)
    }

    /// Fold one chunk's item order into the master order.
    ///
    /// The first order seeds the master as-is. For later ones, a known item
    /// becomes the anchor; an unknown item is inserted right after the
    /// current anchor (at the front if none has been seen yet) and becomes
    /// the new anchor itself.
    pub fn extend(&mut self, order: &[ItemLabel]) {
        if self.items.is_empty() {
            for item in order {
                self.push(item.clone());
            }
            return;
        }

        let mut anchor: Option<usize> = None;
        for item in order {
            if let Some(&pos) = self.positions.get(item) {
                anchor = Some(pos);
                continue;
            }

            let at = anchor.map_or(0, |pos| pos + 1);
            self.items.insert(at, item.clone());
            self.reindex_from(at);
            anchor = Some(at);
        }
    }

    fn push(&mut self, item: ItemLabel) {
        if self.positions.contains_key(&item) {
            return;
        }
        self.positions.insert(item.clone(), self.items.len());
        self.items.push(item);
    }

    fn reindex_from(&mut self, start: usize) {
        for (pos, item) in self.items.iter().enumerate().skip(start) {
            self.positions.insert(item.clone(), pos);
        }
    }

    pub fn as_slice(&self) -> &[ItemLabel] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<ItemLabel> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(names: &[&str]) -> Vec<ItemLabel> {
        names.iter().map(|n| ItemLabel::new(*n)).collect()
    }

    fn names(order: &MasterItemOrder) -> Vec<&str> {
        order.as_slice().iter().map(ItemLabel::display).collect()
    }

    #[test]
    fn test_first_order_seeds_master() {
        let mut order = MasterItemOrder::new();
        order.extend(&items(&["A", "B", "C"]));
        assert_eq!(names(&order), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_new_item_goes_after_preceding_known_item() {
        let mut order = MasterItemOrder::new();
        order.extend(&items(&["A", "B", "C"]));
        order.extend(&items(&["A", "D", "B"]));
        assert_eq!(names(&order), vec!["A", "D", "B", "C"]);
    }

    #[test]
    fn test_new_item_without_anchor_goes_first() {
        let mut order = MasterItemOrder::new();
        order.extend(&items(&["A", "B"]));
        order.extend(&items(&["X", "Y", "B"]));
        assert_eq!(names(&order), vec!["X", "Y", "A", "B"]);
    }

    #[test]
    fn test_new_items_follow_the_last_anchor() {
        let mut order = MasterItemOrder::new();
        order.extend(&items(&["A", "B", "C"]));
        order.extend(&items(&["C", "E", "A", "F"]));
        assert_eq!(names(&order), vec!["A", "F", "B", "C", "E"]);
    }

    #[test]
    fn test_items_stay_unique() {
        let mut order = MasterItemOrder::new();
        order.extend(&items(&["A", "B"]));
        order.extend(&items(&["B", "A", "B"]));
        assert_eq!(order.len(), 2);
        assert!(order.contains(&ItemLabel::new("A")));
    }

    #[test]
    fn test_other_ordinals_are_separate_items() {
        let mut order = MasterItemOrder::new();
        order.extend(&[ItemLabel::new("A"), ItemLabel::other(0)]);
        order.extend(&[ItemLabel::other(0), ItemLabel::other(1)]);
        assert_eq!(
            order.as_slice(),
            &[ItemLabel::new("A"), ItemLabel::other(0), ItemLabel::other(1)]
        );
    }
}
