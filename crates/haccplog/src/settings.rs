//! Checklist configuration editing.
//!
//! Like the update engine these return a new configuration instead of editing
//! the one passed in.

use std::collections::HashSet;

use chrono::Utc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{CheckItem, ItemType};

/// Definition of an item the user wants to add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    /// Grouping label.
    pub category: String,
    /// Prompt text.
    pub text: String,
    /// Judgement only, or judgement plus value.
    pub item_type: ItemType,
    /// Unit for record items.
    pub unit: Option<String>,
}

/// Direction for [`move_item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the start of the category.
    Up,
    /// Towards the end of the category.
    Down,
}

/// Items ordered by `display_order`; ties keep their stored order.
#[must_use]
pub fn sorted_items(config: &[CheckItem]) -> Vec<&CheckItem> {
    let mut items: Vec<&CheckItem> = config.iter().collect();
    items.sort_by_key(|item| item.display_order);
    items
}

/// Distinct categories in the order they first appear among the sorted items.
#[must_use]
pub fn categories(config: &[CheckItem]) -> Vec<&str> {
    let mut seen = HashSet::new();
    sorted_items(config)
        .into_iter()
        .map(|item| item.category.as_str())
        .filter(|category| seen.insert(*category))
        .collect()
}

/// Append a new item with a fresh id at the end of the display order.
///
/// Returns the new configuration and the assigned id.
///
/// # Errors
///
/// Returns [`Error::InvalidItem`] if the text or category is blank.
pub fn add_item(config: &[CheckItem], new_item: NewItem) -> Result<(Vec<CheckItem>, String)> {
    let text = new_item.text.trim();
    let category = new_item.category.trim();
    if text.is_empty() {
        return Err(Error::invalid_item("text must not be empty"));
    }
    if category.is_empty() {
        return Err(Error::invalid_item("category must not be empty"));
    }

    let id = fresh_id(config);
    let display_order = config.iter().map(|i| i.display_order).max().unwrap_or(0) + 1;
    let mut item = CheckItem::new(&id, category, text, new_item.item_type, display_order);
    if new_item.item_type == ItemType::Record {
        item.unit = new_item.unit.filter(|u| !u.trim().is_empty());
    }

    debug!(id = %id, category = %item.category, "adding check item");
    let mut next = config.to_vec();
    next.push(item);
    Ok((next, id))
}

/// Replace the prompt text of an item.
///
/// # Errors
///
/// Returns [`Error::UnknownItem`] if no item has `id`, or
/// [`Error::InvalidItem`] if `text` is blank.
pub fn update_item_text(config: &[CheckItem], id: &str, text: &str) -> Result<Vec<CheckItem>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::invalid_item("text must not be empty"));
    }
    let index = position(config, id)?;

    let mut next = config.to_vec();
    next[index].text = text.to_string();
    Ok(next)
}

/// Delete an item. Results already recorded for it stay in the day records.
///
/// # Errors
///
/// Returns [`Error::UnknownItem`] if no item has `id`.
pub fn remove_item(config: &[CheckItem], id: &str) -> Result<Vec<CheckItem>> {
    let index = position(config, id)?;
    debug!(id, "removing check item");

    let mut next = config.to_vec();
    next.remove(index);
    Ok(next)
}

/// Swap an item's display order with its neighbour in the same category.
///
/// Moving past either end of the category leaves the configuration unchanged.
///
/// # Errors
///
/// Returns [`Error::UnknownItem`] if no item has `id`.
pub fn move_item(config: &[CheckItem], id: &str, direction: Direction) -> Result<Vec<CheckItem>> {
    let target = &config[position(config, id)?];

    let siblings: Vec<&CheckItem> = sorted_items(config)
        .into_iter()
        .filter(|item| item.category == target.category)
        .collect();
    let at = siblings
        .iter()
        .position(|item| item.id == id)
        .ok_or_else(|| Error::internal("item missing from its own category"))?;

    let neighbour = match direction {
        Direction::Up if at > 0 => siblings[at - 1],
        Direction::Down if at + 1 < siblings.len() => siblings[at + 1],
        _ => return Ok(config.to_vec()),
    };

    let (a_id, a_order) = (target.id.clone(), target.display_order);
    let (b_id, b_order) = (neighbour.id.clone(), neighbour.display_order);

    let mut next = config.to_vec();
    for item in &mut next {
        if item.id == a_id {
            item.display_order = b_order;
        } else if item.id == b_id {
            item.display_order = a_order;
        }
    }
    // Equal orders would make the swap invisible after sorting.
    if a_order == b_order {
        for item in &mut next {
            if item.id == a_id {
                item.display_order = match direction {
                    Direction::Up => b_order - 1,
                    Direction::Down => b_order + 1,
                };
            }
        }
    }
    Ok(next)
}

/// Check the configuration invariants.
///
/// # Errors
///
/// Returns [`Error::InvalidItem`] naming the first duplicated id.
pub fn validate_config(config: &[CheckItem]) -> Result<()> {
    let mut seen = HashSet::new();
    for item in config {
        if !seen.insert(item.id.as_str()) {
            return Err(Error::invalid_item(format!("duplicate item id '{}'", item.id)));
        }
    }
    Ok(())
}

fn position(config: &[CheckItem], id: &str) -> Result<usize> {
    config
        .iter()
        .position(|item| item.id == id)
        .ok_or_else(|| Error::unknown_item(id))
}

fn fresh_id(config: &[CheckItem]) -> String {
    let base = format!("item-{}", Utc::now().timestamp_millis());
    let taken = |candidate: &str| config.iter().any(|item| item.id == candidate);
    if !taken(&base) {
        return base;
    }
    let mut suffix = 1u32;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::seed::{self, CRITICAL_CONTROL, GENERAL_HYGIENE};

    fn new_item(text: &str) -> NewItem {
        NewItem {
            category: "追加".to_string(),
            text: text.to_string(),
            item_type: ItemType::Boolean,
            unit: None,
        }
    }

    #[test]
    fn test_sorted_items_by_display_order() {
        let config = vec![
            CheckItem::new("b", "x", "b", ItemType::Boolean, 20),
            CheckItem::new("a", "x", "a", ItemType::Boolean, 5),
            CheckItem::new("c", "x", "c", ItemType::Boolean, 7),
        ];
        let sorted = sorted_items(&config);
        let ids: Vec<_> = sorted.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_categories_in_order() {
        let config = seed::default_items();
        assert_eq!(categories(&config), vec![GENERAL_HYGIENE, CRITICAL_CONTROL]);
    }

    #[test]
    fn test_add_item_appends_with_next_order() {
        let config = seed::default_items();
        let (next, id) = add_item(&config, new_item("床の清掃")).unwrap();

        assert_eq!(next.len(), config.len() + 1);
        let added = next.iter().find(|i| i.id == id).unwrap();
        assert_eq!(added.display_order, 12);
        assert_eq!(added.text, "床の清掃");
        assert_eq!(config.len(), 11);
    }

    #[test]
    fn test_add_item_ids_stay_unique() {
        let mut config = seed::default_items();
        for n in 0..5 {
            let (next, _) = add_item(&config, new_item(&format!("item {n}"))).unwrap();
            config = next;
        }
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.len(), 16);
    }

    #[test]
    fn test_add_item_rejects_blank() {
        let config = seed::default_items();
        assert!(matches!(
            add_item(&config, new_item("   ")),
            Err(Error::InvalidItem { .. })
        ));

        let mut item = new_item("ok");
        item.category = String::new();
        assert!(add_item(&config, item).is_err());
    }

    #[test]
    fn test_add_item_drops_unit_on_boolean() {
        let mut item = new_item("check");
        item.unit = Some("℃".to_string());
        let (next, id) = add_item(&[], item).unwrap();
        assert!(next.iter().find(|i| i.id == id).unwrap().unit.is_none());

        let mut item = new_item("measure");
        item.item_type = ItemType::Record;
        item.unit = Some("℃".to_string());
        let (next, id) = add_item(&[], item).unwrap();
        let added = next.iter().find(|i| i.id == id).unwrap();
        assert_eq!(added.unit.as_deref(), Some("℃"));
        assert_eq!(added.display_order, 1);
    }

    #[test]
    fn test_update_item_text() {
        let config = seed::default_items();
        let next = update_item_text(&config, "c4", "まな板の使い分け").unwrap();
        assert_eq!(next[3].text, "まな板の使い分け");
        assert_eq!(next[3].item_type, config[3].item_type);
        assert_ne!(config[3].text, "まな板の使い分け");
    }

    #[test]
    fn test_update_item_text_unknown() {
        let config = seed::default_items();
        assert!(matches!(
            update_item_text(&config, "nope", "x"),
            Err(Error::UnknownItem { .. })
        ));
    }

    #[test]
    fn test_remove_item() {
        let config = seed::default_items();
        let next = remove_item(&config, "c2").unwrap();
        assert_eq!(next.len(), 10);
        assert!(next.iter().all(|i| i.id != "c2"));
        assert!(remove_item(&next, "c2").is_err());
    }

    #[test]
    fn test_move_item_swaps_within_category() {
        let config = seed::default_items();
        let next = move_item(&config, "c2", Direction::Up).unwrap();
        let ids: Vec<_> = sorted_items(&next).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(&ids[..3], &["c2", "c1", "c3"]);
    }

    #[test]
    fn test_move_item_stops_at_category_edges() {
        let config = seed::default_items();
        // c7 is the last general item; c8 starts the other category.
        assert_eq!(move_item(&config, "c7", Direction::Down).unwrap(), config);
        assert_eq!(move_item(&config, "c8", Direction::Up).unwrap(), config);
        assert_eq!(move_item(&config, "c1", Direction::Up).unwrap(), config);
    }

    #[test]
    fn test_move_item_with_equal_orders() {
        let config = vec![
            CheckItem::new("a", "x", "a", ItemType::Boolean, 1),
            CheckItem::new("b", "x", "b", ItemType::Boolean, 1),
        ];
        let next = move_item(&config, "b", Direction::Up).unwrap();
        let ids: Vec<_> = sorted_items(&next).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_validate_config_duplicate() {
        let config = vec![
            CheckItem::new("a", "x", "a", ItemType::Boolean, 1),
            CheckItem::new("a", "x", "again", ItemType::Boolean, 2),
        ];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate item id 'a'"));
    }
}
