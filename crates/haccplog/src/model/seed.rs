//! Default checklist used when no prior state exists.

use super::{CheckItem, ItemType};

/// Category for general hygiene management items.
pub const GENERAL_HYGIENE: &str = "一般衛生管理";

/// Category for HACCP critical control points.
pub const CRITICAL_CONTROL: &str = "重要管理のポイント";

/// Unit used by every seeded record item.
pub const CELSIUS: &str = "℃";

/// The eleven seeded check items, ids `c1`..`c11`, display order 1–11.
#[must_use]
pub fn default_items() -> Vec<CheckItem> {
    use ItemType::{Boolean, Record};

    let seed = [
        ("c1", GENERAL_HYGIENE, "原材料の受入の確認", Boolean),
        ("c2", GENERAL_HYGIENE, "冷蔵庫の温度の確認", Record),
        ("c3", GENERAL_HYGIENE, "冷凍庫の温度の確認", Record),
        ("c4", GENERAL_HYGIENE, "交差汚染・二次汚染の防止", Boolean),
        ("c5", GENERAL_HYGIENE, "器具等の洗浄・消毒・殺菌", Boolean),
        ("c6", GENERAL_HYGIENE, "トイレの洗浄・消毒", Boolean),
        ("c7", GENERAL_HYGIENE, "従業員の手洗いの実施", Boolean),
        ("c8", CRITICAL_CONTROL, "加熱調理品の中心温度の確認", Record),
        ("c9", CRITICAL_CONTROL, "加熱後の冷却温度の確認", Record),
        ("c10", CRITICAL_CONTROL, "提供前の再加熱の確認", Boolean),
        ("c11", CRITICAL_CONTROL, "冷蔵品の提供温度の管理", Boolean),
    ];
    seed.into_iter()
        .zip(1..)
        .map(|((id, category, text, item_type), order)| {
            let item = CheckItem::new(id, category, text, item_type, order);
            match item_type {
                Record => item.with_unit(CELSIUS),
                Boolean => item,
            }
        })
        .collect()
}
