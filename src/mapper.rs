//! Project extracted component rows onto canonical catalog names.

use indexmap::IndexMap;

use crate::report::ComponentRecord;
use crate::stack::StackEntry;

/// Ordered `item_id -> mapped_name` view of the component table.
///
/// Keys keep first-insertion order; a repeated key overwrites the value in place.
pub type ComponentMap = IndexMap<Option<String>, Option<String>>;

/// Build the component map from the extracted rows.
///
/// With `keep_none == false`, rows without an item id are dropped. With
/// `keep_none == true` they share the `None` key, so only the last such row's
/// name survives (at the position of the first one).
pub fn component_map(records: &[ComponentRecord], keep_none: bool) -> ComponentMap {
    let mut map = ComponentMap::with_capacity(records.len());
    for record in records {
        let key = record.item_id.as_ref().map(ToString::to_string);
        if key.is_none() && !keep_none {
            continue;
        }
        map.insert(key, record.mapped_name.clone());
    }
    log::debug!("Mapped {} of {} components", map.len(), records.len());
    map
}

/// Turn the map's values into the top-to-bottom stack order.
pub fn stack_order(map: &ComponentMap) -> Vec<StackEntry> {
    map.values()
        .map(|name| match name {
            Some(name) => StackEntry::Component(name.clone()),
            None => StackEntry::Spacer,
        })
        .collect()
}
