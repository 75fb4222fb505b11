//! Drag-and-drop reordering over any list of ordered items.

use crate::fields::DropPosition;
use crate::project::Project;
use crate::task::Task;

/// An item with an identity and a position among its peers.
pub trait Ordered {
    fn id(&self) -> &str;
    fn order(&self) -> i64;
    fn set_order(&mut self, order: i64);
}

impl Ordered for Project {
    fn id(&self) -> &str {
        &self.id
    }
    fn order(&self) -> i64 {
        self.order
    }
    fn set_order(&mut self, order: i64) {
        self.order = order;
    }
}

impl Ordered for Task {
    fn id(&self) -> &str {
        &self.id
    }
    fn order(&self) -> i64 {
        self.order
    }
    fn set_order(&mut self, order: i64) {
        self.order = order;
    }
}

/// Move `dragged` next to `target` and renumber the list `0..n-1`.
///
/// The result is sorted by the new order. When either id is missing, or both
/// are the same item, the input is returned unchanged.
pub fn reorder_items<T: Ordered>(mut items: Vec<T>, dragged: &str, target: &str, position: DropPosition) -> Vec<T> {
    if dragged == target {
        return items;
    }
    let Some(from) = items.iter().position(|i| i.id() == dragged) else {
        return items;
    };
    if !items.iter().any(|i| i.id() == target) {
        return items;
    }
    let moved = items.remove(from);
    // Stable sort keeps insertion order between equal orders.
    items.sort_by_key(|i| i.order());
    let Some(mut at) = items.iter().position(|i| i.id() == target) else {
        return items;
    };
    if position == DropPosition::Bottom {
        at += 1;
    }
    items.insert(at, moved);
    for (i, item) in items.iter_mut().enumerate() {
        item.set_order(i as i64);
    }
    items
}
