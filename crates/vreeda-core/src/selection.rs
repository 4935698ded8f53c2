// ── Device selection ──
//
// Which devices the user has marked for bulk actions. No network
// effect; selection is independent of device state.

use indexmap::IndexSet;

/// Ordered set of selected device ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCoordinator {
    selected: IndexSet<String>,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the id was not already selected.
    pub fn select(&mut self, device_id: impl Into<String>) -> bool {
        self.selected.insert(device_id.into())
    }

    /// Returns `true` if the id was selected.
    pub fn deselect(&mut self, device_id: &str) -> bool {
        self.selected.shift_remove(device_id)
    }

    /// Select or deselect according to `selected`.
    pub fn set_selected(&mut self, device_id: &str, selected: bool) {
        if selected {
            self.select(device_id);
        } else {
            self.deselect(device_id);
        }
    }

    pub fn is_selected(&self, device_id: &str) -> bool {
        self.selected.contains(device_id)
    }

    /// Selected ids in selection order.
    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
