/*
 * The status table: the listed items in presentation order together with
 * their current processing status. It is owned by the event consumer, which
 * is its only writer; background workers change it only through the events
 * the consumer applies. Lookups by item name go through an index so that
 * applying a progress event does not scan the rows.
 */
use crate::core::{BatchError, ItemStatus, ScanItem};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct StatusTable {
    rows: Vec<ScanItem>,
    index_by_name: HashMap<String, usize>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    // Swaps in a fresh scan result. Row order is the order of `items`.
    pub fn replace_all(&mut self, items: Vec<ScanItem>) {
        self.index_by_name = items
            .iter()
            .enumerate()
            .map(|(index, item)| (item.name.clone(), index))
            .collect();
        self.rows = items;
    }

    pub fn rows(&self) -> &[ScanItem] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_index(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    #[cfg(test)]
    pub fn status_of(&self, name: &str) -> Option<ItemStatus> {
        self.row_index(name).map(|index| self.rows[index].status)
    }

    /*
     * Applies a status change to the named row and returns the row index if
     * the row actually changed. Unknown names, repeats of the current status,
     * and attempts to move a `Processed` row back to another status are
     * ignored.
     */
    pub fn apply(&mut self, name: &str, status: ItemStatus) -> Option<usize> {
        let Some(index) = self.row_index(name) else {
            log::debug!("StatusTable: Ignoring status for unknown item {name:?}.");
            return None;
        };
        let row = &mut self.rows[index];
        if row.status == status {
            return None;
        }
        if row.status.is_processed() {
            log::trace!("StatusTable: {name:?} is already processed; ignoring {status:?}.");
            return None;
        }
        row.status = status;
        Some(index)
    }

    /*
     * Marks the selected rows `Queued` ahead of a batch run and returns the
     * indices of the rows that changed.
     */
    pub fn mark_queued(&mut self, selection: &[String]) -> Vec<usize> {
        selection
            .iter()
            .filter_map(|name| self.apply(name, ItemStatus::Queued))
            .collect()
    }

    // A selection is valid if it is non-empty and every name is a listed row.
    pub fn validate_selection(&self, selection: &[String]) -> Result<(), BatchError> {
        if selection.is_empty() {
            return Err(BatchError::EmptySelection);
        }
        match selection.iter().find(|name| self.row_index(name).is_none()) {
            Some(unknown) => Err(BatchError::UnknownItem(unknown.clone())),
            None => Ok(()),
        }
    }

    // Names of the rows that are not yet processed, in table order.
    pub fn pending_names(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|row| !row.status.is_processed())
            .map(|row| row.name.clone())
            .collect()
    }

    pub fn status_line(&self) -> String {
        format!("{} file(s)", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(rows: &[(&str, ItemStatus)]) -> StatusTable {
        let mut table = StatusTable::new();
        table.replace_all(
            rows.iter()
                .map(|(name, status)| ScanItem::new(*name, *status))
                .collect(),
        );
        table
    }

    #[test]
    fn test_apply_updates_row_and_ignores_repeats() {
        let mut table = table_with(&[("b", ItemStatus::Empty), ("a", ItemStatus::Empty)]);
        assert_eq!(table.apply("a", ItemStatus::Progress(10)), Some(1));
        assert_eq!(table.apply("a", ItemStatus::Progress(10)), None);
        assert_eq!(table.status_of("a"), Some(ItemStatus::Progress(10)));
        assert_eq!(table.apply("missing", ItemStatus::Processed), None);
    }

    #[test]
    fn test_processed_rows_are_never_reverted() {
        let mut table = table_with(&[("a", ItemStatus::Processed)]);
        assert_eq!(table.apply("a", ItemStatus::Progress(40)), None);
        assert!(table.mark_queued(&["a".to_string()]).is_empty());
        assert_eq!(table.status_of("a"), Some(ItemStatus::Processed));
    }

    #[test]
    fn test_replace_all_swaps_rows_and_index() {
        let mut table = table_with(&[("old", ItemStatus::Queued)]);
        table.replace_all(vec![
            ScanItem::new("z", ItemStatus::Empty),
            ScanItem::new("y", ItemStatus::Processed),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.row_index("old"), None);
        assert_eq!(table.row_index("y"), Some(1));
        assert_eq!(table.status_line(), "2 file(s)");
    }

    #[test]
    fn test_validate_selection() {
        let table = table_with(&[("a", ItemStatus::Empty), ("b", ItemStatus::Empty)]);
        assert!(matches!(
            table.validate_selection(&[]),
            Err(BatchError::EmptySelection)
        ));
        assert!(matches!(
            table.validate_selection(&["a".to_string(), "nope".to_string()]),
            Err(BatchError::UnknownItem(name)) if name == "nope"
        ));
        assert!(table.validate_selection(&["b".to_string()]).is_ok());
    }

    #[test]
    fn test_pending_names_skip_processed_rows() {
        let table = table_with(&[
            ("c", ItemStatus::Empty),
            ("b", ItemStatus::Processed),
            ("a", ItemStatus::Queued),
        ]);
        assert_eq!(table.pending_names(), vec!["c".to_string(), "a".to_string()]);
    }
}
