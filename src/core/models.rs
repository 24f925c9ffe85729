use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::mpsc;

/*
 * Processing status of a single listed item as shown in the status table.
 * `Progress` carries an integer percentage in 0..=100. The textual form
 * (`Display`) is what the front-end renders: an empty string, "Queued",
 * "<n>%" or "Processed".
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemStatus {
    #[default]
    Empty,
    Queued,
    Progress(u8),
    Processed,
}

pub const STATUS_TEXT_QUEUED: &str = "Queued";
pub const STATUS_TEXT_PROCESSED: &str = "Processed";

impl ItemStatus {
    /*
     * Converts a fractional progress value reported by a processor into a
     * percentage status. Halves round to the nearest even percent, and values
     * outside [0, 1] are clamped.
     */
    pub fn from_fraction(fraction: f64) -> Self {
        let clamped = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        ItemStatus::Progress((clamped * 100.0).round_ties_even() as u8)
    }

    pub fn is_processed(&self) -> bool {
        *self == ItemStatus::Processed
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Empty => Ok(()),
            ItemStatus::Queued => f.write_str(STATUS_TEXT_QUEUED),
            ItemStatus::Progress(percent) => write!(f, "{percent}%"),
            ItemStatus::Processed => f.write_str(STATUS_TEXT_PROCESSED),
        }
    }
}

impl Serialize for ItemStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// One row of a scan result. `name` is the path relative to the scan root, using '/' separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanItem {
    pub name: String,
    pub status: ItemStatus,
}

impl ScanItem {
    pub fn new(name: impl Into<String>, status: ItemStatus) -> Self {
        ScanItem {
            name: name.into(),
            status,
        }
    }
}

/*
 * Orders scan results the way the item list presents them: by name, reverse
 * lexicographic. For dated archive names this puts the newest archive first.
 */
pub fn sort_scan_items(items: &mut [ScanItem]) {
    items.sort_by(|a, b| b.name.cmp(&a.name));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
}

/*
 * Messages posted by background scan and batch threads to the single event
 * consumer. They are the only path by which background work influences the
 * status table. Events from one producer arrive in the order they were sent.
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CoreEvent {
    FilesListed { items: Vec<ScanItem> },
    ScanFailed { message: String },
    ItemStatusChanged { name: String, status: ItemStatus },
    ItemSkipped { name: String, reason: String },
    BatchFinished { summary: BatchSummary },
}

pub type CoreEventSender = mpsc::Sender<CoreEvent>;
pub type CoreEventReceiver = mpsc::Receiver<CoreEvent>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_texts() {
        assert_eq!(ItemStatus::Empty.to_string(), "");
        assert_eq!(ItemStatus::Queued.to_string(), "Queued");
        assert_eq!(ItemStatus::Progress(42).to_string(), "42%");
        assert_eq!(ItemStatus::Processed.to_string(), "Processed");
    }

    #[test]
    fn test_from_fraction_rounds_half_to_even_and_clamps() {
        assert_eq!(ItemStatus::from_fraction(0.0), ItemStatus::Progress(0));
        assert_eq!(ItemStatus::from_fraction(0.333), ItemStatus::Progress(33));
        assert_eq!(ItemStatus::from_fraction(0.125), ItemStatus::Progress(12));
        assert_eq!(ItemStatus::from_fraction(0.375), ItemStatus::Progress(38));
        assert_eq!(ItemStatus::from_fraction(1.0), ItemStatus::Progress(100));
        assert_eq!(ItemStatus::from_fraction(1.7), ItemStatus::Progress(100));
        assert_eq!(ItemStatus::from_fraction(-0.2), ItemStatus::Progress(0));
        assert_eq!(ItemStatus::from_fraction(f64::NAN), ItemStatus::Progress(0));
    }

    #[test]
    fn test_sort_scan_items_is_reverse_lexicographic() {
        let mut items = vec![
            ScanItem::new("EventInc_2021-01-02.uat.zip", ItemStatus::Empty),
            ScanItem::new("EventInc_2023-05-01.uat.zip", ItemStatus::Processed),
            ScanItem::new("EventInc_2022-12-31.uat.zip", ItemStatus::Empty),
        ];
        sort_scan_items(&mut items);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "EventInc_2023-05-01.uat.zip",
                "EventInc_2022-12-31.uat.zip",
                "EventInc_2021-01-02.uat.zip",
            ]
        );
    }

    #[test]
    fn test_event_serializes_status_as_text() {
        let event = CoreEvent::ItemStatusChanged {
            name: "a.jpg".to_string(),
            status: ItemStatus::Progress(7),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"event":"item_status_changed","name":"a.jpg","status":"7%"}"#
        );
    }
}
