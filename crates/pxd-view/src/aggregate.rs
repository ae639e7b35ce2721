use pxd_schemas::ConnectionRecord;
use serde::{Deserialize, Serialize};

/// Upload/download byte totals over a record set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficTotals {
    pub upload: u64,
    pub download: u64,
}

/// Sum the **cumulative** counters over exactly the given records.
///
/// The dashboard header shows totals for the *visible* (post-filter) set,
/// not the engine's global snapshot totals. Pass the filtered records,
/// never the canonical list, unless the filter is empty.
pub fn aggregate(records: &[ConnectionRecord]) -> TrafficTotals {
    records.iter().fold(TrafficTotals::default(), |acc, r| TrafficTotals {
        upload: acc.upload.saturating_add(r.upload),
        download: acc.download.saturating_add(r.download),
    })
}
