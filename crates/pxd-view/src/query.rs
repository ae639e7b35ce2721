use pxd_match::{FilterSpec, Matcher};
use pxd_reconcile::DisplayList;
use pxd_schemas::ConnectionRecord;
use serde::{Deserialize, Serialize};

use crate::{aggregate, SortPolicy};

// ---------------------------------------------------------------------------
// ViewQuery
// ---------------------------------------------------------------------------

/// The sink-facing query state: what to match and how to order.
///
/// The matcher compiled from `filter` is held by the runtime (compilation
/// can fail and the failure has its own surfacing path); this struct is
/// just the declarative state the user edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewQuery {
    pub filter: FilterSpec,
    pub sort: SortPolicy,
}

// ---------------------------------------------------------------------------
// ViewFrame
// ---------------------------------------------------------------------------

/// One published frame: the filtered, ordered records plus the totals of
/// exactly that visible set. Replaced wholesale on every tick and every
/// query change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewFrame {
    pub records: Vec<ConnectionRecord>,
    pub upload_sum: u64,
    pub download_sum: u64,
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Project the canonical display list through a compiled matcher and a
/// sort policy.
///
/// Pure: the display list is read, never reordered; only the cloned
/// projection is sorted. Totals are aggregated over the filtered set
/// (visible totals, not global ones).
pub fn project(list: &DisplayList, matcher: &Matcher, sort: SortPolicy) -> ViewFrame {
    let mut records: Vec<ConnectionRecord> = list
        .records
        .iter()
        .filter(|r| matcher.is_match(r.match_target()))
        .cloned()
        .collect();

    sort.sort(&mut records);

    let totals = aggregate(&records);
    ViewFrame {
        records,
        upload_sum: totals.upload,
        download_sum: totals.download,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pxd_reconcile::Reconciler;
    use pxd_schemas::{ConnectionMeta, TrafficSnapshot};

    fn rec(id: &str, host: &str, upload: u64, download: u64) -> ConnectionRecord {
        ConnectionRecord {
            id: id.to_string(),
            upload,
            download,
            metadata: ConnectionMeta {
                host: host.to_string(),
                ..ConnectionMeta::default()
            },
            ..ConnectionRecord::default()
        }
    }

    fn list_of(records: Vec<ConnectionRecord>) -> DisplayList {
        let mut reconciler = Reconciler::new();
        reconciler.apply(&TrafficSnapshot {
            upload_total: 0,
            download_total: 0,
            connections: Some(records),
        });
        reconciler.current().clone()
    }

    #[test]
    fn totals_cover_exactly_the_filtered_set() {
        // Five records, two matching "cdn": the sums must equal the manual
        // sum of those two, nothing more.
        let list = list_of(vec![
            rec("1", "cdn.example.com", 10, 100),
            rec("2", "api.example.com", 20, 200),
            rec("3", "cdn.other.net", 30, 300),
            rec("4", "tracker.ads.io", 40, 400),
            rec("5", "mail.example.com", 50, 500),
        ]);

        let matcher = Matcher::compile(&FilterSpec::text("cdn")).unwrap();
        let frame = project(&list, &matcher, SortPolicy::default());

        assert_eq!(frame.records.len(), 2);
        assert_eq!(frame.upload_sum, 10 + 30);
        assert_eq!(frame.download_sum, 100 + 300);
    }

    #[test]
    fn projection_leaves_the_display_list_untouched() {
        let list = list_of(vec![
            rec("a", "one", 0, 0),
            rec("b", "two", 0, 0),
            rec("c", "three", 0, 0),
        ]);
        let before = list.clone();

        let matcher = Matcher::match_all();
        let mut frame = project(&list, &matcher, SortPolicy::DownloadRate);
        frame.records.reverse();

        assert_eq!(list, before, "canonical slots must not be disturbed");
    }

    #[test]
    fn match_none_projects_an_empty_frame() {
        let list = list_of(vec![rec("a", "host", 9, 9)]);
        let frame = project(&list, &Matcher::match_none(), SortPolicy::default());
        assert!(frame.records.is_empty());
        assert_eq!(frame.upload_sum, 0);
        assert_eq!(frame.download_sum, 0);
    }

    #[test]
    fn filter_matches_destination_ip_when_host_is_empty() {
        let mut bare = rec("a", "", 1, 1);
        bare.metadata.destination_ip = "10.0.0.7".to_string();
        let list = list_of(vec![bare, rec("b", "named.host", 2, 2)]);

        let matcher = Matcher::compile(&FilterSpec::text("10.0.0")).unwrap();
        let frame = project(&list, &matcher, SortPolicy::default());
        assert_eq!(frame.records.len(), 1);
        assert_eq!(frame.records[0].id, "a");
    }
}
