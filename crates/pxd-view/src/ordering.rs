//! Named sort policies for the visible connection list.
//!
//! Policies order the **filtered projection only**. The canonical display
//! list keeps its reconciler-assigned slots; sorting a copy is what makes
//! switching policies free of churn in the underlying state.
//!
//! All comparators are pure and deterministic; the underlying sort is
//! stable, so ties preserve the projection's slot order.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use pxd_schemas::ConnectionRecord;
use serde::{Deserialize, Serialize};

/// Selectable orderings. `Recency` is the default and always available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortPolicy {
    /// Most recently started first. Records with a missing or unparseable
    /// `start` timestamp sort as the oldest possible value.
    #[default]
    Recency,
    /// Descending per-tick upload rate.
    UploadRate,
    /// Descending per-tick download rate.
    DownloadRate,
}

impl SortPolicy {
    /// All policies, in menu order.
    pub const ALL: [SortPolicy; 3] =
        [SortPolicy::Recency, SortPolicy::UploadRate, SortPolicy::DownloadRate];

    pub fn name(&self) -> &'static str {
        match self {
            SortPolicy::Recency => "recency",
            SortPolicy::UploadRate => "uploadRate",
            SortPolicy::DownloadRate => "downloadRate",
        }
    }

    /// Look a policy up by its wire name. Unknown names yield `None`;
    /// callers fall back to the default.
    pub fn from_name(name: &str) -> Option<SortPolicy> {
        SortPolicy::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Sort `records` in place according to this policy.
    pub fn sort(&self, records: &mut [ConnectionRecord]) {
        match self {
            SortPolicy::Recency => {
                records.sort_by_cached_key(|r| Reverse(start_key(r)));
            }
            SortPolicy::UploadRate => records.sort_by_key(|r| Reverse(r.cur_upload)),
            SortPolicy::DownloadRate => records.sort_by_key(|r| Reverse(r.cur_download)),
        }
    }
}

/// Recency sort key: parsed start time, or the epoch floor for records the
/// engine sent without a usable timestamp.
fn start_key(rec: &ConnectionRecord) -> DateTime<Utc> {
    rec.started_at().unwrap_or(DateTime::<Utc>::MIN_UTC)
}
