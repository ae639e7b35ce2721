use std::collections::VecDeque;

use pxd_schemas::{ConnectionRecord, TrafficSnapshot};

use crate::DisplayList;

/// Merge `previous` with one incoming snapshot into the next display list.
///
/// # Algorithm
///
/// 1. Allocate `n = snapshot.records().len()` empty slots.
/// 2. For each incoming record in snapshot order, look its `id` up in
///    `previous`. Found at index `i < n` ⇒ *continuing*: derive
///    `cur_upload`/`cur_download` as the cumulative difference against the
///    previous occupant and pin the record to slot `i`. Otherwise the
///    record joins a FIFO queue of unplaced arrivals.
/// 3. Walk the slots in order; each empty one takes the next queued record
///    with zero rates (no prior baseline).
///
/// The result always has exactly `n` records (assuming ids are unique
/// within the snapshot, which the engine guarantees).
///
/// # Preserved quirk
///
/// A record that survives across ticks but whose previous slot index is
/// `>= n` (the list shrank past it) is handled as a fresh arrival: it is
/// re-slotted in queue order and its rates report zero for that tick even
/// though the counters kept moving. Long-standing observable behavior;
/// keep it until a product decision says otherwise.
pub fn reconcile(previous: &DisplayList, snapshot: &TrafficSnapshot) -> DisplayList {
    let incoming = snapshot.records();
    let n = incoming.len();

    let mut slots: Vec<Option<ConnectionRecord>> = vec![None; n];
    let mut unplaced: VecDeque<ConnectionRecord> = VecDeque::new();

    for rec in incoming {
        let mut rec = rec.clone();
        match previous.slot_of(&rec.id) {
            Some(i) if i < n => {
                let prev = &previous.records[i];
                // Counters are cumulative and non-decreasing; a reset
                // (engine restart reusing an id) clamps to zero instead
                // of wrapping.
                rec.cur_upload = rec.upload.saturating_sub(prev.upload);
                rec.cur_download = rec.download.saturating_sub(prev.download);
                slots[i] = Some(rec);
            }
            _ => unplaced.push_back(rec),
        }
    }

    let mut records = Vec::with_capacity(n);
    for slot in slots {
        match slot {
            Some(rec) => records.push(rec),
            None => {
                if let Some(mut rec) = unplaced.pop_front() {
                    rec.cur_upload = 0;
                    rec.cur_download = 0;
                    records.push(rec);
                }
                // A dry queue here is only reachable if the engine sent
                // duplicate ids in one snapshot; the collided slot is
                // dropped rather than invented.
            }
        }
    }

    DisplayList {
        records,
        upload_total: snapshot.upload_total,
        download_total: snapshot.download_total,
    }
}
