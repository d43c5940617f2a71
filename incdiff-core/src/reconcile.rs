use crate::manifest::{Manifest, ManifestLine};
use crate::record::{FileRecord, StatusFlag};
use tracing::{debug, info};

/// Classify a freshly scanned `current` manifest against the lines of a
/// previous one.
///
/// - live path, same hash: `NotChanged`
/// - live path, different hash: stays `Modified`
/// - path only in `previous`: inserted as `Deleted`
///
/// The previous mark is not consulted. When `previous` lists a path more
/// than once, the last occurrence decides.
pub fn reconcile<I>(mut current: Manifest, previous: I) -> Manifest
where
    I: IntoIterator<Item = ManifestLine>,
{
    current.reconcile_with(previous);
    current
}

impl Manifest {
    /// In-place form of [`reconcile`].
    pub fn reconcile_with<I>(&mut self, previous: I)
    where
        I: IntoIterator<Item = ManifestLine>,
    {
        for prev in previous {
            let next = match self.get(&prev.path) {
                // scans never produce Deleted, so anything else is live
                Some(live) if live.status != StatusFlag::Deleted => {
                    let status = if live.hash == prev.hash {
                        StatusFlag::NotChanged
                    } else {
                        StatusFlag::Modified
                    };
                    if status == live.status {
                        continue;
                    }
                    live.clone().with_status(status)
                }
                _ => FileRecord::new(prev.path, prev.hash, StatusFlag::Deleted),
            };
            debug!(path = %next.path, mark = %next.status.mark(), "reconciled");
            self.insert(next);
        }
        let s = self.summary();
        info!(unchanged = s.unchanged, modified = s.modified, deleted = s.deleted, "reconciled");
    }
}
