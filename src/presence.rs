use std::collections::{HashMap, HashSet};

use crate::stream::StreamRecord;

/// Outcome of comparing a snapshot against the notified streamers.
#[derive(Debug, Default, PartialEq)]
pub struct Reconciliation {
    /// streamers seen for the first time in their current session, in
    /// snapshot order. They are already marked as notified.
    pub arrived: Vec<StreamRecord>,
    /// streamers no longer present in the snapshot, forgotten.
    pub departed: Vec<String>,
}

/// Remembers which streamers have been announced for their current session.
/// A streamer stays in the set as long as every snapshot contains them.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    notified: HashSet<String>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Default::default()
    }

    #[cfg(test)]
    pub fn is_notified(&self, display_name: &str) -> bool {
        self.notified.contains(display_name)
    }

    pub fn len(&self) -> usize {
        self.notified.len()
    }

    /// Update the notified set with the given snapshot.
    ///
    /// Arrivals are marked notified before anything is sent, so a streamer
    /// whose notification fails is not retried until they go offline and
    /// come back.
    pub fn reconcile(&mut self, snapshot: Vec<StreamRecord>) -> Reconciliation {
        // the same streamer can appear twice when the listing shifts between
        // pages. Keep the position of the first one and the data of the last.
        let mut current: Vec<StreamRecord> = Vec::with_capacity(snapshot.len());
        let mut positions: HashMap<String, usize> = HashMap::with_capacity(snapshot.len());
        for stream in snapshot {
            match positions.get(&stream.display_name) {
                Some(&idx) => current[idx] = stream,
                None => {
                    positions.insert(stream.display_name.clone(), current.len());
                    current.push(stream);
                }
            }
        }

        let mut departed = self
            .notified
            .iter()
            .filter(|name| !positions.contains_key(*name))
            .cloned()
            .collect::<Vec<_>>();
        departed.sort();
        for name in &departed {
            self.notified.remove(name);
        }

        let arrived = current
            .into_iter()
            .filter(|stream| self.notified.insert(stream.display_name.clone()))
            .collect();

        Reconciliation { arrived, departed }
    }
}
