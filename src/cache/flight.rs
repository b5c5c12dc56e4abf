//! Single-flight coalescing of concurrent cache misses.
//!
//! The first caller to miss on a key becomes the leader and computes the
//! value; callers arriving while it runs follow and receive a clone of the
//! leader's result. The table entry is removed when the leader finishes or is
//! dropped, so an abandoned computation never blocks later callers.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

/// In-flight computations keyed by cache key.
pub struct Flights<T> {
    pending: DashMap<String, watch::Receiver<Option<T>>>,
}

/// Role of a caller for one key.
pub enum Flight<'a, T> {
    /// Compute the value and publish it with [`FlightLeader::complete`].
    Leader(FlightLeader<'a, T>),
    /// Wait for the leader with [`wait`].
    Follower(watch::Receiver<Option<T>>),
}

impl<T: Clone> Flights<T> {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Join the computation for `key`, leading it if none is running.
    pub fn join(&self, key: &str) -> Flight<'_, T> {
        match self.pending.entry(key.to_string()) {
            Entry::Occupied(entry) => Flight::Follower(entry.get().clone()),
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(None);
                entry.insert(rx);
                Flight::Leader(FlightLeader {
                    flights: self,
                    key: key.to_string(),
                    tx,
                })
            }
        }
    }

    /// Number of computations currently running.
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

impl<T: Clone> Default for Flights<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive right to compute one key.
pub struct FlightLeader<'a, T> {
    flights: &'a Flights<T>,
    key: String,
    tx: watch::Sender<Option<T>>,
}

impl<T> FlightLeader<'_, T> {
    /// Publish the result to every follower.
    pub fn complete(self, value: T) {
        // the table still holds a receiver, so this only fails if it was removed
        let _ = self.tx.send(Some(value));
    }
}

impl<T> Drop for FlightLeader<'_, T> {
    fn drop(&mut self) {
        self.flights.pending.remove(&self.key);
    }
}

/// Wait for the leader's result.
///
/// Returns `None` if the leader was dropped without completing.
pub async fn wait<T: Clone>(mut rx: watch::Receiver<Option<T>>) -> Option<T> {
    let value = rx.wait_for(Option::is_some).await.ok()?;
    value.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_followers_receive_leader_value() {
        let flights = Flights::<u32>::new();

        let Flight::Leader(leader) = flights.join("/a.js") else {
            panic!("first caller must lead");
        };
        let Flight::Follower(rx1) = flights.join("/a.js") else {
            panic!("second caller must follow");
        };
        let Flight::Follower(rx2) = flights.join("/a.js") else {
            panic!("third caller must follow");
        };

        let waiting = async { tokio::join!(wait(rx1), wait(rx2)) };
        let completing = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            leader.complete(7);
        };
        let ((a, b), ()) = tokio::join!(waiting, completing);

        assert_eq!(a, Some(7));
        assert_eq!(b, Some(7));
        assert_eq!(flights.len(), 0);
    }

    #[tokio::test]
    async fn test_dropped_leader_releases_followers() {
        let flights = Flights::<u32>::new();
        let Flight::Leader(leader) = flights.join("/a.js") else {
            panic!("first caller must lead");
        };
        let Flight::Follower(rx) = flights.join("/a.js") else {
            panic!("second caller must follow");
        };

        drop(leader);
        assert_eq!(wait(rx).await, None);
        assert!(matches!(flights.join("/a.js"), Flight::Leader(_)));
    }

    #[test]
    fn test_distinct_keys_lead_independently() {
        let flights = Flights::<u32>::new();
        let first = flights.join("/a.js");
        let second = flights.join("/a.js#1");
        assert!(matches!(first, Flight::Leader(_)));
        assert!(matches!(second, Flight::Leader(_)));
        assert_eq!(flights.len(), 2);
    }
}
