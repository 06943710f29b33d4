//! Request bookkeeping for one logical query.
//!
//! A [`QueryCell`] remembers which input parameters the view currently
//! wants, which request is on the wire and the last data it received.
//! Responses are matched on their key, so a late answer for an old date
//! range or resource is dropped instead of overwriting newer data.

/// What happened to an arriving response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    /// The key is no longer wanted; the response was dropped.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryCell<K, T> {
    wanted: Option<K>,
    in_flight: Option<K>,
    data: Option<(K, T)>,
    error: Option<String>,
    revision: u64,
}

impl<K, T> Default for QueryCell<K, T> {
    fn default() -> Self {
        Self {
            wanted: None,
            in_flight: None,
            data: None,
            error: None,
            revision: 0,
        }
    }
}

impl<K: Clone + PartialEq, T> QueryCell<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the key the view needs. Returns `true` when a request must be sent.
    ///
    /// Nothing is sent when the same key is already in flight or already loaded
    /// without error.
    pub fn request(&mut self, key: K) -> bool {
        self.wanted = Some(key.clone());
        if self.in_flight.as_ref() == Some(&key) {
            return false;
        }
        let fresh = matches!(&self.data, Some((k, _)) if *k == key);
        if fresh && self.error.is_none() {
            return false;
        }
        self.in_flight = Some(key);
        true
    }

    /// Force the next `request` for the wanted key to go out again.
    ///
    /// Returns the wanted key so the caller can re-issue immediately.
    pub fn invalidate(&mut self) -> Option<K> {
        self.in_flight = None;
        if let Some(wanted) = self.wanted.clone() {
            self.in_flight = Some(wanted.clone());
            return Some(wanted);
        }
        None
    }

    /// Record a response for `key`.
    pub fn resolve<E: std::fmt::Display>(&mut self, key: K, result: Result<T, E>) -> Resolution {
        if self.in_flight.as_ref() == Some(&key) {
            self.in_flight = None;
        }
        if self.wanted.as_ref() != Some(&key) {
            return Resolution::Superseded;
        }
        match result {
            Ok(value) => {
                self.data = Some((key, value));
                self.error = None;
            }
            // Keep the previous data visible next to the error.
            Err(err) => self.error = Some(err.to_string()),
        }
        self.revision += 1;
        Resolution::Applied
    }

    /// Last successfully loaded data, possibly for an older key.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref().map(|(_, v)| v)
    }

    /// Mutable access for optimistic updates.
    pub fn data_mut(&mut self) -> Option<&mut T> {
        self.revision += 1;
        self.data.as_mut().map(|(_, v)| v)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True only while the very first load is outstanding.
    pub fn is_initial_load(&self) -> bool {
        self.data.is_none() && self.in_flight.is_some()
    }

    /// Whether the shown data belongs to an older key than the wanted one.
    pub fn is_stale(&self) -> bool {
        match (&self.data, &self.wanted) {
            (Some((k, _)), Some(w)) => k != w,
            _ => false,
        }
    }

    /// Bumped on every applied response or optimistic edit.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Cell = QueryCell<(u32, &'static str), Vec<u32>>;

    #[test]
    fn identical_in_flight_requests_are_deduplicated() {
        let mut cell = Cell::new();
        assert!(cell.request((1, "feb")));
        assert!(!cell.request((1, "feb")));
        assert!(cell.is_initial_load());
    }

    #[test]
    fn late_response_for_old_key_is_discarded() {
        let mut cell = Cell::new();
        assert!(cell.request((1, "feb")));
        assert!(cell.request((1, "mar")));

        // The "mar" answer arrives first, then the stale "feb" one.
        assert_eq!(cell.resolve::<String>((1, "mar"), Ok(vec![3])), Resolution::Applied);
        assert_eq!(
            cell.resolve::<String>((1, "feb"), Ok(vec![2])),
            Resolution::Superseded
        );
        assert_eq!(cell.data(), Some(&vec![3]));
    }

    #[test]
    fn previous_data_stays_visible_while_revalidating() {
        let mut cell = Cell::new();
        cell.request((1, "feb"));
        cell.resolve::<String>((1, "feb"), Ok(vec![2]));
        assert!(cell.request((1, "mar")));
        assert!(cell.is_fetching());
        assert!(!cell.is_initial_load());
        assert!(cell.is_stale());
        assert_eq!(cell.data(), Some(&vec![2]));
    }

    #[test]
    fn errors_keep_data_and_allow_retry() {
        let mut cell = Cell::new();
        cell.request((1, "feb"));
        cell.resolve::<String>((1, "feb"), Ok(vec![2]));
        cell.invalidate();
        cell.resolve((1, "feb"), Err("HTTP 503"));
        assert_eq!(cell.error(), Some("HTTP 503"));
        assert_eq!(cell.data(), Some(&vec![2]));
        // Same key but errored: a retry goes out.
        assert!(cell.request((1, "feb")));
    }

    #[test]
    fn loaded_key_is_not_refetched() {
        let mut cell = Cell::new();
        cell.request((1, "feb"));
        cell.resolve::<String>((1, "feb"), Ok(vec![]));
        assert!(!cell.request((1, "feb")));
    }

    #[test]
    fn invalidate_reissues_the_wanted_key() {
        let mut cell = Cell::new();
        assert_eq!(cell.invalidate(), None);
        cell.request((1, "feb"));
        cell.resolve::<String>((1, "feb"), Ok(vec![]));
        assert_eq!(cell.invalidate(), Some((1, "feb")));
        assert!(cell.is_fetching());
    }

    #[test]
    fn revision_moves_only_on_applied_responses() {
        let mut cell = Cell::new();
        cell.request((1, "feb"));
        cell.request((1, "mar"));
        cell.resolve::<String>((1, "feb"), Ok(vec![]));
        assert_eq!(cell.revision(), 0);
        cell.resolve::<String>((1, "mar"), Ok(vec![]));
        assert_eq!(cell.revision(), 1);
    }
}
