//! Memory of links that have already been announced.
//!
//! Process-lifetime only.  After a restart the first successful poll
//! [`bootstrap`](SeenStore::bootstrap)s the store from whatever the feed
//! currently lists, so a restart never reposts the front page.

use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct SeenStore {
    links: HashSet<String>,
}

impl SeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_known(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    /// Record `link` as announced.  Call only after delivery succeeded.
    pub fn mark_known(&mut self, link: impl Into<String>) {
        self.links.insert(link.into());
    }

    /// Populate an empty store without announcing anything.
    ///
    /// Returns how many distinct links were recorded.  On a non-empty store
    /// this does nothing and returns 0; steady-state additions go through
    /// [`mark_known`](Self::mark_known).
    pub fn bootstrap<I, S>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.is_empty() {
            return 0;
        }
        self.links.extend(links.into_iter().map(Into::into));
        self.links.len()
    }
}
