use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::{Ad, AdId, ChangeEvent, ChangeKind, KeywordAd, Tab};

/// Maximum number of entries kept in the change log.
pub const CHANGE_LOG_CAP: usize = 100;

/// Deleted ids remembered for filtering refetches. Oldest are forgotten first.
pub const EXCLUDED_CAP: usize = CHANGE_LOG_CAP;

/// Which change-log entries the changes view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeFilter {
    #[default]
    All,
    New,
    Deleted,
}

impl ChangeFilter {
    pub fn matches(self, kind: ChangeKind) -> bool {
        match self {
            ChangeFilter::All => true,
            ChangeFilter::New => kind == ChangeKind::New,
            ChangeFilter::Deleted => kind == ChangeKind::Deleted,
        }
    }
}

/// Bounded change log, newest entry first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeLog {
    entries: VecDeque<ChangeEvent>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts at the head and evicts from the tail past [`CHANGE_LOG_CAP`].
    pub fn record(&mut self, event: ChangeEvent) {
        self.entries.push_front(event);
        self.entries.truncate(CHANGE_LOG_CAP);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeEvent> {
        self.entries.iter()
    }

    pub fn filtered(&self, filter: ChangeFilter) -> impl Iterator<Item = &ChangeEvent> {
        self.entries
            .iter()
            .filter(move |event| filter.matches(event.kind))
    }

    pub fn find_ad(&self, id: &AdId) -> Option<&Ad> {
        self.entries
            .iter()
            .map(|event| &event.ad)
            .find(|ad| &ad.id == id)
    }
}

/// Session cache of what the server last told us: keywords, recent ads and
/// per-keyword ad lists.
///
/// Deleted ads stay in lists that were already loaded; they are only
/// filtered out of later fetch results. The most recent [`EXCLUDED_CAP`]
/// deletions are remembered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdCatalog {
    keywords: Vec<String>,
    recent: Vec<KeywordAd>,
    by_keyword: BTreeMap<String, Vec<Ad>>,
    excluded: VecDeque<AdId>,
}

impl AdCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|existing| existing == keyword)
    }

    /// Replaces the keyword list, keeping first occurrences in server order.
    pub fn set_keywords(&mut self, keywords: Vec<String>) {
        let mut seen = BTreeSet::new();
        self.keywords = keywords
            .into_iter()
            .map(|keyword| keyword.trim().to_string())
            .filter(|keyword| !keyword.is_empty())
            .filter(|keyword| seen.insert(keyword.clone()))
            .collect();
        self.by_keyword
            .retain(|keyword, _| seen.contains(keyword.as_str()));
    }

    /// Appends a keyword. Returns `false` when it is already tracked.
    pub fn insert_keyword(&mut self, keyword: &str) -> bool {
        if keyword.is_empty() || self.has_keyword(keyword) {
            return false;
        }
        self.keywords.push(keyword.to_string());
        true
    }

    pub fn remove_keyword(&mut self, keyword: &str) -> bool {
        let before = self.keywords.len();
        self.keywords.retain(|existing| existing != keyword);
        self.by_keyword.remove(keyword);
        self.keywords.len() != before
    }

    pub fn recent(&self) -> &[KeywordAd] {
        &self.recent
    }

    pub fn set_recent(&mut self, ads: Vec<KeywordAd>) {
        self.recent = ads
            .into_iter()
            .filter(|item| !self.is_excluded(&item.ad.id))
            .collect();
    }

    /// Ads loaded for `keyword`, or `None` when none were fetched yet.
    pub fn keyword_ads(&self, keyword: &str) -> Option<&[Ad]> {
        self.by_keyword.get(keyword).map(Vec::as_slice)
    }

    pub fn set_keyword_ads(&mut self, keyword: &str, ads: Vec<Ad>) {
        let ads = ads
            .into_iter()
            .filter(|ad| !self.is_excluded(&ad.id))
            .collect();
        self.by_keyword.insert(keyword.to_string(), ads);
    }

    fn is_excluded(&self, id: &AdId) -> bool {
        self.excluded.contains(id)
    }

    fn exclude(&mut self, id: &AdId) {
        if self.is_excluded(id) {
            return;
        }
        self.excluded.push_front(id.clone());
        self.excluded.truncate(EXCLUDED_CAP);
    }

    /// Merges one change into the in-memory collections of the active view.
    ///
    /// Returns `true` when a new ad was inserted into a visible collection,
    /// which is the signal to highlight it.
    pub fn apply_change(
        &mut self,
        event: &ChangeEvent,
        active_tab: Tab,
        selected_keyword: Option<&str>,
    ) -> bool {
        match event.kind {
            ChangeKind::Deleted => {
                self.exclude(&event.ad.id);
                false
            }
            ChangeKind::New => {
                self.excluded.retain(|id| id != &event.ad.id);
                match active_tab {
                    Tab::Recent => {
                        if self.recent.iter().any(|item| item.ad.id == event.ad.id) {
                            return false;
                        }
                        self.recent.insert(
                            0,
                            KeywordAd {
                                keyword: event.keyword.clone(),
                                ad: event.ad.clone(),
                            },
                        );
                        true
                    }
                    Tab::Keywords if selected_keyword == Some(event.keyword.as_str()) => {
                        let Some(ads) = self.by_keyword.get_mut(&event.keyword) else {
                            return false;
                        };
                        if ads.iter().any(|ad| ad.id == event.ad.id) {
                            return false;
                        }
                        ads.insert(0, event.ad.clone());
                        true
                    }
                    _ => false,
                }
            }
        }
    }

    /// Looks an ad up in every loaded collection.
    pub fn find_ad(&self, id: &AdId) -> Option<&Ad> {
        self.recent
            .iter()
            .map(|item| &item.ad)
            .chain(self.by_keyword.values().flatten())
            .find(|ad| &ad.id == id)
    }
}
