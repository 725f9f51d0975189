//! The ordered website collection and its current-selection invariant.
//!
//! The list lives in an `eyeball::Observable`. Every mutation publishes the
//! full list, so subscribers (tray menu, IPC queries) always see a
//! normalized snapshot where exactly one website is current whenever the
//! collection is non-empty.

use eyeball::{Observable, Subscriber};
use rand::Rng;
use uuid::Uuid;

use super::model::Website;
use super::shuffle::ShuffleCursor;

/// Ordered list of websites with exactly one current entry.
pub struct WebsiteCollection {
    websites: Observable<Vec<Website>>,
    shuffle: ShuffleCursor,
}

impl Default for WebsiteCollection {
    fn default() -> Self { Self::new(Vec::new()) }
}

impl WebsiteCollection {
    /// Creates a collection from loaded websites, fixing up the current flag.
    #[must_use]
    pub fn new(mut websites: Vec<Website>) -> Self {
        normalize(&mut websites, None);
        Self {
            websites: Observable::new(websites),
            shuffle: ShuffleCursor::new(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn len(&self) -> usize { Observable::get(&self.websites).len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { Observable::get(&self.websites).is_empty() }

    /// All websites in display order.
    #[must_use]
    pub fn all(&self) -> Vec<Website> { Observable::get(&self.websites).clone() }

    /// The current website, if any.
    #[must_use]
    pub fn current(&self) -> Option<Website> {
        Observable::get(&self.websites).iter().find(|w| w.is_current).cloned()
    }

    #[must_use]
    pub fn current_id(&self) -> Option<Uuid> {
        Observable::get(&self.websites).iter().find(|w| w.is_current).map(|w| w.id)
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<Website> {
        Observable::get(&self.websites).iter().find(|w| w.id == id).cloned()
    }

    #[must_use]
    pub fn position(&self, id: Uuid) -> Option<usize> {
        Observable::get(&self.websites).iter().position(|w| w.id == id)
    }

    /// Websites whose title or URL contains `query`, ignoring case.
    #[must_use]
    pub fn filter(&self, query: &str) -> Vec<Website> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.all();
        }

        Observable::get(&self.websites)
            .iter()
            .filter(|w| {
                w.title.to_lowercase().contains(&query)
                    || w.url.as_str().to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    /// Resolves a UUID or a 1-based index into a website id.
    #[must_use]
    pub fn resolve(&self, selector: &str) -> Option<Uuid> {
        resolve_selector(Observable::get(&self.websites).as_slice(), selector)
    }

    /// Subscribes to list changes.
    #[must_use]
    pub fn subscribe(&self) -> Subscriber<Vec<Website>> { Observable::subscribe(&self.websites) }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Appends a website and makes it current.
    pub fn add(&mut self, website: Website) -> Uuid {
        let id = website.id;
        self.mutate(|list| {
            list.push(website);
            normalize(list, Some(id));
        });
        tracing::debug!(%id, "website added");
        id
    }

    /// Removes a website. If it was current, the first remaining website
    /// becomes current.
    pub fn remove(&mut self, id: Uuid) -> Option<Website> {
        let index = self.position(id)?;
        let mut removed = None;
        self.mutate(|list| {
            let website = list.remove(index);
            normalize(list, None);
            removed = Some(website);
        });
        tracing::debug!(%id, "website removed");
        removed
    }

    /// Makes `id` the current website. Returns `false` if it does not exist.
    pub fn set_current(&mut self, id: Uuid) -> bool {
        if self.position(id).is_none() {
            return false;
        }
        if self.current_id() != Some(id) {
            self.mutate(|list| normalize(list, Some(id)));
        }
        true
    }

    /// Moves the selection to the following website, wrapping around.
    pub fn next(&mut self) -> Option<Uuid> { self.step(1) }

    /// Moves the selection to the preceding website, wrapping around.
    pub fn previous(&mut self) -> Option<Uuid> { self.step(-1) }

    /// Moves the selection to a random website other than the current one.
    pub fn random(&mut self) -> Option<Uuid> {
        let mut rng = rand::rng();
        self.random_with(&mut rng)
    }

    /// Same as [`random`](Self::random) with a caller-provided generator.
    pub fn random_with<R>(&mut self, rng: &mut R) -> Option<Uuid>
    where R: Rng + ?Sized {
        let ids: Vec<Uuid> = Observable::get(&self.websites).iter().map(|w| w.id).collect();
        let current = self.current_id();
        let id = self.shuffle.next(&ids, current, rng)?;
        self.set_current(id);
        Some(id)
    }

    /// Edits a website in place. Returns `false` if it does not exist.
    ///
    /// The id and current flag are restored after `f` runs.
    pub fn update<F>(&mut self, id: Uuid, f: F) -> bool
    where F: FnOnce(&mut Website) {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.mutate(|list| {
            let website = &mut list[index];
            let is_current = website.is_current;
            f(website);
            website.id = id;
            website.is_current = is_current;
        });
        true
    }

    /// Moves a website to `index` (clamped). Does not reseed random order.
    pub fn move_to(&mut self, id: Uuid, index: usize) -> bool {
        let Some(from) = self.position(id) else {
            return false;
        };
        let to = index.min(self.len().saturating_sub(1));
        if from != to {
            self.mutate(|list| {
                let website = list.remove(from);
                list.insert(to, website);
            });
        }
        true
    }

    /// Applies a fetched title if the website still exists and still has
    /// no title.
    pub fn set_title_if_empty(&mut self, id: Uuid, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }

        match self.get(id) {
            Some(website) if website.needs_title() => {
                self.update(id, |w| w.title = title.to_string())
            }
            _ => false,
        }
    }

    fn step(&mut self, delta: isize) -> Option<Uuid> {
        let websites = Observable::get(&self.websites);
        let len = websites.len();
        if len == 0 {
            return None;
        }

        let current = websites.iter().position(|w| w.is_current).unwrap_or(0);
        let len_signed = isize::try_from(len).ok()?;
        let current_signed = isize::try_from(current).ok()?;
        let target = usize::try_from((current_signed + delta).rem_euclid(len_signed)).ok()?;
        let id = websites[target].id;

        self.set_current(id);
        Some(id)
    }

    fn mutate<F>(&mut self, f: F)
    where F: FnOnce(&mut Vec<Website>) {
        let mut list = Observable::get(&self.websites).clone();
        f(&mut list);
        Observable::set(&mut self.websites, list);
    }
}

/// Resolves a UUID or a 1-based index against a website list.
#[must_use]
pub fn resolve_selector(websites: &[Website], selector: &str) -> Option<Uuid> {
    let selector = selector.trim();

    if let Ok(id) = Uuid::parse_str(selector) {
        return websites.iter().find(|w| w.id == id).map(|w| w.id);
    }

    let index = selector.parse::<usize>().ok()?;
    websites.get(index.checked_sub(1)?).map(|w| w.id)
}

/// Leaves exactly one website current: `preferred` if present, else the
/// first flagged website, else the first website.
fn normalize(list: &mut [Website], preferred: Option<Uuid>) {
    let chosen = preferred
        .filter(|id| list.iter().any(|w| w.id == *id))
        .or_else(|| list.iter().find(|w| w.is_current).map(|w| w.id))
        .or_else(|| list.first().map(|w| w.id));

    for website in list.iter_mut() {
        website.is_current = Some(website.id) == chosen;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use url::Url;

    use super::*;

    fn site(name: &str) -> Website {
        Website::new(Url::parse(&format!("https://{name}.example.com")).unwrap(), name)
    }

    fn current_count(collection: &WebsiteCollection) -> usize {
        collection.all().iter().filter(|w| w.is_current).count()
    }

    fn collection_abc() -> (WebsiteCollection, Uuid, Uuid, Uuid) {
        let a = site("a");
        let b = site("b");
        let c = site("c");
        let ids = (a.id, b.id, c.id);
        let collection = WebsiteCollection::new(vec![a, b, c]);
        (collection, ids.0, ids.1, ids.2)
    }

    #[test]
    fn test_new_normalizes_to_first_when_none_current() {
        let (collection, a, _, _) = collection_abc();
        assert_eq!(collection.current_id(), Some(a));
        assert_eq!(current_count(&collection), 1);
    }

    #[test]
    fn test_new_keeps_only_first_flagged() {
        let mut a = site("a");
        let mut b = site("b");
        let mut c = site("c");
        a.is_current = false;
        b.is_current = true;
        c.is_current = true;
        let b_id = b.id;

        let collection = WebsiteCollection::new(vec![a, b, c]);
        assert_eq!(collection.current_id(), Some(b_id));
        assert_eq!(current_count(&collection), 1);
    }

    #[test]
    fn test_empty_collection_has_no_current() {
        let mut collection = WebsiteCollection::default();
        assert!(collection.current().is_none());
        assert_eq!(collection.next(), None);
        assert_eq!(collection.previous(), None);
        assert_eq!(collection.random(), None);
    }

    #[test]
    fn test_add_makes_website_current() {
        let (mut collection, _, _, _) = collection_abc();
        let d = collection.add(site("d"));
        assert_eq!(collection.current_id(), Some(d));
        assert_eq!(collection.len(), 4);
        assert_eq!(current_count(&collection), 1);
    }

    #[test]
    fn test_remove_current_promotes_first_remaining() {
        let (mut collection, a, b, c) = collection_abc();
        assert!(collection.remove(a).is_some());
        assert_eq!(collection.current_id(), Some(b));

        assert_eq!(collection.next(), Some(c));
        assert_eq!(collection.next(), Some(b));
    }

    #[test]
    fn test_remove_non_current_keeps_selection() {
        let (mut collection, a, b, _) = collection_abc();
        collection.remove(b);
        assert_eq!(collection.current_id(), Some(a));
        assert_eq!(current_count(&collection), 1);
    }

    #[test]
    fn test_remove_last_empties_collection() {
        let only = site("only");
        let id = only.id;
        let mut collection = WebsiteCollection::new(vec![only]);
        collection.remove(id);
        assert!(collection.is_empty());
        assert!(collection.current().is_none());
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let (mut collection, _, _, _) = collection_abc();
        assert!(collection.remove(Uuid::now_v7()).is_none());
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn test_set_current() {
        let (mut collection, _, _, c) = collection_abc();
        assert!(collection.set_current(c));
        assert_eq!(collection.current_id(), Some(c));
        assert_eq!(current_count(&collection), 1);
        assert!(!collection.set_current(Uuid::now_v7()));
        assert_eq!(collection.current_id(), Some(c));
    }

    #[test]
    fn test_next_and_previous_wrap_around() {
        let (mut collection, a, b, c) = collection_abc();
        assert_eq!(collection.previous(), Some(c));
        assert_eq!(collection.next(), Some(a));
        assert_eq!(collection.next(), Some(b));
    }

    #[test]
    fn test_next_then_previous_returns_to_start() {
        let (mut collection, _, b, _) = collection_abc();
        collection.set_current(b);
        collection.next();
        assert_eq!(collection.previous(), Some(b));
    }

    #[test]
    fn test_random_never_repeats_current() {
        let (mut collection, _, _, _) = collection_abc();
        let mut rng = StdRng::seed_from_u64(11);
        let mut current = collection.current_id();

        for _ in 0..25 {
            let picked = collection.random_with(&mut rng);
            assert_ne!(picked, current);
            assert_eq!(collection.current_id(), picked);
            current = picked;
        }
    }

    #[test]
    fn test_update_preserves_identity_and_flag() {
        let (mut collection, a, _, _) = collection_abc();
        assert!(collection.update(a, |w| {
            w.title = "Renamed".to_string();
            w.id = Uuid::now_v7();
            w.is_current = false;
        }));

        let website = collection.get(a).unwrap();
        assert_eq!(website.title, "Renamed");
        assert!(website.is_current);
    }

    #[test]
    fn test_move_to_reorders_and_clamps() {
        let (mut collection, a, b, c) = collection_abc();
        assert!(collection.move_to(a, 99));
        let order: Vec<Uuid> = collection.all().iter().map(|w| w.id).collect();
        assert_eq!(order, vec![b, c, a]);
        assert_eq!(collection.current_id(), Some(a));
    }

    #[test]
    fn test_filter_matches_title_and_url() {
        let (collection, _, _, _) = collection_abc();
        assert_eq!(collection.filter("B").len(), 1);
        assert_eq!(collection.filter("example.com").len(), 3);
        assert_eq!(collection.filter("").len(), 3);
        assert!(collection.filter("nothing").is_empty());
    }

    #[test]
    fn test_resolve_by_index_and_id() {
        let (collection, a, b, _) = collection_abc();
        assert_eq!(collection.resolve("2"), Some(b));
        assert_eq!(collection.resolve(&a.to_string()), Some(a));
        assert_eq!(collection.resolve("0"), None);
        assert_eq!(collection.resolve("4"), None);
        assert_eq!(collection.resolve("nope"), None);
    }

    #[test]
    fn test_set_title_if_empty() {
        let mut untitled = site("x");
        untitled.title.clear();
        let id = untitled.id;
        let mut collection = WebsiteCollection::new(vec![untitled]);

        assert!(collection.set_title_if_empty(id, " Fetched "));
        assert_eq!(collection.get(id).unwrap().title, "Fetched");
        assert!(!collection.set_title_if_empty(id, "Again"));
        assert!(!collection.set_title_if_empty(Uuid::now_v7(), "Gone"));
    }

    #[test]
    fn test_subscribers_see_normalized_snapshots() {
        let (mut collection, _, b, _) = collection_abc();
        let mut subscriber = collection.subscribe();

        collection.set_current(b);
        let snapshot = subscriber.next_now();
        assert_eq!(snapshot.iter().filter(|w| w.is_current).count(), 1);
        assert!(snapshot.iter().any(|w| w.id == b && w.is_current));
    }
}
