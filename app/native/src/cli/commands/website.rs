//! Website CLI commands.
//!
//! Commands are sent to the running app over IPC. Collection commands fall
//! back to editing the store file when the app is not running; commands
//! that need the renderer fail with "Plash is not running".

use colored::Colorize;
use serde_json::Value;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::cli::output;
use crate::error::PlashError;
use crate::ipc::{IpcError, IpcRequest, send_request};
use crate::websites::{
    StoreSnapshot, Website, WebsiteCollection, WebsiteStore, parse_website_url, resolve_selector,
};

type StoreEdit = fn(&mut OfflineStore) -> Result<Value, PlashError>;

/// How a command behaves when the app is not running.
enum Fallback<F> {
    /// Edit the store file.
    Store(F),
    /// Report that the app is not running.
    RequireApp,
}

/// The store file opened for editing without the app.
pub struct OfflineStore {
    store: WebsiteStore,
    collection: WebsiteCollection,
    is_enabled: bool,
    dirty: bool,
}

impl OfflineStore {
    /// Loads the store at `store`'s path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn open(store: WebsiteStore) -> Result<Self, PlashError> {
        let snapshot = store.load()?;
        Ok(Self {
            store,
            collection: WebsiteCollection::new(snapshot.websites),
            is_enabled: snapshot.is_enabled,
            dirty: false,
        })
    }

    /// Writes the store back if anything changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn close(self) -> Result<(), PlashError> {
        if self.dirty {
            self.store.save(&StoreSnapshot {
                websites: self.collection.all(),
                is_enabled: self.is_enabled,
            })?;
        }
        Ok(())
    }

    fn resolve(&self, selector: &str) -> Result<uuid::Uuid, PlashError> {
        resolve_selector(&self.collection.all(), selector)
            .ok_or_else(|| PlashError::WebsiteNotFound(selector.to_string()))
    }

    /// Adds a website and makes it current.
    ///
    /// # Errors
    ///
    /// Returns [`PlashError::InvalidUrl`] for unusable input.
    pub fn add(&mut self, url: &str, title: Option<&str>) -> Result<Website, PlashError> {
        let url = parse_website_url(url)?;
        let id = self.collection.add(Website::new(url, title.unwrap_or_default()));
        self.dirty = true;
        self.collection.get(id).ok_or_else(|| PlashError::WebsiteNotFound(id.to_string()))
    }

    /// Removes a website by UUID or 1-based index.
    ///
    /// # Errors
    ///
    /// Returns [`PlashError::WebsiteNotFound`] if nothing matches.
    pub fn remove(&mut self, selector: &str) -> Result<Website, PlashError> {
        let id = self.resolve(selector)?;
        let removed =
            self.collection.remove(id).ok_or_else(|| PlashError::WebsiteNotFound(selector.to_string()))?;
        self.dirty = true;
        Ok(removed)
    }

    /// Makes a website current.
    ///
    /// # Errors
    ///
    /// Returns [`PlashError::WebsiteNotFound`] if nothing matches.
    pub fn set_current(&mut self, selector: &str) -> Result<Option<Website>, PlashError> {
        let id = self.resolve(selector)?;
        self.dirty |= self.collection.current_id() != Some(id);
        self.collection.set_current(id);
        Ok(self.collection.current())
    }

    pub fn next(&mut self) -> Option<Website> { self.step(WebsiteCollection::next) }

    pub fn previous(&mut self) -> Option<Website> { self.step(WebsiteCollection::previous) }

    pub fn random(&mut self) -> Option<Website> { self.step(WebsiteCollection::random) }

    fn step(&mut self, f: fn(&mut WebsiteCollection) -> Option<uuid::Uuid>) -> Option<Website> {
        let before = self.collection.current_id();
        self.dirty |= f(&mut self.collection) != before;
        self.collection.current()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.dirty |= self.is_enabled != enabled;
        self.is_enabled = enabled;
    }

    #[must_use]
    pub fn websites(&self, filter: Option<&str>) -> Vec<Website> {
        filter.map_or_else(|| self.collection.all(), |f| self.collection.filter(f))
    }

    #[must_use]
    pub fn current(&self) -> Option<Website> { self.collection.current() }
}

/// Sends `request` to the app, or applies the fallback to the store file.
fn run<F>(request: &IpcRequest, fallback: Fallback<F>) -> Result<Value, PlashError>
where F: FnOnce(&mut OfflineStore) -> Result<Value, PlashError> {
    match send_request(request) {
        Ok(response) => response.into_result(),
        Err(IpcError::AppNotRunning) => match fallback {
            Fallback::Store(apply) => {
                tracing::debug!(request = request.name(), "app not running, editing store file");
                let mut store = OfflineStore::open(WebsiteStore::default_location())?;
                let value = apply(&mut store)?;
                store.close()?;
                Ok(value)
            }
            Fallback::RequireApp => Err(PlashError::AppNotRunning),
        },
        Err(err) => Err(err.into()),
    }
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, PlashError> { Ok(serde_json::to_value(value)?) }

fn parse<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, PlashError> { Ok(serde_json::from_value(value)?) }

// ============================================================================
// Commands
// ============================================================================

/// `plash add`.
///
/// # Errors
///
/// Returns an error if the URL is invalid or the store cannot be written.
pub fn add(url: &str, title: Option<&str>) -> Result<(), PlashError> {
    let request = IpcRequest::Add {
        url: url.to_string(),
        title: title.map(str::to_string),
    };
    let value = run(&request, Fallback::Store(|store: &mut OfflineStore| to_value(store.add(url, title)?)))?;
    print_website_change("Added", parse(value)?);
    Ok(())
}

/// `plash remove`.
///
/// # Errors
///
/// Returns an error if no website matches.
pub fn remove(website: &str) -> Result<(), PlashError> {
    let request = IpcRequest::Remove { website: website.to_string() };
    let value =
        run(&request, Fallback::Store(|store: &mut OfflineStore| to_value(store.remove(website)?)))?;
    print_website_change("Removed", parse(value)?);
    Ok(())
}

/// `plash set-current`.
///
/// # Errors
///
/// Returns an error if no website matches.
pub fn set_current(website: &str) -> Result<(), PlashError> {
    let request = IpcRequest::SetCurrent { website: website.to_string() };
    let value = run(
        &request,
        Fallback::Store(|store: &mut OfflineStore| to_value(store.set_current(website)?)),
    )?;
    print_website_change("Current", parse(value)?);
    Ok(())
}

/// `plash next`, `plash previous` and `plash random`.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written.
pub fn navigate(request: &IpcRequest) -> Result<(), PlashError> {
    let fallback = |store: &mut OfflineStore| {
        let website = match request {
            IpcRequest::Previous => store.previous(),
            IpcRequest::Random => store.random(),
            _ => store.next(),
        };
        to_value(website)
    };
    let value = run(request, Fallback::Store(fallback))?;
    print_website_change("Current", parse(value)?);
    Ok(())
}

/// `plash enable` and `plash disable`.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written.
pub fn set_enabled(enabled: bool) -> Result<(), PlashError> {
    let request = IpcRequest::SetEnabled { enabled };
    run(
        &request,
        Fallback::Store(|store: &mut OfflineStore| {
            store.set_enabled(enabled);
            to_value(store.current())
        }),
    )?;
    println!("Plash {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

/// Commands that only make sense with a running renderer: `reload`,
/// `toggle-browsing-mode` and `open`.
///
/// # Errors
///
/// Returns [`PlashError::AppNotRunning`] if the app is not running.
pub fn require_app(request: &IpcRequest) -> Result<(), PlashError> {
    let value = run(request, Fallback::<StoreEdit>::RequireApp)?;
    if let Ok(Some(website)) = parse::<Option<Website>>(value) {
        println!("{} {}", "Current:".bold(), website.display_title());
    }
    Ok(())
}

/// `plash list`.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn list(filter: Option<&str>, json: bool) -> Result<(), PlashError> {
    let request = IpcRequest::Websites { filter: filter.map(str::to_string) };
    let value =
        run(&request, Fallback::Store(|store: &mut OfflineStore| to_value(store.websites(filter))))?;

    if json {
        output::print_highlighted_json(&value);
        return Ok(());
    }

    let websites: Vec<Website> = parse(value)?;
    if websites.is_empty() {
        println!("No websites.");
        return Ok(());
    }
    println!("{}", websites_table(&websites));
    Ok(())
}

/// `plash current`.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn current(json: bool) -> Result<(), PlashError> {
    let value = run(
        &IpcRequest::Current,
        Fallback::Store(|store: &mut OfflineStore| to_value(store.current())),
    )?;

    if json {
        output::print_highlighted_json(&value);
        return Ok(());
    }

    match parse::<Option<Website>>(value)? {
        Some(website) => {
            println!("{}", website.display_title().bold());
            println!("{}", website.url);
        }
        None => println!("No websites."),
    }
    Ok(())
}

/// `plash status`.
///
/// # Errors
///
/// Returns [`PlashError::AppNotRunning`] if the app is not running.
pub fn status(json: bool) -> Result<(), PlashError> {
    let value = run(
        &IpcRequest::Status,
        Fallback::<StoreEdit>::RequireApp,
    )?;

    if json {
        output::print_highlighted_json(&value);
        return Ok(());
    }

    let field = |key: &str| value.get(key).and_then(Value::as_bool).unwrap_or_default();
    println!("Enabled:  {}", output::format_bool(field("enabled")));
    println!("Active:   {}", output::format_bool(field("active")));
    println!("Browsing: {}", output::format_bool(field("browsing")));
    if let Some(phase) = value.get("phase").and_then(Value::as_str) {
        println!("Phase:    {phase}");
    }
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        println!("Error:    {}", error.red());
    }
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

#[derive(Tabled)]
struct WebsiteRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "ID")]
    id: String,
}

fn websites_table(websites: &[Website]) -> String {
    let rows: Vec<WebsiteRow> = websites
        .iter()
        .enumerate()
        .map(|(i, website)| WebsiteRow {
            index: i + 1,
            title: output::truncate(&website.display_title(), 40),
            url: output::truncate(website.url.as_str(), 60),
            current: if website.is_current { output::format_bool(true) } else { String::new() },
            id: website.id.to_string(),
        })
        .collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::right()))
        .to_string()
}

fn print_website_change(label: &str, website: Option<Website>) {
    match website {
        Some(website) => println!(
            "{} {} {}",
            format!("{label}:").bold(),
            website.display_title(),
            format!("({})", website.url).dimmed()
        ),
        None => println!("No websites."),
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> WebsiteStore { WebsiteStore::new(dir.path().join("websites.json")) }

    #[test]
    fn test_offline_add_and_list() {
        let dir = tempfile::tempdir().unwrap();

        let mut offline = OfflineStore::open(store_in(&dir)).unwrap();
        offline.add("time.is", Some("Clock")).unwrap();
        offline.add("https://example.com", None).unwrap();
        offline.close().unwrap();

        let offline = OfflineStore::open(store_in(&dir)).unwrap();
        let websites = offline.websites(None);
        assert_eq!(websites.len(), 2);
        assert_eq!(offline.current().unwrap().url.as_str(), "https://example.com/");
        assert_eq!(offline.websites(Some("clock")).len(), 1);
    }

    #[test]
    fn test_offline_add_rejects_invalid_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut offline = OfflineStore::open(store_in(&dir)).unwrap();
        assert!(matches!(offline.add("ftp://x", None), Err(PlashError::InvalidUrl(_))));
    }

    #[test]
    fn test_offline_selectors() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let a = Website::new(Url::parse("https://a.example.com").unwrap(), "A");
        let b = Website::new(Url::parse("https://b.example.com").unwrap(), "B");
        let b_id = b.id;
        store
            .save(&StoreSnapshot { websites: vec![a, b], is_enabled: true })
            .unwrap();

        let mut offline = OfflineStore::open(store).unwrap();
        assert_eq!(offline.set_current("2").unwrap().unwrap().id, b_id);
        assert_eq!(offline.remove(&b_id.to_string()).unwrap().title, "B");
        assert!(matches!(offline.remove("7"), Err(PlashError::WebsiteNotFound(_))));
        assert_eq!(offline.current().unwrap().title, "A");
    }

    #[test]
    fn test_offline_navigation_and_enable() {
        let dir = tempfile::tempdir().unwrap();
        let mut offline = OfflineStore::open(store_in(&dir)).unwrap();
        offline.add("https://a.example.com", Some("A")).unwrap();
        offline.add("https://b.example.com", Some("B")).unwrap();

        assert_eq!(offline.next().unwrap().title, "A");
        assert_eq!(offline.previous().unwrap().title, "B");
        assert_eq!(offline.random().unwrap().title, "A");

        offline.set_enabled(false);
        offline.close().unwrap();

        let snapshot = store_in(&dir).load().unwrap();
        assert!(!snapshot.is_enabled);
        assert!(snapshot.websites[0].is_current);
    }

    #[test]
    fn test_read_only_use_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let offline = OfflineStore::open(store_in(&dir)).unwrap();
        let _ = offline.websites(None);
        offline.close().unwrap();
        assert!(!dir.path().join("websites.json").exists());
    }

    #[test]
    fn test_websites_table_marks_current() {
        let mut website = Website::new(Url::parse("https://time.is").unwrap(), "Clock");
        website.is_current = true;
        let table = websites_table(&[website]);
        assert!(table.contains("Clock"));
        assert!(table.contains("https://time.is/"));
        assert!(table.contains('✓'));
    }
}
