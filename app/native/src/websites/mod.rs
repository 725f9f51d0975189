//! Website records, their collection, and persistence.

pub mod collection;
pub mod metadata;
pub mod model;
pub mod shuffle;
pub mod store;
pub mod url;

pub use collection::{WebsiteCollection, resolve_selector};
pub use metadata::MetadataError;
pub use model::{InvertColors, Website};
pub use store::{StoreError, StoreSnapshot, WebsiteStore};
pub use self::url::{ScreenSize, UrlError, parse_website_url};
