//! Request classification: map a request path to a caching strategy and
//! a cache bucket.
//!
//! Classification is by file extension against the path only, matched
//! case-sensitively, first rule wins. Query strings never influence the
//! route (they are still part of the cache entry identity). Deployed
//! assets are all lowercase, so there is no case-folding here.

/// Caching policy applied to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve from cache, fetch only on miss. Fonts.
    CacheFirst,
    /// Serve stale immediately, refresh in the background. Images, CSS, JS.
    StaleWhileRevalidate,
    /// Fetch first, fall back to cache and then the offline page. Documents.
    NetworkFirst,
}

/// Cache bucket kind. Storage names are versioned via [`Bucket::versioned_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Static,
    Photos,
    Pages,
}

impl Bucket {
    /// All bucket kinds, in creation order. Lookups that span buckets
    /// (offline fallback) search in this order.
    pub const ALL: [Bucket; 3] = [Bucket::Static, Bucket::Photos, Bucket::Pages];

    /// Unversioned kind label.
    pub fn kind(&self) -> &'static str {
        match self {
            Bucket::Static => "static",
            Bucket::Photos => "photos",
            Bucket::Pages => "pages",
        }
    }

    /// Storage name for this bucket under the given cache version tag,
    /// e.g. `static-v6`. Bumping the tag orphans every older bucket.
    pub fn versioned_name(&self, version: &str) -> String {
        format!("{}-{}", self.kind(), version)
    }
}

/// The set of bucket names that are valid under `version`. Everything
/// else found in storage is garbage from an earlier deploy.
pub fn valid_bucket_names(version: &str) -> [String; 3] {
    [
        Bucket::Static.versioned_name(version),
        Bucket::Photos.versioned_name(version),
        Bucket::Pages.versioned_name(version),
    ]
}

/// A classified request: which policy to apply, against which bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub strategy: Strategy,
    pub bucket: Bucket,
}

const FONT_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf", "otf"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "avif", "gif", "svg"];
const STYLE_SCRIPT_EXTENSIONS: &[&str] = &["css", "js"];

/// Extension of the final path segment, if any. `/a/b.woff2` -> `woff2`,
/// `/a.css/b` -> None, `/page.` -> None.
fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() { None } else { Some(ext) }
}

/// Classify a request path. Total: every path maps to exactly one route.
///
/// Priority order: fonts, then images, then styles/scripts, then
/// everything else (HTML navigations, extensionless paths).
pub fn classify(path: &str) -> Route {
    match extension(path) {
        Some(ext) if FONT_EXTENSIONS.contains(&ext) => Route {
            strategy: Strategy::CacheFirst,
            bucket: Bucket::Static,
        },
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => Route {
            strategy: Strategy::StaleWhileRevalidate,
            bucket: Bucket::Photos,
        },
        Some(ext) if STYLE_SCRIPT_EXTENSIONS.contains(&ext) => Route {
            strategy: Strategy::StaleWhileRevalidate,
            bucket: Bucket::Static,
        },
        _ => Route {
            strategy: Strategy::NetworkFirst,
            bucket: Bucket::Pages,
        },
    }
}
