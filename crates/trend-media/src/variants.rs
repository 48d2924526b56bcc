//! Declarative URL size-variant rewrites.
//!
//! Image hosts expose the same artwork at several sizes through a path
//! segment or file-name suffix. A rewrite list is applied to a base URL to
//! produce the ordered attempts handed to [`crate::AssetFetcher::fetch_first`].

/// One transform of an image URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlRewrite {
    /// The URL unchanged
    Identity,
    /// Replace an iTunes `{w}x{h}bb.{ext}` file name
    ItunesSize(&'static str),
    /// Replace the TMDB `/t/p/{size}/` path segment
    TmdbSize(&'static str),
}

/// App-store icon sizes, largest first.
pub const ITUNES_ICON_REWRITES: &[UrlRewrite] = &[
    UrlRewrite::ItunesSize("1024x1024bb.png"),
    UrlRewrite::ItunesSize("512x512bb.jpg"),
    UrlRewrite::ItunesSize("512x512bb.png"),
    UrlRewrite::ItunesSize("256x256bb.jpg"),
];

/// App-store screenshots: full resolution first, then as published.
pub const ITUNES_SCREENSHOT_REWRITES: &[UrlRewrite] = &[
    UrlRewrite::ItunesSize("1242x2688bb.jpg"),
    UrlRewrite::Identity,
];

/// TMDB poster sizes.
pub const TMDB_POSTER_REWRITES: &[UrlRewrite] = &[
    UrlRewrite::TmdbSize("original"),
    UrlRewrite::TmdbSize("w780"),
    UrlRewrite::TmdbSize("w500"),
];

impl UrlRewrite {
    /// Apply the rewrite, `None` when the URL does not have the expected shape.
    pub fn apply(&self, url: &str) -> Option<String> {
        match self {
            UrlRewrite::Identity => Some(url.to_string()),
            UrlRewrite::ItunesSize(file) => rewrite_itunes(url, file),
            UrlRewrite::TmdbSize(size) => rewrite_tmdb(url, size),
        }
    }
}

fn rewrite_itunes(url: &str, file: &str) -> Option<String> {
    let (prefix, name) = url.rsplit_once('/')?;
    let (dims, _) = name.split_once("bb.")?;
    let (w, h) = dims.split_once('x')?;
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !numeric(w) || !numeric(h) {
        return None;
    }
    Some(format!("{prefix}/{file}"))
}

fn rewrite_tmdb(url: &str, size: &str) -> Option<String> {
    let marker = "/t/p/";
    let start = url.find(marker)? + marker.len();
    let rest = &url[start..];
    let end = rest.find('/')?;
    Some(format!("{}{}{}", &url[..start], size, &rest[end..]))
}

/// Expand `url` through `rewrites`, keeping order and dropping duplicates.
///
/// The original URL is appended last when no rewrite produced it.
pub fn expand(url: &str, rewrites: &[UrlRewrite]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(rewrites.len() + 1);
    for rewrite in rewrites {
        if let Some(candidate) = rewrite.apply(url) {
            if !out.contains(&candidate) {
                out.push(candidate);
            }
        }
    }
    if !out.iter().any(|u| u == url) {
        out.push(url.to_string());
    }
    out
}
