use std::fmt::Write;

use super::header_utils::PendingHeaders;

pub const HLS_MANIFEST_PATH: &str = "/proxy/hls/manifest.m3u8";
pub const DASH_MANIFEST_PATH: &str = "/proxy/mpd/manifest.m3u8";
pub const EXTRACTOR_PATH: &str = "/extractor/video";

const DRM_KEY_ID_PARAM: &str = "key_id";
const DRM_KEY_PARAM: &str = "key";

/// Where a playable entry gets sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// left alone, no proxying at all
    Direct,
    HlsManifest,
    DashManifest,
    Extractor,
}

// first match wins, and the order matters: a vavoo url with .m3u8 in it is still a vavoo url.
// matching is plain substring containment on the whole line so a marker sitting in some
// unrelated query string will also match, that's known and kept on purpose
const ROUTE_RULES: &[(&str, Route)] = &[
    ("pluto.tv", Route::Direct),
    ("vavoo.to", Route::HlsManifest),
    ("vixsrc.to", Route::Extractor),
    (".m3u8", Route::HlsManifest),
    (".mpd", Route::DashManifest),
    // unknown dynamic endpoints are assumed to hand back hls
    (".php", Route::HlsManifest),
];

pub fn classify(url: &str) -> Route {
    ROUTE_RULES
        .iter()
        .find(|(marker, _)| url.contains(marker))
        .map(|(_, route)| *route)
        .unwrap_or(Route::HlsManifest)
}

/// Per request values every rewritten entry needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteContext {
    pub base_url: String,
    pub api_password: Option<String>,
}

impl RewriteContext {
    pub fn new(base_url: impl Into<String>, api_password: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_password: api_password.filter(|p| !p.is_empty()),
        }
    }
}

/// DRM parameters lifted out of a dash manifest url, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrmKeys {
    pub key_ids: Vec<String>,
    pub keys: Vec<String>,
}

impl DrmKeys {
    pub fn is_empty(&self) -> bool {
        self.key_ids.is_empty() && self.keys.is_empty()
    }
}

/// Removes every `key_id` and `key` pair from the url's query. The remaining pairs are kept
/// byte for byte so the cleaned url decodes back to exactly what the provider gave us.
pub fn split_drm_params(url: &str) -> (String, DrmKeys) {
    let mut drm = DrmKeys::default();

    let (without_fragment, fragment) = match url.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (url, None),
    };

    let Some((path, query)) = without_fragment.split_once('?') else {
        return (url.to_string(), drm);
    };

    let mut kept: Vec<&str> = Vec::new();
    for pair in query.split('&') {
        match url::form_urlencoded::parse(pair.as_bytes()).next() {
            Some((name, value)) if name == DRM_KEY_ID_PARAM => drm.key_ids.push(value.into_owned()),
            Some((name, value)) if name == DRM_KEY_PARAM => drm.keys.push(value.into_owned()),
            _ => kept.push(pair),
        }
    }

    let mut clean = path.to_string();
    if !kept.is_empty() {
        clean.push('?');
        clean.push_str(&kept.join("&"));
    }
    if let Some(fragment) = fragment {
        clean.push('#');
        clean.push_str(fragment);
    }

    (clean, drm)
}

/// Rewrites one playable entry into a proxy url, terminated with `\n`.
///
/// Header params go after the route params and the password always goes last. Direct entries
/// come back untouched, headers and password included.
pub fn rewrite_entry(url: &str, headers: &PendingHeaders, context: &RewriteContext) -> String {
    let base = &context.base_url;

    let mut rewritten = match classify(url) {
        Route::Direct => return format!("{}\n", url),
        Route::HlsManifest => format!(
            "{}{}?d={}",
            base,
            HLS_MANIFEST_PATH,
            urlencoding::encode(url)
        ),
        Route::Extractor => format!(
            "{}{}?host=VixCloud&redirect_stream=true&d={}&max_res=true&no_proxy=true",
            base,
            EXTRACTOR_PATH,
            urlencoding::encode(url)
        ),
        Route::DashManifest => {
            let (clean_url, drm) = split_drm_params(url);
            let mut proxied = format!(
                "{}{}?d={}",
                base,
                DASH_MANIFEST_PATH,
                urlencoding::encode(&clean_url)
            );
            for key_id in &drm.key_ids {
                let _ = write!(
                    proxied,
                    "&{}={}",
                    DRM_KEY_ID_PARAM,
                    urlencoding::encode(key_id)
                );
            }
            for key in &drm.keys {
                let _ = write!(proxied, "&{}={}", DRM_KEY_PARAM, urlencoding::encode(key));
            }
            proxied
        }
    };

    for (name, value) in headers.iter() {
        let _ = write!(
            rewritten,
            "&h_{}={}",
            urlencoding::encode(name),
            urlencoding::encode(value)
        );
    }

    if let Some(password) = &context.api_password {
        let _ = write!(rewritten, "&api_password={}", urlencoding::encode(password));
    }

    rewritten.push('\n');
    rewritten
}
