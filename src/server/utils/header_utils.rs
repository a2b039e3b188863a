use thiserror::Error;
use tracing::warn;

pub const VLC_OPTION_PREFIX: &str = "#EXTVLCOPT:";
pub const HTTP_HEADERS_PREFIX: &str = "#EXTHTTP:";

const HTTP_OPTION_PREFIX: &str = "http-";
const HTTP_HEADER_OPTION: &str = "http-header";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("header option '{0}' has no value")]
    MissingValue(String),
    #[error("option has an empty key")]
    EmptyKey,
    #[error("invalid json: {0}")]
    InvalidJson(String),
    #[error("expected a flat object of string values")]
    NotStringMap,
}

/// Headers declared by directive lines that haven't been attached to an entry yet.
///
/// Keeps first-insertion order so rewritten urls come out in the order the playlist declared
/// them, an upsert only replaces the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingHeaders {
    entries: Vec<(String, String)>,
}

impl PendingHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl FromIterator<(String, String)> for PendingHeaders {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Parses the payload of an `#EXTHTTP:` directive, a json object of header name to value.
pub fn parse_http_headers(payload: &str) -> Result<PendingHeaders, DirectiveError> {
    let value: serde_json::Value = serde_json::from_str(payload.trim())
        .map_err(|e| DirectiveError::InvalidJson(e.to_string()))?;

    let serde_json::Value::Object(map) = value else {
        return Err(DirectiveError::NotStringMap);
    };

    map.into_iter()
        .map(|(name, value)| match value {
            serde_json::Value::String(value) => Ok((name, value)),
            _ => Err(DirectiveError::NotStringMap),
        })
        .collect()
}

/// Tracks the header directives of one playlist. Each playlist gets its own tracker, the
/// pending set never crosses sources.
#[derive(Debug, Default)]
pub struct HeaderTracker {
    pending: PendingHeaders,
}

impl HeaderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one trimmed line to the tracker. Returns true when the line was a header
    /// directive, those are always emitted unchanged by the caller.
    ///
    /// A directive that fails to parse wipes the pending set so a half-read declaration can't
    /// leak a stale header onto the next entry.
    pub fn observe(&mut self, logical_line: &str) -> bool {
        if let Some(payload) = logical_line.strip_prefix(VLC_OPTION_PREFIX) {
            if let Err(e) = self.apply_vlc_option(payload) {
                warn!("dropping pending headers, bad #EXTVLCOPT '{}': {}", logical_line, e);
                self.pending.clear();
            }
            return true;
        }

        if let Some(payload) = logical_line.strip_prefix(HTTP_HEADERS_PREFIX) {
            match parse_http_headers(payload) {
                // json replaces whatever was pending, it doesn't merge
                Ok(headers) => self.pending = headers,
                Err(e) => {
                    warn!("dropping pending headers, bad #EXTHTTP '{}': {}", logical_line, e);
                    self.pending.clear();
                }
            }
            return true;
        }

        false
    }

    pub fn pending(&self) -> &PendingHeaders {
        &self.pending
    }

    /// Hands the pending set to the next playable entry and starts over empty.
    pub fn take(&mut self) -> PendingHeaders {
        std::mem::take(&mut self.pending)
    }

    fn apply_vlc_option(&mut self, payload: &str) -> Result<(), DirectiveError> {
        let Some((key, value)) = payload.split_once('=') else {
            // bare flags like `no-video` are fine, a header option without a value isn't
            let option = payload.trim();
            if option.starts_with(HTTP_OPTION_PREFIX) {
                return Err(DirectiveError::MissingValue(option.to_string()));
            }
            return Ok(());
        };

        let key = key.trim();
        let value = value.trim();

        if key.is_empty() {
            return Err(DirectiveError::EmptyKey);
        }

        // http-header=Name: Value, only the first colon splits
        if key == HTTP_HEADER_OPTION {
            if let Some((name, header_value)) = value.split_once(':') {
                self.pending.insert(name.trim(), header_value.trim());
                return Ok(());
            }
        }

        // http-user-agent=..., http-referrer=... and a colonless http-header all land here
        if let Some(name) = key.strip_prefix(HTTP_OPTION_PREFIX) {
            self.pending.insert(name, value);
        }

        Ok(())
    }
}
