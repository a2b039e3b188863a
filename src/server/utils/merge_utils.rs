use std::fmt::Display;

use tracing::debug;

use super::m3u_utils::{EXTM3U_MARKER, is_marker_line};

/// Stitches rewritten playlists together so the combined output starts with exactly one
/// `#EXTM3U`.
///
/// Sources have to be pushed in request order. A marker that opens a later segment is dropped,
/// markers anywhere else in a segment are left alone. When the output had to be opened with a
/// synthetic marker, the first real one that shows up afterwards is dropped too, wherever it is.
#[derive(Debug, Default)]
pub struct PlaylistMerger {
    marker_emitted: bool,
    synthetic_pending: bool,
}

impl PlaylistMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker_emitted(&self) -> bool {
        self.marker_emitted
    }

    pub fn push_segment(&mut self, lines: &[String]) -> String {
        let mut chunk = String::with_capacity(lines.iter().map(String::len).sum::<usize>());

        for (index, line) in lines.iter().enumerate() {
            let is_marker = is_marker_line(line);

            if !self.marker_emitted {
                if !is_marker {
                    self.open_with_synthetic_marker(&mut chunk);
                }
                self.marker_emitted = true;
                chunk.push_str(line);
            } else if is_marker && self.synthetic_pending {
                debug!("skipping {} after synthetic header", EXTM3U_MARKER);
                self.synthetic_pending = false;
            } else if is_marker && index == 0 {
                debug!("skipping duplicate {} at segment start", EXTM3U_MARKER);
            } else {
                chunk.push_str(line);
            }
        }

        chunk
    }

    /// Comment line standing in for a source that couldn't be fetched, players skip it.
    pub fn push_error(&mut self, url: &str, error: &impl Display) -> String {
        let mut chunk = String::new();
        if !self.marker_emitted {
            self.open_with_synthetic_marker(&mut chunk);
        }

        let message = error.to_string().replace(['\r', '\n'], " ");
        chunk.push_str(&format!("# ERROR processing playlist {}: {}\n", url, message));
        chunk
    }

    /// Closes the output, only yields something when nothing at all was emitted.
    pub fn finish(&mut self) -> Option<String> {
        if self.marker_emitted {
            return None;
        }
        self.marker_emitted = true;
        Some(self.synthetic_marker())
    }

    // the real header is still to come, it has to be swallowed when it shows up
    fn open_with_synthetic_marker(&mut self, chunk: &mut String) {
        chunk.push_str(&self.synthetic_marker());
        self.marker_emitted = true;
        self.synthetic_pending = true;
    }

    fn synthetic_marker(&self) -> String {
        format!("{}\n", EXTM3U_MARKER)
    }
}
