use super::{
    header_utils::HeaderTracker,
    rewrite_utils::{RewriteContext, rewrite_entry},
};

pub const EXTM3U_MARKER: &str = "#EXTM3U";

pub fn is_marker_line(line: &str) -> bool {
    line.trim().starts_with(EXTM3U_MARKER)
}

/// A trimmed line is playable when it isn't a comment and has an absolute http(s) url in it.
pub fn is_playable_entry(logical_line: &str) -> bool {
    !logical_line.is_empty()
        && !logical_line.starts_with('#')
        && (logical_line.contains("http://") || logical_line.contains("https://"))
}

/// Splits a playlist body into lines that keep their own terminator. A last line without one
/// gets `\n` so playlists can be glued together.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n')
        .map(|line| {
            if line.ends_with('\n') {
                line.to_string()
            } else {
                format!("{}\n", line)
            }
        })
        .collect()
}

/// Rewrites a single playlist line by line, one output line per input line.
pub struct LineRewriter<'a> {
    context: &'a RewriteContext,
    tracker: HeaderTracker,
}

impl<'a> LineRewriter<'a> {
    pub fn new(context: &'a RewriteContext) -> Self {
        Self {
            context,
            tracker: HeaderTracker::new(),
        }
    }

    pub fn rewrite_line(&mut self, line: &str) -> String {
        let logical_line = line.trim();

        if self.tracker.observe(logical_line) {
            return line.to_string();
        }

        if is_playable_entry(logical_line) {
            // headers are one shot, they belong to this entry only
            let headers = self.tracker.take();
            return rewrite_entry(logical_line, &headers, self.context);
        }

        line.to_string()
    }
}

/// One output line per input line. Pass-through lines are byte-identical to what `split_lines`
/// produced, which only differs from the raw body by the `\n` added to an unterminated last line.
pub fn rewrite_playlist(lines: &[String], context: &RewriteContext) -> Vec<String> {
    let mut rewriter = LineRewriter::new(context);
    lines.iter().map(|line| rewriter.rewrite_line(line)).collect()
}
