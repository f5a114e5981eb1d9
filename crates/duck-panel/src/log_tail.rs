//! Log tail — the device journal, polled only while its panel is open.
//!
//! Content is replaced wholesale on every fetch.  The viewport sticks to the
//! bottom only if it was already there; a reader scrolled up stays put.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Error,
    Warning,
    Info,
    Plain,
}

pub fn classify(line: &str) -> LineKind {
    if line.contains("ERROR") || line.contains("error") || line.contains("failed") {
        LineKind::Error
    } else if line.contains("WARNING") || line.contains("warning") {
        LineKind::Warning
    } else if line.contains("INFO") || line.contains("Started") || line.contains("Active:") {
        LineKind::Info
    } else {
        LineKind::Plain
    }
}

/// Scroll position in rows.  `offset` is the first visible row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub offset: usize,
    pub content_height: usize,
    pub viewport_height: usize,
}

impl Viewport {
    pub fn max_offset(&self) -> usize {
        self.content_height.saturating_sub(self.viewport_height)
    }

    /// Rows hidden below the viewport.
    pub fn distance_from_bottom(&self) -> usize {
        self.content_height
            .saturating_sub(self.offset)
            .saturating_sub(self.viewport_height)
    }

    pub fn is_at_bottom(&self, threshold: usize) -> bool {
        self.distance_from_bottom() < threshold.max(1)
    }

    /// Swap in content of `new_height` rows, following the bottom edge only
    /// if the viewport was at the bottom before the swap.
    pub fn replace_content(&mut self, new_height: usize, threshold: usize) {
        let was_at_bottom = self.is_at_bottom(threshold);
        self.content_height = new_height;
        if was_at_bottom {
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.offset = self.offset.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.offset = (self.offset + rows).min(self.max_offset());
    }

    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max_offset();
    }

    pub fn set_viewport_height(&mut self, height: usize, threshold: usize) {
        if height == self.viewport_height {
            return;
        }
        let was_at_bottom = self.is_at_bottom(threshold);
        self.viewport_height = height;
        if was_at_bottom {
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
    }
}

pub struct LogTail {
    open: bool,
    generation: u64,
    lines: Vec<(LineKind, String)>,
    last_error: Option<String>,
    pub viewport: Viewport,
    threshold: usize,
}

impl LogTail {
    pub fn new(bottom_threshold: usize) -> Self {
        Self {
            open: false,
            generation: 0,
            lines: Vec::new(),
            last_error: None,
            viewport: Viewport::default(),
            threshold: bottom_threshold,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Open the panel.  Returns the generation fetches must carry.
    pub fn open(&mut self) -> u64 {
        self.open = true;
        self.generation += 1;
        self.viewport.scroll_to_bottom();
        self.generation
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Apply a fetch result started under `generation`.  Results from a
    /// closed panel or an earlier opening are dropped.
    pub fn apply(&mut self, generation: u64, result: Result<String, String>) -> bool {
        if !self.open || generation != self.generation {
            debug!(
                "dropping log fetch from generation {} (current {}, open {})",
                generation, self.generation, self.open
            );
            return false;
        }
        match result {
            Ok(text) => {
                self.lines = text
                    .lines()
                    .map(|l| (classify(l), l.to_string()))
                    .collect();
                self.last_error = None;
                self.viewport.replace_content(self.lines.len(), self.threshold);
            }
            Err(message) => {
                self.last_error = Some(message);
            }
        }
        true
    }

    pub fn lines(&self) -> &[(LineKind, String)] {
        &self.lines
    }

    /// Rows currently inside the viewport.
    pub fn visible(&self) -> &[(LineKind, String)] {
        let start = self.viewport.offset.min(self.lines.len());
        let end = (start + self.viewport.viewport_height).min(self.lines.len());
        &self.lines[start..end]
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport.set_viewport_height(height, self.threshold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(n: usize) -> String {
        (0..n)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("chatgpt-duck[1]: ERROR boom"), LineKind::Error);
        assert_eq!(classify("tts failed after 3 tries"), LineKind::Error);
        assert_eq!(classify("WARNING low mem"), LineKind::Warning);
        assert_eq!(classify("Started chatgpt-duck.service"), LineKind::Info);
        assert_eq!(classify("hello"), LineKind::Plain);
    }

    #[test]
    fn test_at_bottom_stays_at_bottom() {
        for (old, new) in [(30, 45), (30, 30), (30, 12), (5, 40)] {
            let mut vp = Viewport {
                offset: 0,
                content_height: old,
                viewport_height: 10,
            };
            vp.scroll_to_bottom();
            vp.replace_content(new, 1);
            assert_eq!(vp.offset, vp.max_offset(), "{} -> {}", old, new);
        }
    }

    #[test]
    fn test_scrolled_up_offset_unchanged() {
        for offset in [0, 3, 19] {
            let mut vp = Viewport {
                offset,
                content_height: 30,
                viewport_height: 10,
            };
            vp.replace_content(50, 1);
            assert_eq!(vp.offset, offset);
        }
    }

    #[test]
    fn test_scrolled_up_clamped_when_content_shrinks() {
        let mut vp = Viewport {
            offset: 15,
            content_height: 30,
            viewport_height: 10,
        };
        vp.replace_content(20, 1);
        assert_eq!(vp.offset, 10);
    }

    #[test]
    fn test_apply_respects_generation() {
        let mut tail = LogTail::new(1);
        tail.set_viewport_height(10);
        let first = tail.open();
        assert!(tail.apply(first, Ok(text(30))));
        assert_eq!(tail.viewport.offset, 20);
        assert_eq!(tail.visible().len(), 10);

        tail.close();
        assert!(!tail.apply(first, Ok(text(5))));
        assert_eq!(tail.lines().len(), 30);

        let second = tail.open();
        assert!(!tail.apply(first, Ok(text(5))));
        assert!(tail.apply(second, Err("HTTP 502".into())));
        assert_eq!(tail.last_error(), Some("HTTP 502"));
        assert_eq!(tail.lines().len(), 30);
    }

    #[test]
    fn test_reader_position_survives_refresh() {
        let mut tail = LogTail::new(1);
        tail.set_viewport_height(10);
        let generation = tail.open();
        tail.apply(generation, Ok(text(50)));
        tail.viewport.scroll_up(12);
        let offset = tail.viewport.offset;
        tail.apply(generation, Ok(text(50)));
        assert_eq!(tail.viewport.offset, offset);

        tail.viewport.scroll_to_bottom();
        tail.apply(generation, Ok(text(60)));
        assert_eq!(tail.viewport.offset, 50);
    }
}
