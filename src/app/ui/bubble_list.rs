use std::{collections::BTreeMap, sync::Arc};

use crate::models::Turn;
use ratatui::{buffer::Buffer, layout::Rect, text::Line};
use syntect::highlighting::Theme;

use super::bubble::Bubble;

struct CacheEntry<'a> {
    turn_id: String,
    lines: Vec<Arc<Line<'a>>>,
}

/// Renders the turn list as stacked bubbles. Turns never change after they
/// are appended, so an entry is rebuilt only when a different turn occupies
/// its slot or the terminal width changed.
pub struct BubbleList<'a> {
    theme: &'a Theme,
    cache: BTreeMap<usize, CacheEntry<'a>>,
    lines: Vec<Arc<Line<'a>>>,
    line_width: usize,
    line_len: usize,
}

impl<'a> BubbleList<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            cache: BTreeMap::new(),
            lines: Vec::new(),
            line_len: 0,
            line_width: 0,
        }
    }

    pub fn set_turns(&mut self, turns: &[Turn], line_width: usize) {
        if self.line_width != line_width {
            self.cache.clear();
            self.line_width = line_width;
        }
        self.cache.retain(|i, _| *i < turns.len());

        self.line_len = turns
            .iter()
            .enumerate()
            .map(|(i, turn)| {
                if let Some(entry) = self.cache.get(&i) {
                    if entry.turn_id == turn.id() {
                        return entry.lines.len();
                    }
                }

                let bubble_lines = Bubble::new(turn, line_width).as_lines(self.theme);
                let bubble_lines_len = bubble_lines.len();

                self.cache.insert(
                    i,
                    CacheEntry {
                        turn_id: turn.id().to_string(),
                        lines: bubble_lines.into_iter().map(Arc::new).collect(),
                    },
                );

                bubble_lines_len
            })
            .sum();
        self.update_lines();
    }

    pub fn len(&self) -> usize {
        self.line_len
    }

    pub fn is_empty(&self) -> bool {
        self.line_len == 0
    }

    pub fn get_visible_lines(&self, height: usize, scroll_index: usize) -> Vec<Arc<Line<'a>>> {
        self.lines
            .iter()
            .skip(scroll_index)
            .take(height)
            .cloned()
            .collect()
    }

    pub fn render(&self, rect: Rect, buf: &mut Buffer, scroll_index: usize) {
        for (i, line) in self
            .get_visible_lines(rect.height as usize, scroll_index)
            .iter()
            .enumerate()
        {
            buf.set_line(0, i as u16, line.as_ref(), rect.width);
        }
    }

    fn update_lines(&mut self) {
        self.lines = self
            .cache
            .values()
            .flat_map(|entry| entry.lines.clone())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_turns_before_first_layout() {
        let theme = Theme::default();
        let mut list = BubbleList::new(&theme);

        // A terminal below the minimum width never reports a rect, so the
        // width can still be zero when a send lands
        list.set_turns(&[Turn::user("hello")], 0);
        assert!(list.len() > 0);

        list.set_turns(&[Turn::user("hello")], 80);
        assert!(list.len() > 0);
    }
}
