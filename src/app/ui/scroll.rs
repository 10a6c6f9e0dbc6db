use ratatui::widgets::ScrollbarState;

const PAGE_STEP: usize = 10;

/// Scroll offset into the rendered bubble lines, kept in sync with the
/// scrollbar widget state.
#[derive(Debug, Default)]
pub struct Scroll {
    list_len: usize,
    viewport_len: usize,
    pub position: usize,
    pub scrollbar_state: ScrollbarState,
}

impl Scroll {
    pub fn up(&mut self) {
        self.position = self.position.saturating_sub(1);
        self.scrollbar_state.prev();
    }

    pub fn down(&mut self) {
        if self.position < self.max_position() {
            self.position += 1;
        }
        self.scrollbar_state.next();
    }

    pub fn page_up(&mut self) {
        for _ in 0..PAGE_STEP {
            self.up();
        }
    }

    pub fn page_down(&mut self) {
        for _ in 0..PAGE_STEP {
            self.down();
        }
    }

    fn max_position(&self) -> usize {
        self.list_len.saturating_sub(self.viewport_len)
    }

    pub fn is_position_at_last(&self) -> bool {
        self.position == self.max_position()
    }

    pub fn last(&mut self) {
        self.position = self.max_position();
        self.scrollbar_state.last();
    }

    pub fn set_state(&mut self, list_len: usize, viewport_len: usize) {
        self.list_len = list_len;
        self.viewport_len = viewport_len;
        self.scrollbar_state = self
            .scrollbar_state
            .content_length(self.max_position().max(1));
    }
}
