use ratatui::layout::Rect;
use syntect::highlighting::Theme;

use crate::session::ChatSession;
use crate::{app::ui::BubbleList, app::ui::Scroll};

pub(crate) struct AppState<'a> {
    theme: &'a Theme,
    pub bubble_list: BubbleList<'a>,
    pub last_known_height: usize,
    pub last_known_width: usize,
    pub scroll: Scroll,

    pub session: ChatSession,
}

impl<'a> AppState<'a> {
    pub fn new(theme: &'a Theme, session: ChatSession) -> AppState<'a> {
        AppState {
            theme,
            bubble_list: BubbleList::new(theme),
            last_known_height: 0,
            last_known_width: 0,
            scroll: Scroll::default(),
            session,
        }
    }

    pub fn waiting_for_backend(&self) -> bool {
        self.session.in_flight()
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_height = rect.height.into();
        self.last_known_width = rect.width.into();
        self.sync_state();
    }

    /// Drop the line cache and rebuild from the session. Used when the turn
    /// list was replaced wholesale (new chat, model switch, loaded
    /// conversation) rather than appended to.
    pub fn rebuild(&mut self) {
        self.bubble_list = BubbleList::new(self.theme);
        self.sync_state();
        self.scroll.last();
    }

    pub fn sync_state(&mut self) {
        self.bubble_list
            .set_turns(self.session.turns(), self.last_known_width);
        let scrollbar_at_bottom = self.scroll.is_position_at_last();
        self.scroll
            .set_state(self.bubble_list.len(), self.last_known_height);
        if self.session.in_flight() && scrollbar_at_bottom {
            self.scroll.last();
        }
    }
}
