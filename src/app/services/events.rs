use crate::{config::constants::FRAME_DURATION, models::Event};
use crossterm::event::{Event as CrosstermEvent, EventStream, MouseEventKind};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time;
use tui_textarea::{Input, Key};

/// Merges terminal input, internal events and a frame tick into a single
/// stream consumed by the app loop.
pub struct EventService {
    crossterm_events: EventStream,
    event_rx: mpsc::UnboundedReceiver<Event>,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl EventService {
    pub fn event_tx(&self) -> mpsc::UnboundedSender<Event> {
        self.event_tx.clone()
    }

    pub async fn next(&mut self) -> Event {
        loop {
            let e = tokio::select! {
                event = self.event_rx.recv() => event,
                event = self.crossterm_events.next().fuse() => match event {
                    Some(Ok(input)) => map_crossterm(input),
                    Some(Err(_)) => None,
                    None => None
                },
                _ = time::sleep(FRAME_DURATION) => Some(Event::UiTick)
            };

            if let Some(event) = e {
                return event;
            }
        }
    }
}

impl Default for EventService {
    fn default() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
        Self {
            crossterm_events: EventStream::new(),
            event_rx,
            event_tx,
        }
    }
}

fn map_crossterm(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Paste(text) => Some(Event::KeyboardPaste(text)),
        CrosstermEvent::Mouse(mouse_event) => match mouse_event.kind {
            MouseEventKind::ScrollUp => Some(Event::UiScrollUp),
            MouseEventKind::ScrollDown => Some(Event::UiScrollDown),
            _ => None,
        },
        CrosstermEvent::Key(key_event) => map_key(key_event.into()),
        _ => None,
    }
}

fn map_key(input: Input) -> Option<Event> {
    if input.key == Key::Enter && (input.shift || input.alt) {
        return Some(Event::KeyboardAltEnter);
    }

    if input.ctrl {
        return match input.key {
            Key::Char('u') => Some(Event::UiScrollPageUp),
            Key::Char('d') => Some(Event::UiScrollPageDown),
            Key::Char('q') => Some(Event::Quit),
            Key::Char('c') => Some(Event::KeyboardCtrlC),
            Key::Char('n') => Some(Event::KeyboardCtrlN),
            Key::Char('h') => Some(Event::KeyboardCtrlH),
            Key::Char('l') => Some(Event::KeyboardCtrlL),
            Key::Char('y') => Some(Event::KeyboardCtrlY),
            _ => None,
        };
    }

    match input.key {
        Key::Esc => Some(Event::KeyboardEsc),
        Key::F(1) => Some(Event::KeyboardF1),
        Key::F(2) => Some(Event::KeyboardF2),
        Key::F(3) => Some(Event::KeyboardF3),
        Key::Enter => Some(Event::KeyboardEnter),
        Key::Up => Some(Event::UiScrollUp),
        Key::Down => Some(Event::UiScrollDown),
        Key::MouseScrollUp => Some(Event::UiScrollPageUp),
        Key::MouseScrollDown => Some(Event::UiScrollPageDown),
        Key::PageUp => Some(Event::UiScrollPageUp),
        Key::PageDown => Some(Event::UiScrollPageDown),
        _ => Some(Event::KeyboardCharInput(input)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(key: Key, ctrl: bool, alt: bool) -> Input {
        Input {
            key,
            ctrl,
            alt,
            shift: false,
        }
    }

    #[test]
    fn alt_enter_is_newline() {
        let event = map_key(input(Key::Enter, false, true));
        assert!(matches!(event, Some(Event::KeyboardAltEnter)));
    }

    #[test]
    fn ctrl_chords_are_commands() {
        assert!(matches!(
            map_key(input(Key::Char('q'), true, false)),
            Some(Event::Quit)
        ));
        assert!(matches!(
            map_key(input(Key::Char('l'), true, false)),
            Some(Event::KeyboardCtrlL)
        ));
        assert!(map_key(input(Key::Char('x'), true, false)).is_none());
    }

    #[test]
    fn plain_chars_feed_the_editor() {
        let event = map_key(input(Key::Char('a'), false, false));
        assert!(matches!(event, Some(Event::KeyboardCharInput(_))));
    }
}
