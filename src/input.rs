use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Quit,
    TogglePause,
    ToggleHelp,
    ToggleDeck,
    DeckPrev,
    DeckNext,
    ToggleMeteors,
    Rebuild,
}

/// Drains pending events without blocking the frame. Returns the mapped
/// actions plus whether a resize event was seen (the size poll in the
/// render loop is authoritative; this just skips a frame of lag).
pub(crate) fn poll_actions(max_frame_time: Duration) -> anyhow::Result<(Vec<Action>, bool)> {
    let mut actions = Vec::new();
    let mut resized = false;

    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat => {
                if let Some(a) = map_key(k.code) {
                    actions.push(a);
                }
                if actions.len() >= 32 {
                    break;
                }
            }
            Event::Resize(_, _) => resized = true,
            _ => {}
        }
    }
    Ok((actions, resized))
}

fn map_key(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::ToggleHelp),
        KeyCode::Tab => Some(Action::ToggleDeck),
        KeyCode::Left => Some(Action::DeckPrev),
        KeyCode::Right => Some(Action::DeckNext),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Action::ToggleMeteors),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Rebuild),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carousel_triggers_map_to_arrow_keys() {
        assert_eq!(map_key(KeyCode::Left), Some(Action::DeckPrev));
        assert_eq!(map_key(KeyCode::Right), Some(Action::DeckNext));
    }

    #[test]
    fn unbound_keys_are_ignored() {
        assert_eq!(map_key(KeyCode::Char('z')), None);
        assert_eq!(map_key(KeyCode::Enter), None);
    }
}
