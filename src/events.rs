use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, View};

/// File written by the `e` key.
pub const EXPORT_FILE: &str = "blockwatch_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.show_detail_overlay {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
                app.close_overlay();
            }
            // Allow scrolling through resources while overlay is open
            KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::PageUp => app.select_prev_n(10),
            KeyCode::PageDown => app.select_next_n(10),
            KeyCode::Home => app.select_first(),
            KeyCode::End => app.select_last(),
            _ => {}
        }
        return;
    }

    if app.filter_active {
        handle_filter_input(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),

        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),

        KeyCode::Char('1') => app.set_view(View::Resources),
        KeyCode::Char('2') => app.set_view(View::Replication),

        // Navigation (up/down for items, left/right for tabs)
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        KeyCode::Enter => app.enter_detail(),
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        KeyCode::Char('r') => {
            let _ = app.reload_data();
        }

        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('S') => app.toggle_sort_direction(),

        KeyCode::Char('/') => app.start_filter(),
        KeyCode::Char('c') => {
            if !app.filter_text.is_empty() {
                app.clear_filter();
            }
        }

        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_FILE);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while filter is active
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.filter_active = false;
        }

        // Keep text but exit input mode
        KeyCode::Esc => {
            app.cancel_filter();
        }

        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.clear_filter();
        }

        KeyCode::Backspace => {
            app.filter_pop();
            if app.filter_text.is_empty() {
                app.filter_active = false;
            }
        }

        KeyCode::Char(c) => {
            app.filter_push(c);
        }

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, content_start_row: u16) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        MouseEventKind::Down(MouseButton::Left) => {
            let clicked_row = mouse.row;

            // Content area starts after header, tabs and table header
            if clicked_row > content_start_row {
                let item_row = (clicked_row - content_start_row - 1) as usize;
                match app.current_view {
                    View::Resources => {
                        if item_row < app.resource_rows().len() {
                            app.selected_resource_index = item_row;
                        }
                    }
                    View::Replication => {
                        if item_row < app.peer_rows().len() {
                            app.selected_peer_index = item_row;
                        }
                    }
                }
            }

            // Tab bar: Resources (0-14), Replication (15-31)
            if clicked_row == 1 {
                if mouse.column < 15 {
                    app.set_view(View::Resources);
                } else if mouse.column < 32 {
                    app.set_view(View::Replication);
                }
            }
        }

        MouseEventKind::Down(MouseButton::Right) => app.go_back(),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Registry;
    use crate::source::{parse_line, ChannelSource};
    use chrono::TimeDelta;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with_data() -> App {
        let (tx, source) = ChannelSource::create("test");
        for line in [
            "exists resource name:r0 role:Primary",
            "exists resource name:r1 role:Secondary",
        ] {
            tx.send(parse_line(line).unwrap().unwrap()).unwrap();
        }
        let mut app = App::new(
            Box::new(source),
            Registry::default().shared(),
            TimeDelta::seconds(30),
        );
        app.reload_data().unwrap();
        app
    }

    #[test]
    fn quit_key() {
        let mut app = app_with_data();
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn view_switching() {
        let mut app = app_with_data();
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.current_view, View::Replication);
        handle_key_event(&mut app, key(KeyCode::Char('1')));
        assert_eq!(app.current_view, View::Resources);
    }

    #[test]
    fn filter_mode_captures_keys() {
        let mut app = app_with_data();
        handle_key_event(&mut app, key(KeyCode::Char('/')));
        assert!(app.filter_active);

        // 'q' is text while filtering, not quit
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.running);
        assert_eq!(app.filter_text, "q");

        handle_key_event(&mut app, key(KeyCode::Backspace));
        assert!(!app.filter_active);
        assert!(app.filter_text.is_empty());
    }

    #[test]
    fn overlay_swallows_navigation_keys() {
        let mut app = app_with_data();
        handle_key_event(&mut app, key(KeyCode::Enter));
        assert!(app.show_detail_overlay);

        handle_key_event(&mut app, key(KeyCode::Down));
        assert_eq!(app.selected_resource_index, 1);

        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_detail_overlay);
        assert!(app.running);
    }

    #[test]
    fn help_closes_on_any_key() {
        let mut app = app_with_data();
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key_event(&mut app, key(KeyCode::Char('x')));
        assert!(!app.show_help);
    }
}
