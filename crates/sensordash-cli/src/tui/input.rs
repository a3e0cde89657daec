//! Keyboard input handling for the TUI.
//!
//! # Key Bindings
//!
//! | Key             | Action                      |
//! |-----------------|-----------------------------|
//! | `q`             | Quit                        |
//! | `r`             | Refresh data                |
//! | `s`             | Toggle sleep mode           |
//! | `v`             | Voice command               |
//! | `:`             | Type a voice command        |
//! | `←` / `h`       | Select previous column      |
//! | `→` / `l`       | Select next column          |
//! | `Enter` / `o`   | Sort by selected column     |
//! | `1`-`8`         | Sort by column N            |
//! | `m` / `M`       | Next / previous month       |
//! | `n` / `PgDn`    | Next page                   |
//! | `p` / `PgUp`    | Previous page               |
//! | `Home` / `End`  | First / last page           |
//! | `z`             | Cycle page size             |
//! | `e`             | Export CSV                  |
//! | `?`             | Toggle help                 |

use crossterm::event::KeyCode;

use sensordash_core::Command;

use super::app::App;

/// User actions that can be triggered by keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Refresh,
    ToggleSleep,
    Listen,
    OpenPrompt,
    SelectNextColumn,
    SelectPreviousColumn,
    SortSelected,
    SortColumn(usize),
    NextMonth,
    PreviousMonth,
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    CyclePageSize,
    Export,
    ToggleHelp,
    /// Close the help overlay.
    Dismiss,
    TextInput(char),
    TextBackspace,
    TextSubmit,
    TextCancel,
    None,
}

/// Map a key code to an action.
pub fn handle_key(key: KeyCode, editing_text: bool) -> Action {
    if editing_text {
        return match key {
            KeyCode::Enter => Action::TextSubmit,
            KeyCode::Esc => Action::TextCancel,
            KeyCode::Backspace => Action::TextBackspace,
            KeyCode::Char(c) => Action::TextInput(c),
            _ => Action::None,
        };
    }

    match key {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char('s') => Action::ToggleSleep,
        KeyCode::Char('v') => Action::Listen,
        KeyCode::Char(':') => Action::OpenPrompt,
        KeyCode::Right | KeyCode::Char('l') => Action::SelectNextColumn,
        KeyCode::Left | KeyCode::Char('h') => Action::SelectPreviousColumn,
        KeyCode::Enter | KeyCode::Char('o') => Action::SortSelected,
        KeyCode::Char(c @ '1'..='8') => Action::SortColumn(c as usize - '1' as usize),
        KeyCode::Char('m') => Action::NextMonth,
        KeyCode::Char('M') => Action::PreviousMonth,
        KeyCode::Char('n') | KeyCode::PageDown => Action::NextPage,
        KeyCode::Char('p') | KeyCode::PageUp => Action::PreviousPage,
        KeyCode::Home | KeyCode::Char('g') => Action::FirstPage,
        KeyCode::End | KeyCode::Char('G') => Action::LastPage,
        KeyCode::Char('z') => Action::CyclePageSize,
        KeyCode::Char('e') => Action::Export,
        KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Esc => Action::Dismiss,
        _ => Action::None,
    }
}

/// Apply an action to the application state.
///
/// Returns the command to send to the worker, if the action needs one.
pub fn apply_action(app: &mut App, action: Action) -> Option<Command> {
    match action {
        Action::Quit => {
            app.quit();
            None
        }
        Action::Refresh => Some(Command::Refresh),
        Action::ToggleSleep => Some(Command::ToggleSleepMode),
        Action::Listen => Some(Command::StartVoice),
        Action::OpenPrompt => {
            app.prompt = Some(String::new());
            None
        }
        Action::SelectNextColumn => {
            app.select_next_column();
            None
        }
        Action::SelectPreviousColumn => {
            app.select_previous_column();
            None
        }
        Action::SortSelected => {
            app.sort_selected();
            None
        }
        Action::SortColumn(index) => {
            app.sort_by_index(index);
            None
        }
        Action::NextMonth => {
            app.next_month();
            None
        }
        Action::PreviousMonth => {
            app.previous_month();
            None
        }
        Action::NextPage => {
            app.next_page();
            None
        }
        Action::PreviousPage => {
            app.table.prev_page();
            None
        }
        Action::FirstPage => {
            app.table.first_page();
            None
        }
        Action::LastPage => {
            app.last_page();
            None
        }
        Action::CyclePageSize => {
            app.table.cycle_page_size();
            None
        }
        Action::Export => {
            app.export_csv();
            None
        }
        Action::ToggleHelp => {
            app.show_help = !app.show_help;
            None
        }
        Action::Dismiss => {
            app.show_help = false;
            None
        }
        Action::TextInput(c) => {
            if let Some(text) = app.prompt.as_mut() {
                text.push(c);
            }
            None
        }
        Action::TextBackspace => {
            if let Some(text) = app.prompt.as_mut() {
                text.pop();
            }
            None
        }
        Action::TextSubmit => app
            .prompt
            .take()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .map(Command::VoiceTranscript),
        Action::TextCancel => {
            app.prompt = None;
            None
        }
        Action::None => None,
    }
}
