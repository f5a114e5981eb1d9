//! UiAction — what a key press asks the app to do.

use crate::actions::UserAction;
use crate::feeds::Collection;

#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Quit,
    FocusNext,
    FocusPrev,
    FocusPosition(usize),
    OpenFilter,
    SetFilter(Collection, String),
    CloseFilter,
    ToggleGroup(Collection),
    ToggleLogs,
    ScrollLog(isize),
    LogToBottom,
    OpenCommand,
    RunCommand(String),
    CloseCommand,
    /// Goes through the confirmation prompt when the action needs one.
    Request(UserAction),
    Confirm,
    Cancel,
    SpeakAnswer,
}
