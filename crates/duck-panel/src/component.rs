//! Component trait — the interface every panel implements.
//!
//! Components own their own presentation state and read everything else from
//! the `PanelCore`.  They never mutate panel state; they return `UiAction`s.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};

use crate::panel::PanelCore;
use crate::ui_action::UiAction;

pub trait Component {
    /// Only called when this component has focus.
    fn handle_key(&mut self, key: KeyEvent, panel: &PanelCore) -> Vec<UiAction>;

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, panel: &PanelCore);
}
