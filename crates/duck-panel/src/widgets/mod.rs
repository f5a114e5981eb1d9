pub mod keys_bar;
pub mod pane_chrome;
pub mod prompt_input;
pub mod toast;
