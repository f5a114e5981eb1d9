pub mod collection_pane;
pub mod confirm;
pub mod log_panel;
pub mod status_strip;
