//! duck-panel — polling, caching and view-sync engine for the duck control
//! panel, plus the terminal adapter that draws it.

pub mod actions;
pub mod app;
pub mod cache;
pub mod command;
pub mod component;
pub mod components;
pub mod feeds;
pub mod focus;
pub mod gateway;
pub mod log_tail;
pub mod notices;
pub mod panel;
pub mod scheduler;
pub mod theme;
pub mod ui_action;
pub mod view;
pub mod widgets;

pub use actions::{Settlement, UserAction};
pub use gateway::{Gateway, GatewayError};
pub use panel::{PanelCore, PanelMessage};
