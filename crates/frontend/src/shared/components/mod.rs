pub mod filter_panel;
pub mod pagination_controls;
pub mod ui;
