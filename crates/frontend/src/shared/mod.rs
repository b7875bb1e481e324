pub mod components;
pub mod crud;
pub mod date_utils;
pub mod icons;
pub mod modal_frame;
pub mod modal_stack;
