//! Sample conditioning: analysis windows and DC offset rejection

pub mod windows;
pub mod dc_reject;

pub use windows::{WindowType, generate_window};
pub use dc_reject::DcRejectionFilter;
