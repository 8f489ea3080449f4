//! Verification PIN delivery
//!
//! Only a log-backed mailer ships here; a real provider plugs in by
//! implementing [`VerificationMailer`](vf_core::services::verification::VerificationMailer).

pub mod log_mailer;


pub use log_mailer::{render_pin_message, LogMailer};
