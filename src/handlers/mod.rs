mod admin;
mod auth;
mod chart;

pub use admin::{serve_admin_panel, handle_admin_action};
pub use auth::{serve_login_page, handle_login, serve_register_page, handle_register, handle_logout};
pub use chart::{serve_index, generate_chart};
