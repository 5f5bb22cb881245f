// handlers/auth/mod.rs - Token acquisition endpoints (no authentication required)

pub mod login; // POST /v1/auth/login - authenticate and get JWT

pub use login::login_post;
