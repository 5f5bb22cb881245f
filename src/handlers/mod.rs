// handlers/mod.rs - HTTP handlers grouped by security tier
//
// Public (no auth): /v1/auth/*
// Protected (JWT auth): /v1/users/*, /v1/roles
pub mod auth;
pub mod roles;
pub mod users;
