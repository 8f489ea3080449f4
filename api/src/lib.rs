//! HTTP surface for Verifly: email verification and session endpoints

pub mod app;
pub mod bootstrap;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
