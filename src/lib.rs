//! Backend for selling WiFi access vouchers per router.

pub mod app_state;
pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod purchase;
pub mod routes;
pub mod settings;
pub mod validation;

#[cfg(test)]
mod testing;
