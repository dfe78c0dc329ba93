//! Gatehouse authorization core: sessions, magic-code login and database
//! credential rotation.

pub mod auth;
pub mod bootstrap;
pub mod cache;
pub mod context;
pub mod credentials;
pub mod database;
pub mod mail;
pub mod secrets;
pub mod settings;
pub mod users;

#[cfg(test)]
mod test;

mod uuids;
