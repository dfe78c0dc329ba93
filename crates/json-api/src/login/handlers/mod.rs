//! Login Handlers

pub(crate) mod redeem;
pub(crate) mod request;
