//! Magic-code login

mod errors;
mod handlers;

pub(crate) use handlers::*;
