//! Sessions

mod handlers;

pub(crate) use handlers::*;
