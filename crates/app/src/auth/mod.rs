//! Authentication and authorization

mod context;
mod errors;
pub mod login;
mod roles;
pub mod sessions;

pub use context::AuthContext;
pub use errors::*;
pub use login::{LoginService, MagicCodeLogin, MockLoginService};
pub use roles::*;
pub use sessions::{IssuedSession, SessionClaims, SessionIssuer};
