//! User Data

use crate::{auth::RoleName, users::records::UserUuid};

/// New User Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// UUID to assign to the user row.
    pub uuid: UserUuid,

    pub email: String,

    pub role: RoleName,
}
