//! User Records

use jiff::Timestamp;

use crate::{auth::RoleName, uuids::TypedUuid};

/// User UUID
pub type UserUuid = TypedUuid<UserRecord>;

/// User Record
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Unique user identifier.
    pub uuid: UserUuid,

    /// Login address, compared case-insensitively.
    pub email: String,

    /// Database role the user's sessions act as.
    pub role: RoleName,

    pub created_at: Timestamp,

    pub updated_at: Timestamp,

    /// Soft-delete timestamp when deleted.
    pub deleted_at: Option<Timestamp>,
}
