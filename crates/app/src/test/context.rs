//! Test context for service-level integration tests.

use crate::users::PgUsersService;

use super::db::TestDb;

pub struct TestContext {
    pub db: TestDb,
    pub users: PgUsersService,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = TestDb::new().await;

        Self {
            users: PgUsersService::new(db.pool().clone()),
            db,
        }
    }
}
