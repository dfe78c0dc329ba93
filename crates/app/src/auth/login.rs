//! Passwordless login with one-time codes sent by mail.

use std::{collections::BTreeMap, fmt, sync::Arc};

use async_trait::async_trait;
use jiff::SignedDuration;
use mockall::automock;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::{
    auth::{IssuedSession, LoginError, RoleName, SessionIssuer},
    cache::{Clock, SystemClock, TtlCache},
    mail::{MailMessage, Mailer},
    secrets::generate_magic_code,
    users::{UsersService, records::UserUuid},
};

/// Failed redemptions after which a live code is discarded.
pub const MAX_FAILED_ATTEMPTS: u8 = 5;

/// Key under which the code is passed to the mail template.
const CODE_TEMPLATE_KEY: &str = "password";

/// A code waiting to be redeemed.
#[derive(Clone)]
pub struct PendingMagicCode {
    code_hash: [u8; 32],
    user: UserUuid,
    role: RoleName,
    failed_attempts: u8,
}

impl fmt::Debug for PendingMagicCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingMagicCode")
            .field("user", &self.user)
            .field("role", &self.role)
            .field("failed_attempts", &self.failed_attempts)
            .finish_non_exhaustive()
    }
}

#[automock]
#[async_trait]
/// Magic-code login operations.
pub trait LoginService: Send + Sync {
    /// Mail a fresh one-time code to a known user, replacing any live one.
    async fn request_code(&self, email: &str, template: &str) -> Result<(), LoginError>;

    /// Exchange a live code for a session token. Each code works once.
    async fn redeem_code(&self, email: &str, code: &str) -> Result<IssuedSession, LoginError>;
}

pub struct MagicCodeLogin {
    users: Arc<dyn UsersService>,
    mailer: Arc<dyn Mailer>,
    sessions: Arc<SessionIssuer>,
    codes: TtlCache<String, PendingMagicCode>,
}

impl MagicCodeLogin {
    #[must_use]
    pub fn new(
        users: Arc<dyn UsersService>,
        mailer: Arc<dyn Mailer>,
        sessions: Arc<SessionIssuer>,
        code_ttl: SignedDuration,
    ) -> Self {
        Self::with_clock(users, mailer, sessions, code_ttl, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(
        users: Arc<dyn UsersService>,
        mailer: Arc<dyn Mailer>,
        sessions: Arc<SessionIssuer>,
        code_ttl: SignedDuration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            mailer,
            sessions,
            codes: TtlCache::with_clock(code_ttl, clock),
        }
    }
}

#[async_trait]
impl LoginService for MagicCodeLogin {
    async fn request_code(&self, email: &str, template: &str) -> Result<(), LoginError> {
        if !self.mailer.is_operational() {
            return Err(LoginError::MailNotConfigured);
        }

        let key = normalize_email(email);

        let user = self
            .users
            .find_by_email(&key)
            .await?
            .ok_or(LoginError::UserNotFound)?;

        let code = generate_magic_code();
        let code_hash = digest_code(&code);

        self.codes.set(
            key.clone(),
            PendingMagicCode {
                code_hash,
                user: user.uuid,
                role: user.role,
                failed_attempts: 0,
            },
        );

        let message = MailMessage {
            to: email.trim().to_string(),
            subject: format!("Your Magic Code from {}", self.mailer.from_name()),
            template: template.to_string(),
            data: BTreeMap::from([(CODE_TEMPLATE_KEY.to_string(), code)]),
        };

        if let Err(error) = self.mailer.send(message).await {
            self.codes
                .take_if(&key, |pending| pending.code_hash == code_hash);

            return Err(error.into());
        }

        info!(user = %user.uuid, "magic code sent");

        Ok(())
    }

    async fn redeem_code(&self, email: &str, code: &str) -> Result<IssuedSession, LoginError> {
        let key = normalize_email(email);
        let code_hash = digest_code(code.trim());

        let Some(pending) = self
            .codes
            .take_if(&key, |pending| pending.code_hash == code_hash)
        else {
            let exhausted = self.codes.update(&key, |pending| {
                pending.failed_attempts = pending.failed_attempts.saturating_add(1);
                pending.failed_attempts >= MAX_FAILED_ATTEMPTS
            });

            if exhausted == Some(true)
                && self
                    .codes
                    .take_if(&key, |pending| pending.failed_attempts >= MAX_FAILED_ATTEMPTS)
                    .is_some()
            {
                warn!("magic code discarded after {MAX_FAILED_ATTEMPTS} failed attempts");
            }

            return Err(LoginError::CodeInvalidOrExpired);
        };

        let session = self.sessions.issue(pending.user, pending.role)?;

        info!(user = %pending.user, "magic code redeemed");

        Ok(session)
    }
}

impl fmt::Debug for MagicCodeLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MagicCodeLogin")
            .field("sessions", &self.sessions)
            .field("codes", &self.codes)
            .finish_non_exhaustive()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn digest_code(code: &str) -> [u8; 32] {
    Sha256::digest(code.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use parking_lot::Mutex;
    use testresult::TestResult;

    use crate::{
        cache::ManualClock,
        mail::{MailError, MockMailer},
        users::{MockUsersService, records::UserRecord},
    };

    use super::*;

    const EMAIL: &str = "ada@example.com";

    struct Harness {
        login: MagicCodeLogin,
        clock: Arc<ManualClock>,
        sent: Arc<Mutex<Vec<MailMessage>>>,
        user: UserUuid,
    }

    impl Harness {
        fn last_code(&self) -> String {
            self.sent
                .lock()
                .last()
                .and_then(|message| message.data.get(CODE_TEMPLATE_KEY).cloned())
                .unwrap_or_default()
        }
    }

    fn user_record(uuid: UserUuid) -> Result<UserRecord, crate::auth::RoleNameError> {
        Ok(UserRecord {
            uuid,
            email: EMAIL.to_string(),
            role: RoleName::parse("member")?,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
            deleted_at: None,
        })
    }

    fn users_with(record: UserRecord) -> MockUsersService {
        let mut users = MockUsersService::new();

        users.expect_find_by_email().returning(move |email| {
            Ok((email == record.email).then(|| record.clone()))
        });

        users
    }

    fn recording_mailer(sent: Arc<Mutex<Vec<MailMessage>>>) -> MockMailer {
        let mut mailer = MockMailer::new();

        mailer.expect_is_operational().return_const(true);
        mailer
            .expect_from_name()
            .return_const("Gatehouse".to_string());
        mailer.expect_send().returning(move |message| {
            sent.lock().push(message);
            Ok(())
        });

        mailer
    }

    fn harness() -> TestResult<Harness> {
        let user = UserUuid::new();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let clock = ManualClock::new(Timestamp::now());
        let sessions = SessionIssuer::new("test-secret", SignedDuration::from_hours(1))?;

        let login = MagicCodeLogin::with_clock(
            Arc::new(users_with(user_record(user)?)),
            Arc::new(recording_mailer(Arc::clone(&sent))),
            Arc::new(sessions),
            SignedDuration::from_secs(300),
            clock.clone(),
        );

        Ok(Harness {
            login,
            clock,
            sent,
            user,
        })
    }

    #[tokio::test]
    async fn request_code_mails_a_six_digit_code() -> TestResult {
        let harness = harness()?;

        harness.login.request_code(EMAIL, "magic-code").await?;

        let sent = harness.sent.lock().clone();
        let message = sent.first().ok_or("no message sent")?;

        assert_eq!(message.to, EMAIL);
        assert_eq!(message.subject, "Your Magic Code from Gatehouse");
        assert_eq!(message.template, "magic-code");

        let code = harness.last_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        Ok(())
    }

    #[tokio::test]
    async fn redeemed_code_issues_session_for_user() -> TestResult {
        let harness = harness()?;

        harness.login.request_code(EMAIL, "magic-code").await?;

        let session = harness
            .login
            .redeem_code("ADA@example.com ", &harness.last_code())
            .await?;

        assert_eq!(session.claims.sub, harness.user);
        assert_eq!(session.claims.role.as_str(), "member");

        Ok(())
    }

    #[tokio::test]
    async fn code_can_only_be_redeemed_once() -> TestResult {
        let harness = harness()?;

        harness.login.request_code(EMAIL, "magic-code").await?;
        let code = harness.last_code();

        harness.login.redeem_code(EMAIL, &code).await?;

        let second = harness.login.redeem_code(EMAIL, &code).await;

        assert!(matches!(second, Err(LoginError::CodeInvalidOrExpired)));

        Ok(())
    }

    #[tokio::test]
    async fn only_latest_code_redeems() -> TestResult {
        let harness = harness()?;

        harness.login.request_code(EMAIL, "magic-code").await?;
        let first = harness.last_code();

        harness.login.request_code(EMAIL, "magic-code").await?;
        let second = harness.last_code();

        if first != second {
            assert!(matches!(
                harness.login.redeem_code(EMAIL, &first).await,
                Err(LoginError::CodeInvalidOrExpired)
            ));
        }

        harness.login.redeem_code(EMAIL, &second).await?;

        Ok(())
    }

    #[tokio::test]
    async fn code_expires_after_ttl() -> TestResult {
        let harness = harness()?;

        harness.login.request_code(EMAIL, "magic-code").await?;
        harness.clock.advance(SignedDuration::from_secs(301));

        assert!(matches!(
            harness.login.redeem_code(EMAIL, &harness.last_code()).await,
            Err(LoginError::CodeInvalidOrExpired)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn code_redeems_inside_window() -> TestResult {
        let harness = harness()?;

        harness.login.request_code(EMAIL, "magic-code").await?;
        harness.clock.advance(SignedDuration::from_secs(299));

        harness
            .login
            .redeem_code(EMAIL, &harness.last_code())
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn repeated_wrong_guesses_discard_the_code() -> TestResult {
        let harness = harness()?;

        harness.login.request_code(EMAIL, "magic-code").await?;
        let code = harness.last_code();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for _ in 0..MAX_FAILED_ATTEMPTS {
            assert!(matches!(
                harness.login.redeem_code(EMAIL, wrong).await,
                Err(LoginError::CodeInvalidOrExpired)
            ));
        }

        assert!(matches!(
            harness.login.redeem_code(EMAIL, &code).await,
            Err(LoginError::CodeInvalidOrExpired)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_is_rejected_without_mail() -> TestResult {
        let harness = harness()?;

        let result = harness
            .login
            .request_code("nobody@example.com", "magic-code")
            .await;

        assert!(matches!(result, Err(LoginError::UserNotFound)));
        assert!(harness.sent.lock().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn unconfigured_mail_is_reported() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer.expect_is_operational().return_const(false);

        let login = MagicCodeLogin::new(
            Arc::new(MockUsersService::new()),
            Arc::new(mailer),
            Arc::new(SessionIssuer::new(
                "test-secret",
                SignedDuration::from_hours(1),
            )?),
            SignedDuration::from_secs(300),
        );

        let result = login.request_code(EMAIL, "magic-code").await;

        assert!(matches!(result, Err(LoginError::MailNotConfigured)));

        Ok(())
    }

    #[tokio::test]
    async fn delivery_failure_is_reported_and_code_dropped() -> TestResult {
        let user = UserUuid::new();
        let mut mailer = MockMailer::new();

        mailer.expect_is_operational().return_const(true);
        mailer
            .expect_from_name()
            .return_const("Gatehouse".to_string());
        mailer
            .expect_send()
            .returning(|_message| Err(MailError::UnexpectedResponse("rejected".to_string())));

        let login = MagicCodeLogin::new(
            Arc::new(users_with(user_record(user)?)),
            Arc::new(mailer),
            Arc::new(SessionIssuer::new(
                "test-secret",
                SignedDuration::from_hours(1),
            )?),
            SignedDuration::from_secs(300),
        );

        let result = login.request_code(EMAIL, "magic-code").await;

        assert!(matches!(result, Err(LoginError::MailDelivery(_))));
        assert!(login.codes.is_empty());

        Ok(())
    }
}
