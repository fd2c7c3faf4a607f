//! Sign-up wizard state machine.
//!
//! Drives a shopper through credential entry, email verification, and
//! mandatory profile completion before producing an authenticated
//! session. The identity candidate gathered in the form is cached
//! durably so an interrupted flow with a verified email reopens at the
//! profile step instead of restarting.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::instrument;

use lockerbay_core::{
    BirthDate, BirthDateError, Email, EmailError, MINIMUM_AGE_YEARS, NationalId, NationalIdError,
    PasswordStrength, Phone, PhoneError,
};

use crate::cache::{DurableCache, keys};
use crate::services::identity::{IdentityError, IdentityProvider};
use crate::services::notify::{Notifier, Severity};
use crate::stores::session::{Identity, SessionStore};

/// Default cooldown between verification-link resends.
const DEFAULT_RESEND_COOLDOWN: Duration = Duration::from_secs(60);

/// Steps of the sign-up wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupStep {
    /// Credential entry.
    Form,
    /// Waiting for the shopper to verify their email.
    VerifyEmail,
    /// Mandatory profile fields.
    CompleteProfile,
    /// Finished; a session exists.
    Done,
}

/// Outcome of a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The flow closed.
    Closed,
    /// Unsaved profile edits exist; an explicit discard is required.
    ConfirmDiscard,
}

/// Raw profile field values as typed by the shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    pub phone: String,
    pub national_id: String,
    pub birth_date: String,
    pub apartment_number: String,
}

/// A validated profile, produced when the flow completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub phone: Phone,
    pub national_id: NationalId,
    pub birth_date: BirthDate,
    /// Optional: shoppers without an apartment leave it blank.
    pub apartment_number: Option<String>,
}

/// Birth-date field error: malformed, or present but underage.
#[derive(Debug, Clone, Error)]
pub enum BirthDateFieldError {
    #[error(transparent)]
    Invalid(#[from] BirthDateError),
    #[error("you must be at least {} years old", MINIMUM_AGE_YEARS)]
    Underage,
}

/// Field-level errors from a profile submission, collected together
/// rather than short-circuited on the first failure.
#[derive(Debug, Clone, Default)]
pub struct ProfileErrors {
    pub phone: Option<PhoneError>,
    pub national_id: Option<NationalIdError>,
    pub birth_date: Option<BirthDateFieldError>,
}

impl ProfileErrors {
    /// Whether every field validated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.phone.is_none() && self.national_id.is_none() && self.birth_date.is_none()
    }
}

/// Errors from sign-up operations.
#[derive(Debug, Error)]
pub enum SignupError {
    /// Email format is invalid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password scored weak; submission is blocked.
    #[error("password is too weak")]
    WeakPassword,

    /// Full name is empty.
    #[error("full name is required")]
    MissingFullName,

    /// One or more profile fields failed validation.
    #[error("profile validation failed")]
    InvalidProfile(ProfileErrors),

    /// The resend cooldown has not elapsed.
    #[error("resend available in {remaining_secs}s")]
    CooldownActive { remaining_secs: u64 },

    /// The identity provider failed or the shopper backed out.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The operation is not valid in the current step.
    #[error("operation not available in the {step:?} step")]
    InvalidStep { step: SignupStep },
}

/// Wall-clock countdown with one-second ticks.
///
/// The ticker task is aborted on re-arm, close, and drop so no timer
/// outlives the flow.
struct Cooldown {
    remaining: Arc<AtomicU64>,
    ticker: Option<JoinHandle<()>>,
}

impl Cooldown {
    fn idle() -> Self {
        Self {
            remaining: Arc::new(AtomicU64::new(0)),
            ticker: None,
        }
    }

    /// Start (or restart) the countdown.
    fn arm(&mut self, duration: Duration) {
        self.cancel();
        self.remaining.store(duration.as_secs(), Ordering::SeqCst);

        let remaining = Arc::clone(&self.remaining);
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let done = remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1))
                    .map_or(true, |previous| previous <= 1);
                if done {
                    break;
                }
            }
        }));
    }

    fn remaining_secs(&self) -> u64 {
        self.remaining.load(Ordering::SeqCst)
    }

    fn is_ready(&self) -> bool {
        self.remaining_secs() == 0
    }

    fn cancel(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for Cooldown {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// The sign-up wizard.
///
/// Created when the sign-up UI opens and destroyed when it closes or
/// completes. Owns its field set exclusively.
pub struct SignupFlow {
    step: SignupStep,
    pending_email: Option<Email>,
    pending_full_name: Option<String>,
    email_verified: bool,
    draft: ProfileDraft,
    dirty: bool,
    profile_errors: ProfileErrors,
    cooldown: Cooldown,
    resend_cooldown: Duration,
    cache: Arc<dyn DurableCache>,
    provider: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn Notifier>,
    session: Arc<SessionStore>,
    closed: bool,
}

impl SignupFlow {
    /// Open the sign-up flow, resuming from the durable cache when a
    /// verified identity candidate is present.
    #[must_use]
    pub fn open(
        cache: Arc<dyn DurableCache>,
        provider: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn Notifier>,
        session: Arc<SessionStore>,
    ) -> Self {
        let pending_email = cache
            .get(keys::PENDING_EMAIL)
            .and_then(|raw| Email::parse(&raw).ok());
        let pending_full_name = cache.get(keys::PENDING_NAME);
        let email_verified = cache
            .get(keys::EMAIL_VERIFIED)
            .is_some_and(|value| value == "true");

        let step = if email_verified && pending_email.is_some() {
            tracing::info!("resuming sign-up at the profile step");
            SignupStep::CompleteProfile
        } else {
            SignupStep::Form
        };

        Self {
            step,
            pending_email,
            pending_full_name,
            email_verified,
            draft: ProfileDraft::default(),
            dirty: false,
            profile_errors: ProfileErrors::default(),
            cooldown: Cooldown::idle(),
            resend_cooldown: DEFAULT_RESEND_COOLDOWN,
            cache,
            provider,
            notifier,
            session,
            closed: false,
        }
    }

    /// Override the resend cooldown window.
    #[must_use]
    pub fn with_resend_cooldown(mut self, cooldown: Duration) -> Self {
        self.resend_cooldown = cooldown;
        self
    }

    /// Current wizard step.
    #[must_use]
    pub const fn step(&self) -> SignupStep {
        self.step
    }

    /// Whether the profile step has unsaved edits.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the flow has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// The email candidate carried through the flow.
    #[must_use]
    pub const fn pending_email(&self) -> Option<&Email> {
        self.pending_email.as_ref()
    }

    /// Whether the email candidate has been verified.
    #[must_use]
    pub const fn is_email_verified(&self) -> bool {
        self.email_verified
    }

    /// Field errors from the last profile submission.
    #[must_use]
    pub const fn profile_errors(&self) -> &ProfileErrors {
        &self.profile_errors
    }

    /// The profile fields as currently typed.
    #[must_use]
    pub const fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    /// Seconds until a resend is allowed.
    #[must_use]
    pub fn resend_remaining_secs(&self) -> u64 {
        self.cooldown.remaining_secs()
    }

    /// Whether the resend action is enabled.
    #[must_use]
    pub fn can_resend(&self) -> bool {
        self.cooldown.is_ready()
    }

    /// Submit credentials from the form step.
    ///
    /// Caches the identity candidate durably, sends a verification link,
    /// arms the resend cooldown, and moves to the verification step.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed email, an empty name,
    /// or a weak password, and [`SignupError::Identity`] if the link
    /// could not be sent (the flow stays in the form step; entered data
    /// is untouched).
    #[instrument(skip_all)]
    pub async fn submit_credentials(
        &mut self,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> Result<(), SignupError> {
        self.require_step(SignupStep::Form)?;

        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(SignupError::MissingFullName);
        }

        let email = Email::parse(email.trim())?;

        if !PasswordStrength::evaluate(password).allows_submission() {
            return Err(SignupError::WeakPassword);
        }

        if let Err(e) = self.provider.send_verification_link(&email).await {
            tracing::warn!(error = %e, "verification link send failed");
            self.notifier.notify(
                Severity::Error,
                "Could not send the verification email. Please try again.",
            );
            return Err(e.into());
        }

        self.cache.set(keys::PENDING_EMAIL, email.as_str());
        self.cache.set(keys::PENDING_NAME, full_name);

        self.notifier.notify(
            Severity::Success,
            &format!("Verification link sent to {email}"),
        );

        self.pending_email = Some(email);
        self.pending_full_name = Some(full_name.to_owned());
        self.step = SignupStep::VerifyEmail;
        self.cooldown.arm(self.resend_cooldown);
        Ok(())
    }

    /// Sign in through the federated identity provider.
    ///
    /// A federated identity arrives pre-verified, so the flow skips the
    /// verification step entirely.
    ///
    /// # Errors
    ///
    /// Returns [`SignupError::Identity`] if the provider fails or the
    /// shopper backs out. Non-fatal: the flow stays open in the form
    /// step and no session is created.
    #[instrument(skip_all)]
    pub async fn federated_sign_in(&mut self) -> Result<(), SignupError> {
        self.require_step(SignupStep::Form)?;

        let identity = match self.provider.start_federated_sign_in().await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "federated sign-in failed");
                self.notifier
                    .notify(Severity::Error, &format!("Sign-in did not complete: {e}"));
                return Err(e.into());
            }
        };

        self.cache.set(keys::PENDING_EMAIL, identity.email.as_str());
        self.cache.set(keys::PENDING_NAME, &identity.full_name);
        self.cache.set(keys::EMAIL_VERIFIED, "true");

        self.notifier.notify(
            Severity::Success,
            &format!("Signed in as {}; complete your profile", identity.email),
        );

        self.pending_email = Some(identity.email);
        self.pending_full_name = Some(identity.full_name);
        self.email_verified = true;
        self.step = SignupStep::CompleteProfile;
        Ok(())
    }

    /// The shopper reports having clicked the verification link.
    ///
    /// # Errors
    ///
    /// Returns [`SignupError::InvalidStep`] outside the verification
    /// step.
    pub fn confirm_verification(&mut self) -> Result<(), SignupError> {
        self.require_step(SignupStep::VerifyEmail)?;

        self.email_verified = true;
        self.cache.set(keys::EMAIL_VERIFIED, "true");
        self.cooldown.cancel();
        self.step = SignupStep::CompleteProfile;
        Ok(())
    }

    /// Return to the form to use a different email.
    ///
    /// The durable cache keeps the previous candidate so an interrupted
    /// flow can still resume; it is only cleared on completion or
    /// explicit abandonment.
    ///
    /// # Errors
    ///
    /// Returns [`SignupError::InvalidStep`] outside the verification
    /// step.
    pub fn use_another_email(&mut self) -> Result<(), SignupError> {
        self.require_step(SignupStep::VerifyEmail)?;

        self.cooldown.cancel();
        self.step = SignupStep::Form;
        Ok(())
    }

    /// Resend the verification link, re-arming the cooldown.
    ///
    /// # Errors
    ///
    /// Returns [`SignupError::CooldownActive`] until the cooldown
    /// elapses, and [`SignupError::Identity`] if sending fails.
    #[instrument(skip_all)]
    pub async fn resend_verification(&mut self) -> Result<(), SignupError> {
        self.require_step(SignupStep::VerifyEmail)?;

        if !self.cooldown.is_ready() {
            return Err(SignupError::CooldownActive {
                remaining_secs: self.cooldown.remaining_secs(),
            });
        }

        let Some(email) = self.pending_email.clone() else {
            return Err(SignupError::InvalidStep { step: self.step });
        };

        if let Err(e) = self.provider.send_verification_link(&email).await {
            tracing::warn!(error = %e, "verification link resend failed");
            self.notifier.notify(
                Severity::Error,
                "Could not send the verification email. Please try again.",
            );
            return Err(e.into());
        }

        self.notifier.notify(
            Severity::Success,
            &format!("Verification link sent to {email}"),
        );
        self.cooldown.arm(self.resend_cooldown);
        Ok(())
    }

    /// Edit the phone field.
    pub fn set_phone(&mut self, value: &str) {
        self.draft.phone = value.to_owned();
        self.dirty = true;
    }

    /// Edit the national ID field.
    pub fn set_national_id(&mut self, value: &str) {
        self.draft.national_id = value.to_owned();
        self.dirty = true;
    }

    /// Edit the birth date field (`YYYY-MM-DD`).
    pub fn set_birth_date(&mut self, value: &str) {
        self.draft.birth_date = value.to_owned();
        self.dirty = true;
    }

    /// Edit the optional apartment number field.
    pub fn set_apartment_number(&mut self, value: &str) {
        self.draft.apartment_number = value.to_owned();
        self.dirty = true;
    }

    /// Submit the profile step, validating against today's date.
    ///
    /// # Errors
    ///
    /// See [`SignupFlow::submit_profile_as_of`].
    pub fn submit_profile(&mut self) -> Result<Profile, SignupError> {
        self.submit_profile_as_of(Local::now().date_naive())
    }

    /// Submit the profile step, validating ages against `today`.
    ///
    /// All mandatory-field errors are collected and reported together.
    /// On success the durable cache is cleared, a session is created
    /// from the pending identity, and the flow completes.
    ///
    /// # Errors
    ///
    /// Returns [`SignupError::InvalidProfile`] carrying every field
    /// error; the entered values are preserved for correction.
    #[instrument(skip_all)]
    pub fn submit_profile_as_of(&mut self, today: NaiveDate) -> Result<Profile, SignupError> {
        self.require_step(SignupStep::CompleteProfile)?;

        let mut errors = ProfileErrors::default();

        let phone = Phone::parse(&self.draft.phone)
            .map_err(|e| errors.phone = Some(e))
            .ok();
        let national_id = NationalId::parse(&self.draft.national_id)
            .map_err(|e| errors.national_id = Some(e))
            .ok();
        let birth_date = match BirthDate::parse(&self.draft.birth_date) {
            Ok(birth) if birth.is_adult_on(today) => Some(birth),
            Ok(_) => {
                errors.birth_date = Some(BirthDateFieldError::Underage);
                None
            }
            Err(e) => {
                errors.birth_date = Some(BirthDateFieldError::Invalid(e));
                None
            }
        };

        let (Some(phone), Some(national_id), Some(birth_date)) = (phone, national_id, birth_date)
        else {
            self.profile_errors = errors.clone();
            return Err(SignupError::InvalidProfile(errors));
        };

        let Some(email) = self.pending_email.clone() else {
            return Err(SignupError::InvalidStep { step: self.step });
        };
        let full_name = self.pending_full_name.clone().unwrap_or_default();

        let apartment = self.draft.apartment_number.trim();
        let profile = Profile {
            phone,
            national_id,
            birth_date,
            apartment_number: (!apartment.is_empty()).then(|| apartment.to_owned()),
        };

        self.cache.remove(keys::PENDING_EMAIL);
        self.cache.remove(keys::PENDING_NAME);
        self.cache.remove(keys::EMAIL_VERIFIED);

        self.session.login(Identity {
            email,
            full_name: full_name.clone(),
        });

        self.notifier
            .notify(Severity::Success, &format!("Welcome, {full_name}!"));

        self.profile_errors = ProfileErrors::default();
        self.dirty = false;
        self.cooldown.cancel();
        self.step = SignupStep::Done;
        self.closed = true;
        Ok(profile)
    }

    /// Ask to close the flow.
    ///
    /// Unsaved profile edits block the close until
    /// [`SignupFlow::confirm_discard`] is called; any other state closes
    /// immediately without touching the flow's durable cache.
    pub fn request_close(&mut self) -> CloseOutcome {
        if self.closed {
            return CloseOutcome::Closed;
        }

        if self.step == SignupStep::CompleteProfile && self.dirty {
            return CloseOutcome::ConfirmDiscard;
        }

        self.close();
        CloseOutcome::Closed
    }

    /// Discard unsaved profile edits and close.
    ///
    /// The verified-email cache is kept: verification is not unsaved
    /// work, and keeping it lets the flow resume at the profile step.
    pub fn confirm_discard(&mut self) {
        self.draft = ProfileDraft::default();
        self.profile_errors = ProfileErrors::default();
        self.dirty = false;
        self.close();
    }

    /// Abandon the flow entirely, clearing the durable cache.
    pub fn abandon(&mut self) {
        self.cache.remove(keys::PENDING_EMAIL);
        self.cache.remove(keys::PENDING_NAME);
        self.cache.remove(keys::EMAIL_VERIFIED);
        self.draft = ProfileDraft::default();
        self.profile_errors = ProfileErrors::default();
        self.dirty = false;
        self.close();
    }

    fn close(&mut self) {
        self.cooldown.cancel();
        self.closed = true;
    }

    fn require_step(&self, expected: SignupStep) -> Result<(), SignupError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(SignupError::InvalidStep { step: self.step })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::MemoryCache;
    use crate::events::EventBus;
    use crate::services::identity::FederatedIdentity;
    use crate::services::notify::BufferNotifier;

    struct TestProvider {
        federated: Option<FederatedIdentity>,
        send_fails: bool,
        sends: AtomicUsize,
    }

    impl TestProvider {
        fn new() -> Self {
            Self {
                federated: None,
                send_fails: false,
                sends: AtomicUsize::new(0),
            }
        }

        fn with_federated(email: &str, full_name: &str) -> Self {
            Self {
                federated: Some(FederatedIdentity {
                    email: Email::parse(email).unwrap(),
                    full_name: full_name.to_owned(),
                }),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for TestProvider {
        async fn start_federated_sign_in(&self) -> Result<FederatedIdentity, IdentityError> {
            self.federated.clone().ok_or(IdentityError::Cancelled)
        }

        async fn send_verification_link(&self, _email: &Email) -> Result<(), IdentityError> {
            if self.send_fails {
                return Err(IdentityError::Provider("smtp unavailable".to_owned()));
            }
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Harness {
        cache: Arc<MemoryCache>,
        notifier: Arc<BufferNotifier>,
        session: Arc<SessionStore>,
    }

    fn harness() -> Harness {
        Harness {
            cache: Arc::new(MemoryCache::new()),
            notifier: Arc::new(BufferNotifier::new()),
            session: Arc::new(SessionStore::new(EventBus::new())),
        }
    }

    fn open_flow(h: &Harness, provider: TestProvider) -> SignupFlow {
        SignupFlow::open(
            Arc::clone(&h.cache) as Arc<dyn DurableCache>,
            Arc::new(provider),
            Arc::clone(&h.notifier) as Arc<dyn Notifier>,
            Arc::clone(&h.session),
        )
    }

    fn fill_valid_profile(flow: &mut SignupFlow) {
        flow.set_phone("11 4321 5678");
        flow.set_national_id("30123456");
        flow.set_birth_date("2000-01-15");
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    #[tokio::test]
    async fn test_opens_at_form_with_empty_cache() {
        let h = harness();
        let flow = open_flow(&h, TestProvider::new());
        assert_eq!(flow.step(), SignupStep::Form);
        assert!(!flow.is_email_verified());
    }

    #[tokio::test]
    async fn test_resumes_at_profile_when_verified() {
        let h = harness();
        h.cache.set(keys::PENDING_EMAIL, "a@b.com");
        h.cache.set(keys::EMAIL_VERIFIED, "true");

        let flow = open_flow(&h, TestProvider::new());
        assert_eq!(flow.step(), SignupStep::CompleteProfile);
        assert!(flow.is_email_verified());
        assert_eq!(flow.pending_email().unwrap().as_str(), "a@b.com");
    }

    #[tokio::test]
    async fn test_unverified_cache_does_not_resume() {
        let h = harness();
        h.cache.set(keys::PENDING_EMAIL, "a@b.com");

        let flow = open_flow(&h, TestProvider::new());
        assert_eq!(flow.step(), SignupStep::Form);
    }

    #[tokio::test]
    async fn test_weak_password_blocks_submission() {
        let h = harness();
        let mut flow = open_flow(&h, TestProvider::new());

        let result = flow.submit_credentials("ana@example.com", "Ana", "abc").await;
        assert!(matches!(result, Err(SignupError::WeakPassword)));
        assert_eq!(flow.step(), SignupStep::Form);
    }

    #[tokio::test]
    async fn test_medium_password_is_accepted() {
        let h = harness();
        let mut flow = open_flow(&h, TestProvider::new());

        flow.submit_credentials("ana@example.com", "Ana", "Abcdef12")
            .await
            .unwrap();
        assert_eq!(flow.step(), SignupStep::VerifyEmail);
    }

    #[tokio::test]
    async fn test_submit_credentials_caches_and_arms_cooldown() {
        let h = harness();
        let mut flow = open_flow(&h, TestProvider::new());

        flow.submit_credentials("ana@example.com", " Ana Pérez ", "Abcdef12!")
            .await
            .unwrap();

        assert_eq!(h.cache.get(keys::PENDING_EMAIL), Some("ana@example.com".to_owned()));
        assert_eq!(h.cache.get(keys::PENDING_NAME), Some("Ana Pérez".to_owned()));
        assert!(!flow.can_resend());
        assert!(h.notifier.contains("Verification link sent"));
    }

    #[tokio::test]
    async fn test_send_failure_keeps_form_open() {
        let h = harness();
        let mut flow = open_flow(
            &h,
            TestProvider {
                send_fails: true,
                ..TestProvider::new()
            },
        );

        let result = flow
            .submit_credentials("ana@example.com", "Ana", "Abcdef12!")
            .await;
        assert!(matches!(result, Err(SignupError::Identity(_))));
        assert_eq!(flow.step(), SignupStep::Form);
        assert_eq!(h.cache.get(keys::PENDING_EMAIL), None);
        assert!(h.notifier.contains("Could not send"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resend_gated_by_cooldown() {
        let h = harness();
        let mut flow = open_flow(&h, TestProvider::new());

        flow.submit_credentials("ana@example.com", "Ana", "Abcdef12!")
            .await
            .unwrap();

        let result = flow.resend_verification().await;
        assert!(matches!(result, Err(SignupError::CooldownActive { .. })));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(flow.can_resend());
        flow.resend_verification().await.unwrap();
        // Re-armed after a successful resend.
        assert!(!flow.can_resend());
    }

    #[tokio::test]
    async fn test_confirm_verification_moves_to_profile() {
        let h = harness();
        let mut flow = open_flow(&h, TestProvider::new());

        flow.submit_credentials("ana@example.com", "Ana", "Abcdef12!")
            .await
            .unwrap();
        flow.confirm_verification().unwrap();

        assert_eq!(flow.step(), SignupStep::CompleteProfile);
        assert!(flow.is_email_verified());
        assert_eq!(h.cache.get(keys::EMAIL_VERIFIED), Some("true".to_owned()));
    }

    #[tokio::test]
    async fn test_use_another_email_returns_to_form_keeping_cache() {
        let h = harness();
        let mut flow = open_flow(&h, TestProvider::new());

        flow.submit_credentials("ana@example.com", "Ana", "Abcdef12!")
            .await
            .unwrap();
        flow.use_another_email().unwrap();

        assert_eq!(flow.step(), SignupStep::Form);
        // Cleared only on completion or explicit abandonment.
        assert_eq!(h.cache.get(keys::PENDING_EMAIL), Some("ana@example.com".to_owned()));
    }

    #[tokio::test]
    async fn test_federated_sign_in_skips_verification() {
        let h = harness();
        let mut flow = open_flow(&h, TestProvider::with_federated("fed@example.com", "Fede"));

        flow.federated_sign_in().await.unwrap();

        assert_eq!(flow.step(), SignupStep::CompleteProfile);
        assert!(flow.is_email_verified());
        assert_eq!(h.cache.get(keys::EMAIL_VERIFIED), Some("true".to_owned()));
    }

    #[tokio::test]
    async fn test_cancelled_federated_sign_in_is_nonfatal() {
        let h = harness();
        let mut flow = open_flow(&h, TestProvider::new());

        let result = flow.federated_sign_in().await;
        assert!(matches!(
            result,
            Err(SignupError::Identity(IdentityError::Cancelled))
        ));
        assert_eq!(flow.step(), SignupStep::Form);
        assert!(!flow.is_closed());
        assert!(!h.session.is_authenticated());
        assert!(h.notifier.contains("did not complete"));
    }

    #[tokio::test]
    async fn test_dirty_edit_blocks_close() {
        let h = harness();
        h.cache.set(keys::PENDING_EMAIL, "a@b.com");
        h.cache.set(keys::EMAIL_VERIFIED, "true");
        let mut flow = open_flow(&h, TestProvider::new());

        flow.set_phone("11 4321");
        assert_eq!(flow.request_close(), CloseOutcome::ConfirmDiscard);
        assert!(!flow.is_closed());

        flow.confirm_discard();
        assert!(flow.is_closed());
        assert_eq!(flow.draft(), &ProfileDraft::default());
        // Verified-email cache survives a discard.
        assert_eq!(h.cache.get(keys::EMAIL_VERIFIED), Some("true".to_owned()));
    }

    #[tokio::test]
    async fn test_clean_close_needs_no_confirmation() {
        let h = harness();
        let mut flow = open_flow(&h, TestProvider::new());
        assert_eq!(flow.request_close(), CloseOutcome::Closed);
        assert!(flow.is_closed());
    }

    #[tokio::test]
    async fn test_profile_errors_are_collected_together() {
        let h = harness();
        h.cache.set(keys::PENDING_EMAIL, "a@b.com");
        h.cache.set(keys::EMAIL_VERIFIED, "true");
        let mut flow = open_flow(&h, TestProvider::new());

        flow.set_phone("123");
        flow.set_national_id("12");
        flow.set_birth_date("2015-01-01");

        let result = flow.submit_profile_as_of(today());
        let Err(SignupError::InvalidProfile(errors)) = result else {
            panic!("expected InvalidProfile");
        };
        assert!(errors.phone.is_some());
        assert!(errors.national_id.is_some());
        assert!(matches!(
            errors.birth_date,
            Some(BirthDateFieldError::Underage)
        ));

        // Entered values survive the failed submission.
        assert_eq!(flow.draft().phone, "123");
        assert_eq!(flow.step(), SignupStep::CompleteProfile);
    }

    #[tokio::test]
    async fn test_successful_profile_completes_flow() {
        let h = harness();
        h.cache.set(keys::PENDING_EMAIL, "a@b.com");
        h.cache.set(keys::PENDING_NAME, "Ana");
        h.cache.set(keys::EMAIL_VERIFIED, "true");
        let mut flow = open_flow(&h, TestProvider::new());

        fill_valid_profile(&mut flow);
        flow.set_apartment_number(" 4B ");
        let profile = flow.submit_profile_as_of(today()).unwrap();

        assert_eq!(profile.apartment_number.as_deref(), Some("4B"));
        assert_eq!(flow.step(), SignupStep::Done);
        assert!(flow.is_closed());

        // Session created from the pending identity.
        assert!(h.session.is_authenticated());
        assert_eq!(h.session.identity().unwrap().email.as_str(), "a@b.com");

        // Cache cleared exactly at completion.
        assert_eq!(h.cache.get(keys::PENDING_EMAIL), None);
        assert_eq!(h.cache.get(keys::PENDING_NAME), None);
        assert_eq!(h.cache.get(keys::EMAIL_VERIFIED), None);
    }

    #[tokio::test]
    async fn test_apartment_is_optional() {
        let h = harness();
        h.cache.set(keys::PENDING_EMAIL, "a@b.com");
        h.cache.set(keys::EMAIL_VERIFIED, "true");
        let mut flow = open_flow(&h, TestProvider::new());

        fill_valid_profile(&mut flow);
        let profile = flow.submit_profile_as_of(today()).unwrap();
        assert_eq!(profile.apartment_number, None);
    }

    #[tokio::test]
    async fn test_abandon_clears_cache() {
        let h = harness();
        let mut flow = open_flow(&h, TestProvider::new());

        flow.submit_credentials("ana@example.com", "Ana", "Abcdef12!")
            .await
            .unwrap();
        flow.abandon();

        assert!(flow.is_closed());
        assert_eq!(h.cache.get(keys::PENDING_EMAIL), None);
        assert_eq!(h.cache.get(keys::PENDING_NAME), None);
    }

    #[tokio::test]
    async fn test_operations_rejected_in_wrong_step() {
        let h = harness();
        let mut flow = open_flow(&h, TestProvider::new());

        assert!(matches!(
            flow.confirm_verification(),
            Err(SignupError::InvalidStep { .. })
        ));
        assert!(matches!(
            flow.submit_profile_as_of(today()),
            Err(SignupError::InvalidStep { .. })
        ));
    }
}
