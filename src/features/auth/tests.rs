//! Session store and credential flow tests against the in-memory backend.

use super::flow::{CredentialFlow, FlowStep, FormOutcome};
use super::persist::{self, AUTH_TOKEN_KEY, USER_KEY};
use super::redirect::PostAuthRouter;
use super::role::{AccountKind, roles_match};
use super::session::{Phase, Session};
use super::state::{SessionStore, Submission};
use super::test_support::{FakeAuthApi, OTP};
use super::token::jwt_with_exp;
use crate::app_lib::{AppError, KeyValueStore, MemoryStore};
use crate::features::forms::validation::{Field, RegistrationForm};
use crate::routes::{History, paths};
use secrecy::SecretString;
use std::sync::{Arc, atomic::Ordering};
use std::time::Duration;
use tokio::time::timeout;

const VENDOR_EMAIL: &str = "vendor@market.test";
const VENDOR_PASSWORD: &str = "Str0ng!Pass";

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

fn setup(api: FakeAuthApi) -> (Arc<FakeAuthApi>, Arc<MemoryStore>, Arc<SessionStore>) {
    let api = Arc::new(api);
    let storage = Arc::new(MemoryStore::new());
    let store = Arc::new(SessionStore::new(api.clone(), storage.clone()));
    (api, storage, store)
}

fn vendor_backend() -> FakeAuthApi {
    FakeAuthApi::new().with_account(VENDOR_EMAIL, VENDOR_PASSWORD, "vendor")
}

fn registration() -> RegistrationForm {
    RegistrationForm {
        name: "Anita Rao".to_string(),
        email: "anita@market.test".to_string(),
        phone: "9123456789".to_string(),
        password: "Str0ng!Pass".to_string(),
        confirm_password: "Str0ng!Pass".to_string(),
        national_id: Some("123456789012".to_string()),
        business_name: Some("Rao Traders".to_string()),
    }
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn login_with_direct_token_persists_session() {
    let (_api, storage, store) = setup(vendor_backend());

    let outcome = store.login(AccountKind::Vendor, VENDOR_EMAIL, &secret(VENDOR_PASSWORD)).await;

    assert_eq!(outcome, Submission::Authenticated);
    let session = store.session();
    assert!(session.is_authenticated());
    assert!(!session.loading);
    assert_eq!(session.user().map(|user| user.email.as_str()), Some(VENDOR_EMAIL));
    assert!(storage.get(AUTH_TOKEN_KEY).expect("token").is_some());
    assert!(storage.get(USER_KEY).expect("user").is_some());
}

#[tokio::test]
async fn rejected_login_sets_error_and_stays_anonymous() {
    let (_api, storage, store) = setup(vendor_backend());

    let outcome = store.login(AccountKind::Vendor, VENDOR_EMAIL, &secret("wrong")).await;

    assert_eq!(outcome, Submission::Rejected);
    let session = store.session();
    assert!(!session.is_authenticated());
    assert_eq!(session.phase, Phase::Anonymous);
    assert_eq!(session.error.as_deref(), Some("Invalid credentials"));
    assert!(storage.get(AUTH_TOKEN_KEY).expect("token").is_none());

    store.clear_error();
    assert_eq!(store.session(), Session::default());
}

#[tokio::test]
async fn network_failure_is_a_retryable_message() {
    let (api, _storage, store) = setup(vendor_backend());
    api.offline.store(true, Ordering::SeqCst);

    assert_eq!(
        store.login(AccountKind::Vendor, VENDOR_EMAIL, &secret(VENDOR_PASSWORD)).await,
        Submission::Rejected
    );
    let message = store.session().error.expect("error");
    assert!(message.contains("try again"));

    api.offline.store(false, Ordering::SeqCst);
    assert_eq!(
        store.login(AccountKind::Vendor, VENDOR_EMAIL, &secret(VENDOR_PASSWORD)).await,
        Submission::Authenticated
    );
}

#[tokio::test]
async fn logout_during_login_drops_the_late_response() {
    let (api, storage, store) = setup(vendor_backend());
    let gate = api.gate_logins();

    let task = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .login(AccountKind::Vendor, VENDOR_EMAIL, &secret(VENDOR_PASSWORD))
                .await
        })
    };
    wait_for(|| api.login_calls.load(Ordering::SeqCst) == 1).await;
    assert!(store.session().loading);

    store.logout().await;
    gate.notify_one();

    assert_eq!(task.await.expect("join"), Submission::Stale);
    assert_eq!(store.session(), Session::default());
    assert!(storage.get(AUTH_TOKEN_KEY).expect("token").is_none());
    assert!(storage.get(USER_KEY).expect("user").is_none());
}

#[tokio::test]
async fn second_submission_while_pending_is_suppressed() {
    let (api, _storage, store) = setup(vendor_backend());
    let gate = api.gate_logins();

    let first = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .login(AccountKind::Vendor, VENDOR_EMAIL, &secret(VENDOR_PASSWORD))
                .await
        })
    };
    wait_for(|| api.login_calls.load(Ordering::SeqCst) == 1).await;

    let second = store
        .login(AccountKind::Vendor, VENDOR_EMAIL, &secret(VENDOR_PASSWORD))
        .await;
    assert_eq!(second, Submission::Suppressed);

    gate.notify_one();
    assert_eq!(first.await.expect("join"), Submission::Authenticated);
    assert_eq!(api.login_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn vendor_otp_login_routes_to_vendor_dashboard_once() {
    let (api, _storage, store) = setup(vendor_backend());
    api.otp_on_login.store(true, Ordering::SeqCst);

    let history = History::new();
    let router = PostAuthRouter::new(Arc::new(history.clone()));
    tokio::spawn(router.run(store.subscribe()));

    let flow = CredentialFlow::new(AccountKind::Vendor, Arc::clone(&store));
    assert_eq!(flow.step(), FlowStep::Credentials);

    let outcome = flow.submit_credentials(VENDOR_EMAIL, &secret(VENDOR_PASSWORD)).await;
    assert_eq!(outcome, FormOutcome::Submitted(Submission::OtpRequired));
    let session = store.session();
    assert!(session.otp_sent());
    assert!(!session.is_authenticated());
    assert_eq!(flow.step(), FlowStep::OtpPending);

    assert_eq!(flow.submit_code(OTP).await, Ok(Submission::Authenticated));
    let session = store.session();
    assert!(session.is_authenticated());
    assert!(!session.otp_sent());
    assert!(roles_match(session.role().expect("role"), "vendor"));
    assert_eq!(flow.step(), FlowStep::Authenticated);

    wait_for(|| !history.entries().is_empty()).await;
    store.clear_error();
    let _ = store.refresh_profile().await;
    tokio::task::yield_now().await;
    assert_eq!(history.entries(), vec![paths::VENDOR_DASHBOARD]);
}

#[tokio::test]
async fn wrong_code_keeps_code_step_for_retry() {
    let (api, _storage, store) = setup(vendor_backend());
    api.otp_on_login.store(true, Ordering::SeqCst);
    let flow = CredentialFlow::new(AccountKind::Vendor, Arc::clone(&store));
    flow.submit_credentials(VENDOR_EMAIL, &secret(VENDOR_PASSWORD)).await;

    for _ in 0..3 {
        assert_eq!(flow.submit_code("000000").await, Ok(Submission::Rejected));
        let session = store.session();
        assert!(session.otp_sent());
        assert_eq!(session.error.as_deref(), Some("Invalid OTP"));
    }

    assert_eq!(flow.submit_code(OTP).await, Ok(Submission::Authenticated));
    assert_eq!(api.verify_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn empty_code_is_rejected_locally() {
    let (api, _storage, store) = setup(vendor_backend());
    api.otp_on_login.store(true, Ordering::SeqCst);
    let flow = CredentialFlow::new(AccountKind::Vendor, Arc::clone(&store));

    assert!(matches!(flow.submit_code(OTP).await, Err(AppError::Validation(_))));

    flow.submit_credentials(VENDOR_EMAIL, &secret(VENDOR_PASSWORD)).await;
    assert!(matches!(flow.submit_code("  ").await, Err(AppError::Validation(_))));
    assert_eq!(api.verify_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn registration_then_code_signs_in_with_pending_credentials() {
    let (api, storage, store) = setup(FakeAuthApi::new());
    api.verify_issues_token.store(false, Ordering::SeqCst);
    let flow = CredentialFlow::new(AccountKind::User, Arc::clone(&store));

    let outcome = flow.submit_registration(&registration()).await;
    assert_eq!(outcome, FormOutcome::Submitted(Submission::OtpRequired));
    assert_eq!(store.session().otp_target(), Some("anita@market.test"));

    assert_eq!(
        store.verify_otp("anita@market.test", OTP).await,
        Submission::Authenticated
    );
    assert_eq!(api.login_calls.load(Ordering::SeqCst), 1);
    assert!(store.session().is_authenticated());
    assert!(persist::load(storage.as_ref()).expect("load").is_some());
}

#[tokio::test]
async fn registration_code_for_another_account_fails_locally() {
    let (api, _storage, store) = setup(FakeAuthApi::new());
    let flow = CredentialFlow::new(AccountKind::User, Arc::clone(&store));
    flow.submit_registration(&registration()).await;

    let outcome = store.verify_otp("someone-else@market.test", OTP).await;

    assert_eq!(outcome, Submission::Rejected);
    assert_eq!(api.verify_calls.load(Ordering::SeqCst), 0);
    let session = store.session();
    assert!(session.otp_sent());
    assert!(!session.is_authenticated());
    assert!(session.error.is_some());

    assert_eq!(
        store.verify_otp("anita@market.test", OTP).await,
        Submission::Authenticated
    );
}

#[tokio::test]
async fn invalid_registration_never_reaches_backend() {
    let (api, _storage, store) = setup(FakeAuthApi::new());
    let flow = CredentialFlow::new(AccountKind::Vendor, Arc::clone(&store));
    let form = RegistrationForm {
        phone: "0123456789".to_string(),
        password: "weakpass".to_string(),
        confirm_password: "weakpass".to_string(),
        ..registration()
    };

    let FormOutcome::Invalid(errors) = flow.submit_registration(&form).await else {
        panic!("expected validation errors");
    };
    assert!(errors.contains_key(&Field::Phone));
    assert!(errors.contains_key(&Field::Password));
    assert_eq!(api.register_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.session(), Session::default());
}

#[tokio::test]
async fn duplicate_registration_reports_backend_message() {
    let (_api, _storage, store) = setup(FakeAuthApi::new().with_account(
        "anita@market.test",
        "Str0ng!Pass",
        "buyer",
    ));
    let flow = CredentialFlow::new(AccountKind::User, Arc::clone(&store));

    let outcome = flow.submit_registration(&registration()).await;

    assert_eq!(outcome, FormOutcome::Submitted(Submission::Rejected));
    assert_eq!(store.session().error.as_deref(), Some("User already exists"));
    assert_eq!(flow.step(), FlowStep::Credentials);
}

#[tokio::test]
async fn abandoning_registration_returns_to_credentials() {
    let (api, _storage, store) = setup(FakeAuthApi::new());
    api.verify_issues_token.store(false, Ordering::SeqCst);
    let flow = CredentialFlow::new(AccountKind::User, Arc::clone(&store));
    flow.submit_registration(&registration()).await;

    flow.back_to_credentials().await;

    assert_eq!(flow.step(), FlowStep::Credentials);
    assert_eq!(
        store.verify_otp("anita@market.test", OTP).await,
        Submission::Rejected
    );
    assert_eq!(
        store.session().error.as_deref(),
        Some("Account verified. Please sign in.")
    );
    assert_eq!(api.login_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn hydrate_without_token_is_silent() {
    let (_api, _storage, store) = setup(vendor_backend());

    assert_eq!(store.hydrate().await, Submission::Anonymous);
    assert_eq!(store.session(), Session::default());
}

#[tokio::test]
async fn hydrate_restores_and_refreshes_session() {
    let (api, storage, store) = setup(vendor_backend());
    let token = api.issue_token(VENDOR_EMAIL);
    let mut stale = api_profile(&api, VENDOR_EMAIL).await;
    stale.name = "Old Name".to_string();
    persist::save(storage.as_ref(), &secret(&token), &stale).expect("save");

    assert_eq!(store.hydrate().await, Submission::Authenticated);

    let session = store.session();
    assert!(session.is_authenticated());
    assert!(!session.loading);
    assert_eq!(session.user().map(|user| user.name.as_str()), Some("Test Account"));
    let stored = persist::load(storage.as_ref()).expect("load").expect("session");
    assert_eq!(stored.user.name, "Test Account");
}

#[tokio::test]
async fn hydrate_with_revoked_token_clears_storage() {
    let (api, storage, store) = setup(vendor_backend());
    let token = api.issue_token(VENDOR_EMAIL);
    let profile = api_profile(&api, VENDOR_EMAIL).await;
    persist::save(storage.as_ref(), &secret(&token), &profile).expect("save");
    api.revoke_all_tokens();

    assert_eq!(store.hydrate().await, Submission::Anonymous);
    assert_eq!(store.session(), Session::default());
    assert!(storage.get(AUTH_TOKEN_KEY).expect("token").is_none());
}

#[tokio::test]
async fn hydrate_offline_keeps_provisional_session() {
    let (api, storage, store) = setup(vendor_backend());
    let token = api.issue_token(VENDOR_EMAIL);
    let profile = api_profile(&api, VENDOR_EMAIL).await;
    persist::save(storage.as_ref(), &secret(&token), &profile).expect("save");
    api.offline.store(true, Ordering::SeqCst);

    assert_eq!(store.hydrate().await, Submission::Authenticated);
    let session = store.session();
    assert!(session.is_authenticated());
    assert_eq!(session.error, None);
    assert!(storage.get(AUTH_TOKEN_KEY).expect("token").is_some());
}

#[tokio::test]
async fn hydrate_discards_expired_jwt() {
    let (api, storage, store) = setup(vendor_backend());
    let profile = api_profile(&api, VENDOR_EMAIL).await;
    persist::save(storage.as_ref(), &secret(&jwt_with_exp(1)), &profile).expect("save");

    assert_eq!(store.hydrate().await, Submission::Anonymous);
    assert!(storage.get(USER_KEY).expect("user").is_none());
}

#[tokio::test]
async fn unauthorized_api_call_expires_session() {
    let (api, storage, store) = setup(vendor_backend());
    store
        .login(AccountKind::Vendor, VENDOR_EMAIL, &secret(VENDOR_PASSWORD))
        .await;
    api.revoke_all_tokens();

    let result = store.refresh_profile().await;

    assert!(result.as_ref().is_err_and(AppError::is_unauthorized));
    assert_eq!(store.session(), Session::default());
    assert!(storage.get(AUTH_TOKEN_KEY).expect("token").is_none());
}

#[tokio::test]
async fn profile_from_previous_session_is_dropped() {
    let (api, storage, store) = setup(vendor_backend());
    api.insert_account("buyer@market.test", "Buy3r!Pass", "buyer");
    store
        .login(AccountKind::Vendor, VENDOR_EMAIL, &secret(VENDOR_PASSWORD))
        .await;
    let gate = api.gate_profile_fetches();

    let refresh = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.refresh_profile().await })
    };
    wait_for(|| api.profile_calls.load(Ordering::SeqCst) == 1).await;

    store.logout().await;
    assert_eq!(
        store
            .login(AccountKind::User, "buyer@market.test", &secret("Buy3r!Pass"))
            .await,
        Submission::Authenticated
    );
    gate.notify_one();

    let stale = refresh.await.expect("join").expect("profile");
    assert_eq!(stale.email, VENDOR_EMAIL);
    assert_eq!(
        store.session().user().map(|user| user.email.clone()).as_deref(),
        Some("buyer@market.test")
    );
    let stored = persist::load(storage.as_ref()).expect("load").expect("stored");
    assert_eq!(stored.user.email, "buyer@market.test");
}

#[tokio::test]
async fn non_auth_failure_does_not_expire_session() {
    let (api, _storage, store) = setup(vendor_backend());
    store
        .login(AccountKind::Vendor, VENDOR_EMAIL, &secret(VENDOR_PASSWORD))
        .await;

    let result: Result<(), AppError> = store
        .call_authenticated(|_token| async {
            Err(AppError::Http {
                status: 500,
                message: "Internal error".to_string(),
            })
        })
        .await;

    assert!(result.is_err());
    assert!(store.session().is_authenticated());
    assert_eq!(api.logout_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn call_without_session_is_unauthorized() {
    let (_api, _storage, store) = setup(vendor_backend());
    let result: Result<(), AppError> = store.call_authenticated(|_token| async { Ok(()) }).await;
    assert!(result.is_err_and(|err| err.is_unauthorized()));
}

#[tokio::test]
async fn logout_clears_state_even_when_backend_fails() {
    let (api, storage, store) = setup(vendor_backend());
    store
        .login(AccountKind::Vendor, VENDOR_EMAIL, &secret(VENDOR_PASSWORD))
        .await;
    api.logout_fails.store(true, Ordering::SeqCst);

    store.logout().await;

    assert_eq!(api.logout_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.session(), Session::default());
    assert!(storage.get(AUTH_TOKEN_KEY).expect("token").is_none());
    assert!(storage.get(USER_KEY).expect("user").is_none());
}

#[tokio::test]
async fn subscribers_observe_sign_in() {
    let (_api, _storage, store) = setup(vendor_backend());
    let mut sessions = store.subscribe();
    let seen = tokio::spawn(async move {
        let mut loading_seen = false;
        while sessions.changed().await.is_ok() {
            let session = sessions.borrow_and_update().clone();
            loading_seen |= session.loading;
            if session.is_authenticated() && !session.loading {
                return loading_seen;
            }
        }
        loading_seen
    });

    store
        .login(AccountKind::Vendor, VENDOR_EMAIL, &secret(VENDOR_PASSWORD))
        .await;

    let result = timeout(Duration::from_secs(2), seen).await;
    assert!(result.is_ok_and(|joined| joined.is_ok()));
}

async fn api_profile(api: &FakeAuthApi, email: &str) -> crate::features::auth::types::UserProfile {
    use super::client::AuthApi;
    let token = api.issue_token(email);
    api.fetch_profile(&secret(&token)).await.expect("profile")
}
