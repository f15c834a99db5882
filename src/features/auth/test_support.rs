//! In-memory stand-in for the marketplace auth backend used by unit tests.

use crate::{
    app_lib::AppError,
    features::auth::{
        client::AuthApi,
        role::AccountKind,
        types::{
            AuthReply, ForgotPasswordRequest, LoginRequest, RegisterRequest, SetPasswordRequest,
            TokenPayload, UserProfile, VerifyOtpRequest,
        },
    },
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use tokio::sync::Notify;

pub(crate) const OTP: &str = "482913";
pub(crate) const RESET_TOKEN: &str = "reset-token-1";

#[derive(Clone)]
struct Account {
    profile: UserProfile,
    password: String,
}

pub(crate) struct FakeAuthApi {
    accounts: Mutex<HashMap<String, Account>>,
    tokens: Mutex<HashMap<String, String>>,
    pub(crate) otp_on_login: AtomicBool,
    pub(crate) verify_issues_token: AtomicBool,
    pub(crate) offline: AtomicBool,
    pub(crate) logout_fails: AtomicBool,
    pub(crate) login_calls: AtomicUsize,
    pub(crate) register_calls: AtomicUsize,
    pub(crate) verify_calls: AtomicUsize,
    pub(crate) logout_calls: AtomicUsize,
    pub(crate) profile_calls: AtomicUsize,
    login_gate: Mutex<Option<Arc<Notify>>>,
    profile_gate: Mutex<Option<Arc<Notify>>>,
    next_token: AtomicUsize,
}

impl FakeAuthApi {
    pub(crate) fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            otp_on_login: AtomicBool::new(false),
            verify_issues_token: AtomicBool::new(true),
            offline: AtomicBool::new(false),
            logout_fails: AtomicBool::new(false),
            login_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
            login_gate: Mutex::new(None),
            profile_gate: Mutex::new(None),
            next_token: AtomicUsize::new(1),
        }
    }

    pub(crate) fn with_account(self, email: &str, password: &str, role: &str) -> Self {
        self.insert_account(email, password, role);
        self
    }

    pub(crate) fn insert_account(&self, email: &str, password: &str, role: &str) {
        let profile = UserProfile {
            id: format!("id-{email}"),
            name: "Test Account".to_string(),
            email: email.to_string(),
            role: Some(role.to_string()),
            is_verified: true,
        };
        self.accounts.lock().expect("accounts").insert(
            email.to_string(),
            Account {
                profile,
                password: password.to_string(),
            },
        );
    }

    /// Makes the next logins wait until the returned handle is notified.
    pub(crate) fn gate_logins(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.login_gate.lock().expect("gate") = Some(Arc::clone(&gate));
        gate
    }

    /// Makes the next profile fetches wait until the returned handle is notified.
    pub(crate) fn gate_profile_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.profile_gate.lock().expect("gate") = Some(Arc::clone(&gate));
        gate
    }

    /// Issues a token for an account, as a previous session would have.
    pub(crate) fn issue_token(&self, email: &str) -> String {
        let token = format!("token-{}", self.next_token.fetch_add(1, Ordering::SeqCst));
        self.tokens
            .lock()
            .expect("tokens")
            .insert(token.clone(), email.to_string());
        token
    }

    pub(crate) fn revoke_all_tokens(&self) {
        self.tokens.lock().expect("tokens").clear();
    }

    pub(crate) fn password_of(&self, email: &str) -> Option<String> {
        self.accounts
            .lock()
            .expect("accounts")
            .get(email)
            .map(|account| account.password.clone())
    }

    fn check_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(AppError::Network("Unable to reach the server: connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    fn token_for(&self, email: &str) -> Result<TokenPayload, AppError> {
        let profile = self
            .accounts
            .lock()
            .expect("accounts")
            .get(email)
            .map(|account| account.profile.clone())
            .ok_or_else(|| rejected(404, "User not found"))?;
        let token = self.issue_token(email);
        Ok(TokenPayload {
            token: SecretString::from(token),
            user: Some(profile),
        })
    }
}

fn rejected(status: u16, message: &str) -> AppError {
    AppError::Http {
        status,
        message: message.to_string(),
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn login(&self, _kind: AccountKind, request: &LoginRequest) -> Result<AuthReply, AppError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.login_gate.lock().expect("gate").clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check_online()?;

        let matches = self
            .accounts
            .lock()
            .expect("accounts")
            .get(&request.email_or_phone)
            .is_some_and(|account| account.password == request.password);
        if !matches {
            return Err(rejected(401, "Invalid credentials"));
        }

        if self.otp_on_login.load(Ordering::SeqCst) {
            Ok(AuthReply::OtpSent("OTP sent".to_string()))
        } else {
            self.token_for(&request.email_or_phone).map(AuthReply::Token)
        }
    }

    async fn register(&self, kind: AccountKind, request: &RegisterRequest) -> Result<(), AppError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.accounts.lock().expect("accounts").contains_key(&request.email) {
            return Err(rejected(409, "User already exists"));
        }
        self.insert_account(&request.email, &request.password, kind.role().as_str());
        Ok(())
    }

    async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<AuthReply, AppError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let known = self
            .accounts
            .lock()
            .expect("accounts")
            .contains_key(&request.email_or_phone);
        if !known || request.otp != OTP {
            return Err(rejected(400, "Invalid OTP"));
        }

        if self.verify_issues_token.load(Ordering::SeqCst) {
            self.token_for(&request.email_or_phone).map(AuthReply::Token)
        } else {
            Ok(AuthReply::Verified("Account verified".to_string()))
        }
    }

    async fn logout(&self, _token: &SecretString) -> Result<(), AppError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.logout_fails.load(Ordering::SeqCst) {
            return Err(AppError::Network("Unable to reach the server".to_string()));
        }
        Ok(())
    }

    async fn fetch_profile(&self, token: &SecretString) -> Result<UserProfile, AppError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.profile_gate.lock().expect("gate").take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check_online()?;
        let email = self
            .tokens
            .lock()
            .expect("tokens")
            .get(token.expose_secret())
            .cloned()
            .ok_or_else(|| rejected(401, "Token expired"))?;
        self.accounts
            .lock()
            .expect("accounts")
            .get(&email)
            .map(|account| account.profile.clone())
            .ok_or_else(|| rejected(401, "Token expired"))
    }

    async fn forgot_password(&self, request: &ForgotPasswordRequest) -> Result<(), AppError> {
        self.check_online()?;
        if self
            .accounts
            .lock()
            .expect("accounts")
            .contains_key(&request.email_or_phone)
        {
            Ok(())
        } else {
            Err(rejected(404, "User not found"))
        }
    }

    async fn verify_forgot_password_otp(
        &self,
        request: &VerifyOtpRequest,
    ) -> Result<Option<SecretString>, AppError> {
        self.check_online()?;
        if request.otp == OTP {
            Ok(Some(SecretString::from(RESET_TOKEN.to_string())))
        } else {
            Err(rejected(400, "Invalid OTP"))
        }
    }

    async fn set_password(&self, request: &SetPasswordRequest) -> Result<(), AppError> {
        self.check_online()?;
        if request.reset_token.as_deref() != Some(RESET_TOKEN) {
            return Err(rejected(400, "Reset session expired"));
        }
        let mut accounts = self.accounts.lock().expect("accounts");
        let account = accounts
            .get_mut(&request.email_or_phone)
            .ok_or_else(|| rejected(404, "User not found"))?;
        account.password = request.password.clone();
        Ok(())
    }
}
