//! Login gate in front of every data command
//!
//! Credentials come from the `[passwords]` and `[names]` tables of the config
//! file. A successful login yields a [`Session`] that carries the viewer's
//! [`AuthContext`] and expires `expiry_days` after login.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use fichas_core::AuthContext;

use crate::settings::Settings;

/// Display names used when `[names]` does not list a user
const DEFAULT_NAMES: [(&str, &str); 2] = [("admin", "Admin"), ("gabinete", "Gabinete Vereador")];

#[derive(Clone, Debug)]
struct Credential {
    display_name: String,
    password: String,
}

/// Static credential table plus cookie settings
#[derive(Clone, Debug)]
pub struct Authenticator {
    users: BTreeMap<String, Credential>,
    cookie_name: String,
    expiry_days: u32,
}

/// Result of a login attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    /// No username or no password was given
    Missing,
    /// Unknown user or wrong password
    Rejected,
    Authenticated(Session),
}

impl LoginOutcome {
    /// Message shown to the user for a failed attempt
    pub fn message(&self) -> &'static str {
        match self {
            LoginOutcome::Missing => "Digite usuário e senha para continuar",
            LoginOutcome::Rejected => "Usuário ou senha incorretos",
            LoginOutcome::Authenticated(_) => "Autenticado",
        }
    }
}

/// An authenticated login with an expiry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub context: AuthContext,
    pub cookie_name: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl Session {
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        now >= self.expires_at
    }

    /// The viewer, if the session is still valid at `now`
    pub fn active_context(&self, now: NaiveDateTime) -> Option<&AuthContext> {
        (!self.is_expired(now)).then_some(&self.context)
    }
}

impl Authenticator {
    pub fn new(cookie_name: impl Into<String>, expiry_days: u32) -> Self {
        Self {
            users: BTreeMap::new(),
            cookie_name: cookie_name.into(),
            expiry_days,
        }
    }

    /// Build the credential table from configuration
    pub fn from_settings(settings: &Settings) -> Self {
        let mut auth = Self::new(settings.cookie.name.clone(), settings.cookie.expiry_days);
        for (username, password) in &settings.passwords {
            let display_name = settings
                .names
                .get(username)
                .cloned()
                .or_else(|| default_name(username).map(str::to_string))
                .unwrap_or_else(|| username.clone());
            auth = auth.user(username, display_name, password);
        }
        auth
    }

    /// Add a user
    pub fn user(
        mut self,
        username: impl Into<String>,
        display_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.users.insert(
            username.into(),
            Credential {
                display_name: display_name.into(),
                password: password.into(),
            },
        );
        self
    }

    /// Check credentials at time `now`
    pub fn login(
        &self,
        username: Option<&str>,
        password: Option<&str>,
        now: NaiveDateTime,
    ) -> LoginOutcome {
        let username = username.map(str::trim).filter(|u| !u.is_empty());
        let password = password.filter(|p| !p.is_empty());
        let (Some(username), Some(password)) = (username, password) else {
            return LoginOutcome::Missing;
        };

        let Some(credential) = self.users.get(username) else {
            tracing::info!(user = username, "login rejected: unknown user");
            return LoginOutcome::Rejected;
        };
        if !constant_time_eq(credential.password.as_bytes(), password.as_bytes()) {
            tracing::info!(user = username, "login rejected: wrong password");
            return LoginOutcome::Rejected;
        }

        tracing::debug!(user = username, "login accepted");
        LoginOutcome::Authenticated(Session {
            context: AuthContext::new(username, credential.display_name.clone()),
            cookie_name: self.cookie_name.clone(),
            issued_at: now,
            expires_at: now + Duration::days(i64::from(self.expiry_days)),
        })
    }
}

fn default_name(username: &str) -> Option<&'static str> {
    DEFAULT_NAMES
        .iter()
        .find(|(user, _)| *user == username)
        .map(|(_, name)| *name)
}

/// Compare two byte strings without short-circuiting on the first difference
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    diff == 0
}
