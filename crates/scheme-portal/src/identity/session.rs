//! Session issuance boundary.
//!
//! [`OpaqueSessionIssuer`] keeps random tokens in process memory. Tokens expire after a fixed
//! lifetime and expired ones are pruned whenever a new token is issued. They are lost on
//! restart and no route checks them yet. A signed token scheme must replace it before
//! production use.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::applicants::ApplicantKind;

/// Lifetime of a session minted by [`OpaqueSessionIssuer::default`].
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

/// Who a session was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "camelCase")]
pub enum Principal {
    Applicant {
        kind: ApplicantKind,
        #[serde(rename = "uniqueId")]
        unique_id: String,
    },
    Admin {
        username: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub trait SessionIssuer: Send + Sync {
    fn issue(&self, principal: Principal) -> SessionGrant;
    fn verify(&self, token: &str) -> Option<Principal>;
}

#[derive(Debug)]
struct LiveSession {
    principal: Principal,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct OpaqueSessionIssuer {
    ttl: Duration,
    sessions: Mutex<HashMap<String, LiveSession>>,
}

impl Default for OpaqueSessionIssuer {
    fn default() -> Self {
        Self::with_ttl(Duration::hours(DEFAULT_SESSION_TTL_HOURS))
    }
}

impl OpaqueSessionIssuer {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Sessions not yet pruned, expired or not.
    pub fn tracked(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn issue_at(&self, principal: Principal, now: DateTime<Utc>) -> SessionGrant {
        let token = Uuid::new_v4().simple().to_string();
        let expires_at = now + self.ttl;
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, session| session.expires_at > now);
        sessions.insert(
            token.clone(),
            LiveSession {
                principal,
                expires_at,
            },
        );
        SessionGrant {
            token,
            issued_at: now,
            expires_at,
        }
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Option<Principal> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .filter(|session| session.expires_at > now)
            .map(|session| session.principal.clone())
    }
}

impl SessionIssuer for OpaqueSessionIssuer {
    fn issue(&self, principal: Principal) -> SessionGrant {
        self.issue_at(principal, Utc::now())
    }

    fn verify(&self, token: &str) -> Option<Principal> {
        self.verify_at(token, Utc::now())
    }
}
