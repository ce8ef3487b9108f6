use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use url::Url;

use super::error::AuthError;

/// Credentials older than this are probably expired. Advisory only.
const STALE_AFTER_SECS: i64 = 60 * 60;

/// Bearer token + device id pair observed on an outgoing catalog call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub device_id: String,
    pub captured_at: DateTime<Utc>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("device_id", &self.device_id)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

impl Credential {
    #[cfg(test)]
    pub fn new(token: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self::captured_at(token, device_id, Utc::now())
    }

    pub fn captured_at(
        token: impl Into<String>,
        device_id: impl Into<String>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token: token.into(),
            device_id: device_id.into(),
            captured_at,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.captured_at
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.age(now).num_seconds() > STALE_AFTER_SECS
    }

    /// Value for the `authorization` request header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Process-wide credential cell: one writer (the monitor), many readers.
pub type SharedCredential = Arc<RwLock<Option<Credential>>>;

/// Passively derives the current [`Credential`] from outgoing requests.
///
/// The monitor never issues a request itself. Every observed call to the
/// catalog host that carries both a bearer token and a device id replaces
/// the stored credential; the last observed pair wins.
#[derive(Clone)]
pub struct CaptureMonitor {
    api: Target,
    credential: SharedCredential,
}

impl CaptureMonitor {
    /// Create a monitor for the host of `api_base`
    /// (e.g. `https://studio-api.prod.suno.com`).
    pub fn new(api_base: &str) -> Result<Self, AuthError> {
        let api =
            Target::parse(api_base).ok_or_else(|| AuthError::InvalidApiBase(api_base.to_string()))?;
        Ok(Self {
            api,
            credential: Arc::new(RwLock::new(None)),
        })
    }

    pub fn api_host(&self) -> &str {
        &self.api.host
    }

    /// Inspect one outgoing call. `target` may be a full URL or a bare host.
    ///
    /// Returns `true` when the call updated the stored credential.
    pub fn observe<'a, I>(&self, target: &str, headers: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.observe_at(target, headers, Utc::now())
    }

    /// [`observe`](Self::observe) for a call made at `at` rather than now,
    /// e.g. a request recorded in a HAR capture.
    pub fn observe_at<'a, I>(&self, target: &str, headers: I, at: DateTime<Utc>) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        if !Target::parse(target).is_some_and(|t| self.api.accepts(&t)) {
            return false;
        }

        let mut token = None;
        let mut device_id = None;
        for (name, value) in headers {
            if name.eq_ignore_ascii_case("authorization") {
                if let Some(t) = bearer_token(value) {
                    token = Some(t);
                }
            } else if name.eq_ignore_ascii_case("device-id") {
                let value = value.trim();
                if !value.is_empty() {
                    device_id = Some(value);
                }
            }
        }

        let (Some(token), Some(device_id)) = (token, device_id) else {
            return false;
        };

        let credential = Credential::captured_at(token, device_id, at);
        tracing::debug!(host = %self.api.host, ?credential, "Captured catalog credential");
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credential);
        true
    }

    /// The current credential, or `None` when nothing has been captured yet.
    pub fn credential(&self) -> Option<Credential> {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Like [`credential`](Self::credential), but turns "not yet captured"
    /// into [`AuthError::CredentialUnavailable`] and warns on stale values.
    pub fn require(&self) -> Result<Credential, AuthError> {
        let credential = self
            .credential()
            .ok_or_else(|| AuthError::CredentialUnavailable {
                host: self.api.host.clone(),
            })?;
        let now = Utc::now();
        if credential.is_stale(now) {
            tracing::warn!(
                "Captured credential is {} minutes old and may have expired; \
                 reload suno.com to refresh it",
                credential.age(now).num_minutes()
            );
        }
        Ok(credential)
    }
}

/// Lower-cased host and port of a call destination.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    host: String,
    /// `None` for a bare host given without a port, which matches any port.
    port: Option<u16>,
}

impl Target {
    /// Parse a full URL (port defaults from the scheme) or a bare
    /// `host[:port][/path]` string.
    fn parse(target: &str) -> Option<Self> {
        let target = target.trim();
        if target.is_empty() {
            return None;
        }
        let (url, port) = match Url::parse(target).ok().filter(|u| u.has_host()) {
            Some(url) => {
                let port = url.port_or_known_default();
                (url, port)
            }
            None => {
                let url = Url::parse(&format!("https://{target}")).ok()?;
                let port = url.port();
                (url, port)
            }
        };
        let host = url.host_str()?.to_ascii_lowercase();
        Some(Self { host, port })
    }

    fn accepts(&self, other: &Target) -> bool {
        self.host == other.host
            && match (self.port, other.port) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

/// Extract `<token>` from `Bearer <token>` (scheme is case-insensitive).
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, rest) = value.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then_some(token)
}
