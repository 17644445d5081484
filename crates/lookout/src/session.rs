//! Session secret management.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use tracing::info;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "lookout_session";

/// Secret that signs session cookies. Rotating it invalidates every cookie
/// issued before the rotation.
#[derive(Debug)]
pub struct SessionKeys {
    secret: RwLock<String>,
    generation: AtomicU64,
}

impl Default for SessionKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionKeys {
    pub fn new() -> Self {
        Self {
            secret: RwLock::new(fresh_secret()),
            generation: AtomicU64::new(0),
        }
    }

    /// Key the session layer signs cookies with. Read it per request; after
    /// [`reset`](Self::reset) it returns the new key.
    pub fn secret(&self) -> String {
        self.secret
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of rotations so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replace the secret.
    pub fn reset(&self) {
        let mut secret = self.secret.write().unwrap_or_else(PoisonError::into_inner);
        *secret = fresh_secret();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!(generation, "Session secret rotated");
    }

    /// `Set-Cookie` value that makes the browser drop its session cookie.
    pub fn expired_cookie() -> String {
        format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", SESSION_COOKIE)
    }
}

fn fresh_secret() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_rotates_secret() {
        let keys = SessionKeys::new();
        let before = keys.secret();
        assert_eq!(before.len(), 64);

        keys.reset();
        assert_ne!(keys.secret(), before);
        assert_eq!(keys.generation(), 1);
    }

    #[test]
    fn test_expired_cookie() {
        let cookie = SessionKeys::expired_cookie();
        assert!(cookie.starts_with("lookout_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
