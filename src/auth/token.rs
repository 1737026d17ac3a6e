use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::OffsetDateTime;
use tracing::debug;

use crate::config::TokenConfig;

type HmacSha256 = Hmac<Sha256>;

/// Mints opaque session tokens. Tokens are not stored and never verified
/// anywhere in this service; they carry no expiry.
#[derive(Clone)]
pub struct SessionSigner {
    secret: String,
}

impl From<&TokenConfig> for SessionSigner {
    fn from(cfg: &TokenConfig) -> Self {
        Self {
            secret: cfg.secret.clone(),
        }
    }
}

impl SessionSigner {
    pub fn issue(&self, user_id: i32, email: &str) -> anyhow::Result<String> {
        self.issue_at(user_id, email, OffsetDateTime::now_utc())
    }

    /// Hex HMAC-SHA256 over `"{user_id}:{email}:{seconds}.{micros}"`.
    pub fn issue_at(
        &self,
        user_id: i32,
        email: &str,
        at: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let payload = format!(
            "{}:{}:{}.{:06}",
            user_id,
            email,
            at.unix_timestamp(),
            at.microsecond()
        );
        let token = self.sign(payload.as_bytes())?;
        debug!(user_id, "session token issued");
        Ok(token)
    }

    fn sign(&self, payload: &[u8]) -> anyhow::Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| anyhow::anyhow!("hmac key: {e}"))?;
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn signer(secret: &str) -> SessionSigner {
        SessionSigner::from(&TokenConfig {
            secret: secret.into(),
        })
    }

    #[test]
    fn sign_matches_rfc4231_vector() {
        let token = signer("Jefe")
            .sign(b"what do ya want for nothing?")
            .expect("sign");
        assert_eq!(
            token,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn same_inputs_same_token() {
        let at = datetime!(2024-05-01 12:00:00.250 UTC);
        let s = signer("dev-secret");
        let a = s.issue_at(7, "a@b.com", at).expect("issue");
        let b = s.issue_at(7, "a@b.com", at).expect("issue");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn token_binds_user_time_and_secret() {
        let at = datetime!(2024-05-01 12:00:00 UTC);
        let s = signer("dev-secret");
        let base = s.issue_at(7, "a@b.com", at).expect("issue");

        assert_ne!(base, s.issue_at(8, "a@b.com", at).expect("issue"));
        assert_ne!(base, s.issue_at(7, "c@d.com", at).expect("issue"));
        assert_ne!(
            base,
            s.issue_at(7, "a@b.com", datetime!(2024-05-01 12:00:00.000001 UTC))
                .expect("issue")
        );
        assert_ne!(
            base,
            signer("other").issue_at(7, "a@b.com", at).expect("issue")
        );
    }

    #[test]
    fn payload_uses_fractional_seconds() {
        let at = datetime!(2024-05-01 00:00:00.5 UTC);
        let expected = signer("k")
            .sign(format!("1:a@b.com:{}.500000", at.unix_timestamp()).as_bytes())
            .expect("sign");
        assert_eq!(signer("k").issue_at(1, "a@b.com", at).expect("issue"), expected);
    }
}
