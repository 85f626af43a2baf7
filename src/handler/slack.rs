use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::config::Config;
use crate::types::SlackMessage;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_VERSION: &str = "v0";
pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";

/// Replay window in seconds, inclusive. Only past timestamps age.
const MAX_REQUEST_AGE_SECS: i64 = 60 * 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("request timestamp {0:?} is not an integer")]
    InvalidTimestamp(String),
    #[error("request timestamp is {age_secs}s old")]
    StaleRequest { age_secs: i64 },
    #[error("timestamp or signature header is empty")]
    MissingHeaders,
    #[error("signature header is not v0=<hex>")]
    MalformedSignature,
    #[error("signature does not match")]
    SignatureMismatch,
}

/// Checks Slack's `X-Slack-Signature` against the shared signing secret.
///
/// https://api.slack.com/authentication/verifying-requests-from-slack
#[derive(Clone)]
pub struct SlackVerifier {
    signing_secret: Vec<u8>,
}

impl SlackVerifier {
    pub fn new(signing_secret: impl AsRef<[u8]>) -> Self {
        Self {
            signing_secret: signing_secret.as_ref().to_vec(),
        }
    }

    pub fn verify(
        &self,
        timestamp: &str,
        signature: &str,
        raw_body: &[u8],
    ) -> Result<(), VerificationError> {
        self.verify_at(timestamp, signature, raw_body, chrono::Utc::now().timestamp())
    }

    /// Same as [`SlackVerifier::verify`] with `now` given in seconds since the epoch.
    pub fn verify_at(
        &self,
        timestamp: &str,
        signature: &str,
        raw_body: &[u8],
        now: i64,
    ) -> Result<(), VerificationError> {
        let request_time: i64 = timestamp
            .parse()
            .map_err(|_| VerificationError::InvalidTimestamp(timestamp.to_string()))?;

        let age_secs = now.saturating_sub(request_time);
        if age_secs > MAX_REQUEST_AGE_SECS {
            return Err(VerificationError::StaleRequest { age_secs });
        }

        if timestamp.is_empty() || signature.is_empty() {
            return Err(VerificationError::MissingHeaders);
        }

        let provided = signature
            .strip_prefix(SIGNATURE_VERSION)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or(VerificationError::MalformedSignature)?;
        let provided = hex::decode(provided).map_err(|_| VerificationError::MalformedSignature)?;

        // HMAC takes keys of any length, so this only fails in theory
        let mut mac = HmacSha256::new_from_slice(&self.signing_secret)
            .map_err(|_| VerificationError::SignatureMismatch)?;
        mac.update(&base_string(timestamp, raw_body));

        // verify_slice compares in constant time
        mac.verify_slice(&provided)
            .map_err(|_| VerificationError::SignatureMismatch)
    }
}

/// `v0:{timestamp}:{raw body}`, byte for byte.
pub fn base_string(timestamp: &str, raw_body: &[u8]) -> Vec<u8> {
    let mut base = Vec::with_capacity(SIGNATURE_VERSION.len() + timestamp.len() + raw_body.len() + 2);
    base.extend_from_slice(SIGNATURE_VERSION.as_bytes());
    base.push(b':');
    base.extend_from_slice(timestamp.as_bytes());
    base.push(b':');
    base.extend_from_slice(raw_body);
    base
}

pub fn format_slack_message(text: impl Into<String>, config: &Config) -> SlackMessage {
    SlackMessage {
        response_type: config.response_type.clone(),
        text: text.into(),
        unfurl_links: config.unfurl_links,
    }
}
