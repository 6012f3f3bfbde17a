//! QR challenge values shown on the classroom display.
//!
//! A challenge is `{session_code}-{millis}-{tag}` where `tag` is the first eight
//! hex digits of HMAC-SHA256 over `{session_code}|{millis}`. Each restart issues a
//! new challenge because the timestamp changes.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac, digest::InvalidLength};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const TAG_LEN: usize = 8;

pub fn challenge(
    secret: &str,
    session_code: &str,
    at: DateTime<Utc>,
) -> Result<String, InvalidLength> {
    let millis = at.timestamp_millis();
    let signature = tag(secret, session_code, millis)?;
    Ok(format!("{session_code}-{millis}-{signature}"))
}

/// Compares a submitted challenge, ignoring surrounding whitespace.
pub fn matches(expected: &str, submitted: &str) -> bool {
    expected == submitted.trim()
}

fn tag(secret: &str, session_code: &str, millis: i64) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(session_code.as_bytes());
    mac.update(b"|");
    mac.update(millis.to_string().as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    Ok(digest[..TAG_LEN].to_string())
}
