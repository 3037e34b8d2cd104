#![warn(clippy::all, clippy::pedantic)]

//! Telegram Mini App launch-payload verification.
//!
//! A launch payload (`initData`) is an URL-encoded list of `key=value`
//! pairs carrying a `hash` field. The hash is HMAC-SHA256 over the
//! remaining pairs, sorted by key and joined with newlines, keyed by
//! HMAC-SHA256("WebAppData", bot_token). Verification failure means
//! "unauthenticated", never a panic.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// The authenticated external user identity derived from a valid payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub external_id: i64,
    pub display_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramUser {
    id: i64,
    first_name: String,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

/// Verifies a signed `initData` payload against the bot token and
/// extracts the embedded user identity.
pub fn verify_init_data(init_data: &str, bot_token: &str) -> Result<PlayerIdentity, AuthError> {
    let mut fields = parse_query(init_data)?;

    let hash_index = fields
        .iter()
        .position(|(key, _)| key == "hash")
        .ok_or(AuthError::MissingHash)?;
    let (_, supplied_hash) = fields.remove(hash_index);
    let supplied = decode_hex(&supplied_hash).ok_or(AuthError::MalformedHash)?;

    fields.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    let check_string = fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n");

    let candidate = sign_check_string(&check_string, bot_token);
    if !bool::from(candidate.as_slice().ct_eq(supplied.as_slice())) {
        return Err(AuthError::SignatureMismatch);
    }

    let user_json = fields
        .iter()
        .find(|(key, _)| key == "user")
        .map(|(_, value)| value.as_str())
        .ok_or(AuthError::MissingUser)?;
    let user: TelegramUser = serde_json::from_str(user_json).map_err(AuthError::MalformedUser)?;

    let display_name = match &user.last_name {
        Some(last) if !last.is_empty() => format!("{} {last}", user.first_name),
        _ => user.first_name.clone(),
    };

    Ok(PlayerIdentity {
        external_id: user.id,
        display_name,
        username: user.username,
    })
}

/// HMAC chain from Telegram's documentation: the bot token signed with
/// the literal key "WebAppData" yields the secret that signs the check
/// string.
pub(crate) fn sign_check_string(check_string: &str, bot_token: &str) -> [u8; 32] {
    let mut secret_mac =
        HmacSha256::new_from_slice(b"WebAppData").expect("hmac accepts any key length");
    secret_mac.update(bot_token.as_bytes());
    let secret = secret_mac.finalize().into_bytes();

    let mut mac = HmacSha256::new_from_slice(&secret).expect("hmac accepts any key length");
    mac.update(check_string.as_bytes());
    mac.finalize().into_bytes()[..]
        .try_into()
        .expect("hmac-sha256 digest length")
}

/// Splits a query string into decoded `(key, value)` pairs, preserving
/// input order.
fn parse_query(raw: &str) -> Result<Vec<(String, String)>, AuthError> {
    let mut fields = Vec::new();
    for pair in raw.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| AuthError::MalformedPayload(format!("field without '=': {pair}")))?;
        let key = percent_decode(key)
            .ok_or_else(|| AuthError::MalformedPayload(format!("bad escape in key {key}")))?;
        let value = percent_decode(value)
            .ok_or_else(|| AuthError::MalformedPayload(format!("bad escape in value of {key}")))?;
        fields.push((key, value));
    }
    if fields.is_empty() {
        return Err(AuthError::MalformedPayload("empty payload".into()));
    }
    Ok(fields)
}

/// Decodes `%XX` escapes and `+` as space. Returns `None` on truncated or
/// non-hex escapes and on invalid UTF-8.
fn percent_decode(component: &str) -> Option<String> {
    let bytes = component.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hi = hex_value(*bytes.get(i + 1)?)?;
                let lo = hex_value(*bytes.get(i + 2)?)?;
                out.push((hi << 4) | lo);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8(out).ok()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Decodes a 64-character hex digest.
fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() != 64 {
        return None;
    }
    let bytes = hex.as_bytes();
    let mut out = Vec::with_capacity(32);
    for chunk in bytes.chunks_exact(2) {
        out.push((hex_value(chunk[0])? << 4) | hex_value(chunk[1])?);
    }
    Some(out)
}

pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    use fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[derive(Debug)]
pub enum AuthError {
    MissingHash,
    MalformedHash,
    SignatureMismatch,
    MissingUser,
    MalformedPayload(String),
    MalformedUser(serde_json::Error),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingHash => write!(f, "payload has no hash field"),
            AuthError::MalformedHash => write!(f, "hash field is not a hex sha-256 digest"),
            AuthError::SignatureMismatch => write!(f, "payload signature does not match"),
            AuthError::MissingUser => write!(f, "payload has no user field"),
            AuthError::MalformedPayload(reason) => write!(f, "malformed payload: {reason}"),
            AuthError::MalformedUser(err) => write!(f, "malformed user field: {err}"),
        }
    }
}

impl std::error::Error for AuthError {}
