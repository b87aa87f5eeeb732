use sha2::{Digest, Sha256};

pub const DEFAULT_AVATAR_SIZE: u32 = 150;

const GRAVATAR_BASE: &str = "https://secure.gravatar.com/avatar";
const MYSTERY_PERSON_HASH: &str = "5cf23001579ee91aff54a2dcd6e5acc9";

/// Gravatar URL for a commenter's email, or the mystery-person avatar when
/// there is no usable email.
pub fn gravatar_url(email: Option<&str>, size: u32) -> String {
    let hash = match email.map(|email| email.trim().to_lowercase()) {
        Some(email) if !email.is_empty() => hex::encode(Sha256::digest(email.as_bytes())),
        _ => MYSTERY_PERSON_HASH.to_string(),
    };

    format!("{GRAVATAR_BASE}/{hash}?s={size}&d=mm&r=g")
}
