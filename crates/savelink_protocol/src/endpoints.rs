//! Endpoint path construction.
//!
//! Paths are joined onto a configured base address by the remote
//! client. User-supplied segments (character names, sync keys, scene
//! names) are percent-encoded so they cannot break out of their path
//! segment.

/// Character domain collection endpoint (`POST` create, `GET` list).
pub const CHARACTERS: &str = "characters";
/// Inventory domain save endpoint (`POST`).
pub const INVENTORY: &str = "inventory";
/// Quest domain save endpoint (`POST`).
pub const QUESTS: &str = "quests";
/// Stats domain save endpoint (`POST`).
pub const STATS: &str = "stats";

/// Auth: `POST /login`.
pub const LOGIN: &str = "login";
/// Auth: `POST /register`.
pub const REGISTER: &str = "register";
/// Auth: `POST /refresh`.
pub const REFRESH: &str = "refresh";
/// Auth: `POST /recover-password`.
pub const RECOVER_PASSWORD: &str = "recover-password";
/// Auth: `POST /reset-password`.
pub const RESET_PASSWORD: &str = "reset-password";

/// Returns the `DELETE /characters/{name}` path for a character.
#[must_use]
pub fn character(name: &str) -> String {
    format!("{}/{}", CHARACTERS, encode_segment(name))
}

/// Returns the `GET /inventory/{key}/{scene}` path.
#[must_use]
pub fn inventory_load(key: &str, scene: &str) -> String {
    format!(
        "{}/{}/{}",
        INVENTORY,
        encode_segment(key),
        encode_segment(scene)
    )
}

/// Returns the `GET /quests/{key}` path.
#[must_use]
pub fn quests_load(key: &str) -> String {
    format!("{}/{}", QUESTS, encode_segment(key))
}

/// Returns the `GET /stats/{key}` path.
#[must_use]
pub fn stats_load(key: &str) -> String {
    format!("{}/{}", STATS, encode_segment(key))
}

/// Percent-encodes a string for use as a single path segment.
///
/// Unreserved characters (RFC 3986) pass through; everything else,
/// including `/`, is encoded.
#[must_use]
pub fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}
