//! Visitor ID, QR payload, and badge number generation.
//!
//! Identifiers combine the wall clock with a short random suffix. They are
//! not guaranteed unique; stores reject a duplicate ID with a conflict.

use chrono::{DateTime, Utc};
use rand::Rng;

const ID_PREFIX: &str = "VIS";
const QR_PREFIX: &str = "VISITDESK";
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

/// `VIS-{unix millis}-{4 random chars}`.
pub fn generate_visitor_id(now: DateTime<Utc>) -> String {
    format!("{ID_PREFIX}-{}-{}", now.timestamp_millis(), random_suffix(4))
}

/// Payload encoded into the badge QR code: `VISITDESK|{id}|{check-in secs}`.
pub fn qr_payload(visitor_id: &str, check_in: DateTime<Utc>) -> String {
    format!("{QR_PREFIX}|{visitor_id}|{}", check_in.timestamp())
}

/// Extract the visitor ID from a scanned QR payload.
pub fn parse_qr_payload(payload: &str) -> Option<&str> {
    let mut parts = payload.trim().splitn(3, '|');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(QR_PREFIX), Some(id), Some(_)) if !id.is_empty() => Some(id),
        _ => None,
    }
}

/// Printed badge number: `B-{last 6 digits of unix secs}{2 random digits}`.
pub fn generate_badge_number(now: DateTime<Utc>) -> String {
    let secs = now.timestamp().rem_euclid(1_000_000);
    let tail: u8 = rand::thread_rng().gen_range(10..100);
    format!("B-{secs:06}{tail}")
}

/// Whether a scanned code looks like a badge number rather than a QR payload.
pub fn is_badge_number(code: &str) -> bool {
    let code = code.trim();
    code.len() == 10
        && code.starts_with("B-")
        && code[2..].bytes().all(|b| b.is_ascii_digit())
}
