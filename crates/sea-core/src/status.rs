//! # Status Codes

use http::StatusCode;

/// Canonical success status every documented path must declare.
pub const OK: u16 = 200;

/// Returns `true` when `code` is a registered HTTP status code.
///
/// Codes in the valid numeric range without a registered reason phrase
/// (e.g. `299`) are rejected.
pub fn is_known_status(code: u64) -> bool {
    u16::try_from(code)
        .ok()
        .and_then(|c| StatusCode::from_u16(c).ok())
        .and_then(|s| s.canonical_reason())
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_codes_are_known() {
        for code in [200, 201, 204, 400, 401, 404, 418, 500, 503] {
            assert!(is_known_status(code), "{code}");
        }
    }

    #[test]
    fn unregistered_codes_are_rejected() {
        for code in [0, 99, 299, 1000, 70_000, u64::MAX] {
            assert!(!is_known_status(code), "{code}");
        }
    }
}
