//! Tunnel naming and ownership.
//!
//! Sarab's tunnels are recognised on the remote account solely by this name
//! prefix; there is no other tagging mechanism. Keep every prefix check
//! behind [`is_mirage`].

use rand::RngExt;

/// Name prefix marking a tunnel as owned by Sarab.
pub const TUNNEL_NAME_PREFIX: &str = "sarab-";

/// Domain Cloudflare routes tunnel CNAMEs through.
pub const ROUTING_DOMAIN: &str = "cfargotunnel.com";

/// Length of the random name suffix.
const SUFFIX_LEN: usize = 8;

/// Generate a fresh tunnel name: the ownership prefix plus an 8-character
/// random suffix. Collisions are vanishingly unlikely; there is no
/// uniqueness retry.
pub fn mirage_name() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();
    format!("{TUNNEL_NAME_PREFIX}{suffix}")
}

/// Whether a remote tunnel name belongs to Sarab. Exact, case-sensitive
/// prefix match.
pub fn is_mirage(name: &str) -> bool {
    name.starts_with(TUNNEL_NAME_PREFIX)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_carry_prefix_and_suffix() {
        let name = mirage_name();
        assert!(name.starts_with(TUNNEL_NAME_PREFIX));
        assert_eq!(name.len(), TUNNEL_NAME_PREFIX.len() + SUFFIX_LEN);
        assert!(
            name[TUNNEL_NAME_PREFIX.len()..]
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn ownership_check_is_case_sensitive_exact_prefix() {
        assert!(is_mirage("sarab-a1b2c3d4"));
        assert!(!is_mirage("Sarab-a1b2c3d4"));
        assert!(!is_mirage("websarab-a1b2c3d4"));
        assert!(!is_mirage("api-gateway"));
    }
}
