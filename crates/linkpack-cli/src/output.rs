//! Formatted output helpers for CLI commands.
//!
//! Human-readable byte counts and abbreviated digests.

use linkpack_common::types::Digest;

/// Hex characters kept by [`short_digest`].
const SHORT_DIGEST_LEN: usize = 12;

/// Formats a byte count into a human-readable string (e.g., "128 MiB").
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Abbreviates a digest to `algorithm:` plus its first hex characters.
#[must_use]
pub fn short_digest(digest: &Digest) -> String {
    let hex = digest.as_hex();
    format!(
        "{}:{}",
        digest.algorithm(),
        &hex[..SHORT_DIGEST_LEN.min(hex.len())]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_displays_bytes() {
        assert_eq!(format_bytes(512), "512 B");
    }

    #[test]
    fn format_bytes_displays_kib() {
        assert_eq!(format_bytes(2048), "2.0 KiB");
    }

    #[test]
    fn format_bytes_displays_mib() {
        assert_eq!(format_bytes(134_217_728), "128.0 MiB");
    }

    #[test]
    fn short_digest_keeps_prefix() {
        let digest = Digest::from_sha256([0x12; 32]);
        assert_eq!(short_digest(&digest), "sha256:121212121212");
    }
}
