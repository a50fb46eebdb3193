use chrono::Utc;
use rand::Rng;
use sltb_database::types::ApplicationKind;

/// How many fresh reference numbers a submission tries before giving up.
pub const MAX_REFERENCE_ATTEMPTS: usize = 5;

const RANDOM_SEGMENT_LEN: usize = 8;
const RANDOM_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// `SLTB-<TAG>-` followed by the low 8 digits of the millisecond clock and
/// 8 random characters from `[A-Z0-9]`.
pub fn generate_reference_no(kind: ApplicationKind) -> String {
    let clock = Utc::now().timestamp_millis().rem_euclid(100_000_000);
    let mut rng = rand::thread_rng();
    let random: String = (0..RANDOM_SEGMENT_LEN)
        .map(|_| RANDOM_ALPHABET[rng.gen_range(0..RANDOM_ALPHABET.len())] as char)
        .collect();
    format!("SLTB-{}-{:08}{}", kind.reference_tag(), clock, random)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_carries_kind_tag() {
        assert!(generate_reference_no(ApplicationKind::Planting).starts_with("SLTB-PLANT-"));
        assert!(generate_reference_no(ApplicationKind::Replanting).starts_with("SLTB-REPLANT-"));
    }

    #[test]
    fn reference_suffix_shape() {
        let reference_no = generate_reference_no(ApplicationKind::Planting);
        let suffix = reference_no.trim_start_matches("SLTB-PLANT-");
        assert_eq!(suffix.len(), 16);
        assert!(suffix[..8].chars().all(|c| c.is_ascii_digit()));
        assert!(suffix[8..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn consecutive_references_differ() {
        let first = generate_reference_no(ApplicationKind::Replanting);
        let second = generate_reference_no(ApplicationKind::Replanting);
        assert_ne!(first, second);
    }
}
