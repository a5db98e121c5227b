use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn format_sats(sats: u64) -> String {
    const SATS_PER_BTC: u64 = 100_000_000;

    if sats >= SATS_PER_BTC / 100 {
        return format!("{:.4} BTC", sats as f64 / SATS_PER_BTC as f64);
    }

    let digits = sats.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{grouped} sat")
}

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(16) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_owned();
    }

    let mut truncated = label
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    truncated.push('…');
    truncated
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_sats_groups_small_amounts_and_switches_to_btc() {
        assert_eq!(format_sats(0), "0 sat");
        assert_eq!(format_sats(999), "999 sat");
        assert_eq!(format_sats(500_000), "500,000 sat");
        assert_eq!(format_sats(1_000_000), "0.0100 BTC");
        assert_eq!(format_sats(250_000_000), "2.5000 BTC");
    }

    #[test]
    fn truncate_label_appends_ellipsis_only_when_needed() {
        assert_eq!(truncate_label("ACINQ", 16), "ACINQ");
        assert_eq!(truncate_label("a very long node alias", 10), "a very lo…");
        assert_eq!(truncate_label("a very lo…", 10).chars().count(), 10);
    }

    #[test]
    fn short_id_keeps_sixteen_characters() {
        let id = "02aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        assert_eq!(short_id(id), "02aaaaaaaaaaaaaa");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn stable_pair_is_repeatable_and_bounded() {
        let first = stable_pair("peer-1");
        let second = stable_pair("peer-1");
        assert_eq!(first, second);
        assert!((-1.0..=1.0).contains(&first.0));
        assert!((-1.0..=1.0).contains(&first.1));
    }
}
