use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use eframe::egui::Color32;
use serde_json::Value;

const ENDPOINT_FIELDS: [(&str, &str); 5] = [
    ("node1_pub", "node2_pub"),
    ("node1Pub", "node2Pub"),
    ("source", "destination"),
    ("node_one", "node_two"),
    ("nodeId1", "nodeId2"),
];

const CAPACITY_SAT_FIELDS: [&str; 5] = [
    "capacity",
    "capacity_sat",
    "capacity_sats",
    "satoshis",
    "amount_sat",
];

const CAPACITY_MSAT_FIELDS: [&str; 2] = ["capacity_msat", "amount_msat"];

const POLICY_FIELDS: [&str; 6] = [
    "node1_policy",
    "node2_policy",
    "node1Policy",
    "node2Policy",
    "one_to_two",
    "two_to_one",
];

const HTLC_MAX_FIELDS: [&str; 4] = [
    "max_htlc_msat",
    "maxHtlcMsat",
    "htlc_maximum_msat",
    "htlcMaximumMsat",
];

const SHORT_ID_FIELDS: [&str; 3] = ["short_channel_id", "shortChannelId", "scid"];
const NUMERIC_ID_FIELDS: [&str; 3] = ["channel_id", "channelId", "chan_id"];
const STRING_ID_FIELDS: [&str; 3] = ["id", "chan_point", "channelPoint"];

const NODE_ID_FIELDS: [&str; 5] = ["pub_key", "pubKey", "node_id", "nodeId", "id"];
const NODE_ALIAS_FIELDS: [&str; 4] = ["alias", "Alias", "node_alias", "nodeAlias"];

const HOP_PALETTE: [Color32; 6] = [
    Color32::from_rgb(247, 147, 26),
    Color32::from_rgb(59, 130, 246),
    Color32::from_rgb(16, 185, 129),
    Color32::from_rgb(139, 92, 246),
    Color32::from_rgb(236, 72, 153),
    Color32::from_rgb(107, 114, 128),
];

const PLACEHOLDER_ID_CHARS: usize = 8;

fn field<'a>(raw: &'a Value, name: &str) -> Option<&'a Value> {
    raw.as_object()?.get(name).filter(|value| !value.is_null())
}

fn text_field(raw: &Value, name: &str) -> Option<String> {
    match field(raw, name)? {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn first_text(raw: &Value, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| text_field(raw, name))
}

/// Reads an unsigned amount from a number, a numeric string, or the
/// `"1000msat"` / `"1000sat"` suffix forms some backends emit.
fn amount_field(raw: &Value, name: &str) -> Option<u64> {
    match field(raw, name)? {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64)),
        Value::String(text) => {
            let digits = text
                .trim()
                .trim_end_matches("msat")
                .trim_end_matches("sat");
            digits.parse::<u64>().ok()
        }
        _ => None,
    }
}

pub fn endpoints(raw: &Value) -> Option<(String, String)> {
    let first = ENDPOINT_FIELDS
        .iter()
        .find_map(|(name, _)| text_field(raw, name))?;
    let second = ENDPOINT_FIELDS
        .iter()
        .find_map(|(_, name)| text_field(raw, name))?;

    if first == second {
        return None;
    }
    Some((first, second))
}

pub fn capacity(raw: &Value) -> u64 {
    if let Some(sats) = CAPACITY_SAT_FIELDS
        .iter()
        .find_map(|name| amount_field(raw, name))
    {
        return sats;
    }

    if let Some(msat) = CAPACITY_MSAT_FIELDS
        .iter()
        .find_map(|name| amount_field(raw, name))
    {
        return msat / 1000;
    }

    let top_level = HTLC_MAX_FIELDS
        .iter()
        .filter_map(|name| amount_field(raw, name));
    let per_policy = POLICY_FIELDS
        .iter()
        .filter_map(|policy| field(raw, policy))
        .flat_map(|policy| {
            HTLC_MAX_FIELDS
                .iter()
                .filter_map(move |name| amount_field(policy, name))
        });

    top_level
        .chain(per_policy)
        .max()
        .map(|msat| msat / 1000)
        .unwrap_or(0)
}

pub fn channel_id(raw: &Value) -> String {
    if let Some(id) = first_text(raw, &SHORT_ID_FIELDS)
        .or_else(|| first_text(raw, &NUMERIC_ID_FIELDS))
        .or_else(|| first_text(raw, &STRING_ID_FIELDS))
    {
        return id;
    }

    if let Some((first, second)) = endpoints(raw) {
        return format!("{first}-{second}");
    }

    let serialized = serde_json::to_string(raw).unwrap_or_default();
    let mut hasher = DefaultHasher::new();
    serialized.hash(&mut hasher);
    format!("raw-{:016x}", hasher.finish())
}

pub fn hop_color(hop: u32) -> Color32 {
    let index = (hop as usize).min(HOP_PALETTE.len() - 1);
    HOP_PALETTE[index]
}

pub fn node_id(raw: &Value) -> Option<String> {
    first_text(raw, &NODE_ID_FIELDS)
}

pub fn node_alias(raw: &Value) -> Option<String> {
    first_text(raw, &NODE_ALIAS_FIELDS)
}

pub fn placeholder_alias(id: &str) -> String {
    let prefix = id.chars().take(PLACEHOLDER_ID_CHARS).collect::<String>();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn endpoints_follow_field_precedence() {
        let lnd = json!({"node1_pub": "a", "node2_pub": "b", "source": "x", "destination": "y"});
        assert_eq!(endpoints(&lnd), Some(("a".into(), "b".into())));

        let cln = json!({"source": "x", "destination": "y"});
        assert_eq!(endpoints(&cln), Some(("x".into(), "y".into())));

        let camel = json!({"node1Pub": "c", "node2Pub": "d"});
        assert_eq!(endpoints(&camel), Some(("c".into(), "d".into())));
    }

    #[test]
    fn endpoints_require_two_distinct_ids() {
        assert_eq!(endpoints(&json!({"node1_pub": "a"})), None);
        assert_eq!(endpoints(&json!({"node1_pub": "a", "node2_pub": ""})), None);
        assert_eq!(endpoints(&json!({"source": "a", "destination": "a"})), None);
        assert_eq!(endpoints(&json!("not an object")), None);
    }

    #[test]
    fn capacity_reads_sats_strings_and_msat_fields() {
        assert_eq!(capacity(&json!({"capacity": "1000000"})), 1_000_000);
        assert_eq!(capacity(&json!({"satoshis": 500_000})), 500_000);
        assert_eq!(capacity(&json!({"amount_msat": "250000000msat"})), 250_000);
        assert_eq!(capacity(&json!({"capacity_msat": 2_000_000})), 2_000);
    }

    #[test]
    fn capacity_falls_back_to_largest_htlc_limit() {
        let raw = json!({
            "node1_policy": {"max_htlc_msat": "990000000"},
            "node2_policy": {"max_htlc_msat": "1500000000"},
        });
        assert_eq!(capacity(&raw), 1_500_000);

        let cln = json!({"htlc_maximum_msat": 300_000_000});
        assert_eq!(capacity(&cln), 300_000);

        assert_eq!(capacity(&json!({})), 0);
        assert_eq!(capacity(&json!(null)), 0);
        assert_eq!(capacity(&json!({"capacity": {"nested": true}})), 0);
    }

    #[test]
    fn channel_id_prefers_short_id_then_numeric_then_string() {
        let raw = json!({"short_channel_id": "800000x1x0", "channel_id": "123", "id": "abc"});
        assert_eq!(channel_id(&raw), "800000x1x0");

        let raw = json!({"channel_id": 880_000_123u64, "chan_point": "tx:0"});
        assert_eq!(channel_id(&raw), "880000123");

        let raw = json!({"chan_point": "tx:1", "node1_pub": "a", "node2_pub": "b"});
        assert_eq!(channel_id(&raw), "tx:1");

        let raw = json!({"node1_pub": "a", "node2_pub": "b"});
        assert_eq!(channel_id(&raw), "a-b");
    }

    #[test]
    fn channel_id_is_stable_for_malformed_records() {
        let empty = json!({});
        let first = channel_id(&empty);
        assert!(!first.is_empty());
        assert_eq!(first, channel_id(&json!({})));

        let junk = json!({"weird": [1, 2, 3], "other": {"a": null}});
        assert_eq!(channel_id(&junk), channel_id(&junk.clone()));
        assert_ne!(channel_id(&junk), first);
        assert!(channel_id(&junk).starts_with("raw-"));
    }

    #[test]
    fn hop_color_clamps_to_last_palette_entry() {
        assert_eq!(hop_color(0), HOP_PALETTE[0]);
        assert_eq!(hop_color(2), HOP_PALETTE[2]);
        assert_eq!(hop_color(5), HOP_PALETTE[5]);
        assert_eq!(hop_color(42), HOP_PALETTE[5]);
    }

    #[test]
    fn node_fields_ignore_empty_aliases() {
        let record = json!({"pub_key": "02ab", "alias": ""});
        assert_eq!(node_id(&record), Some("02ab".into()));
        assert_eq!(node_alias(&record), None);

        let record = json!({"nodeId": "03cd", "nodeAlias": "bitrefill"});
        assert_eq!(node_id(&record), Some("03cd".into()));
        assert_eq!(node_alias(&record), Some("bitrefill".into()));
    }

    #[test]
    fn placeholder_alias_truncates_the_id() {
        assert_eq!(placeholder_alias("0123456789abcdef"), "01234567...");
        assert_eq!(placeholder_alias("abc"), "abc...");
    }
}
