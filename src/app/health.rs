use std::collections::HashSet;

use crate::lightning::LocalChannel;

const PART_MAX: f32 = 25.0;
const CAPACITY_TARGET_SATS: f32 = 50_000_000.0;
const PEER_TARGET: f32 = 10.0;
const CHANNEL_TARGET: f32 = 20.0;

/// 0..=100 rating of the local channel set. Capacity, balance symmetry,
/// distinct peers and channel count each contribute up to a quarter.
pub(super) fn health_score(channels: &[LocalChannel]) -> u8 {
    if channels.is_empty() {
        return 0;
    }

    let total_capacity = channels
        .iter()
        .map(LocalChannel::capacity_sats)
        .sum::<u64>() as f32;
    let capacity_part = (total_capacity / CAPACITY_TARGET_SATS * PART_MAX).min(PART_MAX);

    let symmetry_sum = channels
        .iter()
        .map(|channel| {
            let ratio = channel.local_ratio();
            1.0 - (ratio - 0.5).abs() * 2.0
        })
        .sum::<f32>();
    let symmetry_part = (symmetry_sum / channels.len() as f32 * PART_MAX).clamp(0.0, PART_MAX);

    let peers = channels
        .iter()
        .map(|channel| channel.remote_pubkey.as_str())
        .collect::<HashSet<_>>()
        .len() as f32;
    let peer_part = (peers / PEER_TARGET * PART_MAX).min(PART_MAX);

    let count_part = (channels.len() as f32 / CHANNEL_TARGET * PART_MAX).min(PART_MAX);

    (capacity_part + symmetry_part + peer_part + count_part)
        .round()
        .clamp(0.0, 100.0) as u8
}
