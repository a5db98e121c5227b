use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use super::graph::{LocalChannel, LocalNode};

#[derive(Clone, Debug, Deserialize)]
struct RawLocalNode {
    #[serde(alias = "pub_key", alias = "pubKey", alias = "identity_pubkey", alias = "id")]
    pubkey: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    port: u16,
}

#[derive(Clone, Debug, Deserialize)]
struct RawLocalChannel {
    #[serde(
        default,
        alias = "chan_id",
        alias = "channelId",
        alias = "short_channel_id",
        alias = "id"
    )]
    channel_id: Option<Value>,
    #[serde(alias = "remotePubkey", alias = "peer_id", alias = "remote_node_id")]
    remote_pubkey: String,
    #[serde(default, alias = "localBalanceMsat", alias = "to_us_msat")]
    local_balance_msat: Option<Value>,
    #[serde(default, alias = "remoteBalanceMsat")]
    remote_balance_msat: Option<Value>,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default, alias = "state")]
    status: Option<String>,
    #[serde(default)]
    private: bool,
}

#[derive(Clone, Debug, Deserialize)]
struct RawLocalFile {
    #[serde(alias = "info")]
    node: RawLocalNode,
    #[serde(default)]
    channels: Vec<RawLocalChannel>,
}

fn default_active() -> bool {
    true
}

fn msat_value(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(number)) => number.as_u64().unwrap_or(0),
        Some(Value::String(text)) => text
            .trim()
            .trim_end_matches("msat")
            .parse::<u64>()
            .unwrap_or(0),
        _ => 0,
    }
}

fn id_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub fn parse_local_state(raw: &str) -> Result<(LocalNode, Vec<LocalChannel>)> {
    let parsed: RawLocalFile =
        serde_json::from_str(raw).context("invalid JSON in local node file")?;

    let pubkey = parsed.node.pubkey.trim().to_owned();
    if pubkey.is_empty() {
        return Err(anyhow!("local node file has an empty node pubkey"));
    }

    let node = LocalNode {
        pubkey,
        address: parsed.node.address,
        port: parsed.node.port,
    };

    let channels = parsed
        .channels
        .into_iter()
        .filter(|channel| !channel.remote_pubkey.trim().is_empty())
        .map(|channel| {
            let remote_pubkey = channel.remote_pubkey.trim().to_owned();
            let channel_id = id_value(channel.channel_id.as_ref())
                .unwrap_or_else(|| format!("{}-{remote_pubkey}", node.pubkey));
            let status = channel.status.unwrap_or_else(|| {
                if channel.active {
                    "active".to_owned()
                } else {
                    "inactive".to_owned()
                }
            });

            LocalChannel {
                channel_id,
                local_balance_msat: msat_value(channel.local_balance_msat.as_ref()),
                remote_balance_msat: msat_value(channel.remote_balance_msat.as_ref()),
                remote_pubkey,
                active: channel.active,
                status,
                private: channel.private,
            }
        })
        .collect();

    Ok((node, channels))
}

pub fn load_local_state(path: &Path) -> Result<(LocalNode, Vec<LocalChannel>)> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read local node file {}", path.display()))?;
    parse_local_state(&raw)
        .with_context(|| format!("failed to parse local node file {}", path.display()))
}
