use eframe::egui::{self, Color32, Context, Frame, Id, ProgressBar, Rect, RichText, pos2};

use crate::lightning::{GraphSnapshot, LocalChannel};
use crate::util::{format_sats, short_id, truncate_label};

use super::super::camera::PANEL_WIDTH;
use super::super::{DetailsCache, ViewModel};

const COUNTERPARTY_MAX_CHARS: usize = 28;

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct LocalChannelRow {
    pub channel_id: String,
    pub status: String,
    pub active: bool,
    pub private: bool,
    pub capacity_sats: u64,
    pub local_ratio: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct TopologyChannelRow {
    pub counterparty_id: String,
    pub counterparty_label: String,
    pub capacity_sats: u64,
    pub is_our_channel: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct NodeDetails {
    pub id: String,
    pub alias: String,
    pub color: Color32,
    pub hop_label: String,
    pub local_channels: Vec<LocalChannelRow>,
    pub topology_channels: Vec<TopologyChannelRow>,
    pub explorer_url: Option<String>,
}

pub(in crate::app) fn hop_description(hop: u32) -> String {
    match hop {
        0 => "your node".to_owned(),
        1 => "direct peer".to_owned(),
        n => format!("{n} hops away"),
    }
}

pub(in crate::app) fn build_node_details(
    snapshot: &GraphSnapshot,
    local_channels: &[LocalChannel],
    node_id: &str,
    explorer_url_template: &str,
) -> Option<NodeDetails> {
    let node = snapshot.node(node_id)?;

    let local_channels = local_channels
        .iter()
        .filter(|channel| node.is_our_node || channel.remote_pubkey == node.id)
        .map(|channel| LocalChannelRow {
            channel_id: channel.channel_id.clone(),
            status: channel.status.clone(),
            active: channel.active,
            private: channel.private,
            capacity_sats: channel.capacity_sats(),
            local_ratio: channel.local_ratio(),
        })
        .collect();

    let mut topology_channels = snapshot
        .links
        .iter()
        .filter_map(|link| {
            let other = link.other_end(&node.id)?;
            let counterparty_label = if other == snapshot.local_id {
                "you".to_owned()
            } else {
                snapshot.alias_of(other)
            };
            Some(TopologyChannelRow {
                counterparty_id: other.to_owned(),
                counterparty_label,
                capacity_sats: link.capacity,
                is_our_channel: link.is_our_channel,
            })
        })
        .collect::<Vec<_>>();
    topology_channels.sort_by(|a, b| {
        b.capacity_sats
            .cmp(&a.capacity_sats)
            .then_with(|| a.counterparty_id.cmp(&b.counterparty_id))
    });

    let explorer_url = (!node.is_our_node && !explorer_url_template.is_empty())
        .then(|| explorer_url_template.replace("{id}", &node.id));

    Some(NodeDetails {
        id: node.id.clone(),
        alias: node.alias.clone(),
        color: node.color,
        hop_label: hop_description(node.hop),
        local_channels,
        topology_channels,
        explorer_url,
    })
}

impl ViewModel {
    fn selected_details(&mut self) -> Option<NodeDetails> {
        let selected_id = self.selected.clone()?;

        if let Some(cached) = &self.details_cache
            && cached.selected_id == selected_id
            && cached.snapshot_revision == self.snapshot_revision
        {
            return Some(cached.details.clone());
        }

        let details = build_node_details(
            &self.snapshot,
            &self.channels,
            &selected_id,
            &self.settings.explorer_url_template,
        )?;
        self.details_cache = Some(DetailsCache {
            selected_id,
            snapshot_revision: self.snapshot_revision,
            details: details.clone(),
        });
        Some(details)
    }

    pub(in crate::app) fn draw_details_overlay(&mut self, ctx: &Context, canvas: Rect) {
        let Some(details) = self.selected_details() else {
            return;
        };

        let mut next_selection = None;
        let mut close = false;

        egui::Area::new(Id::new("node_details_overlay"))
            .fixed_pos(pos2(canvas.right() - PANEL_WIDTH, canvas.top()))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                Frame::window(ui.style()).show(ui, |ui| {
                    ui.set_width(PANEL_WIDTH - 16.0);
                    ui.set_max_height(canvas.height() - 16.0);

                    ui.horizontal(|ui| {
                        ui.label(RichText::new("●").color(details.color));
                        ui.label(RichText::new(&details.alias).strong().size(16.0));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("✕").on_hover_text("Close").clicked() {
                                close = true;
                            }
                        });
                    });
                    ui.horizontal(|ui| {
                        ui.monospace(short_id(&details.id)).on_hover_text(&details.id);
                        if ui.small_button("Copy id").clicked() {
                            ui.ctx().copy_text(details.id.clone());
                        }
                    });
                    ui.label(&details.hop_label);
                    if let Some(url) = &details.explorer_url {
                        ui.hyperlink_to("Open in explorer", url);
                    }

                    egui::ScrollArea::vertical()
                        .id_salt("node_details_scroll")
                        .auto_shrink([false, true])
                        .show(ui, |ui| {
                            if !details.local_channels.is_empty() {
                                ui.separator();
                                ui.label(RichText::new("Your channels").strong());
                                for channel in &details.local_channels {
                                    draw_local_channel(ui, channel);
                                }
                            }

                            ui.separator();
                            ui.label(
                                RichText::new(format!(
                                    "Known channels ({})",
                                    details.topology_channels.len()
                                ))
                                .strong(),
                            );
                            if details.topology_channels.is_empty() {
                                ui.label("No channels discovered yet.");
                            }
                            for row in &details.topology_channels {
                                ui.horizontal(|ui| {
                                    let label =
                                        truncate_label(&row.counterparty_label, COUNTERPARTY_MAX_CHARS);
                                    let text = if row.is_our_channel {
                                        RichText::new(label).color(Color32::from_rgb(247, 178, 72))
                                    } else {
                                        RichText::new(label)
                                    };
                                    if ui
                                        .link(text)
                                        .on_hover_text(row.counterparty_id.as_str())
                                        .clicked()
                                    {
                                        next_selection = Some(row.counterparty_id.clone());
                                    }
                                    ui.with_layout(
                                        egui::Layout::right_to_left(egui::Align::Center),
                                        |ui| {
                                            ui.label(format_sats(row.capacity_sats));
                                        },
                                    );
                                });
                            }
                        });
                });
            });

        if close {
            self.set_selected(None);
        } else if let Some(id) = next_selection {
            self.set_selected(Some(id));
        }
    }
}

fn draw_local_channel(ui: &mut egui::Ui, channel: &LocalChannelRow) {
    let status_color = if channel.active {
        Color32::from_rgb(120, 210, 140)
    } else {
        Color32::from_rgb(220, 120, 110)
    };

    ui.horizontal(|ui| {
        ui.label(RichText::new(&channel.status).color(status_color));
        if channel.private {
            ui.small("private");
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(format_sats(channel.capacity_sats));
        });
    });
    ui.add(
        ProgressBar::new(channel.local_ratio)
            .desired_height(6.0)
            .fill(Color32::from_rgb(247, 178, 72)),
    )
    .on_hover_text(format!(
        "{:.0}% local / {:.0}% remote",
        channel.local_ratio * 100.0,
        (1.0 - channel.local_ratio) * 100.0
    ));
    ui.small(short_id(&channel.channel_id));
}

#[cfg(test)]
mod tests {
    use super::super::super::test_support::{local_channel_to_peer, reference_snapshot};
    use super::*;

    const TEMPLATE: &str = "https://explorer.test/node/{id}";

    #[test]
    fn hop_description_names_distance() {
        assert_eq!(hop_description(0), "your node");
        assert_eq!(hop_description(1), "direct peer");
        assert_eq!(hop_description(3), "3 hops away");
    }

    #[test]
    fn local_node_lists_every_local_channel_without_explorer_link() {
        let snapshot = reference_snapshot(false);
        let details =
            build_node_details(&snapshot, &[local_channel_to_peer()], "our-node", TEMPLATE).unwrap();

        assert_eq!(details.hop_label, "your node");
        assert_eq!(details.local_channels.len(), 1);
        assert_eq!(details.local_channels[0].capacity_sats, 1_000_000);
        assert!((details.local_channels[0].local_ratio - 0.6).abs() < 1e-6);
        assert_eq!(details.explorer_url, None);
        assert_eq!(details.topology_channels.len(), 1);
        assert_eq!(details.topology_channels[0].counterparty_label, "Peer One");
    }

    #[test]
    fn peer_channels_sorted_by_capacity_with_you_label() {
        let snapshot = reference_snapshot(false);
        let details =
            build_node_details(&snapshot, &[local_channel_to_peer()], "peer-1", TEMPLATE).unwrap();

        assert_eq!(details.hop_label, "direct peer");
        assert_eq!(details.local_channels.len(), 1);
        let capacities = details
            .topology_channels
            .iter()
            .map(|row| row.capacity_sats)
            .collect::<Vec<_>>();
        assert_eq!(capacities, vec![1_000_000, 500_000]);
        assert_eq!(details.topology_channels[0].counterparty_label, "you");
        assert!(details.topology_channels[0].is_our_channel);
        assert_eq!(
            details.explorer_url.as_deref(),
            Some("https://explorer.test/node/peer-1")
        );
    }

    #[test]
    fn remote_node_has_no_local_channels() {
        let snapshot = reference_snapshot(false);
        let details =
            build_node_details(&snapshot, &[local_channel_to_peer()], "remote-1", TEMPLATE).unwrap();

        assert_eq!(details.hop_label, "2 hops away");
        assert!(details.local_channels.is_empty());
        assert_eq!(details.alias, "remote-1...");
    }

    #[test]
    fn unknown_node_has_no_details() {
        assert!(build_node_details(&reference_snapshot(false), &[], "missing", TEMPLATE).is_none());
    }
}
