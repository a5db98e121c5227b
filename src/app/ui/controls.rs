use eframe::egui::{self, Color32, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::lightning::{GraphSnapshot, hop_color};
use crate::util::truncate_label;

use super::super::physics::REHEAT_ALPHA;
use super::super::{SearchCache, SearchMatch, ViewModel};

const SEARCH_RESULT_LIMIT: usize = 12;
const LEGEND_HOPS: u32 = 5;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

pub(in crate::app) fn search_nodes(
    snapshot: &GraphSnapshot,
    query: &str,
    limit: usize,
) -> Vec<SearchMatch> {
    let query = query.trim();
    if query.is_empty() || limit == 0 {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut matches = snapshot
        .nodes
        .iter()
        .filter_map(|node| {
            let alias_score = fuzzy_match_score(&matcher, &node.alias, query);
            let id_score = fuzzy_match_score(&matcher, &node.id, query);
            let score = alias_score.max(id_score)?;
            Some(SearchMatch {
                id: node.id.clone(),
                alias: node.alias.clone(),
                score,
            })
        })
        .collect::<Vec<_>>();

    matches.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.alias.cmp(&b.alias)));
    matches.truncate(limit);
    matches
}

impl ViewModel {
    fn cached_search_matches(&mut self) -> Vec<SearchMatch> {
        let query = self.search.trim();
        if query.is_empty() {
            return Vec::new();
        }

        if let Some(cached) = &self.search_cache
            && cached.snapshot_revision == self.snapshot_revision
            && cached.query == query
        {
            return cached.matches.clone();
        }

        let matches = search_nodes(&self.snapshot, query, SEARCH_RESULT_LIMIT);
        self.search_cache = Some(SearchCache {
            query: query.to_owned(),
            snapshot_revision: self.snapshot_revision,
            matches: matches.clone(),
        });
        matches
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Explore");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Find node (alias or id)");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Fuzzy search over discovered nodes; click a result to select it.");

        let matches = self.cached_search_matches();
        let mut picked = None;
        if !self.search.trim().is_empty() && matches.is_empty() {
            ui.small("No matching nodes discovered yet.");
        }
        for found in &matches {
            if ui
                .link(truncate_label(&found.alias, 32))
                .on_hover_text(found.id.as_str())
                .clicked()
            {
                picked = Some(found.id.clone());
            }
        }
        if let Some(id) = picked {
            self.set_selected(Some(id));
        }

        if self.selected.is_some() {
            ui.add_space(4.0);
            if ui.button("Clear selection").clicked() {
                self.set_selected(None);
            }
        }

        ui.separator();
        ui.label(RichText::new("Hop distance").strong());
        ui.horizontal_wrapped(|ui| {
            for hop in 0..=LEGEND_HOPS {
                ui.label(RichText::new("●").color(hop_color(hop)));
                let label = if hop == LEGEND_HOPS {
                    format!("{hop}+")
                } else {
                    hop.to_string()
                };
                ui.label(label);
            }
        });
        ui.horizontal(|ui| {
            ui.label(RichText::new("━").color(Color32::from_rgb(247, 178, 72)));
            ui.label("your channels");
            ui.label(RichText::new("━").color(Color32::from_rgb(110, 124, 148)));
            ui.label("gossip");
        });

        ui.separator();
        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Keep simulating layout forces while viewing the graph.");

        ui.collapsing("Physics tuning", |ui| {
            let link_slider = ui
                .add(
                    egui::Slider::new(&mut self.physics.link_scale, 0.2..=3.0)
                        .text("Link strength")
                        .clamping(egui::SliderClamping::Always),
                )
                .on_hover_text("How strongly channel partners pull toward each other.");
            let repulsion_slider = ui
                .add(
                    egui::Slider::new(&mut self.physics.repulsion_scale, 0.2..=4.0)
                        .text("Repulsion")
                        .clamping(egui::SliderClamping::Always),
                )
                .on_hover_text("How strongly nodes push away from each other.");

            if link_slider.changed() || repulsion_slider.changed() {
                self.layout.reheat(REHEAT_ALPHA);
            }
            if ui.button("Shake layout").clicked() {
                self.layout.reheat(1.0);
            }
            ui.small(format!("alpha {:.3}", self.layout.alpha()));
        });
    }
}
