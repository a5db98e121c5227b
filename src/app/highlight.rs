use std::collections::HashSet;

use crate::lightning::GraphSnapshot;

pub(super) struct HighlightState {
    pub(super) selected: String,
    pub(super) neighbors: HashSet<String>,
    pub(super) links: HashSet<String>,
}

impl HighlightState {
    pub(super) fn contains(&self, node_id: &str) -> bool {
        self.selected == node_id || self.neighbors.contains(node_id)
    }

    pub(super) fn is_neighbor(&self, node_id: &str) -> bool {
        self.neighbors.contains(node_id)
    }

    pub(super) fn touches_link(&self, link_id: &str) -> bool {
        self.links.contains(link_id)
    }

    pub(super) fn node_ids(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(self.selected.as_str()).chain(self.neighbors.iter().map(String::as_str))
    }
}

pub(super) fn build_highlight_state(
    snapshot: &GraphSnapshot,
    selected_id: &str,
) -> Option<HighlightState> {
    snapshot.node(selected_id)?;

    let mut neighbors = HashSet::new();
    let mut links = HashSet::new();
    for link in &snapshot.links {
        let Some(other) = link.other_end(selected_id) else {
            continue;
        };
        links.insert(link.id.clone());
        if other != selected_id {
            neighbors.insert(other.to_owned());
        }
    }

    Some(HighlightState {
        selected: selected_id.to_owned(),
        neighbors,
        links,
    })
}
