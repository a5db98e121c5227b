use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1.0,
        })
    }

    fn quadrant(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let dx = if quadrant & 1 == 0 { -quarter } else { quarter };
        let dy = if quadrant & 2 == 0 { -quarter } else { quarter };
        Self {
            center: self.center + vec2(dx, dy),
            half_extent: quarter,
        }
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }
}

pub(super) struct QuadCell {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) members: Vec<usize>,
    pub(super) children: [Option<usize>; 4],
}

impl QuadCell {
    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

/// Barnes-Hut tree stored as a flat arena; cell 0 is the root.
pub(super) struct QuadTree {
    pub(super) cells: Vec<QuadCell>,
}

impl QuadTree {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::enclosing(positions)?;
        let mut tree = Self { cells: Vec::new() };
        tree.insert_cell(bounds, (0..positions.len()).collect(), positions, 0);
        Some(tree)
    }

    fn insert_cell(
        &mut self,
        bounds: QuadBounds,
        members: Vec<usize>,
        positions: &[Vec2],
        depth: usize,
    ) -> usize {
        let mass = members.len() as f32;
        let mut center_of_mass = Vec2::ZERO;
        for &index in &members {
            center_of_mass += positions[index];
        }
        if mass > 0.0 {
            center_of_mass /= mass;
        }

        let cell_index = self.cells.len();
        self.cells.push(QuadCell {
            bounds,
            center_of_mass,
            mass,
            members: Vec::new(),
            children: [None; 4],
        });

        if depth >= MAX_DEPTH || members.len() <= LEAF_CAPACITY {
            self.cells[cell_index].members = members;
            return cell_index;
        }

        let mut buckets: [Vec<usize>; 4] = Default::default();
        for index in members.iter().copied() {
            buckets[bounds.quadrant(positions[index])].push(index);
        }

        // Coincident points never separate; keep them in one leaf.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            self.cells[cell_index].members = members;
            return cell_index;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            let child = self.insert_cell(bounds.child(quadrant), bucket, positions, depth + 1);
            self.cells[cell_index].children[quadrant] = Some(child);
        }
        cell_index
    }

    pub(super) fn root(&self) -> Option<&QuadCell> {
        self.cells.first()
    }
}
