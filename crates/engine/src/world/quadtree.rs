//! Broad-phase spatial index over hitboxed objects.
//!
//! Nodes hold up to [`MAX_OBJECTS`] objects before splitting into four equal quadrants,
//! down to [`MAX_DEPTH`]. An object whose hitbox straddles a node's midline on either
//! axis stays in that node. Queries return a superset of the true collisions; callers
//! filter by exact intersection.

use super::hitbox::{Hitbox, Hitboxed};

pub const MAX_OBJECTS: usize = 256;
pub const MAX_DEPTH: u32 = 8;

/// Child slot order. Split and index lookup share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quadrant {
    NorthEast = 0,
    NorthWest = 1,
    SouthWest = 2,
    SouthEast = 3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Bounds {
    fn mid(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    fn quadrant(&self, quadrant: Quadrant) -> Bounds {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        let (x, y) = match quadrant {
            Quadrant::NorthEast => (self.x + half_w, self.y),
            Quadrant::NorthWest => (self.x, self.y),
            Quadrant::SouthWest => (self.x, self.y + half_h),
            Quadrant::SouthEast => (self.x + half_w, self.y + half_h),
        };
        Bounds {
            x,
            y,
            width: half_w,
            height: half_h,
        }
    }
}

#[derive(Debug)]
struct Node<T> {
    bounds: Bounds,
    depth: u32,
    objects: Vec<T>,
    children: Option<Box<[Node<T>; 4]>>,
}

impl<T: Hitboxed + Clone> Node<T> {
    fn new(bounds: Bounds, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            objects: Vec::new(),
            children: None,
        }
    }

    /// The single quadrant `hitbox` lies strictly inside, if any.
    fn quadrant_of(&self, hitbox: &Hitbox) -> Option<Quadrant> {
        let (mid_x, mid_y) = self.bounds.mid();
        let top = hitbox.bottom() < mid_y;
        let bottom = hitbox.y() >= mid_y;
        let left = hitbox.right() < mid_x;
        let right = hitbox.x() >= mid_x;
        match (top, bottom, left, right) {
            (true, _, _, true) => Some(Quadrant::NorthEast),
            (true, _, true, _) => Some(Quadrant::NorthWest),
            (_, true, true, _) => Some(Quadrant::SouthWest),
            (_, true, _, true) => Some(Quadrant::SouthEast),
            _ => None,
        }
    }

    fn split(&mut self) {
        let depth = self.depth + 1;
        let b = self.bounds;
        self.children = Some(Box::new([
            Node::new(b.quadrant(Quadrant::NorthEast), depth),
            Node::new(b.quadrant(Quadrant::NorthWest), depth),
            Node::new(b.quadrant(Quadrant::SouthWest), depth),
            Node::new(b.quadrant(Quadrant::SouthEast), depth),
        ]));
    }

    fn insert(&mut self, item: T, limits: Limits) {
        let hitbox = item.hitbox();
        if self.children.is_some() {
            if let Some(quadrant) = self.quadrant_of(&hitbox) {
                if let Some(children) = self.children.as_mut() {
                    children[quadrant as usize].insert(item, limits);
                    return;
                }
            }
        }

        self.objects.push(item);
        if self.objects.len() <= limits.max_objects || self.depth >= limits.max_depth {
            return;
        }

        if self.children.is_none() {
            self.split();
        }
        let pending = std::mem::take(&mut self.objects);
        for object in pending {
            match self.quadrant_of(&object.hitbox()) {
                Some(quadrant) => {
                    if let Some(children) = self.children.as_mut() {
                        children[quadrant as usize].insert(object, limits);
                    }
                }
                None => self.objects.push(object),
            }
        }
    }

    fn collect(&self, query: &Hitbox, out: &mut Vec<T>) {
        if let Some(children) = self.children.as_ref() {
            // Descend into every quadrant the query reaches across the midlines. A query
            // that fits one quadrant reaches exactly that one.
            let (mid_x, mid_y) = self.bounds.mid();
            let west = query.x() < mid_x;
            let east = query.right() > mid_x;
            let north = query.y() < mid_y;
            let south = query.bottom() > mid_y;
            for (quadrant, reached) in [
                (Quadrant::NorthEast, north && east),
                (Quadrant::NorthWest, north && west),
                (Quadrant::SouthWest, south && west),
                (Quadrant::SouthEast, south && east),
            ] {
                if reached {
                    children[quadrant as usize].collect(query, out);
                }
            }
        }
        out.extend(self.objects.iter().cloned());
    }

    fn len(&self) -> usize {
        self.objects.len()
            + self
                .children
                .as_ref()
                .map_or(0, |children| children.iter().map(Node::len).sum())
    }

    fn max_depth(&self) -> u32 {
        self.children.as_ref().map_or(self.depth, |children| {
            children.iter().map(Node::max_depth).max().unwrap_or(self.depth)
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_objects: usize,
    max_depth: u32,
}

#[derive(Debug)]
pub struct QuadTree<T> {
    root: Node<T>,
    limits: Limits,
}

impl<T: Hitboxed + Clone> QuadTree<T> {
    pub fn new(bounds: Hitbox) -> Self {
        Self::with_limits(bounds, MAX_OBJECTS, MAX_DEPTH)
    }

    pub fn with_limits(bounds: Hitbox, max_objects: usize, max_depth: u32) -> Self {
        Self {
            root: Node::new(
                Bounds {
                    x: bounds.x(),
                    y: bounds.y(),
                    width: bounds.width(),
                    height: bounds.height(),
                },
                0,
            ),
            limits: Limits {
                max_objects: max_objects.max(1),
                max_depth,
            },
        }
    }

    pub fn insert(&mut self, item: T) {
        self.root.insert(item, self.limits);
    }

    /// Drops every object and collapses the tree back to its root.
    pub fn clear(&mut self) {
        self.root.objects.clear();
        self.root.children = None;
    }

    /// Candidates that may intersect `hitbox`. Never misses a true intersection.
    pub fn possible_collisions(&self, hitbox: &Hitbox) -> Vec<T> {
        let mut out = Vec::new();
        self.root.collect(hitbox, &mut out);
        out
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn depth(&self) -> u32 {
        self.root.max_depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Tagged(usize, Hitbox);

    impl Hitboxed for Tagged {
        fn hitbox(&self) -> Hitbox {
            self.1
        }
    }

    fn hb(x: f64, y: f64, w: f64, h: f64) -> Hitbox {
        Hitbox::new(x, y, w, h).expect("hitbox")
    }

    fn ids(mut items: Vec<Tagged>) -> Vec<usize> {
        let mut ids: Vec<_> = items.drain(..).map(|item| item.0).collect();
        ids.sort_unstable();
        ids
    }

    /// Small deterministic generator so the brute-force comparison is repeatable.
    struct Lcg(u64);

    impl Lcg {
        fn next_f64(&mut self) -> f64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    #[test]
    fn quadrant_lookup_uses_strict_midlines() {
        let node: Node<Tagged> = Node::new(
            Bounds {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            },
            0,
        );
        assert_eq!(
            node.quadrant_of(&hb(6.0, 1.0, 1.0, 1.0)),
            Some(Quadrant::NorthEast)
        );
        assert_eq!(
            node.quadrant_of(&hb(1.0, 1.0, 1.0, 1.0)),
            Some(Quadrant::NorthWest)
        );
        assert_eq!(
            node.quadrant_of(&hb(1.0, 5.0, 1.0, 1.0)),
            Some(Quadrant::SouthWest)
        );
        assert_eq!(
            node.quadrant_of(&hb(5.0, 5.0, 1.0, 1.0)),
            Some(Quadrant::SouthEast)
        );
        // Right edge exactly on the midline is not strictly inside the west half.
        assert_eq!(node.quadrant_of(&hb(4.0, 1.0, 1.0, 1.0)), None);
        assert_eq!(node.quadrant_of(&hb(4.5, 4.5, 1.0, 1.0)), None);
    }

    #[test]
    fn splits_past_capacity_and_keeps_straddlers_at_parent() {
        let mut tree = QuadTree::with_limits(hb(0.0, 0.0, 16.0, 16.0), 2, 4);
        tree.insert(Tagged(0, hb(1.0, 1.0, 1.0, 1.0)));
        tree.insert(Tagged(1, hb(12.0, 12.0, 1.0, 1.0)));
        assert!(tree.root.children.is_none());
        tree.insert(Tagged(2, hb(7.5, 7.5, 1.0, 1.0)));

        assert!(tree.root.children.is_some());
        assert_eq!(ids(tree.root.objects.clone()), vec![2]);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn depth_is_bounded() {
        let mut tree = QuadTree::with_limits(hb(0.0, 0.0, 64.0, 64.0), 1, 3);
        for i in 0..50 {
            tree.insert(Tagged(i, hb(0.1, 0.1, 0.01, 0.01)));
        }
        assert_eq!(tree.len(), 50);
        assert!(tree.depth() <= 3);
    }

    #[test]
    fn clean_query_only_visits_its_quadrant_and_ancestors() {
        let mut tree = QuadTree::with_limits(hb(0.0, 0.0, 16.0, 16.0), 1, 4);
        tree.insert(Tagged(0, hb(1.0, 1.0, 1.0, 1.0)));
        tree.insert(Tagged(1, hb(12.0, 12.0, 1.0, 1.0)));
        tree.insert(Tagged(2, hb(7.5, 0.0, 1.0, 16.0)));

        let found = ids(tree.possible_collisions(&hb(0.5, 0.5, 1.0, 1.0)));
        assert_eq!(found, vec![0, 2]);
    }

    #[test]
    fn straddling_query_reaches_children() {
        let mut tree = QuadTree::with_limits(hb(0.0, 0.0, 16.0, 16.0), 1, 4);
        tree.insert(Tagged(0, hb(6.5, 6.5, 1.0, 1.0)));
        tree.insert(Tagged(1, hb(8.5, 8.5, 1.0, 1.0)));

        let found = ids(tree.possible_collisions(&hb(7.0, 7.0, 2.0, 2.0)));
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn filtered_candidates_match_brute_force() {
        let mut rng = Lcg(0x5eed);
        let mut tree = QuadTree::with_limits(hb(0.0, 0.0, 32.0, 32.0), 4, 6);
        let mut all = Vec::new();
        for id in 0..400 {
            let w = rng.next_f64() * 3.0;
            let h = rng.next_f64() * 3.0;
            let item = Tagged(
                id,
                hb(rng.next_f64() * 34.0 - 1.0, rng.next_f64() * 34.0 - 1.0, w, h),
            );
            tree.insert(item);
            all.push(item);
        }

        for query in all.iter().take(120) {
            let mut fast: Vec<_> = tree
                .possible_collisions(&query.1)
                .into_iter()
                .filter(|item| item.0 != query.0 && item.1.intersects(&query.1))
                .map(|item| item.0)
                .collect();
            fast.sort_unstable();
            let mut brute: Vec<_> = all
                .iter()
                .filter(|item| item.0 != query.0 && item.1.intersects(&query.1))
                .map(|item| item.0)
                .collect();
            brute.sort_unstable();
            assert_eq!(fast, brute, "query {}", query.0);
        }
    }

    #[test]
    fn clear_collapses_tree() {
        let mut tree = QuadTree::with_limits(hb(0.0, 0.0, 8.0, 8.0), 1, 4);
        for i in 0..10 {
            tree.insert(Tagged(i, hb(i as f64 * 0.7, 1.0, 0.2, 0.2)));
        }
        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.root.children.is_none());
        assert!(tree.possible_collisions(&hb(0.0, 0.0, 8.0, 8.0)).is_empty());
    }
}
