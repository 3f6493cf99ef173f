use std::collections::HashMap;
use std::hash::Hash;

use super::hitbox::{Hitbox, Hitboxed};
use super::quadtree::QuadTree;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tracked<K> {
    key: K,
    hitbox: Hitbox,
}

impl<K> Hitboxed for Tracked<K> {
    fn hitbox(&self) -> Hitbox {
        self.hitbox
    }
}

/// Tracks keyed hitboxes and answers exact collision queries through a lazily rebuilt
/// [`QuadTree`].
///
/// Every mutation bumps a generation counter; a query rebuilds the tree first when the
/// built generation is stale. Queries take `&mut self`, so a rebuild can never overlap
/// another reader.
#[derive(Debug)]
pub struct HitboxManager<K> {
    bounds: Hitbox,
    objects: Vec<Tracked<K>>,
    /// Position of each key in `objects`.
    index: HashMap<K, usize>,
    tree: QuadTree<Tracked<K>>,
    generation: u64,
    built_generation: Option<u64>,
    rebuilds: u64,
}

impl<K: Copy + Eq + Hash> HitboxManager<K> {
    pub fn new(bounds: Hitbox) -> Self {
        Self {
            bounds,
            objects: Vec::new(),
            index: HashMap::new(),
            tree: QuadTree::new(bounds),
            generation: 0,
            built_generation: None,
            rebuilds: 0,
        }
    }

    pub fn bounds(&self) -> Hitbox {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.built_generation != Some(self.generation)
    }

    /// Number of tree rebuilds performed so far.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Tracks `key` at `hitbox`, replacing any previous entry for the same key.
    pub fn add(&mut self, key: K, hitbox: Hitbox) {
        match self.index.get(&key) {
            Some(&slot) => self.objects[slot].hitbox = hitbox,
            None => {
                self.index.insert(key, self.objects.len());
                self.objects.push(Tracked { key, hitbox });
            }
        }
        self.invalidate();
    }

    /// Moves an already tracked key. Returns `false` when the key is unknown.
    pub fn update(&mut self, key: K, hitbox: Hitbox) -> bool {
        let Some(&slot) = self.index.get(&key) else {
            return false;
        };
        let tracked = &mut self.objects[slot];
        if tracked.hitbox != hitbox {
            tracked.hitbox = hitbox;
            self.invalidate();
        }
        true
    }

    pub fn remove(&mut self, key: K) -> bool {
        let Some(slot) = self.index.remove(&key) else {
            return false;
        };
        self.objects.remove(slot);
        for (shifted, tracked) in self.objects.iter().enumerate().skip(slot) {
            self.index.insert(tracked.key, shifted);
        }
        self.invalidate();
        true
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.index.clear();
        self.invalidate();
    }

    pub fn hitbox_of(&self, key: K) -> Option<Hitbox> {
        self.index.get(&key).map(|&slot| self.objects[slot].hitbox)
    }

    fn ensure_built(&mut self) {
        if !self.is_dirty() {
            return;
        }
        self.tree.clear();
        for tracked in &self.objects {
            self.tree.insert(*tracked);
        }
        self.built_generation = Some(self.generation);
        self.rebuilds = self.rebuilds.saturating_add(1);
    }

    /// Every tracked key whose hitbox intersects `key`'s hitbox, excluding `key` itself.
    pub fn all_collisions_of(&mut self, key: K) -> Vec<K> {
        match self.hitbox_of(key) {
            Some(hitbox) => self.collisions_with(&hitbox, Some(key)),
            None => Vec::new(),
        }
    }

    /// Every tracked key whose hitbox intersects `hitbox`, optionally skipping one key.
    pub fn collisions_with(&mut self, hitbox: &Hitbox, exclude: Option<K>) -> Vec<K> {
        self.ensure_built();
        let mut hits: Vec<K> = Vec::new();
        for candidate in self.tree.possible_collisions(hitbox) {
            if Some(candidate.key) == exclude || !candidate.hitbox.intersects(hitbox) {
                continue;
            }
            if !hits.contains(&candidate.key) {
                hits.push(candidate.key);
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hb(x: f64, y: f64, w: f64, h: f64) -> Hitbox {
        Hitbox::new(x, y, w, h).expect("hitbox")
    }

    fn sorted(mut keys: Vec<u32>) -> Vec<u32> {
        keys.sort_unstable();
        keys
    }

    #[test]
    fn mutations_mark_dirty_and_queries_rebuild_once() {
        let mut manager = HitboxManager::new(hb(0.0, 0.0, 10.0, 10.0));
        manager.add(1u32, hb(0.0, 0.0, 1.0, 1.0));
        manager.add(2, hb(0.5, 0.5, 1.0, 1.0));
        assert!(manager.is_dirty());

        assert_eq!(manager.all_collisions_of(1), vec![2]);
        assert!(!manager.is_dirty());
        assert_eq!(manager.rebuild_count(), 1);

        assert_eq!(manager.all_collisions_of(1), vec![2]);
        assert_eq!(manager.rebuild_count(), 1);

        manager.remove(2);
        assert!(manager.is_dirty());
        assert!(manager.all_collisions_of(1).is_empty());
        assert_eq!(manager.rebuild_count(), 2);
    }

    #[test]
    fn query_excludes_self_and_non_intersecting() {
        let mut manager = HitboxManager::new(hb(0.0, 0.0, 10.0, 10.0));
        manager.add(1u32, hb(2.0, 2.0, 1.0, 1.0));
        manager.add(2, hb(3.0, 2.0, 1.0, 1.0));
        manager.add(3, hb(2.5, 2.5, 1.0, 1.0));
        assert_eq!(sorted(manager.all_collisions_of(1)), vec![3]);
        assert_eq!(sorted(manager.all_collisions_of(3)), vec![1, 2]);
        assert!(manager.all_collisions_of(99).is_empty());
    }

    #[test]
    fn update_moves_object_and_unchanged_update_keeps_cache() {
        let mut manager = HitboxManager::new(hb(0.0, 0.0, 10.0, 10.0));
        manager.add(1u32, hb(0.0, 0.0, 1.0, 1.0));
        manager.add(2, hb(5.0, 5.0, 1.0, 1.0));
        assert!(manager.all_collisions_of(1).is_empty());

        assert!(manager.update(1, hb(1.0, 1.0, 1.0, 1.0)));
        assert!(manager.is_dirty());
        assert!(manager.all_collisions_of(1).is_empty());
        assert!(manager.update(1, hb(4.5, 4.5, 1.0, 1.0)));
        assert_eq!(manager.all_collisions_of(1), vec![2]);

        let rebuilds = manager.rebuild_count();
        assert!(manager.update(1, hb(4.5, 4.5, 1.0, 1.0)));
        assert!(!manager.is_dirty());
        manager.all_collisions_of(1);
        assert_eq!(manager.rebuild_count(), rebuilds);
        assert!(!manager.update(42, hb(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn add_with_existing_key_replaces_entry() {
        let mut manager = HitboxManager::new(hb(0.0, 0.0, 10.0, 10.0));
        manager.add(1u32, hb(0.0, 0.0, 1.0, 1.0));
        manager.add(1, hb(3.0, 3.0, 1.0, 1.0));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.hitbox_of(1), Some(hb(3.0, 3.0, 1.0, 1.0)));
    }

    #[test]
    fn exact_results_match_brute_force_for_large_objects() {
        let mut manager = HitboxManager::new(hb(0.0, 0.0, 20.0, 20.0));
        let mut boxes = Vec::new();
        for i in 0..300u32 {
            let x = (i * 7 % 23) as f64 - 1.5;
            let y = (i * 11 % 19) as f64 + 0.25;
            let size = 0.5 + (i % 5) as f64 * 2.0;
            let hitbox = hb(x, y, size, size * 0.5);
            manager.add(i, hitbox);
            boxes.push((i, hitbox));
        }
        for &(key, hitbox) in boxes.iter().step_by(7) {
            let expected: Vec<u32> = boxes
                .iter()
                .filter(|(other, other_box)| *other != key && other_box.intersects(&hitbox))
                .map(|(other, _)| *other)
                .collect();
            assert_eq!(sorted(manager.all_collisions_of(key)), sorted(expected));
        }
    }

    #[test]
    fn removal_keeps_later_keys_addressable() {
        let mut manager = HitboxManager::new(hb(0.0, 0.0, 100.0, 100.0));
        for i in 0..50u32 {
            manager.add(i, hb(i as f64, 0.0, 1.0, 1.0));
        }
        for i in (0..50u32).step_by(3) {
            assert!(manager.remove(i));
        }
        assert!(!manager.remove(0));
        assert_eq!(manager.len(), 33);

        for i in 0..50u32 {
            let expected = (i % 3 != 0).then(|| hb(i as f64, 0.0, 1.0, 1.0));
            assert_eq!(manager.hitbox_of(i), expected, "key {i}");
        }
        assert!(manager.update(49, hb(10.5, 0.0, 1.0, 1.0)));
        manager.add(3, hb(49.0, 0.0, 1.0, 1.0));
        assert_eq!(manager.len(), 34);
        assert_eq!(sorted(manager.all_collisions_of(49)), vec![10, 11]);
    }

    #[test]
    fn clear_then_repopulate_tracks_every_key_once() {
        let mut manager = HitboxManager::new(hb(0.0, 0.0, 64.0, 64.0));
        for _ in 0..3 {
            manager.clear();
            for y in 0..64u32 {
                for x in 0..64u32 {
                    manager.add(y * 64 + x, hb(x as f64, y as f64, 1.0, 1.0));
                }
            }
            assert_eq!(manager.len(), 64 * 64);
        }
        manager.add(0, hb(0.5, 0.5, 1.0, 1.0));
        assert_eq!(manager.len(), 64 * 64);
        assert_eq!(sorted(manager.all_collisions_of(0)), vec![1, 64, 65]);
    }
}
