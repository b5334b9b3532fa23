//! Ordered, overlap-tolerant region collection

use log::warn;

use super::Region;
use crate::geometry::Point;

/// Regions of one document in insertion order.
///
/// Order matters twice: it is the left-to-right order of the strip and the
/// reverse of the hit-test priority (most recent first).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionStore {
    regions: Vec<Region>,
}

impl RegionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a region. Regions without a finite, positive extent are
    /// rejected.
    pub fn add(&mut self, region: Region) -> bool {
        if !region.is_valid() {
            warn!("Rejected degenerate region {region:?}");
            return false;
        }
        self.regions.push(region);
        true
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Region> {
        (index < self.regions.len()).then(|| self.regions.remove(index))
    }

    /// Index of the most recently added region containing `p`
    #[must_use]
    pub fn hit_test(&self, p: Point) -> Option<usize> {
        self.regions.iter().rposition(|r| r.contains(p))
    }

    /// Remove the most recently added region containing `p`. Removes at
    /// most one region.
    pub fn remove_containing(&mut self, p: Point) -> bool {
        self.take_containing(p).is_some()
    }

    /// Like [`Self::remove_containing`] but hands back what was removed
    pub fn take_containing(&mut self, p: Point) -> Option<(usize, Region)> {
        let index = self.hit_test(p)?;
        self.remove_at(index).map(|r| (index, r))
    }

    /// Replace every region, dropping invalid ones
    pub fn replace_all(&mut self, regions: Vec<Region>) {
        let before = regions.len();
        self.regions = regions.into_iter().filter(Region::is_valid).collect();
        if self.regions.len() != before {
            warn!(
                "Dropped {} invalid regions on replace",
                before - self.regions.len()
            );
        }
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    #[must_use]
    pub fn list(&self) -> &[Region] {
        &self.regions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f64, y: f64, w: f64, h: f64) -> Region {
        Region::new(x, y, w, h)
    }

    #[test]
    fn overlapping_regions_are_removed_most_recent_first() {
        let mut store = RegionStore::new();
        let a = r(0.0, 0.0, 100.0, 100.0);
        let b = r(50.0, 50.0, 100.0, 100.0);
        store.add(a);
        store.add(b);

        let p = Point::new(75.0, 75.0);
        assert!(store.remove_containing(p));
        assert_eq!(store.list(), &[a]);
        assert!(store.remove_containing(p));
        assert!(store.is_empty());
        assert!(!store.remove_containing(p));
    }

    #[test]
    fn duplicates_are_kept() {
        let mut store = RegionStore::new();
        let a = r(0.0, 0.0, 10.0, 10.0);
        assert!(store.add(a));
        assert!(store.add(a));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn degenerate_regions_are_rejected() {
        let mut store = RegionStore::new();
        assert!(!store.add(r(0.0, 0.0, 0.0, 10.0)));
        assert!(!store.add(r(0.0, 0.0, 10.0, -1.0)));
        assert!(store.is_empty());
    }

    #[test]
    fn removal_preserves_order_of_the_rest() {
        let mut store = RegionStore::new();
        let regions: Vec<_> = (0..4).map(|i| r(f64::from(i) * 100.0, 0.0, 50.0, 50.0)).collect();
        store.replace_all(regions.clone());

        assert_eq!(store.remove_at(1), Some(regions[1]));
        assert_eq!(store.list(), &[regions[0], regions[2], regions[3]]);
        assert_eq!(store.remove_at(10), None);
    }

    #[test]
    fn miss_removes_nothing() {
        let mut store = RegionStore::new();
        store.add(r(0.0, 0.0, 10.0, 10.0));
        assert_eq!(store.take_containing(Point::new(500.0, 500.0)), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn replace_all_filters_invalid() {
        let mut store = RegionStore::new();
        store.replace_all(vec![r(0.0, 0.0, 1.0, 1.0), r(0.0, 0.0, f64::NAN, 1.0)]);
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(store.is_empty());
    }
}
