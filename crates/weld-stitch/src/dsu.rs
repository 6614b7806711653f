//! Disjoint-set union over dense face ids.
//!
//! The stitcher assigns every face a dense `usize` id (0..n) for the
//! duration of one stitch pass and accumulates connectivity into a `Dsu`
//! as it pairs half-edges; the mesh assembler then reads off components
//! via [`Dsu::find`]. Union by rank with path-compressed `find`, same
//! shape as any textbook union-find — nothing here is mesh-specific.

/// A growable union-find structure over dense integer ids.
#[derive(Debug, Clone)]
pub struct Dsu {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl Dsu {
    /// Create a DSU with `n` singleton sets, ids `0..n`.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Number of elements currently tracked.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether the DSU tracks no elements.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Add a new singleton set and return its id.
    pub fn push(&mut self) -> usize {
        let id = self.parent.len();
        self.parent.push(id);
        self.rank.push(0);
        id
    }

    /// Find the representative of `x`'s set, compressing the path.
    pub fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    /// Merge the sets containing `a` and `b`.
    pub fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }

    /// Whether `a` and `b` are in the same set.
    pub fn same_set(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons_start_disjoint() {
        let mut dsu = Dsu::new(3);
        assert!(!dsu.same_set(0, 1));
        assert!(!dsu.same_set(1, 2));
    }

    #[test]
    fn test_union_joins_sets() {
        let mut dsu = Dsu::new(4);
        dsu.union(0, 1);
        dsu.union(1, 2);
        assert!(dsu.same_set(0, 2));
        assert!(!dsu.same_set(0, 3));
    }

    #[test]
    fn test_union_is_idempotent() {
        let mut dsu = Dsu::new(2);
        dsu.union(0, 1);
        dsu.union(0, 1);
        assert!(dsu.same_set(0, 1));
    }

    #[test]
    fn test_push_grows_len() {
        let mut dsu = Dsu::new(2);
        let id = dsu.push();
        assert_eq!(id, 2);
        assert_eq!(dsu.len(), 3);
        dsu.union(0, id);
        assert!(dsu.same_set(0, id));
    }
}
