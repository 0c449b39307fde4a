// upgma.rs - UPGMA clustering over a validated distance matrix
//
// Clusters live in an arena addressed by `ClusterId`; leaves occupy ids
// 0..n in matrix order and every merge appends one internal node.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::distance::DistanceMatrix;
use crate::error::{PhyloError, Result};

/// Stable index of a cluster inside a [`Tree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(pub usize);

/// A leaf or an internal merge node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    /// Leaf sequence identifiers below this node, in matrix order
    pub leaves: Vec<String>,
    pub height: f64,
    /// Exactly two children for internal nodes, none for leaves
    pub children: Option<(ClusterId, ClusterId)>,
}

impl Cluster {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn size(&self) -> usize {
        self.leaves.len()
    }
}

/// One recorded merge step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeEvent {
    pub step: usize,
    pub left: ClusterId,
    pub right: ClusterId,
    pub merged: ClusterId,
    /// Distance between `left` and `right` when they were joined
    pub distance: f64,
    pub height: f64,
    pub left_branch: f64,
    pub right_branch: f64,
}

/// Rooted binary ultrametric tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Cluster>,
    merges: Vec<MergeEvent>,
    root: ClusterId,
    leaf_count: usize,
}

impl Tree {
    pub fn root(&self) -> &Cluster {
        &self.nodes[self.root.0]
    }

    pub fn root_id(&self) -> ClusterId {
        self.root
    }

    pub fn node(&self, id: ClusterId) -> &Cluster {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Cluster] {
        &self.nodes
    }

    pub fn merges(&self) -> &[MergeEvent] {
        &self.merges
    }

    pub fn leaves(&self) -> &[Cluster] {
        &self.nodes[..self.leaf_count]
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Parent height minus child height
    pub fn branch_length(&self, parent: ClusterId, child: ClusterId) -> f64 {
        self.node(parent).height - self.node(child).height
    }

    /// Newick text with branch lengths, e.g. `((S1:0.125,S2:0.125):0.375,S3:0.5);`
    pub fn to_newick(&self) -> String {
        let mut out = String::new();
        self.write_newick(self.root, &mut out);
        out.push(';');
        out
    }

    fn write_newick(&self, id: ClusterId, out: &mut String) {
        let node = self.node(id);
        match node.children {
            None => out.push_str(&newick_label(&node.leaves[0])),
            Some((left, right)) => {
                out.push('(');
                self.write_newick(left, out);
                let _ = write!(out, ":{}", format_length(self.branch_length(id, left)));
                out.push(',');
                self.write_newick(right, out);
                let _ = write!(out, ":{}", format_length(self.branch_length(id, right)));
                out.push(')');
            }
        }
    }
}

/// Quote labels containing Newick metacharacters
fn newick_label(name: &str) -> String {
    if name.chars().any(|c| "()[]':;, \t".contains(c)) {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

fn format_length(length: f64) -> String {
    let text = format!("{:.6}", length);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-" || text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Float slack allowed when checking that merge heights never decrease
const HEIGHT_TOLERANCE: f64 = 1e-9;

/// Active cluster during clustering
struct Slot {
    node: ClusterId,
    /// Smallest leaf identifier; tie-break key
    label: String,
    active: bool,
}

/// Run UPGMA on a distance matrix.
///
/// Ties on the minimum distance go to the pair whose (smaller, larger)
/// cluster labels compare lowest, a cluster's label being its
/// lexicographically smallest leaf name.
pub fn upgma(matrix: &DistanceMatrix) -> Result<Tree> {
    let n = matrix.len();
    if n < 2 {
        return Err(PhyloError::InsufficientInput {
            operation: "UPGMA clustering",
            required: 2,
            found: n,
        });
    }
    matrix.validate()?;

    let mut nodes: Vec<Cluster> = matrix
        .names()
        .iter()
        .enumerate()
        .map(|(i, name)| Cluster {
            id: ClusterId(i),
            leaves: vec![name.clone()],
            height: 0.0,
            children: None,
        })
        .collect();
    let mut slots: Vec<Slot> = matrix
        .names()
        .iter()
        .enumerate()
        .map(|(i, name)| Slot {
            node: ClusterId(i),
            label: name.clone(),
            active: true,
        })
        .collect();
    let mut dist: Vec<Vec<f64>> = matrix.rows().to_vec();
    let mut merges = Vec::with_capacity(n - 1);

    for step in 0..n - 1 {
        let (a, b) = closest_pair(&slots, &dist).ok_or_else(|| {
            PhyloError::InvalidDistance("no pair of active clusters left to merge".to_string())
        })?;
        let d_ab = dist[a][b];
        let (left, right) = (slots[a].node, slots[b].node);
        let size_a = nodes[left.0].size() as f64;
        let size_b = nodes[right.0].size() as f64;

        let height = d_ab / 2.0;
        debug_assert!(
            height + HEIGHT_TOLERANCE >= nodes[left.0].height.max(nodes[right.0].height),
            "UPGMA heights must not decrease towards the root"
        );

        let merged = ClusterId(nodes.len());
        let mut leaves = nodes[left.0].leaves.clone();
        leaves.extend(nodes[right.0].leaves.iter().cloned());
        let event = MergeEvent {
            step,
            left,
            right,
            merged,
            distance: d_ab,
            height,
            left_branch: height - nodes[left.0].height,
            right_branch: height - nodes[right.0].height,
        };
        debug!(step, left = %slots[a].label, right = %slots[b].label, distance = d_ab, height, "merge");

        nodes.push(Cluster {
            id: merged,
            leaves,
            height,
            children: Some((left, right)),
        });
        merges.push(event);

        // Slot `a` now holds the merged cluster, slot `b` retires
        for x in 0..slots.len() {
            if x == a || x == b || !slots[x].active {
                continue;
            }
            let d = (size_a * dist[a][x] + size_b * dist[b][x]) / (size_a + size_b);
            dist[a][x] = d;
            dist[x][a] = d;
        }
        let label = std::cmp::min(&slots[a].label, &slots[b].label).clone();
        slots[a].node = merged;
        slots[a].label = label;
        slots[b].active = false;
    }

    let root = ClusterId(nodes.len() - 1);
    info!(leaves = n, merges = merges.len(), root_height = nodes[root.0].height, "UPGMA tree built");

    Ok(Tree {
        nodes,
        merges,
        root,
        leaf_count: n,
    })
}

/// Minimum-distance active pair, deterministic on ties
fn closest_pair(slots: &[Slot], dist: &[Vec<f64>]) -> Option<(usize, usize)> {
    let mut best: Option<(f64, &str, &str, usize, usize)> = None;
    for i in 0..slots.len() {
        if !slots[i].active {
            continue;
        }
        for j in i + 1..slots.len() {
            if !slots[j].active {
                continue;
            }
            let d = dist[i][j];
            let (lo, hi) = if slots[i].label <= slots[j].label {
                (slots[i].label.as_str(), slots[j].label.as_str())
            } else {
                (slots[j].label.as_str(), slots[i].label.as_str())
            };
            let better = match best {
                None => true,
                Some((bd, blo, bhi, _, _)) => d < bd || (d == bd && (lo, hi) < (blo, bhi)),
            };
            if better {
                best = Some((d, lo, hi, i, j));
            }
        }
    }
    best.map(|(_, _, _, i, j)| (i, j))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::calculate_distance_matrix;
    use crate::core::scoring::ScoringScheme;
    use crate::data::SequenceSet;
    use proptest::prelude::*;

    fn matrix(names: &[&str], rows: Vec<Vec<f64>>) -> DistanceMatrix {
        DistanceMatrix::new(names.iter().map(|s| s.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn test_two_leaves_single_merge() {
        let dm = matrix(&["a", "b"], vec![vec![0.0, 0.6], vec![0.6, 0.0]]);
        let tree = upgma(&dm).unwrap();
        assert_eq!(tree.merges().len(), 1);
        assert_eq!(tree.leaf_count(), 2);
        assert!((tree.root().height - 0.3).abs() < 1e-12);
        assert_eq!(tree.merges()[0].left_branch, tree.merges()[0].height);
        assert_eq!(tree.to_newick(), "(a:0.3,b:0.3);");
    }

    #[test]
    fn test_size_weighted_update() {
        // a,b join at 2; then (ab)-c = (1*6 + 1*8)/2 = 7, (ab)-d = (1*10 + 1*10)/2 = 10, c-d = 9
        let dm = matrix(
            &["a", "b", "c", "d"],
            vec![
                vec![0.0, 2.0, 6.0, 10.0],
                vec![2.0, 0.0, 8.0, 10.0],
                vec![6.0, 8.0, 0.0, 9.0],
                vec![10.0, 10.0, 9.0, 0.0],
            ],
        );
        let tree = upgma(&dm).unwrap();
        let heights: Vec<f64> = tree.merges().iter().map(|m| m.height).collect();
        assert_eq!(heights, vec![1.0, 3.5, (2.0 * 10.0 + 1.0 * 9.0) / 3.0 / 2.0]);
        assert_eq!(tree.root().leaves, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_example_merges_close_pair_first() {
        let set = SequenceSet::from_pairs([("S1", "ACGTACGT"), ("S2", "ACGTACGA"), ("S3", "TTTTTTTT")]).unwrap();
        let dm = calculate_distance_matrix(&set, &ScoringScheme::custom(1.0, -1.0, -0.5, -0.1)).unwrap();
        let tree = upgma(&dm).unwrap();

        let first = &tree.merges()[0];
        let mut joined: Vec<&str> = tree.node(first.merged).leaves.iter().map(|s| s.as_str()).collect();
        joined.sort();
        assert_eq!(joined, vec!["S1", "S2"]);
        assert_eq!(tree.merges().len(), 2);
    }

    #[test]
    fn test_ties_broken_by_leaf_names() {
        // All distances equal: names decide, regardless of input order
        let dm = matrix(
            &["c", "b", "a"],
            vec![vec![0.0, 1.0, 1.0], vec![1.0, 0.0, 1.0], vec![1.0, 1.0, 0.0]],
        );
        let tree = upgma(&dm).unwrap();
        let first = tree.node(tree.merges()[0].merged);
        let mut leaves = first.leaves.clone();
        leaves.sort();
        assert_eq!(leaves, vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_matrices_rejected() {
        let negative = matrix(&["a", "b"], vec![vec![0.0, -1.0], vec![-1.0, 0.0]]);
        assert!(matches!(upgma(&negative), Err(PhyloError::InvalidDistance(_))));

        let asymmetric = matrix(&["a", "b"], vec![vec![0.0, 1.0], vec![2.0, 0.0]]);
        assert!(matches!(upgma(&asymmetric), Err(PhyloError::InvalidDistance(_))));

        let single = matrix(&["a"], vec![vec![0.0]]);
        assert!(matches!(upgma(&single), Err(PhyloError::InsufficientInput { .. })));
    }

    #[test]
    fn test_newick_quotes_labels() {
        let dm = matrix(&["seq one", "b"], vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        let tree = upgma(&dm).unwrap();
        assert_eq!(tree.to_newick(), "('seq one':0.5,b:0.5);");
    }

    fn symmetric_matrix() -> impl Strategy<Value = DistanceMatrix> {
        (2usize..8).prop_flat_map(|n| {
            proptest::collection::vec(0.0f64..1.0, n * (n - 1) / 2).prop_map(move |upper| {
                let mut rows = vec![vec![0.0; n]; n];
                let mut k = 0;
                for i in 0..n {
                    for j in i + 1..n {
                        rows[i][j] = upper[k];
                        rows[j][i] = upper[k];
                        k += 1;
                    }
                }
                DistanceMatrix::new((0..n).map(|i| format!("t{}", i)).collect(), rows).unwrap()
            })
        })
    }

    proptest! {
        #[test]
        fn prop_tree_shape_and_monotone_heights(dm in symmetric_matrix()) {
            let n = dm.len();
            let tree = upgma(&dm).unwrap();
            prop_assert_eq!(tree.merges().len(), n - 1);
            prop_assert_eq!(tree.nodes().len(), 2 * n - 1);
            prop_assert_eq!(tree.root().size(), n);

            // Each node is merged at most once, and only after it exists
            let mut used = vec![false; tree.nodes().len()];
            for event in tree.merges() {
                for child in [event.left, event.right] {
                    prop_assert!(child.0 < event.merged.0);
                    prop_assert!(!used[child.0]);
                    used[child.0] = true;
                }
                let parent = tree.node(event.merged);
                prop_assert_eq!(parent.height, event.distance / 2.0);
                prop_assert!(parent.height + HEIGHT_TOLERANCE >= tree.node(event.left).height);
                prop_assert!(parent.height + HEIGHT_TOLERANCE >= tree.node(event.right).height);
                prop_assert!(event.left_branch >= -HEIGHT_TOLERANCE && event.right_branch >= -HEIGHT_TOLERANCE);
            }
            for leaf in tree.leaves() {
                prop_assert!(leaf.is_leaf());
                prop_assert_eq!(leaf.height, 0.0);
            }
        }
    }
}
