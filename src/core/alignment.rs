// alignment.rs - Affine-gap pairwise aligner (three-matrix Gotoh recurrence)
//
//   M[i][j]  = max(M, Gx, Gy)[i-1][j-1] + sub(a_i, b_j)
//   Gx[i][j] = max(M[i-1][j] + gap_open, Gx[i-1][j] + gap_extend)   gap in b
//   Gy[i][j] = max(M[i][j-1] + gap_open, Gy[i][j-1] + gap_extend)   gap in a
//
// Local mode lets every M cell restart from 0 and reports the best cell.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::scoring::{AlignmentMode, ScoringScheme};
use crate::data::Sequence;
use crate::error::Result;

const NEG: f64 = f64::NEG_INFINITY;
const GAP: u8 = b'-';

/// Columns per block in rendered alignments
pub const RENDER_WIDTH: usize = 60;

/// Result of a single pairwise alignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    pub score: f64,
    pub alignment_text: Option<String>,
    pub optimal_count: Option<u64>,
    /// Gapped rows and coordinates, present only when traceback was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aligned: Option<AlignedPair>,
}

/// One optimal alignment path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedPair {
    pub id_a: String,
    pub id_b: String,
    pub row_a: String,
    pub row_b: String,
    /// Half-open residue ranges covered on each input
    pub start_a: usize,
    pub end_a: usize,
    pub start_b: usize,
    pub end_b: usize,
    pub stats: AlignmentStats,
}

/// Column statistics of a gapped alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentStats {
    pub matches: usize,
    pub mismatches: usize,
    pub gap_events: usize,
    pub gap_residues: usize,
    pub length: usize,
    pub identity_percent: f64,
}

/// Compute alignment statistics from aligned rows
pub fn compute_alignment_stats(row_a: &str, row_b: &str) -> AlignmentStats {
    let mut stats = AlignmentStats::default();
    // 0 = no gap, 1 = gap in a, 2 = gap in b
    let mut open_gap = 0u8;

    for (&a, &b) in row_a.as_bytes().iter().zip(row_b.as_bytes()) {
        stats.length += 1;
        let gap_kind = match (a == GAP, b == GAP) {
            (true, _) => 1,
            (_, true) => 2,
            _ => 0,
        };
        if gap_kind != 0 {
            if open_gap != gap_kind {
                stats.gap_events += 1;
            }
            stats.gap_residues += 1;
        } else if a == b {
            stats.matches += 1;
        } else {
            stats.mismatches += 1;
        }
        open_gap = gap_kind;
    }

    if stats.length > 0 {
        stats.identity_percent = stats.matches as f64 / stats.length as f64 * 100.0;
    }
    stats
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Match,
    GapX,
    GapY,
}

/// Best of the three states, preferring M, then Gx, then Gy on ties
#[inline]
fn argmax3(m: f64, x: f64, y: f64) -> (f64, State) {
    let mut best = (m, State::Match);
    if x > best.0 {
        best = (x, State::GapX);
    }
    if y > best.0 {
        best = (y, State::GapY);
    }
    best
}

/// Number of optimal paths into a cell: sum of counts of candidates reaching `value`
#[inline]
fn tally(value: f64, candidates: [(f64, u64); 2]) -> u64 {
    if !value.is_finite() {
        return 0;
    }
    candidates
        .iter()
        .filter(|(v, _)| *v == value)
        .fold(0u64, |acc, (_, c)| acc.saturating_add(*c))
}

/// Boundary cell `(i, 0)` / `(0, j)` values shared by both sub-modes.
/// `prev` is the boundary neighbour along the same edge.
#[inline]
fn boundary_cell(scheme: &ScoringScheme, prev: Option<(f64, f64)>) -> (f64, f64) {
    // Returns (M, gap) for the edge; the other gap state is always NEG.
    match (scheme.mode, prev) {
        (_, None) => (0.0, NEG),
        (AlignmentMode::Local, Some(_)) => (0.0, NEG),
        (AlignmentMode::Global, Some((pm, pg))) => {
            (NEG, (pm + scheme.gap_open_score).max(pg + scheme.gap_extend_score))
        }
    }
}

/// Optimal score only, in O(min(n, m)) memory.
///
/// The recurrence is symmetric under swapping the inputs, so the shorter
/// sequence always runs along the rolling row.
pub fn score_residues(scheme: &ScoringScheme, a: &[u8], b: &[u8]) -> f64 {
    let (rows, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let local = scheme.mode == AlignmentMode::Local;
    let open = scheme.gap_open_score;
    let extend = scheme.gap_extend_score;
    let width = cols.len() + 1;

    let mut prev_m = vec![NEG; width];
    let mut prev_x = vec![NEG; width];
    let mut prev_y = vec![NEG; width];
    let mut cur_m = vec![NEG; width];
    let mut cur_x = vec![NEG; width];
    let mut cur_y = vec![NEG; width];

    // Row 0: M and Gy along the top edge
    let (m0, _) = boundary_cell(scheme, None);
    prev_m[0] = m0;
    for j in 1..width {
        let (m, y) = boundary_cell(scheme, Some((prev_m[j - 1], prev_y[j - 1])));
        prev_m[j] = m;
        prev_y[j] = y;
    }

    let mut best_local = 0.0f64;

    for &ra in rows {
        // Column 0: M and Gx along the left edge
        let (m, x) = boundary_cell(scheme, Some((prev_m[0], prev_x[0])));
        cur_m[0] = m;
        cur_x[0] = x;
        cur_y[0] = NEG;

        for j in 1..width {
            let mut diag = prev_m[j - 1].max(prev_x[j - 1]).max(prev_y[j - 1]);
            if local {
                diag = diag.max(0.0);
            }
            cur_m[j] = diag + scheme.substitution(ra, cols[j - 1]);
            cur_x[j] = (prev_m[j] + open).max(prev_x[j] + extend);
            cur_y[j] = (cur_m[j - 1] + open).max(cur_y[j - 1] + extend);

            if local {
                best_local = best_local.max(cur_m[j]).max(cur_x[j]).max(cur_y[j]);
            }
        }

        std::mem::swap(&mut prev_m, &mut cur_m);
        std::mem::swap(&mut prev_x, &mut cur_x);
        std::mem::swap(&mut prev_y, &mut cur_y);
    }

    if local {
        best_local
    } else {
        let last = width - 1;
        prev_m[last].max(prev_x[last]).max(prev_y[last])
    }
}

/// Full O(n·m) tables for traceback, with optional path counts
struct DpTables {
    width: usize,
    m: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    counts: Option<[Vec<u64>; 3]>,
}

impl DpTables {
    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        i * self.width + j
    }

    #[inline]
    fn get(&self, state: State, i: usize, j: usize) -> f64 {
        let k = self.idx(i, j);
        match state {
            State::Match => self.m[k],
            State::GapX => self.x[k],
            State::GapY => self.y[k],
        }
    }

    #[inline]
    fn count(&self, state: State, i: usize, j: usize) -> u64 {
        let k = self.idx(i, j);
        self.counts.as_ref().map_or(0, |c| match state {
            State::Match => c[0][k],
            State::GapX => c[1][k],
            State::GapY => c[2][k],
        })
    }

    fn fill(scheme: &ScoringScheme, a: &[u8], b: &[u8], count_optimal: bool) -> Self {
        let width = b.len() + 1;
        let cells = (a.len() + 1) * width;
        let mut t = DpTables {
            width,
            m: vec![NEG; cells],
            x: vec![NEG; cells],
            y: vec![NEG; cells],
            counts: count_optimal.then(|| [vec![0u64; cells], vec![0u64; cells], vec![0u64; cells]]),
        };
        let local = scheme.mode == AlignmentMode::Local;
        let open = scheme.gap_open_score;
        let extend = scheme.gap_extend_score;

        t.m[0] = boundary_cell(scheme, None).0;
        if let Some(c) = t.counts.as_mut() {
            c[0][0] = 1;
        }

        // Top edge
        for j in 1..width {
            let (m, y) = boundary_cell(scheme, Some((t.m[j - 1], t.y[j - 1])));
            let k = j;
            t.m[k] = m;
            t.y[k] = y;
            if let Some(c) = t.counts.as_mut() {
                if local {
                    c[0][k] = 1;
                } else {
                    c[2][k] = tally(y, [(t.m[k - 1] + open, c[0][k - 1]), (t.y[k - 1] + extend, c[2][k - 1])]);
                }
            }
        }

        for i in 1..=a.len() {
            // Left edge
            let up = (i - 1) * width;
            let k = i * width;
            let (m, x) = boundary_cell(scheme, Some((t.m[up], t.x[up])));
            t.m[k] = m;
            t.x[k] = x;
            if let Some(c) = t.counts.as_mut() {
                if local {
                    c[0][k] = 1;
                } else {
                    c[1][k] = tally(x, [(t.m[up] + open, c[0][up]), (t.x[up] + extend, c[1][up])]);
                }
            }

            for j in 1..width {
                let k = i * width + j;
                let diag_k = k - width - 1;
                let up_k = k - width;
                let left_k = k - 1;

                let (raw_diag, _) = argmax3(t.m[diag_k], t.x[diag_k], t.y[diag_k]);
                let diag = if local { raw_diag.max(0.0) } else { raw_diag };
                let m = diag + scheme.substitution(a[i - 1], b[j - 1]);
                let x = (t.m[up_k] + open).max(t.x[up_k] + extend);
                let y = (t.m[left_k] + open).max(t.y[left_k] + extend);
                t.m[k] = m;
                t.x[k] = x;
                t.y[k] = y;

                if let Some(c) = t.counts.as_mut() {
                    c[0][k] = if local && raw_diag <= 0.0 {
                        1
                    } else if raw_diag.is_finite() {
                        [(t.m[diag_k], c[0][diag_k]), (t.x[diag_k], c[1][diag_k]), (t.y[diag_k], c[2][diag_k])]
                            .iter()
                            .filter(|(v, _)| *v == raw_diag)
                            .fold(0u64, |acc, (_, n)| acc.saturating_add(*n))
                    } else {
                        0
                    };
                    c[1][k] = tally(x, [(t.m[up_k] + open, c[0][up_k]), (t.x[up_k] + extend, c[1][up_k])]);
                    c[2][k] = tally(y, [(t.m[left_k] + open, c[0][left_k]), (t.y[left_k] + extend, c[2][left_k])]);
                }
            }
        }

        t
    }
}

/// Pairwise aligner bound to one scoring scheme
#[derive(Debug, Clone)]
pub struct PairwiseAligner {
    scheme: ScoringScheme,
}

impl PairwiseAligner {
    pub fn new(scheme: ScoringScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> &ScoringScheme {
        &self.scheme
    }

    /// Score-only sub-mode: no traceback, no rendering, linear memory
    pub fn score(&self, a: &Sequence, b: &Sequence) -> AlignmentResult {
        let score = score_residues(&self.scheme, a.residues(), b.residues());
        AlignmentResult {
            score,
            alignment_text: None,
            optimal_count: None,
            aligned: None,
        }
    }

    /// Convenience wrapper validating raw residue strings first
    pub fn align_str(&self, a: &str, b: &str, count_optimal: bool) -> Result<AlignmentResult> {
        let a = Sequence::new("seqA", a)?;
        let b = Sequence::new("seqB", b)?;
        Ok(self.align(&a, &b, count_optimal))
    }

    /// Traceback sub-mode: one optimal path, rendered, plus optional tie count
    pub fn align(&self, a: &Sequence, b: &Sequence, count_optimal: bool) -> AlignmentResult {
        let ra = a.residues();
        let rb = b.residues();
        let local = self.scheme.mode == AlignmentMode::Local;
        let tables = DpTables::fill(&self.scheme, ra, rb, count_optimal);

        // End cell and state of the reported path
        let (score, end_i, end_j, end_state) = if local {
            let mut best = (0.0f64, 0usize, 0usize, State::Match);
            for i in 1..=ra.len() {
                for j in 1..=rb.len() {
                    let (v, s) = argmax3(
                        tables.get(State::Match, i, j),
                        tables.get(State::GapX, i, j),
                        tables.get(State::GapY, i, j),
                    );
                    if v > best.0 {
                        best = (v, i, j, s);
                    }
                }
            }
            best
        } else {
            let (n, m) = (ra.len(), rb.len());
            let (v, s) = argmax3(
                tables.get(State::Match, n, m),
                tables.get(State::GapX, n, m),
                tables.get(State::GapY, n, m),
            );
            (v, n, m, s)
        };

        let optimal_count = count_optimal.then(|| self.count_optimal(&tables, ra.len(), rb.len(), score));

        if local && score <= 0.0 {
            debug!(a = a.id(), b = b.id(), "empty local alignment");
            let stats = AlignmentStats::default();
            return AlignmentResult {
                score: 0.0,
                alignment_text: Some(String::new()),
                optimal_count,
                aligned: Some(AlignedPair {
                    id_a: a.id().to_string(),
                    id_b: b.id().to_string(),
                    row_a: String::new(),
                    row_b: String::new(),
                    start_a: 0,
                    end_a: 0,
                    start_b: 0,
                    end_b: 0,
                    stats,
                }),
            };
        }

        let (row_a, row_b, start_i, start_j) = self.traceback(&tables, ra, rb, end_i, end_j, end_state);
        let stats = compute_alignment_stats(&row_a, &row_b);
        let pair = AlignedPair {
            id_a: a.id().to_string(),
            id_b: b.id().to_string(),
            row_a,
            row_b,
            start_a: start_i,
            end_a: end_i,
            start_b: start_j,
            end_b: end_j,
            stats,
        };
        debug!(a = a.id(), b = b.id(), score, columns = stats.length, "traceback complete");

        AlignmentResult {
            score,
            alignment_text: Some(render_alignment(&pair)),
            optimal_count,
            aligned: Some(pair),
        }
    }

    fn traceback(
        &self,
        t: &DpTables,
        a: &[u8],
        b: &[u8],
        end_i: usize,
        end_j: usize,
        end_state: State,
    ) -> (String, String, usize, usize) {
        let local = self.scheme.mode == AlignmentMode::Local;
        let open = self.scheme.gap_open_score;
        let extend = self.scheme.gap_extend_score;
        let mut out_a = Vec::with_capacity(a.len() + b.len());
        let mut out_b = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j, mut state) = (end_i, end_j, end_state);

        while i > 0 || j > 0 {
            match state {
                State::Match => {
                    // Boundary M cells only exist as local-mode starts
                    if i == 0 || j == 0 {
                        break;
                    }
                    out_a.push(a[i - 1]);
                    out_b.push(b[j - 1]);
                    let (best, next) = argmax3(
                        t.get(State::Match, i - 1, j - 1),
                        t.get(State::GapX, i - 1, j - 1),
                        t.get(State::GapY, i - 1, j - 1),
                    );
                    i -= 1;
                    j -= 1;
                    if local && best <= 0.0 {
                        break;
                    }
                    state = next;
                }
                State::GapX => {
                    out_a.push(a[i - 1]);
                    out_b.push(GAP);
                    let from_match = t.get(State::Match, i - 1, j) + open >= t.get(State::GapX, i - 1, j) + extend;
                    i -= 1;
                    state = if from_match { State::Match } else { State::GapX };
                }
                State::GapY => {
                    out_a.push(GAP);
                    out_b.push(b[j - 1]);
                    let from_match = t.get(State::Match, i, j - 1) + open >= t.get(State::GapY, i, j - 1) + extend;
                    j -= 1;
                    state = if from_match { State::Match } else { State::GapY };
                }
            }
        }

        out_a.reverse();
        out_b.reverse();
        (
            String::from_utf8_lossy(&out_a).into_owned(),
            String::from_utf8_lossy(&out_b).into_owned(),
            i,
            j,
        )
    }

    fn count_optimal(&self, t: &DpTables, n: usize, m: usize, best: f64) -> u64 {
        let states = [State::Match, State::GapX, State::GapY];
        if self.scheme.mode == AlignmentMode::Global {
            return states
                .iter()
                .filter(|&&s| t.get(s, n, m) == best)
                .fold(0u64, |acc, &s| acc.saturating_add(t.count(s, n, m)));
        }
        if best <= 0.0 {
            return 0;
        }
        let mut total = 0u64;
        for i in 1..=n {
            for j in 1..=m {
                for &s in &states {
                    if t.get(s, i, j) == best {
                        total = total.saturating_add(t.count(s, i, j));
                    }
                }
            }
        }
        total
    }
}

/// Render an aligned pair as blocks of id-prefixed rows with a match line
pub fn render_alignment(pair: &AlignedPair) -> String {
    let label_width = pair.id_a.len().max(pair.id_b.len()) + 2;
    let a = pair.row_a.as_bytes();
    let b = pair.row_b.as_bytes();
    let mut out = String::new();

    for (block, (chunk_a, chunk_b)) in a.chunks(RENDER_WIDTH).zip(b.chunks(RENDER_WIDTH)).enumerate() {
        if block > 0 {
            out.push('\n');
        }
        let marks: String = chunk_a
            .iter()
            .zip(chunk_b)
            .map(|(&x, &y)| match (x, y) {
                (GAP, _) | (_, GAP) => ' ',
                _ if x == y => '|',
                _ => '.',
            })
            .collect();
        out.push_str(&format!("{:<w$}{}\n", pair.id_a, String::from_utf8_lossy(chunk_a), w = label_width));
        out.push_str(&format!("{:<w$}{}\n", "", marks, w = label_width));
        out.push_str(&format!("{:<w$}{}\n", pair.id_b, String::from_utf8_lossy(chunk_b), w = label_width));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seq(id: &str, residues: &str) -> Sequence {
        Sequence::new(id, residues).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_local_alignment_ignores_flanks() {
        let scheme = ScoringScheme::default().with_mode(AlignmentMode::Local);
        let aligner = PairwiseAligner::new(scheme.clone());
        let a = seq("a", "AAAGAATTCAAA");
        let b = seq("b", "GAATTC");

        assert!(close(aligner.score(&a, &b).score, 6.0));
        let result = aligner.align(&a, &b, true);
        assert!(close(result.score, 6.0));
        let pair = result.aligned.unwrap();
        assert_eq!(pair.row_a, "GAATTC");
        assert_eq!(pair.row_b, "GAATTC");
        assert_eq!((pair.start_a, pair.end_a), (3, 9));
        assert_eq!((pair.start_b, pair.end_b), (0, 6));
        assert_eq!(result.optimal_count, Some(1));
    }

    #[test]
    fn test_affine_gap_prefers_single_long_gap() {
        let aligner = PairwiseAligner::new(ScoringScheme::default());
        let result = aligner.align(&seq("a", "ACGT"), &seq("b", "AT"), false);
        assert!(close(result.score, 1.4));
        let pair = result.aligned.unwrap();
        assert_eq!(pair.row_a, "ACGT");
        assert_eq!(pair.row_b, "A--T");
        assert_eq!(pair.stats.gap_events, 1);
        assert_eq!(pair.stats.gap_residues, 2);
        assert_eq!(pair.stats.matches, 2);
        assert!(result.optimal_count.is_none());
    }

    #[test]
    fn test_optimal_count_ties() {
        let aligner = PairwiseAligner::new(ScoringScheme::default());
        let result = aligner.align(&seq("a", "AA"), &seq("b", "A"), true);
        assert!(close(result.score, 0.5));
        assert_eq!(result.optimal_count, Some(2));

        // One gap of two residues, placed before, between or after
        let result = aligner.align(&seq("a", "AAAA"), &seq("b", "AA"), true);
        assert!(close(result.score, 1.4));
        assert_eq!(result.optimal_count, Some(3));
    }

    #[test]
    fn test_empty_sequences() {
        let global = ScoringScheme::default();
        let local = ScoringScheme::default().with_mode(AlignmentMode::Local);

        assert!(close(score_residues(&global, b"", b"ACGTA"), global.gap_cost(5)));
        assert!(close(score_residues(&global, b"ACG", b""), global.gap_cost(3)));
        assert_eq!(score_residues(&global, b"", b""), 0.0);
        assert_eq!(score_residues(&local, b"", b"ACGT"), 0.0);

        let aligner = PairwiseAligner::new(global.clone());
        let result = aligner.align(&seq("a", ""), &seq("b", "ACG"), true);
        assert!(close(result.score, global.gap_cost(3)));
        assert_eq!(result.aligned.unwrap().row_a, "---");
        assert_eq!(result.optimal_count, Some(1));
    }

    #[test]
    fn test_local_without_positive_region_scores_zero() {
        let scheme = ScoringScheme::default().with_mode(AlignmentMode::Local);
        let aligner = PairwiseAligner::new(scheme);
        let result = aligner.align(&seq("a", "AAAA"), &seq("b", "TTTT"), true);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.alignment_text.as_deref(), Some(""));
        assert_eq!(result.optimal_count, Some(0));
    }

    #[test]
    fn test_render_alignment_blocks() {
        let aligner = PairwiseAligner::new(ScoringScheme::default());
        let long_a = "ACGT".repeat(20);
        let long_b = format!("{}A", "ACGT".repeat(19));
        let result = aligner.align(&seq("first", &long_a), &seq("second", &long_b), false);
        let text = result.alignment_text.unwrap();
        // Two blocks of three lines separated by a blank line
        assert_eq!(text.lines().count(), 7);
        assert!(text.starts_with("first   ACGT"));
        assert!(text.lines().nth(1).unwrap().trim_start().starts_with("||||"));
    }

    #[test]
    fn test_compute_alignment_stats() {
        let stats = compute_alignment_stats("AC--GTA", "ACTTG-T");
        assert_eq!(stats.matches, 4);
        assert_eq!(stats.mismatches, 1);
        assert_eq!(stats.gap_events, 2);
        assert_eq!(stats.gap_residues, 3);
        assert_eq!(stats.length, 7);
    }

    proptest! {
        #[test]
        fn prop_self_alignment_scores_length(s in "[ACGT]{0,40}") {
            let scheme = ScoringScheme::custom(1.0, -1.0, -0.5, -0.1);
            let score = score_residues(&scheme, s.as_bytes(), s.as_bytes());
            prop_assert!(close(score, s.len() as f64));
        }

        #[test]
        fn prop_score_only_matches_traceback(a in "[ACGT]{0,25}", b in "[ACGT]{0,25}", local in any::<bool>()) {
            let mode = if local { AlignmentMode::Local } else { AlignmentMode::Global };
            let scheme = ScoringScheme::default().with_mode(mode);
            let aligner = PairwiseAligner::new(scheme.clone());
            let fast = score_residues(&scheme, a.as_bytes(), b.as_bytes());
            let full = aligner.align(&seq("a", &a), &seq("b", &b), true);
            prop_assert!(close(fast, full.score));
            if !(local && full.score == 0.0) {
                prop_assert!(full.optimal_count.unwrap() >= 1);
            }
        }

        #[test]
        fn prop_score_is_symmetric(a in "[ACGT]{0,30}", b in "[ACGT]{0,30}") {
            let scheme = ScoringScheme::from_preset("dna").unwrap();
            prop_assert_eq!(
                score_residues(&scheme, a.as_bytes(), b.as_bytes()),
                score_residues(&scheme, b.as_bytes(), a.as_bytes())
            );
        }

        #[test]
        fn prop_traceback_rows_rescore_to_score(a in "[ACGT]{1,20}", b in "[ACGT]{1,20}") {
            let scheme = ScoringScheme::default();
            let result = PairwiseAligner::new(scheme.clone()).align(&seq("a", &a), &seq("b", &b), false);
            let pair = result.aligned.unwrap();
            prop_assert_eq!(pair.row_a.replace('-', ""), a);
            prop_assert_eq!(pair.row_b.replace('-', ""), b);

            // Re-score the gapped rows column by column
            let (ra, rb) = (pair.row_a.as_bytes(), pair.row_b.as_bytes());
            let mut total = 0.0;
            let mut k = 0;
            while k < ra.len() {
                if ra[k] == GAP || rb[k] == GAP {
                    let in_a = ra[k] == GAP;
                    let mut len = 0;
                    while k < ra.len() && (if in_a { ra[k] == GAP } else { rb[k] == GAP }) {
                        len += 1;
                        k += 1;
                    }
                    total += scheme.gap_cost(len);
                } else {
                    total += scheme.substitution(ra[k], rb[k]);
                    k += 1;
                }
            }
            prop_assert!(close(total, result.score));
        }
    }
}
