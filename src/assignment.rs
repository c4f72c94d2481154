//! Detection-to-track assignment via the rectangular Hungarian algorithm.
//!
//! Solves the minimum-cost bipartite matching problem on an `m x n` cost
//! matrix in O(max(m, n)^3) using the potentials-and-augmenting-paths
//! formulation (Jonker-Volgenant / Kuhn-Munkres with dual variables).

use nalgebra::DMatrix;

/// Sentinel cost used to pad a rectangular matrix to square. Any real
/// pairing is preferred over a pad pairing as long as real costs stay
/// well below this value.
const PAD_COST: f64 = 1e9;

/// Find the minimum-cost assignment of rows to columns.
///
/// # Arguments
/// * `cost` - an `m x n` matrix of finite nonnegative costs
///
/// # Returns
/// A vector of length `m` where entry `i` is the column assigned to row
/// `i`, or `None` if row `i` is unassigned. Assigned columns are pairwise
/// distinct; when `m <= n` every row is assigned, and the total cost of
/// the assigned pairs is minimal over all such assignments.
pub fn minimum_cost_assignment(cost: &DMatrix<f64>) -> Vec<Option<usize>> {
    let n_rows = cost.nrows();
    if n_rows == 0 {
        return Vec::new();
    }
    let n_cols = cost.ncols();
    if n_cols == 0 {
        return vec![None; n_rows];
    }

    // Pad to square with the sentinel cost
    let n = n_rows.max(n_cols);
    let mut a = vec![vec![PAD_COST; n]; n];
    for i in 0..n_rows {
        for j in 0..n_cols {
            a[i][j] = cost[(i, j)];
        }
    }

    // Dual potentials and the column -> row assignment, 1-based with a
    // virtual column 0 that hosts the row currently being inserted.
    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; n + 1];
    let mut p = vec![0_usize; n + 1];
    let mut way = vec![0_usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut minv = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];
        let mut j0 = 0_usize;

        // Dijkstra-like search for the cheapest augmenting path from row i
        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0_usize;

            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let cur = a[i0 - 1][j - 1] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }

            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // Walk the path backwards, flipping assignments
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    // Map back to the rectangular problem: pad rows/columns fall away
    let mut assignment = vec![None; n_rows];
    for j in 1..=n {
        if p[j] <= n_rows && j <= n_cols {
            assignment[p[j] - 1] = Some(j - 1);
        }
    }
    assignment
}
