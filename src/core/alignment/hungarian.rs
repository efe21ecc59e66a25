//! Kuhn-Munkres (Hungarian) assignment for rectangular cost matrices.
//!
//! Shortest-augmenting-path formulation with row/column potentials, O(n²m).
//! Minimises total cost; callers maximising a score pass its negation.

/// Minimum-cost matching of `min(rows, cols)` pairs.
///
/// Returns `(row, col)` pairs sorted by row. `cost` must be rectangular;
/// an empty matrix yields no pairs.
pub fn solve(cost: &[Vec<f64>]) -> Vec<(usize, usize)> {
    let rows = cost.len();
    let cols = cost.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return Vec::new();
    }

    if rows <= cols {
        solve_wide(cost, rows, cols)
    } else {
        let transposed: Vec<Vec<f64>> = (0..cols)
            .map(|j| (0..rows).map(|i| cost[i][j]).collect())
            .collect();
        let mut pairs: Vec<(usize, usize)> = solve_wide(&transposed, cols, rows)
            .into_iter()
            .map(|(j, i)| (i, j))
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

/// Core solver, requires `n <= m`. Indices are 1-based internally; slot 0 is
/// the virtual source of each augmenting path.
fn solve_wide(cost: &[Vec<f64>], n: usize, m: usize) -> Vec<(usize, usize)> {
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; m + 1];
    // p[j]: row matched to column j (0 = free)
    let mut p = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;

            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }

            for j in 0..=m {
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

        // Flip the augmenting path
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut pairs: Vec<(usize, usize)> = (1..=m)
        .filter(|&j| p[j] != 0)
        .map(|j| (p[j] - 1, j - 1))
        .collect();
    pairs.sort_unstable();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(cost: &[Vec<f64>], pairs: &[(usize, usize)]) -> f64 {
        pairs.iter().map(|&(i, j)| cost[i][j]).sum()
    }

    #[test]
    fn test_square_assignment() {
        let cost = vec![
            vec![4.0, 1.0, 3.0],
            vec![2.0, 0.0, 5.0],
            vec![3.0, 2.0, 2.0],
        ];
        let pairs = solve(&cost);
        assert_eq!(pairs.len(), 3);
        assert_eq!(total(&cost, &pairs), 5.0);
        assert_eq!(pairs, vec![(0, 1), (1, 0), (2, 2)]);
    }

    #[test]
    fn test_maximise_by_negation() {
        let overlap = vec![vec![1.0, 2.0]];
        let cost: Vec<Vec<f64>> = overlap
            .iter()
            .map(|row| row.iter().map(|v| -v).collect())
            .collect();
        assert_eq!(solve(&cost), vec![(0, 1)]);
    }

    #[test]
    fn test_more_rows_than_columns() {
        let cost = vec![vec![-5.0], vec![-9.0], vec![-1.0]];
        assert_eq!(solve(&cost), vec![(1, 0)]);
    }

    #[test]
    fn test_wide_matrix() {
        let cost = vec![vec![-1.0, -3.0, 0.0, -2.0], vec![-3.0, -3.0, 0.0, -1.0]];
        let pairs = solve(&cost);
        assert_eq!(pairs.len(), 2);
        assert_eq!(total(&cost, &pairs), -6.0);
    }

    #[test]
    fn test_matches_brute_force() {
        let cost = vec![
            vec![7.0, 3.0, 9.0, 1.0],
            vec![2.0, 8.0, 6.0, 4.0],
            vec![5.0, 5.0, 3.0, 8.0],
            vec![9.0, 1.0, 4.0, 7.0],
        ];
        let mut best = f64::INFINITY;
        let perms = permutations(4);
        for perm in &perms {
            let sum: f64 = perm.iter().enumerate().map(|(i, &j)| cost[i][j]).sum();
            best = best.min(sum);
        }
        assert_eq!(total(&cost, &solve(&cost)), best);
    }

    #[test]
    fn test_empty() {
        assert!(solve(&[]).is_empty());
        assert!(solve(&[vec![]]).is_empty());
    }

    fn permutations(n: usize) -> Vec<Vec<usize>> {
        if n == 0 {
            return vec![vec![]];
        }
        let mut out = Vec::new();
        for perm in permutations(n - 1) {
            for pos in 0..=perm.len() {
                let mut p = perm.clone();
                p.insert(pos, n - 1);
                out.push(p);
            }
        }
        out
    }
}
