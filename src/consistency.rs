//! How well an axiom agrees with an existing ranking.

use crate::axiom::Axiom;
use crate::error::AxiomError;
use crate::rerank::{kwiksort_with_options, RerankOptions};

/// Kendall's tau-b between two score vectors; `0.0` for mismatched or short inputs.
pub fn kendall_tau_b(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n != y.len() || n < 2 {
        return 0.0;
    }

    let mut concordant = 0f64;
    let mut discordant = 0f64;
    let mut ties_x = 0f64;
    let mut ties_y = 0f64;

    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];

            if dx == 0.0 && dy == 0.0 {
                continue;
            } else if dx == 0.0 {
                ties_x += 1.0;
            } else if dy == 0.0 {
                ties_y += 1.0;
            } else if (dx > 0.0) == (dy > 0.0) {
                concordant += 1.0;
            } else {
                discordant += 1.0;
            }
        }
    }

    let denom = ((concordant + discordant + ties_x) * (concordant + discordant + ties_y)).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        (concordant - discordant) / denom
    }
}

/// Spearman's rho on tie-averaged ranks.
pub fn spearman_rho(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n != y.len() || n < 2 {
        return 0.0;
    }
    let rx = ranks_with_ties(x);
    let ry = ranks_with_ties(y);

    let mean_x = rx.iter().sum::<f64>() / n as f64;
    let mean_y = ry.iter().sum::<f64>() / n as f64;

    let mut num = 0.0;
    let mut den_x = 0.0;
    let mut den_y = 0.0;
    for (a, b) in rx.iter().zip(&ry) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        num += dx * dy;
        den_x += dx * dx;
        den_y += dy * dy;
    }

    if den_x == 0.0 || den_y == 0.0 {
        0.0
    } else {
        num / (den_x.sqrt() * den_y.sqrt())
    }
}

/// Zero-based ranks, ascending by score, with ties sharing their mean rank.
pub fn ranks_with_ties(scores: &[f64]) -> Vec<f64> {
    let n = scores.len();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0usize;
    while i < n {
        let score = scores[indices[i]];
        let mut j = i + 1;
        while j < n && scores[indices[j]] == score {
            j += 1;
        }
        let avg_rank = (i + j - 1) as f64 / 2.0;
        for &idx in &indices[i..j] {
            ranks[idx] = avg_rank;
        }
        i = j;
    }

    ranks
}

/// Fraction of decided pairs where the axiom prefers the earlier-ranked output.
///
/// Pairs the axiom abstains on, or marks not applicable, are skipped. Returns
/// `None` when no pair is decided.
pub fn ranking_agreement<I, O, A>(axiom: &A, input: &I, ranked: &[O]) -> Result<Option<f64>, AxiomError>
where
    A: Axiom<I, O> + ?Sized,
{
    let matrix = axiom.preferences(input, ranked)?;
    matrix.ensure_len(ranked.len())?;
    let mut agree = 0usize;
    let mut decided = 0usize;
    for i in 0..ranked.len() {
        for j in (i + 1)..ranked.len() {
            match matrix.value(i, j) {
                Some(p) if p > 0.0 => {
                    agree += 1;
                    decided += 1;
                }
                Some(p) if p < 0.0 => decided += 1,
                _ => {}
            }
        }
    }
    if decided == 0 {
        return Ok(None);
    }
    Ok(Some(agree as f64 / decided as f64))
}

/// Kendall's tau-b between the given order of `outputs` and the KwikSort order.
pub fn kwiksort_consistency<I, O, A>(
    axiom: &A,
    input: &I,
    outputs: &[O],
    options: &RerankOptions,
) -> Result<f64, AxiomError>
where
    A: Axiom<I, O> + ?Sized,
{
    let order = kwiksort_with_options(axiom, input, outputs, options, None)?;
    let n = outputs.len();
    let given: Vec<f64> = (0..n).map(|i| (n - i) as f64).collect();
    let mut reranked = vec![0.0; n];
    for (position, &idx) in order.iter().enumerate() {
        reranked[idx] = (n - position) as f64;
    }
    Ok(kendall_tau_b(&given, &reranked))
}
