//! KwikSort over pairwise axiom preferences.
//!
//! Partitions the working list around a pivot: outputs the axiom prefers over
//! the pivot go left, outputs the pivot beats go right, then both sides are
//! sorted the same way and concatenated as `left ++ [pivot] ++ right`. The
//! recursion runs on an explicit work stack in depth-first, left-first order,
//! so a seeded pivot strategy draws the same sequence as a recursive sort.
//!
//! Expected `O(n log n)` preference evaluations with random pivots, `O(n²)`
//! in the worst case.

use tracing::debug;

use crate::axiom::Axiom;
use crate::error::AxiomError;
use crate::pivot::PivotSelection;
use crate::preference::{Preference, PreferenceMatrix};

use super::options::RerankOptions;
use super::trace::{now_epoch_ms, ComparisonTrace, TraceSink};

enum Task {
    Sort { vertices: Vec<usize>, depth: usize },
    Emit(usize),
}

/// Order of `outputs` (as indices) consistent with the axiom's preferences.
///
/// Fails with [`AxiomError::Tie`] when the axiom returns `0` for a vertex and
/// its pivot.
pub fn kwiksort<I, O, A>(
    axiom: &A,
    input: &I,
    outputs: &[O],
    pivot: &mut dyn PivotSelection<I, O>,
) -> Result<Vec<usize>, AxiomError>
where
    A: Axiom<I, O> + ?Sized,
{
    run(axiom, input, outputs, pivot, None, None)
}

/// Like [`kwiksort`], recording every partition comparison to `trace`.
pub fn kwiksort_traced<I, O, A>(
    axiom: &A,
    input: &I,
    outputs: &[O],
    pivot: &mut dyn PivotSelection<I, O>,
    trace: &dyn TraceSink,
) -> Result<Vec<usize>, AxiomError>
where
    A: Axiom<I, O> + ?Sized,
{
    run(axiom, input, outputs, pivot, None, Some(trace))
}

/// KwikSort driven by [`RerankOptions`].
pub fn kwiksort_with_options<I, O, A>(
    axiom: &A,
    input: &I,
    outputs: &[O],
    options: &RerankOptions,
    trace: Option<&dyn TraceSink>,
) -> Result<Vec<usize>, AxiomError>
where
    A: Axiom<I, O> + ?Sized,
{
    let mut pivot = options.pivot.build::<I, O>();
    let matrix = if options.precompute_matrix {
        let matrix = axiom.preferences(input, outputs)?;
        matrix.ensure_len(outputs.len())?;
        Some(matrix)
    } else {
        None
    };
    run(axiom, input, outputs, pivot.as_mut(), matrix.as_ref(), trace)
}

fn run<I, O, A>(
    axiom: &A,
    input: &I,
    outputs: &[O],
    pivot: &mut dyn PivotSelection<I, O>,
    matrix: Option<&PreferenceMatrix>,
    trace: Option<&dyn TraceSink>,
) -> Result<Vec<usize>, AxiomError>
where
    A: Axiom<I, O> + ?Sized,
{
    let axiom_name = trace.map(|_| axiom.name()).unwrap_or_default();
    let mut order = Vec::with_capacity(outputs.len());
    let mut stack = vec![Task::Sort {
        vertices: (0..outputs.len()).collect(),
        depth: 0,
    }];
    let mut comparison_index = 0usize;

    while let Some(task) = stack.pop() {
        let (vertices, depth) = match task {
            Task::Emit(idx) => {
                order.push(idx);
                continue;
            }
            Task::Sort { vertices, depth } => (vertices, depth),
        };
        if vertices.is_empty() {
            continue;
        }

        let candidates: Vec<&O> = vertices.iter().map(|&v| &outputs[v]).collect();
        let position = pivot.select_pivot(input, &candidates);
        let Some(&pivot_idx) = vertices.get(position) else {
            return Err(AxiomError::configuration(format!(
                "pivot selection returned position {position} for {} vertices",
                vertices.len()
            )));
        };

        let mut left = Vec::new();
        let mut right = Vec::new();
        for &vertex in &vertices {
            if vertex == pivot_idx {
                continue;
            }
            let preference: Preference = match matrix {
                Some(matrix) => matrix.get(vertex, pivot_idx),
                None => axiom.preference(input, &outputs[vertex], &outputs[pivot_idx])?,
            };
            if let Some(sink) = trace {
                sink.record(ComparisonTrace {
                    timestamp_ms: now_epoch_ms(),
                    comparison_index,
                    axiom: axiom_name.clone(),
                    depth,
                    vertex_index: vertex,
                    pivot_index: pivot_idx,
                    preference,
                    from_matrix: matrix.is_some(),
                })?;
            }
            comparison_index += 1;

            if preference > 0.0 {
                left.push(vertex);
            } else if preference < 0.0 {
                right.push(vertex);
            } else {
                return Err(AxiomError::Tie {
                    vertex,
                    pivot: pivot_idx,
                });
            }
        }

        debug!(
            depth,
            pivot = pivot_idx,
            left = left.len(),
            right = right.len(),
            "kwiksort partition"
        );
        stack.push(Task::Sort {
            vertices: right,
            depth: depth + 1,
        });
        stack.push(Task::Emit(pivot_idx));
        stack.push(Task::Sort {
            vertices: left,
            depth: depth + 1,
        });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axioms::GreaterThan;
    use crate::pivot::{FirstPivotSelection, LastPivotSelection, MiddlePivotSelection, PivotSpec};

    #[test]
    fn test_empty_input_yields_empty_order() {
        let order = kwiksort(&GreaterThan, &(), &Vec::<u32>::new(), &mut FirstPivotSelection).unwrap();
        assert!(order.is_empty());
    }

    #[test]
    fn test_deterministic_pivots_sort_descending() {
        let outputs = [3u32, 1, 2];
        for pivot in [
            &mut FirstPivotSelection as &mut dyn PivotSelection<(), u32>,
            &mut LastPivotSelection,
            &mut MiddlePivotSelection,
        ] {
            let order = kwiksort(&GreaterThan, &(), &outputs, pivot).unwrap();
            assert_eq!(order, vec![0, 2, 1]);
        }
    }

    #[test]
    fn test_precomputed_matrix_matches_pairwise() {
        let outputs: Vec<u32> = vec![5, 9, 1, 7, 3, 8];
        let pairwise = kwiksort_with_options(
            &GreaterThan,
            &(),
            &outputs,
            &RerankOptions::with_pivot(PivotSpec::Random { seed: 11 }),
            None,
        )
        .unwrap();
        let precomputed = kwiksort_with_options(
            &GreaterThan,
            &(),
            &outputs,
            &RerankOptions::with_pivot(PivotSpec::Random { seed: 11 }).precomputed(),
            None,
        )
        .unwrap();
        assert_eq!(pairwise, precomputed);
        assert_eq!(pairwise, vec![1, 5, 3, 0, 4, 2]);
    }

    #[test]
    fn test_tie_is_fatal() {
        let outputs = [2u32, 2, 1];
        let err = kwiksort(&GreaterThan, &(), &outputs, &mut FirstPivotSelection).unwrap_err();
        match err {
            AxiomError::Tie { vertex, pivot } => {
                assert_eq!((vertex, pivot), (1, 0));
            }
            other => panic!("expected tie, got {other}"),
        }
    }
}
