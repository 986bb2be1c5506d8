//! Candidate swap selection.
//!
//! Turns a [`SwapDesirability`] matrix into a short list of single-swap
//! moves: the most promising cells greedily, plus a few random ones so the
//! search does not only ever follow the first-epoch estimate.

use rand::Rng;

use crate::convergence::SwapDesirability;
use crate::error::{ModelError, ModelResult};
use crate::problem::{DemandMatrix, Position, PriorityMatrix, SwapAction};

/// Pick cells to promote.
///
/// Takes the `max_actions` nonzero cells with the smallest desirability, then
/// samples `max_actions / 2 + 1` more nonzero cells uniformly, without
/// replacement, from the rest. Either step takes fewer when fewer are left.
pub fn select_cells<R: Rng + ?Sized>(
    desirability: &SwapDesirability,
    max_actions: usize,
    rng: &mut R,
) -> Vec<Position> {
    let mut ranked = desirability.nonzero_cells();
    // Stable: ties keep row-major order.
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    let greedy = max_actions.min(ranked.len());
    let mut cells: Vec<Position> = ranked[..greedy].iter().map(|&(pos, _)| pos).collect();

    let mut working = desirability.clone();
    for pos in &cells {
        working.set(pos.job, pos.link, 0.0);
    }

    let remaining = working.nonzero_cells();
    let extra = (max_actions / 2 + 1).min(remaining.len());
    let sampled = rand::seq::index::sample(rng, remaining.len(), extra);
    cells.extend(sampled.iter().map(|idx| remaining[idx].0));

    cells
}

/// Pair each cell with the job one rank ahead of it on the same link.
///
/// Cells already at the front of their link cannot be promoted and are
/// dropped. Duplicate actions are removed.
pub fn pair_with_peers(
    cells: &[Position],
    demand: &DemandMatrix,
    priority: &PriorityMatrix,
) -> ModelResult<Vec<SwapAction>> {
    let mut actions: Vec<SwapAction> = Vec::with_capacity(cells.len());

    for &cell in cells {
        let rank = priority.rank_at(cell);
        if rank == 0 {
            continue;
        }

        let peer = priority
            .job_at(demand, cell.link, rank - 1)
            .ok_or_else(|| ModelError::BrokenRankOrder {
                link: cell.link,
                detail: format!("no job holds rank {} ahead of {}", rank - 1, cell),
            })?;

        let action = SwapAction::new(cell, Position::new(peer, cell.link));
        if !actions.contains(&action) {
            actions.push(action);
        }
    }

    Ok(actions)
}

/// Select up to `max_actions + max_actions / 2 + 1` distinct swap actions.
pub fn select_actions<R: Rng + ?Sized>(
    desirability: &SwapDesirability,
    demand: &DemandMatrix,
    priority: &PriorityMatrix,
    max_actions: usize,
    rng: &mut R,
) -> ModelResult<Vec<SwapAction>> {
    let cells = select_cells(desirability, max_actions, rng);
    pair_with_peers(&cells, demand, priority)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn desirability(rows: &[&[f64]]) -> SwapDesirability {
        let mut d = SwapDesirability::zeros(rows.len(), rows[0].len());
        for (j, row) in rows.iter().enumerate() {
            for (l, &v) in row.iter().enumerate() {
                d.set(j, l, v);
            }
        }
        d
    }

    #[test]
    fn test_greedy_cells_come_first() {
        let d = desirability(&[&[0.5, -0.2], &[-0.9, 0.0], &[0.1, 0.3]]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let cells = select_cells(&d, 2, &mut rng);
        assert_eq!(cells[0], Position::new(1, 0));
        assert_eq!(cells[1], Position::new(0, 1));
        // 2 / 2 + 1 random extras from the three remaining nonzero cells.
        assert_eq!(cells.len(), 4);
        assert!(!cells.contains(&Position::new(1, 1)));
    }

    #[test]
    fn test_sampled_cells_are_distinct() {
        let d = desirability(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]]);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let mut cells = select_cells(&d, 4, &mut rng);
        assert_eq!(cells.len(), 7);
        cells.sort();
        cells.dedup();
        assert_eq!(cells.len(), 7);
    }

    #[test]
    fn test_few_nonzero_cells() {
        let d = desirability(&[&[0.0, -1.0], &[0.0, 0.0]]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(select_cells(&d, 3, &mut rng), vec![Position::new(0, 1)]);

        let empty = SwapDesirability::zeros(2, 2);
        assert!(select_cells(&empty, 3, &mut rng).is_empty());
    }

    #[test]
    fn test_selection_is_reproducible() {
        let d = desirability(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]]);
        let a = select_cells(&d, 2, &mut ChaCha8Rng::seed_from_u64(3));
        let b = select_cells(&d, 2, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_pairing_drops_front_of_line() {
        let demand =
            DemandMatrix::from_rows(&[vec![(1.0, 1.0)], vec![(1.0, 2.0)], vec![(1.0, 3.0)]])
                .unwrap();
        let priority = PriorityMatrix::from_rows(&[vec![2], vec![0], vec![1]]).unwrap();

        let cells = [Position::new(0, 0), Position::new(1, 0), Position::new(2, 0)];
        let actions = pair_with_peers(&cells, &demand, &priority).unwrap();

        assert_eq!(
            actions,
            vec![
                SwapAction::new(Position::new(0, 0), Position::new(2, 0)),
                SwapAction::new(Position::new(2, 0), Position::new(1, 0)),
            ]
        );
        for action in &actions {
            assert_ne!(priority.rank_at(action.promote), 0);
            assert!(priority.apply(action).is_ok());
        }
    }

    #[test]
    fn test_pairing_rejects_broken_order() {
        let demand = DemandMatrix::from_rows(&[vec![(1.0, 1.0)], vec![(1.0, 2.0)]]).unwrap();
        // Ranks 0 and 2: nobody at rank 1.
        let priority = PriorityMatrix::from_rows(&[vec![0], vec![2]]).unwrap();

        let result = pair_with_peers(&[Position::new(1, 0)], &demand, &priority);
        assert!(matches!(result, Err(ModelError::BrokenRankOrder { link: 0, .. })));
    }
}
