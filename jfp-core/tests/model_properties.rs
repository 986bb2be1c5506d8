//! Property tests for the link-sharing model on random instances.

use jfp_core::{
    evaluate, select_actions, warm_start, DemandMatrix, LinkDemand, PriorityMatrix, WarmStart,
    DEFAULT_EPOCH_BUDGET,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Random demand where roughly half the cells are inactive and every job
/// uses at least one link.
fn random_demand(rng: &mut ChaCha8Rng, jobs: usize, links: usize) -> DemandMatrix {
    let mut cells = vec![LinkDemand::default(); jobs * links];
    for j in 0..jobs {
        let forced = rng.gen_range(0..links);
        for l in 0..links {
            if l == forced || rng.gen_bool(0.5) {
                cells[j * links + l] =
                    LinkDemand::new(rng.gen_range(0.0..5.0), rng.gen_range(0.5..20.0));
            }
        }
    }
    DemandMatrix::new(jobs, links, cells).unwrap()
}

/// Active ranks on every link are exactly 0..k-1.
fn assert_contiguous(demand: &DemandMatrix, priority: &PriorityMatrix) {
    for link in 0..demand.num_links() {
        let mut ranks: Vec<usize> = demand
            .active_jobs(link)
            .map(|job| priority.rank(job, link))
            .collect();
        ranks.sort_unstable();
        let expected: Vec<usize> = (0..ranks.len()).collect();
        assert_eq!(ranks, expected, "link {} ranks are not contiguous", link);
    }
}

#[test]
fn test_swaps_keep_ranks_contiguous() {
    let mut rng = ChaCha8Rng::seed_from_u64(12345);

    for _ in 0..20 {
        let demand = random_demand(&mut rng, 6, 4);
        let mut priority = warm_start(&demand, WarmStart::LinkCommRatio);

        // Walk a few swaps deep.
        for _ in 0..5 {
            let eval = evaluate(&demand, &priority, DEFAULT_EPOCH_BUDGET).unwrap();
            let actions =
                select_actions(&eval.desirability, &demand, &priority, 3, &mut rng).unwrap();
            let Some(action) = actions.first() else {
                break;
            };

            priority = priority.apply(action).unwrap();
            assert_contiguous(&demand, &priority);
        }
    }
}

#[test]
fn test_no_action_promotes_front_of_line() {
    let mut rng = ChaCha8Rng::seed_from_u64(54321);

    for _ in 0..20 {
        let demand = random_demand(&mut rng, 5, 3);
        let priority = warm_start(&demand, WarmStart::JobCommRatio);
        let eval = evaluate(&demand, &priority, DEFAULT_EPOCH_BUDGET).unwrap();

        let actions = select_actions(&eval.desirability, &demand, &priority, 4, &mut rng).unwrap();
        for action in &actions {
            assert_ne!(priority.rank_at(action.promote), 0);
            assert_eq!(action.promote.link, action.demote.link);
            assert_eq!(
                priority.rank_at(action.demote) + 1,
                priority.rank_at(action.promote)
            );
        }
    }
}

#[test]
fn test_evaluate_is_deterministic_and_bounded() {
    let mut rng = ChaCha8Rng::seed_from_u64(777);

    for _ in 0..20 {
        let demand = random_demand(&mut rng, 4, 3);
        let priority = warm_start(&demand, WarmStart::LinkCommRatio);

        let a = evaluate(&demand, &priority, DEFAULT_EPOCH_BUDGET).unwrap();
        let b = evaluate(&demand, &priority, DEFAULT_EPOCH_BUDGET).unwrap();
        assert_eq!(a, b);

        assert!(a.objective >= 0.0);
        // Sharing can only slow a job down.
        assert!(a.job_slowdown.iter().all(|&s| s >= 1.0 - 1e-12));
        assert!(a.epochs_run >= 1 && a.epochs_run <= DEFAULT_EPOCH_BUDGET);
    }
}

#[test]
fn test_disjoint_links_do_not_interact() {
    // Jobs 0 and 1 share link 0; jobs 2 and 3 share link 1. No job touches
    // both links, and jobs 2 and 3 have identical demand.
    let demand = DemandMatrix::from_rows(&[
        vec![(1.0, 4.0), (0.0, 0.0)],
        vec![(2.0, 3.0), (0.0, 0.0)],
        vec![(0.0, 0.0), (1.0, 6.0)],
        vec![(0.0, 0.0), (1.0, 6.0)],
    ])
    .unwrap();

    let base =
        PriorityMatrix::from_rows(&[vec![0, 0], vec![1, 0], vec![0, 0], vec![0, 1]]).unwrap();
    let flipped =
        PriorityMatrix::from_rows(&[vec![0, 0], vec![1, 0], vec![0, 1], vec![0, 0]]).unwrap();

    let a = evaluate(&demand, &base, DEFAULT_EPOCH_BUDGET).unwrap();
    let b = evaluate(&demand, &flipped, DEFAULT_EPOCH_BUDGET).unwrap();

    assert!((a.objective - b.objective).abs() < 1e-12);
    assert_eq!(a.epochs_run, b.epochs_run);
    // Reordering link 1 leaves the jobs of link 0 untouched.
    assert_eq!(a.job_slowdown[0], b.job_slowdown[0]);
    assert_eq!(a.job_slowdown[1], b.job_slowdown[1]);
    assert_eq!(a.job_slowdown[2], b.job_slowdown[3]);
}

#[test]
fn test_jobs_alone_on_their_links() {
    let demand = DemandMatrix::from_rows(&[
        vec![(1.0, 4.0), (0.0, 0.0), (0.0, 0.0)],
        vec![(0.0, 0.0), (2.0, 3.0), (0.0, 0.0)],
        vec![(0.0, 0.0), (0.0, 0.0), (5.0, 1.0)],
    ])
    .unwrap();
    let priority = warm_start(&demand, WarmStart::LinkCommRatio);

    let eval = evaluate(&demand, &priority, DEFAULT_EPOCH_BUDGET).unwrap();
    assert_eq!(eval.objective, 1.0);
    assert!(eval.desirability.nonzero_cells().is_empty());
}
