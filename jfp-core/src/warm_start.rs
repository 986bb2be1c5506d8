//! Sort-based initial priority assignments.

use crate::problem::{DemandMatrix, PriorityMatrix};

/// Heuristic used to seed the search root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarmStart {
    /// Rank each link's jobs by the share of the job's total demand spent
    /// communicating on that link (largest share first).
    #[default]
    LinkCommRatio,

    /// Rank every link's jobs by the job's overall communication share,
    /// the same key on every link.
    JobCommRatio,

    /// Rank each link's jobs by job index.
    Identity,
}

/// Build the initial priority matrix for `demand`.
///
/// Ties keep job-index order. Inactive cells get rank 0.
pub fn warm_start(demand: &DemandMatrix, strategy: WarmStart) -> PriorityMatrix {
    let mut priority = PriorityMatrix::zeros(demand.num_jobs(), demand.num_links());

    for link in 0..demand.num_links() {
        let mut jobs: Vec<(usize, f64)> = demand
            .active_jobs(link)
            .map(|job| (job, sort_key(demand, job, link, strategy)))
            .collect();

        // Descending; sort_by is stable.
        jobs.sort_by(|a, b| b.1.total_cmp(&a.1));

        for (rank, (job, _)) in jobs.into_iter().enumerate() {
            priority.set_rank(job, link, rank);
        }
    }

    priority
}

fn sort_key(demand: &DemandMatrix, job: usize, link: usize, strategy: WarmStart) -> f64 {
    let total = demand.job_total(job);
    if total <= 0.0 {
        return 0.0;
    }
    match strategy {
        WarmStart::LinkCommRatio => demand.get(job, link).comm_size / total,
        WarmStart::JobCommRatio => demand.job_comm(job) / total,
        WarmStart::Identity => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demand() -> DemandMatrix {
        DemandMatrix::from_rows(&[
            vec![(1.0, 3.0), (0.0, 0.0)],
            vec![(1.0, 8.0), (0.0, 1.0)],
            vec![(0.0, 0.0), (1.0, 3.0)],
        ])
        .unwrap()
    }

    #[test]
    fn test_link_comm_ratio() {
        let d = demand();
        let p = warm_start(&d, WarmStart::LinkCommRatio);

        // Link 0: job 0 -> 3/4, job 1 -> 8/10.
        assert_eq!(p.rank(1, 0), 0);
        assert_eq!(p.rank(0, 0), 1);
        // Link 1: job 1 -> 1/10, job 2 -> 3/4.
        assert_eq!(p.rank(2, 1), 0);
        assert_eq!(p.rank(1, 1), 1);
        // Inactive cells.
        assert_eq!(p.rank(0, 1), 0);
        assert_eq!(p.rank(2, 0), 0);
        assert!(p.validate(&d).is_ok());
    }

    #[test]
    fn test_job_comm_ratio() {
        let d = demand();
        let p = warm_start(&d, WarmStart::JobCommRatio);

        // Job 1 communicates 9/10 of its demand, jobs 0 and 2 3/4.
        assert_eq!(p.rank(1, 0), 0);
        assert_eq!(p.rank(0, 0), 1);
        assert_eq!(p.rank(1, 1), 0);
        assert_eq!(p.rank(2, 1), 1);
        assert!(p.validate(&d).is_ok());
    }

    #[test]
    fn test_identity_and_ties() {
        let d = DemandMatrix::from_rows(&[vec![(1.0, 1.0)], vec![(2.0, 2.0)], vec![(0.0, 5.0)]])
            .unwrap();

        let p = warm_start(&d, WarmStart::Identity);
        assert_eq!(p.to_rows(), vec![vec![0], vec![1], vec![2]]);

        // Jobs 0 and 1 tie at 1/2; job 2 is pure communication.
        let p = warm_start(&d, WarmStart::LinkCommRatio);
        assert_eq!(p.to_rows(), vec![vec![1], vec![2], vec![0]]);
    }
}
