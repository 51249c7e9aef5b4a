//! Drift detection — compare a recorded session against its replay.

use replay_kernel::hashing::{stream_digest, Delivered};

/// Verify that two delivered streams are identical by digest.
/// Panics on failure.
pub fn verify_determinism(recorded: &[Delivered], replayed: &[Delivered]) {
    let report = compare_streams(recorded, replayed);
    if !report.is_identical() {
        panic!(
            "DETERMINISM FAILURE: replay diverged from recording.\n\
             Recorded: {} ({} events)\n\
             Replayed: {} ({} events)\n\
             First divergence at index: {:?}",
            report.digest_a, report.len_a, report.digest_b, report.len_b, report.first_divergence
        );
    }
}

/// Structured comparison of two delivered streams.
pub fn compare_streams(a: &[Delivered], b: &[Delivered]) -> DivergenceReport {
    let first_divergence = a
        .iter()
        .zip(b.iter())
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())));

    let synthetic_a = a.iter().filter(|d| d.event.synthetic).count();
    let synthetic_b = b.iter().filter(|d| d.event.synthetic).count();

    DivergenceReport {
        len_a: a.len(),
        len_b: b.len(),
        synthetic_a,
        synthetic_b,
        digest_a: stream_digest(a),
        digest_b: stream_digest(b),
        first_divergence,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivergenceReport {
    pub len_a: usize,
    pub len_b: usize,
    pub synthetic_a: usize,
    pub synthetic_b: usize,
    pub digest_a: String,
    pub digest_b: String,
    /// Index of the first differing event, or the shorter length when one
    /// stream is a prefix of the other.
    pub first_divergence: Option<usize>,
}

impl DivergenceReport {
    pub fn is_identical(&self) -> bool {
        self.first_divergence.is_none() && self.digest_a == self.digest_b
    }
}
