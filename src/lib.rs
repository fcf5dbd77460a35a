pub mod candidate;
pub mod cover;
pub mod error;
pub mod index;
pub mod logging;
pub mod pool;
pub mod probe;
pub mod shared_index;

pub use candidate::{make_candidate_probes, make_candidate_probes_from_sequences, CandidateParams};
pub use cover::{longest_cover, make_cover_fn, CoverFn, CoverParams};
pub use error::{CoreError, Result};
pub use index::{build_index, build_pigeonhole_index, build_random_index, KmerIndex, Posting};
pub use pool::{
    close_probe_finding_pool, find_probe_covers_in_sequence, open_probe_finding_pool,
    ProbeFindingPool, Range,
};
pub use probe::{KmerMemo, Probe};
pub use shared_index::{SharedKmerIndex, SharedPosting};
