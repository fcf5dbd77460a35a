use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid probe: {0}")]
    InvalidProbe(String),

    #[error("pigeonhole partitioning requires a k-mer size smaller than min_k")]
    PigeonholeRequiresTooSmallKmerSize,

    #[error("probe-finding pool is not open")]
    PoolNotOpen,

    #[error("probe-finding pool is already open")]
    PoolAlreadyOpen,

    #[error("worker fault during find(): {0}")]
    WorkerFault(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
