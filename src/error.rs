use thiserror::Error;

/// Everything that can go wrong between reading a problem and reporting its answer.
///
/// The CLI collapses all of these into the same `-1` output; the variants exist so
/// the library and its logs can tell them apart.
#[derive(Debug, Error)]
pub enum Error {
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("{what} count must be positive (found {value})")]
    NonPositiveCount { what: &'static str, value: i64 },
    #[error("{what} must not be negative (found {value})")]
    NegativeQuantity { what: &'static str, value: i64 },
    #[error("child {child} requests unknown factory {factory}")]
    UnknownFactory { child: usize, factory: i64 },
    #[error("country {0} is not declared")]
    UnknownCountry(i64),
    #[error("child {0} requests no factories")]
    EmptyRequest(usize),
    #[error("child {child} requests factory {factory} more than once")]
    DuplicateRequest { child: usize, factory: i64 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Solver(#[from] good_lp::ResolutionError),
    #[error("pipeline panicked")]
    Panicked,
}
