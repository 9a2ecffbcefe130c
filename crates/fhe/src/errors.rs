use thiserror::Error;

/// The Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum encapsulating all the possible errors from this library.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Indicates that an error in the underlying mathematical library was
    /// encountered.
    #[error("{0}")]
    MathError(fhe_math::Error),

    /// Indicates that an error in the parameters was encountered.
    #[error("{0}")]
    ParametersError(ParametersError),

    /// Indicates an invalid reconstruction threshold.
    #[error("Invalid threshold {0}: the threshold should be at least 1")]
    InvalidThreshold(usize),

    /// Indicates that operands are not at the same level of the modulus chain.
    #[error("Level mismatch: {0}")]
    LevelMismatch(String),

    /// Indicates that fewer parties than the threshold are active.
    #[error("Not enough active parties: {0} is below the threshold {1}")]
    InsufficientParties(usize, usize),

    /// Indicates a public point that cannot be used for Shamir secret
    /// sharing.
    #[error("Invalid public point {0}")]
    InvalidPublicPoint(u64),

    /// Indicates a public point that was not declared to the combiner.
    #[error("Unknown public point {0}")]
    UnknownPublicPoint(u64),

    /// Indicates a public point appearing twice in a quorum.
    #[error("Duplicate public point {0}")]
    DuplicatePublicPoint(u64),

    /// Indicates that the own public point of a party is not part of the
    /// quorum it combines shares for.
    #[error("Public point {0} is not part of the quorum")]
    PublicPointNotInQuorum(u64),

    /// Indicates a default error
    #[error("{0}")]
    DefaultError(String),
}

impl From<fhe_math::Error> for Error {
    fn from(e: fhe_math::Error) -> Self {
        match e {
            fhe_math::Error::LevelMismatch(msg) => Error::LevelMismatch(msg),
            e => Error::MathError(e),
        }
    }
}

impl From<ParametersError> for Error {
    fn from(e: ParametersError) -> Self {
        Error::ParametersError(e)
    }
}

/// Separate enum to indicate parameters-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParametersError {
    /// Indicates that the degree is invalid.
    #[error("Invalid degree: {0} is not a power of 2 larger than 8")]
    InvalidDegree(usize),

    /// Indicates that the moduli sizes are invalid.
    #[error("Invalid modulus size: {0}, expected an integer between {1} and {2}")]
    InvalidModulusSize(usize, usize, usize),

    /// Indicates that there exists not enough primes of this size.
    #[error("Not enough primes of size {0} for polynomials of degree {1}")]
    NotEnoughPrimes(usize, usize),

    /// Indicates that the moduli are not valid.
    #[error("Invalid moduli: {0}")]
    InvalidModuli(String),

    /// Indicates that too many parameters were specified.
    #[error("{0}")]
    TooManySpecified(String),

    /// Indicates that too few parameters were specified.
    #[error("{0}")]
    TooFewSpecified(String),
}
