//! Transfer scenario parameters and validation.
use comm::Tag;
use std::fmt;
use std::str::FromStr;

/// Fixed parameters of one upper-triangle transfer run.
#[derive(Clone, Debug)]
pub struct Scenario {
    /// Matrix dimension.
    pub dim: usize,

    /// Rank that owns and sends the matrix.
    pub source: usize,

    /// Rank that receives the upper triangle.
    pub dest: usize,

    /// Message tag for the transfer.
    pub tag: Tag,

    /// Number of transfers to perform; this demo supports exactly one.
    pub reps: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Repetition count must be exactly 1.
    BadRepetitionCount(usize),

    /// Source and destination rank must differ.
    SameSourceAndDest(usize),

    /// The group needs at least two members.
    GroupTooSmall(usize),

    /// Matrix dimension must be at least 1.
    InvalidDimension(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BadRepetitionCount(reps) => {
                write!(f, "repetition count must be 1, got {}", reps)
            }
            ConfigError::SameSourceAndDest(rank) => {
                write!(f, "source and destination rank must differ, both are {}", rank)
            }
            ConfigError::GroupTooSmall(size) => {
                write!(f, "at least 2 processes are required, got {}", size)
            }
            ConfigError::InvalidDimension(dim) => {
                write!(f, "matrix dimension must be at least 1, got {}", dim)
            }
        }
    }
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: fmt::Debug,
{
    match std::env::var(name) {
        Ok(value) => value.parse().expect("invalid scenario override in environment"),
        Err(_) => default,
    }
}

impl Scenario {
    /// Reference scenario: the upper triangle of a 4x4 matrix from rank 0 to
    /// rank 1, tag 10, one transfer.
    pub const DEFAULT: Scenario = Scenario {
        dim: 4,
        source: 0,
        dest: 1,
        tag: 10,
        reps: 1,
    };

    /// Scenario for this run: the reference constants, each one overridable
    /// through the environment (TRI_DIM, TRI_SOURCE, TRI_DEST, TRI_TAG,
    /// TRI_REPS) so other configurations can be exercised.
    pub fn from_env() -> Scenario {
        Scenario {
            dim: env_or("TRI_DIM", Scenario::DEFAULT.dim),
            source: env_or("TRI_SOURCE", Scenario::DEFAULT.source),
            dest: env_or("TRI_DEST", Scenario::DEFAULT.dest),
            tag: env_or("TRI_TAG", Scenario::DEFAULT.tag),
            reps: env_or("TRI_REPS", Scenario::DEFAULT.reps),
        }
    }

    /// Check the scenario against the group. Run on the source rank only,
    /// before the initial barrier; a violation must take the whole group
    /// down, not just this process.
    pub fn validate(&self, group_size: usize) -> Result<(), ConfigError> {
        if self.reps != 1 {
            return Err(ConfigError::BadRepetitionCount(self.reps));
        }
        if self.source == self.dest {
            return Err(ConfigError::SameSourceAndDest(self.source));
        }
        if group_size < 2 {
            return Err(ConfigError::GroupTooSmall(group_size));
        }
        if self.dim < 1 {
            return Err(ConfigError::InvalidDimension(self.dim));
        }
        Ok(())
    }
}
