/// Why a controller's output could not be turned into an action.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum ControllerFault {
    #[error("controller returned no outputs")]
    EmptyOutput,
    #[error("controller returned non-finite output {0}")]
    NonFinite(f64),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {field} {reason}")]
    Config { field: &'static str, reason: String },

    #[error("optimizer returned an empty population for generation {generation}")]
    EmptyPopulation { generation: u32 },

    #[error(
        "optimizer returned {actual} members for generation {generation}, expected {expected}"
    )]
    PopulationSizeMismatch {
        generation: u32,
        expected: usize,
        actual: usize,
    },

    #[error("generation {generation} member {member}: {fault}")]
    ControllerOutput {
        generation: u32,
        member: usize,
        fault: ControllerFault,
    },

    #[error("failed to build evaluation thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Config {
            field,
            reason: reason.into(),
        }
    }

    /// Generation and member that triggered a contract violation, when known.
    pub fn culprit(&self) -> Option<(u32, Option<usize>)> {
        match self {
            Self::EmptyPopulation { generation }
            | Self::PopulationSizeMismatch { generation, .. } => Some((*generation, None)),
            Self::ControllerOutput {
                generation, member, ..
            } => Some((*generation, Some(*member))),
            Self::Config { .. } | Self::ThreadPool(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
