use thiserror::Error;

/// A construction-time configuration mistake.
///
/// The parsing entry points hand these back so that callers can validate operator input.
/// The constructors that take a variant by name treat them as fatal instead, see
/// [`fatal`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unrecognized lock variant `{0}`, expected one of tas, ttas, ticket, pthread")]
    UnknownLock(String),

    #[error("unrecognized barrier variant `{0}`, expected one of sense, pthread")]
    UnknownBarrier(String),

    #[error("thread count must be at least 1")]
    NoThreads,

    #[error("epoch coordinator {coordinator} is not one of the {threads} threads")]
    CoordinatorOutOfRange { coordinator: usize, threads: usize },
}

/// Log a configuration error and abort the process.
///
/// An unknown variant name is an operator or programming mistake, never a condition the
/// benchmark could recover from, so there is nothing to unwind to.
#[cold]
pub fn fatal(error: ConfigError) -> ! {
    tracing::error!(%error, "fatal configuration error");
    std::process::abort()
}
