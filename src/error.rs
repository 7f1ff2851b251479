use std::backtrace::Backtrace;
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised while compiling a symbolic query into a solver instance.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("query has no constraint triplets")]
    EmptyQuery,
    #[error("unknown node `{0}`")]
    UnknownNode(String),
    #[error("variable ?{0} appears in a may-equal pair but in no constraint")]
    UnknownVariable(u32),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Inner: {inner}\n{backtrace}")]
    Inner {
        inner: Box<QueryError>,
        backtrace: Box<Backtrace>,
    },
}

impl From<QueryError> for Error {
    fn from(inner: QueryError) -> Self {
        Error::Inner {
            inner: Box::new(inner),
            backtrace: Box::new(std::backtrace::Backtrace::capture()),
        }
    }
}
