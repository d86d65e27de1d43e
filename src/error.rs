/// Failure of a keyed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("key not found")]
    NotFound,
}

pub type Result<T> = core::result::Result<T, Error>;
