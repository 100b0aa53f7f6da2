use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Start requested while the target store is empty.
    #[error("add a target before starting")]
    NoTargets,
}
