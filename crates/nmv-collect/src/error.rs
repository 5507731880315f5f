use nmv_parsers::RegistryError;
use nmv_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("join error in device task: {0}")]
    Join(String),
}
