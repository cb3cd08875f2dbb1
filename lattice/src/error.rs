use thiserror::Error;
use types::chain_path::ChainPath;

#[derive(PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("chain path is empty")]
    EmptyPath,
    #[error("chain {path} is already registered")]
    ChainAlreadyRegistered { path: ChainPath },
    #[error("chain {path} is not registered")]
    ChainNotFound { path: ChainPath },
}
