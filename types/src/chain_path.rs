use core::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::primitives::ChainName;

const SEPARATOR: char = '/';

/// Names of chains leading from a root chain down to one of its descendants.
///
/// The first name is the root chain. An empty path refers to no chain at all.
#[derive(
    Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug, Deref, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChainPath(Vec<ChainName>);

impl FromIterator<ChainName> for ChainPath {
    fn from_iter<I: IntoIterator<Item = ChainName>>(names: I) -> Self {
        Self(names.into_iter().collect())
    }
}

impl FromStr for ChainPath {
    type Err = ParseChainPathError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        if string.is_empty() {
            return Err(ParseChainPathError::Empty);
        }

        string
            .split(SEPARATOR)
            .enumerate()
            .map(|(position, name)| {
                if name.is_empty() {
                    return Err(ParseChainPathError::EmptyName {
                        path: string.to_owned(),
                        position,
                    });
                }

                Ok(ChainName::from(name))
            })
            .collect()
    }
}

impl Display for ChainPath {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        for (position, name) in self.0.iter().enumerate() {
            if position > 0 {
                write!(formatter, "{SEPARATOR}")?;
            }

            formatter.write_str(name.as_ref())?;
        }

        Ok(())
    }
}

impl ChainPath {
    #[must_use]
    pub fn root(&self) -> Option<&ChainName> {
        self.0.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ChainName> {
        self.0.last()
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    #[must_use]
    pub fn child(&self, name: ChainName) -> Self {
        let mut names = self.0.clone();
        names.push(name);
        Self(names)
    }
}

#[derive(PartialEq, Eq, Debug, Error)]
pub enum ParseChainPathError {
    #[error("chain path is empty")]
    Empty,
    #[error("chain path {path:?} has an empty chain name at position {position}")]
    EmptyName { path: String, position: usize },
}
