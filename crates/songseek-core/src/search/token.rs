//! Selection tokens round-tripped through inline button callback data.
//!
//! Wire format, always ASCII and at most 64 bytes:
//!
//! - `s:d:<index>:<page>:<generation>` download the item at an absolute index
//! - `s:n:<page>:<generation>` show the next page
//! - `s:p:<page>:<generation>` show the previous page

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const PREFIX: &str = "s";

/// Errors produced when decoding callback data
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// Data does not start with the token prefix
    #[error("unknown callback prefix in {0:?}")]
    Prefix(String),
    /// Unknown action letter
    #[error("unknown token action {0:?}")]
    Action(String),
    /// Wrong number of fields for the action
    #[error("wrong field count for action {action:?}: {count}")]
    Arity {
        /// Action letter
        action: String,
        /// Number of fields after the action
        count: usize,
    },
    /// A numeric field failed to parse
    #[error("invalid number {0:?}")]
    Number(String),
}

/// An action minted by the pager and decoded from a button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionToken {
    /// Download the item at `index` (rendered on `page`)
    Download {
        /// Absolute index into the result set
        index: u32,
        /// Page the button was rendered on
        page: u32,
        /// Generation of the result set the index refers to
        generation: u32,
    },
    /// Move to the next page
    Next {
        /// Target page
        page: u32,
        /// Generation of the result set being paged
        generation: u32,
    },
    /// Move to the previous page
    Prev {
        /// Target page
        page: u32,
        /// Generation of the result set being paged
        generation: u32,
    },
}

impl SelectionToken {
    /// Generation embedded in the token.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        match *self {
            Self::Download { generation, .. }
            | Self::Next { generation, .. }
            | Self::Prev { generation, .. } => generation,
        }
    }

    /// Encode into callback data.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decode callback data.
    ///
    /// # Errors
    ///
    /// Returns a `TokenError` for malformed data.
    pub fn decode(data: &str) -> Result<Self, TokenError> {
        data.parse()
    }
}

impl fmt::Display for SelectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Download {
                index,
                page,
                generation,
            } => write!(f, "{PREFIX}:d:{index}:{page}:{generation}"),
            Self::Next { page, generation } => write!(f, "{PREFIX}:n:{page}:{generation}"),
            Self::Prev { page, generation } => write!(f, "{PREFIX}:p:{page}:{generation}"),
        }
    }
}

fn number(field: &str) -> Result<u32, TokenError> {
    field
        .parse()
        .map_err(|_| TokenError::Number(field.to_string()))
}

impl FromStr for SelectionToken {
    type Err = TokenError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut parts = data.split(':');
        if parts.next() != Some(PREFIX) {
            return Err(TokenError::Prefix(data.to_string()));
        }
        let action = parts.next().unwrap_or_default();
        let fields: Vec<&str> = parts.collect();

        let arity = |expected: usize| {
            if fields.len() == expected {
                Ok(())
            } else {
                Err(TokenError::Arity {
                    action: action.to_string(),
                    count: fields.len(),
                })
            }
        };

        match action {
            "d" => {
                arity(3)?;
                Ok(Self::Download {
                    index: number(fields[0])?,
                    page: number(fields[1])?,
                    generation: number(fields[2])?,
                })
            }
            "n" => {
                arity(2)?;
                Ok(Self::Next {
                    page: number(fields[0])?,
                    generation: number(fields[1])?,
                })
            }
            "p" => {
                arity(2)?;
                Ok(Self::Prev {
                    page: number(fields[0])?,
                    generation: number(fields[1])?,
                })
            }
            other => Err(TokenError::Action(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CALLBACK_DATA_MAX_BYTES;
    use proptest::prelude::*;

    #[test]
    fn test_wire_format() {
        let token = SelectionToken::Download {
            index: 7,
            page: 1,
            generation: 42,
        };
        assert_eq!(token.encode(), "s:d:7:1:42");
        assert_eq!(
            SelectionToken::Next {
                page: 2,
                generation: 3
            }
            .encode(),
            "s:n:2:3"
        );
        assert_eq!(SelectionToken::decode("s:p:0:3"), Ok(SelectionToken::Prev { page: 0, generation: 3 }));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(
            SelectionToken::decode("song:d:1:0:1"),
            Err(TokenError::Prefix(_))
        ));
        assert!(matches!(SelectionToken::decode(""), Err(TokenError::Prefix(_))));
        assert!(matches!(
            SelectionToken::decode("s:x:1:1"),
            Err(TokenError::Action(_))
        ));
        assert!(matches!(
            SelectionToken::decode("s:d:1:0"),
            Err(TokenError::Arity { count: 2, .. })
        ));
        assert!(matches!(
            SelectionToken::decode("s:n:1:2:3"),
            Err(TokenError::Arity { count: 3, .. })
        ));
        assert!(matches!(
            SelectionToken::decode("s:d:-1:0:1"),
            Err(TokenError::Number(_))
        ));
        assert!(matches!(
            SelectionToken::decode("s:n:abc:1"),
            Err(TokenError::Number(_))
        ));
    }

    #[test]
    fn test_worst_case_fits_callback_limit() {
        let token = SelectionToken::Download {
            index: u32::MAX,
            page: u32::MAX,
            generation: u32::MAX,
        };
        assert!(token.encode().len() <= CALLBACK_DATA_MAX_BYTES);
    }

    proptest! {
        #[test]
        fn prop_encoded_tokens_decode_and_fit(index: u32, page: u32, generation: u32, kind in 0u8..3) {
            let token = match kind {
                0 => SelectionToken::Download { index, page, generation },
                1 => SelectionToken::Next { page, generation },
                _ => SelectionToken::Prev { page, generation },
            };
            let data = token.encode();
            prop_assert!(data.len() <= CALLBACK_DATA_MAX_BYTES);
            prop_assert_eq!(SelectionToken::decode(&data), Ok(token));
        }
    }
}
