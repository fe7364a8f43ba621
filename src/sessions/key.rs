//! Order-preserving key encoding for `(app_name, user_id, session_id)` tuples.
//!
//! Each component is written as its UTF-8 bytes with every `0x00` escaped to
//! `0x00 0xFF`, followed by the terminator `0x00 0x01`. Byte-wise comparison
//! of two encoded keys then matches component-wise comparison of the tuples,
//! and component boundaries stay unambiguous whatever the identifiers contain.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const ESCAPE: u8 = 0x00;
const ESCAPED_NUL: u8 = 0xFF;
const TERMINATOR: u8 = 0x01;

/// Identity of one stored session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionId {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    pub fn encode(&self) -> EncodedKey {
        encode(&self.app_name, &self.user_id, &self.session_id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

/// An encoded store key. Ordering is byte-lexicographic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EncodedKey(Vec<u8>);

impl EncodedKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Smallest key strictly greater than every key starting with `self`.
    ///
    /// Returns `None` when no such key exists (empty or all-`0xFF` input),
    /// meaning the range is unbounded above.
    pub fn prefix_successor(&self) -> Option<Self> {
        let mut bytes = self.0.clone();
        while let Some(last) = bytes.pop() {
            if last < u8::MAX {
                bytes.push(last + 1);
                return Some(Self(bytes));
            }
        }
        None
    }
}

/// Malformed key bytes, i.e. bytes that [`encode`] never produces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyDecodeError {
    #[error("component {component} is not terminated")]
    Unterminated { component: usize },
    #[error("invalid escape byte {byte:#04x} at offset {offset}")]
    InvalidEscape { byte: u8, offset: usize },
    #[error("component {component} is not valid UTF-8")]
    InvalidUtf8 { component: usize },
    #[error("expected 3 components, found trailing bytes at offset {offset}")]
    TrailingBytes { offset: usize },
}

/// Encode the full session identity.
pub fn encode(app_name: &str, user_id: &str, session_id: &str) -> EncodedKey {
    let mut out = Vec::with_capacity(app_name.len() + user_id.len() + session_id.len() + 6);
    for component in [app_name, user_id, session_id] {
        push_component(&mut out, component);
    }
    EncodedKey(out)
}

/// Encode the `(app_name, user_id)` prefix shared by all of a user's sessions.
pub fn encode_prefix(app_name: &str, user_id: &str) -> EncodedKey {
    let mut out = Vec::with_capacity(app_name.len() + user_id.len() + 4);
    push_component(&mut out, app_name);
    push_component(&mut out, user_id);
    EncodedKey(out)
}

/// Decode a key produced by [`encode`].
pub fn decode(key: &EncodedKey) -> Result<SessionId, KeyDecodeError> {
    let bytes = key.as_bytes();
    let mut offset = 0;
    let mut parts: [String; 3] = Default::default();

    for (component, slot) in parts.iter_mut().enumerate() {
        let mut raw = Vec::new();
        loop {
            match bytes.get(offset) {
                None => return Err(KeyDecodeError::Unterminated { component }),
                Some(&ESCAPE) => {
                    match bytes.get(offset + 1) {
                        Some(&TERMINATOR) => {
                            offset += 2;
                            break;
                        }
                        Some(&ESCAPED_NUL) => raw.push(0x00),
                        Some(&byte) => {
                            return Err(KeyDecodeError::InvalidEscape {
                                byte,
                                offset: offset + 1,
                            })
                        }
                        None => return Err(KeyDecodeError::Unterminated { component }),
                    }
                    offset += 2;
                }
                Some(&byte) => {
                    raw.push(byte);
                    offset += 1;
                }
            }
        }
        *slot = String::from_utf8(raw).map_err(|_| KeyDecodeError::InvalidUtf8 { component })?;
    }

    if offset != bytes.len() {
        return Err(KeyDecodeError::TrailingBytes { offset });
    }

    let [app_name, user_id, session_id] = parts;
    Ok(SessionId {
        app_name,
        user_id,
        session_id,
    })
}

fn push_component(out: &mut Vec<u8>, component: &str) {
    for &byte in component.as_bytes() {
        if byte == ESCAPE {
            out.extend_from_slice(&[ESCAPE, ESCAPED_NUL]);
        } else {
            out.push(byte);
        }
    }
    out.extend_from_slice(&[ESCAPE, TERMINATOR]);
}
