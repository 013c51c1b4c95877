//! Base64 helpers for payload fields that carry binary data.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use std::borrow::Cow;
use std::fmt::Display;

/// Base64 text borrowed from (or owned by) a payload document.
///
/// ```rust
/// use x402_types::util::Base64Bytes;
///
/// let encoded = Base64Bytes::encode(b"hello world");
/// assert_eq!(encoded.to_string(), "aGVsbG8gd29ybGQ=");
/// assert_eq!(encoded.decode_bounded(64).unwrap(), b"hello world");
/// assert!(encoded.decode_bounded(4).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes<'a>(pub Cow<'a, [u8]>);

#[derive(Debug, thiserror::Error)]
pub enum Base64Error {
    #[error("base64 text of {len} bytes exceeds the {max} byte limit")]
    TooLong { len: usize, max: usize },
    #[error(transparent)]
    Decode(#[from] base64::DecodeError),
}

impl Base64Bytes<'_> {
    /// Decodes the base64 text to raw binary data.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64.decode(&self.0)
    }

    /// Decodes the base64 text, refusing input whose decoded form could exceed `max_decoded` bytes.
    ///
    /// The length check happens before any allocation for the decoded output.
    pub fn decode_bounded(&self, max_decoded: usize) -> Result<Vec<u8>, Base64Error> {
        let max_encoded = max_decoded.div_ceil(3) * 4;
        let len = self.0.len();
        if len > max_encoded {
            return Err(Base64Error::TooLong {
                len,
                max: max_encoded,
            });
        }
        let decoded = b64.decode(&self.0)?;
        if decoded.len() > max_decoded {
            return Err(Base64Error::TooLong {
                len: decoded.len(),
                max: max_decoded,
            });
        }
        Ok(decoded)
    }

    /// Encodes raw binary data into base64 text.
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Base64Bytes<'static> {
        let encoded = b64.encode(input.as_ref());
        Base64Bytes(Cow::Owned(encoded.into_bytes()))
    }
}

impl AsRef<[u8]> for Base64Bytes<'_> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<'a> From<&'a [u8]> for Base64Bytes<'a> {
    fn from(slice: &'a [u8]) -> Self {
        Base64Bytes(Cow::Borrowed(slice))
    }
}

impl<'a> From<&'a str> for Base64Bytes<'a> {
    fn from(s: &'a str) -> Self {
        Base64Bytes(Cow::Borrowed(s.as_bytes()))
    }
}

impl Display for Base64Bytes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.0.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bounded_rejects_garbage() {
        let garbage = Base64Bytes::from("not base64!!");
        assert!(matches!(
            garbage.decode_bounded(1232),
            Err(Base64Error::Decode(_))
        ));
    }

    #[test]
    fn test_decode_bounded_exact_limit() {
        let data = vec![7u8; 1232];
        let encoded = Base64Bytes::encode(&data);
        assert_eq!(encoded.decode_bounded(1232).unwrap(), data);
        assert!(matches!(
            encoded.decode_bounded(1231),
            Err(Base64Error::TooLong { .. })
        ));
    }
}
