//! Marshaling between caller values and native arguments.
//!
//! Configuration strings are opaque to the binding: they are forwarded
//! verbatim, except that a missing or blank configuration becomes the
//! native null configuration. Data source names and configuration text
//! cross a C boundary in real engines, so interior NUL bytes are rejected
//! here rather than silently truncated.

use crate::error::{CoreError, CoreResult};

/// A value usable as a native configuration string.
///
/// Implemented for string types, for `Option`s of them and for the
/// builders in [`config`](crate::config).
pub trait ConfigArg {
    /// Renders the configuration text, or `None` for no configuration.
    fn render(&self) -> Option<String>;
}

impl ConfigArg for str {
    fn render(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl ConfigArg for String {
    fn render(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl<T: ConfigArg + ?Sized> ConfigArg for &T {
    fn render(&self) -> Option<String> {
        (**self).render()
    }
}

impl<T: ConfigArg> ConfigArg for Option<T> {
    fn render(&self) -> Option<String> {
        self.as_ref().and_then(ConfigArg::render)
    }
}

/// Renders a configuration argument for a native call.
///
/// Blank text is the native null configuration.
pub(crate) fn config_arg<C: ConfigArg + ?Sized>(config: &C) -> CoreResult<Option<String>> {
    match config.render() {
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) if text.contains('\0') => Err(CoreError::invalid_argument(
            "configuration contains a NUL byte",
        )),
        other => Ok(other),
    }
}

/// Validates a data source name for a native call.
pub(crate) fn name_arg(name: &str) -> CoreResult<&str> {
    if name.is_empty() {
        return Err(CoreError::invalid_argument("name is empty"));
    }
    if name.contains('\0') {
        return Err(CoreError::invalid_argument("name contains a NUL byte"));
    }
    Ok(name)
}

/// Rejects empty key or value buffers.
pub(crate) fn require_bytes<'a>(what: &str, bytes: &'a [u8]) -> CoreResult<&'a [u8]> {
    if bytes.is_empty() {
        Err(CoreError::invalid_argument(format!("{what} is empty")))
    } else {
        Ok(bytes)
    }
}

const ESCAPE: u8 = 0x00;
const ESCAPED_NUL: u8 = 0xFF;
const TERMINATOR: u8 = 0x00;

/// Packs an index key and a primary key into one index entry key.
///
/// NUL bytes in the index key are escaped as `00 FF` and the index key is
/// terminated by `00 00`, so entries sort by index key first and primary key
/// second under byte order, and entries of a shorter index key sort before
/// those of any key it prefixes.
#[must_use]
pub fn pack_index_key(index_key: &[u8], primary_key: &[u8]) -> Vec<u8> {
    let escapes = index_key.iter().filter(|&&b| b == ESCAPE).count();
    let mut out = Vec::with_capacity(index_key.len() + escapes + 2 + primary_key.len());
    for &byte in index_key {
        out.push(byte);
        if byte == ESCAPE {
            out.push(ESCAPED_NUL);
        }
    }
    out.push(ESCAPE);
    out.push(TERMINATOR);
    out.extend_from_slice(primary_key);
    out
}

/// Splits an index entry key into its index key and primary key.
///
/// # Errors
///
/// Returns [`CoreError::InvalidArgument`] if `entry` was not produced by
/// [`pack_index_key`].
pub fn split_index_key(entry: &[u8]) -> CoreResult<(Vec<u8>, Vec<u8>)> {
    let mut index_key = Vec::with_capacity(entry.len());
    let mut bytes = entry.iter().enumerate();
    while let Some((pos, &byte)) = bytes.next() {
        if byte != ESCAPE {
            index_key.push(byte);
            continue;
        }
        match bytes.next() {
            Some((_, &ESCAPED_NUL)) => index_key.push(ESCAPE),
            Some((_, &TERMINATOR)) => return Ok((index_key, entry[pos + 2..].to_vec())),
            _ => break,
        }
    }
    Err(CoreError::invalid_argument("malformed index entry"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blank_config_is_null() {
        assert_eq!(config_arg("").unwrap(), None);
        assert_eq!(config_arg("  \t").unwrap(), None);
        assert_eq!(config_arg(&None::<&str>).unwrap(), None);
        assert_eq!(config_arg("create").unwrap().as_deref(), Some("create"));
        assert_eq!(
            config_arg(&Some(String::from(" create "))).unwrap().as_deref(),
            Some(" create ")
        );
    }

    #[test]
    fn nul_bytes_rejected() {
        assert!(config_arg("a\0b").is_err());
        assert!(name_arg("table:\0").is_err());
        assert!(name_arg("").is_err());
        assert_eq!(name_arg("table:t").unwrap(), "table:t");
    }

    #[test]
    fn empty_buffers_rejected() {
        assert!(require_bytes("key", b"").is_err());
        assert_eq!(require_bytes("key", b"k").unwrap(), b"k");
    }

    #[test]
    fn index_key_with_nul() {
        let entry = pack_index_key(b"a\0b", b"pk");
        assert_eq!(entry, b"a\0\xffb\0\0pk");
        assert_eq!(
            split_index_key(&entry).unwrap(),
            (b"a\0b".to_vec(), b"pk".to_vec())
        );
    }

    #[test]
    fn malformed_index_entries() {
        assert!(split_index_key(b"abc").is_err());
        assert!(split_index_key(b"ab\0").is_err());
        assert!(split_index_key(b"ab\0\x01pk").is_err());
    }

    proptest! {
        #[test]
        fn index_entries_sort_like_pairs(
            a in proptest::collection::vec(any::<u8>(), 0..8),
            b in proptest::collection::vec(any::<u8>(), 0..8),
            pa in proptest::collection::vec(any::<u8>(), 0..4),
            pb in proptest::collection::vec(any::<u8>(), 0..4),
        ) {
            let left = pack_index_key(&a, &pa);
            let right = pack_index_key(&b, &pb);
            prop_assert_eq!(left.cmp(&right), (&a, &pa).cmp(&(&b, &pb)));
            prop_assert_eq!(split_index_key(&left).unwrap(), (a, pa));
        }
    }
}
