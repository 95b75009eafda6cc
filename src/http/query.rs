//! URL query string parsing with form-style percent-decoding.

use crate::http::types::QueryParameters;
use memchr::memchr;
use std::borrow::Cow;

/// URL query string parser.
///
/// Splits on `&`, then every segment on its first `=`. Keys and values are
/// [decoded](decode) before being stored. A segment without `=` is stored
/// with a `None` value, empty segments (`a=1&&b=2`) are skipped.
///
/// # Examples
/// ```rust
/// use simple_httpd::query::Query;
///
/// let params = Query::parse("name=john&tag=a&flag&tag=b&tag=a");
///
/// assert_eq!(params.value("name"), Some("john"));
/// assert_eq!(params.get("flag"), Some(&None));
/// assert_eq!(params.value("tag"), Some("a"));
/// assert_eq!(params.get_all("tag").map(|v| v.len()), Some(2));
/// ```
pub struct Query;

impl Query {
    /// Parses a query string (without the leading `?`) into a new collection.
    #[inline]
    pub fn parse(query: &str) -> QueryParameters {
        let mut result = QueryParameters::new();
        Self::parse_into(&mut result, query);
        result
    }

    /// Parses a query string, appending to an existing collection.
    ///
    /// Keys already present keep their first value in the single view.
    pub fn parse_into(result: &mut QueryParameters, query: &str) {
        let data = query.as_bytes();

        let mut start = 0;
        while start < data.len() {
            let end = memchr(b'&', &data[start..])
                .map(|pos| start + pos)
                .unwrap_or(data.len());

            if start < end {
                let segment = &data[start..end];

                let (key, value) = match memchr(b'=', segment) {
                    Some(index) => (&segment[..index], Some(&segment[index + 1..])),
                    None => (segment, None),
                };

                result.insert(
                    decode(key).into_owned(),
                    value.map(|value| decode(value).into_owned()),
                );
            }

            start = end + 1;
        }
    }
}

/// Decodes one `application/x-www-form-urlencoded` component.
///
/// - `+` becomes a space
/// - `%XX` becomes the byte `0xXX`; a `%` without two hex digits is kept as is
/// - the resulting bytes are read as UTF-8, invalid sequences become `U+FFFD`
///
/// Borrows the input when nothing needs decoding.
///
/// # Examples
/// ```rust
/// use simple_httpd::query::decode;
///
/// assert_eq!(decode(b"rust%20lang"), "rust lang");
/// assert_eq!(decode(b"a+b"), "a b");
/// assert_eq!(decode(b"%E2%9C%93"), "\u{2713}");
/// assert_eq!(decode(b"100%"), "100%");
/// ```
pub fn decode(src: &[u8]) -> Cow<'_, str> {
    if memchr::memchr2(b'%', b'+', src).is_none() {
        return String::from_utf8_lossy(src);
    }

    let mut bytes = Vec::with_capacity(src.len());
    let mut i = 0;

    while i < src.len() {
        match src[i] {
            b'+' => {
                bytes.push(b' ');
                i += 1;
            }
            b'%' => match (hex(src.get(i + 1)), hex(src.get(i + 2))) {
                (Some(high), Some(low)) => {
                    bytes.push(high << 4 | low);
                    i += 3;
                }
                _ => {
                    bytes.push(b'%');
                    i += 1;
                }
            },
            byte => {
                bytes.push(byte);
                i += 1;
            }
        }
    }

    match simdutf8::basic::from_utf8(&bytes) {
        // SAFETY: `bytes` was just validated as UTF-8 by `simdutf8`.
        Ok(_) => Cow::Owned(unsafe { String::from_utf8_unchecked(bytes) }),
        Err(_) => Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

#[inline(always)]
fn hex(byte: Option<&u8>) -> Option<u8> {
    match byte? {
        b @ b'0'..=b'9' => Some(b - b'0'),
        b @ b'a'..=b'f' => Some(b - b'a' + 10),
        b @ b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
