//! Core HTTP protocol types and utilities

use indexmap::{IndexMap, IndexSet};
use std::hash::Hash;

// ISO-8859-1

/// Decodes protocol framing bytes, one byte per `char`.
#[inline]
pub(crate) fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| byte as char).collect()
}

/// Encodes `src` as ISO-8859-1. Characters above `U+00FF` become `?`.
#[inline]
pub(crate) fn write_latin1(src: &str, buffer: &mut Vec<u8>) {
    match src.is_ascii() {
        true => buffer.extend_from_slice(src.as_bytes()),
        false => buffer.extend(
            src.chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?')),
        ),
    }
}

#[inline]
pub(crate) fn slice_to_u64(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }

    let mut result: u64 = 0;

    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return None;
        }

        result = result.checked_mul(10)?.checked_add((byte - b'0') as u64)?;
    }

    Some(result)
}

// REQUEST LINE

/// The first line of a request: `METHOD SP PATH[?QUERY] SP VERSION`.
///
/// Tokens are kept exactly as received; the method and version are not
/// validated against any known set. `path` never contains the query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestLine {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) version: String,
}

impl RequestLine {
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }
}

// FIELD MAP

/// Two consistent views over repeated `name -> value` fields.
///
/// - *single*: the first value seen for every name
/// - *multi*: every distinct value for a name, in arrival order
///
/// Both views always share the same key set. Names are stored verbatim,
/// lookups through [`get`](Self::get) are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap<V: Hash + Eq> {
    single: IndexMap<String, V>,
    multi: IndexMap<String, IndexSet<V>>,
}

/// Request headers. Values are trimmed header values.
pub type Headers = FieldMap<String>;

/// Decoded query parameters. A key without `=` maps to `None`.
pub type QueryParameters = FieldMap<Option<String>>;

impl<V: Hash + Eq + Clone> FieldMap<V> {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            single: IndexMap::new(),
            multi: IndexMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: String, value: V) {
        self.multi
            .entry(name.clone())
            .or_default()
            .insert(value.clone());
        self.single.entry(name).or_insert(value);
    }

    /// First value received for `name`.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&V> {
        self.single.get(name)
    }

    /// All distinct values received for `name`, in arrival order.
    #[inline]
    pub fn get_all(&self, name: &str) -> Option<&IndexSet<V>> {
        self.multi.get(name)
    }

    #[inline]
    pub fn contains_key(&self, name: &str) -> bool {
        self.single.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.single.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.single.is_empty()
    }

    /// Iterates the first-wins view in arrival order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.single.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn single(&self) -> &IndexMap<String, V> {
        &self.single
    }

    #[inline]
    pub fn multi(&self) -> &IndexMap<String, IndexSet<V>> {
        &self.multi
    }
}

impl<V: Hash + Eq + Clone> Default for FieldMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldMap<String> {
    /// First value of the first header whose name matches ASCII case-insensitively.
    ///
    /// Linear search over the stored names.
    #[inline]
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.single
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl FieldMap<Option<String>> {
    /// First value for `key`, treating a bare key (`?flag`) as absent.
    #[inline]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.single.get(key)?.as_deref()
    }
}

// STATUS_CODE

macro_rules! set_status_codes {
    ($(
        $name:ident = ($num:expr, $str:expr);
    )+) => {
        /// HTTP status codes with their canonical reason phrases.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StatusCode { $(
            #[doc = concat!(stringify!($num), " ", $str)]
            $name = $num,
        )+ }

        impl StatusCode {
            /// Returns the status line without terminator (e.g. `"HTTP/1.1 200 OK"`).
            #[inline]
            pub const fn status_line(&self) -> &'static str {
                match self { $(
                    StatusCode::$name => concat!("HTTP/1.1 ", $num, " ", $str),
                )+ }
            }

            #[inline]
            pub const fn reason(&self) -> &'static str {
                match self { $(
                    StatusCode::$name => $str,
                )+ }
            }
        }
    }
}

set_status_codes! {
    Continue = (100, "Continue");
    SwitchingProtocols = (101, "Switching Protocols");

    Ok = (200, "OK");
    Created = (201, "Created");
    Accepted = (202, "Accepted");
    NoContent = (204, "No Content");
    PartialContent = (206, "Partial Content");

    MovedPermanently = (301, "Moved Permanently");
    Found = (302, "Found");
    SeeOther = (303, "See Other");
    NotModified = (304, "Not Modified");
    TemporaryRedirect = (307, "Temporary Redirect");
    PermanentRedirect = (308, "Permanent Redirect");

    BadRequest = (400, "Bad Request");
    Unauthorized = (401, "Unauthorized");
    Forbidden = (403, "Forbidden");
    NotFound = (404, "Not Found");
    MethodNotAllowed = (405, "Method Not Allowed");
    RequestTimeout = (408, "Request Timeout");
    Conflict = (409, "Conflict");
    Gone = (410, "Gone");
    LengthRequired = (411, "Length Required");
    PayloadTooLarge = (413, "Payload Too Large");
    UriTooLong = (414, "URI Too Long");
    UnsupportedMediaType = (415, "Unsupported Media Type");
    UnprocessableEntity = (422, "Unprocessable Entity");
    TooManyRequests = (429, "Too Many Requests");

    InternalServerError = (500, "Internal Server Error");
    NotImplemented = (501, "Not Implemented");
    BadGateway = (502, "Bad Gateway");
    ServiceUnavailable = (503, "Service Unavailable");
    GatewayTimeout = (504, "Gateway Timeout");
    HttpVersionNotSupported = (505, "HTTP Version Not Supported");
}

impl StatusCode {
    #[inline]
    pub const fn as_u16(&self) -> u16 {
        *self as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1() {
        assert_eq!(latin1_to_string(b"Host: x"), "Host: x");
        assert_eq!(latin1_to_string(&[0x63, 0x61, 0x66, 0xE9]), "caf\u{e9}");

        #[rustfmt::skip]
        let cases: [(&str, &[u8]); 3] = [
            ("plain",        b"plain"),
            ("caf\u{e9}",    &[0x63, 0x61, 0x66, 0xE9]),
            ("snow \u{2603}", b"snow ?"),
        ];

        for (src, expected) in cases {
            let mut buffer = Vec::new();
            write_latin1(src, &mut buffer);
            assert_eq!(buffer, expected);
        }
    }

    #[test]
    fn parse_u64() {
        #[rustfmt::skip]
        let cases: [(&[u8], Option<u64>); 7] = [
            (b"0",                     Some(0)),
            (b"5",                     Some(5)),
            (b"18446744073709551615",  Some(u64::MAX)),
            (b"18446744073709551616",  None),
            (b"",                      None),
            (b"-1",                    None),
            (b"12abc",                 None),
        ];

        for (src, expected) in cases {
            assert_eq!(slice_to_u64(src), expected);
        }
    }

    #[test]
    fn field_map_views() {
        let mut map = Headers::new();
        map.insert("Accept".into(), "text/html".into());
        map.insert("Host".into(), "x".into());
        map.insert("Accept".into(), "text/plain".into());
        map.insert("Accept".into(), "text/html".into());

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("Accept").map(String::as_str), Some("text/html"));
        assert_eq!(map.get("accept"), None);
        assert_eq!(map.get_ignore_case("accept"), Some("text/html"));

        let all: Vec<&str> = map.get_all("Accept").unwrap().iter().map(String::as_str).collect();
        assert_eq!(all, ["text/html", "text/plain"]);

        let names: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["Accept", "Host"]);
        assert!(map.single().keys().eq(map.multi().keys()));
    }

    #[test]
    fn status_lines() {
        assert_eq!(StatusCode::Ok.status_line(), "HTTP/1.1 200 OK");
        assert_eq!(
            StatusCode::InternalServerError.status_line(),
            "HTTP/1.1 500 Internal Server Error"
        );
        assert_eq!(StatusCode::NotFound.as_u16(), 404);
        assert_eq!(StatusCode::NotFound.reason(), "Not Found");
    }
}
