use std::collections::HashMap;

const CRLF: &[u8] = b"\r\n";

/// Characters allowed in a header name besides ASCII letters and digits.
const TOKEN_SPECIALS: &[u8] = b"!#$%&'*+-.^_`|~";

/// Errors produced while parsing a single header line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("malformed header line")]
    MalformedLine,
    #[error("header key or value is empty")]
    EmptyKeyOrValue,
    #[error("invalid character in header key: {0:?}")]
    InvalidKey(String),
    #[error("header line is not valid UTF-8")]
    InvalidUtf8,
}

/// Case-insensitive header collection.
///
/// Names are keyed lower-cased. Repeated names are merged into a single
/// value joined with `", "` in arrival order. Iteration order is unspecified.
///
/// Lines read by [`Headers::parse_line`] are also written back lower-cased;
/// names set through [`Headers::insert`] or [`Headers::append`] keep the
/// casing they were first given when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: HashMap<String, Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    /// Name as written on the wire
    name: String,
    value: String,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses at most one header line from the front of `data`.
    ///
    /// Returns the number of bytes consumed and whether the blank line that
    /// ends the header block was reached. `(0, false)` means no complete
    /// line is buffered yet and the caller should supply more data.
    ///
    /// # Example
    ///
    /// ```
    /// # use httpwire::http::headers::Headers;
    /// let mut headers = Headers::new();
    /// let (n, done) = headers.parse_line(b"Host: localhost:42069\r\n\r\n").unwrap();
    /// assert_eq!((n, done), (23, false));
    /// assert_eq!(headers.get("HOST"), Some("localhost:42069"));
    /// ```
    pub fn parse_line(&mut self, data: &[u8]) -> Result<(usize, bool), HeaderError> {
        let Some(line_end) = find_crlf(data) else {
            return Ok((0, false));
        };

        if line_end == 0 {
            return Ok((CRLF.len(), true));
        }

        let line = std::str::from_utf8(&data[..line_end])
            .map_err(|_| HeaderError::InvalidUtf8)?
            .trim();

        let colon = line.find(':').ok_or(HeaderError::MalformedLine)?;
        if line[..colon].ends_with(' ') {
            return Err(HeaderError::MalformedLine);
        }

        let key = line[..colon].trim();
        let value = line[colon + 1..].trim();

        if key.is_empty() || value.is_empty() {
            return Err(HeaderError::EmptyKeyOrValue);
        }

        if !key.bytes().all(is_token_byte) {
            return Err(HeaderError::InvalidKey(key.to_string()));
        }

        self.append(key.to_ascii_lowercase(), value);

        Ok((line_end + CRLF.len(), false))
    }

    /// Looks up a header by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .get(&name.to_ascii_lowercase())
            .map(|field| field.value.as_str())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.inner.contains_key(&name.to_ascii_lowercase())
    }

    /// Sets a header, replacing any existing value and name casing.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let name = name.as_ref();
        self.inner.insert(
            name.to_ascii_lowercase(),
            Field {
                name: name.to_string(),
                value: value.into(),
            },
        );
    }

    /// Adds a header, merging with an existing value as `"old, new"`.
    pub fn append(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) {
        let name = name.as_ref();
        let value = value.as_ref();

        match self.inner.get_mut(&name.to_ascii_lowercase()) {
            Some(field) => {
                field.value.push_str(", ");
                field.value.push_str(value);
            }
            None => {
                self.insert(name, value);
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.inner
            .remove(&name.to_ascii_lowercase())
            .map(|field| field.value)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over `(lower-cased name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .map(|(key, field)| (key.as_str(), field.value.as_str()))
    }

    /// Copies every entry of `other` in, replacing entries with the same name.
    pub(crate) fn overwrite_with(&mut self, other: &Headers) {
        for (key, field) in &other.inner {
            self.inner.insert(key.clone(), field.clone());
        }
    }

    /// Serializes every entry as `Name: value\r\n` followed by a blank line.
    pub(crate) fn to_block(&self) -> Vec<u8> {
        let mut block = Vec::new();
        for field in self.inner.values() {
            block.extend_from_slice(field.name.as_bytes());
            block.extend_from_slice(b": ");
            block.extend_from_slice(field.value.as_bytes());
            block.extend_from_slice(CRLF);
        }
        block.extend_from_slice(CRLF);
        block
    }
}

pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|w| w == CRLF)
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || TOKEN_SPECIALS.contains(&b)
}
