//! Range negotiation: parse a client range header, validate it against the
//! object's true size, and decide the response framing. The resolver never
//! reads the object body; it works from `size` and the declared or derived
//! content type only.

use crate::types::ByteRange;

/// Parsed but not yet validated `bytes=<start>-[<end>]` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: u64,
    pub end: Option<u64>,
}

impl RangeSpec {
    /// Parse a range header. Returns `None` for anything that is not a
    /// well-formed single `bytes=` range; unparsable headers are treated
    /// by the resolver as "no range requested".
    pub fn parse(header: &str) -> Option<Self> {
        let spec = header.trim().strip_prefix("bytes=")?;
        let (start, end) = spec.split_once('-')?;
        let start: u64 = start.trim().parse().ok()?;
        let end = end.trim();
        let end = if end.is_empty() {
            None
        } else {
            Some(end.parse::<u64>().ok()?)
        };
        Some(Self { start, end })
    }
}

/// How the response body must be framed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Framing {
    /// Serve the whole object
    Full { size: u64 },
    /// Serve the resolved span as partial content
    Partial(ResolvedRange),
    /// The requested span cannot be served; report the true size so the
    /// client can retry correctly. No body.
    NotSatisfiable { size: u64 },
}

/// A validated range together with the object's total size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
    pub total_size: u64,
}

impl ResolvedRange {
    pub fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn range(&self) -> ByteRange {
        ByteRange::new(self.start, self.end)
    }
}

/// Resolve a range header against the object's actual size.
///
/// No header or an unparsable header serves the full object. An absent end
/// means "to end of object". Out-of-bounds spans are never clamped; the
/// caller must answer range-not-satisfiable with the true size.
pub fn resolve(header: Option<&str>, size: u64) -> Framing {
    let spec = match header.and_then(RangeSpec::parse) {
        Some(spec) => spec,
        None => return Framing::Full { size },
    };

    if size == 0 {
        return Framing::NotSatisfiable { size };
    }

    let end = spec.end.unwrap_or(size - 1);
    if spec.start > end || end >= size {
        return Framing::NotSatisfiable { size };
    }

    Framing::Partial(ResolvedRange {
        start: spec.start,
        end,
        total_size: size,
    })
}

impl Framing {
    /// HTTP-equivalent status for this framing decision
    pub fn status(&self) -> u16 {
        match self {
            Self::Full { .. } => 200,
            Self::Partial(_) => 206,
            Self::NotSatisfiable { .. } => 416,
        }
    }

    /// Length of the body to be transferred, if any
    pub fn body_length(&self) -> Option<u64> {
        match self {
            Self::Full { size } => Some(*size),
            Self::Partial(range) => Some(range.content_length()),
            Self::NotSatisfiable { .. } => None,
        }
    }

    /// Response headers for this framing, bit-exact per the wire contract
    pub fn headers(&self, content_type: &str) -> Vec<(String, String)> {
        match self {
            Self::Full { size } => vec![
                ("Content-Type".to_string(), content_type.to_string()),
                ("Accept-Ranges".to_string(), "bytes".to_string()),
                ("Content-Length".to_string(), size.to_string()),
            ],
            Self::Partial(range) => vec![
                ("Content-Type".to_string(), content_type.to_string()),
                ("Accept-Ranges".to_string(), "bytes".to_string()),
                (
                    "Content-Length".to_string(),
                    range.content_length().to_string(),
                ),
                (
                    "Content-Range".to_string(),
                    format!("bytes {}-{}/{}", range.start, range.end, range.total_size),
                ),
            ],
            Self::NotSatisfiable { size } => vec![(
                "Content-Range".to_string(),
                format!("bytes */{}", size),
            )],
        }
    }
}

/// Resolve a content type: the stored one wins when non-empty, else the
/// first case-insensitive suffix match in the ordered table, else the
/// supplied default.
pub fn resolve_content_type(
    stored: Option<&str>,
    name: &str,
    table: &[(&str, &str)],
    default: &str,
) -> String {
    if let Some(stored) = stored {
        if !stored.is_empty() {
            return stored.to_string();
        }
    }
    let lower = name.to_lowercase();
    for (suffix, mime) in table {
        if lower.ends_with(suffix) {
            return mime.to_string();
        }
    }
    default.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DOCUMENT_DEFAULT, DOCUMENT_TYPES, MEDIA_DEFAULT, MEDIA_TYPES};

    #[test]
    fn parse_accepts_open_and_closed_ranges() {
        assert_eq!(
            RangeSpec::parse("bytes=500-999"),
            Some(RangeSpec {
                start: 500,
                end: Some(999)
            })
        );
        assert_eq!(
            RangeSpec::parse("bytes=500-"),
            Some(RangeSpec {
                start: 500,
                end: None
            })
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(RangeSpec::parse("bytes=abc-"), None);
        assert_eq!(RangeSpec::parse("items=0-5"), None);
        assert_eq!(RangeSpec::parse("bytes=5"), None);
        assert_eq!(RangeSpec::parse(""), None);
    }

    #[test]
    fn no_header_serves_full() {
        assert_eq!(resolve(None, 1000), Framing::Full { size: 1000 });
    }

    #[test]
    fn unparsable_header_serves_full() {
        assert_eq!(
            resolve(Some("bytes=oops"), 1000),
            Framing::Full { size: 1000 }
        );
    }

    #[test]
    fn open_end_extends_to_last_byte() {
        let framing = resolve(Some("bytes=500-"), 1000);
        assert_eq!(
            framing,
            Framing::Partial(ResolvedRange {
                start: 500,
                end: 999,
                total_size: 1000
            })
        );
        assert_eq!(framing.body_length(), Some(500));
    }

    #[test]
    fn out_of_bounds_is_not_satisfiable_never_clamped() {
        assert_eq!(
            resolve(Some("bytes=900-1200"), 1000),
            Framing::NotSatisfiable { size: 1000 }
        );
        assert_eq!(
            resolve(Some("bytes=1000-"), 1000),
            Framing::NotSatisfiable { size: 1000 }
        );
        assert_eq!(
            resolve(Some("bytes=600-500"), 1000),
            Framing::NotSatisfiable { size: 1000 }
        );
    }

    #[test]
    fn empty_object_cannot_satisfy_any_range() {
        assert_eq!(
            resolve(Some("bytes=0-0"), 0),
            Framing::NotSatisfiable { size: 0 }
        );
    }

    #[test]
    fn partial_headers_match_wire_contract() {
        let framing = resolve(Some("bytes=200-299"), 1000);
        assert_eq!(framing.status(), 206);
        let headers = framing.headers("video/mp4");
        assert!(headers.contains(&("Content-Type".to_string(), "video/mp4".to_string())));
        assert!(headers.contains(&("Accept-Ranges".to_string(), "bytes".to_string())));
        assert!(headers.contains(&("Content-Length".to_string(), "100".to_string())));
        assert!(headers.contains(&(
            "Content-Range".to_string(),
            "bytes 200-299/1000".to_string()
        )));
    }

    #[test]
    fn not_satisfiable_reports_true_size_and_no_body() {
        let framing = resolve(Some("bytes=900-1200"), 1000);
        assert_eq!(framing.status(), 416);
        assert_eq!(framing.body_length(), None);
        assert_eq!(
            framing.headers("video/mp4"),
            vec![("Content-Range".to_string(), "bytes */1000".to_string())]
        );
    }

    #[test]
    fn stored_content_type_wins() {
        assert_eq!(
            resolve_content_type(Some("application/pdf"), "x.mp4", MEDIA_TYPES, MEDIA_DEFAULT),
            "application/pdf"
        );
    }

    #[test]
    fn empty_stored_type_falls_back_to_suffix_table() {
        assert_eq!(
            resolve_content_type(Some(""), "Slides.PDF", DOCUMENT_TYPES, DOCUMENT_DEFAULT),
            "application/pdf"
        );
        assert_eq!(
            resolve_content_type(None, "clip.webm", MEDIA_TYPES, MEDIA_DEFAULT),
            "video/webm"
        );
    }

    #[test]
    fn unknown_suffixes_use_per_table_defaults() {
        assert_eq!(
            resolve_content_type(None, "data.bin", DOCUMENT_TYPES, DOCUMENT_DEFAULT),
            "application/octet-stream"
        );
        assert_eq!(
            resolve_content_type(None, "clip.mov", MEDIA_TYPES, MEDIA_DEFAULT),
            "video/mp4"
        );
    }
}
