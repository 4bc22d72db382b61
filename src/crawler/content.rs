//! Response body decoding
//!
//! Bodies go through three steps, in order:
//! 1. Decompression chosen by magic bytes, whatever the declared
//!    Content-Type says (servers routinely label `sitemap.xml.gz` as
//!    `application/octet-stream` or even `text/xml`)
//! 2. Removal of a UTF-8 byte-order mark
//! 3. Text decoding with the declared charset, falling back to ISO-8859-1

use encoding_rs::{Encoding, UTF_8};
use flate2::read::{GzDecoder, ZlibDecoder};
use std::io::Read;
use thiserror::Error;

/// Decompressed bodies larger than this are rejected
const MAX_DECOMPRESSED_BYTES: u64 = 64 * 1024 * 1024;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Errors from the content pipeline
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{format} stream could not be decompressed: {source}")]
    Decompress {
        format: &'static str,
        source: std::io::Error,
    },

    #[error("decompressed body exceeds {0} bytes")]
    TooLarge(u64),
}

/// Compression formats recognised by their leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Zlib,
}

impl Compression {
    fn name(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Zlib => "zlib",
        }
    }
}

/// A decoded response body
#[derive(Debug, Clone)]
pub struct DecodedBody {
    /// Decoded text
    pub text: String,
    /// Decompressed bytes with any BOM removed
    pub bytes: Vec<u8>,
    /// Content type after correction
    pub content_type: String,
    /// Whether the body arrived compressed
    pub compressed: bool,
}

/// Detects compression from magic bytes
pub fn detect_compression(bytes: &[u8]) -> Option<Compression> {
    match bytes {
        [0x1f, 0x8b, ..] => Some(Compression::Gzip),
        [0x78, 0x01 | 0x9c | 0xda, ..] => Some(Compression::Zlib),
        _ => None,
    }
}

/// Runs the full pipeline over a raw body
///
/// # Arguments
///
/// * `raw` - The body exactly as received
/// * `declared_type` - The Content-Type header (may be empty)
/// * `url` - The final URL, used to correct ambiguous content types
pub fn decode_body(raw: &[u8], declared_type: &str, url: &str) -> Result<DecodedBody, ContentError> {
    let compression = detect_compression(raw);

    let (bytes, content_type) = match compression {
        Some(format) => {
            let inflated = decompress(raw, format)?;
            (inflated, correct_content_type(declared_type, url))
        }
        None => (raw.to_vec(), declared_type.to_string()),
    };

    let bytes = strip_bom(&bytes).to_vec();
    let text = decode_text(&bytes, charset_of(&content_type).as_deref());

    Ok(DecodedBody {
        text,
        bytes,
        content_type,
        compressed: compression.is_some(),
    })
}

fn decompress(raw: &[u8], format: Compression) -> Result<Vec<u8>, ContentError> {
    let mut out = Vec::new();
    let result = match format {
        Compression::Gzip => GzDecoder::new(raw)
            .take(MAX_DECOMPRESSED_BYTES + 1)
            .read_to_end(&mut out),
        Compression::Zlib => ZlibDecoder::new(raw)
            .take(MAX_DECOMPRESSED_BYTES + 1)
            .read_to_end(&mut out),
    };

    result.map_err(|source| ContentError::Decompress {
        format: format.name(),
        source,
    })?;

    if out.len() as u64 > MAX_DECOMPRESSED_BYTES {
        return Err(ContentError::TooLarge(MAX_DECOMPRESSED_BYTES));
    }

    Ok(out)
}

/// Picks a content type from the URL extension when the declared one is
/// missing or only describes the compression wrapper
pub fn correct_content_type(declared: &str, url: &str) -> String {
    let essence = declared
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    let ambiguous = matches!(
        essence.as_str(),
        "" | "application/octet-stream"
            | "binary/octet-stream"
            | "application/gzip"
            | "application/x-gzip"
            | "application/x-gunzip"
            | "application/zlib"
    );

    if !ambiguous {
        return declared.to_string();
    }

    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    let path = path.strip_suffix(".gz").unwrap_or(&path);

    if path.ends_with(".xml") {
        "application/xml".to_string()
    } else if path.ends_with(".txt") {
        "text/plain".to_string()
    } else if path.ends_with(".html") || path.ends_with(".htm") {
        "text/html".to_string()
    } else {
        declared.to_string()
    }
}

/// Removes a leading UTF-8 byte-order mark
pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Extracts the lowercased charset parameter of a content type
pub fn charset_of(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches(['"', '\'']).to_ascii_lowercase())
        } else {
            None
        }
    })
}

/// Decodes text with the declared charset, falling back to ISO-8859-1
///
/// Labels are resolved the way browsers resolve them, and an undeclared or
/// unknown charset is read as UTF-8. Bytes the encoding rejects fall back to
/// ISO-8859-1, which maps every byte, so decoding never fails.
pub fn decode_text(bytes: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if !had_errors {
        return text.into_owned();
    }

    tracing::debug!(
        "Body is not valid {}, falling back to ISO-8859-1",
        encoding.name()
    );
    bytes.iter().map(|&b| b as char).collect()
}
