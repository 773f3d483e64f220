use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use log::debug;
use std::borrow::Cow;
use std::io::{self, Read};

/// Content codings a request body may arrive in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCoding {
    Identity,
    Gzip,
    Deflate,
    Brotli,
}

impl ContentCoding {
    fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "" | "identity" => Some(ContentCoding::Identity),
            "gzip" | "x-gzip" => Some(ContentCoding::Gzip),
            "deflate" => Some(ContentCoding::Deflate),
            "br" => Some(ContentCoding::Brotli),
            _ => None,
        }
    }

    fn decode(self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            ContentCoding::Identity => out.extend_from_slice(bytes),
            ContentCoding::Gzip => {
                GzDecoder::new(bytes).read_to_end(&mut out)?;
            }
            ContentCoding::Deflate => {
                // zlib-wrapped is what servers mean; some still send raw deflate
                if ZlibDecoder::new(bytes).read_to_end(&mut out).is_err() {
                    out.clear();
                    DeflateDecoder::new(bytes).read_to_end(&mut out)?;
                }
            }
            ContentCoding::Brotli => {
                brotli::Decompressor::new(bytes, 4096).read_to_end(&mut out)?;
            }
        }
        Ok(out)
    }
}

/// Undoes the codings named by a `Content-Encoding` value
///
/// Codings are removed last-applied first. An unknown coding or a corrupt
/// stream leaves the bytes as they were.
pub fn decode_content<'a>(content_encoding: Option<&str>, bytes: &'a [u8]) -> Cow<'a, [u8]> {
    let Some(header) = content_encoding else {
        return Cow::Borrowed(bytes);
    };

    let codings: Option<Vec<ContentCoding>> = header.split(',').map(ContentCoding::parse).collect();
    let Some(codings) = codings else {
        debug!("Unknown content coding '{}', leaving body as is", header);
        return Cow::Borrowed(bytes);
    };

    let mut current = Cow::Borrowed(bytes);
    for coding in codings.into_iter().rev() {
        if coding == ContentCoding::Identity {
            continue;
        }
        match coding.decode(&current) {
            Ok(decoded) => current = Cow::Owned(decoded),
            Err(err) => {
                debug!("Failed to remove {:?} coding: {}", coding, err);
                return Cow::Borrowed(bytes);
            }
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn brotli(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut writer = brotli::CompressorWriter::new(&mut out, 4096, 5, 22);
            writer.write_all(data).unwrap();
        }
        out
    }

    #[test]
    fn missing_or_identity_encoding_is_untouched() {
        assert!(matches!(decode_content(None, b"abc"), Cow::Borrowed(_)));
        assert_eq!(&*decode_content(Some("identity"), b"abc"), b"abc");
    }

    #[test]
    fn removes_gzip_deflate_and_brotli() {
        assert_eq!(&*decode_content(Some("gzip"), &gzip(b"hello")), b"hello");
        assert_eq!(&*decode_content(Some("BR"), &brotli(b"hello")), b"hello");

        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
        zlib.write_all(b"hello").unwrap();
        assert_eq!(&*decode_content(Some("deflate"), &zlib.finish().unwrap()), b"hello");
    }

    #[test]
    fn stacked_codings_unwind_in_reverse() {
        let encoded = brotli(&gzip(b"layered"));
        assert_eq!(&*decode_content(Some("gzip, br"), &encoded), b"layered");
    }

    #[test]
    fn corrupt_or_unknown_coding_keeps_raw_bytes() {
        assert_eq!(&*decode_content(Some("gzip"), b"not gzip"), b"not gzip");
        assert_eq!(&*decode_content(Some("zstd"), b"raw"), b"raw");
    }
}
