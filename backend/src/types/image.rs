//! Accepted plant image formats

use mime::Mime;

/// Largest accepted image, 2048 KiB
pub const MAX_IMAGE_BYTES: usize = 2048 * 1024;

/// Image formats accepted for plant photos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Svg,
}

impl ImageFormat {
    /// Extensions listed in validation messages
    pub const ALLOWED_EXTENSIONS: &'static str = "jpeg, png, jpg, gif, svg";

    /// Detects the format from the file content, ignoring the declared content type
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        let text = String::from_utf8_lossy(bytes);
        svg_root(text.trim_start_matches('\u{feff}')).map(|()| Self::Svg)
    }

    /// Content type used when storing the image
    #[must_use]
    pub fn mime(self) -> Mime {
        match self {
            Self::Jpeg => mime::IMAGE_JPEG,
            Self::Png => mime::IMAGE_PNG,
            Self::Gif => mime::IMAGE_GIF,
            Self::Svg => mime::IMAGE_SVG,
        }
    }

    /// File extension of stored images
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Svg => "svg",
        }
    }
}

/// Skips the XML prolog, comments and doctype, then requires an `svg` root element
fn svg_root(mut text: &str) -> Option<()> {
    loop {
        text = text.trim_start();
        let end = if text.starts_with("<?") {
            text.find("?>")? + 2
        } else if text.starts_with("<!--") {
            text.find("-->")? + 3
        } else if text.starts_with("<!") {
            // Doctype, possibly with an internal subset
            match (text.find('['), text.find('>')) {
                (Some(open), Some(close)) if open < close => text.find("]>")? + 2,
                (_, Some(close)) => close + 1,
                _ => return None,
            }
        } else {
            break;
        };
        text = &text[end..];
    }

    let rest = text.strip_prefix("<svg")?;
    match rest.chars().next() {
        Some(c) if c.is_whitespace() || c == '>' || c == '/' => Some(()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_raster_formats() {
        assert_eq!(
            ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::sniff(b"GIF89a\x01\x00"), Some(ImageFormat::Gif));
    }

    #[test]
    fn test_sniff_svg_with_xml_prolog() {
        let svg = br#"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"></svg>"#;
        assert_eq!(ImageFormat::sniff(svg), Some(ImageFormat::Svg));
    }

    #[test]
    fn test_sniff_svg_after_long_comment_and_doctype() {
        let svg = format!(
            "\u{feff}<?xml version=\"1.0\"?>\n<!-- {} -->\n\
             <!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" [ <!ENTITY leaf \"fern\"> ]>\n\
             <svg width=\"1\" height=\"1\"/>",
            "x".repeat(4096)
        );
        assert_eq!(ImageFormat::sniff(svg.as_bytes()), Some(ImageFormat::Svg));
    }

    #[test]
    fn test_sniff_requires_svg_root_element() {
        assert_eq!(ImageFormat::sniff(b"<html><svg></svg></html>"), None);
        assert_eq!(ImageFormat::sniff(b"<!-- <svg> -->"), None);
        assert_eq!(ImageFormat::sniff(b"<svgx></svgx>"), None);
        assert_eq!(ImageFormat::sniff(b"<!-- unterminated <svg>"), None);
    }

    #[test]
    fn test_sniff_rejects_other_content() {
        assert_eq!(ImageFormat::sniff(b"%PDF-1.4\n"), None);
        assert_eq!(ImageFormat::sniff(b"BM\x00\x00"), None);
        assert_eq!(ImageFormat::sniff(b"hello <svg> in text"), None);
        assert_eq!(ImageFormat::sniff(b""), None);
    }

    #[test]
    fn test_mime_and_extension() {
        assert_eq!(ImageFormat::Svg.mime().essence_str(), "image/svg+xml");
        assert_eq!(ImageFormat::Jpeg.mime().essence_str(), "image/jpeg");
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
    }
}
