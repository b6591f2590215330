//! # PDF Serializer
//!
//! Writes rendered page surfaces into a paged PDF document, one surface per
//! page. Each page is a single full-bleed raster: the surface becomes an
//! image XObject and the page's MediaBox is exactly its pixel size, so one
//! pixel maps to one PDF unit.
//!
//! This is a from-scratch PDF 1.7 writer. The subset needed here (catalog,
//! page tree, image XObjects, one content stream per page) is small enough
//! that writing the bytes directly is simpler than pulling in a PDF crate.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, images, content streams
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```

use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::Result;
use crate::raster::Surface;

/// Document information written to the `/Info` dictionary.
#[derive(Debug, Clone, Default)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    /// Append an object and return its id.
    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write one page per surface to a PDF byte vector.
    pub fn write(&self, pages: &[Surface], metadata: &PdfMetadata) -> Result<Vec<u8>> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
        };

        // Reserve object IDs:
        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog
        // 2 = Pages (page tree root)
        builder.push(Vec::new());
        builder.push(Vec::new());
        builder.push(Vec::new());

        let mut page_obj_ids: Vec<usize> = Vec::new();

        for page in pages {
            let (w, h) = (page.pixel_width(), page.pixel_height());
            let image_id = Self::write_image_xobject(&mut builder, page);

            // Scale the unit image square up to the full page.
            let content = format!("q\n{} 0 0 {} 0 0 cm\n/Im0 Do\nQ\n", w, h);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            let content_obj_id = builder.push(content_data);

            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Contents {} 0 R /Resources << /XObject << /Im0 {} 0 R >> >> >>",
                w, h, content_obj_id, image_id
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let mut info = String::from("<< ");
        if let Some(ref title) = metadata.title {
            let _ = write!(info, "/Title ({}) ", Self::escape_pdf_string(title));
        }
        if let Some(ref author) = metadata.author {
            let _ = write!(info, "/Author ({}) ", Self::escape_pdf_string(author));
        }
        let _ = write!(info, "/Producer (ScribbleCraft) /Creator (ScribbleCraft) >>");
        let info_obj_id = builder.push(info.into_bytes());

        Ok(Self::serialize(&builder, info_obj_id))
    }

    /// Write a surface as an RGB image XObject, plus a grey SMask when any
    /// pixel is translucent. Returns the image's object id.
    fn write_image_xobject(builder: &mut PdfBuilder, page: &Surface) -> usize {
        let (w, h) = (page.pixel_width(), page.pixel_height());
        let rgba = page.to_rgba();
        let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
        let mut alpha = Vec::with_capacity(rgba.len() / 4);
        for px in rgba.chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
            alpha.push(px[3]);
        }

        let smask_id = if alpha.iter().all(|&a| a == 255) {
            None
        } else {
            let compressed_alpha = compress_to_vec_zlib(&alpha, 6);
            let mut smask_data: Vec<u8> = Vec::new();
            let _ = write!(
                smask_data,
                "<< /Type /XObject /Subtype /Image \
                 /Width {} /Height {} \
                 /ColorSpace /DeviceGray \
                 /BitsPerComponent 8 \
                 /Filter /FlateDecode \
                 /Length {} >>\nstream\n",
                w,
                h,
                compressed_alpha.len()
            );
            smask_data.extend_from_slice(&compressed_alpha);
            smask_data.extend_from_slice(b"\nendstream");
            Some(builder.push(smask_data))
        };

        let compressed_rgb = compress_to_vec_zlib(&rgb, 6);
        let smask_ref = smask_id
            .map(|id| format!(" /SMask {} 0 R", id))
            .unwrap_or_default();
        let mut obj_data: Vec<u8> = Vec::new();
        let _ = write!(
            obj_data,
            "<< /Type /XObject /Subtype /Image \
             /Width {} /Height {} \
             /ColorSpace /DeviceRGB \
             /BitsPerComponent 8 \
             /Filter /FlateDecode \
             /Length {}{} >>\nstream\n",
            w,
            h,
            compressed_rgb.len(),
            smask_ref
        );
        obj_data.extend_from_slice(&compressed_rgb);
        obj_data.extend_from_slice(b"\nendstream");
        builder.push(obj_data)
    }

    fn escape_pdf_string(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for ch in s.chars() {
            match ch {
                '(' => out.push_str("\\("),
                ')' => out.push_str("\\)"),
                '\\' => out.push_str("\\\\"),
                c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
                _ => out.push('?'),
            }
        }
        out
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let header = format!("{} 0 obj\n", i);
            output.extend_from_slice(header.as_bytes());
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    fn page(w: f64, h: f64, color: Option<Color>) -> Surface {
        let mut s = Surface::new(w, h, 1.0).unwrap();
        if let Some(c) = color {
            s.fill(c);
        }
        s
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(PdfWriter::escape_pdf_string("Hello (World)"), "Hello \\(World\\)");
        assert_eq!(PdfWriter::escape_pdf_string("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_structure() {
        let bytes = PdfWriter::new()
            .write(&[page(10.0, 20.0, Some(Color::WHITE))], &PdfMetadata::default())
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert_eq!(count(&bytes, b"xref"), 2); // "xref" and "startxref"
        assert_eq!(count(&bytes, b"trailer"), 1);
    }

    #[test]
    fn test_one_page_per_surface_with_pixel_mediabox() {
        let pages = [
            page(800.0, 500.0, Some(Color::WHITE)),
            page(600.0, 700.0, Some(Color::WHITE)),
        ];
        let bytes = PdfWriter::new().write(&pages, &PdfMetadata::default()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert_eq!(text.matches("/Type /Page ").count(), 2);
        assert!(text.contains("/Count 2"));
        assert!(text.contains("/MediaBox [0 0 800 500]"));
        assert!(text.contains("/MediaBox [0 0 600 700]"));
    }

    #[test]
    fn test_smask_only_when_translucent() {
        let opaque = PdfWriter::new()
            .write(&[page(4.0, 4.0, Some(Color::WHITE))], &PdfMetadata::default())
            .unwrap();
        assert_eq!(count(&opaque, b"/SMask"), 0);

        let clear = PdfWriter::new()
            .write(&[page(4.0, 4.0, None)], &PdfMetadata::default())
            .unwrap();
        assert_eq!(count(&clear, b"/SMask"), 1);
    }

    #[test]
    fn test_metadata_in_info_dict() {
        let metadata = PdfMetadata {
            title: Some("Notes (draft)".to_string()),
            author: None,
        };
        let bytes = PdfWriter::new()
            .write(&[page(4.0, 4.0, Some(Color::WHITE))], &metadata)
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Title (Notes \\(draft\\))"));
        assert!(text.contains("/Info "));
    }
}
