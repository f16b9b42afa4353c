//! Logo decoding into PDF image XObjects.

use image::GenericImageView;
use lopdf::{dictionary, Document, ObjectId, Stream};

use super::fonts::deflate;
use crate::detect::{detect_format_from_bytes, AssetFormat};
use crate::error::{Error, Result};

/// A decoded logo ready to be added to a document.
#[derive(Debug)]
pub struct LogoImage {
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    stream: Stream,
    smask: Option<Stream>,
}

impl LogoImage {
    /// Decode PNG or JPEG bytes.
    ///
    /// Grayscale and RGB JPEG data is embedded as is. Other raster data,
    /// CMYK JPEGs included, is re-encoded as deflated RGB with a soft mask
    /// when it carries transparency.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        match detect_format_from_bytes(bytes)? {
            AssetFormat::Jpeg => Self::from_jpeg(bytes),
            AssetFormat::Png => Self::from_raster(bytes),
            AssetFormat::Svg => Err(Error::Image("SVG logos are not supported".to_string())),
            other => Err(Error::Image(format!("{} is not an image", other))),
        }
    }

    fn from_jpeg(bytes: &[u8]) -> Result<Self> {
        // CMYK and YCCK scans cannot be passed through as RGB.
        let Some(color_space) = jpeg_color_space(bytes) else {
            return Self::from_raster(bytes);
        };
        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg)?;
        let (width, height) = img.dimensions();
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        };
        Ok(Self {
            width,
            height,
            stream: Stream::new(dict, bytes.to_vec()),
            smask: None,
        })
    }

    fn from_raster(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        let (width, height) = img.dimensions();
        let rgba = img.to_rgba8();

        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        for pixel in rgba.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }

        let smask = if alpha.iter().any(|&a| a != 255) {
            let dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            };
            Some(Stream::new(dict, deflate(&alpha)?))
        } else {
            None
        };

        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        Ok(Self {
            width,
            height,
            stream: Stream::new(dict, deflate(&rgb)?),
            smask,
        })
    }

    /// Check if the image carries a soft mask.
    pub fn has_mask(&self) -> bool {
        self.smask.is_some()
    }

    /// Width when drawn at `height` points, keeping the aspect ratio.
    pub fn width_at(&self, height: f32) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        height * self.width as f32 / self.height as f32
    }

    /// Add the image (and its mask) to `doc`.
    pub fn install(self, doc: &mut Document) -> ObjectId {
        let mut stream = self.stream;
        if let Some(mask) = self.smask {
            let mask_id = doc.add_object(mask);
            stream.dict.set("SMask", mask_id);
        }
        doc.add_object(stream)
    }
}

/// PDF colour space for embedding a JPEG stream unchanged.
///
/// Only one and three component frames qualify; anything else has to be
/// decoded and re-encoded.
fn jpeg_color_space(bytes: &[u8]) -> Option<&'static str> {
    match jpeg_components(bytes)? {
        1 => Some("DeviceGray"),
        3 => Some("DeviceRGB"),
        _ => None,
    }
}

/// Component count from the first start-of-frame segment.
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xff {
            return None;
        }
        let marker = bytes[pos + 1];
        match marker {
            0xff => {
                pos += 1;
                continue;
            }
            0x01 | 0xd0..=0xd7 => {
                pos += 2;
                continue;
            }
            0xda | 0xd9 => return None,
            _ => {}
        }
        let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        let is_frame = matches!(marker, 0xc0..=0xcf) && !matches!(marker, 0xc4 | 0xc8 | 0xcc);
        if is_frame {
            return bytes.get(pos + 9).copied();
        }
        pos += 2 + len;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use std::io::Cursor;

    fn png(width: u32, height: u32, alpha: u8) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([10u8, 20, 30, alpha]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_opaque_png() {
        let logo = LogoImage::decode(&png(4, 2, 255)).unwrap();
        assert_eq!((logo.width, logo.height), (4, 2));
        assert!(!logo.has_mask());
        assert_eq!(logo.width_at(84.0), 168.0);
    }

    #[test]
    fn test_decode_transparent_png() {
        let logo = LogoImage::decode(&png(3, 3, 128)).unwrap();
        assert!(logo.has_mask());

        let mut doc = Document::with_version("1.7");
        let id = logo.install(&mut doc);
        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert!(stream.dict.has(b"SMask"));
    }

    #[test]
    fn test_jpeg_components() {
        let rgb = ImageBuffer::from_pixel(4, 4, image::Rgb([200u8, 10, 10]));
        let mut jpeg = Cursor::new(Vec::new());
        rgb.write_to(&mut jpeg, image::ImageFormat::Jpeg).unwrap();
        let jpeg = jpeg.into_inner();
        assert_eq!(jpeg_components(&jpeg), Some(3));
        assert_eq!(jpeg_color_space(&jpeg), Some("DeviceRGB"));

        let logo = LogoImage::decode(&jpeg).unwrap();
        assert!(matches!(
            logo.stream.dict.get(b"Filter").and_then(|f| f.as_name()),
            Ok(b"DCTDecode")
        ));

        // SOI, APP14 (Adobe), SOF0 with four components
        let cmyk = [
            0xff, 0xd8, 0xff, 0xee, 0x00, 0x04, 0x41, 0x64, 0xff, 0xc0, 0x00, 0x14, 0x08, 0x00,
            0x02, 0x00, 0x02, 0x04, 0x01, 0x11, 0x00,
        ];
        assert_eq!(jpeg_components(&cmyk), Some(4));
        assert_eq!(jpeg_color_space(&cmyk), None);
        assert_eq!(jpeg_components(&[0xff, 0xd8, 0xff, 0xda, 0x00, 0x02]), None);
    }

    #[test]
    fn test_decode_rejects_non_images() {
        assert!(LogoImage::decode(b"<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>").is_err());
        assert!(LogoImage::decode(b"not an image").is_err());
    }
}
