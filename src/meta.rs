//! Photo metadata: EXIF timestamp, orientation, dimensions, GPS coordinates.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use exif::{In, Tag, Value};

/// EXIF orientation codes 1-8, as a closed enum.
///
/// Codes 5-8 swap the image axes; the raw decoded buffer must be transformed
/// before display (see `tiles::apply_orientation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Transpose,
    Rotate90,
    Transverse,
    Rotate270,
}

impl Orientation {
    pub const ALL: [Self; 8] = [
        Self::Normal,
        Self::FlipHorizontal,
        Self::Rotate180,
        Self::FlipVertical,
        Self::Transpose,
        Self::Rotate90,
        Self::Transverse,
        Self::Rotate270,
    ];

    /// Map an EXIF orientation value; anything outside 1-8 is treated as
    /// `Normal`, matching the tag's defaulting rules.
    #[must_use]
    pub fn from_exif(code: u16) -> Self {
        match code {
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90,
            7 => Self::Transverse,
            8 => Self::Rotate270,
            _ => Self::Normal,
        }
    }

    #[must_use]
    pub fn exif_code(self) -> u16 {
        match self {
            Self::Normal => 1,
            Self::FlipHorizontal => 2,
            Self::Rotate180 => 3,
            Self::FlipVertical => 4,
            Self::Transpose => 5,
            Self::Rotate90 => 6,
            Self::Transverse => 7,
            Self::Rotate270 => 8,
        }
    }

    /// Whether applying this orientation swaps width and height.
    #[must_use]
    pub fn swaps_axes(self) -> bool {
        matches!(
            self,
            Self::Transpose | Self::Rotate90 | Self::Transverse | Self::Rotate270
        )
    }

    /// The orientation whose transform visually undoes this one.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Rotate90 => Self::Rotate270,
            Self::Rotate270 => Self::Rotate90,
            // Flips, 180, and the diagonal transforms are self-inverse.
            other => other,
        }
    }
}

/// Decimal-degree GPS position extracted from EXIF.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoCoord {
    pub latitude: f64,
    pub longitude: f64,
}

/// One photo's metadata. Immutable once built; the slideshow core never
/// mutates it.
#[derive(Debug, Clone)]
pub struct Photo {
    /// Source path; unique id within the catalog.
    pub path: PathBuf,
    /// EXIF capture time, falling back to the file's modification time.
    pub taken_at: DateTime<Utc>,
    /// Raw decoded width, before orientation correction.
    pub width: u32,
    /// Raw decoded height, before orientation correction.
    pub height: u32,
    pub orientation: Orientation,
    pub coordinates: Option<GeoCoord>,
}

impl Photo {
    /// Dimensions after orientation correction, as the image will display.
    #[must_use]
    pub fn display_size(&self) -> (u32, u32) {
        if self.orientation.swaps_axes() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Height exceeds width, judged on oriented dimensions.
    #[must_use]
    pub fn is_portrait(&self) -> bool {
        let (w, h) = self.display_size();
        h > w
    }
}

/// Read a photo's metadata without decoding its pixels: header dimensions
/// plus EXIF capture time, orientation, and GPS position.
///
/// # Errors
/// Fails if the file cannot be opened or its header is unreadable.
pub fn read_photo_meta(path: &Path) -> Result<Photo> {
    let (width, height) = image::image_dimensions(path)
        .with_context(|| format!("reading dimensions of {}", path.display()))?;

    let exif_data = read_exif(path);
    let orientation = exif_data
        .as_ref()
        .and_then(exif_orientation)
        .map_or(Orientation::Normal, Orientation::from_exif);
    let coordinates = exif_data.as_ref().and_then(exif_coordinates);
    let taken_at = exif_data
        .as_ref()
        .and_then(exif_taken_at)
        .map_or_else(|| file_mtime(path), Ok)?;

    Ok(Photo {
        path: path.to_path_buf(),
        taken_at,
        width,
        height,
        orientation,
        coordinates,
    })
}

fn read_exif(path: &Path) -> Option<exif::Exif> {
    let file = fs::File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    exif::Reader::new().read_from_container(&mut buf).ok()
}

fn exif_orientation(exif: &exif::Exif) -> Option<u16> {
    let field = exif.get_field(Tag::Orientation, In::PRIMARY)?;
    field.value.get_uint(0).map(|v| v as u16)
}

fn exif_taken_at(exif: &exif::Exif) -> Option<DateTime<Utc>> {
    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY))?;
    let Value::Ascii(ref ascii) = field.value else {
        return None;
    };
    let dt = exif::DateTime::from_ascii(ascii.first()?).ok()?;
    let date = NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.day))?;
    let naive = date.and_hms_opt(
        u32::from(dt.hour),
        u32::from(dt.minute),
        u32::from(dt.second),
    )?;
    Some(naive.and_utc())
}

fn exif_coordinates(exif: &exif::Exif) -> Option<GeoCoord> {
    let latitude = gps_axis(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
    let longitude = gps_axis(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;
    Some(GeoCoord {
        latitude,
        longitude,
    })
}

/// One GPS axis as decimal degrees; `negative_ref` is the hemisphere letter
/// that flips the sign (S or W).
fn gps_axis(exif: &exif::Exif, value_tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let Value::Rational(ref parts) = field.value else {
        return None;
    };
    if parts.len() < 3 {
        return None;
    }
    let degrees = parts[0].to_f64() + parts[1].to_f64() / 60.0 + parts[2].to_f64() / 3600.0;

    let reference = exif.get_field(ref_tag, In::PRIMARY)?;
    let Value::Ascii(ref ascii) = reference.value else {
        return None;
    };
    let sign = if ascii.first().and_then(|s| s.first()) == Some(&negative_ref) {
        -1.0
    } else {
        1.0
    };
    Some(sign * degrees)
}

fn file_mtime(path: &Path) -> Result<DateTime<Utc>> {
    let meta =
        fs::metadata(path).with_context(|| format!("reading metadata of {}", path.display()))?;
    let mtime = meta.modified().unwrap_or(std::time::UNIX_EPOCH);
    Ok(DateTime::<Utc>::from(mtime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    // JPEG 2x1 with EXIF orientation 6 (rotate 90 CW), base64 encoded
    const ORIENT6_JPEG: &str = concat!(
        "/9j/4AAQSkZJRgABAQAAAQABAAD/4QAiRXhpZgAATU0AKgAAAAgAAQESAAMAAAABAAYAAAAAAAD/2wBDAAgGBgcGBQgHBwcJCQgKDBQNDAsLDBkSEw8UHRofHh0aHBwgJC4nICIsIxwcKDcpLDAxNDQ0Hyc5PTgyPC4zNDL/",
        "2wBDAQkJCQwLDBgNDRgyIRwhMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjL/wAARCAABAAIDASIAAhEBAxEB/8QAHwAAAQUBAQEBAQEAAAAAAAAAAAECAwQFBgcICQoL/8QAtRAAAgEDAwIEAwUFBAQAAAF9AQIDAAQRBRIhMUEGE1FhByJxFDKBkaEII0KxwRVS0fAkM2JyggkKFhcYGRolJicoKSo0NTY3ODk6Q0RFRkdISUpTVFVWV1hZWmNkZWZnaGlqc3R1dnd4eXqDhIWGh4iJipKTlJWWl5iZmqKjpKWmp6ipqrKztLW2t7i5usLDxMXGx8jJytLT1NXW19jZ2uHi4+Tl5ufo6erx8vP09fb3+Pn6/8QAHwEAAwEBAQEBAQEBAQAAAAAAAAECAwQFBgcICQoL/8QAtREAAgECBAQDBAcFBAQAAQJ3AAECAxEEBSExBhJBUQdhcRMiMoEIFEKRobHBCSMzUvAVYnLRChYkNOEl8RcYGRomJygpKjU2Nzg5OkNERUZHSElKU1RVVldYWVpjZGVmZ2hpanN0dXZ3eHl6goOEhYaHiImKkpOUlZaXmJmaoqOkpaanqKmqsrO0tba3uLm6wsPExcbHyMnK0tPU1dbX2Nna4uPk5ebn6Onq8vP09fb3+Pn6/9oADAMBAAIRAxEAPwDi6KKK+ZP3E//Z"
    );

    fn write_orient6_jpeg(dir: &tempfile::TempDir) -> PathBuf {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(ORIENT6_JPEG)
            .unwrap();
        let path = dir.path().join("orient6.jpg");
        fs::write(&path, &bytes).unwrap();
        path
    }

    #[test]
    fn orientation_roundtrips_exif_codes() {
        for code in 1..=8u16 {
            assert_eq!(Orientation::from_exif(code).exif_code(), code);
        }
        assert_eq!(Orientation::from_exif(0), Orientation::Normal);
        assert_eq!(Orientation::from_exif(9), Orientation::Normal);
    }

    #[test]
    fn inverse_pairs_are_symmetric() {
        for o in Orientation::ALL {
            assert_eq!(o.inverse().inverse(), o);
        }
        assert_eq!(Orientation::Rotate90.inverse(), Orientation::Rotate270);
        assert_eq!(Orientation::Transpose.inverse(), Orientation::Transpose);
    }

    #[test]
    fn oriented_dimensions_swap_for_rotated_photo() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_orient6_jpeg(&dir);

        let photo = read_photo_meta(&path).unwrap();
        assert_eq!(photo.orientation, Orientation::Rotate90);
        assert_eq!((photo.width, photo.height), (2, 1));
        assert_eq!(photo.display_size(), (1, 2));
        assert!(photo.is_portrait());
        assert!(photo.coordinates.is_none());
    }

    #[test]
    fn missing_exif_defaults_to_normal_and_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.png");
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();

        let photo = read_photo_meta(&path).unwrap();
        assert_eq!(photo.orientation, Orientation::Normal);
        assert_eq!(photo.display_size(), (3, 2));
        assert!(!photo.is_portrait());
    }
}
