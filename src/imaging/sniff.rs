//! ISO-BMFF `ftyp` box inspection.
//!
//! HEIC and HEIF files are ISO base media files. Their first box is `ftyp`:
//!
//! ```text
//! offset 0   u32 BE   box size
//! offset 4   "ftyp"
//! offset 8   major brand        (4 bytes)
//! offset 12  minor version      (u32 BE)
//! offset 16  compatible brands  (4 bytes each, up to box size)
//! ```
//!
//! The brands say which flavour of container this is. Only the header is
//! read here; decoding is the codec's job.

/// Brands that mark a file as HEIF-family.
pub const HEIF_MARKERS: &[&str] = &["heic", "heix", "hevc", "mif1", "msf1"];

/// Parsed `ftyp` box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileType {
    pub major_brand: String,
    pub minor_version: u32,
    pub compatible_brands: Vec<String>,
}

impl FileType {
    /// Major and compatible brands that appear in [`HEIF_MARKERS`], deduplicated.
    pub fn heif_markers(&self) -> Vec<&str> {
        let mut found: Vec<&str> = Vec::new();
        for brand in std::iter::once(&self.major_brand).chain(&self.compatible_brands) {
            if HEIF_MARKERS.contains(&brand.as_str()) && !found.contains(&brand.as_str()) {
                found.push(brand.as_str());
            }
        }
        found
    }

    /// MIME type implied by the major brand, falling back to compatible brands.
    pub fn mime_type(&self) -> Option<&'static str> {
        std::iter::once(&self.major_brand)
            .chain(&self.compatible_brands)
            .find_map(|brand| brand_mime(brand))
    }
}

fn brand_mime(brand: &str) -> Option<&'static str> {
    match brand {
        "heic" | "heix" | "heim" | "heis" => Some("image/heic"),
        "hevc" | "hevx" | "hevm" | "hevs" => Some("image/heic-sequence"),
        "avif" => Some("image/avif"),
        "mif1" => Some("image/heif"),
        "msf1" => Some("image/heif-sequence"),
        _ => None,
    }
}

/// Parse the `ftyp` box at the start of `bytes`.
///
/// Returns `None` when the signature is missing. A box size larger than the
/// available bytes is tolerated: brands are read as far as the data goes.
pub fn read_file_type(bytes: &[u8]) -> Option<FileType> {
    if bytes.len() < 16 || &bytes[4..8] != b"ftyp" {
        return None;
    }
    let box_size = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let end = box_size.clamp(16, bytes.len());

    let major_brand = fourcc(&bytes[8..12]);
    let minor_version = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    let compatible_brands = bytes[16..end]
        .chunks_exact(4)
        .map(fourcc)
        .filter(|b| !b.trim_matches('\0').is_empty())
        .collect();

    Some(FileType {
        major_brand,
        minor_version,
        compatible_brands,
    })
}

fn fourcc(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Lowercase hex of `bytes`, no separators.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Printable ASCII rendering with `.` for everything else.
pub fn ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}
