use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// Helvetica advance widths (AFM, 1000 units/em) for ASCII 32..=126.
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for ASCII 32..=126.
#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

enum FaceSource {
    Builtin {
        base_font: &'static str,
        ascii_widths: &'static [u16; 95],
    },
    TrueType {
        data: Mmap,
        face_index: u32,
    },
}

/// One font face usable for both measurement and embedding.
pub struct FontFace {
    family: String,
    weight: FontWeight,
    source: FaceSource,
}

impl FontFace {
    fn builtin(weight: FontWeight) -> Self {
        let (base_font, ascii_widths) = match weight {
            FontWeight::Regular => ("Helvetica", &HELVETICA_ASCII),
            FontWeight::Bold => ("Helvetica-Bold", &HELVETICA_BOLD_ASCII),
        };
        Self {
            family: base_font.to_string(),
            weight,
            source: FaceSource::Builtin {
                base_font,
                ascii_widths,
            },
        }
    }

    fn open_truetype(
        family: &str,
        weight: FontWeight,
        path: &std::path::Path,
        face_index: u32,
    ) -> Result<Self, Error> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Font(format!("{}: {e}", path.display())))?;
        let data = unsafe { Mmap::map(&file) }
            .map_err(|e| Error::Font(format!("{}: {e}", path.display())))?;
        Face::parse(&data, face_index)
            .map_err(|e| Error::Font(format!("{}: {e}", path.display())))?;
        Ok(Self {
            family: family.to_string(),
            weight,
            source: FaceSource::TrueType { data, face_index },
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn weight(&self) -> FontWeight {
        self.weight
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.source, FaceSource::Builtin { .. })
    }

    /// Characters of `text` this face has no glyph for, each listed once in
    /// order of appearance. Control characters are ignored.
    pub fn missing_chars(&self, text: &str) -> Vec<char> {
        let mut missing: Vec<char> = Vec::new();
        let candidates = text.chars().filter(|ch| !ch.is_control());
        match &self.source {
            FaceSource::Builtin { .. } => {
                for ch in candidates.filter(|&ch| char_to_winansi(ch) == 0) {
                    if !missing.contains(&ch) {
                        missing.push(ch);
                    }
                }
            }
            FaceSource::TrueType { data, face_index } => {
                let Ok(face) = Face::parse(data, *face_index) else {
                    return missing;
                };
                for ch in candidates.filter(|&ch| face.glyph_index(ch).is_none()) {
                    if !missing.contains(&ch) {
                        missing.push(ch);
                    }
                }
            }
        }
        missing
    }

    /// Sum of advance widths in 1000-units/em. Characters the face cannot
    /// show contribute nothing, matching what the exporter emits.
    pub fn text_width_1000(&self, text: &str) -> f32 {
        match &self.source {
            FaceSource::Builtin { ascii_widths, .. } => text
                .chars()
                .map(|ch| builtin_char_width(ascii_widths, ch))
                .sum(),
            FaceSource::TrueType { data, face_index } => {
                let Ok(face) = Face::parse(data, *face_index) else {
                    return 0.0;
                };
                let units = face.units_per_em() as f32;
                text.chars()
                    .filter_map(|ch| face.glyph_index(ch))
                    .filter_map(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| adv as f32 / units * 1000.0)
                    .sum()
            }
        }
    }
}

fn builtin_char_width(ascii_widths: &[u16; 95], ch: char) -> f32 {
    match char_to_winansi(ch) {
        0 => 0.0,
        b @ 32..=126 => ascii_widths[(b - 32) as usize] as f32,
        0x95 => 350.0,
        _ => 556.0,
    }
}

/// The regular and bold faces a receipt is set in.
#[derive(Clone)]
pub struct FontBook {
    regular: Arc<FontFace>,
    bold: Arc<FontFace>,
}

impl FontBook {
    pub fn helvetica() -> Self {
        Self {
            regular: Arc::new(FontFace::builtin(FontWeight::Regular)),
            bold: Arc::new(FontFace::builtin(FontWeight::Bold)),
        }
    }

    /// Looks up `family` in the font directories. A family that is not
    /// installed falls back to Helvetica with a warning; an installed file
    /// that cannot be opened is an error.
    pub fn resolve(family: Option<&str>) -> Result<Self, Error> {
        let Some(family) = family.map(str::trim).filter(|f| !f.is_empty()) else {
            return Ok(Self::helvetica());
        };
        let regular = find_font_file(family, false);
        let bold = find_font_file(family, true);
        let Some((regular_path, regular_idx)) = regular else {
            log::warn!("Font not found: {family}, using Helvetica");
            return Ok(Self::helvetica());
        };
        let regular = FontFace::open_truetype(family, FontWeight::Regular, &regular_path, regular_idx)?;
        let bold = match bold {
            Some((path, idx)) => FontFace::open_truetype(family, FontWeight::Bold, &path, idx)?,
            None => {
                log::warn!("No bold face for {family}, using Helvetica-Bold");
                FontFace::builtin(FontWeight::Bold)
            }
        };
        Ok(Self {
            regular: Arc::new(regular),
            bold: Arc::new(bold),
        })
    }

    pub fn face(&self, weight: FontWeight) -> &FontFace {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

/// (lowercase family name, bold) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool), (PathBuf, u32)>;

static FONT_INDEX: OnceLock<FontLookup> = OnceLock::new();

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(val) = std::env::var("RECEIPT_FONT_DIRS") {
        let sep = if cfg!(windows) { ';' } else { ':' };
        dirs.extend(
            val.split(sep)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        );
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
    }

    dirs
}

fn is_font_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"))
        .unwrap_or(false)
}

fn scan_font_dirs() -> FontLookup {
    let t0 = std::time::Instant::now();
    let mut index = FontLookup::new();
    let mut pending = font_directories();
    let mut scanned = 0usize;

    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            scanned += 1;
            let face_count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
            for face_idx in 0..face_count {
                let Ok(face) = Face::parse(&data, face_idx) else {
                    continue;
                };
                if face.is_italic() {
                    continue;
                }
                let Some(family) = font_family_name(&face) else {
                    continue;
                };
                index
                    .entry((family.to_lowercase(), face.is_bold()))
                    .or_insert_with(|| (path.clone(), face_idx));
            }
        }
    }

    log::debug!(
        "Font index: {} files, {} faces in {:.1}ms",
        scanned,
        index.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );
    index
}

fn find_font_file(family: &str, bold: bool) -> Option<(PathBuf, u32)> {
    FONT_INDEX
        .get_or_init(scan_font_dirs)
        .get(&(family.to_lowercase(), bold))
        .cloned()
}

/// Families with an upright regular face in the font directories, lowercase
/// and sorted.
pub fn installed_families() -> Vec<String> {
    let mut families: Vec<String> = FONT_INDEX
        .get_or_init(scan_font_dirs)
        .keys()
        .filter(|(_, bold)| !bold)
        .map(|(family, _)| family.clone())
        .collect();
    families.sort();
    families
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
pub(crate) fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(char_to_winansi)
        .filter(|&b| b != 0)
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let Some(&gid) = char_to_gid.get(&ch) else {
            continue;
        };
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

/// A face written into the PDF under `pdf_name`.
pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) char_to_gid: Option<HashMap<char, u16>>,
}

impl FontEntry {
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding.
/// The font data is subsetted to only include glyphs used in the document.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font_name: &str,
    font_data: &[u8],
    face_index: u32,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<HashMap<char, u16>, Error> {
    let face = Face::parse(font_data, face_index)
        .map_err(|e| Error::Serialization {
            message: format!("cannot re-parse font {font_name}"),
            source: Some(Box::new(e)),
        })?;

    let units = face.units_per_em() as f32;
    let to_1000 = |v: f32| v / units * 1000.0;
    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        to_1000(bb.x_min as f32),
        to_1000(bb.y_min as f32),
        to_1000(bb.x_max as f32),
        to_1000(bb.y_max as f32),
    );

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut chars: Vec<char> = used_chars.iter().copied().collect();
    chars.sort_unstable();
    for ch in chars {
        if let Some(gid) = face.glyph_index(ch) {
            char_to_gid.insert(ch, remapper.remap(gid.0));
        }
    }

    let subset_data = subsetter::subset(font_data, face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {font_name}: {e}, embedding full font");
        font_data.to_vec()
    });
    let data_len = i32::try_from(subset_data.len())
        .map_err(|_| Error::serialization(format!("font {font_name} is too large to embed")))?;

    let descriptor_ref = alloc();
    let data_ref = alloc();
    let cid_font_ref = alloc();
    let tounicode_ref = alloc();

    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = font_name.replace(' ', "");

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(to_1000(face.ascender() as f32))
        .descent(to_1000(face.descender() as f32))
        .cap_height(face.capital_height().map(|h| to_1000(h as f32)).unwrap_or(700.0))
        .stem_v(80.0)
        .font_file2(data_ref);

    let system_info = || pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        let mut gid_widths: Vec<(u16, f32)> = char_to_gid
            .iter()
            .filter_map(|(&ch, &new_gid)| {
                face.glyph_index(ch)
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| (new_gid, to_1000(adv as f32)))
            })
            .collect();
        gid_widths.sort_by_key(|&(gid, _)| gid);
        gid_widths.dedup_by_key(|&mut (gid, _)| gid);
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), system_info());
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Ok(char_to_gid)
}

pub(crate) fn register_font(
    pdf: &mut Pdf,
    face: &FontFace,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &HashSet<char>,
) -> Result<FontEntry, Error> {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let char_to_gid = match &face.source {
        FaceSource::Builtin { base_font, .. } => {
            pdf.type1_font(font_ref)
                .base_font(Name(base_font.as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            None
        }
        FaceSource::TrueType { data, face_index } => {
            let name = match face.weight {
                FontWeight::Regular => face.family.clone(),
                FontWeight::Bold => format!("{} Bold", face.family),
            };
            Some(embed_truetype(
                pdf, font_ref, &name, data, *face_index, used_chars, alloc,
            )?)
        }
    };

    log::debug!(
        "register_font: {} {:?} → {:.1}ms",
        face.family,
        face.weight,
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(FontEntry {
        pdf_name,
        font_ref,
        char_to_gid,
    })
}
