//! Fonts and typefaces
//!
//! A [`Font`] is the per-bitmap text style; the glyph source behind it is a
//! [`Typeface`], resolved by family name through a [`FontRegistry`].

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use fontdue::FontSettings;
use log::{debug, info, warn};
use rgss_types::{Color, RgssError, RgssResult};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Rasterized glyph coverage
#[derive(Debug, Clone)]
pub struct GlyphData {
    pub width: u32,
    pub height: u32,
    /// One coverage byte per pixel, row-major
    pub bitmap: Vec<u8>,
    pub advance_width: f32,
    pub offset_x: i32,
    pub offset_y: i32,
}

/// Vertical metrics for one pixel size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_height: f32,
}

/// A source of glyphs for one font family
pub trait Typeface {
    fn family(&self) -> &str;

    /// Rasterize a character at a pixel size
    fn glyph(&self, c: char, size: f32) -> Rc<GlyphData>;

    /// Horizontal advance of a character
    fn advance(&self, c: char, size: f32) -> f32 {
        self.glyph(c, size).advance_width
    }

    fn line_metrics(&self, size: f32) -> LineMetrics;
}

/// Key for cached glyphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GlyphKey {
    character: char,
    size_tenths: u32, // Font size * 10 to avoid float hashing
}

/// `fontdue`-backed typeface with a glyph cache
pub struct FontdueFace {
    family: String,
    font: fontdue::Font,
    glyph_cache: RefCell<FxHashMap<GlyphKey, Rc<GlyphData>>>,
}

impl FontdueFace {
    /// Parse TrueType / OpenType data
    pub fn from_bytes(family: impl Into<String>, data: &[u8]) -> RgssResult<Self> {
        let family = family.into();
        let font = fontdue::Font::from_bytes(data, FontSettings::default())
            .map_err(|e| RgssError::Font(format!("failed to parse '{}': {}", family, e)))?;

        Ok(Self {
            family,
            font,
            glyph_cache: RefCell::new(FxHashMap::default()),
        })
    }

    pub fn cached_glyphs(&self) -> usize {
        self.glyph_cache.borrow().len()
    }
}

impl Typeface for FontdueFace {
    fn family(&self) -> &str {
        &self.family
    }

    fn glyph(&self, c: char, size: f32) -> Rc<GlyphData> {
        let key = GlyphKey {
            character: c,
            size_tenths: (size * 10.0) as u32,
        };

        if let Some(glyph) = self.glyph_cache.borrow().get(&key) {
            return Rc::clone(glyph);
        }

        let (metrics, bitmap) = self.font.rasterize(c, size);
        let glyph = Rc::new(GlyphData {
            width: metrics.width as u32,
            height: metrics.height as u32,
            bitmap,
            advance_width: metrics.advance_width,
            offset_x: metrics.xmin,
            offset_y: metrics.ymin,
        });
        self.glyph_cache.borrow_mut().insert(key, Rc::clone(&glyph));
        glyph
    }

    fn advance(&self, c: char, size: f32) -> f32 {
        self.font.metrics(c, size).advance_width
    }

    fn line_metrics(&self, size: f32) -> LineMetrics {
        match self.font.horizontal_line_metrics(size) {
            Some(m) => LineMetrics {
                ascent: m.ascent,
                descent: m.descent,
                line_height: m.new_line_size,
            },
            None => LineMetrics {
                ascent: size * 0.8,
                descent: -size * 0.2,
                line_height: size * 1.2,
            },
        }
    }
}

impl fmt::Debug for FontdueFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontdueFace")
            .field("family", &self.family)
            .field("cached_glyphs", &self.cached_glyphs())
            .finish()
    }
}

/// Startup font settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontDefaults {
    pub name: String,
    pub size: i32,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
}

impl Default for FontDefaults {
    fn default() -> Self {
        Self {
            name: "MS PGothic".to_string(),
            size: 22,
            bold: false,
            italic: false,
            color: Color::WHITE,
        }
    }
}

/// Text style owned by a bitmap
#[derive(Clone)]
pub struct Font {
    name: String,
    size: i32,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
    face: Option<Rc<dyn Typeface>>,
}

impl Font {
    /// Font with the given family and size and no resolved typeface
    pub fn new(name: impl Into<String>, size: i32) -> Self {
        Self {
            name: name.into(),
            size: size.max(1),
            ..Self::default()
        }
    }

    /// Font whose glyphs come from `face`
    pub fn with_face(face: Rc<dyn Typeface>, size: i32) -> Self {
        Self {
            name: face.family().to_string(),
            size: size.max(1),
            face: Some(face),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Change the family; the typeface must be resolved again
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if let Some(face) = &self.face {
            if !face.family().eq_ignore_ascii_case(&name) {
                self.face = None;
            }
        }
        self.name = name;
    }

    /// Size in pixels
    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn set_size(&mut self, size: i32) {
        self.size = size.max(1);
    }

    pub fn face(&self) -> Option<Rc<dyn Typeface>> {
        self.face.clone()
    }

    pub fn set_face(&mut self, face: Rc<dyn Typeface>) {
        self.face = Some(face);
    }

    pub(crate) fn release_face(&mut self) {
        self.face = None;
    }
}

impl Default for Font {
    fn default() -> Self {
        let defaults = FontDefaults::default();
        Self {
            name: defaults.name,
            size: defaults.size,
            bold: defaults.bold,
            italic: defaults.italic,
            color: defaults.color,
            face: None,
        }
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("bold", &self.bold)
            .field("italic", &self.italic)
            .field("color", &self.color)
            .field("resolved", &self.face.is_some())
            .finish()
    }
}

/// Typefaces by family name (case-insensitive)
pub struct FontRegistry {
    faces: FxHashMap<String, Rc<dyn Typeface>>,
    /// Registration order, for fallback
    order: Vec<String>,
    pub defaults: FontDefaults,
}

impl FontRegistry {
    pub fn new(defaults: FontDefaults) -> Self {
        Self {
            faces: FxHashMap::default(),
            order: Vec::new(),
            defaults,
        }
    }

    /// Register a typeface under its family name
    pub fn register(&mut self, face: Rc<dyn Typeface>) {
        let key = face.family().to_lowercase();
        debug!("Registering typeface '{}'", face.family());
        if self.faces.insert(key.clone(), face).is_none() {
            self.order.push(key);
        }
    }

    /// Parse font data and register it
    pub fn register_bytes(&mut self, family: &str, data: &[u8]) -> RgssResult<()> {
        let face = FontdueFace::from_bytes(family, data)?;
        self.register(Rc::new(face));
        Ok(())
    }

    /// Register every `.ttf` / `.otf` file in a directory, keyed by file
    /// stem. Returns how many were loaded; unreadable fonts are skipped.
    pub fn load_dir(&mut self, dir: &Path) -> RgssResult<usize> {
        let mut loaded = 0;
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
                .unwrap_or(false);
            if !is_font {
                continue;
            }
            let Some(family) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let data = fs::read(&path)?;
            match self.register_bytes(family, &data) {
                Ok(()) => loaded += 1,
                Err(e) => warn!("Skipping font {}: {}", path.display(), e),
            }
        }
        info!("Loaded {} font(s) from {}", loaded, dir.display());
        Ok(loaded)
    }

    /// Check if a family is available
    pub fn exists(&self, name: &str) -> bool {
        self.faces.contains_key(&name.to_lowercase())
    }

    pub fn face(&self, name: &str) -> Option<Rc<dyn Typeface>> {
        self.faces.get(&name.to_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Typeface for the default family, falling back to the first one
    /// registered
    fn default_face(&self) -> Option<Rc<dyn Typeface>> {
        self.face(&self.defaults.name)
            .or_else(|| self.order.first().and_then(|key| self.faces.get(key).cloned()))
    }

    /// Font built from the current defaults
    pub fn default_font(&self) -> Font {
        Font {
            name: self.defaults.name.clone(),
            size: self.defaults.size.max(1),
            bold: self.defaults.bold,
            italic: self.defaults.italic,
            color: self.defaults.color,
            face: self.default_face(),
        }
    }

    /// Font for a specific family and size; unknown families fall back to
    /// the default typeface
    pub fn font(&self, name: &str, size: i32) -> Font {
        let mut font = self.default_font();
        font.name = name.to_string();
        font.size = size.max(1);
        font.face = self.face(name).or_else(|| self.default_face());
        font
    }

    /// Attach a typeface to a font that has none
    pub fn resolve(&self, font: &mut Font) {
        if font.face.is_none() {
            font.face = self.face(&font.name).or_else(|| self.default_face());
        }
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new(FontDefaults::default())
    }
}

impl fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontRegistry")
            .field("families", &self.order)
            .field("defaults", &self.defaults)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::BoxFace;
    use super::*;

    #[test]
    fn test_default_font() {
        let font = Font::default();
        assert_eq!(font.name(), "MS PGothic");
        assert_eq!(font.size(), 22);
        assert_eq!(font.color, Color::WHITE);
        assert!(font.face().is_none());
    }

    #[test]
    fn test_registry_lookup_is_case_insensitive() {
        let mut registry = FontRegistry::default();
        registry.register(BoxFace::new("Box Sans"));
        assert!(registry.exists("box sans"));
        assert!(registry.exists("BOX SANS"));
        assert!(!registry.exists("Arial"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_default_font_falls_back() {
        let mut registry = FontRegistry::default();
        assert!(registry.default_font().face().is_none());

        registry.register(BoxFace::new("Fallback"));
        let font = registry.default_font();
        assert_eq!(font.name(), "MS PGothic");
        assert_eq!(font.face().unwrap().family(), "Fallback");
    }

    #[test]
    fn test_font_by_name() {
        let mut registry = FontRegistry::default();
        registry.register(BoxFace::new("A"));
        registry.register(BoxFace::new("B"));
        let font = registry.font("b", 16);
        assert_eq!(font.size(), 16);
        assert_eq!(font.face().unwrap().family(), "B");
    }

    #[test]
    fn test_set_name_drops_mismatched_face() {
        let mut font = Font::with_face(BoxFace::new("A"), 12);
        font.set_name("a");
        assert!(font.face().is_some());
        font.set_name("Other");
        assert!(font.face().is_none());

        let mut registry = FontRegistry::default();
        registry.register(BoxFace::new("Other"));
        registry.resolve(&mut font);
        assert_eq!(font.face().unwrap().family(), "Other");
    }

    #[test]
    fn test_invalid_font_bytes() {
        let err = FontdueFace::from_bytes("Broken", &[0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, RgssError::Font(_)));
    }

    #[test]
    fn test_size_is_at_least_one() {
        let mut font = Font::new("X", 0);
        assert_eq!(font.size(), 1);
        font.set_size(-5);
        assert_eq!(font.size(), 1);
    }
}
