//! Font registry injected into the rasterizer.
//!
//! A [`FontCatalog`] wraps a `fontdb` database plus a map from registration
//! names to the family names the faces actually declare. Users register a
//! font as "David" while the file may call itself "David CLM"; the catalog
//! resolves one to the other so the SVG text layer can ask for the real
//! family.
//!
//! Lookups never fail hard: an unknown family resolves to `None` and the text
//! layer falls back to the generic sans-serif family.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use ttf_parser::{Face, name_id};
use usvg::fontdb;

/// Generic family used when a requested family is unavailable.
pub const FALLBACK_FAMILY: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum FontError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported font file {}: expected .ttf or .otf", .0.display())]
    UnsupportedExtension(PathBuf),
    #[error("font '{name}' is not a usable TrueType/OpenType face: {reason}")]
    Parse { name: String, reason: String },
}

#[derive(Clone)]
pub struct FontCatalog {
    db: Arc<fontdb::Database>,
    /// Lowercased registration name → declared family name.
    aliases: HashMap<String, String>,
}

impl FontCatalog {
    /// Catalog with no fonts at all. Text still renders if the host has a
    /// sans-serif face registered later; mostly useful for tests.
    pub fn empty() -> Self {
        Self {
            db: Arc::new(fontdb::Database::new()),
            aliases: HashMap::new(),
        }
    }

    /// Catalog seeded with the fonts installed on this machine.
    pub fn with_system_fonts() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        debug!(faces = db.len(), "loaded system fonts");
        Self {
            db: Arc::new(db),
            aliases: HashMap::new(),
        }
    }

    /// Register font bytes under `name`. Returns the family name the face
    /// declares, which is what `name` resolves to afterwards.
    pub fn register(&mut self, name: &str, data: Vec<u8>) -> Result<String, FontError> {
        let family = declared_family(&data)
            .map_err(|reason| FontError::Parse {
                name: name.to_string(),
                reason,
            })?
            .unwrap_or_else(|| name.to_string());
        Arc::make_mut(&mut self.db).load_font_data(data);
        self.aliases.insert(name.to_lowercase(), family.clone());
        debug!(name, family = family.as_str(), "registered font");
        Ok(family)
    }

    /// Register a `.ttf`/`.otf` file under its file stem.
    pub fn register_file(&mut self, path: &Path) -> Result<String, FontError> {
        let stem = font_stem(path).ok_or_else(|| FontError::UnsupportedExtension(path.into()))?;
        let data = std::fs::read(path)?;
        self.register(&stem, data)
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Family name to use for `name`: a registered alias, or a family the
    /// database already knows (case-insensitive).
    pub fn resolve(&self, name: &str) -> Option<String> {
        if let Some(family) = self.aliases.get(&name.to_lowercase()) {
            return Some(family.clone());
        }
        self.db.faces().find_map(|face| {
            face.families
                .iter()
                .find(|(family, _)| family.eq_ignore_ascii_case(name))
                .map(|(family, _)| family.clone())
        })
    }

    /// CSS-style `font-family` list for the text layer. Unknown families
    /// fall back to [`FALLBACK_FAMILY`] alone.
    pub fn family_list(&self, name: &str) -> String {
        match self.resolve(name) {
            Some(family) => format!("'{family}', Arial, {FALLBACK_FAMILY}"),
            None => FALLBACK_FAMILY.to_string(),
        }
    }

    /// Sorted, de-duplicated family names known to the catalog.
    pub fn families(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .db
            .faces()
            .flat_map(|face| face.families.iter().map(|(family, _)| family.clone()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub(crate) fn database(&self) -> Arc<fontdb::Database> {
        Arc::clone(&self.db)
    }
}

impl Default for FontCatalog {
    fn default() -> Self {
        Self::with_system_fonts()
    }
}

impl std::fmt::Debug for FontCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCatalog")
            .field("faces", &self.db.len())
            .field("aliases", &self.aliases)
            .finish()
    }
}

/// File stem of a `.ttf`/`.otf` path (extension matched case-insensitively).
fn font_stem(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if ext != "ttf" && ext != "otf" {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}

/// Family declared by the first parsable face. `Err` if no face parses.
fn declared_family(data: &[u8]) -> Result<Option<String>, String> {
    let count = ttf_parser::fonts_in_collection(data).unwrap_or(1);
    let mut last_error = String::from("empty font data");
    for index in 0..count {
        match Face::parse(data, index) {
            Ok(face) => return Ok(extract_family_name(&face)),
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(last_error)
}

/// Typographic family (name id 16) if present, otherwise the legacy family.
fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}
