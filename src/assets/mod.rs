//! Background image library backing the panel dropdown.

use std::path::{Path, PathBuf};

use image::RgbaImage;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Name shown for the plain-white background option.
pub const WHITE_BACKGROUND: &str = "white";

#[derive(Debug, Clone)]
pub enum BackgroundKind {
    White,
    Image(PathBuf),
}

#[derive(Debug, Clone)]
pub struct BackgroundEntry {
    pub name: String,
    pub kind: BackgroundKind,
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to decode image at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("not a supported image file: {path}")]
    UnsupportedFile { path: String },
}

/// Flat list of selectable backgrounds: the white fallback plus every image
/// found in the backgrounds directory, plus anything added via the file
/// dialog at runtime.
pub struct BackgroundLibrary {
    entries: Vec<BackgroundEntry>,
}

impl BackgroundLibrary {
    /// Build the library from a directory scan. A missing or unreadable
    /// directory just leaves the white entry; the viewer stays usable.
    pub fn scan(dir: &Path) -> Self {
        let mut entries = vec![BackgroundEntry {
            name: WHITE_BACKGROUND.to_string(),
            kind: BackgroundKind::White,
        }];

        let mut found: Vec<PathBuf> = match std::fs::read_dir(dir) {
            Ok(read_dir) => read_dir
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| is_supported_image(path))
                .collect(),
            Err(err) => {
                log::info!("No backgrounds directory at {}: {}", dir.display(), err);
                Vec::new()
            }
        };
        found.sort();

        for path in found {
            entries.push(entry_for(path));
        }

        log::info!("Background library holds {} entries", entries.len());
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BackgroundEntry> {
        self.entries.get(index)
    }

    /// Dropdown labels, in selection order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    /// Add a file picked from the dialog. Returns its index for immediate
    /// selection. A file already in the library is not duplicated.
    pub fn register_file(&mut self, path: PathBuf) -> Result<usize, AssetError> {
        if !is_supported_image(&path) {
            return Err(AssetError::UnsupportedFile {
                path: path.display().to_string(),
            });
        }
        let entry = entry_for(path);
        if let Some(existing) = self.index_of(&entry.name) {
            return Ok(existing);
        }
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    /// Decode the pixels for an entry. `None` means plain white; the
    /// renderer substitutes its 1×1 white texture.
    pub fn load_pixels(&self, index: usize) -> Result<Option<RgbaImage>, AssetError> {
        let Some(entry) = self.entries.get(index) else {
            return Ok(None);
        };
        match &entry.kind {
            BackgroundKind::White => Ok(None),
            BackgroundKind::Image(path) => {
                let image = image::open(path).map_err(|source| AssetError::Decode {
                    path: path.display().to_string(),
                    source,
                })?;
                Ok(Some(image.to_rgba8()))
            }
        }
    }
}

fn entry_for(path: PathBuf) -> BackgroundEntry {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    BackgroundEntry {
        name,
        kind: BackgroundKind::Image(path),
    }
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
