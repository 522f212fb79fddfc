use crate::scene::GlassParams;
use std::path::Path;

/// Everything the panel can tweak, persisted as one JSON document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewerSettings {
    pub material: GlassParams,
    pub background: String,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            material: GlassParams::default(),
            background: "white".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

pub fn save_settings_to_file(settings: &ViewerSettings, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_settings_from_file(path: &Path) -> Result<ViewerSettings> {
    let json = std::fs::read_to_string(path)?;
    let settings: ViewerSettings = serde_json::from_str(&json)?;
    Ok(settings)
}
