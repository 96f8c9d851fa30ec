use thiserror::Error;

/// Errors originating from the core module.
///
/// Toutes ces erreurs sont fatales au démarrage : aucune n'est produite
/// pendant la boucle de rendu.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value (glyph ramp, color levels, cell size).
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// A rendering resource (font, glyph) is missing or unusable.
    #[error("Ressource indisponible ({resource}) : {reason}")]
    ResourceUnavailable {
        /// What was being loaded, e.g. a font path or a glyph.
        resource: String,
        /// Why it could not be used.
        reason: String,
    },

    /// Referenced file does not exist.
    #[error("Fichier introuvable : {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_resource() {
        let err = CoreError::ResourceUnavailable {
            resource: "font.ttf".into(),
            reason: "not a font".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("font.ttf"));
        assert!(msg.contains("not a font"));
    }
}
