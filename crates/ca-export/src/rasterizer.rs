use ab_glyph::{Font, FontVec, PxScale, point};
use ca_core::error::CoreError;
use ca_core::frame::FrameBuffer;
use ca_core::traits::GlyphRenderer;
use std::path::{Path, PathBuf};

/// Polices monospace usuelles, essayées dans l'ordre quand aucune police
/// n'est configurée.
const SYSTEM_FONTS: &[&str] = &[
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeMonoBold.ttf",
    // macOS
    "/System/Library/Fonts/Menlo.ttc",
    "/System/Library/Fonts/Monaco.ttf",
    "/Library/Fonts/Courier New Bold.ttf",
    // Windows
    "C:\\Windows\\Fonts\\courbd.ttf",
    "C:\\Windows\\Fonts\\cour.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
];

/// Seuil de couverture : au-dessus, le pixel appartient au glyphe.
const COVERAGE_THRESHOLD: f32 = 0.5;

/// Premier fichier de [`SYSTEM_FONTS`] présent sur la machine.
#[must_use]
pub fn find_system_font() -> Option<PathBuf> {
    SYSTEM_FONTS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Rend les glyphes d'une police TrueType/OpenType en stamps RGBA.
///
/// Pas d'anticrénelage : un pixel est soit entièrement dans la couleur du
/// glyphe, soit transparent. Tous les stamps ont la taille d'une cellule
/// de police (avance de 'M' × hauteur de ligne).
pub struct FontGlyphRenderer {
    font: FontVec,
    scale: PxScale,
    ascent_px: f32,
    char_width: u32,
    char_height: u32,
}

impl FontGlyphRenderer {
    /// Load `path`, or the first system monospace font when `None`.
    ///
    /// # Errors
    /// Returns [`CoreError::ResourceUnavailable`] if no font is found or the
    /// file is not a usable font.
    pub fn open(path: Option<&Path>, size_px: f32) -> Result<Self, CoreError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => find_system_font().ok_or_else(|| CoreError::ResourceUnavailable {
                resource: "police monospace".into(),
                reason: "aucune police système trouvée, utilisez --font".into(),
            })?,
        };
        let data = std::fs::read(&path).map_err(|e| CoreError::ResourceUnavailable {
            resource: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let renderer = Self::from_bytes(data, size_px).map_err(|e| match e {
            CoreError::ResourceUnavailable { reason, .. } => CoreError::ResourceUnavailable {
                resource: path.display().to_string(),
                reason,
            },
            other => other,
        })?;
        log::info!(
            "Police {} @ {size_px}px, cellule {}x{}",
            path.display(),
            renderer.char_width,
            renderer.char_height
        );
        Ok(renderer)
    }

    /// Build a renderer from raw font bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::ResourceUnavailable`] if the bytes are not a font.
    pub fn from_bytes(data: Vec<u8>, size_px: f32) -> Result<Self, CoreError> {
        let font = FontVec::try_from_vec(data).map_err(|e| CoreError::ResourceUnavailable {
            resource: "police".into(),
            reason: e.to_string(),
        })?;
        let scale = PxScale::from(size_px);
        let units = font.height_unscaled();

        let v_advance = font.ascent_unscaled() - font.descent_unscaled() + font.line_gap_unscaled();
        let height = (v_advance * scale.y / units).ceil() as u32;

        let m_glyph = font.glyph_id('M');
        let h_advance = font.h_advance_unscaled(m_glyph);
        let width = (h_advance * scale.x / units).ceil() as u32;

        let ascent_px = font.ascent_unscaled() * scale.y / units;

        Ok(Self {
            font,
            scale,
            ascent_px,
            char_width: width.max(1),
            char_height: height.max(1),
        })
    }
}

impl GlyphRenderer for FontGlyphRenderer {
    fn glyph_size(&self) -> (u32, u32) {
        (self.char_width, self.char_height)
    }

    fn render_glyph(&self, ch: char, rgb: [u8; 3]) -> Result<FrameBuffer, CoreError> {
        let mut stamp = FrameBuffer::new(self.char_width, self.char_height);

        // glyph_id 0 = .notdef : le glyphe n'existe pas dans la police
        let gid = self.font.glyph_id(ch);
        if gid.0 == 0 && !ch.is_whitespace() {
            return Err(CoreError::ResourceUnavailable {
                resource: format!("glyphe {ch:?}"),
                reason: "absent de la police".into(),
            });
        }

        let glyph = gid.with_scale_and_position(self.scale, point(0.0, self.ascent_px));
        if let Some(outline) = self.font.outline_glyph(glyph) {
            let bounds = outline.px_bounds();
            let (w, h) = (self.char_width, self.char_height);
            #[allow(clippy::cast_possible_wrap)]
            outline.draw(|x, y, coverage| {
                if coverage < COVERAGE_THRESHOLD {
                    return;
                }
                let px = x as i32 + bounds.min.x as i32;
                let py = y as i32 + bounds.min.y as i32;
                if px >= 0 && py >= 0 && (px as u32) < w && (py as u32) < h {
                    let idx = (py as usize * w as usize + px as usize) * 4;
                    stamp.data[idx..idx + 4].copy_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
                }
            });
        }
        Ok(stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_not_a_font() {
        let err = FontGlyphRenderer::from_bytes(vec![0, 1, 2, 3], 12.0).err().unwrap();
        assert!(matches!(err, CoreError::ResourceUnavailable { .. }));
    }

    #[test]
    fn missing_font_file_is_unavailable() {
        let err = FontGlyphRenderer::open(Some(Path::new("/nonexistent/font.ttf")), 12.0)
            .err()
            .unwrap();
        assert!(err.to_string().contains("/nonexistent/font.ttf"));
    }

    #[test]
    fn system_font_renders_binary_stamps() {
        // Sans police système (CI minimale), rien à vérifier.
        let Some(path) = find_system_font() else {
            return;
        };
        let renderer = FontGlyphRenderer::open(Some(&path), 12.0).unwrap();
        let (w, h) = renderer.glyph_size();
        assert!(w > 0 && h > w / 2);

        let hash = renderer.render_glyph('#', [200, 10, 10]).unwrap();
        assert_eq!((hash.width, hash.height), (w, h));
        let opaque = hash.data.chunks_exact(4).filter(|px| px[3] == 255).count();
        assert!(opaque > 0);
        assert!(
            hash.data
                .chunks_exact(4)
                .all(|px| px[3] == 0 || px == [200, 10, 10, 255])
        );

        let space = renderer.render_glyph(' ', [255, 255, 255]).unwrap();
        assert!(space.data.chunks_exact(4).all(|px| px[3] == 0));
    }
}
