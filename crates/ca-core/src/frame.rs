use crate::error::CoreError;

/// Buffer de pixels réutilisable. Sert de frame source, de canvas de sortie
/// et de stamp de glyphe.
///
/// Stocke les pixels en RGBA row-major, 4 bytes par pixel. Pour un stamp,
/// alpha = 0 marque un pixel transparent (non copié au blit).
///
/// # Example
/// ```
/// use ca_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer pré-alloué aux dimensions données (noir transparent).
    ///
    /// # Example
    /// ```
    /// use ca_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(100, 50);
    /// assert_eq!(fb.width, 100);
    /// assert_eq!(fb.height, 50);
    /// assert_eq!(fb.data.len(), 100 * 50 * 4);
    /// ```
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Wrap an existing RGBA buffer.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if `data.len()` is not
    /// `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build an opaque frame from one luminance byte per pixel.
    ///
    /// Gray pixels are stored as `(v, v, v)`, so [`FrameBuffer::luminance`]
    /// gives back `v` exactly.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if `luma.len()` is not
    /// `width * height`.
    ///
    /// # Example
    /// ```
    /// use ca_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::from_luma(2, 1, &[0, 200]).unwrap();
    /// assert_eq!(fb.luminance(1, 0), 200);
    /// ```
    pub fn from_luma(width: u32, height: u32, luma: &[u8]) -> Result<Self, CoreError> {
        if luma.len() != width as usize * height as usize {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        let data = luma.iter().flat_map(|&v| [v, v, v, 255]).collect();
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Accès au pixel (x, y) → (r, g, b, a).
    ///
    /// # Panics
    /// Panics if `(x, y)` lies outside the buffer.
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let idx = self.offset(x, y);
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }

    /// Couleur (r, g, b) du pixel, alpha ignoré.
    #[inline(always)]
    #[must_use]
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = self.offset(x, y);
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Luminance BT.601 (mêmes poids que la conversion RGB→gris usuelle),
    /// arrondie à l'entier le plus proche.
    ///
    /// # Example
    /// ```
    /// use ca_core::frame::FrameBuffer;
    /// let mut fb = FrameBuffer::new(1, 1);
    /// fb.fill([255, 255, 255]);
    /// assert_eq!(fb.luminance(0, 0), 255);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn luminance(&self, x: u32, y: u32) -> u8 {
        let [r, g, b] = self.rgb(x, y);
        luma_bt601(r, g, b)
    }

    /// Fill the whole buffer with an opaque color.
    pub fn fill(&mut self, rgb: [u8; 3]) {
        for px in self.data.chunks_exact_mut(4) {
            px[0] = rgb[0];
            px[1] = rgb[1];
            px[2] = rgb[2];
            px[3] = 255;
        }
    }

    /// Paint an opaque `w × h` rectangle at `(x, y)`, clipped to the buffer.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, rgb: [u8; 3]) {
        if x >= self.width {
            return;
        }
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for py in y..y_end {
            let start = self.offset(x, py);
            let end = start + (x_end.saturating_sub(x) as usize) * 4;
            for px in self.data[start..end].chunks_exact_mut(4) {
                px[0] = rgb[0];
                px[1] = rgb[1];
                px[2] = rgb[2];
                px[3] = 255;
            }
        }
    }

    /// Copy every non-transparent pixel of `stamp` at `(x, y)`, clipped to
    /// the buffer. No blending: covered pixels are overwritten.
    pub fn blit_masked(&mut self, stamp: &FrameBuffer, x: u32, y: u32) {
        let w = stamp.width.min(self.width.saturating_sub(x));
        let h = stamp.height.min(self.height.saturating_sub(y));
        if w == 0 || h == 0 {
            return;
        }
        for sy in 0..h {
            let src_start = stamp.offset(0, sy);
            let dst_start = self.offset(x, y + sy);
            let len = w as usize * 4;
            let src = &stamp.data[src_start..src_start + len];
            let dst = &mut self.data[dst_start..dst_start + len];
            for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                if s[3] != 0 {
                    d[0] = s[0];
                    d[1] = s[1];
                    d[2] = s[2];
                    d[3] = 255;
                }
            }
        }
    }

    /// Réalloue le buffer si les dimensions changent. Sans effet sinon.
    pub fn ensure_size(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            *self = Self::new(width, height);
        }
    }

    #[inline(always)]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

/// Integer BT.601 luma: `round(0.299 R + 0.587 G + 0.114 B)`.
///
/// # Example
/// ```
/// use ca_core::frame::luma_bt601;
/// assert_eq!(luma_bt601(0, 0, 0), 0);
/// assert_eq!(luma_bt601(255, 255, 255), 255);
/// ```
#[inline(always)]
#[must_use]
pub fn luma_bt601(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114 + 500) / 1000) as u8
}
