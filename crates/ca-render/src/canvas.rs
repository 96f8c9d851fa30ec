use ca_core::frame::FrameBuffer;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;

/// Demi-bloc supérieur : fg = pixel du haut, bg = pixel du bas.
const UPPER_HALF: char = '▀';

/// Plus grand rectangle centré dans `area` qui garde le ratio de
/// `width × height` (une cellule terminal = 1 × 2 pixels).
///
/// # Example
/// ```
/// use ca_render::canvas::fit_area;
/// use ratatui::layout::Rect;
/// let r = fit_area(Rect::new(0, 0, 80, 20), 160, 40);
/// assert_eq!((r.width, r.height), (80, 10));
/// ```
#[must_use]
pub fn fit_area(area: Rect, width: u32, height: u32) -> Rect {
    if width == 0 || height == 0 || area.width == 0 || area.height == 0 {
        return Rect::new(area.x, area.y, 0, 0);
    }
    let max_w = u64::from(area.width);
    let max_h = u64::from(area.height) * 2;
    let (w, h) = (u64::from(width), u64::from(height));
    // Largeur limitante ou hauteur limitante
    let (cols, px_rows) = if w * max_h >= h * max_w {
        (max_w, (h * max_w / w).max(1))
    } else {
        ((w * max_h / h).max(1), max_h)
    };
    let rows = px_rows.div_ceil(2).min(u64::from(area.height));
    let cols = cols as u16;
    let rows = rows as u16;
    Rect::new(
        area.x + (area.width - cols) / 2,
        area.y + (area.height - rows) / 2,
        cols,
        rows,
    )
}

/// Écrit `fb` dans `buf` en demi-blocs, échantillonnage au plus proche
/// voisin, sur toute la surface de `area`.
pub fn render_halfblock(buf: &mut Buffer, area: Rect, fb: &FrameBuffer) {
    if fb.width == 0 || fb.height == 0 || area.width == 0 || area.height == 0 {
        return;
    }
    let px_rows = u32::from(area.height) * 2;
    let cols = u32::from(area.width);
    for cy in 0..area.height {
        for cx in 0..area.width {
            let px = (u32::from(cx) * fb.width / cols).min(fb.width - 1);
            let top_row = u32::from(cy) * 2;
            let py_top = (top_row * fb.height / px_rows).min(fb.height - 1);
            let py_bottom = ((top_row + 1) * fb.height / px_rows).min(fb.height - 1);
            let [tr, tg, tb] = fb.rgb(px, py_top);
            let [br, bg, bb] = fb.rgb(px, py_bottom);
            if let Some(cell) = buf.cell_mut((area.x + cx, area.y + cy)) {
                cell.set_char(UPPER_HALF)
                    .set_fg(Color::Rgb(tr, tg, tb))
                    .set_bg(Color::Rgb(br, bg, bb));
            }
        }
    }
}

/// Widget ratatui d'une frame, centrée et au ratio.
pub struct FrameWidget<'a> {
    frame: &'a FrameBuffer,
}

impl<'a> FrameWidget<'a> {
    /// Wrap `frame`.
    #[must_use]
    pub fn new(frame: &'a FrameBuffer) -> Self {
        Self { frame }
    }
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let target = fit_area(area, self.frame.width, self.frame.height);
        render_halfblock(buf, target, self.frame);
    }
}
