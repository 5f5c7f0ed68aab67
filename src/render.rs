use crate::model::{Sky, SUBCELL_H, SUBCELL_W};
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

/* -----------------------------
   Color helpers
------------------------------ */

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Rgbf {
    pub(crate) r: f32,
    pub(crate) g: f32,
    pub(crate) b: f32,
}

impl Rgbf {
    pub(crate) const BLACK: Rgbf = Rgbf {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub(crate) fn scale(self, k: f32) -> Rgbf {
        Rgbf {
            r: self.r * k,
            g: self.g * k,
            b: self.b * k,
        }
    }

    pub(crate) fn lerp(self, other: Rgbf, t: f32) -> Rgbf {
        let t = t.clamp(0.0, 1.0);
        Rgbf {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }

    /// Screen blend: brightens, never darkens, and saturates at white.
    pub(crate) fn screen(self, other: Rgbf) -> Rgbf {
        let f = |a: f32, b: f32| 1.0 - (1.0 - a.clamp(0.0, 1.0)) * (1.0 - b.clamp(0.0, 1.0));
        Rgbf {
            r: f(self.r, other.r),
            g: f(self.g, other.g),
            b: f(self.b, other.b),
        }
    }

    pub(crate) fn luma(self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }

    fn to_color(self) -> Color {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        Color::Rgb {
            r: q(self.r),
            g: q(self.g),
            b: q(self.b),
        }
    }
}

pub(crate) fn rgb8(r: u8, g: u8, b: u8) -> Rgbf {
    Rgbf {
        r: r as f32 / 255.0,
        g: g as f32 / 255.0,
        b: b as f32 / 255.0,
    }
}

pub(crate) fn hsl_to_rgb(h_deg: f32, s: f32, l: f32) -> Rgbf {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h_deg.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    Rgbf {
        r: r + m,
        g: g + m,
        b: b + m,
    }
}

/* -----------------------------
   Subpixel canvas
------------------------------ */

pub(crate) struct Canvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Rgbf>,
}

impl Canvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Rgbf::BLACK; (w as usize) * (h as usize)],
        }
    }

    fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn fill(&mut self, c: Rgbf) {
        self.px.fill(c);
    }

    pub(crate) fn get(&self, x: u32, y: u32) -> Rgbf {
        self.px[self.idx(x, y)]
    }

    /// Source-over with a scalar alpha.
    pub(crate) fn paint(&mut self, x: i32, y: i32, c: Rgbf, a: f32) {
        if x < 0 || y < 0 || x >= self.w as i32 || y >= self.h as i32 {
            return;
        }
        let a = a.clamp(0.0, 1.0);
        let i = self.idx(x as u32, y as u32);
        self.px[i] = self.px[i].lerp(c, a);
    }

    /// Additive screen blend.
    pub(crate) fn screen(&mut self, x: i32, y: i32, c: Rgbf) {
        if x < 0 || y < 0 || x >= self.w as i32 || y >= self.h as i32 {
            return;
        }
        let i = self.idx(x as u32, y as u32);
        self.px[i] = self.px[i].screen(c);
    }
}

/* -----------------------------
   Scene drawing. Read-only over the sky; same order as the frame
   contract: nebula, stars, meteors.
------------------------------ */

pub(crate) fn draw_sky(canvas: &mut Canvas, sky: &Sky) {
    draw_vignette(canvas, sky);
    draw_blobs(canvas, sky);
    draw_stars(canvas, sky);
    draw_meteors(canvas, sky);
}

fn draw_vignette(canvas: &mut Canvas, sky: &Sky) {
    let (w, h) = (sky.surface.w, sky.surface.h);
    let (cx, cy) = (w * 0.5, h * 0.5);
    let inner = w.min(h) * 0.1;
    let outer = w.max(h) * 0.9;
    let span = (outer - inner).max(1e-6);

    let center = rgb8(5, 15, 35).scale(0.85);
    let edge = rgb8(0, 5, 20);

    for y in 0..canvas.h {
        for x in 0..canvas.w {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            let t = ((d - inner) / span).clamp(0.0, 1.0);
            let i = canvas.idx(x, y);
            canvas.px[i] = center.lerp(edge, t);
        }
    }
}

fn draw_blobs(canvas: &mut Canvas, sky: &Sky) {
    for b in &sky.blobs {
        let r = b.r * (1.0 + b.phase.sin() * 0.07);
        if r <= 0.0 {
            continue;
        }
        let inner = hsl_to_rgb(b.hue, b.sat / 100.0, 0.55).scale(b.alpha);
        let outer = hsl_to_rgb(b.hue + 6.0, ((b.sat + 10.0) / 100.0).min(1.0), 0.40)
            .scale(b.alpha * 0.65);

        let x0 = (b.x - r).floor() as i32;
        let x1 = (b.x + r).ceil() as i32;
        let y0 = (b.y - r).floor() as i32;
        let y1 = (b.y + r).ceil() as i32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - b.x;
                let dy = y as f32 + 0.5 - b.y;
                let d = (dx * dx + dy * dy).sqrt();
                if d > r {
                    continue;
                }
                canvas.screen(x, y, inner.lerp(outer, d / r));
            }
        }
    }
}

fn draw_stars(canvas: &mut Canvas, sky: &Sky) {
    let glow_color = rgb8(220, 245, 255);
    let core_color = rgb8(255, 255, 255);

    for s in &sky.stars {
        let tw = (s.twinkle_phase.sin() + 1.0) * 0.5;
        let alpha = s.alpha * 0.6 + tw * s.alpha * 0.4;

        // Soft outer glow, fading linearly to nothing.
        let glow_r = s.r * 4.0;
        let x0 = (s.x - glow_r).floor() as i32;
        let x1 = (s.x + glow_r).ceil() as i32;
        let y0 = (s.y - glow_r).floor() as i32;
        let y1 = (s.y + glow_r).ceil() as i32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - s.x;
                let dy = y as f32 + 0.5 - s.y;
                let d = (dx * dx + dy * dy).sqrt();
                if d > glow_r {
                    continue;
                }
                canvas.paint(x, y, glow_color, alpha * (1.0 - d / glow_r));
            }
        }

        // Crisp core.
        let core_r = (s.r * 0.6).max(0.5);
        let core_a = (alpha + 0.15).min(1.0);
        let cx0 = (s.x - core_r).floor() as i32;
        let cx1 = (s.x + core_r).ceil() as i32;
        let cy0 = (s.y - core_r).floor() as i32;
        let cy1 = (s.y + core_r).ceil() as i32;
        for y in cy0..=cy1 {
            for x in cx0..=cx1 {
                let dx = x as f32 + 0.5 - s.x;
                let dy = y as f32 + 0.5 - s.y;
                if dx * dx + dy * dy > core_r * core_r {
                    continue;
                }
                canvas.paint(x, y, core_color, core_a);
            }
        }
    }
}

fn draw_meteors(canvas: &mut Canvas, sky: &Sky) {
    let head_tint = rgb8(255, 255, 255);
    let tail_tint = rgb8(140, 200, 255);
    let glow_tint = rgb8(200, 235, 255);

    for m in &sky.meteors {
        let ratio = m.life_ratio(sky.now_ms);
        if ratio <= 0.0 {
            continue;
        }

        let v = (m.vx * m.vx + m.vy * m.vy).sqrt().max(1e-6);
        let ex = m.x - m.vx / v * m.len;
        let ey = m.y - m.vy / v * m.len;

        // Fading gradient trail, head to tail.
        let steps = (m.len.ceil() as i32).max(2);
        let radius = m.width * 0.5;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let px = m.x + (ex - m.x) * t;
            let py = m.y + (ey - m.y) * t;
            let col = head_tint.lerp(tail_tint, t);
            let a = 0.95 * ratio * (1.0 - t);
            stamp_disc(canvas, px, py, radius, col, a);
        }

        // Head glow.
        stamp_disc(canvas, m.x, m.y, m.width * 1.2, glow_tint, 0.6 * ratio);
    }
}

fn stamp_disc(canvas: &mut Canvas, cx: f32, cy: f32, r: f32, c: Rgbf, a: f32) {
    let r = r.max(0.5);
    let x0 = (cx - r).floor() as i32;
    let x1 = (cx + r).ceil() as i32;
    let y0 = (cy - r).floor() as i32;
    let y1 = (cy + r).ceil() as i32;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy > r * r {
                continue;
            }
            canvas.paint(x, y, c, a);
        }
    }
}

/* -----------------------------
   Braille encoding: 2x4 subpixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // Dot mapping:
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

/// Luminance above this becomes a foreground braille dot; everything
/// dimmer (nebula, vignette) only tints the cell background.
const INK_LUMA: f32 = 0.30;

pub(crate) fn canvas_to_cells(canvas: &Canvas, out: &mut CellBuffer) {
    let cols = out.w as u32;
    let rows = out.h as u32;

    for cy in 0..rows {
        for cx in 0..cols {
            let px0 = cx * SUBCELL_W;
            let py0 = cy * SUBCELL_H;

            let mut mask: u8 = 0;
            let mut ink = Rgbf::BLACK;
            let mut ink_count = 0u32;
            let mut field = Rgbf::BLACK;
            let mut field_count = 0u32;

            for dy in 0..SUBCELL_H {
                for dx in 0..SUBCELL_W {
                    let x = px0 + dx;
                    let y = py0 + dy;
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.get(x, y);
                    field.r += p.r;
                    field.g += p.g;
                    field.b += p.b;
                    field_count += 1;

                    if p.luma() > INK_LUMA {
                        mask |= braille_bit(dx, dy);
                        ink.r += p.r;
                        ink.g += p.g;
                        ink.b += p.b;
                        ink_count += 1;
                    }
                }
            }

            let bg = if field_count > 0 {
                field.scale(1.0 / field_count as f32).to_color()
            } else {
                Color::Black
            };
            let (ch, fg) = if ink_count > 0 {
                let c = ink.scale(1.0 / ink_count as f32).to_color();
                (char::from_u32(0x2800 + mask as u32).unwrap_or(' '), c)
            } else {
                (' ', Color::White)
            };

            out.set(cx as u16, cy as u16, Cell { ch, fg, bg });
        }
    }
}

/* -----------------------------
   Cell buffer + terminal
------------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }

    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: Canvas,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: Canvas::new(cols as u32 * SUBCELL_W, rows as u32 * SUBCELL_H),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Polls the terminal size every frame; this is the authoritative
    /// resize signal (crossterm's resize events are drained as a hint only).
    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = Canvas::new(c as u32 * SUBCELL_W, r as u32 * SUBCELL_H);
        Ok(true)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Text + overlays
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

pub(crate) fn draw_box(buf: &mut CellBuffer, x0: u16, y0: u16, w: u16, h: u16) {
    if w < 2 || h < 2 {
        return;
    }
    let fg = Color::White;
    let bg = Color::Black;
    for x in x0..x0 + w {
        let ch = '─';
        buf.set(x, y0, Cell { ch, fg, bg });
        buf.set(x, y0 + h - 1, Cell { ch, fg, bg });
    }
    for y in y0..y0 + h {
        let ch = '│';
        buf.set(x0, y, Cell { ch, fg, bg });
        buf.set(x0 + w - 1, y, Cell { ch, fg, bg });
    }
    buf.set(x0, y0, Cell { ch: '┌', fg, bg });
    buf.set(x0 + w - 1, y0, Cell { ch: '┐', fg, bg });
    buf.set(x0, y0 + h - 1, Cell { ch: '└', fg, bg });
    buf.set(
        x0 + w - 1,
        y0 + h - 1,
        Cell { ch: '┘', fg, bg },
    );
    // clear the interior
    for y in y0 + 1..y0 + h - 1 {
        for x in x0 + 1..x0 + w - 1 {
            buf.set(
                x,
                y,
                Cell {
                    ch: ' ',
                    fg,
                    bg,
                },
            );
        }
    }
}

pub(crate) fn ui_overlay(buf: &mut CellBuffer, sky: &Sky, paused: bool, meteors_on: bool) {
    let hud = format!(
        "skydeck  stars:{}  meteors:{}{}  |  Q quit  Space pause  Tab deck  M meteors  H help",
        sky.stars.len(),
        if meteors_on { "on" } else { "off" },
        if paused { "  [paused]" } else { "" },
    );
    draw_text(buf, 1, 0, &hud, Color::DarkGrey, Color::Black);
}

pub(crate) fn help_overlay(buf: &mut CellBuffer) {
    let w = buf.w.saturating_sub(4).min(52);
    let h = buf.h.saturating_sub(2).min(13);
    if w < 12 || h < 5 {
        return;
    }
    let x0 = (buf.w - w) / 2;
    let y0 = (buf.h - h) / 2;
    draw_box(buf, x0, y0, w, h);

    draw_text(buf, x0 + 2, y0 + 1, "HELP", Color::White, Color::Black);
    let lines = [
        "Q / Esc      Quit",
        "Space        Pause",
        "Tab          Slide deck",
        "Left/Right   Previous / next slide",
        "M            Toggle meteor spawner",
        "R            Rebuild stars and nebula",
        "H            Toggle this overlay",
    ];
    let mut yy = y0 + 3;
    for l in lines {
        if yy >= y0 + h - 1 {
            break;
        }
        draw_text(buf, x0 + 2, yy, l, Color::Grey, Color::Black);
        yy += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_blend_brightens_and_saturates() {
        let a = rgb8(128, 0, 200);
        let white = rgb8(255, 255, 255);
        let black = Rgbf::BLACK;

        let over_black = a.screen(black);
        assert!((over_black.r - a.r).abs() < 1e-6);
        let over_white = a.screen(white);
        assert!((over_white.r - 1.0).abs() < 1e-6);
        assert!((over_white.b - 1.0).abs() < 1e-6);

        let doubled = a.screen(a);
        assert!(doubled.r >= a.r && doubled.r <= 1.0);
    }

    #[test]
    fn hsl_greys_ignore_hue() {
        let c = hsl_to_rgb(123.0, 0.0, 0.5);
        assert!((c.r - 0.5).abs() < 1e-6);
        assert!((c.g - 0.5).abs() < 1e-6);
        assert!((c.b - 0.5).abs() < 1e-6);
    }

    #[test]
    fn bright_subpixel_becomes_a_braille_dot() {
        let mut canvas = Canvas::new(4, 8);
        let mut cells = CellBuffer::new(2, 2);

        canvas.paint(0, 0, rgb8(255, 255, 255), 1.0);
        canvas_to_cells(&canvas, &mut cells);

        // dot 1 of the top-left cell
        assert_eq!(cells.cells[0].ch, '\u{2801}');
        assert_eq!(cells.cells[1].ch, ' ');
    }

    #[test]
    fn dim_field_tints_background_only() {
        let mut canvas = Canvas::new(2, 4);
        let mut cells = CellBuffer::new(1, 1);

        canvas.fill(rgb8(10, 20, 40));
        canvas_to_cells(&canvas, &mut cells);

        assert_eq!(cells.cells[0].ch, ' ');
        assert_ne!(cells.cells[0].bg, Color::Black);
    }
}
