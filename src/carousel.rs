use crate::render::{Cell, CellBuffer};
use crossterm::style::Color;

/// One panel of the deck. Slides are fixed content; the deck only ever
/// changes which one sits in the viewport.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Slide {
    pub(crate) title: &'static str,
    pub(crate) lines: &'static [&'static str],
}

/// A minimal carousel: a current index into a fixed slide sequence, plus
/// the horizontal track offset that puts the selected slide in view.
pub(crate) struct Deck {
    slides: Vec<Slide>,
    index: usize,
}

impl Deck {
    pub(crate) fn new(slides: Vec<Slide>) -> Self {
        Self { slides, index: 0 }
    }

    pub(crate) fn builtin() -> Self {
        Self::new(vec![
            Slide {
                title: "Welcome",
                lines: &[
                    "A decorative night sky for your terminal:",
                    "three parallax star layers, a drifting",
                    "nebula, and the occasional meteor.",
                ],
            },
            Slide {
                title: "Controls",
                lines: &[
                    "Left / Right  flip through these slides",
                    "Tab           close the deck",
                    "Space         pause the sky",
                    "M             toggle meteors",
                ],
            },
            Slide {
                title: "Colophon",
                lines: &[
                    "Everything on screen is procedural;",
                    "pass --seed N to replay a layout,",
                    "--fps N to change the frame cap.",
                ],
            },
        ])
    }

    pub(crate) fn len(&self) -> usize {
        self.slides.len()
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Normalize any integer into [0, N), wrapping negative input too.
    /// A no-op on an empty deck; the modulo is never taken against zero.
    pub(crate) fn go(&mut self, i: i64) {
        let n = self.slides.len() as i64;
        if n == 0 {
            return;
        }
        self.index = (((i % n) + n) % n) as usize;
    }

    pub(crate) fn next(&mut self) {
        self.go(self.index as i64 + 1);
    }

    pub(crate) fn prev(&mut self) {
        self.go(self.index as i64 - 1);
    }

    /// Horizontal track offset: the selected slide's left edge, one
    /// viewport width per index.
    pub(crate) fn track_offset(&self, viewport_w: i32) -> i32 {
        self.index as i32 * viewport_w
    }

    /// Boxed overlay. All slides sit side by side on a virtual track that
    /// is shifted left by the offset; characters outside the viewport are
    /// clipped away.
    pub(crate) fn draw(&self, buf: &mut CellBuffer) {
        if self.slides.is_empty() {
            return;
        }

        let w = buf.w.saturating_sub(4).min(48);
        let h = buf.h.saturating_sub(2).min(11);
        if w < 12 || h < 6 {
            return;
        }
        let x0 = (buf.w - w) / 2;
        let y0 = (buf.h - h) / 2;
        crate::render::draw_box(buf, x0, y0, w, h);

        let vw = (w - 2) as i32;
        let min_x = (x0 + 1) as i32;
        let max_x = (x0 + w - 1) as i32;
        let offset = self.track_offset(vw);

        for (j, slide) in self.slides.iter().enumerate() {
            let base_x = min_x + j as i32 * vw - offset;
            if base_x >= max_x || base_x + vw <= min_x {
                continue;
            }
            draw_clipped(buf, base_x + 1, (y0 + 1) as i32, min_x, max_x, slide.title, Color::White);
            for (li, line) in slide.lines.iter().enumerate() {
                let y = y0 as i32 + 3 + li as i32;
                if y >= (y0 + h - 2) as i32 {
                    break;
                }
                draw_clipped(buf, base_x + 1, y, min_x, max_x, line, Color::Grey);
            }
        }

        // position dots + trigger hint
        let mut dots = String::new();
        for j in 0..self.len() {
            dots.push(if j == self.index() { '●' } else { '○' });
            dots.push(' ');
        }
        let dots_x = x0 as i32 + (w as i32 - dots.chars().count() as i32) / 2;
        draw_clipped(
            buf,
            dots_x,
            (y0 + h - 2) as i32,
            min_x,
            max_x,
            dots.trim_end(),
            Color::DarkGrey,
        );
    }
}

fn draw_clipped(
    buf: &mut CellBuffer,
    x: i32,
    y: i32,
    min_x: i32,
    max_x: i32,
    s: &str,
    fg: Color,
) {
    if y < 0 || y >= buf.h as i32 {
        return;
    }
    for (i, ch) in s.chars().enumerate() {
        let xx = x + i as i32;
        if xx < min_x {
            continue;
        }
        if xx >= max_x || xx >= buf.w as i32 {
            break;
        }
        buf.set(
            xx as u16,
            y as u16,
            Cell {
                ch,
                fg,
                bg: Color::Black,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck_of(n: usize) -> Deck {
        let slide = Slide {
            title: "t",
            lines: &[],
        };
        Deck::new(vec![slide; n])
    }

    #[test]
    fn go_normalizes_any_integer_into_range() {
        let mut deck = deck_of(3);
        for i in -10i64..=10 {
            deck.go(i);
            let expected = (((i % 3) + 3) % 3) as usize;
            assert_eq!(deck.index(), expected);
        }
    }

    #[test]
    fn next_next_prev_scenario() {
        let mut deck = deck_of(3);
        assert_eq!(deck.index(), 0);
        deck.next();
        deck.next();
        assert_eq!(deck.index(), 2);
        deck.prev();
        assert_eq!(deck.index(), 1);
    }

    #[test]
    fn wraps_around_both_ends() {
        let mut deck = deck_of(3);
        deck.prev();
        assert_eq!(deck.index(), 2);
        deck.next();
        assert_eq!(deck.index(), 0);
    }

    #[test]
    fn empty_deck_is_inert() {
        let mut deck = deck_of(0);
        deck.go(5);
        deck.next();
        deck.prev();
        assert_eq!(deck.index(), 0);
        assert_eq!(deck.len(), 0);
    }

    #[test]
    fn track_offset_is_index_times_viewport() {
        let mut deck = deck_of(3);
        deck.go(2);
        assert_eq!(deck.track_offset(40), 80);
        deck.go(0);
        assert_eq!(deck.track_offset(40), 0);
    }
}
