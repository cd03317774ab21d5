//! Text layout and glyph rasterization

use rgss_types::Rect;

use crate::blend;
use crate::font::{Font, Typeface};

/// Horizontal placement of a line inside its rect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Map the scripting convention (0 = left, 1 = center, 2 = right)
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => TextAlign::Center,
            2 => TextAlign::Right,
            _ => TextAlign::Left,
        }
    }
}

/// Horizontal shear factor for synthetic italics
const ITALIC_SHEAR: f32 = 0.2;

/// Detached RGBA8 region text is drawn into
pub(crate) struct Scratch<'a> {
    pub data: &'a mut [u8],
    pub width: usize,
    pub height: usize,
}

impl Scratch<'_> {
    fn blend(&mut self, x: i32, y: i32, rgba: [u8; 4]) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        let dst = [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]];
        let out = blend::blend_over(dst, rgba, 255);
        self.data[i..i + 4].copy_from_slice(&out);
    }
}

fn bold_extra(font: &Font, c: char) -> f32 {
    if font.bold && !c.is_whitespace() {
        1.0
    } else {
        0.0
    }
}

/// Width of a single line of text
pub(crate) fn measure(face: &dyn Typeface, font: &Font, text: &str) -> f32 {
    let size = font.size() as f32;
    text.chars()
        .map(|c| face.advance(c, size) + bold_extra(font, c))
        .sum()
}

/// Break text into lines no wider than `max_width`.
///
/// Newlines always break. Words wider than a whole line are split between
/// characters.
pub(crate) fn layout_lines(face: &dyn Typeface, font: &Font, text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if measure(face, font, &candidate) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if measure(face, font, word) <= max_width {
                current = word.to_string();
                continue;
            }

            for c in word.chars() {
                current.push(c);
                if measure(face, font, &current) > max_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }

        lines.push(current);
    }

    lines
}

/// Draw `text` into `scratch`, laid out inside `area` (scratch coordinates)
pub(crate) fn render(
    scratch: &mut Scratch<'_>,
    area: Rect,
    font: &Font,
    face: &dyn Typeface,
    text: &str,
    align: TextAlign,
    wrap: bool,
) {
    let size = font.size() as f32;
    let metrics = face.line_metrics(size);

    let (lines, top) = if wrap {
        (layout_lines(face, font, text, area.width as f32), area.y as f32)
    } else {
        let line = text.replace(['\r', '\n'], " ");
        let top = area.y as f32 + (area.height as f32 - metrics.line_height) / 2.0;
        (vec![line], top)
    };

    for (i, line) in lines.iter().enumerate() {
        let y = top + i as f32 * metrics.line_height;
        if y >= area.bottom() as f32 {
            break;
        }

        let width = measure(face, font, line);
        let x = match align {
            TextAlign::Left => area.x as f32,
            TextAlign::Center => area.x as f32 + (area.width as f32 - width) / 2.0,
            TextAlign::Right => area.right() as f32 - width,
        };
        draw_line(scratch, font, face, line, x, y + metrics.ascent);
    }
}

fn draw_line(scratch: &mut Scratch<'_>, font: &Font, face: &dyn Typeface, line: &str, x: f32, baseline: f32) {
    let size = font.size() as f32;
    let color = font.color.to_rgba8();
    let mut pen_x = x;

    for c in line.chars() {
        let glyph = face.glyph(c, size);
        let glyph_x = (pen_x.round() as i32).saturating_add(glyph.offset_x);
        let glyph_y = (baseline.round() as i32)
            .saturating_sub(glyph.offset_y)
            .saturating_sub(glyph.height as i32);
        let strikes = if font.bold { 2 } else { 1 };

        for gy in 0..glyph.height as i32 {
            let py = glyph_y.saturating_add(gy);
            let shear = if font.italic {
                ((baseline - py as f32) * ITALIC_SHEAR).round() as i32
            } else {
                0
            };

            for gx in 0..glyph.width as i32 {
                let coverage = glyph.bitmap[(gy as u32 * glyph.width + gx as u32) as usize];
                if coverage == 0 {
                    continue;
                }
                let alpha = blend::mul_div255(u16::from(coverage), u16::from(color[3]));
                let rgba = [color[0], color[1], color[2], alpha];
                for strike in 0..strikes {
                    let px = glyph_x.saturating_add(gx).saturating_add(shear).saturating_add(strike);
                    scratch.blend(px, py, rgba);
                }
            }
        }

        pen_x += glyph.advance_width + bold_extra(font, c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;
    use crate::font::testing::BoxFace;
    use rgss_types::Color;

    fn box_bitmap(width: i32, height: i32, size: i32) -> Bitmap {
        let mut bmp = Bitmap::new(width, height).unwrap();
        bmp.set_font(Font::with_face(BoxFace::new("Box"), size));
        bmp
    }

    #[test]
    fn test_measure() {
        let bmp = box_bitmap(1, 1, 10);
        assert_eq!(bmp.measure_text("Hi").unwrap(), 10);
        assert_eq!(bmp.measure_text("").unwrap(), 0);

        let mut bold = bmp.font().clone();
        bold.bold = true;
        assert_eq!(measure(&*BoxFace::new("Box"), &bold, "ab"), 12.0);
    }

    #[test]
    fn test_text_size() {
        let bmp = box_bitmap(1, 1, 10);
        assert_eq!(bmp.text_size("abc").unwrap(), Rect::new(0, 0, 15, 10));
    }

    #[test]
    fn test_draw_left_centered_vertically() {
        let mut bmp = box_bitmap(40, 20, 10);
        bmp.draw_text(bmp.rect(), "Hi", TextAlign::Left, false).unwrap();

        assert_eq!(bmp.get_pixel(0, 5).unwrap(), Color::WHITE);
        assert_eq!(bmp.get_pixel(9, 14).unwrap(), Color::WHITE);
        assert_eq!(bmp.get_pixel(0, 4).unwrap(), Color::CLEAR);
        assert_eq!(bmp.get_pixel(10, 5).unwrap(), Color::CLEAR);
        assert_eq!(bmp.get_pixel(0, 15).unwrap(), Color::CLEAR);
    }

    #[test]
    fn test_draw_alignment() {
        let mut center = box_bitmap(40, 10, 10);
        center.draw_text(center.rect(), "Hi", TextAlign::Center, false).unwrap();
        assert_eq!(center.get_pixel(14, 0).unwrap(), Color::CLEAR);
        assert_eq!(center.get_pixel(15, 0).unwrap(), Color::WHITE);
        assert_eq!(center.get_pixel(24, 0).unwrap(), Color::WHITE);
        assert_eq!(center.get_pixel(25, 0).unwrap(), Color::CLEAR);

        let mut right = box_bitmap(40, 10, 10);
        right.draw_text(right.rect(), "Hi", TextAlign::Right, false).unwrap();
        assert_eq!(right.get_pixel(29, 0).unwrap(), Color::CLEAR);
        assert_eq!(right.get_pixel(39, 0).unwrap(), Color::WHITE);
    }

    #[test]
    fn test_draw_uses_font_color() {
        let mut bmp = box_bitmap(10, 10, 10);
        bmp.font_mut().color = Color::rgb(255.0, 0.0, 0.0);
        bmp.draw_text(bmp.rect(), "x", TextAlign::Left, false).unwrap();
        assert_eq!(bmp.get_pixel(0, 0).unwrap().to_rgba8(), [255, 0, 0, 255]);
    }

    #[test]
    fn test_draw_is_clipped_to_rect() {
        let mut bmp = box_bitmap(40, 10, 10);
        bmp.draw_text(Rect::new(30, 0, 40, 10), "Hello", TextAlign::Left, false)
            .unwrap();
        assert_eq!(bmp.get_pixel(39, 0).unwrap(), Color::WHITE);
        assert_eq!(bmp.get_pixel(29, 0).unwrap(), Color::CLEAR);
    }

    #[test]
    fn test_draw_far_off_rect() {
        let mut bmp = box_bitmap(40, 20, 10);
        bmp.draw_text(Rect::new(i32::MIN, i32::MIN, 100, 100), "Hi", TextAlign::Left, false)
            .unwrap();
        assert!(bmp.pixels().unwrap().iter().all(|&b| b == 0));

        // A rect reaching in from far left still right-aligns to its right edge
        bmp.draw_text(Rect::new(-2_000_000_000, 0, i32::MAX, 20), "Hi", TextAlign::Right, false)
            .unwrap();
        assert_eq!(bmp.get_pixel(30, 5).unwrap(), Color::WHITE);
        assert_eq!(bmp.get_pixel(39, 14).unwrap(), Color::WHITE);
        assert_eq!(bmp.get_pixel(29, 5).unwrap(), Color::CLEAR);
    }

    #[test]
    fn test_draw_preserves_background() {
        let mut bmp = box_bitmap(20, 10, 10);
        bmp.fill_rect(bmp.rect(), Color::rgb(32.0, 32.0, 64.0)).unwrap();
        bmp.draw_text(bmp.rect(), "a", TextAlign::Left, false).unwrap();
        assert_eq!(bmp.get_pixel(0, 0).unwrap(), Color::WHITE);
        assert_eq!(bmp.get_pixel(10, 0).unwrap().to_rgba8(), [32, 32, 64, 255]);
    }

    #[test]
    fn test_layout_wraps_words() {
        let face = BoxFace::new("Box");
        let font = Font::with_face(face.clone(), 10);
        let lines = layout_lines(&*face, &font, "aa bb cc", 25.0);
        assert_eq!(lines, vec!["aa bb", "cc"]);
    }

    #[test]
    fn test_layout_honours_newlines_and_long_words() {
        let face = BoxFace::new("Box");
        let font = Font::with_face(face.clone(), 10);
        assert_eq!(layout_lines(&*face, &font, "a\nb", 100.0), vec!["a", "b"]);
        assert_eq!(layout_lines(&*face, &font, "abcdefg", 15.0), vec!["abc", "def", "g"]);
    }

    #[test]
    fn test_wrapped_draw_is_top_aligned() {
        let mut bmp = box_bitmap(25, 40, 10);
        bmp.draw_text(bmp.rect(), "aa bb cc", TextAlign::Left, true).unwrap();
        assert_eq!(bmp.get_pixel(0, 0).unwrap(), Color::WHITE);
        assert_eq!(bmp.get_pixel(0, 10).unwrap(), Color::WHITE);
        assert_eq!(bmp.get_pixel(12, 10).unwrap(), Color::CLEAR);
        assert_eq!(bmp.get_pixel(0, 20).unwrap(), Color::CLEAR);
    }

    #[test]
    fn test_align_from_index() {
        assert_eq!(TextAlign::from_index(0), TextAlign::Left);
        assert_eq!(TextAlign::from_index(1), TextAlign::Center);
        assert_eq!(TextAlign::from_index(2), TextAlign::Right);
        assert_eq!(TextAlign::from_index(7), TextAlign::Left);
    }
}
