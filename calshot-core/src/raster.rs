//! Rasterizer: paints a [`Scene`] into an RGBA buffer and encodes PNG.

use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba as Pixel, RgbaImage};
use tracing::trace;

use crate::color::{Gradient, parse_hex};
use crate::error::{CalShotError, CalShotResult};
use crate::scene::{Corners, Fill, PaintCommand, Rect, Rgba, Scene, TextAlign};

/// Output pixels per scene unit.
pub const PIXEL_RATIO: u32 = 2;

/// An encoded capture.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

/// Paint `scene` at `pixel_ratio` output pixels per unit.
///
/// The buffer starts fully transparent; opaque backgrounds are part of the
/// scene. Text is drawn with an 8x8 bitmap font scaled to the command's size.
pub fn rasterize(scene: &Scene, pixel_ratio: u32) -> CalShotResult<RgbaImage> {
    if pixel_ratio == 0 {
        return Err(CalShotError::Render("pixel ratio must be positive".into()));
    }
    let width = scene.width * pixel_ratio;
    let height = scene.height * pixel_ratio;
    let mut canvas = RgbaImage::new(width, height);
    let ratio = pixel_ratio as f32;

    let mut glyphs = 0usize;
    for command in &scene.commands {
        match command {
            PaintCommand::Rect { rect, fill, corners } => {
                let corners = Corners {
                    radius: corners.radius * ratio,
                    ..*corners
                };
                let painter = FillPainter::new(fill)?;
                fill_rect(&mut canvas, rect.scaled(ratio), corners, &painter);
            }
            PaintCommand::Text {
                x,
                y,
                size,
                text,
                color,
                align,
                max_width,
            } => {
                let line = TextLine {
                    x: *x,
                    y: *y,
                    size: *size,
                    align: *align,
                    max_width: *max_width,
                };
                glyphs += draw_text(&mut canvas, &line, text, *color, ratio);
            }
        }
    }
    trace!(width, height, glyphs, "rasterized scene");

    Ok(canvas)
}

pub fn encode_png(canvas: &RgbaImage) -> CalShotResult<Vec<u8>> {
    let mut png_data = Vec::new();
    PngEncoder::new(&mut png_data)
        .write_image(canvas.as_raw(), canvas.width(), canvas.height(), ExtendedColorType::Rgba8)
        .map_err(|e| CalShotError::Render(format!("PNG encoding failed: {e}")))?;
    Ok(png_data)
}

/// Rasterize and encode in one go.
pub fn snapshot(scene: &Scene, pixel_ratio: u32) -> CalShotResult<Snapshot> {
    let canvas = rasterize(scene, pixel_ratio)?;
    Ok(Snapshot {
        width: canvas.width(),
        height: canvas.height(),
        png_data: encode_png(&canvas)?,
    })
}

enum FillPainter {
    Solid(Rgba),
    Linear {
        /// Unit direction of the gradient line
        dir: (f32, f32),
        stops: Vec<(Rgba, f32)>,
    },
}

impl FillPainter {
    fn new(fill: &Fill) -> CalShotResult<Self> {
        match fill {
            Fill::Solid(color) => Ok(FillPainter::Solid(*color)),
            Fill::Linear(Gradient { angle, stops }) => {
                if stops.is_empty() {
                    return Err(CalShotError::Render("gradient without stops".into()));
                }
                let stops = stops
                    .iter()
                    .map(|(color, pos)| {
                        let [r, g, b] = parse_hex(color)?;
                        Ok((Rgba(r, g, b, 255), *pos as f32))
                    })
                    .collect::<CalShotResult<Vec<_>>>()?;
                // CSS angles: 0deg points up, 90deg points right
                let radians = (*angle as f32).to_radians();
                Ok(FillPainter::Linear {
                    dir: (radians.sin(), -radians.cos()),
                    stops,
                })
            }
        }
    }

    fn color_at(&self, rect: &Rect, x: f32, y: f32) -> Rgba {
        match self {
            FillPainter::Solid(color) => *color,
            FillPainter::Linear { dir, stops } => {
                let half_len = (rect.width * dir.0.abs() + rect.height * dir.1.abs()) / 2.0;
                let cx = rect.x + rect.width / 2.0;
                let cy = rect.y + rect.height / 2.0;
                let along = (x - cx) * dir.0 + (y - cy) * dir.1;
                let t = if half_len > 0.0 { along / (2.0 * half_len) + 0.5 } else { 0.5 };
                gradient_color(stops, t.clamp(0.0, 1.0))
            }
        }
    }
}

fn gradient_color(stops: &[(Rgba, f32)], t: f32) -> Rgba {
    let first = stops[0];
    if t <= first.1 {
        return first.0;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.1 {
            let span = b.1 - a.1;
            let k = if span > 0.0 { (t - a.1) / span } else { 1.0 };
            let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * k).round() as u8;
            return Rgba(mix(a.0.0, b.0.0), mix(a.0.1, b.0.1), mix(a.0.2, b.0.2), mix(a.0.3, b.0.3));
        }
    }
    stops[stops.len() - 1].0
}

fn fill_rect(canvas: &mut RgbaImage, rect: Rect, corners: Corners, painter: &FillPainter) {
    let x0 = rect.x.max(0.0).floor() as u32;
    let y0 = rect.y.max(0.0).floor() as u32;
    let x1 = ((rect.x + rect.width).ceil().max(0.0) as u32).min(canvas.width());
    let y1 = ((rect.y + rect.height).ceil().max(0.0) as u32).min(canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            // Sample at the pixel center
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
            if px < rect.x || py < rect.y || px > rect.x + rect.width || py > rect.y + rect.height {
                continue;
            }
            if !inside_corners(&rect, &corners, px, py) {
                continue;
            }
            let src = painter.color_at(&rect, px, py);
            blend(canvas.get_pixel_mut(x, y), src);
        }
    }
}

struct TextLine {
    x: f32,
    y: f32,
    size: f32,
    align: TextAlign,
    max_width: Option<f32>,
}

/// Paint `text` one glyph cell (`size` units square) per character.
/// Returns the number of glyphs drawn.
fn draw_text(canvas: &mut RgbaImage, line: &TextLine, text: &str, color: Rgba, ratio: f32) -> usize {
    let glyphs: Vec<[u8; 8]> = text.chars().map(glyph).collect();
    let advance = line.size;
    let left = match line.align {
        TextAlign::Left => line.x,
        TextAlign::Center => line.x - glyphs.len() as f32 * advance / 2.0,
    };
    let limit = line.max_width.unwrap_or(f32::INFINITY);
    let dot = line.size / 8.0 * ratio;
    let painter = FillPainter::Solid(color);

    let mut drawn = 0;
    for (i, rows) in glyphs.iter().enumerate() {
        let offset = i as f32 * advance;
        if offset + advance > limit {
            break;
        }
        let gx = (left + offset) * ratio;
        let gy = line.y * ratio;
        for (row, bits) in rows.iter().enumerate() {
            for column in 0..8 {
                // Bit 0 is the leftmost pixel
                if bits & (1 << column) == 0 {
                    continue;
                }
                let dot_rect = Rect::new(gx + column as f32 * dot, gy + row as f32 * dot, dot, dot);
                fill_rect(canvas, dot_rect, Corners::none(), &painter);
            }
        }
        drawn += 1;
    }
    drawn
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn inside_corners(rect: &Rect, corners: &Corners, px: f32, py: f32) -> bool {
    let r = corners.radius.min(rect.width / 2.0).min(rect.height / 2.0);
    if r <= 0.0 {
        return true;
    }
    let cx = if corners.left && px < rect.x + r {
        rect.x + r
    } else if corners.right && px > rect.x + rect.width - r {
        rect.x + rect.width - r
    } else {
        return true;
    };
    let cy = if py < rect.y + r {
        rect.y + r
    } else if py > rect.y + rect.height - r {
        rect.y + rect.height - r
    } else {
        return true;
    };
    let (dx, dy) = (px - cx, py - cy);
    dx * dx + dy * dy <= r * r
}

/// Source-over compositing with straight alpha.
fn blend(dst: &mut Pixel<u8>, src: Rgba) {
    let sa = src.3 as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| {
        ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a).round().clamp(0.0, 255.0) as u8
    };
    *dst = Pixel([
        channel(src.0, dst.0[0]),
        channel(src.1, dst.0[1]),
        channel(src.2, dst.0[2]),
        (out_a * 255.0).round() as u8,
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::GridGeometry;
    use crate::scene::SceneMetrics;

    fn scene(commands: Vec<PaintCommand>, transparent: bool) -> Scene {
        Scene {
            width: 20,
            height: 10,
            transparent,
            metrics: SceneMetrics {
                card: Rect::new(0.0, 0.0, 20.0, 10.0),
                grid: GridGeometry {
                    origin_x: 0.0,
                    origin_y: 0.0,
                    cell_width: 1.0,
                    cell_height: 1.0,
                    weeks: 5,
                },
            },
            commands,
        }
    }

    fn solid(rect: Rect, color: Rgba, corners: Corners) -> PaintCommand {
        PaintCommand::Rect {
            rect,
            fill: Fill::Solid(color),
            corners,
        }
    }

    #[test]
    fn test_output_is_scaled_by_pixel_ratio() {
        let canvas = rasterize(&scene(vec![], true), PIXEL_RATIO).unwrap();
        assert_eq!(canvas.dimensions(), (40, 20));
        assert!(canvas.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_solid_rect_fills_its_area() {
        let red = Rgba(255, 0, 0, 255);
        let canvas = rasterize(&scene(vec![solid(Rect::new(0.0, 0.0, 10.0, 10.0), red, Corners::none())], false), 1).unwrap();
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(9, 9).0, [255, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(10, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_rounded_corners_leave_corner_pixels_empty() {
        let blue = Rgba(0, 0, 255, 255);
        let rounded = Corners { left: true, right: false, radius: 4.0 };
        let canvas = rasterize(&scene(vec![solid(Rect::new(0.0, 0.0, 10.0, 10.0), blue, rounded)], false), 1).unwrap();
        assert_eq!(canvas.get_pixel(0, 0).0[3], 0);
        assert_eq!(canvas.get_pixel(9, 0).0[3], 255);
        assert_eq!(canvas.get_pixel(5, 5).0[3], 255);
    }

    #[test]
    fn test_translucent_over_opaque_blends() {
        let commands = vec![
            solid(Rect::new(0.0, 0.0, 10.0, 10.0), Rgba(255, 255, 255, 255), Corners::none()),
            solid(Rect::new(0.0, 0.0, 10.0, 10.0), Rgba(0, 0, 0, 128), Corners::none()),
        ];
        let canvas = rasterize(&scene(commands, false), 1).unwrap();
        let px = canvas.get_pixel(2, 2).0;
        assert_eq!(px[3], 255);
        assert!((126..=128).contains(&px[0]));
    }

    #[test]
    fn test_horizontal_gradient_runs_left_to_right() {
        let gradient = Gradient {
            angle: 90.0,
            stops: vec![("#000000".into(), 0.0), ("#ffffff".into(), 1.0)],
        };
        let commands = vec![PaintCommand::Rect {
            rect: Rect::new(0.0, 0.0, 20.0, 10.0),
            fill: Fill::Linear(gradient),
            corners: Corners::none(),
        }];
        let canvas = rasterize(&scene(commands, false), 1).unwrap();
        assert!(canvas.get_pixel(0, 5).0[0] < 20);
        assert!(canvas.get_pixel(19, 5).0[0] > 235);
    }

    #[test]
    fn test_bad_gradient_stop_is_an_error() {
        let gradient = Gradient {
            angle: 0.0,
            stops: vec![("nope".into(), 0.0)],
        };
        let commands = vec![PaintCommand::Rect {
            rect: Rect::new(0.0, 0.0, 20.0, 10.0),
            fill: Fill::Linear(gradient),
            corners: Corners::none(),
        }];
        assert!(rasterize(&scene(commands, false), 1).is_err());
    }

    fn text(text: &str, align: TextAlign, max_width: Option<f32>) -> PaintCommand {
        PaintCommand::Text {
            x: 10.0,
            y: 1.0,
            size: 8.0,
            text: text.into(),
            color: Rgba(0, 0, 0, 255),
            align,
            max_width,
        }
    }

    fn painted_columns(canvas: &RgbaImage) -> Vec<u32> {
        (0..canvas.width())
            .filter(|&x| (0..canvas.height()).any(|y| canvas.get_pixel(x, y).0[3] > 0))
            .collect()
    }

    #[test]
    fn test_text_paints_glyph_pixels() {
        let canvas = rasterize(&scene(vec![text("H", TextAlign::Left, None)], true), 1).unwrap();
        let columns = painted_columns(&canvas);
        assert!(!columns.is_empty());
        assert!(columns.iter().all(|&x| (10..18).contains(&x)));
        // Rows 1..9 hold the glyph, row 0 stays empty
        assert!((0..20).all(|x| canvas.get_pixel(x, 0).0[3] == 0));
    }

    #[test]
    fn test_centered_text_straddles_anchor() {
        let canvas = rasterize(&scene(vec![text("HH", TextAlign::Center, None)], true), 1).unwrap();
        let columns = painted_columns(&canvas);
        assert!(columns.iter().any(|&x| x < 10));
        assert!(columns.iter().any(|&x| x >= 10));
        assert!(columns.iter().all(|&x| (2..18).contains(&x)));
    }

    #[test]
    fn test_text_clipped_to_max_width() {
        let canvas = rasterize(&scene(vec![text("HHHH", TextAlign::Left, Some(8.0))], true), 1).unwrap();
        assert!(painted_columns(&canvas).iter().all(|&x| x < 18));

        let canvas = rasterize(&scene(vec![text("HHHH", TextAlign::Left, Some(4.0))], true), 1).unwrap();
        assert!(painted_columns(&canvas).is_empty());
    }

    #[test]
    fn test_calendar_title_is_painted() {
        use crate::event::Event;
        use crate::layout::{RowMemo, layout_month};
        use crate::month::{Month, MonthGrid};
        use crate::settings::CalendarSettings;

        let grid = MonthGrid::new(Month::new(2024, 6).unwrap());
        let events: [Event; 0] = [];
        let layout = layout_month(&grid, &events, &RowMemo::new(), None);
        let scene = Scene::build(&layout, &events, &CalendarSettings::default(), None).unwrap();
        let canvas = rasterize(&scene, 1).unwrap();

        let card = scene.metrics.card;
        let center = (card.x + card.width / 2.0) as u32;
        let top = card.y as u32;
        let dark = (center - 120..center + 120)
            .flat_map(|x| (top + 20..top + 60).map(move |y| (x, y)))
            .filter(|&(x, y)| {
                let [r, _, _, a] = canvas.get_pixel(x, y).0;
                a == 255 && r < 100
            })
            .count();
        assert!(dark > 50, "title region has {dark} text pixels");

        // June 1st sits in the last column of the first week
        let cell_x = (scene.metrics.grid.origin_x + scene.metrics.grid.cell_width * 6.0) as u32;
        let cell_y = scene.metrics.grid.origin_y as u32;
        let number = (cell_x..cell_x + 40)
            .flat_map(|x| (cell_y..cell_y + 30).map(move |y| (x, y)))
            .filter(|&(x, y)| canvas.get_pixel(x, y).0[0] < 150)
            .count();
        assert!(number > 0);
    }

    #[test]
    fn test_png_signature() {
        let snap = snapshot(&scene(vec![], true), PIXEL_RATIO).unwrap();
        assert_eq!((snap.width, snap.height), (40, 20));
        assert_eq!(&snap.png_data[..8], b"\x89PNG\r\n\x1a\n");
    }
}
