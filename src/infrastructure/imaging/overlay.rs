//! フレームへの検出結果の描画

use crate::domain::qr::{BoundingQuad, PixelPoint};
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};

pub const OVERLAY_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
pub const OUTLINE_THICKNESS: u32 = 3;
pub const TEXT_SCALE: u32 = 2;
/// テキストの下端と四角形の頂点との間隔
pub const TEXT_OFFSET: i32 = 15;

const GLYPH_SIZE: i32 = 8;

/// 検出された四角形の輪郭と文字列を描画
pub fn annotate(frame: &mut RgbImage, quad: &BoundingQuad, text: &str) {
    draw_quad(frame, quad, OVERLAY_COLOR, OUTLINE_THICKNESS);

    let anchor = quad.anchor();
    let top = anchor.y - TEXT_OFFSET - GLYPH_SIZE * TEXT_SCALE as i32;
    draw_text(
        frame,
        PixelPoint::new(anchor.x, top),
        text,
        OVERLAY_COLOR,
        TEXT_SCALE,
    );
}

pub fn draw_quad(frame: &mut RgbImage, quad: &BoundingQuad, color: Rgb<u8>, thickness: u32) {
    for (from, to) in quad.edges() {
        draw_line(frame, from, to, color, thickness);
    }
}

/// ブレゼンハムのアルゴリズムで太さ付きの線を描画
///
/// 線分は先にフレーム（線の太さ分を含む）へクリップするため、
/// 画面外の頂点があっても走査はフレーム内の範囲に限られる。
pub fn draw_line(
    frame: &mut RgbImage,
    from: PixelPoint,
    to: PixelPoint,
    color: Rgb<u8>,
    thickness: u32,
) {
    let half = thickness.max(1) as i64 / 2;
    let span = thickness.max(1) as i64;

    let Some(((mut x, mut y), (x1, y1))) = clip_segment(frame, from, to, half) else {
        return;
    };
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        for oy in 0..span {
            for ox in 0..span {
                put_pixel(frame, x + ox - half, y + oy - half, color);
            }
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

type Segment = ((i64, i64), (i64, i64));

/// Liang-Barsky 法で線分を `[-margin, size - 1 + margin]` の矩形に切り詰める
///
/// 両端が矩形内にある場合は元の座標をそのまま返す。矩形と交わらなければ `None`。
fn clip_segment(frame: &RgbImage, from: PixelPoint, to: PixelPoint, margin: i64) -> Option<Segment> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let min = -margin as f64;
    let max_x = (width as i64 - 1 + margin) as f64;
    let max_y = (height as i64 - 1 + margin) as f64;

    let (x0, y0) = (f64::from(from.x), f64::from(from.y));
    let (x1, y1) = (f64::from(to.x), f64::from(to.y));
    let inside = |x: f64, y: f64| (min..=max_x).contains(&x) && (min..=max_y).contains(&y);
    if inside(x0, y0) && inside(x1, y1) {
        return Some(((from.x as i64, from.y as i64), (to.x as i64, to.y as i64)));
    }

    let (dx, dy) = (x1 - x0, y1 - y0);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [(-dx, x0 - min), (dx, max_x - x0), (-dy, y0 - min), (dy, max_y - y0)] {
        if p == 0.0 {
            // 境界と平行で外側にある
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let point = |t: f64| ((x0 + t * dx).round() as i64, (y0 + t * dy).round() as i64);
    Some((point(t0), point(t1)))
}

/// 8x8ビットマップフォントで文字列を描画（`origin` は左上）
pub fn draw_text(frame: &mut RgbImage, origin: PixelPoint, text: &str, color: Rgb<u8>, scale: u32) {
    let scale = scale.max(1) as i64;
    let advance = GLYPH_SIZE as i64 * scale;

    for (index, ch) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(ch)
            .or_else(|| LATIN_FONTS.get(ch))
            .or_else(|| BASIC_FONTS.get('?'));
        let Some(glyph) = glyph else {
            continue;
        };

        let left = origin.x as i64 + index as i64 * advance;
        if left >= frame.width() as i64 {
            break;
        }

        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE as i64 {
                // ビット0が左端
                if bits & (1 << col) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        put_pixel(
                            frame,
                            left + col * scale + sx,
                            origin.y as i64 + row as i64 * scale + sy,
                            color,
                        );
                    }
                }
            }
        }
    }
}

fn put_pixel(frame: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < frame.width() as i64 && y < frame.height() as i64 {
        frame.put_pixel(x as u32, y as u32, color);
    }
}
