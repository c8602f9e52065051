//! QRコード関連の値オブジェクト
//!
//! エンコードパラメータ、検出結果、境界四角形を定義

use super::errors::QrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// モジュール1個あたりのピクセル数の許容範囲
pub const BOX_SIZE_RANGE: RangeInclusive<u32> = 1..=50;

/// クワイエットゾーン（モジュール数）の許容範囲
pub const BORDER_SIZE_RANGE: RangeInclusive<u32> = 1..=10;

/// QRコード生成のパラメータ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeParameters {
    pub box_size: u32,
    pub border: u32,
}

impl EncodeParameters {
    /// 範囲を検証してパラメータを作成
    pub fn new(box_size: u32, border: u32) -> Result<Self, QrError> {
        if !BOX_SIZE_RANGE.contains(&box_size) {
            return Err(QrError::InvalidBoxSize(box_size));
        }
        if !BORDER_SIZE_RANGE.contains(&border) {
            return Err(QrError::InvalidBorderSize(border));
        }
        Ok(Self { box_size, border })
    }

    /// フォーム入力の文字列から作成
    pub fn parse(box_size: &str, border: &str) -> Result<Self, QrError> {
        let parse_number = |value: &str| {
            value
                .trim()
                .parse::<u32>()
                .map_err(|_| QrError::InvalidNumber(value.to_string()))
        };
        Self::new(parse_number(box_size)?, parse_number(border)?)
    }

    /// 出力画像の一辺のピクセル数
    pub fn image_side(&self, modules: u32) -> u32 {
        (modules + 2 * self.border) * self.box_size
    }
}

impl Default for EncodeParameters {
    fn default() -> Self {
        Self {
            box_size: 10,
            border: 4,
        }
    }
}

/// ピクセル座標上の点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for PixelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 検出されたシンボルを囲む四角形
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingQuad {
    pub corners: [PixelPoint; 4],
}

impl BoundingQuad {
    pub fn new(corners: [PixelPoint; 4]) -> Self {
        Self { corners }
    }

    /// 靴ひも公式による面積（ピクセル²）
    ///
    /// 極端な座標でもオーバーフローしないよう浮動小数点で計算する。
    pub fn area(&self) -> f64 {
        let twice: f64 = (0..4)
            .map(|i| {
                let a = self.corners[i];
                let b = self.corners[(i + 1) % 4];
                f64::from(a.x) * f64::from(b.y) - f64::from(b.x) * f64::from(a.y)
            })
            .sum();
        twice.abs() / 2.0
    }

    /// 最初の頂点（テキスト描画の基準点）
    pub fn anchor(&self) -> PixelPoint {
        self.corners[0]
    }

    /// 頂点を順番に結ぶ辺
    pub fn edges(&self) -> impl Iterator<Item = (PixelPoint, PixelPoint)> + '_ {
        (0..4).map(move |i| (self.corners[i], self.corners[(i + 1) % 4]))
    }
}

/// 画像内で見つかったQRシンボル
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrDetection {
    /// デコード結果。シンボルは見つかったがデコードできなかった場合は空文字列
    pub text: String,
    pub bounds: BoundingQuad,
}

/// デコード処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Detected(QrDetection),
    NotFound,
    /// デコーダー内部の障害。呼び出し側は次のフレームへ進む
    Fault(String),
}

impl DecodeOutcome {
    /// デコードされた文字列。見つからない場合は空文字列
    pub fn text(&self) -> &str {
        match self {
            Self::Detected(detection) => &detection.text,
            Self::NotFound | Self::Fault(_) => "",
        }
    }

    pub fn bounds(&self) -> Option<BoundingQuad> {
        match self {
            Self::Detected(detection) => Some(detection.bounds),
            Self::NotFound | Self::Fault(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: i32) -> BoundingQuad {
        BoundingQuad::new([
            PixelPoint::new(0, 0),
            PixelPoint::new(side, 0),
            PixelPoint::new(side, side),
            PixelPoint::new(0, side),
        ])
    }

    #[test]
    fn test_encode_parameters_ranges() {
        assert!(EncodeParameters::new(1, 1).is_ok());
        assert!(EncodeParameters::new(50, 10).is_ok());
        assert!(matches!(
            EncodeParameters::new(0, 4),
            Err(QrError::InvalidBoxSize(0))
        ));
        assert!(matches!(
            EncodeParameters::new(51, 4),
            Err(QrError::InvalidBoxSize(51))
        ));
        assert!(matches!(
            EncodeParameters::new(10, 0),
            Err(QrError::InvalidBorderSize(0))
        ));
        assert!(matches!(
            EncodeParameters::new(10, 11),
            Err(QrError::InvalidBorderSize(11))
        ));
    }

    #[test]
    fn test_parse_form_values() {
        let params = EncodeParameters::parse(" 12 ", "3").unwrap();
        assert_eq!(params, EncodeParameters { box_size: 12, border: 3 });

        assert!(matches!(
            EncodeParameters::parse("ten", "3"),
            Err(QrError::InvalidNumber(value)) if value == "ten"
        ));
        assert!(matches!(
            EncodeParameters::parse("-1", "3"),
            Err(QrError::InvalidNumber(_))
        ));
        assert!(matches!(
            EncodeParameters::parse("10", "20"),
            Err(QrError::InvalidBorderSize(20))
        ));
    }

    #[test]
    fn test_image_side() {
        let params = EncodeParameters::new(10, 4).unwrap();
        // バージョン1は21モジュール
        assert_eq!(params.image_side(21), 290);
    }

    #[test]
    fn test_quad_area() {
        assert_eq!(square(100).area(), 10_000.0);

        // 頂点の向きに依存しない
        let mut reversed = square(100);
        reversed.corners.reverse();
        assert_eq!(reversed.area(), 10_000.0);

        let tilted = BoundingQuad::new([
            PixelPoint::new(50, 0),
            PixelPoint::new(100, 50),
            PixelPoint::new(50, 100),
            PixelPoint::new(0, 50),
        ]);
        assert_eq!(tilted.area(), 5_000.0);
    }

    #[test]
    fn test_quad_area_with_extreme_coordinates() {
        let degenerate = BoundingQuad::new([
            PixelPoint::new(i32::MAX, i32::MAX),
            PixelPoint::new(i32::MIN, i32::MAX),
            PixelPoint::new(i32::MIN, i32::MIN),
            PixelPoint::new(i32::MAX, i32::MIN),
        ]);
        let area = degenerate.area();
        assert!(area.is_finite());
        assert!(area > 1.8e19);

        let sliver = BoundingQuad::new([
            PixelPoint::new(i32::MIN, 0),
            PixelPoint::new(i32::MAX, 0),
            PixelPoint::new(i32::MAX, 0),
            PixelPoint::new(i32::MIN, 0),
        ]);
        assert_eq!(sliver.area(), 0.0);
    }

    #[test]
    fn test_decode_outcome_accessors() {
        let detected = DecodeOutcome::Detected(QrDetection {
            text: "hello".to_string(),
            bounds: square(10),
        });
        assert_eq!(detected.text(), "hello");
        assert_eq!(detected.bounds(), Some(square(10)));

        assert_eq!(DecodeOutcome::NotFound.text(), "");
        assert!(DecodeOutcome::NotFound.bounds().is_none());

        let fault = DecodeOutcome::Fault("boom".to_string());
        assert!(fault.bounds().is_none());
        assert_eq!(fault.text(), "");
    }
}
