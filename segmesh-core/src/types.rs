//! Mask records, prompts and colours exchanged between pipeline stages

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Row-major grid of mask values in `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskGrid {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl MaskGrid {
    /// Build a grid from row-major values. Returns `None` when the value count
    /// does not match `width * height`. Values are clamped into `[0, 1]` and
    /// non-finite values become `0`.
    pub fn new(width: usize, height: usize, values: Vec<f32>) -> Option<Self> {
        if width.checked_mul(height)? != values.len() {
            return None;
        }
        let values = values
            .into_iter()
            .map(|v| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 })
            .collect();
        Some(Self {
            width,
            height,
            values,
        })
    }

    /// Build a grid from rows; `None` if the rows are ragged.
    pub fn from_rows(rows: &[Vec<f32>]) -> Option<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }
        Self::new(width, rows.len(), rows.iter().flatten().copied().collect())
    }

    /// 8-bit luma samples, `255` maps to `1.0`
    pub fn from_luma(width: usize, height: usize, luma: &[u8]) -> Option<Self> {
        Self::new(
            width,
            height,
            luma.iter().map(|&v| f32::from(v) / 255.0).collect(),
        )
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            values: vec![value.clamp(0.0, 1.0); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Value at `(row, col)`, `None` outside the grid
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.values.get(row * self.width + col).copied()
    }

    /// Value at the cell nearest to `(row, col)`, clamping both indices into
    /// the grid. Returns `0` for an empty grid.
    pub fn sample_clamped(&self, row: i64, col: i64) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let row = row.clamp(0, self.height as i64 - 1) as usize;
        let col = col.clamp(0, self.width as i64 - 1) as usize;
        self.values[row * self.width + col]
    }

    pub fn max(&self) -> f32 {
        self.values.iter().copied().fold(0.0, f32::max)
    }

    pub fn mean(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f32>() / self.values.len() as f32
    }

    /// Quantize to 8-bit luma, the inverse of [`MaskGrid::from_luma`]
    pub fn to_luma(&self) -> Vec<u8> {
        self.values
            .iter()
            .map(|v| (v * 255.0).round() as u8)
            .collect()
    }
}

/// Axis-aligned box in image pixel space, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// One detected object: its mask cropped to `bbox`, a label and a score
#[derive(Debug, Clone)]
pub struct MaskRecord {
    /// Position at which the provider emitted this record
    pub index: usize,
    pub pixels: Arc<MaskGrid>,
    pub label: String,
    pub score: f32,
    pub bbox: BBox,
}

impl MaskRecord {
    pub fn new(index: usize, pixels: MaskGrid, label: impl Into<String>, score: f32, bbox: BBox) -> Self {
        Self {
            index,
            pixels: Arc::new(pixels),
            label: label.into(),
            score,
            bbox,
        }
    }
}

/// Linear RGBA colour, components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    pub const WHITE: Rgba = Rgba([1.0, 1.0, 1.0, 1.0]);
    pub const BACKGROUND: Rgba = Rgba([0.8, 0.8, 0.8, 1.0]);

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self([r, g, b, 1.0])
    }

    /// Stable colour derived from a label: the first three bytes of its
    /// SHA-256 digest become the RGB channels.
    pub fn from_label(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        Self::rgb(
            f32::from(digest[0]) / 255.0,
            f32::from(digest[1]) / 255.0,
            f32::from(digest[2]) / 255.0,
        )
    }

    /// `rrggbb` with each channel quantized to 8 bits
    pub fn to_hex(&self) -> String {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        hex::encode([byte(self.r()), byte(self.g()), byte(self.b())])
    }

    pub fn r(&self) -> f32 {
        self.0[0]
    }

    pub fn g(&self) -> f32 {
        self.0[1]
    }

    pub fn b(&self) -> f32 {
        self.0[2]
    }

    pub fn a(&self) -> f32 {
        self.0[3]
    }
}

/// A region of interest handed to the segmentation model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prompt {
    Point { x: f32, y: f32 },
    Box { min_x: f32, min_y: f32, max_x: f32, max_y: f32 },
}

impl Prompt {
    /// Box prompt with corners normalized so that `min <= max`
    pub fn boxed(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Prompt::Box {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    pub fn is_finite(&self) -> bool {
        match *self {
            Prompt::Point { x, y } => x.is_finite() && y.is_finite(),
            Prompt::Box {
                min_x,
                min_y,
                max_x,
                max_y,
            } => min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite(),
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prompt::Point { x, y } => write!(f, "{},{}", x, y),
            Prompt::Box {
                min_x,
                min_y,
                max_x,
                max_y,
            } => write!(f, "{},{},{},{}", min_x, min_y, max_x, max_y),
        }
    }
}

impl FromStr for Prompt {
    type Err = String;

    /// `x,y` parses as a point, `x0,y0,x1,y1` as a box
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coords = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f32>()
                    .map_err(|e| format!("invalid coordinate '{}': {}", part.trim(), e))
            })
            .collect::<Result<Vec<f32>, String>>()?;

        let prompt = match coords.as_slice() {
            [x, y] => Prompt::Point { x: *x, y: *y },
            [x0, y0, x1, y1] => Prompt::boxed(*x0, *y0, *x1, *y1),
            _ => {
                return Err(format!(
                    "expected 2 (point) or 4 (box) coordinates, got {}",
                    coords.len()
                ))
            }
        };

        if !prompt.is_finite() {
            return Err(format!("prompt '{}' has non-finite coordinates", s));
        }
        Ok(prompt)
    }
}

/// Ordered prompts from a single user interaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptSet(pub Vec<Prompt>);

impl PromptSet {
    pub fn new(prompts: Vec<Prompt>) -> Self {
        Self(prompts)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prompt> {
        self.0.iter()
    }
}

impl FromIterator<Prompt> for PromptSet {
    fn from_iter<I: IntoIterator<Item = Prompt>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
