use clap::builder::styling::RgbColor;

use crate::game::{
    math::{
        Rect2F,
        Vector2F
    },
    snapshot::Transform
};

use super::{
    projection::Projector,
    LABEL_COLOR,
    START_SPOT_COLOR
};

/// Start spot marker extent in native image pixels.
pub const START_SPOT_SIZE: Vector2F = Vector2F { x: 10.0, y: 10.0 };
/// Side of one glyph cell in window pixels.
pub const LABEL_CELL: f32 = 2.0;
const GLYPH_WIDTH: usize = 3;
const GLYPH_HEIGHT: usize = 5;

/// 3x5 digit bitmaps, one row per entry, most significant bit on the left.
const DIGIT_GLYPHS: [[u8; GLYPH_HEIGHT]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PositionFilter {
    #[default]
    All,
    Indices(Vec<usize>),
}

impl std::str::FromStr for PositionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        let indices = s.split(',')
            .map(|part| part.trim().parse::<usize>()
                .map_err(|e| format!("invalid start position '{}': {e}", part.trim())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::Indices(indices))
    }
}

impl PositionFilter {
    pub fn accepts(&self, index: usize) -> bool {
        match self {
            PositionFilter::All => true,
            PositionFilter::Indices(indices) => indices.contains(&index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayBox {
    pub rect: Rect2F,
    pub color: RgbColor,
}

/// Filled cells of `index` rendered as decimal digits, top-left corner at `origin`.
pub fn label_boxes(index: usize, origin: Vector2F) -> Vec<OverlayBox> {
    let digits = index.to_string();
    let advance = (GLYPH_WIDTH + 1) as f32 * LABEL_CELL;

    digits.bytes()
        .map(|digit| (digit - b'0') as usize)
        .enumerate()
        .flat_map(|(position, digit)| {
            let glyph_origin = origin + Vector2F::new(position as f32 * advance, 0.0);
            glyph_cells(digit).map(move |(col, row)| OverlayBox {
                rect: Rect2F::new(
                    glyph_origin.x + col as f32 * LABEL_CELL,
                    glyph_origin.y + row as f32 * LABEL_CELL,
                    LABEL_CELL,
                    LABEL_CELL
                ),
                color: LABEL_COLOR,
            })
        })
        .collect()
}

fn glyph_cells(digit: usize) -> impl Iterator<Item = (usize, usize)> {
    let glyph = DIGIT_GLYPHS[digit];
    (0..GLYPH_HEIGHT).flat_map(move |row| {
        (0..GLYPH_WIDTH)
            .filter(move |col| glyph[row] & (1 << (GLYPH_WIDTH - 1 - col)) != 0)
            .map(move |col| (col, row))
    })
}

/// Boxes for the selected player start spots, optionally labelled with their index.
/// Computed once per session, the spots never move.
pub fn build_start_spot_overlay(
    spots: &[Transform],
    filter: &PositionFilter,
    projector: &Projector,
    show_labels: bool,
) -> Vec<OverlayBox> {
    if let PositionFilter::Indices(indices) = filter {
        for index in indices.iter().filter(|&&i| i >= spots.len()) {
            log::warn!("Start position {index} out of range, map has {} spots", spots.len());
        }
    }

    let size = projector.scale().to_window(START_SPOT_SIZE);
    spots.iter()
        .enumerate()
        .filter(|(index, _)| filter.accepts(*index))
        .flat_map(|(index, spot)| {
            let center = projector.project(spot.location);
            let marker = OverlayBox {
                rect: Rect2F::centered_at(center, size),
                color: START_SPOT_COLOR,
            };
            let mut boxes = vec![marker];
            if show_labels {
                let origin = marker.rect.pos + Vector2F::new(size.x + LABEL_CELL, 0.0);
                boxes.extend(label_boxes(index, origin));
            }
            boxes
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        game::math::Vector3F,
        view::{
            map::MapTransform,
            scale::ImageScale
        }
    };

    fn spots() -> Vec<Transform> {
        (0..4)
            .map(|i| Transform::at(Vector3F::new(20.0 * i as f32, 10.0, 0.0), 0.0))
            .collect()
    }

    fn projector() -> Projector {
        Projector::new(MapTransform::new(1.0), ImageScale { scale_x: 2.0, scale_y: 2.0 })
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("all".parse::<PositionFilter>(), Ok(PositionFilter::All));
        assert_eq!(" ALL ".parse::<PositionFilter>(), Ok(PositionFilter::All));
        assert_eq!("3".parse::<PositionFilter>(), Ok(PositionFilter::Indices(vec![3])));
        assert_eq!("1, 7,12".parse::<PositionFilter>(), Ok(PositionFilter::Indices(vec![1, 7, 12])));
        assert!("1,x".parse::<PositionFilter>().is_err());
        assert!("".parse::<PositionFilter>().is_err());
    }

    #[test]
    fn test_digit_glyph_cell_counts() {
        let expected = [12, 8, 11, 11, 9, 11, 12, 7, 13, 12];
        for (digit, count) in expected.iter().enumerate() {
            assert_eq!(glyph_cells(digit).count(), *count, "digit {digit}");
        }
    }

    #[test]
    fn test_multi_digit_label_advances() {
        let boxes = label_boxes(10, Vector2F::default());
        assert_eq!(boxes.len(), 8 + 12);
        let max_x = boxes.iter().map(|b| b.rect.pos.x).fold(f32::MIN, f32::max);
        assert_eq!(max_x, 4.0 * LABEL_CELL + 2.0 * LABEL_CELL);
        assert!(boxes.iter().all(|b| b.color == LABEL_COLOR));
    }

    #[test]
    fn test_overlay_without_labels() {
        let overlay = build_start_spot_overlay(&spots(), &PositionFilter::All, &projector(), false);
        assert_eq!(overlay.len(), 4);
        assert_eq!(overlay[1].rect.center(), Vector2F::new(10.0, 5.0));
        assert_eq!(overlay[1].rect.size, Vector2F::new(5.0, 5.0));
        assert!(overlay.iter().all(|b| b.color == START_SPOT_COLOR));
    }

    #[test]
    fn test_overlay_filter_skips_out_of_range() {
        let filter = PositionFilter::Indices(vec![2, 9]);
        let overlay = build_start_spot_overlay(&spots(), &filter, &projector(), true);
        let markers: Vec<_> = overlay.iter().filter(|b| b.color == START_SPOT_COLOR).collect();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].rect.center(), Vector2F::new(20.0, 5.0));
        assert_eq!(overlay.len() - 1, glyph_cells(2).count());
    }
}
