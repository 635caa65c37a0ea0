//! End-of-game scoring.
//!
//! Empty regions are flood filled; a region whose border touches stones of a
//! single colour is that colour's territory, anything else is neutral.
//! Area scoring counts stones plus territory, territory scoring counts
//! territory plus prisoners. Both subtract komi from Black.

use crate::board::{Color, Point, Stone, neighbors, onboard_points};
use crate::constants::BOARD_MAX;
use crate::position::Position;

/// Per-colour totals of a scored position.
#[derive(Clone)]
pub struct ScoreBreakdown {
    pub stones: [usize; 2],
    pub territory: [usize; 2],
    pub prisoners: [usize; 2],
    pub komi: f64,
    owner: [Option<Color>; BOARD_MAX],
}

impl ScoreBreakdown {
    /// Stones plus territory of `color`.
    pub fn area(&self, color: Color) -> usize {
        self.stones[color.index()] + self.territory[color.index()]
    }

    /// Black's area minus White's area minus komi.
    pub fn area_score(&self) -> f64 {
        self.area(Color::Black) as f64 - self.area(Color::White) as f64 - self.komi
    }

    /// Black's territory and prisoners minus White's, minus komi.
    pub fn territory_score(&self) -> f64 {
        let b = self.territory[0] + self.prisoners[0];
        let w = self.territory[1] + self.prisoners[1];
        b as f64 - w as f64 - self.komi
    }

    /// Winner by area; `None` on an exact tie.
    pub fn winner(&self) -> Option<Color> {
        let score = self.area_score();
        if score > 0.0 {
            Some(Color::Black)
        } else if score < 0.0 {
            Some(Color::White)
        } else {
            None
        }
    }

    /// Colour controlling `pt` (stone or territory).
    #[inline]
    pub fn owner(&self, pt: Point) -> Option<Color> {
        self.owner[pt]
    }
}

/// Score `pos` with compensation `komi` for White.
pub fn score_position(pos: &Position, komi: f64) -> ScoreBreakdown {
    let mut result = ScoreBreakdown {
        stones: [0; 2],
        territory: [0; 2],
        prisoners: [pos.prisoners(Color::Black), pos.prisoners(Color::White)],
        komi,
        owner: [None; BOARD_MAX],
    };
    let mut visited = [false; BOARD_MAX];
    let mut region = Vec::new();

    for pt in onboard_points() {
        match pos.stone(pt) {
            Stone::Black | Stone::White => {
                if let Some(c) = pos.stone(pt).color() {
                    result.stones[c.index()] += 1;
                    result.owner[pt] = Some(c);
                }
            }
            Stone::Empty if !visited[pt] => {
                // Bit 0: touches Black, bit 1: touches White.
                let mut border = 0u8;
                region.clear();
                region.push(pt);
                visited[pt] = true;
                let mut i = 0;
                while i < region.len() {
                    for n in neighbors(region[i]) {
                        match pos.stone(n) {
                            Stone::Empty if !visited[n] => {
                                visited[n] = true;
                                region.push(n);
                            }
                            Stone::Black => border |= 1,
                            Stone::White => border |= 2,
                            _ => {}
                        }
                    }
                    i += 1;
                }
                let owner = match border {
                    1 => Some(Color::Black),
                    2 => Some(Color::White),
                    _ => None,
                };
                if let Some(c) = owner {
                    result.territory[c.index()] += region.len();
                    for &p in &region {
                        result.owner[p] = Some(c);
                    }
                }
            }
            _ => {}
        }
    }
    result
}
