use std::fmt;
use thiserror::Error;

pub const RIGHT_ANGLE: f64 = 90.0;
pub const DEGREE_SUM: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Opposite,
    Adjacent,
    Hypotenuse,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::Opposite => "opposite",
            Side::Adjacent => "adjacent",
            Side::Hypotenuse => "hypotenuse",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolveError {
    #[error("incorrect number of sides provided ({given}), provide exactly 2")]
    InvalidSideCount { given: usize },

    #[error("angles add up to {total}, expected 180")]
    AngleSumMismatch { total: f64 },

    #[error("{side} length must be finite and positive, got {value}")]
    InvalidSideLength { side: Side, value: f64 },

    #[error("hypotenuse {hypotenuse} must be longer than the given leg {leg}")]
    HypotenuseTooShort { hypotenuse: f64, leg: f64 },

    #[error("adjacent angle rounds to {angle} degrees, sides are too far apart to form a triangle")]
    DegenerateAngle { angle: f64 },
}

/// The two sides a triangle was solved from. Each pair maps to exactly one
/// inverse trigonometric function (SOHCAHTOA).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownPair {
    OppositeHypotenuse,
    AdjacentHypotenuse,
    OppositeAdjacent,
}

impl KnownPair {
    pub fn missing(self) -> Side {
        match self {
            KnownPair::OppositeHypotenuse => Side::Adjacent,
            KnownPair::AdjacentHypotenuse => Side::Opposite,
            KnownPair::OppositeAdjacent => Side::Hypotenuse,
        }
    }

    /// Angle at the adjacent vertex, in radians.
    fn angle(self, opposite: f64, adjacent: f64, hypotenuse: f64) -> f64 {
        match self {
            KnownPair::OppositeHypotenuse => (opposite / hypotenuse).asin(),
            KnownPair::AdjacentHypotenuse => (adjacent / hypotenuse).acos(),
            KnownPair::OppositeAdjacent => (opposite / adjacent).atan(),
        }
    }

    fn missing_length(self, opposite: f64, adjacent: f64, hypotenuse: f64) -> f64 {
        match self {
            KnownPair::OppositeHypotenuse => (hypotenuse.powi(2) - opposite.powi(2)).sqrt(),
            KnownPair::AdjacentHypotenuse => (hypotenuse.powi(2) - adjacent.powi(2)).sqrt(),
            KnownPair::OppositeAdjacent => (opposite.powi(2) + adjacent.powi(2)).sqrt(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sides {
    pub opposite: f64,
    pub adjacent: f64,
    pub hypotenuse: f64,
}

impl Sides {
    pub fn sum(&self) -> f64 {
        self.opposite + self.adjacent + self.hypotenuse
    }
}

/// Angles in degrees. `adjacent` is the angle at the vertex joining the
/// adjacent side and the hypotenuse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angles {
    pub adjacent: f64,
    pub opposite: f64,
    pub right_angle: f64,
}

impl Angles {
    pub fn sum(&self) -> f64 {
        self.adjacent + self.opposite + self.right_angle
    }
}

/// A fully solved right triangle. Only [`Triangle::solve`] constructs one,
/// so every instance satisfies the Pythagorean relation and the 180 degree sum.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    sides: Sides,
    angles: Angles,
    known: KnownPair,
    area: f64,
    perimeter: f64,
}

impl Triangle {
    /// Solves a right triangle from exactly two side lengths. A length of
    /// `Some(0.0)` counts as not given.
    pub fn solve(
        opposite: Option<f64>,
        adjacent: Option<f64>,
        hypotenuse: Option<f64>,
    ) -> Result<Self, SolveError> {
        let opposite = given(Side::Opposite, opposite)?;
        let adjacent = given(Side::Adjacent, adjacent)?;
        let hypotenuse = given(Side::Hypotenuse, hypotenuse)?;

        let known = match (opposite, adjacent, hypotenuse) {
            (Some(_), None, Some(_)) => KnownPair::OppositeHypotenuse,
            (None, Some(_), Some(_)) => KnownPair::AdjacentHypotenuse,
            (Some(_), Some(_), None) => KnownPair::OppositeAdjacent,
            _ => {
                let given = [opposite, adjacent, hypotenuse]
                    .iter()
                    .filter(|side| side.is_some())
                    .count();
                return Err(SolveError::InvalidSideCount { given });
            }
        };

        let opposite = opposite.unwrap_or_default();
        let adjacent = adjacent.unwrap_or_default();
        let hypotenuse = hypotenuse.unwrap_or_default();

        if known != KnownPair::OppositeAdjacent {
            let leg = opposite.max(adjacent);
            if hypotenuse <= leg {
                return Err(SolveError::HypotenuseTooShort { hypotenuse, leg });
            }
        }

        let adjacent_angle = round2(known.angle(opposite, adjacent, hypotenuse).to_degrees());
        let angles = Angles {
            adjacent: adjacent_angle,
            opposite: RIGHT_ANGLE - adjacent_angle,
            right_angle: RIGHT_ANGLE,
        };

        if angles.adjacent <= 0.0 || angles.adjacent >= RIGHT_ANGLE {
            return Err(SolveError::DegenerateAngle { angle: angles.adjacent });
        }

        let total = round2(angles.sum());
        if total != DEGREE_SUM {
            return Err(SolveError::AngleSumMismatch { total });
        }

        let missing = round2(known.missing_length(opposite, adjacent, hypotenuse));
        let sides = match known.missing() {
            Side::Opposite => Sides { opposite: missing, adjacent, hypotenuse },
            Side::Adjacent => Sides { opposite, adjacent: missing, hypotenuse },
            Side::Hypotenuse => Sides { opposite, adjacent, hypotenuse: missing },
        };

        Ok(Self {
            sides,
            angles,
            known,
            area: sides.opposite * sides.adjacent / 2.0,
            perimeter: round2(sides.sum()),
        })
    }

    pub fn sides(&self) -> &Sides {
        &self.sides
    }

    pub fn angles(&self) -> &Angles {
        &self.angles
    }

    pub fn known(&self) -> KnownPair {
        self.known
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn perimeter(&self) -> f64 {
        self.perimeter
    }
}

impl fmt::Display for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sides: opposite={} adjacent={} hypotenuse={}; angles: adjacent={} opposite={} right-angle={}; area={} perimeter={}",
            format_measure(self.sides.opposite),
            format_measure(self.sides.adjacent),
            format_measure(self.sides.hypotenuse),
            format_measure(self.angles.adjacent),
            format_measure(self.angles.opposite),
            format_measure(self.angles.right_angle),
            format_measure(self.area),
            format_measure(self.perimeter),
        )
    }
}

fn given(side: Side, value: Option<f64>) -> Result<Option<f64>, SolveError> {
    match value {
        None => Ok(None),
        Some(value) if value == 0.0 => Ok(None),
        Some(value) if value.is_finite() && value > 0.0 => Ok(Some(value)),
        Some(value) => Err(SolveError::InvalidSideLength { side, value }),
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Two decimal places at most, without trailing zeros: `400`, `565.69`, `0.99`.
pub fn format_measure(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isosceles_from_legs() {
        let triangle = Triangle::solve(Some(400.0), Some(400.0), None).unwrap();
        assert_eq!(triangle.known(), KnownPair::OppositeAdjacent);
        assert_eq!(triangle.angles().adjacent, 45.0);
        assert_eq!(triangle.angles().opposite, 45.0);
        assert_eq!(triangle.sides().hypotenuse, 565.69);
        assert_eq!(triangle.area(), 80000.0);
        assert_eq!(triangle.perimeter(), 1365.69);
    }

    #[test]
    fn three_four_five_from_opposite_and_hypotenuse() {
        let triangle = Triangle::solve(Some(300.0), None, Some(500.0)).unwrap();
        assert_eq!(triangle.known(), KnownPair::OppositeHypotenuse);
        assert_eq!(triangle.sides().adjacent, 400.0);
        assert_eq!(triangle.angles().adjacent, 36.87);
        assert_eq!(triangle.area(), 60000.0);
        assert_eq!(triangle.perimeter(), 1200.0);
    }

    #[test]
    fn adjacent_and_hypotenuse_use_arccosine() {
        let triangle = Triangle::solve(None, Some(400.0), Some(500.0)).unwrap();
        assert_eq!(triangle.known(), KnownPair::AdjacentHypotenuse);
        assert_eq!(triangle.sides().opposite, 300.0);
        assert_eq!(triangle.angles().adjacent, 36.87);
        assert_eq!(triangle.angles().right_angle, 90.0);
    }

    #[test]
    fn wrong_side_count() {
        for (opposite, adjacent, hypotenuse, count) in [
            (None, None, None, 0),
            (Some(3.0), None, None, 1),
            (None, None, Some(5.0), 1),
            (Some(3.0), Some(4.0), Some(5.0), 3),
        ] {
            assert_eq!(
                Triangle::solve(opposite, adjacent, hypotenuse),
                Err(SolveError::InvalidSideCount { given: count })
            );
        }
    }

    #[test]
    fn zero_counts_as_missing() {
        let err = Triangle::solve(Some(0.0), Some(4.0), None).unwrap_err();
        assert_eq!(err, SolveError::InvalidSideCount { given: 1 });
        assert!(err.to_string().contains("(1)"));
    }

    #[test]
    fn rejects_bad_lengths() {
        assert!(matches!(
            Triangle::solve(Some(-3.0), Some(4.0), None),
            Err(SolveError::InvalidSideLength { side: Side::Opposite, .. })
        ));
        assert!(matches!(
            Triangle::solve(Some(3.0), Some(f64::NAN), None),
            Err(SolveError::InvalidSideLength { side: Side::Adjacent, .. })
        ));
        assert!(matches!(
            Triangle::solve(Some(3.0), None, Some(f64::INFINITY)),
            Err(SolveError::InvalidSideLength { side: Side::Hypotenuse, .. })
        ));
    }

    #[test]
    fn hypotenuse_must_exceed_leg() {
        assert_eq!(
            Triangle::solve(Some(5.0), None, Some(5.0)),
            Err(SolveError::HypotenuseTooShort { hypotenuse: 5.0, leg: 5.0 })
        );
        assert!(Triangle::solve(None, Some(6.0), Some(5.0)).is_err());
    }

    #[test]
    fn extreme_leg_ratios_are_rejected() {
        assert_eq!(
            Triangle::solve(Some(1.0), Some(100000.0), None),
            Err(SolveError::DegenerateAngle { angle: 0.0 })
        );
        assert_eq!(
            Triangle::solve(Some(100000.0), Some(1.0), None),
            Err(SolveError::DegenerateAngle { angle: 90.0 })
        );
        assert!(matches!(
            Triangle::solve(Some(0.001), None, Some(1000.0)),
            Err(SolveError::DegenerateAngle { .. })
        ));
    }

    #[test]
    fn smallest_representable_angle_is_kept() {
        // atan(1 / 1000) is 0.057 degrees, which still rounds to 0.06.
        let triangle = Triangle::solve(Some(1.0), Some(1000.0), None).unwrap();
        assert_eq!(triangle.angles().adjacent, 0.06);
        assert!(triangle.angles().opposite < 90.0);
    }

    #[test]
    fn measures_drop_float_noise() {
        assert_eq!(format_measure(400.0), "400");
        assert_eq!(format_measure(565.69), "565.69");
        assert_eq!(format_measure(90.0 - 89.01), "0.99");
        assert_eq!(format_measure(90.0 - 66.8), "23.2");
        assert_eq!(format_measure(100.0), "100");
        assert_eq!(format_measure(80000.0), "80000");
    }

    #[test]
    fn display_uses_trimmed_measures() {
        let triangle = Triangle::solve(Some(733.3), Some(12.7), None).unwrap();
        let text = triangle.to_string();
        assert!(text.contains("opposite=0.99"), "{}", text);
        assert!(!text.contains("0.9899"), "{}", text);
    }

    #[test]
    fn round2_keeps_two_places() {
        assert_eq!(round2(565.685424949238), 565.69);
        assert_eq!(round2(36.86989764584402), 36.87);
        assert_eq!(round2(45.0), 45.0);
    }
}
