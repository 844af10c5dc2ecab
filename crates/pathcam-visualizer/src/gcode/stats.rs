//! Summary figures for a parsed program.

use std::fmt;

use serde::Serialize;

use super::parser::Waypoint;

/// Move counts, travelled distance and extents of a waypoint sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ProgramStats {
    pub waypoint_count: usize,
    /// Distance covered by feed moves.
    pub cutting_distance: f64,
    /// Distance covered by rapid moves.
    pub rapid_distance: f64,
    /// `[x, y, z]` minimum, `None` for an empty program.
    pub min: Option<[f64; 3]>,
    pub max: Option<[f64; 3]>,
}

impl ProgramStats {
    /// Each leg is attributed to the motion kind of the waypoint it ends at.
    pub fn from_waypoints(waypoints: &[Waypoint]) -> Self {
        let mut stats = Self {
            waypoint_count: waypoints.len(),
            ..Self::default()
        };

        for pair in waypoints.windows(2) {
            let leg = pair[0].distance_to(&pair[1]);
            if pair[1].rapid {
                stats.rapid_distance += leg;
            } else {
                stats.cutting_distance += leg;
            }
        }

        for w in waypoints {
            let p = [w.x, w.y, w.z];
            stats.min = Some(match stats.min {
                Some(m) => [m[0].min(p[0]), m[1].min(p[1]), m[2].min(p[2])],
                None => p,
            });
            stats.max = Some(match stats.max {
                Some(m) => [m[0].max(p[0]), m[1].max(p[1]), m[2].max(p[2])],
                None => p,
            });
        }

        stats
    }

    pub fn total_distance(&self) -> f64 {
        self.cutting_distance + self.rapid_distance
    }
}

impl fmt::Display for ProgramStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Waypoints:        {}", self.waypoint_count)?;
        writeln!(f, "Cutting distance: {:.3}", self.cutting_distance)?;
        writeln!(f, "Rapid distance:   {:.3}", self.rapid_distance)?;
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(
                f,
                "Extents:          X {:.3}..{:.3}  Y {:.3}..{:.3}  Z {:.3}..{:.3}",
                min[0], max[0], min[1], max[1], min[2], max[2]
            ),
            _ => write!(f, "Extents:          none"),
        }
    }
}
