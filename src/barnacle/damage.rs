//! Physical Impact Damage
//!
//! Ordered-threshold tables turning a collision's speeds and mass into
//! damage to the creature. The defaults are tuned so that sawblades (fast
//! spin) are lethal while light debris glancing off does nothing.

use serde::{Deserialize, Serialize};

use crate::barnacle::config::ConfigError;

/// Mass at which an object counts as large.
pub const LARGE_OBJECT_MASS: f32 = 500.0;

/// One row of an impact table: at or above `speed_sq`, deal `damage`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImpactEntry {
    /// Squared impact speed threshold.
    pub speed_sq: f32,
    /// Damage dealt at or above the threshold.
    pub damage: f32,
}

impl ImpactEntry {
    /// Row for a speed given unsquared.
    pub fn at_speed(speed: f32, damage: f32) -> Self {
        Self { speed_sq: speed * speed, damage }
    }
}

/// How linear and angular damage are merged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageCombine {
    /// Add both lookups.
    #[default]
    Sum,
    /// Take the larger lookup.
    Max,
}

/// A physical collision against the creature.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicsImpact {
    /// Squared linear speed of the other object.
    pub linear_speed_sq: f32,
    /// Squared angular speed of the other object (deg/s squared).
    pub angular_speed_sq: f32,
    /// Mass of the other object.
    pub mass: f32,
    /// The other object was falling onto the creature.
    pub falling: bool,
}

impl PhysicsImpact {
    /// Impact from a linear hit only.
    pub fn linear(speed: f32, mass: f32) -> Self {
        Self { linear_speed_sq: speed * speed, angular_speed_sq: 0.0, mass, falling: false }
    }
}

/// Static impact-damage configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageTable {
    /// Linear rows, ascending by threshold.
    pub linear: Vec<ImpactEntry>,
    /// Angular rows, ascending by threshold.
    pub angular: Vec<ImpactEntry>,
    /// Linear speed² below which no linear damage registers.
    pub min_linear_speed_sq: f32,
    /// Angular speed² below which no angular damage registers.
    pub min_angular_speed_sq: f32,
    /// Objects lighter than this never deal damage.
    pub min_mass: f32,
    /// Objects lighter than this are "small".
    pub small_mass: f32,
    /// Damage cap for small objects.
    pub small_mass_max_damage: f32,
    /// Small objects need at least this linear speed² to deal damage.
    pub small_mass_min_speed_sq: f32,
    /// Objects at least this heavy are "large".
    pub large_mass: f32,
    /// Damage multiplier for large objects.
    pub large_mass_scale: f32,
    /// Damage multiplier for large objects falling onto the creature.
    pub large_mass_fall_scale: f32,
    /// Merge policy for linear and angular damage.
    pub combine: DamageCombine,
}

impl Default for DamageTable {
    fn default() -> Self {
        Self {
            linear: vec![
                ImpactEntry::at_speed(150.0, 5.0),
                ImpactEntry::at_speed(250.0, 10.0),
                ImpactEntry::at_speed(350.0, 50.0),
                ImpactEntry::at_speed(500.0, 100.0),
                ImpactEntry::at_speed(1000.0, 500.0),
            ],
            angular: vec![
                // sawblades always kill
                ImpactEntry::at_speed(100.0, 35.0),
                ImpactEntry::at_speed(200.0, 50.0),
                ImpactEntry::at_speed(250.0, 500.0),
            ],
            min_linear_speed_sq: 24.0 * 24.0,
            min_angular_speed_sq: 360.0 * 360.0,
            min_mass: 2.0,
            small_mass: 5.0,
            small_mass_max_damage: 5.0,
            small_mass_min_speed_sq: 36.0 * 36.0,
            large_mass: LARGE_OBJECT_MASS,
            large_mass_scale: 4.0,
            large_mass_fall_scale: 5.0,
            combine: DamageCombine::Sum,
        }
    }
}

/// Damage of the highest row whose threshold is at or below `value`.
///
/// Rows must be ascending; values below every row read as zero.
pub fn read_table(rows: &[ImpactEntry], value: f32) -> f32 {
    rows.iter()
        .take_while(|row| row.speed_sq <= value)
        .last()
        .map_or(0.0, |row| row.damage)
}

impl DamageTable {
    /// Damage dealt to the creature by one impact.
    pub fn impact_damage(&self, impact: &PhysicsImpact) -> f32 {
        if impact.mass < self.min_mass {
            return 0.0;
        }

        let small = impact.mass < self.small_mass;
        let min_linear = if small {
            self.min_linear_speed_sq.max(self.small_mass_min_speed_sq)
        } else {
            self.min_linear_speed_sq
        };

        let linear = if impact.linear_speed_sq >= min_linear {
            read_table(&self.linear, impact.linear_speed_sq)
        } else {
            0.0
        };

        let angular = if impact.angular_speed_sq >= self.min_angular_speed_sq {
            read_table(&self.angular, impact.angular_speed_sq)
        } else {
            0.0
        };

        let mut damage = match self.combine {
            DamageCombine::Sum => linear + angular,
            DamageCombine::Max => linear.max(angular),
        };

        if impact.mass >= self.large_mass {
            damage *= if impact.falling {
                self.large_mass_fall_scale
            } else {
                self.large_mass_scale
            };
        }

        if small {
            damage = damage.min(self.small_mass_max_damage);
        }

        damage
    }

    /// Rows must be ascending with non-negative damage.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rows("damage.linear", &self.linear)?;
        check_rows("damage.angular", &self.angular)?;
        if self.large_mass_scale < 0.0 || self.large_mass_fall_scale < 0.0 {
            return Err(ConfigError::invalid("damage.large_mass_scale", "must be zero or more"));
        }
        if self.small_mass_max_damage < 0.0 {
            return Err(ConfigError::invalid("damage.small_mass_max_damage", "must be zero or more"));
        }
        Ok(())
    }
}

fn check_rows(field: &'static str, rows: &[ImpactEntry]) -> Result<(), ConfigError> {
    if rows.iter().any(|row| row.damage.is_nan() || row.damage < 0.0 || !row.speed_sq.is_finite()) {
        return Err(ConfigError::invalid(field, "rows need finite thresholds and non-negative damage"));
    }
    if rows.windows(2).any(|pair| pair[0].speed_sq > pair[1].speed_sq) {
        return Err(ConfigError::invalid(field, "rows must be sorted by threshold"));
    }
    Ok(())
}
