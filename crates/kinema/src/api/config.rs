use glam::Vec2;
use serde::Deserialize;
use serde_json::Value;

use crate::components::motion::{ForceCaps, ForceMode, MovingBody};
use crate::components::rect::Rect;
use crate::error::{KinemaError, Result};
use crate::systems::bounds::BoundsConstraint;
use crate::systems::collision::{CollisionResolver, RevertPolicy, DEFAULT_PENETRATION_THRESHOLD};
use crate::systems::forces::ForceField;

/// Engine configuration, provided by the game or loaded from JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window title (also used in log lines).
    pub title: String,
    /// World width in pixels.
    pub world_width: f32,
    /// World height in pixels.
    pub world_height: f32,
    /// Target frametime in milliseconds; `None` runs unthrottled.
    pub target_frametime_ms: Option<f32>,
    /// Deepest per-axis overlap still resolved as contact (negative pixels).
    pub penetration_threshold: f32,
    pub revert_policy: RevertPolicy,
    pub force_mode: ForceMode,
    /// Constant force on every movable sprite. In JSON: a number (vertical
    /// gravity), `[x, y]`, or `{"x": .., "y": ..}`.
    #[serde(skip)]
    pub gravity: Vec2,
    pub gravity_caps: ForceCaps,
    /// Region sprites are kept inside; `None` leaves them unbounded.
    pub bounds: Option<Rect>,
    /// Speed given to sprites built with [`EngineConfig::moving_body`].
    pub default_speed: f32,
    /// Linear damping for the rigid-body backend.
    pub damping: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "kinema".to_string(),
            world_width: 320.0,
            world_height: 240.0,
            target_frametime_ms: Some(15.0),
            penetration_threshold: DEFAULT_PENETRATION_THRESHOLD,
            revert_policy: RevertPolicy::default(),
            force_mode: ForceMode::default(),
            gravity: Vec2::ZERO,
            gravity_caps: ForceCaps::none(),
            bounds: None,
            default_speed: 1.0,
            damping: 0.0,
        }
    }
}

/// Name of a JSON value's type, for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn json_number(value: &Value) -> Result<f32> {
    value
        .as_f64()
        .map(|n| n as f32)
        .ok_or(KinemaError::UnsupportedValue {
            expected: "number",
            received: json_type_name(value),
        })
}

/// Read a vector from JSON. A bare number is a vertical component.
pub fn vector_from_json(value: &Value) -> Result<Vec2> {
    match value {
        Value::Number(_) => Ok(Vec2::new(0.0, json_number(value)?)),
        Value::Array(items) if items.len() == 2 => {
            Ok(Vec2::new(json_number(&items[0])?, json_number(&items[1])?))
        }
        Value::Array(items) => Err(KinemaError::InvalidArgument(format!(
            "vector array needs 2 components, got {}",
            items.len()
        ))),
        Value::Object(map) => {
            let x = map.get("x").map(json_number).transpose()?.unwrap_or(0.0);
            let y = map.get("y").map(json_number).transpose()?.unwrap_or(0.0);
            Ok(Vec2::new(x, y))
        }
        other => Err(KinemaError::UnsupportedValue {
            expected: "vector",
            received: json_type_name(other),
        }),
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(json)?;
        let gravity = match value.as_object_mut().and_then(|map| map.remove("gravity")) {
            Some(raw) => Some(vector_from_json(&raw)?),
            None => None,
        };
        let mut config: EngineConfig = serde_json::from_value(value)?;
        if let Some(gravity) = gravity {
            config.gravity = gravity;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail later, mid-frame.
    pub fn validate(&self) -> Result<()> {
        if !(self.world_width > 0.0 && self.world_height > 0.0) {
            return Err(KinemaError::InvalidConfig(format!(
                "world size must be positive (got {}x{})",
                self.world_width, self.world_height
            )));
        }
        if let Some(ms) = self.target_frametime_ms {
            if !ms.is_finite() || ms <= 0.0 {
                return Err(KinemaError::InvalidConfig(format!(
                    "target frametime must be positive (got {ms})"
                )));
            }
        }
        if !self.damping.is_finite() || self.damping < 0.0 {
            return Err(KinemaError::InvalidConfig(format!(
                "damping must be non-negative (got {})",
                self.damping
            )));
        }
        CollisionResolver::new(self.penetration_threshold)?;
        MovingBody::new(self.default_speed)?;
        Ok(())
    }

    /// The whole world as a rectangle.
    pub fn world_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.world_width, self.world_height)
    }

    pub fn resolver(&self) -> Result<CollisionResolver> {
        Ok(CollisionResolver::new(self.penetration_threshold)?.with_revert_policy(self.revert_policy))
    }

    /// Gravity as a force field, if any is configured.
    pub fn gravity_field(&self) -> Option<ForceField> {
        (self.gravity != Vec2::ZERO).then(|| ForceField::new(self.gravity).with_caps(self.gravity_caps))
    }

    pub fn bounds_constraint(&self) -> Option<BoundsConstraint> {
        self.bounds.map(BoundsConstraint::new)
    }

    /// A motion component with the configured speed and force mode.
    pub fn moving_body(&self) -> Result<MovingBody> {
        Ok(MovingBody::new(self.default_speed)?.with_force_mode(self.force_mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.gravity_field().is_none());
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "title": "demo",
            "world_width": 640,
            "world_height": 480,
            "target_frametime_ms": 20,
            "penetration_threshold": -15,
            "revert_policy": "always",
            "force_mode": "into_force",
            "gravity": [0, 300],
            "gravity_caps": { "down": 400 },
            "bounds": { "x": 0, "y": 0, "w": 640, "h": 480 },
            "default_speed": 2.5
        }"#;
        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.title, "demo");
        assert_eq!(config.revert_policy, RevertPolicy::Always);
        assert_eq!(config.force_mode, ForceMode::IntoForce);
        assert_eq!(config.gravity, Vec2::new(0.0, 300.0));
        assert_eq!(config.gravity_caps.down, Some(400.0));
        assert_eq!(config.bounds, Some(Rect::new(0.0, 0.0, 640.0, 480.0)));
        assert_eq!(config.resolver().unwrap().threshold(), -15.0);
        assert_eq!(config.moving_body().unwrap().force_mode(), ForceMode::IntoForce);
    }

    #[test]
    fn gravity_accepts_number_and_object() {
        let config = EngineConfig::from_json(r#"{ "gravity": 100 }"#).unwrap();
        assert_eq!(config.gravity, Vec2::new(0.0, 100.0));
        let config = EngineConfig::from_json(r#"{ "gravity": { "x": -5 } }"#).unwrap();
        assert_eq!(config.gravity, Vec2::new(-5.0, 0.0));
    }

    #[test]
    fn gravity_rejects_wrong_type() {
        let err = EngineConfig::from_json(r#"{ "gravity": "down" }"#).unwrap_err();
        match err {
            KinemaError::UnsupportedValue { expected, received } => {
                assert_eq!(expected, "vector");
                assert_eq!(received, "string");
            }
            other => panic!("expected UnsupportedValue, got {other:?}"),
        }
        let err = EngineConfig::from_json(r#"{ "gravity": [1, true] }"#).unwrap_err();
        assert!(matches!(err, KinemaError::UnsupportedValue { received: "boolean", .. }));
    }

    #[test]
    fn rejects_zero_speed_and_positive_threshold() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "default_speed": 0 }"#),
            Err(KinemaError::InvalidConfig(_))
        ));
        assert!(EngineConfig::from_json(r#"{ "penetration_threshold": 5 }"#).is_err());
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(KinemaError::Json(_))
        ));
    }
}
