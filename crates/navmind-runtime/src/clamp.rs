//! Pure clamping of an untrusted planner payload into a bounded command.
//!
//! The payload comes straight from a remote model, so nothing about its shape
//! can be trusted.  Every lookup degrades to `0.0` rather than erroring:
//! indexing a non-object [`serde_json::Value`] yields `Null`, and `Null`
//! reads as no value.  The result is that a malformed reply produces a zero
//! command, never a fault.

use navmind_types::{SpeedLimits, Vector3, VelocityCommand};
use serde_json::Value;

/// Saturate `value` into `[-limit, +limit]`.
///
/// A limit of zero or below fully disables the axis: the result is `0.0`
/// regardless of the input's magnitude or sign.
pub fn clamp_axis(value: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        return 0.0;
    }
    value.clamp(-limit, limit)
}

/// Convert an untrusted payload into a bounded [`VelocityCommand`] plus the
/// planner's optional trimmed comment.
///
/// Reads `linear.x`, `linear.y` and `angular.z`; all other components are
/// pinned to zero (unused axes on this platform).  `linear.y` is forced to
/// zero whenever lateral motion is disabled, independent of its limit.
/// A comment that is not a string, or trims to nothing, yields `None`.
pub fn clamp_velocity(payload: &Value, limits: &SpeedLimits) -> (VelocityCommand, Option<String>) {
    let linear_x = payload["linear"]["x"].as_f64().unwrap_or(0.0);
    let linear_y = payload["linear"]["y"].as_f64().unwrap_or(0.0);
    let angular_z = payload["angular"]["z"].as_f64().unwrap_or(0.0);

    let command = VelocityCommand {
        linear: Vector3::new(
            clamp_axis(linear_x, limits.max_linear),
            if limits.allow_lateral {
                clamp_axis(linear_y, limits.max_lateral)
            } else {
                0.0
            },
            0.0,
        ),
        angular: Vector3::new(0.0, 0.0, clamp_axis(angular_z, limits.max_angular)),
    };

    let comment = payload["comment"]
        .as_str()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from);

    (command, comment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limits() -> SpeedLimits {
        SpeedLimits {
            max_linear: 0.6,
            max_lateral: 0.2,
            max_angular: 1.2,
            allow_lateral: false,
        }
    }

    #[test]
    fn value_within_limit_passes_through() {
        assert_eq!(clamp_axis(0.4, 0.6), 0.4);
        assert_eq!(clamp_axis(-0.6, 0.6), -0.6);
    }

    #[test]
    fn value_over_limit_is_clipped() {
        assert_eq!(clamp_axis(0.9, 0.6), 0.6);
        assert_eq!(clamp_axis(-7.5, 0.6), -0.6);
    }

    #[test]
    fn zero_or_negative_limit_disables_axis() {
        assert_eq!(clamp_axis(100.0, 0.0), 0.0);
        assert_eq!(clamp_axis(-100.0, 0.0), 0.0);
        assert_eq!(clamp_axis(0.5, -1.0), 0.0);
    }

    #[test]
    fn forward_request_over_limit_is_clipped() {
        let payload = json!({"linear": {"x": 0.9, "y": 0.0}, "angular": {"z": 0.0}});
        let (cmd, _) = clamp_velocity(&payload, &limits());
        assert_eq!(cmd.linear.x, 0.6);
    }

    #[test]
    fn lateral_forced_to_zero_when_disabled() {
        let payload = json!({"linear": {"x": 0.0, "y": 0.15}});
        let (cmd, _) = clamp_velocity(&payload, &limits());
        assert_eq!(cmd.linear.y, 0.0);
    }

    #[test]
    fn lateral_clamped_when_enabled() {
        let mut lim = limits();
        lim.allow_lateral = true;
        let payload = json!({"linear": {"y": 0.5}});
        let (cmd, _) = clamp_velocity(&payload, &lim);
        assert_eq!(cmd.linear.y, 0.2);
    }

    #[test]
    fn unused_axes_are_always_zero() {
        let payload = json!({
            "linear":  {"x": 0.1, "y": 0.1, "z": 3.0},
            "angular": {"x": 3.0, "y": 3.0, "z": 0.4}
        });
        let mut lim = limits();
        lim.allow_lateral = true;
        let (cmd, _) = clamp_velocity(&payload, &lim);
        assert_eq!(cmd.linear.z, 0.0);
        assert_eq!(cmd.angular.x, 0.0);
        assert_eq!(cmd.angular.y, 0.0);
        assert_eq!(cmd.angular.z, 0.4);
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let (cmd, comment) = clamp_velocity(&json!({}), &limits());
        assert!(cmd.is_zero());
        assert!(comment.is_none());
    }

    #[test]
    fn non_object_axes_are_treated_as_empty() {
        let payload = json!({"linear": "fast", "angular": 42});
        let (cmd, _) = clamp_velocity(&payload, &limits());
        assert!(cmd.is_zero());
    }

    #[test]
    fn malformed_numeric_field_reads_as_zero() {
        let payload = json!({"linear": {"x": "quick"}, "angular": {"z": true}});
        let (cmd, _) = clamp_velocity(&payload, &limits());
        assert!(cmd.is_zero());
    }

    #[test]
    fn comment_is_trimmed() {
        let payload = json!({"comment": "  rolling forward  "});
        let (_, comment) = clamp_velocity(&payload, &limits());
        assert_eq!(comment.as_deref(), Some("rolling forward"));
    }

    #[test]
    fn non_string_or_blank_comment_yields_none() {
        let (_, c1) = clamp_velocity(&json!({"comment": 7}), &limits());
        let (_, c2) = clamp_velocity(&json!({"comment": "   "}), &limits());
        let (_, c3) = clamp_velocity(&json!({}), &limits());
        assert!(c1.is_none());
        assert!(c2.is_none());
        assert!(c3.is_none());
    }
}
