//! Closed label sets for the categorical metrics.
//!
//! Each categorical field in [`ScoreMetrics`](crate::ScoreMetrics) takes its
//! value from exactly one of these enums. Labels serialize as plain strings
//! so the index stays readable and additive.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a string is not a member of a label set.
#[derive(Debug, Error)]
#[error("Unknown {kind} label: {value}")]
pub struct LabelParseError {
    kind: &'static str,
    value: String,
}

macro_rules! label_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident (default = $default:ident) {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $label:literal $(| $alias:literal)*
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label $(, alias = $alias)*)]
                $variant,
            )+
        }

        impl $name {
            /// Every member of the label set, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the persisted label string.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = LabelParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(LabelParseError {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

label_enum! {
    /// Dominant camera movement for a frame pair.
    pub enum CameraMovement (default = Static) {
        Static => "Static",
        PanLeft => "PanLeft" | "Pan Left",
        PanRight => "PanRight" | "Pan Right",
        TiltUp => "TiltUp" | "Tilt Up",
        TiltDown => "TiltDown" | "Tilt Down",
        ZoomIn => "ZoomIn" | "Zoom In",
        ZoomOut => "ZoomOut" | "Zoom Out",
        DollyIn => "DollyIn" | "Dolly In",
        DollyOut => "DollyOut" | "Dolly Out",
        RotationCW => "RotationCW" | "Rotation CW",
        RotationCCW => "RotationCCW" | "Rotation CCW",
        /// Erratic, high-variance motion.
        Handheld => "Handheld" | "Handheld/Shake",
        /// Significant motion that fits no single movement.
        Complex => "Complex" | "Complex Movement",
    }
}

impl CameraMovement {
    /// Returns true for movements that receive the smoothness quality bonus.
    pub fn is_directed(&self) -> bool {
        !matches!(self, CameraMovement::Static | CameraMovement::Handheld)
    }
}

label_enum! {
    /// Inferred camera support, from the consistency of tracked motion.
    pub enum StabilizationType (default = Unknown) {
        Tripod => "tripod",
        Gimbal => "gimbal",
        HandheldStabilized => "handheld_stabilized",
        HandheldUnstabilized => "handheld_unstabilized",
        /// Too few tracked features, or no previous frame.
        Unknown => "unknown",
    }
}

label_enum! {
    /// Lighting setup, from luminance statistics.
    pub enum LightingType (default = Unknown) {
        GoldenHour => "golden_hour",
        BlueHour => "blue_hour",
        Natural => "natural",
        HighKey => "high_key",
        LowKey => "low_key",
        Backlit => "backlit",
        ThreePoint => "three_point",
        Motivated => "motivated",
        Unknown => "unknown",
    }
}

label_enum! {
    /// Color grading look.
    pub enum ColorGradingStyle (default = Neutral) {
        Warm => "warm",
        Cool => "cool",
        Desaturated => "desaturated",
        Vibrant => "vibrant",
        Monochrome => "monochrome",
        TealOrange => "teal_orange",
        Vintage => "vintage",
        Neutral => "neutral",
    }
}

label_enum! {
    /// Exposure class, from mean luminance.
    pub enum ExposureClass (default = Unknown) {
        Underexposed => "underexposed",
        ProperlyExposed => "properly_exposed",
        Overexposed => "overexposed",
        Unknown => "unknown",
    }
}

label_enum! {
    /// Shot size, from the subject's share of the frame.
    pub enum ShotSize (default = Unknown) {
        ExtremeCloseUp => "extreme_close_up",
        CloseUp => "close_up",
        Medium => "medium",
        Wide => "wide",
        ExtremeWide => "extreme_wide",
        /// Large subject that spans neither frame dimension.
        Insert => "insert",
        Unknown => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_movement_parse() {
        assert_eq!("Static".parse::<CameraMovement>().unwrap(), CameraMovement::Static);
        assert_eq!("PanLeft".parse::<CameraMovement>().unwrap(), CameraMovement::PanLeft);
        assert_eq!("Pan Left".parse::<CameraMovement>().unwrap(), CameraMovement::PanLeft);
        assert_eq!(
            "Handheld/Shake".parse::<CameraMovement>().unwrap(),
            CameraMovement::Handheld
        );
        assert!("Sideways".parse::<CameraMovement>().is_err());
    }

    #[test]
    fn test_label_display_matches_serde() {
        for label in LightingType::ALL {
            let json = serde_json::to_string(label).unwrap();
            assert_eq!(json, format!("\"{}\"", label));
        }
        for label in CameraMovement::ALL {
            let json = serde_json::to_string(label).unwrap();
            assert_eq!(json, format!("\"{}\"", label));
        }
    }

    #[test]
    fn test_label_defaults() {
        assert_eq!(CameraMovement::default(), CameraMovement::Static);
        assert_eq!(StabilizationType::default().as_str(), "unknown");
        assert_eq!(LightingType::default().as_str(), "unknown");
        assert_eq!(ColorGradingStyle::default().as_str(), "neutral");
        assert_eq!(ExposureClass::default().as_str(), "unknown");
        assert_eq!(ShotSize::default().as_str(), "unknown");
    }

    #[test]
    fn test_directed_movements() {
        assert!(!CameraMovement::Static.is_directed());
        assert!(!CameraMovement::Handheld.is_directed());
        assert!(CameraMovement::ZoomIn.is_directed());
        assert!(CameraMovement::Complex.is_directed());
    }

    #[test]
    fn test_legacy_label_deserializes() {
        let parsed: CameraMovement = serde_json::from_str("\"Zoom In\"").unwrap();
        assert_eq!(parsed, CameraMovement::ZoomIn);
    }
}
