//! The closed vocabulary of edit actions and their parameter ranges.
//!
//! Candidates arrive as untyped JSON from the oracle. [`validate`] turns one
//! candidate into a typed [`EditAction`] or an [`InvalidAction`] naming the
//! offending field. Only validated actions are ever sent to the render engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Every action name the render engine understands.
pub const ACTION_NAMES: &[&str] = &[
    "trim",
    "cut_section",
    "adjust_contrast",
    "brightness",
    "saturation",
    "hue",
    "gamma",
    "blur",
    "sharpen",
    "speed",
    "rotate",
    "flip",
    "crop",
    "scale",
    "volume",
];

/// A candidate action failed schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid action: {field}: {reason}")]
pub struct InvalidAction {
    /// The offending field (`action` when the name itself is the problem).
    pub field: String,
    pub reason: String,
}

impl InvalidAction {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipDirection {
    Horizontal,
    Vertical,
}

/// One editing operation with validated parameters.
///
/// Serializes to the flat wire shape `{"action": "brightness", "value": 10}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditAction {
    /// Keep the first `value` seconds.
    Trim { value: f64 },
    /// Remove `[start_time, end_time)` seconds.
    CutSection { start_time: f64, end_time: f64 },
    AdjustContrast { value: f64 },
    Brightness { value: f64 },
    Saturation { value: f64 },
    /// Hue shift in degrees.
    Hue { value: f64 },
    Gamma { value: f64 },
    /// Blur radius.
    Blur { value: f64 },
    Sharpen { value: f64 },
    /// Playback multiplier, 1.0 is normal speed.
    Speed { value: f64 },
    /// Rotation in degrees.
    Rotate { value: f64 },
    Flip { direction: FlipDirection },
    Crop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    Scale { width: u32, height: u32 },
    /// Gain in dB.
    Volume { value: f64 },
}

impl EditAction {
    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Trim { .. } => "trim",
            Self::CutSection { .. } => "cut_section",
            Self::AdjustContrast { .. } => "adjust_contrast",
            Self::Brightness { .. } => "brightness",
            Self::Saturation { .. } => "saturation",
            Self::Hue { .. } => "hue",
            Self::Gamma { .. } => "gamma",
            Self::Blur { .. } => "blur",
            Self::Sharpen { .. } => "sharpen",
            Self::Speed { .. } => "speed",
            Self::Rotate { .. } => "rotate",
            Self::Flip { .. } => "flip",
            Self::Crop { .. } => "crop",
            Self::Scale { .. } => "scale",
            Self::Volume { .. } => "volume",
        }
    }

    /// Check every parameter against its documented range.
    ///
    /// Returns the action unchanged when valid, so validating twice is a no-op.
    pub fn validated(self) -> Result<Self, InvalidAction> {
        match &self {
            Self::Trim { value } => {
                check_finite("value", *value)?;
                if *value <= 0.0 {
                    return Err(InvalidAction::new("value", "must be greater than 0"));
                }
            }
            Self::CutSection {
                start_time,
                end_time,
            } => {
                check_finite("start_time", *start_time)?;
                check_finite("end_time", *end_time)?;
                if *start_time < 0.0 {
                    return Err(InvalidAction::new("start_time", "must not be negative"));
                }
                if end_time <= start_time {
                    return Err(InvalidAction::new(
                        "end_time",
                        "must be greater than start_time",
                    ));
                }
            }
            Self::AdjustContrast { value }
            | Self::Brightness { value }
            | Self::Saturation { value }
            | Self::Gamma { value } => check_range("value", *value, -100.0, 100.0)?,
            Self::Hue { value } => check_range("value", *value, -180.0, 180.0)?,
            Self::Blur { value } => check_range("value", *value, 1.0, 10.0)?,
            Self::Sharpen { value } => check_range("value", *value, 1.0, 20.0)?,
            Self::Speed { value } => check_range("value", *value, 0.1, 4.0)?,
            Self::Rotate { value } => check_range("value", *value, 0.0, 360.0)?,
            Self::Volume { value } => check_range("value", *value, -20.0, 20.0)?,
            Self::Flip { .. } | Self::Crop { .. } => {}
            Self::Scale { width, height } => {
                if *width == 0 {
                    return Err(InvalidAction::new("width", "must be greater than 0"));
                }
                if *height == 0 {
                    return Err(InvalidAction::new("height", "must be greater than 0"));
                }
            }
        }
        Ok(self)
    }
}

/// Validate one untyped candidate.
pub fn validate(candidate: &Value) -> Result<EditAction, InvalidAction> {
    let obj = candidate
        .as_object()
        .ok_or_else(|| InvalidAction::new("action", "candidate is not an object"))?;
    let name = match obj.get("action") {
        Some(Value::String(name)) => name.as_str(),
        Some(_) => return Err(InvalidAction::new("action", "must be a string")),
        None => return Err(InvalidAction::new("action", "missing")),
    };

    let action = match name {
        "trim" => EditAction::Trim {
            value: number(obj, "value")?,
        },
        "cut_section" => EditAction::CutSection {
            start_time: number(obj, "start_time")?,
            end_time: number(obj, "end_time")?,
        },
        "adjust_contrast" => EditAction::AdjustContrast {
            value: number(obj, "value")?,
        },
        "brightness" => EditAction::Brightness {
            value: number(obj, "value")?,
        },
        "saturation" => EditAction::Saturation {
            value: number(obj, "value")?,
        },
        "hue" => EditAction::Hue {
            value: number(obj, "value")?,
        },
        "gamma" => EditAction::Gamma {
            value: number(obj, "value")?,
        },
        "blur" => EditAction::Blur {
            value: number(obj, "value")?,
        },
        "sharpen" => EditAction::Sharpen {
            value: number(obj, "value")?,
        },
        "speed" => EditAction::Speed {
            value: number(obj, "value")?,
        },
        "rotate" => EditAction::Rotate {
            value: number(obj, "value")?,
        },
        "flip" => EditAction::Flip {
            direction: direction(obj)?,
        },
        "crop" => EditAction::Crop {
            x: pixels(obj, "x")?,
            y: pixels(obj, "y")?,
            width: pixels(obj, "width")?,
            height: pixels(obj, "height")?,
        },
        "scale" => EditAction::Scale {
            width: pixels(obj, "width")?,
            height: pixels(obj, "height")?,
        },
        "volume" => EditAction::Volume {
            value: number(obj, "value")?,
        },
        other => {
            return Err(InvalidAction::new(
                "action",
                format!("unknown action `{}`", other),
            ))
        }
    };

    action.validated()
}

fn number(obj: &Map<String, Value>, field: &str) -> Result<f64, InvalidAction> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(InvalidAction::new(field, "missing")),
        Some(v) => v
            .as_f64()
            .ok_or_else(|| InvalidAction::new(field, "must be a number")),
    }
}

fn pixels(obj: &Map<String, Value>, field: &str) -> Result<u32, InvalidAction> {
    let v = number(obj, field)?;
    if v < 0.0 {
        return Err(InvalidAction::new(field, "must not be negative"));
    }
    if v.fract() != 0.0 {
        return Err(InvalidAction::new(field, "must be a whole number of pixels"));
    }
    if v > u32::MAX as f64 {
        return Err(InvalidAction::new(field, "too large"));
    }
    Ok(v as u32)
}

fn direction(obj: &Map<String, Value>) -> Result<FlipDirection, InvalidAction> {
    let raw = match obj.get("direction") {
        None | Some(Value::Null) => return Err(InvalidAction::new("direction", "missing")),
        Some(Value::String(s)) => s,
        Some(_) => return Err(InvalidAction::new("direction", "must be a string")),
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "horizontal" => Ok(FlipDirection::Horizontal),
        "vertical" => Ok(FlipDirection::Vertical),
        _ => Err(InvalidAction::new(
            "direction",
            "must be \"horizontal\" or \"vertical\"",
        )),
    }
}

fn check_finite(field: &str, v: f64) -> Result<(), InvalidAction> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(InvalidAction::new(field, "must be a finite number"))
    }
}

fn check_range(field: &str, v: f64, min: f64, max: f64) -> Result<(), InvalidAction> {
    if (min..=max).contains(&v) {
        Ok(())
    } else {
        Err(InvalidAction::new(
            field,
            format!("must be between {} and {}", min, max),
        ))
    }
}

/// An ordered list of validated actions. Order is execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditCommand {
    pub actions: Vec<EditAction>,
}

impl EditCommand {
    pub fn new(actions: Vec<EditAction>) -> Self {
        Self { actions }
    }

    /// An empty command leaves the video unchanged.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Action names in order, for logging.
    pub fn names(&self) -> Vec<&'static str> {
        self.actions.iter().map(EditAction::name).collect()
    }
}
