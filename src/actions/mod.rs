//! Action schema - the closed set of typed edit actions
//!
//! Wire format matches the intent-parser contract: a tagged JSON object per
//! action, `{"type": "trim", "start": 0, "end": 10}`. Adding a variant here
//! forces every consuming site (validation, compilation, translation, tests)
//! to handle it through exhaustive matching.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, Warning};

/// Text overlay placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextPosition {
    Top,
    Bottom,
    #[default]
    Center,
}

/// Fade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeKind {
    In,
    Out,
}

/// Supported output aspect ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatioKind {
    #[serde(rename = "9:16")]
    Vertical,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatioKind {
    /// Width/height as a rational pair
    pub fn as_fraction(&self) -> (u32, u32) {
        match self {
            AspectRatioKind::Vertical => (9, 16),
            AspectRatioKind::Square => (1, 1),
        }
    }
}

/// How to reach the target aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropStrategy {
    #[default]
    Center,
    Pad,
}

fn default_fade_duration() -> f64 {
    1.0
}

fn default_music_volume() -> f64 {
    0.3
}

/// One declarative edit instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditAction {
    Trim {
        start: f64,
        end: f64,
    },
    Speed {
        // the original parser emitted "value" for the factor
        #[serde(alias = "value")]
        factor: f64,
    },
    Filter {
        name: String,
    },
    AddText {
        content: String,
        #[serde(default)]
        position: TextPosition,
    },
    Fade {
        kind: FadeKind,
        #[serde(default = "default_fade_duration")]
        duration: f64,
    },
    AddMusic {
        track: String,
        #[serde(default = "default_music_volume")]
        volume: f64,
    },
    AutoSubtitles,
    AspectRatio {
        ratio: AspectRatioKind,
        #[serde(default)]
        strategy: CropStrategy,
    },
    RemoveSilence {
        // unset fields fall back to the configured defaults at orchestration
        #[serde(default, alias = "threshold")]
        threshold_db: Option<f64>,
        #[serde(default)]
        min_duration: Option<f64>,
    },
}

impl EditAction {
    /// Validate field constraints beyond what deserialization enforces
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            EditAction::Trim { start, end } => {
                if *start < 0.0 || start >= end {
                    return Err(ValidationError::InvalidTrimRange {
                        start: *start,
                        end: *end,
                    });
                }
            }
            EditAction::Speed { factor } => {
                if *factor <= 0.0 || !factor.is_finite() {
                    return Err(ValidationError::NonPositiveSpeed { factor: *factor });
                }
            }
            EditAction::AddText { content, .. } => {
                if content.trim().is_empty() {
                    return Err(ValidationError::EmptyText);
                }
            }
            EditAction::Fade { duration, .. } => {
                if *duration <= 0.0 {
                    return Err(ValidationError::NonPositiveFade {
                        duration: *duration,
                    });
                }
            }
            EditAction::AddMusic { volume, .. } => {
                if *volume <= 0.0 || *volume > 1.0 {
                    return Err(ValidationError::VolumeOutOfRange { volume: *volume });
                }
            }
            EditAction::RemoveSilence { min_duration, .. } => {
                if let Some(min_duration) = min_duration {
                    if *min_duration <= 0.0 {
                        return Err(ValidationError::Malformed {
                            action: "remove_silence".to_string(),
                            detail: format!("min_duration {} must be > 0", min_duration),
                        });
                    }
                }
            }
            EditAction::Filter { .. }
            | EditAction::AutoSubtitles
            | EditAction::AspectRatio { .. } => {}
        }
        Ok(())
    }

    /// The wire tag for this variant
    pub fn type_tag(&self) -> &'static str {
        match self {
            EditAction::Trim { .. } => "trim",
            EditAction::Speed { .. } => "speed",
            EditAction::Filter { .. } => "filter",
            EditAction::AddText { .. } => "add_text",
            EditAction::Fade { .. } => "fade",
            EditAction::AddMusic { .. } => "add_music",
            EditAction::AutoSubtitles => "auto_subtitles",
            EditAction::AspectRatio { .. } => "aspect_ratio",
            EditAction::RemoveSilence { .. } => "remove_silence",
        }
    }
}

/// Action types whose malformed variants reject the whole request
const STRUCTURAL_TAGS: &[&str] = &["trim", "speed"];

/// Parse and validate a raw action list from the intent parser.
///
/// Structurally required actions (trim, speed) that fail deserialization or
/// validation reject the whole request. Every other malformed or unknown
/// action is dropped with a [`Warning::ActionSkipped`] so evolving parser
/// vocabularies never break the pipeline.
pub fn parse_actions(
    raw: &[serde_json::Value],
) -> Result<(Vec<EditAction>, Vec<Warning>), ValidationError> {
    let mut actions = Vec::with_capacity(raw.len());
    let mut warnings = Vec::new();

    for value in raw {
        let tag = value
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .to_string();

        let parsed = serde_json::from_value::<EditAction>(value.clone());
        let action = match parsed {
            Ok(action) => action,
            Err(err) => {
                if STRUCTURAL_TAGS.contains(&tag.as_str()) {
                    return Err(ValidationError::Malformed {
                        action: tag,
                        detail: err.to_string(),
                    });
                }
                warnings.push(Warning::ActionSkipped {
                    reason: if tag.is_empty() {
                        format!("missing type tag: {}", err)
                    } else {
                        format!("{}: {}", tag, err)
                    },
                });
                continue;
            }
        };

        match action.validate() {
            Ok(()) => actions.push(action),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => warnings.push(Warning::ActionSkipped {
                reason: err.to_string(),
            }),
        }
    }

    Ok((actions, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trim_round_trips_through_wire_format() {
        let action: EditAction =
            serde_json::from_value(json!({"type": "trim", "start": 1.5, "end": 8.0})).unwrap();
        assert_eq!(
            action,
            EditAction::Trim {
                start: 1.5,
                end: 8.0
            }
        );
    }

    #[test]
    fn speed_accepts_value_alias() {
        let action: EditAction =
            serde_json::from_value(json!({"type": "speed", "value": 1.5})).unwrap();
        assert_eq!(action, EditAction::Speed { factor: 1.5 });
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let text: EditAction =
            serde_json::from_value(json!({"type": "add_text", "content": "hello"})).unwrap();
        assert_eq!(
            text,
            EditAction::AddText {
                content: "hello".to_string(),
                position: TextPosition::Center
            }
        );

        let music: EditAction =
            serde_json::from_value(json!({"type": "add_music", "track": "horror_1.mp3"})).unwrap();
        assert_eq!(
            music,
            EditAction::AddMusic {
                track: "horror_1.mp3".to_string(),
                volume: 0.3
            }
        );

        let silence: EditAction =
            serde_json::from_value(json!({"type": "remove_silence"})).unwrap();
        assert_eq!(
            silence,
            EditAction::RemoveSilence {
                threshold_db: None,
                min_duration: None
            }
        );
    }

    #[test]
    fn remove_silence_accepts_threshold_alias() {
        let action: EditAction =
            serde_json::from_value(json!({"type": "remove_silence", "threshold": -25.0})).unwrap();
        assert_eq!(
            action,
            EditAction::RemoveSilence {
                threshold_db: Some(-25.0),
                min_duration: None
            }
        );
    }

    #[test]
    fn inverted_trim_rejects_whole_request() {
        let raw = vec![
            json!({"type": "filter", "name": "grayscale"}),
            json!({"type": "trim", "start": 5.0, "end": 2.0}),
        ];
        let err = parse_actions(&raw).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidTrimRange {
                start: 5.0,
                end: 2.0
            }
        );
    }

    #[test]
    fn trim_missing_end_rejects_whole_request() {
        let raw = vec![json!({"type": "trim", "start": 5.0})];
        assert!(matches!(
            parse_actions(&raw).unwrap_err(),
            ValidationError::Malformed { action, .. } if action == "trim"
        ));
    }

    #[test]
    fn non_positive_speed_is_fatal() {
        let raw = vec![json!({"type": "speed", "factor": 0.0})];
        assert!(matches!(
            parse_actions(&raw).unwrap_err(),
            ValidationError::NonPositiveSpeed { .. }
        ));
    }

    #[test]
    fn malformed_non_structural_action_is_skipped_with_warning() {
        let raw = vec![
            json!({"type": "add_music", "track": "horror_1.mp3", "volume": 1.5}),
            json!({"type": "filter", "name": "grayscale"}),
        ];
        let (actions, warnings) = parse_actions(&raw).unwrap();
        assert_eq!(
            actions,
            vec![EditAction::Filter {
                name: "grayscale".to_string()
            }]
        );
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], Warning::ActionSkipped { .. }));
    }

    #[test]
    fn unknown_action_type_is_skipped_not_fatal() {
        let raw = vec![json!({"type": "hologram"}), json!({"type": "auto_subtitles"})];
        let (actions, warnings) = parse_actions(&raw).unwrap();
        assert_eq!(actions, vec![EditAction::AutoSubtitles]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn aspect_ratio_parses_rational_names() {
        let action: EditAction =
            serde_json::from_value(json!({"type": "aspect_ratio", "ratio": "9:16"})).unwrap();
        assert_eq!(
            action,
            EditAction::AspectRatio {
                ratio: AspectRatioKind::Vertical,
                strategy: CropStrategy::Center
            }
        );
    }
}
