//! Fixed system instructions sent to the oracle.
//!
//! Presets here are guidance for the model only. Nothing enforces them; the
//! validated oracle output is what gets rendered.

/// Stock phrases and the action bundle the oracle is nudged toward.
pub const PRESETS: &[(&str, &str)] = &[
    (
        "professional edit / make it better",
        "brightness +10, adjust_contrast +8, saturation +12, sharpen 3",
    ),
    ("cinematic", "adjust_contrast +15, saturation +20, gamma +5"),
    ("fix dark video", "brightness +25, gamma +10"),
    ("enhance colors", "saturation +20, adjust_contrast +10"),
    ("remove shaky", "blur 2"),
    (
        "social media ready",
        "scale to 1080x1080, brightness +5, adjust_contrast +8",
    ),
];

const ACTIONS: &str = r#"AVAILABLE ACTIONS:
- trim: keep the first N seconds ({"action": "trim", "value": 30}); value > 0
- cut_section: remove a section ({"action": "cut_section", "start_time": 30, "end_time": 45}); 0 <= start_time < end_time
- adjust_contrast: value -100 to 100
- brightness: value -100 to 100 (negative darker, positive brighter)
- saturation: value -100 to 100
- hue: value -180 to 180 degrees
- gamma: value -100 to 100
- blur: value 1 to 10 (radius)
- sharpen: value 1 to 20 (intensity)
- speed: value 0.1 to 4.0 (1.0 is normal speed)
- rotate: value 0 to 360 degrees
- flip: {"action": "flip", "direction": "horizontal"} or "vertical"
- crop: {"action": "crop", "x": 0, "y": 0, "width": 1280, "height": 720}; whole pixels, all >= 0
- scale: {"action": "scale", "width": 1920, "height": 1080}; whole pixels, all > 0
- volume: value -20 to 20 dB"#;

const OUTPUT_FORMAT: &str = r#"OUTPUT FORMAT (a single JSON object, nothing else):
{
  "actions": [
    {"action": "brightness", "value": 10},
    {"action": "cut_section", "start_time": 30, "end_time": 45}
  ],
  "reasoning": "short explanation of the chosen edits",
  "suggestions": ["optional follow-up ideas"]
}
Actions run in the order listed. Use only the actions above with parameters in range.
If the user names specific tools, use exactly those. If nothing applies, return an empty "actions" array."#;

/// The complete system message.
pub fn system_instructions() -> String {
    let presets = PRESETS
        .iter()
        .map(|(phrase, bundle)| format!("- \"{}\": {}", phrase, bundle))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a video editing assistant. Turn the user's request into a list of editing actions \
         and answer with a JSON object.\n\n{}\n\nPRESETS:\n{}\n\n{}",
        ACTIONS, presets, OUTPUT_FORMAT
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidprompt_core::ACTION_NAMES;

    #[test]
    fn test_mentions_every_action() {
        let text = system_instructions();
        for name in ACTION_NAMES {
            assert!(text.contains(&format!("- {}:", name)), "missing {}", name);
        }
    }

    #[test]
    fn test_mentions_presets_and_format() {
        let text = system_instructions();
        assert!(text.contains("fix dark video"));
        assert!(text.contains("cinematic"));
        assert!(text.contains("\"actions\""));
    }
}
