//! Keyword classifier that turns a free-text request into an enriched
//! instruction for the provider.
//!
//! Rules are evaluated in declaration order and the first match wins, so a
//! prompt mentioning both "fly" and "speed" is always a movement boost.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    MovementBoost,
    VisibilityOverlay,
    CollisionBypass,
    SpeedModifier,
    AutoTargeting,
}

impl Category {
    /// Stable marker embedded in the enriched instruction.
    pub fn marker(self) -> &'static str {
        match self {
            Self::MovementBoost => "movement-boost",
            Self::VisibilityOverlay => "visibility-overlay",
            Self::CollisionBypass => "collision-bypass",
            Self::SpeedModifier => "speed-modifier",
            Self::AutoTargeting => "auto-targeting",
        }
    }
}

struct CategoryRule {
    category: Category,
    keywords: &'static [&'static str],
    title: &'static str,
    hint: &'static str,
}

const RULES: [CategoryRule; 5] = [
    CategoryRule {
        category: Category::MovementBoost,
        keywords: &["fly", "voar", "voo"],
        title: "free-flight movement",
        hint: "drive the character root with a BodyVelocity and map WASD plus Space/Shift to direction",
    },
    CategoryRule {
        category: Category::VisibilityOverlay,
        keywords: &["esp", "highlight", "ver jogador"],
        title: "player visibility overlay",
        hint: "attach Highlight instances to other characters and colour them by team",
    },
    CategoryRule {
        category: Category::CollisionBypass,
        keywords: &["noclip", "fantasma", "atraves"],
        title: "collision bypass",
        hint: "set CanCollide = false on the character's parts every physics step while enabled",
    },
    CategoryRule {
        category: Category::SpeedModifier,
        keywords: &["speed", "velocidade", "rapido"],
        title: "walk speed modifier",
        hint: "adjust Humanoid.WalkSpeed and restore the original value when disabled",
    },
    CategoryRule {
        category: Category::AutoTargeting,
        keywords: &["aimbot", "mira", "auto aim"],
        title: "automatic camera targeting",
        hint: "turn the camera CFrame toward the nearest target with smoothing",
    },
];

/// Outcome of classifying one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Option<Category>,
    pub instruction: String,
}

/// Classify `raw_prompt` and return the category (if any) with its
/// instruction. Never fails; unmatched input takes the generic wrapper.
pub fn classify_detailed(raw_prompt: &str) -> Classification {
    let prompt = raw_prompt.trim().to_lowercase();

    let matched = RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| prompt.contains(kw)));

    match matched {
        Some(rule) => Classification {
            category: Some(rule.category),
            instruction: format!(
                "[category: {marker}] Write a {title} script for Roblox that does: {prompt}. \
                 Implementation hint: {hint}.",
                marker = rule.category.marker(),
                title = rule.title,
                hint = rule.hint,
            ),
        },
        None => Classification {
            category: None,
            instruction: format!(
                "[category: generic] Write a working Luau script for Roblox with these characteristics: {prompt}"
            ),
        },
    }
}

/// Enriched instruction for `raw_prompt`.
pub fn classify(raw_prompt: &str) -> String {
    classify_detailed(raw_prompt).instruction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fly_prompt_is_movement_boost() {
        let instruction = classify("give me a fly script");
        assert!(instruction.contains("movement-boost"));
        assert!(instruction.contains("give me a fly script"));
    }

    #[test]
    fn unrelated_prompt_takes_generic_wrapper() {
        let result = classify_detailed("random unrelated text");
        assert_eq!(result.category, None);
        assert!(result.instruction.contains("[category: generic]"));
        assert!(result.instruction.contains("random unrelated text"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let result = classify_detailed("NOCLIP through walls");
        assert_eq!(result.category, Some(Category::CollisionBypass));
        assert!(result.instruction.contains("noclip through walls"));
    }

    #[test]
    fn first_matching_rule_wins() {
        // "fly" precedes "speed" in rule order.
        let result = classify_detailed("speed boost while I fly");
        assert_eq!(result.category, Some(Category::MovementBoost));

        // "esp" precedes "aimbot".
        let result = classify_detailed("aimbot with esp");
        assert_eq!(result.category, Some(Category::VisibilityOverlay));
    }

    #[test]
    fn each_category_is_reachable() {
        let cases = [
            ("quero voar", Category::MovementBoost),
            ("highlight players", Category::VisibilityOverlay),
            ("modo fantasma", Category::CollisionBypass),
            ("more velocidade", Category::SpeedModifier),
            ("auto aim helper", Category::AutoTargeting),
        ];
        for (prompt, expected) in cases {
            assert_eq!(classify_detailed(prompt).category, Some(expected), "{prompt}");
            assert!(classify(prompt).contains(expected.marker()));
        }
    }

    #[test]
    fn category_serializes_as_marker() {
        let json = serde_json::to_string(&Category::AutoTargeting).unwrap();
        assert_eq!(json, "\"auto-targeting\"");
    }
}
