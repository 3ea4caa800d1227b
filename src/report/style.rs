//! Shared colors, font sizes and layout metrics

use super::document::Rgb;

// ============================================================================
// Color Constants (RGB 0-255)
// ============================================================================

pub const COLOR_PRIMARY: Rgb = (30, 64, 175);          // Deep blue for titles and headers
pub const COLOR_INCREASE: Rgb = (220, 38, 38);         // Red
pub const COLOR_REDUCTION: Rgb = (5, 150, 105);        // Green
pub const COLOR_NEUTRAL: Rgb = (107, 114, 128);        // Gray
pub const COLOR_GOOD: Rgb = (5, 150, 105);
pub const COLOR_BAD: Rgb = (220, 38, 38);
pub const COLOR_BLACK: Rgb = (0, 0, 0);
pub const COLOR_WHITE: Rgb = (255, 255, 255);
pub const COLOR_GRAY: Rgb = (128, 128, 128);
pub const COLOR_LIGHT_GRAY: Rgb = (220, 220, 220);
pub const COLOR_ZEBRA: Rgb = (243, 244, 246);
pub const COLOR_BOX_FILL: Rgb = (248, 250, 252);
pub const COLOR_OBSERVATIONS_FILL: Rgb = (219, 234, 254); // Light blue
pub const COLOR_RECOMMENDATIONS_FILL: Rgb = (209, 250, 229); // Light green

// ============================================================================
// Metrics (millimetres unless noted)
// ============================================================================

pub const PT_TO_MM: f32 = 0.352_777_8;

/// Average Helvetica glyph advance as a fraction of the font size
const AVG_GLYPH_WIDTH_EM: f32 = 0.52;

pub const HEADING_HEIGHT: f32 = 10.0;
pub const HEADING_SIZE: f32 = 13.0;
pub const SECTION_GAP: f32 = 6.0;
pub const DIVIDER_ADVANCE: f32 = 4.0;

/// Estimated rendered width of `text` at `size_pt`, in millimetres
pub fn text_width_mm(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * size_pt * AVG_GLYPH_WIDTH_EM * PT_TO_MM
}

/// Baseline-to-baseline distance for body text
pub fn line_height_mm(size_pt: f32) -> f32 {
    size_pt * PT_TO_MM * 1.5
}

/// Wrap text greedily on whitespace to `max_width_mm`.
///
/// Words longer than a whole line are split at character boundaries.
pub fn wrap_text(text: &str, size_pt: f32, max_width_mm: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width_mm(&candidate, size_pt) <= max_width_mm {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if text_width_mm(word, size_pt) <= max_width_mm {
            current = word.to_string();
            continue;
        }

        // Hard-split an over-long word
        for ch in word.chars() {
            current.push(ch);
            if text_width_mm(&current, size_pt) > max_width_mm && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Cut `text` to at most `budget` characters, ending in "..." when shortened
pub fn truncate_chars(text: &str, budget: usize) -> String {
    let count = text.chars().count();
    if count <= budget {
        return text.to_string();
    }
    if budget <= 3 {
        return ".".repeat(budget);
    }
    let kept: String = text.chars().take(budget - 3).collect();
    format!("{}...", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_width() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(10);
        let lines = wrap_text(&text, 10.0, 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width_mm(line, 10.0) <= 60.0, "line too wide: {}", line);
        }
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let word = "x".repeat(200);
        let lines = wrap_text(&word, 10.0, 30.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap_text("   ", 10.0, 50.0).is_empty());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("a fairly long note", 10), "a fairl...");
        assert_eq!(truncate_chars("abcdef", 3), "...");
    }
}
