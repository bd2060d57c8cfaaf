use once_cell::sync::Lazy;
use regex::Regex;

use crate::series::{PartMarker, SeriesDetector};

const SEPARATORS: &[char] = &[':', '-', '–', '—', '|', ',', '.'];

static PART_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // "Title (Part 2)", "Title [Part 2 of 4]", "Title (Pt. 2/4)"
        r"(?i)^(?P<base>.+?)[\s:,|\-–—]*[\(\[]\s*(?:part|pt\.?)\s*(?P<part>[0-9]+)(?:\s*(?:/|of)\s*(?P<total>[0-9]+))?\s*[\)\]]\s*$",
        // "Title (2/4)"
        r"(?i)^(?P<base>.+?)[\s:,|\-–—]*[\(\[]\s*(?P<part>[0-9]+)\s*/\s*(?P<total>[0-9]+)\s*[\)\]]\s*$",
        // "Title - Part 2", "Title: Part 2 of 4"
        r"(?i)^(?P<base>.+?)[\s:,|\-–—]+(?:part|pt\.?)\s*(?P<part>[0-9]+)(?:\s*(?:/|of)\s*(?P<total>[0-9]+))?\s*$",
        // "Part 2: Title"
        r"(?i)^(?:part|pt\.?)\s*(?P<part>[0-9]+)(?:\s*(?:/|of)\s*(?P<total>[0-9]+))?\s*[:|\-–—]\s*(?P<base>.+)$",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Recognizes explicit "part" markers in titles. Titles sharing a prefix with a bare
/// trailing number ("Rust Tips 3") are not treated as series.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartPatternDetector;

impl SeriesDetector for PartPatternDetector {
    fn detect(&self, title: &str) -> Option<PartMarker> {
        let title = title.trim();
        PART_PATTERNS.iter().find_map(|pattern| {
            let captures = pattern.captures(title)?;
            let base_title = clean_base(captures.name("base")?.as_str());
            let part_number: u32 = captures.name("part")?.as_str().parse().ok()?;
            if base_title.is_empty() || part_number == 0 {
                return None;
            }
            let declared_total = captures
                .name("total")
                .and_then(|total| total.as_str().parse::<u32>().ok())
                .filter(|total| *total >= part_number);
            Some(PartMarker {
                base_title,
                part_number,
                declared_total,
            })
        })
    }
}

fn clean_base(base: &str) -> String {
    base.trim()
        .trim_end_matches(|ch: char| ch.is_whitespace() || SEPARATORS.contains(&ch))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(title: &str) -> Option<(String, u32, Option<u32>)> {
        PartPatternDetector
            .detect(title)
            .map(|marker| (marker.base_title, marker.part_number, marker.declared_total))
    }

    #[test]
    fn detects_bracketed_parts() {
        assert_eq!(detect("Intro to X (Part 1)"), Some(("Intro to X".to_string(), 1, None)));
        assert_eq!(
            detect("Intro to X [Part 2 of 3]"),
            Some(("Intro to X".to_string(), 2, Some(3)))
        );
        assert_eq!(detect("Intro to X (2/4)"), Some(("Intro to X".to_string(), 2, Some(4))));
    }

    #[test]
    fn detects_trailing_and_leading_parts() {
        assert_eq!(
            detect("Building a CLI - Part 3"),
            Some(("Building a CLI".to_string(), 3, None))
        );
        assert_eq!(
            detect("Building a CLI: Pt. 4"),
            Some(("Building a CLI".to_string(), 4, None))
        );
        assert_eq!(
            detect("Part 1: Building a CLI"),
            Some(("Building a CLI".to_string(), 1, None))
        );
    }

    #[test]
    fn ignores_titles_without_markers() {
        assert_eq!(detect("Intro to Y"), None);
        assert_eq!(detect("Top 10 Rust crates"), None);
        assert_eq!(detect("The counterpart 2"), None);
        assert_eq!(detect("Intro (Part 0)"), None);
    }

    #[test]
    fn drops_declared_total_smaller_than_part() {
        assert_eq!(detect("Intro (Part 5 of 3)"), Some(("Intro".to_string(), 5, None)));
    }
}
