//! Filename heuristics.
//!
//! Season/episode/quality extraction is a linear scan over a fixed, ordered
//! list of regular expressions; the first pattern that matches wins. This is
//! deliberately not a parser - release names are too messy for one.

use once_cell::sync::Lazy;
use regex::Regex;

/// Values pulled out of an uploaded file name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extracted {
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Canonical quality token ("1080p", "WEB-DL", ...).
    pub quality: Option<String>,
    /// File name with tags, season/episode/quality tokens and separators
    /// stripped; best-effort show title.
    pub title: String,
}

/// Season + episode patterns, tried in order. Two capture groups.
static SEASON_EPISODE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // S01E02, S01 E02, S01-E02, S01.E02
        r"(?i)\bS(\d{1,2})[\s._-]*E(\d{1,3})\b",
        // Season 1 Episode 2
        r"(?i)\bSeason[\s._-]*(\d{1,2})[\s._-]*Episode[\s._-]*(\d{1,3})\b",
        // 1x02
        r"(?i)\b(\d{1,2})x(\d{2,3})\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

/// Episode-only patterns, tried when no season pattern matched. One group.
static EPISODE_ONLY: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // E02, EP02, Episode 02 (anime numbering goes past 1000)
        r"(?i)\b(?:EP?|Episode)[\s._-]*(\d{1,4})\b",
        // trailing " - 02"
        r"[\s._-]-?[\s._-]*(\d{1,3})$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

/// Quality patterns with their canonical token. First match wins.
static QUALITY: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)\b2160p?\b", "2160p"),
        (r"(?i)\b1440p?\b", "1440p"),
        (r"(?i)\b1080p?\b", "1080p"),
        (r"(?i)\b720p?\b", "720p"),
        (r"(?i)\b480p?\b", "480p"),
        (r"(?i)\b360p?\b", "360p"),
        (r"(?i)\b4k\b", "2160p"),
        (r"(?i)\b2k\b", "1440p"),
        (r"(?i)\bHDRip\b", "HDRip"),
        (r"(?i)\bHDTV\b", "HDTV"),
        (r"(?i)\bWEB[\s._-]?DL\b", "WEB-DL"),
        (r"(?i)\bBluRay\b", "BluRay"),
    ]
    .iter()
    .map(|(p, canon)| (Regex::new(p).expect("static regex"), *canon))
    .collect()
});

/// Bracketed release-group tags: [Group], (Group).
static BRACKETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]|\([^)]*\)").expect("static regex"));

/// Separator runs collapsed into single spaces for the title.
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s._-]+").expect("static regex"));

/// Extract season, episode and quality from a file name.
pub fn extract(file_name: &str) -> Extracted {
    let stem = strip_extension(file_name);

    let mut extracted = Extracted::default();
    let mut matched_span: Option<(usize, usize)> = None;

    for re in SEASON_EPISODE.iter() {
        if let Some(caps) = re.captures(stem) {
            extracted.season = caps.get(1).and_then(|m| m.as_str().parse().ok());
            extracted.episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
            let whole = caps.get(0).expect("group 0");
            matched_span = Some((whole.start(), whole.end()));
            break;
        }
    }

    if extracted.episode.is_none() {
        for re in EPISODE_ONLY.iter() {
            if let Some(caps) = re.captures(stem) {
                extracted.episode = caps.get(1).and_then(|m| m.as_str().parse().ok());
                let whole = caps.get(0).expect("group 0");
                matched_span = Some((whole.start(), whole.end()));
                break;
            }
        }
    }

    let mut quality_span: Option<(usize, usize)> = None;
    for (re, canon) in QUALITY.iter() {
        if let Some(m) = re.find(stem) {
            extracted.quality = Some((*canon).to_string());
            quality_span = Some((m.start(), m.end()));
            break;
        }
    }

    extracted.title = clean_title(stem, matched_span, quality_span);
    extracted
}

/// Substitute `{season}`, `{episode}`, `{quality}` and `{title}` in a
/// user template.
///
/// Season and episode are zero-padded to two digits; a missing value becomes
/// an empty string. A missing quality falls back to `HD` so templates that
/// ask for it never keep the raw token.
pub fn render_template(template: &str, extracted: &Extracted) -> String {
    let season = extracted
        .season
        .map(|s| format!("{:02}", s))
        .unwrap_or_default();
    let episode = extracted
        .episode
        .map(|e| format!("{:02}", e))
        .unwrap_or_default();
    let quality = extracted.quality.as_deref().unwrap_or("HD");

    template
        .replace("{season}", &season)
        .replace("{episode}", &episode)
        .replace("{quality}", quality)
        .replace("{title}", &extracted.title)
        .trim()
        .to_string()
}

/// Substitute `{filename}`, `{filesize}` and `{duration}` in a caption
/// template.
pub fn render_caption(template: &str, file_name: &str, size: &str, duration: &str) -> String {
    template
        .replace("{filename}", file_name)
        .replace("{filesize}", size)
        .replace("{duration}", duration)
}

/// The extension of a file name including the dot, or "" when absent.
pub fn extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        // A leading dot is a hidden file, not an extension
        Some(idx) if idx > 0 && idx + 1 < file_name.len() => &file_name[idx..],
        _ => "",
    }
}

fn strip_extension(file_name: &str) -> &str {
    let ext = extension(file_name);
    &file_name[..file_name.len() - ext.len()]
}

fn clean_title(
    stem: &str,
    matched_span: Option<(usize, usize)>,
    quality_span: Option<(usize, usize)>,
) -> String {
    // Blank out the matched spans before cleaning so byte offsets stay valid
    let mut chars: Vec<char> = Vec::with_capacity(stem.len());
    let mut blank = vec![false; stem.len()];
    for (start, end) in [matched_span, quality_span].into_iter().flatten() {
        for flag in &mut blank[start..end] {
            *flag = true;
        }
    }
    for (i, c) in stem.char_indices() {
        chars.push(if blank[i] { ' ' } else { c });
    }

    let without_spans: String = chars.into_iter().collect();
    let without_tags = BRACKETS.replace_all(&without_spans, " ");
    SEPARATORS
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_sxxexx() {
        let e = extract("[SubsPlease] Frieren S01E12 1080p.mkv");
        assert_eq!(e.season, Some(1));
        assert_eq!(e.episode, Some(12));
        assert_eq!(e.quality.as_deref(), Some("1080p"));
        assert_eq!(e.title, "Frieren");
    }

    #[test]
    fn test_separated_season_episode() {
        let e = extract("Breaking.Bad.S05-E14.720p.WEB-DL.mp4");
        assert_eq!(e.season, Some(5));
        assert_eq!(e.episode, Some(14));
        // 720p appears before WEB-DL in the pattern order
        assert_eq!(e.quality.as_deref(), Some("720p"));
    }

    #[test]
    fn test_verbose_season_episode() {
        let e = extract("Show Season 2 Episode 7 480p.mkv");
        assert_eq!(e.season, Some(2));
        assert_eq!(e.episode, Some(7));
        assert_eq!(e.quality.as_deref(), Some("480p"));
    }

    #[test]
    fn test_cross_notation() {
        let e = extract("archer.3x09.hdtv.mkv");
        assert_eq!(e.season, Some(3));
        assert_eq!(e.episode, Some(9));
        assert_eq!(e.quality.as_deref(), Some("HDTV"));
    }

    #[test]
    fn test_episode_only() {
        let e = extract("One Piece EP1071 [1080p].mkv");
        assert_eq!(e.season, None);
        assert_eq!(e.episode, Some(1071));
        assert_eq!(e.quality.as_deref(), Some("1080p"));
    }

    #[test]
    fn test_trailing_number() {
        let e = extract("Vinland Saga - 07.mkv");
        assert_eq!(e.season, None);
        assert_eq!(e.episode, Some(7));
        assert_eq!(e.quality, None);
        assert_eq!(e.title, "Vinland Saga");
    }

    #[test]
    fn test_first_match_wins_over_later_patterns() {
        // Contains both S01E02 and a trailing number; the ordered list
        // must stop at the first (SxxExx) pattern.
        let e = extract("Show S01E02 v2.mkv");
        assert_eq!(e.season, Some(1));
        assert_eq!(e.episode, Some(2));
    }

    #[test]
    fn test_4k_maps_to_2160p() {
        let e = extract("Movie.4K.BluRay.mkv");
        assert_eq!(e.quality.as_deref(), Some("2160p"));
    }

    #[test]
    fn test_no_match_at_all() {
        let e = extract("random_notes.txt");
        assert_eq!(e.season, None);
        assert_eq!(e.episode, None);
        assert_eq!(e.quality, None);
    }

    #[test]
    fn test_render_template_full() {
        let e = extract("[Grp] Frieren S01E12 1080p.mkv");
        let out = render_template("Frieren S{season}E{episode} [{quality}]", &e);
        assert_eq!(out, "Frieren S01E12 [1080p]");
    }

    #[test]
    fn test_render_template_quality_fallback() {
        let e = extract("Show - 03.mkv");
        let out = render_template("Show E{episode} {quality}", &e);
        assert_eq!(out, "Show E03 HD");
    }

    #[test]
    fn test_render_template_missing_values_blank() {
        let e = extract("plainfile.mkv");
        let out = render_template("X{season}Y{episode}", &e);
        assert_eq!(out, "XY");
    }

    #[test]
    fn test_render_caption() {
        let out = render_caption(
            "{filename} | {filesize} | {duration}",
            "a.mkv",
            "1.40 GB",
            "23:59",
        );
        assert_eq!(out, "a.mkv | 1.40 GB | 23:59");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("a.mkv"), ".mkv");
        assert_eq!(extension("archive.tar.gz"), ".gz");
        assert_eq!(extension("noext"), "");
        assert_eq!(extension(".hidden"), "");
    }
}
