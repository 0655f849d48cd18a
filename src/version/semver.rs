use std::cmp::Ordering;

use semver::{Prerelease, Version};

/// Parse a game version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1.20" by padding with zeros, and turns a
/// `-suffix` into a pre-release. Anything that does not fit (week snapshots,
/// branch names, empty strings) parses to `0.0.0`, so callers can always sort.
///
/// Examples:
/// - "1.20" -> Version(1, 20, 0)
/// - "1.20.4" -> Version(1, 20, 4)
/// - "1.20.5-rc1" -> Version(1, 20, 5, pre: rc1)
/// - "23w13a" -> Version(0, 0, 0)
pub fn parse_game_version(version: &str) -> Version {
    try_parse_game_version(version).unwrap_or_else(|| Version::new(0, 0, 0))
}

fn try_parse_game_version(version: &str) -> Option<Version> {
    let version = version.trim();
    let (release, pre) = match version.split_once('-') {
        Some((release, pre)) => (release, Some(pre)),
        None => (version, None),
    };

    let parts = release
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let mut parsed = Version::new(
        parts[0],
        parts.get(1).copied().unwrap_or(0),
        parts.get(2).copied().unwrap_or(0),
    );
    if let Some(pre) = pre {
        parsed.pre = Prerelease::new(pre).ok()?;
    }
    Some(parsed)
}

/// Total order over game version strings: parsed value first, raw string second
pub fn compare_game_versions(a: &str, b: &str) -> Ordering {
    parse_game_version(a)
        .cmp(&parse_game_version(b))
        .then_with(|| a.cmp(b))
}

/// Deduplicate and sort versions newest first
pub fn sort_versions_desc<I>(versions: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut versions: Vec<String> = versions.into_iter().collect();
    versions.sort_by(|a, b| compare_game_versions(b, a));
    versions.dedup();
    versions
}

/// Whether a version string names a development snapshot rather than a release
pub fn is_snapshot(version: &str) -> bool {
    version.contains('w') || version.to_ascii_lowercase().contains("snapshot")
}
