use super::types::OwnerId;

/// Punctuation stripped from owner tokens before anything else.
const STRAY_CHARS: &[char] = &[
    '<', '>', '(', ')', '[', ']', '{', '}', ',', ';', '+', '*', '?', '=',
];

/// Normalize a raw owner token (`@Alice`, `@acme/Platform-Team`, ...) into an [`OwnerId`].
///
/// Stray punctuation is removed, a leading `@` is stripped, only the segment
/// after the last `/` is kept (so `@org/team` keys on the team slug) and the
/// result is lowercased. Returns `None` when nothing is left.
pub fn normalize_owner(raw: &str) -> Option<OwnerId> {
    let cleaned: String = raw.chars().filter(|c| !STRAY_CHARS.contains(c)).collect();
    let cleaned = cleaned.trim();
    let cleaned = cleaned.strip_prefix('@').unwrap_or(cleaned);
    let slug = cleaned.rsplit('/').next().unwrap_or(cleaned);
    let slug = slug.to_lowercase();
    if slug.is_empty() {
        None
    } else {
        Some(OwnerId::from_normalized(slug))
    }
}
