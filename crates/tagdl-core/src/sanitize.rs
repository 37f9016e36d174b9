//! Tag-to-directory-name sanitization.
//!
//! Tags frequently contain characters that are legal in a search query but
//! not in a portable directory name (`:` in metatags, `?`, `*`, quotes).
//! Output directories should survive being copied to FAT/NTFS media, so the
//! reserved set is wider than Linux alone requires.

/// Sanitizes a tag for use as a directory name.
///
/// - Replaces NUL, `/`, `\`, control characters, and the FAT/NTFS-reserved
///   set `< > : " | ? *` with `_`
/// - Trims trailing spaces and dots (invalid on NTFS, confusing everywhere)
/// - Limits length to 255 bytes (NAME_MAX)
pub fn sanitize_tag_dir(tag: &str) -> String {
    const NAME_MAX: usize = 255;
    const RESERVED: &[char] = &['<', '>', ':', '"', '\\', '|', '?', '*', '/'];

    let mut out = String::with_capacity(tag.len());
    for c in tag.chars() {
        if c == '\0' || c.is_control() || RESERVED.contains(&c) {
            out.push('_');
        } else {
            out.push(c);
        }
    }

    let trimmed = out.trim_end_matches(|c| c == ' ' || c == '.');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}
