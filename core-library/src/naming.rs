//! Filename codec for triage identity and working-copy versions.
//!
//! A file is named `<base>.<ext>`, with working copies in the pending folder
//! carrying a trailing `~<N>` revision suffix on the base: `<base>~<N>.<ext>`.
//! The three accessors here are mutually consistent: [`base_of`] strips
//! exactly the suffix [`version_of`] detects. Malformed names degrade
//! gracefully (the whole name becomes the base, version defaults to 0);
//! nothing here panics.

/// Extension after the last `.`, lower-cased. Empty string when the name has
/// no dot.
pub fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) => name[idx + 1..].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Name with its extension and any trailing `~<digits>` revision suffix
/// stripped. This is the stable identity of a media record.
pub fn base_of(name: &str) -> String {
    let (base, _) = split_version(stem_of(name));
    base.to_string()
}

/// Trailing `~<digits>` revision number, or 0 when the name carries none.
pub fn version_of(name: &str) -> u32 {
    let (_, version) = split_version(stem_of(name));
    version
}

/// Build the canonical `<base>.<ext>` filename. An empty extension yields the
/// bare base.
pub fn canonical_name(base: &str, extension: &str) -> String {
    if extension.is_empty() {
        base.to_string()
    } else {
        format!("{}.{}", base, extension)
    }
}

/// Build a `<base>~<N>.<ext>` working-copy filename.
pub fn versioned_name(base: &str, version: u32, extension: &str) -> String {
    if extension.is_empty() {
        format!("{}~{}", base, version)
    } else {
        format!("{}~{}.{}", base, version, extension)
    }
}

fn stem_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

fn split_version(stem: &str) -> (&str, u32) {
    if let Some(idx) = stem.rfind('~') {
        let digits = &stem[idx + 1..];
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            // Absurdly long digit runs overflow u32; treat them as part of
            // the base rather than a revision.
            if let Ok(version) = digits.parse::<u32>() {
                return (&stem[..idx], version);
            }
        }
    }
    (stem, 0)
}
