/// Used when sanitizing leaves nothing usable.
const FALLBACK_FILENAME: &str = "project_migration.zip";
const MAX_STEM_LEN: usize = 120;

/// Windows-safe version of a suggested download filename.
///
/// Forbidden characters become `_`, runs of `_` collapse, and reserved device
/// names get a trailing `_`. The extension is kept.
pub fn safe_filename(suggested: &str) -> String {
    let (stem, ext) = match suggested.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (suggested, None),
    };

    let mut stem = sanitize_component(stem);
    if stem.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }
    truncate_on_char_boundary(&mut stem, MAX_STEM_LEN);
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }

    match ext.map(sanitize_component).filter(|ext| !ext.is_empty()) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

fn sanitize_component(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim_matches(&['_', ' ', '.'][..]);

    let mut compacted = String::with_capacity(trimmed.len());
    let mut prev_underscore = false;
    for c in trimmed.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }
    compacted
}

fn truncate_on_char_boundary(s: &mut String, max_len: usize) {
    if s.len() <= max_len {
        return;
    }
    let mut cut = max_len;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
