use nanoid::nanoid;

const MAX_FILENAME_LEN: usize = 64;

/// Turns a client supplied filename into one that is safe to store on disk.
///
/// Runs of anything other than ASCII alphanumerics and dashes (dots included)
/// collapse into a single underscore. The extension is kept only if it is
/// plain ASCII alphanumeric and leaves room for at least one stem character.
/// Long stems are truncated so the result fits in `MAX_FILENAME_LEN`
/// characters.
///
/// "cover art (final).PNG" -> "cover_art_final.PNG"
/// "../../etc/passwd" -> "etc_passwd"
/// "中国人.jpg" -> "upload-XXXXX.jpg"
pub fn sanitize_filename(original: &str) -> String {
    let (stem, extension) = match original.rsplit_once('.') {
        Some((stem, ext))
            if !ext.is_empty()
                && ext.len() + 2 <= MAX_FILENAME_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (stem, Some(ext))
        }
        _ => (original, None),
    };

    let mut clean = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            clean.push(c);
        } else if !clean.is_empty() && !clean.ends_with('_') {
            clean.push('_');
        }
    }

    let mut clean = clean.trim_matches('_').to_owned();
    if clean.is_empty() {
        clean = format!("upload-{}", nanoid!(5, &nanoid::alphabet::SAFE[2..]));
    }

    let ext_len = extension.map(|e| e.len() + 1).unwrap_or(0);
    clean.truncate(MAX_FILENAME_LEN - ext_len);

    match extension {
        Some(ext) => format!("{}.{}", clean, ext),
        None => clean,
    }
}
