//! URL slugs
//!
//! Vietnamese and common Latin diacritics are folded to ASCII before the
//! text is lowercased and dashed.

const FALLBACK_SLUG: &str = "item";

/// Fold a single character to its ASCII base letter, if it has one.
fn fold_char(c: char) -> Option<char> {
    let folded = match c {
        'à' | 'á' | 'ả' | 'ã' | 'ạ' | 'ă' | 'ằ' | 'ắ' | 'ẳ' | 'ẵ' | 'ặ' | 'â' | 'ầ' | 'ấ' | 'ẩ'
        | 'ẫ' | 'ậ' | 'ä' | 'å' | 'ā' => 'a',
        'è' | 'é' | 'ẻ' | 'ẽ' | 'ẹ' | 'ê' | 'ề' | 'ế' | 'ể' | 'ễ' | 'ệ' | 'ë' | 'ē' => 'e',
        'ì' | 'í' | 'ỉ' | 'ĩ' | 'ị' | 'î' | 'ï' | 'ī' => 'i',
        'ò' | 'ó' | 'ỏ' | 'õ' | 'ọ' | 'ô' | 'ồ' | 'ố' | 'ổ' | 'ỗ' | 'ộ' | 'ơ' | 'ờ' | 'ớ' | 'ở'
        | 'ỡ' | 'ợ' | 'ö' | 'ø' | 'ō' => 'o',
        'ù' | 'ú' | 'ủ' | 'ũ' | 'ụ' | 'ư' | 'ừ' | 'ứ' | 'ử' | 'ữ' | 'ự' | 'û' | 'ü' | 'ū' => 'u',
        'ỳ' | 'ý' | 'ỷ' | 'ỹ' | 'ỵ' | 'ÿ' => 'y',
        'đ' => 'd',
        'ç' => 'c',
        'ñ' => 'n',
        'ß' => 's',
        c if c.is_ascii_alphanumeric() => c,
        _ => return None,
    };
    Some(folded)
}

/// Turn arbitrary text into a URL slug.
///
/// `"Áo thun Nam đẹp!"` becomes `"ao-thun-nam-dep"`. Text without any
/// usable character becomes `"item"`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        match fold_char(c) {
            Some(ch) => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(ch);
            }
            None => pending_dash = true,
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Search key for case- and accent-insensitive matching.
///
/// `"Áo Thun, Nam"` becomes `"ao thun nam"`. Letters without an ASCII base
/// are kept lowercased; everything else collapses to a single space.
pub fn fold_search(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        let kept = fold_char(c).or_else(|| c.is_alphanumeric().then_some(c));
        match kept {
            Some(ch) => {
                if pending_space && !key.is_empty() {
                    key.push(' ');
                }
                pending_space = false;
                key.push(ch);
            }
            None => pending_space = true,
        }
    }
    key
}

/// Candidate slug for attempt `n`: `base`, `base-1`, `base-2`, ...
pub fn suffixed(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}

/// First free candidate among `base`, `base-1`, `base-2`, ...
///
/// `taken` reports whether a candidate is owned by another row; callers
/// exclude the row being edited so an unchanged slug stays as it is.
pub async fn ensure_unique_slug<F, Fut, E>(base: &str, mut taken: F) -> Result<String, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let mut n = 0;
    loop {
        let candidate = suffixed(base, n);
        if !taken(candidate.clone()).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Slug from an explicit value when it has content, otherwise from `fallback`
pub fn slug_source(explicit: Option<&str>, fallback: &str) -> String {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => slugify(s),
        None => slugify(fallback),
    }
}
