/// 常见拉丁字母的 ASCII 折叠表，未收录的非 ASCII 字符视为分隔符
fn fold_char(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'æ' | 'Æ' => "ae",
        'ç' | 'Ç' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ñ' | 'Ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}

/// 由技术名生成 URL 友好的 slug
/// 例：`Node.js` → `node-js`，`Café Script` → `cafe-script`
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;

    let push = |slug: &mut String, piece: &str, pending: &mut bool| {
        if *pending && !slug.is_empty() {
            slug.push('-');
        }
        *pending = false;
        slug.push_str(piece);
    };

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            let lower = ch.to_ascii_lowercase();
            let mut buf = [0u8; 4];
            push(&mut slug, lower.encode_utf8(&mut buf), &mut pending_sep);
        } else if ch == '-' {
            pending_sep = true;
        } else if let Some(folded) = fold_char(ch) {
            push(&mut slug, folded, &mut pending_sep);
        } else {
            pending_sep = true;
        }
    }
    slug
}
