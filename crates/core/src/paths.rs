//! Path and file-name helpers shared by the request builders and the uploader

/// Placeholder recognized in access-file-name templates
const NAME_PLACEHOLDER: &str = "${fileName}";

/// Strip runs of slash characters from both ends of a path-like string.
///
/// Interior slashes are left untouched; an empty string stays empty.
pub fn trim_slashes(s: &str) -> &str {
    s.trim_matches(|c| c == '/' || c == '\\')
}

/// Strip trailing slashes only (server URLs, access domains).
pub fn trim_end_slashes(s: &str) -> &str {
    s.trim_end_matches(|c| c == '/' || c == '\\')
}

/// Split an item name into its folder prefix and base name.
///
/// `"sub/dir/name.png"` becomes `("sub/dir", "name.png")`; a name without
/// separators has an empty prefix.
pub fn split_file_name(name: &str) -> (&str, &str) {
    match name.rsplit_once('/') {
        Some((prefix, base)) => (prefix, base),
        None => ("", name),
    }
}

/// Append a sub-path to a configured folder when the sub-path is non-empty.
pub fn join_folder(root: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        root.to_string()
    } else if root.is_empty() {
        prefix.to_string()
    } else {
        format!("{}/{}", root, prefix)
    }
}

/// Rewrite a base name through the user template.
///
/// The template sees the name without its extension (split at the last `.`);
/// the extension is reappended afterwards. Without a template the base name
/// passes through unchanged.
pub fn apply_name_template(template: Option<&str>, base_name: &str) -> String {
    let Some(template) = template else {
        return base_name.to_string();
    };
    let (stem, ext) = match base_name.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (base_name, None),
    };
    let renamed = template.replace(NAME_PLACEHOLDER, stem);
    match ext {
        Some(ext) => format!("{}.{}", renamed, ext),
        None => renamed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_slashes_both_ends_only() {
        assert_eq!(trim_slashes("/a/b/"), "a/b");
        assert_eq!(trim_slashes("//assets//"), "assets");
        assert_eq!(trim_slashes("\\assets\\"), "assets");
        assert_eq!(trim_slashes("assets"), "assets");
        assert_eq!(trim_slashes(""), "");
    }

    #[test]
    fn test_trim_slashes_idempotent() {
        let once = trim_slashes("///a/b///");
        assert_eq!(trim_slashes(once), once);
    }

    #[test]
    fn test_trim_end_slashes() {
        assert_eq!(trim_end_slashes("https://shelf.example.com/"), "https://shelf.example.com");
        assert_eq!(trim_end_slashes("https://shelf.example.com"), "https://shelf.example.com");
    }

    #[test]
    fn test_split_file_name() {
        assert_eq!(split_file_name("sub/a.png"), ("sub", "a.png"));
        assert_eq!(split_file_name("sub/dir/name.png"), ("sub/dir", "name.png"));
        assert_eq!(split_file_name("a.png"), ("", "a.png"));
    }

    #[test]
    fn test_join_folder() {
        assert_eq!(join_folder("assets", "sub"), "assets/sub");
        assert_eq!(join_folder("assets", ""), "assets");
        assert_eq!(join_folder("", "sub"), "sub");
    }

    #[test]
    fn test_template_round_trip() {
        assert_eq!(
            apply_name_template(Some("pre_${fileName}_post"), "img.png"),
            "pre_img_post.png"
        );
    }

    #[test]
    fn test_template_absent_passes_through() {
        assert_eq!(apply_name_template(None, "img.png"), "img.png");
    }

    #[test]
    fn test_template_no_extension() {
        assert_eq!(apply_name_template(Some("x_${fileName}"), "README"), "x_README");
    }

    #[test]
    fn test_template_replaces_every_occurrence() {
        assert_eq!(
            apply_name_template(Some("${fileName}/${fileName}"), "a.png"),
            "a/a.png"
        );
    }
}
