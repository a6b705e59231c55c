//! Corpus-path parsing and validation.

use crate::error::{CdmError, CdmResult};

/// Reject paths using relative traversal fragments.
///
/// Leading `./`, any `../` and any `/./` (and their backslash twins) are
/// unsupported everywhere a corpus path is accepted.
pub fn validate_path_format(path: &str) -> CdmResult<()> {
    let malformed = path.starts_with("./")
        || path.starts_with(".\\")
        || path.contains("../")
        || path.contains("..\\")
        || path.contains("/./")
        || path.contains("\\.\\");
    if malformed {
        return Err(CdmError::PathFormat(path.to_string()));
    }
    Ok(())
}

/// Split a corpus path into its namespace and path parts.
///
/// The prefix before `:` is a namespace only when the colon appears
/// before any slash; otherwise the whole input is the path.
pub fn split_namespace_path(path: &str) -> (Option<&str>, &str) {
    match path.find(':') {
        Some(colon) if !path[..colon].contains('/') => {
            (Some(&path[..colon]), &path[colon + 1..])
        }
        _ => (None, path),
    }
}

/// Lowercased key used by the canonical path index.
pub fn index_key(absolute_path: &str) -> String {
    absolute_path.to_lowercase()
}

/// Split an absolute folder+document path into `(folder_path, doc_name)`.
///
/// `/core/order.cdm.json` becomes `("/core/", "order.cdm.json")`.
pub fn split_folder_and_name(object_path: &str) -> (&str, &str) {
    match object_path.rfind('/') {
        Some(slash) => (&object_path[..slash + 1], &object_path[slash + 1..]),
        None => ("/", object_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("./entity.cdm.json")]
    #[case(".\\entity.cdm.json")]
    #[case("local:/a/../b.cdm.json")]
    #[case("local:/a/./b.cdm.json")]
    fn test_unsupported_formats_rejected(#[case] path: &str) {
        assert!(matches!(
            validate_path_format(path),
            Err(CdmError::PathFormat(_))
        ));
    }

    #[rstest]
    #[case("local:/a/b.cdm.json")]
    #[case("/a/b.cdm.json")]
    #[case("b.cdm.json")]
    fn test_supported_formats_accepted(#[case] path: &str) {
        assert!(validate_path_format(path).is_ok());
    }

    #[test]
    fn test_split_namespace_path() {
        assert_eq!(
            split_namespace_path("local:/a/b.cdm.json"),
            (Some("local"), "/a/b.cdm.json")
        );
        assert_eq!(split_namespace_path("/a/b.cdm.json"), (None, "/a/b.cdm.json"));
        // a colon after a slash is not a namespace separator
        assert_eq!(split_namespace_path("/a/b:c"), (None, "/a/b:c"));
    }

    #[test]
    fn test_split_folder_and_name() {
        assert_eq!(
            split_folder_and_name("/core/order.cdm.json"),
            ("/core/", "order.cdm.json")
        );
        assert_eq!(split_folder_and_name("/order.cdm.json"), ("/", "order.cdm.json"));
        assert_eq!(split_folder_and_name("order.cdm.json"), ("/", "order.cdm.json"));
    }
}
