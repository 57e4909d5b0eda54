// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::{Path, PathBuf};

use path_clean::clean;

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Walk up from `path` looking for `filename`
pub fn find_in_parent(path: &Path, filename: &str) -> Option<PathBuf> {
    path.ancestors()
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.exists())
}

/// Resolve where the configuration should be read from. An explicit file wins, then the
/// nearest file found above `cwd`, then the OS config dir.
pub fn resolve_config_path(
    find_in_parent: FindInParent,
    cwd: &Path,
    default_config_dir: &Path,
    default_filename: &str,
    cli_file: Option<&Path>,
) -> PathBuf {
    if let Some(cli_file) = cli_file {
        if cli_file.is_absolute() {
            return cli_file.to_path_buf();
        }
        return clean(cwd.join(cli_file));
    }

    if let Some(found) = find_in_parent(cwd, default_filename) {
        return found;
    }

    clean(default_config_dir.join(default_filename))
}

#[cfg(test)]
mod tests {
    use super::resolve_config_path;
    use std::path::{Path, PathBuf};

    fn not_found(_: &Path, _: &str) -> Option<PathBuf> {
        None
    }

    fn found(_: &Path, _: &str) -> Option<PathBuf> {
        Some(PathBuf::from("/foo/contentgate.config.yaml"))
    }

    #[test]
    fn test_resolve_default_dir() {
        let path = resolve_config_path(
            not_found,
            Path::new("/foo/bar"),
            Path::new("/my/config"),
            "contentgate.config.yaml",
            None,
        );
        assert_eq!(path, PathBuf::from("/my/config/contentgate.config.yaml"));
    }

    #[test]
    fn test_resolve_cli_overrides_search() {
        let path = resolve_config_path(
            found,
            Path::new("/foo/bar"),
            Path::new("/my/config"),
            "contentgate.config.yaml",
            Some(Path::new("/my/absolute/conf.yaml")),
        );
        assert_eq!(path, PathBuf::from("/my/absolute/conf.yaml"));

        let path = resolve_config_path(
            found,
            Path::new("/foo/bar"),
            Path::new("/my/config"),
            "contentgate.config.yaml",
            Some(Path::new("../conf.yaml")),
        );
        assert_eq!(path, PathBuf::from("/foo/conf.yaml"));
    }

    #[test]
    fn test_resolve_found_in_parent() {
        let path = resolve_config_path(
            found,
            Path::new("/foo/bar"),
            Path::new("/my/config"),
            "contentgate.config.yaml",
            None,
        );
        assert_eq!(path, PathBuf::from("/foo/contentgate.config.yaml"));
    }
}
