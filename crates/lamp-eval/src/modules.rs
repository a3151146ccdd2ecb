//! Import path resolution.
//!
//! An import path is either a plain relative file (`utils.lmp`, resolved
//! against the current working directory) or a package-qualified
//! `provider:member` pair. The only recognized provider is `lamp`, resolved
//! against the package directory (`lamp_packages`, or `LAMP_PACKAGE_PATH`
//! when set).

use lamp_types::ErrorKind;
use std::env;
use std::path::{Path, PathBuf};

/// The recognized package provider prefix.
pub const PACKAGE_PROVIDER: &str = "lamp";

/// Source file extension for package members.
const SOURCE_EXT: &str = "lmp";

/// Where `lamp:` imports are resolved.
pub fn package_dir() -> PathBuf {
    env::var_os("LAMP_PACKAGE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("lamp_packages"))
}

/// A resolved import target.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModule {
    /// The file to read and parse.
    pub file_path: PathBuf,
    /// Namespace identity the nested evaluator runs under (the file stem).
    pub namespace: String,
    /// Module identity recorded on merged records: the path as written for
    /// plain files, the package-qualified name for package imports.
    pub identity: String,
}

/// Resolve an import path expression.
pub fn resolve(path: &str) -> Result<ResolvedModule, ErrorKind> {
    if let Some((provider, member)) = path.split_once(':') {
        if provider != PACKAGE_PROVIDER {
            return Err(ErrorKind::InvalidPackageProvider(provider.to_string()));
        }
        let file_path = package_dir().join(format!("{member}.{SOURCE_EXT}"));
        return Ok(ResolvedModule {
            file_path,
            namespace: member.to_string(),
            identity: path.to_string(),
        });
    }
    Ok(ResolvedModule {
        file_path: PathBuf::from(path),
        namespace: file_stem(path),
        identity: path.to_string(),
    })
}

/// Namespace identity of a module file: its file stem.
pub fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
