// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Bundle Builder
//!
//! Assembles a deployable zip archive in a throwaway build directory:
//!
//! 1. Run the configured install command against the build directory
//! 2. Copy the runtime entry point
//! 3. Write the effective configuration sidecar
//! 4. Strip debug symbols from shared libraries (best effort)
//! 5. Remove compiled bytecode caches
//! 6. Zip the directory
//!
//! The build directory is removed when the build finishes, whether or not
//! it succeeded.

use async_trait::async_trait;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::artifact::{BundleBuilder, PackagingError};
use crate::domain::project_config::PackagingConfig;

/// Placeholder in install command arguments replaced by the build directory
const TARGET_PLACEHOLDER: &str = "{target}";

pub struct LocalBundleBuilder {
    packaging: PackagingConfig,
}

impl LocalBundleBuilder {
    pub fn new(packaging: PackagingConfig) -> Self {
        Self { packaging }
    }

    async fn install_dependencies(&self, target: &Path) -> Result<(), PackagingError> {
        let Some(command) = self.packaging.install_command.as_ref().filter(|c| !c.is_empty()) else {
            debug!("No install command configured");
            return Ok(());
        };

        let target = target.to_string_lossy();
        let args: Vec<String> = command.iter().map(|a| a.replace(TARGET_PLACEHOLDER, &target)).collect();
        info!(command = ?args, "Installing dependencies");

        let output = Command::new(&args[0])
            .args(&args[1..])
            .current_dir(&self.packaging.source_dir)
            .output()
            .await
            .map_err(|e| PackagingError::InstallFailed {
                command: args.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(PackagingError::InstallFailed {
                command: args,
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }

    async fn copy_entry_point(&self, target: &Path) -> Result<(), PackagingError> {
        let source = self.packaging.source_dir.join(&self.packaging.entry_point);
        if !tokio::fs::try_exists(&source).await.unwrap_or(false) {
            return Err(PackagingError::MissingEntryPoint(source));
        }
        let file_name = source
            .file_name()
            .ok_or_else(|| PackagingError::MissingEntryPoint(source.clone()))?;
        let destination = target.join(file_name);
        tokio::fs::copy(&source, &destination).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&destination, std::fs::Permissions::from_mode(0o755)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BundleBuilder for LocalBundleBuilder {
    async fn build(&self, service: &str, sidecar: &str) -> Result<Vec<u8>, PackagingError> {
        let build_dir = tempfile::Builder::new()
            .prefix("stratus-build-")
            .tempdir()
            .map_err(PackagingError::BuildDirectory)?;
        let target = build_dir.path().join("sources");
        tokio::fs::create_dir_all(&target)
            .await
            .map_err(PackagingError::BuildDirectory)?;
        info!(service = %service, path = %target.display(), "Setting up build directory");

        self.install_dependencies(&target).await?;
        self.copy_entry_point(&target).await?;
        tokio::fs::write(target.join(&self.packaging.sidecar_name), sidecar).await?;

        let bundle = tokio::task::spawn_blocking(move || {
            strip_shared_libraries(&target);
            remove_bytecode_caches(&target)?;
            zip_directory(&target)
        })
        .await
        .map_err(|e| PackagingError::Archive(e.to_string()))??;

        debug!(service = %service, size_bytes = bundle.len(), "Bundle assembled");
        Ok(bundle)
    }
}

fn is_shared_library(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.ends_with(".so") || name.contains(".so."))
}

fn strip_shared_libraries(root: &Path) {
    let libraries: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_shared_library(e.path()))
        .map(|e| e.into_path())
        .collect();

    for library in libraries {
        match std::process::Command::new("strip").arg(&library).output() {
            Ok(output) if output.status.success() => {}
            Ok(output) => warn!(
                library = %library.display(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Failed to strip shared library"
            ),
            Err(e) => warn!(library = %library.display(), error = %e, "Failed to strip shared library"),
        }
    }
}

fn remove_bytecode_caches(root: &Path) -> Result<(), PackagingError> {
    let mut cache_dirs = Vec::new();
    let mut compiled = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        let is_cache_dir = entry.file_type().is_dir() && entry.file_name() == "__pycache__";
        if is_cache_dir {
            cache_dirs.push(entry.into_path());
        } else if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == "pyc") {
            compiled.push(entry.into_path());
        }
    }

    for dir in cache_dirs {
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
    }
    for file in compiled {
        if file.exists() {
            std::fs::remove_file(&file)?;
        }
    }
    Ok(())
}

fn zip_directory(root: &Path) -> Result<Vec<u8>, PackagingError> {
    let archive_error = |e: zip::result::ZipError| PackagingError::Archive(e.to_string());
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(root).sort_by_file_name().min_depth(1) {
        let entry = entry.map_err(|e| PackagingError::Archive(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| PackagingError::Archive(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer.add_directory(name, options).map_err(archive_error)?;
        } else if entry.file_type().is_file() {
            let file_options = options.unix_permissions(file_mode(entry.path())?);
            writer.start_file(name, file_options).map_err(archive_error)?;
            writer.write_all(&std::fs::read(entry.path())?)?;
        }
    }

    Ok(writer.finish().map_err(archive_error)?.into_inner())
}

#[cfg(unix)]
fn file_mode(path: &Path) -> Result<u32, PackagingError> {
    use std::os::unix::fs::PermissionsExt;
    Ok(std::fs::metadata(path)?.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> Result<u32, PackagingError> {
    Ok(0o644)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn archive_names(bundle: Vec<u8>) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(bundle)).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    fn project_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("templates/aws")).unwrap();
        std::fs::write(dir.path().join("templates/aws/bootstrap"), "#!/bin/sh\n").unwrap();
        dir
    }

    #[test]
    fn test_is_shared_library() {
        assert!(is_shared_library(Path::new("lib/_speedups.so")));
        assert!(is_shared_library(Path::new("lib/libssl.so.3")));
        assert!(!is_shared_library(Path::new("lib/module.py")));
        assert!(!is_shared_library(Path::new("lib/solver.py")));
    }

    #[tokio::test]
    async fn test_build_includes_entry_point_and_sidecar() {
        let dir = project_dir();
        let builder = LocalBundleBuilder::new(PackagingConfig {
            source_dir: dir.path().to_path_buf(),
            ..PackagingConfig::default()
        });

        let bundle = builder.build("widgets", "project: acme\n").await.unwrap();
        let names = archive_names(bundle.clone());
        assert!(names.contains(&"bootstrap".to_string()));
        assert!(names.contains(&"stratus.yaml".to_string()));

        let mut archive = zip::ZipArchive::new(Cursor::new(bundle)).unwrap();
        let mut sidecar = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("stratus.yaml").unwrap(), &mut sidecar).unwrap();
        assert_eq!(sidecar, "project: acme\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_runs_install_and_removes_caches() {
        let dir = project_dir();
        let builder = LocalBundleBuilder::new(PackagingConfig {
            source_dir: dir.path().to_path_buf(),
            install_command: Some(vec![
                "sh".into(),
                "-c".into(),
                "mkdir -p {target}/pkg/__pycache__ && touch {target}/pkg/mod.py {target}/pkg/mod.pyc {target}/pkg/__pycache__/mod.cpython-312.pyc".into(),
            ]),
            ..PackagingConfig::default()
        });

        let names = archive_names(builder.build("widgets", "x").await.unwrap());
        assert!(names.contains(&"pkg/mod.py".to_string()));
        assert!(names.iter().all(|n| !n.ends_with(".pyc") && !n.contains("__pycache__")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_install_command() {
        let dir = project_dir();
        let builder = LocalBundleBuilder::new(PackagingConfig {
            source_dir: dir.path().to_path_buf(),
            install_command: Some(vec!["sh".into(), "-c".into(), "exit 3".into()]),
            ..PackagingConfig::default()
        });

        let err = builder.build("widgets", "x").await.unwrap_err();
        assert!(matches!(err, PackagingError::InstallFailed { .. }));
    }

    #[tokio::test]
    async fn test_missing_entry_point() {
        let dir = TempDir::new().unwrap();
        let builder = LocalBundleBuilder::new(PackagingConfig {
            source_dir: dir.path().to_path_buf(),
            ..PackagingConfig::default()
        });

        let err = builder.build("widgets", "x").await.unwrap_err();
        assert!(matches!(err, PackagingError::MissingEntryPoint(_)));
    }
}
