//! Package this executable with a browser runtime into a standalone bundle.
//!
//! Bundle layout, which is what bundled-mode detection looks for:
//!
//! ```text
//! <output>/<name>/
//!     <name>[.exe]
//!     browser-runtime/...
//!     <icon>.svg | <icon>.ico
//! ```

use anyhow::{Context, Result, anyhow, bail};
use autologin_core::BUNDLED_RUNTIME_DIR;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PackageOptions {
    pub browser_runtime: Option<PathBuf>,
    pub output: PathBuf,
    pub name: String,
    pub icon: Option<PathBuf>,
    pub clean: bool,
}

pub fn execute(options: &PackageOptions) -> Result<()> {
    if options.clean {
        return clean(&options.output);
    }

    let runtime = options
        .browser_runtime
        .as_deref()
        .ok_or_else(|| anyhow!("--browser-runtime is required unless --clean is given"))?;
    if !runtime.is_dir() {
        bail!("Browser runtime directory not found: {}", runtime.display());
    }

    let exe = std::env::current_exe().context("Could not locate the running executable")?;
    let bundle_dir = build_bundle(&exe, runtime, options)?;

    println!("✅ Bundle ready: {}", bundle_dir.display());
    Ok(())
}

fn clean(output: &Path) -> Result<()> {
    if output.exists() {
        println!("🧹 Removing previous build output: {}", output.display());
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to remove {}", output.display()))?;
    } else {
        println!("Nothing to clean at {}", output.display());
    }
    Ok(())
}

fn build_bundle(exe: &Path, runtime: &Path, options: &PackageOptions) -> Result<PathBuf> {
    let bundle_dir = options.output.join(&options.name);
    if bundle_dir.exists() {
        fs::remove_dir_all(&bundle_dir)
            .with_context(|| format!("Failed to remove old bundle {}", bundle_dir.display()))?;
    }
    fs::create_dir_all(&bundle_dir)
        .with_context(|| format!("Failed to create {}", bundle_dir.display()))?;

    let target_exe = bundle_dir.join(format!("{}{}", options.name, std::env::consts::EXE_SUFFIX));
    println!("📦 Copying executable to {}", target_exe.display());
    fs::copy(exe, &target_exe)
        .with_context(|| format!("Failed to copy {}", exe.display()))?;

    let target_runtime = bundle_dir.join(BUNDLED_RUNTIME_DIR);
    println!("🌐 Copying browser runtime from {}", runtime.display());
    let copied = copy_dir_all(runtime, &target_runtime)
        .with_context(|| format!("Failed to copy browser runtime {}", runtime.display()))?;
    tracing::info!("Copied {} browser runtime files", copied);

    if let Some(icon) = &options.icon {
        let icon_file = platform_icon(icon);
        match icon_file.file_name() {
            Some(file_name) if icon_file.is_file() => {
                fs::copy(&icon_file, bundle_dir.join(file_name))
                    .with_context(|| format!("Failed to copy icon {}", icon_file.display()))?;
            }
            _ => println!("⚠️  Icon not found at {}, skipping", icon_file.display()),
        }
    }

    Ok(bundle_dir)
}

/// `.ico` on Windows, `.svg` elsewhere, unless the path already names a file
fn platform_icon(icon: &Path) -> PathBuf {
    if icon.extension().is_some() && icon.is_file() {
        return icon.to_path_buf();
    }
    let ext = if cfg!(windows) { "ico" } else { "svg" };
    PathBuf::from(format!("{}.{}", icon.display(), ext))
}

/// Recursively copy `src` into `dst`, returning the number of files copied
fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<usize> {
    fs::create_dir_all(dst)?;

    let mut copied = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let target = dst.join(entry.file_name());

        if file_type.is_dir() {
            copied += copy_dir_all(&entry.path(), &target)?;
        } else if file_type.is_symlink() {
            copy_symlink(&entry.path(), &target)?;
            copied += 1;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(src)?, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_runtime(root: &Path) -> PathBuf {
        let runtime = root.join("runtime");
        fs::create_dir_all(runtime.join("chromium-1234").join("chrome-linux")).unwrap();
        fs::write(runtime.join("chromium-1234").join("chrome-linux").join("chrome"), b"bin").unwrap();
        fs::write(runtime.join("INSTALLATION_COMPLETE"), b"").unwrap();
        runtime
    }

    #[test]
    fn test_copy_dir_all_copies_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = fake_runtime(dir.path());

        let copied = copy_dir_all(&runtime, &dir.path().join("copy")).unwrap();

        assert_eq!(copied, 2);
        assert!(dir.path().join("copy/chromium-1234/chrome-linux/chrome").is_file());
    }

    #[test]
    fn test_build_bundle_layout() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = fake_runtime(dir.path());
        let exe = dir.path().join("autologin");
        fs::write(&exe, b"binary").unwrap();
        let icon_base = dir.path().join("icon");
        fs::write(platform_icon(&icon_base), b"<svg/>").unwrap();

        let options = PackageOptions {
            browser_runtime: Some(runtime.clone()),
            output: dir.path().join("dist"),
            name: "LoginApp".to_string(),
            icon: Some(icon_base),
            clean: false,
        };
        let bundle = build_bundle(&exe, &runtime, &options).unwrap();

        assert_eq!(bundle, dir.path().join("dist").join("LoginApp"));
        assert!(bundle.join(format!("LoginApp{}", std::env::consts::EXE_SUFFIX)).is_file());
        assert!(bundle.join(BUNDLED_RUNTIME_DIR).join("INSTALLATION_COMPLETE").is_file());
        let icon_name = if cfg!(windows) { "icon.ico" } else { "icon.svg" };
        assert!(bundle.join(icon_name).is_file());
    }

    #[test]
    fn test_missing_runtime_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let options = PackageOptions {
            browser_runtime: Some(dir.path().join("missing")),
            output: dir.path().join("dist"),
            name: "LoginApp".to_string(),
            icon: None,
            clean: false,
        };

        let err = execute(&options).unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn test_clean_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dist");
        fs::create_dir_all(output.join("LoginApp")).unwrap();

        clean(&output).unwrap();
        assert!(!output.exists());
    }
}
