//! Toolchain invocation
//!
//! An immutable `Toolchain` value is assembled once per run: manifest
//! settings, the include flag, the variant flag set, and the pkg-config
//! resolved library flags. Library resolution failures are fatal before any
//! compilation begins. Every spawned command is echoed at info level, runs
//! blocking, and a non-zero exit aborts the run.

use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};

use crate::layout::Layout;
use crate::manifest::Manifest;
use crate::variant::Variant;
use crate::{Error, Result};

/// Compile and link flags resolved for one library
#[derive(Debug, Clone, Default)]
pub struct LibraryFlags {
    /// Flags appended to every compile command
    pub cflags: Vec<String>,
    /// Flags appended to every link command
    pub libs: Vec<String>,
}

/// Resolved compiler configuration for one run
#[derive(Debug, Clone)]
pub struct Toolchain {
    compiler: String,
    driver_flags: Vec<String>,
    cxx_flags: Vec<String>,
    variant_flags: Vec<String>,
    ld_flags: Vec<String>,
}

impl Toolchain {
    /// Assemble the toolchain for a manifest, layout and variant.
    ///
    /// Resolves every declared library through pkg-config; the resulting
    /// value never changes for the rest of the run.
    pub fn configure(manifest: &Manifest, layout: &Layout, variant: Variant) -> Result<Self> {
        let settings = &manifest.toolchain;

        let mut cxx_flags = settings.cxx_flags.clone();
        cxx_flags.push(format!("-I{}", layout.include_dir()));
        let mut ld_flags = settings.ld_flags.clone();

        for library in &manifest.libraries {
            let flags = resolve_library(&settings.pkg_config, library)?;
            tracing::debug!(
                "Resolved library {}: {} cflags, {} libs",
                library,
                flags.cflags.len(),
                flags.libs.len()
            );
            cxx_flags.extend(flags.cflags);
            ld_flags.extend(flags.libs);
        }

        Ok(Self {
            compiler: settings.compiler.clone(),
            driver_flags: settings.driver_flags.clone(),
            cxx_flags,
            variant_flags: settings.variant_flags(variant).to_vec(),
            ld_flags,
        })
    }

    /// Compile one source file to one object file
    pub fn compile(&self, source: &Utf8Path, object: &Utf8Path) -> Result<()> {
        self.run(self.compile_args(source, object))
    }

    /// Link a set of objects into an executable
    pub fn link(&self, objects: &[Utf8PathBuf], executable: &Utf8Path) -> Result<()> {
        self.run(self.link_args(objects, executable))
    }

    /// Precompile a system header into the interface cache. No variant
    /// flags: the result is shared by every variant.
    pub fn precompile_system_header(&self, header: &str) -> Result<()> {
        self.run(self.system_header_args(header))
    }

    /// Compile and link a standalone source in a single invocation
    pub fn build_standalone(&self, source: &Utf8Path, executable: &Utf8Path) -> Result<()> {
        self.run(self.standalone_args(source, executable))
    }

    fn compile_args(&self, source: &Utf8Path, object: &Utf8Path) -> Vec<String> {
        let mut args = Vec::new();
        args.extend(self.driver_flags.iter().cloned());
        args.extend(self.variant_flags.iter().cloned());
        args.extend(self.cxx_flags.iter().cloned());
        args.push("-c".to_string());
        args.push(source.to_string());
        args.push("-o".to_string());
        args.push(object.to_string());
        args
    }

    fn link_args(&self, objects: &[Utf8PathBuf], executable: &Utf8Path) -> Vec<String> {
        let mut args = Vec::new();
        args.extend(self.driver_flags.iter().cloned());
        args.extend(self.variant_flags.iter().cloned());
        args.extend(self.ld_flags.iter().cloned());
        args.extend(objects.iter().map(|o| o.to_string()));
        args.push("-o".to_string());
        args.push(executable.to_string());
        args
    }

    fn system_header_args(&self, header: &str) -> Vec<String> {
        let mut args = Vec::new();
        args.extend(self.driver_flags.iter().cloned());
        args.extend(self.cxx_flags.iter().cloned());
        args.push("-xc++-system-header".to_string());
        args.push(header.to_string());
        args
    }

    fn standalone_args(&self, source: &Utf8Path, executable: &Utf8Path) -> Vec<String> {
        let mut args = Vec::new();
        args.extend(self.driver_flags.iter().cloned());
        args.extend(self.variant_flags.iter().cloned());
        args.extend(self.cxx_flags.iter().cloned());
        args.extend(self.ld_flags.iter().cloned());
        args.push(source.to_string());
        args.push("-o".to_string());
        args.push(executable.to_string());
        args
    }

    fn run(&self, args: Vec<String>) -> Result<()> {
        tracing::info!("* {} {}", self.compiler, args.join(" "));

        let status = Command::new(&self.compiler)
            .args(&args)
            .status()
            .map_err(|e| {
                Error::toolchain(
                    format!("failed to run {}: {}", self.compiler, e),
                    "Check that the compiler is installed and on PATH",
                )
            })?;

        if !status.success() {
            return Err(Error::toolchain(
                format!("{} failed with {}", self.compiler, status),
                "See the compiler output above",
            ));
        }

        Ok(())
    }
}

/// Resolve the compile and link flags of a library through pkg-config
pub fn resolve_library(pkg_config: &str, name: &str) -> Result<LibraryFlags> {
    Ok(LibraryFlags {
        cflags: query(pkg_config, name, "--cflags")?,
        libs: query(pkg_config, name, "--libs")?,
    })
}

fn query(pkg_config: &str, name: &str, flag: &str) -> Result<Vec<String>> {
    let output = Command::new(pkg_config)
        .args([name, flag])
        .output()
        .map_err(|e| Error::library(name, format!("failed to run {}: {}", pkg_config, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::library(name, stderr.trim().to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.split_whitespace().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;

    fn toolchain_for(manifest: &Manifest, variant: Variant) -> Toolchain {
        let layout = Layout::new(Utf8Path::new("/proj"), &manifest.layout, variant);
        Toolchain::configure(manifest, &layout, variant).unwrap()
    }

    #[test]
    fn test_compile_args_order() {
        let manifest = Manifest::parse("").unwrap();
        let toolchain = toolchain_for(&manifest, Variant::Debug);

        let args = toolchain.compile_args(
            Utf8Path::new("/proj/src/engine/state.cpp"),
            Utf8Path::new("/proj/build/debug/objects/engine/state.o"),
        );

        assert_eq!(
            args,
            vec![
                "-fdiagnostics-color=always",
                "-g",
                "-DDEBUG",
                "-std=c++23",
                "-fmodules-ts",
                "-I/proj/inc",
                "-c",
                "/proj/src/engine/state.cpp",
                "-o",
                "/proj/build/debug/objects/engine/state.o",
            ]
        );
    }

    #[test]
    fn test_link_args_have_no_compile_flags() {
        let manifest = Manifest::parse("[toolchain]\nld_flags = [\"-lm\"]\n").unwrap();
        let toolchain = toolchain_for(&manifest, Variant::Release);

        let objects = vec![Utf8PathBuf::from("a.o"), Utf8PathBuf::from("b.o")];
        let args = toolchain.link_args(&objects, Utf8Path::new("/proj/build/release/app"));

        assert_eq!(
            args,
            vec![
                "-fdiagnostics-color=always",
                "-DNDEBUG",
                "-lm",
                "a.o",
                "b.o",
                "-o",
                "/proj/build/release/app",
            ]
        );
        assert!(!args.iter().any(|a| a == "-std=c++23"));
    }

    #[test]
    fn test_system_header_args_are_variant_independent() {
        let manifest = Manifest::parse("").unwrap();
        let debug = toolchain_for(&manifest, Variant::Debug);
        let release = toolchain_for(&manifest, Variant::Release);

        let args = debug.system_header_args("iostream");

        assert_eq!(args, release.system_header_args("iostream"));
        assert!(!args.iter().any(|a| a == "-g" || a == "-DDEBUG"));
        assert!(args.iter().any(|a| a == "-xc++-system-header"));
        assert_eq!(args.last().map(String::as_str), Some("iostream"));
    }

    #[test]
    fn test_standalone_args_compile_and_link_at_once() {
        let manifest = Manifest::parse("[toolchain]\nld_flags = [\"-lm\"]\n").unwrap();
        let toolchain = toolchain_for(&manifest, Variant::Debug);

        let args = toolchain.standalone_args(
            Utf8Path::new("/proj/src/tools/bench.cpp"),
            Utf8Path::new("/proj/build/debug/bench"),
        );

        assert!(!args.iter().any(|a| a == "-c"));
        assert!(args.iter().any(|a| a == "-std=c++23"));
        assert!(args.iter().any(|a| a == "-lm"));
        assert_eq!(args.last().map(String::as_str), Some("/proj/build/debug/bench"));
    }

    #[cfg(unix)]
    fn write_stub(dir: &Utf8Path, name: &str, body: &str) -> Utf8PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_library_splits_flags() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();
        let stub = write_stub(
            dir,
            "pkg-config",
            r#"case "$2" in
  --cflags) echo "-I/opt/rl/include -DUSE_RL" ;;
  --libs) echo "-L/opt/rl/lib -lreadline" ;;
esac"#,
        );

        let flags = resolve_library(stub.as_str(), "readline").unwrap();

        assert_eq!(flags.cflags, vec!["-I/opt/rl/include", "-DUSE_RL"]);
        assert_eq!(flags.libs, vec!["-L/opt/rl/lib", "-lreadline"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_library_failure_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();
        let stub = write_stub(
            dir,
            "pkg-config",
            "echo \"Package 'nope' was not found\" >&2\nexit 1",
        );

        let result = resolve_library(stub.as_str(), "nope");

        match result {
            Err(Error::Library { name, message }) => {
                assert_eq!(name, "nope");
                assert!(message.contains("not found"));
            }
            other => panic!("expected Library error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_configure_appends_resolved_library_flags() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();
        let stub = write_stub(
            dir,
            "pkg-config",
            r#"case "$2" in
  --cflags) echo "-DUSE_RL" ;;
  --libs) echo "-lreadline" ;;
esac"#,
        );

        let content = format!(
            "libraries = [\"readline\"]\n\n[toolchain]\npkg_config = \"{}\"\n",
            stub
        );
        let manifest = Manifest::parse(&content).unwrap();
        let toolchain = toolchain_for(&manifest, Variant::Debug);

        assert!(toolchain.cxx_flags.iter().any(|f| f == "-DUSE_RL"));
        assert!(toolchain.ld_flags.iter().any(|f| f == "-lreadline"));

        // Library cflags reach compiles, library libs reach links
        let compile = toolchain.compile_args(Utf8Path::new("s.cpp"), Utf8Path::new("s.o"));
        assert!(compile.iter().any(|f| f == "-DUSE_RL"));
        let link = toolchain.link_args(&[], Utf8Path::new("app"));
        assert!(link.iter().any(|f| f == "-lreadline"));
    }
}
