//! Schema-compiler resolution
//!
//! Order: explicit path, then a previously installed binary in the cache
//! directory, then one download through a [`Fetcher`]. Downloads land in a
//! temporary file inside the cache directory and are renamed into place, so
//! a failed install never leaves a partial binary behind.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::ToolchainConfig;
use crate::error::{ResolutionStep, Result, WrapgenError};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Source of compiler binaries
pub trait Fetcher: Send + Sync {
    /// Write the executable for `version` into `dest`
    fn fetch(&self, version: &str, dest: &mut dyn Write) -> std::io::Result<()>;
}

/// A resolved compiler executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCompiler {
    pub path: PathBuf,
    pub source: CompilerSource,
    /// First line of `--version` output when queried
    pub reported_version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerSource {
    Explicit,
    Cached,
    Downloaded,
}

pub struct CompilerResolver {
    explicit: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    version: String,
    query_version: bool,
    version_timeout: Duration,
    fetcher: Option<Box<dyn Fetcher>>,
}

impl CompilerResolver {
    pub fn new(config: &ToolchainConfig) -> Self {
        Self {
            explicit: config.compiler_path.clone(),
            cache_dir: config.resolved_cache_dir(),
            version: config.compiler_version.clone(),
            query_version: config.query_version,
            version_timeout: Duration::from_secs(config.version_timeout_secs),
            fetcher: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    pub fn with_version_timeout(mut self, timeout: Duration) -> Self {
        self.version_timeout = timeout;
        self
    }

    /// File name of the cached binary for the configured version
    pub fn binary_name(&self) -> String {
        format!("protoc-{}{}", self.version, std::env::consts::EXE_SUFFIX)
    }

    pub fn resolve(&self) -> Result<ResolvedCompiler> {
        let (path, source) = self.locate()?;
        let reported_version = if self.query_version {
            Some(query_version(&path, self.version_timeout)?)
        } else {
            None
        };
        info!(path = %path.display(), ?source, "schema compiler resolved");
        Ok(ResolvedCompiler {
            path,
            source,
            reported_version,
        })
    }

    fn locate(&self) -> Result<(PathBuf, CompilerSource)> {
        if let Some(explicit) = &self.explicit {
            if !explicit.is_file() {
                return Err(WrapgenError::toolchain(
                    ResolutionStep::ExplicitPath,
                    format!("compiler not found at {}", explicit.display()),
                ));
            }
            return Ok((explicit.clone(), CompilerSource::Explicit));
        }

        let cache_dir = self.cache_dir.as_deref().ok_or_else(|| {
            WrapgenError::toolchain(ResolutionStep::CacheLookup, "no cache directory available")
        })?;
        let target = cache_dir.join(self.binary_name());
        if target.is_file() {
            debug!(path = %target.display(), "using cached compiler");
            return Ok((target, CompilerSource::Cached));
        }

        let fetcher = self.fetcher.as_deref().ok_or_else(|| {
            WrapgenError::toolchain(
                ResolutionStep::Download,
                format!("compiler {} is not cached and no fetcher is configured", self.version),
            )
        })?;
        self.install(fetcher, cache_dir, &target)?;
        Ok((target, CompilerSource::Downloaded))
    }

    fn install(&self, fetcher: &dyn Fetcher, cache_dir: &Path, target: &Path) -> Result<()> {
        std::fs::create_dir_all(cache_dir).map_err(|e| WrapgenError::toolchain(ResolutionStep::Install, e))?;
        let mut staged =
            NamedTempFile::new_in(cache_dir).map_err(|e| WrapgenError::toolchain(ResolutionStep::Install, e))?;

        info!(version = %self.version, "downloading schema compiler");
        fetcher
            .fetch(&self.version, staged.as_file_mut())
            .map_err(|e| WrapgenError::toolchain(ResolutionStep::Download, e))?;
        staged
            .as_file_mut()
            .flush()
            .map_err(|e| WrapgenError::toolchain(ResolutionStep::Install, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(staged.path(), std::fs::Permissions::from_mode(0o755))
                .map_err(|e| WrapgenError::toolchain(ResolutionStep::Install, e))?;
        }

        staged
            .persist(target)
            .map_err(|e| WrapgenError::toolchain(ResolutionStep::Install, e.error))?;
        debug!(path = %target.display(), "compiler installed");
        Ok(())
    }
}

/// Run `<exe> --version`, killing it after `timeout`
pub fn query_version(path: &Path, timeout: Duration) -> Result<String> {
    let mut command = Command::new(path);
    command.arg("--version");
    run_version_query(&mut command, timeout)
}

fn run_version_query(command: &mut Command, timeout: Duration) -> Result<String> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| WrapgenError::toolchain(ResolutionStep::VersionQuery, e))?;

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                warn!(?timeout, "compiler version query timed out");
                let _ = child.kill();
                let _ = child.wait();
                return Err(WrapgenError::toolchain(
                    ResolutionStep::VersionQuery,
                    format!("no answer within {:?}", timeout),
                ));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(WrapgenError::toolchain(ResolutionStep::VersionQuery, e)),
        }
    };

    if !status.success() {
        return Err(WrapgenError::toolchain(
            ResolutionStep::VersionQuery,
            format!("exited with {}", status),
        ));
    }

    let mut output = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        stdout
            .read_to_string(&mut output)
            .map_err(|e| WrapgenError::toolchain(ResolutionStep::VersionQuery, e))?;
    }
    Ok(output.lines().next().unwrap_or_default().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeFetcher {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, version: &str, dest: &mut dyn Write) -> std::io::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            dest.write_all(b"partial")?;
            if self.fail {
                return Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "mirror went away"));
            }
            dest.write_all(version.as_bytes())
        }
    }

    fn config(cache_dir: &Path) -> ToolchainConfig {
        ToolchainConfig {
            cache_dir: Some(cache_dir.to_path_buf()),
            query_version: false,
            ..ToolchainConfig::default()
        }
    }

    fn step_of(err: WrapgenError) -> ResolutionStep {
        match err {
            WrapgenError::Toolchain { step, .. } => step,
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("protoc");
        std::fs::write(&exe, b"bin").unwrap();

        let mut config = config(dir.path());
        config.compiler_path = Some(exe.clone());
        let resolved = CompilerResolver::new(&config).resolve().unwrap();
        assert_eq!(resolved.path, exe);
        assert_eq!(resolved.source, CompilerSource::Explicit);
        assert_eq!(resolved.reported_version, None);
    }

    #[test]
    fn test_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.compiler_path = Some(dir.path().join("nope"));
        let err = CompilerResolver::new(&config).resolve().unwrap_err();
        assert_eq!(step_of(err), ResolutionStep::ExplicitPath);
    }

    #[test]
    fn test_download_then_cache() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = || FakeFetcher {
            calls: calls.clone(),
            fail: false,
        };

        let first = CompilerResolver::new(&config(dir.path())).with_fetcher(fetcher()).resolve().unwrap();
        assert_eq!(first.source, CompilerSource::Downloaded);
        assert_eq!(std::fs::read(&first.path).unwrap(), b"partial25.1");

        let second = CompilerResolver::new(&config(dir.path())).with_fetcher(fetcher()).resolve().unwrap();
        assert_eq!(second.source, CompilerSource::Cached);
        assert_eq!(second.path, first.path);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_download_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CompilerResolver::new(&config(dir.path())).with_fetcher(FakeFetcher {
            calls: calls.clone(),
            fail: true,
        });

        let err = resolver.resolve().unwrap_err();
        assert_eq!(step_of(err), ResolutionStep::Download);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_not_cached_without_fetcher() {
        let dir = tempfile::tempdir().unwrap();
        let err = CompilerResolver::new(&config(dir.path())).resolve().unwrap_err();
        assert_eq!(step_of(err), ResolutionStep::Download);
    }

    #[cfg(unix)]
    #[test]
    fn test_version_query_reads_first_line() {
        let mut command = Command::new("echo");
        command.arg("libprotoc 25.1");
        let version = run_version_query(&mut command, Duration::from_secs(5)).unwrap();
        assert_eq!(version, "libprotoc 25.1");
    }

    #[cfg(unix)]
    #[test]
    fn test_version_query_times_out() {
        let mut command = Command::new("sleep");
        command.arg("5");
        let started = Instant::now();
        let err = run_version_query(&mut command, Duration::from_millis(100)).unwrap_err();
        assert_eq!(step_of(err), ResolutionStep::VersionQuery);
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
