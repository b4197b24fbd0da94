//! Run configuration resolved from CLI options and crash-log markers.

use std::path::PathBuf;

use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::ndk::{self, Arch};

/// Unity prints its version near the top of a crash log, e.g.
/// `Version '2021.3.16f1 (4016570cf34f)'`.
static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Version\s?'(?P<version>\d{4}\.\d\.\d+[fab]\d+)\s?\([0-9a-f]+\)'").unwrap()
});

/// The CPU marker, e.g. `CPU 'arm64-v8a'`.
static CPU_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"CPU\s?'(?P<arch>arm64-v8a|armeabi-v7a|x86|x64)'").unwrap());

/// Resolves native stack frames in Unity Android crash logs.
///
/// Frame addresses are translated with the addr2line tool from the NDK
/// bundled with the Unity editor that produced the build. Values not
/// given on the command line are read from markers in the crash log
/// itself.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Path to the crash log to process.
    pub tracebackfile: PathBuf,

    /// Root directory containing debug symbol files.
    ///
    /// Symbols may sit directly in this directory or in a
    /// per-architecture subdirectory such as `arm64-v8a/`.
    #[arg(long, short, value_name = "PATH")]
    pub symbol: PathBuf,

    /// Unity editor version used to produce the build.
    ///
    /// Locates the NDK under `<hub>/<version>`. Read from the crash log
    /// when omitted; not needed at all when --ndk is given.
    #[arg(long, short, value_name = "VERSION")]
    pub unity: Option<String>,

    /// Explicit NDK root, bypassing hub/version based discovery.
    #[arg(long, short = 'k', value_name = "PATH")]
    pub ndk: Option<PathBuf>,

    /// Device CPU architecture. Read from the crash log when omitted.
    #[arg(long, short, value_enum)]
    pub arch: Option<Arch>,

    /// Unity Hub editor install location to search instead of the
    /// platform default.
    #[arg(long, value_name = "PATH")]
    pub hub: Option<PathBuf>,
}

/// A configuration value that could not be resolved from the options or
/// the crash log. All variants are fatal and reported before any line is
/// processed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No NDK was given and none could be derived from hub and version.
    #[error("cannot locate NDK")]
    NdkNotFound,
    /// No architecture was given and the log carries no CPU marker.
    #[error("cannot determine architecture")]
    UnknownArchitecture,
    /// The addr2line path cannot be derived on this host.
    #[error("cannot find addr2lines tool")]
    ToolNotFound,
}

/// Fully resolved inputs for a single run. Computed once before the line
/// loop and never mutated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// The device CPU architecture of the crashed process.
    pub arch: Arch,
    /// Root of the NDK installation the resolver tool is taken from.
    pub ndk_path: PathBuf,
    /// Absolute path of the addr2line executable to invoke.
    pub tool_path: PathBuf,
    /// Root directory holding the debug symbol files.
    pub symbol_root: PathBuf,
}

impl RunConfig {
    /// Resolves the run configuration from explicit options, falling back
    /// to markers sniffed from the crash log.
    ///
    /// Checks run in a fixed order and short-circuit on the first
    /// failure: NDK root, then architecture, then the tool path.
    pub fn resolve(cli: &Cli, lines: &[&str]) -> Result<Self, ConfigError> {
        let ndk_path = match &cli.ndk {
            Some(path) => path.clone(),
            None => {
                // The version is only needed for NDK discovery, so it is
                // only sniffed on this path.
                let version = cli.unity.clone().or_else(|| sniff_version(lines));
                version
                    .and_then(|version| ndk::locate_ndk(cli.hub.as_deref(), &version))
                    .ok_or(ConfigError::NdkNotFound)?
            }
        };

        let arch = cli
            .arch
            .or_else(|| sniff_arch(lines))
            .ok_or(ConfigError::UnknownArchitecture)?;

        let tool_path = ndk::addr2line_tool(&ndk_path, arch).ok_or(ConfigError::ToolNotFound)?;

        Ok(RunConfig {
            arch,
            ndk_path,
            tool_path,
            symbol_root: cli.symbol.clone(),
        })
    }
}

/// Returns the first Unity version marker in the log, in file order.
pub fn sniff_version(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .find_map(|line| VERSION_RE.captures(line).map(|caps| caps["version"].to_string()))
}

/// Returns the first CPU marker in the log, in file order.
pub fn sniff_arch(lines: &[&str]) -> Option<Arch> {
    lines
        .iter()
        .find_map(|line| CPU_RE.captures(line).and_then(|caps| Arch::from_marker(&caps["arch"])))
}
