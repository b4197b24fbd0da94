//! Symbol lookup and frame resolution via the external addr2line tool.

use std::path::{Path, PathBuf};
use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RunConfig;
use crate::ndk::Arch;

/// One backtrace frame: a frame number, the literal `pc`, a hex address
/// and, somewhere after it, the faulting shared library.
static FRAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"#\d+\s+pc\s+(?P<addr>(?:0x)?[0-9a-f]+)\s+.*(?P<lib>lib\w+\.so)").unwrap()
});

/// Translates matched frames of a crash log, one line at a time.
#[derive(Debug)]
pub struct Resolver {
    tool_path: PathBuf,
    symbol_root: PathBuf,
    arch: Arch,
}

impl Resolver {
    /// Creates a resolver from a fully resolved run configuration.
    pub fn new(config: &RunConfig) -> Self {
        Resolver {
            tool_path: config.tool_path.clone(),
            symbol_root: config.symbol_root.clone(),
            arch: config.arch,
        }
    }

    /// Returns the on-disk debug symbol file for a library, trying the
    /// symbol root itself first and the per-architecture subdirectory
    /// second.
    fn symbol_file(&self, lib: &str) -> Option<PathBuf> {
        let direct = self.symbol_root.join(lib);
        if direct.is_file() {
            return Some(direct);
        }
        let nested = self.symbol_root.join(self.arch.dir_name()).join(lib);
        nested.is_file().then_some(nested)
    }

    /// Runs addr2line for a single address within a symbol file.
    ///
    /// Stderr output is surfaced as a warning but never aborts the run,
    /// and neither does a failed launch. An empty return value means the
    /// address could not be resolved.
    fn addr2line(&self, symbol_file: &Path, addr: &str) -> String {
        let output = Command::new(&self.tool_path)
            .arg("-Cpife")
            .arg(symbol_file)
            .arg(addr)
            .output();

        let output = match output {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(
                    tool = %self.tool_path.display(),
                    error = %err,
                    "failed to launch addr2line"
                );
                return String::new();
            }
        };

        if !output.stderr.is_empty() {
            tracing::warn!(
                "addr2line: {}",
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }

        String::from_utf8_lossy(&output.stdout).trim_end().to_string()
    }

    /// Rewrites a single line of the crash log.
    ///
    /// Lines that do not look like a stack frame, reference a library
    /// without a symbol file, or yield no resolver output pass through
    /// unchanged. Otherwise the first occurrence of the address is
    /// replaced with the resolved source location.
    pub fn process_line(&self, line: &str) -> String {
        let Some(caps) = FRAME_RE.captures(line) else {
            return line.to_string();
        };

        let addr = &caps["addr"];
        let lib = &caps["lib"];

        let Some(symbol_file) = self.symbol_file(lib) else {
            return line.to_string();
        };

        let resolved = self.addr2line(&symbol_file, addr);
        if resolved.is_empty() {
            return line.to_string();
        }

        line.replacen(addr, &resolved, 1)
    }
}
