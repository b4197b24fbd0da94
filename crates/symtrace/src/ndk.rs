//! Path conventions for the Android NDK bundled with Unity editors.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

/// A device CPU architecture as reported in Unity crash logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Arch {
    /// 64-bit ARM.
    #[value(name = "arm64-v8a")]
    Arm64V8a,
    /// 32-bit ARM.
    #[value(name = "armeabi-v7a")]
    ArmeabiV7a,
    /// 32-bit x86.
    X86,
    /// 64-bit x86.
    X64,
}

impl Arch {
    /// Parses the architecture token used in CPU markers and symbol
    /// directory names.
    pub fn from_marker(token: &str) -> Option<Self> {
        match token {
            "arm64-v8a" => Some(Arch::Arm64V8a),
            "armeabi-v7a" => Some(Arch::ArmeabiV7a),
            "x86" => Some(Arch::X86),
            "x64" => Some(Arch::X64),
            _ => None,
        }
    }

    /// The architecture token as it appears in crash logs and as the name
    /// of per-architecture symbol subdirectories.
    pub fn dir_name(self) -> &'static str {
        match self {
            Arch::Arm64V8a => "arm64-v8a",
            Arch::ArmeabiV7a => "armeabi-v7a",
            Arch::X86 => "x86",
            Arch::X64 => "x64",
        }
    }

    /// The NDK binutils name stem of the addr2line executable for this
    /// architecture.
    fn tool_stem(self) -> &'static str {
        match self {
            Arch::Arm64V8a => "aarch64-linux-android-addr2line",
            Arch::ArmeabiV7a => "arm-linux-androideabi-addr2line",
            Arch::X86 => "i686-linux-android-addr2line",
            Arch::X64 => "x86_64-linux-android-addr2line",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Returns the default Unity Hub editor install location for this host.
pub fn default_hub_path() -> Option<PathBuf> {
    hub_path_for(env::consts::OS)
}

fn hub_path_for(os: &str) -> Option<PathBuf> {
    match os {
        "windows" => Some(PathBuf::from("C:/Program Files/Unity/Hub/Editor")),
        "macos" => Some(PathBuf::from("/Applications/Unity/Hub/Editor")),
        "linux" => dirs::home_dir().map(|home| home.join("Unity/Hub/Editor")),
        _ => None,
    }
}

/// Derives the NDK root inside a Unity editor installation.
///
/// The editor installation is `<hub>/<version>`, with `hub` falling back
/// to the platform default location. Returns `None` when the host has no
/// hub convention or the derived directory does not exist on disk.
pub fn locate_ndk(hub: Option<&Path>, version: &str) -> Option<PathBuf> {
    let hub = match hub {
        Some(path) => path.to_path_buf(),
        None => default_hub_path()?,
    };
    let ndk = ndk_root_for(&hub, version, env::consts::OS)?;
    ndk.is_dir().then_some(ndk)
}

fn ndk_root_for(hub: &Path, version: &str, os: &str) -> Option<PathBuf> {
    let install = hub.join(version);
    let subpath = match os {
        "windows" | "linux" => "Editor/Data/PlaybackEngines/AndroidPlayer/NDK",
        "macos" => "PlaybackEngines/AndroidPlayer/NDK",
        _ => return None,
    };
    Some(install.join(subpath))
}

/// Derives the absolute path of the addr2line executable for the given
/// NDK root and architecture.
///
/// The path is not checked for existence; a missing tool surfaces later
/// as a launch failure on the first matched frame.
pub fn addr2line_tool(ndk: &Path, arch: Arch) -> Option<PathBuf> {
    tool_path_for(ndk, arch, env::consts::OS)
}

fn tool_path_for(ndk: &Path, arch: Arch, os: &str) -> Option<PathBuf> {
    let (prebuilt, suffix) = match os {
        "windows" => ("windows-x86_64", ".exe"),
        "macos" => ("darwin-x86_64", ""),
        "linux" => ("linux-x86_64", ""),
        _ => return None,
    };
    Some(
        ndk.join("toolchains/llvm/prebuilt")
            .join(prebuilt)
            .join("bin")
            .join(format!("{}{}", arch.tool_stem(), suffix)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    #[test]
    fn test_arch_markers_round_trip() {
        for arch in [Arch::Arm64V8a, Arch::ArmeabiV7a, Arch::X86, Arch::X64] {
            assert_eq!(Arch::from_marker(arch.dir_name()), Some(arch));
        }
        assert_eq!(Arch::from_marker("mips"), None);
    }

    #[test]
    fn test_tool_stems() {
        assert_eq!(Arch::Arm64V8a.tool_stem(), "aarch64-linux-android-addr2line");
        assert_eq!(Arch::ArmeabiV7a.tool_stem(), "arm-linux-androideabi-addr2line");
        assert_eq!(Arch::X86.tool_stem(), "i686-linux-android-addr2line");
        assert_eq!(Arch::X64.tool_stem(), "x86_64-linux-android-addr2line");
    }

    #[test]
    fn test_tool_path_per_host() {
        let ndk = Path::new("/opt/ndk");
        assert_eq!(
            tool_path_for(ndk, Arch::Arm64V8a, "linux"),
            Some(PathBuf::from(
                "/opt/ndk/toolchains/llvm/prebuilt/linux-x86_64/bin/aarch64-linux-android-addr2line"
            ))
        );
        assert_eq!(
            tool_path_for(ndk, Arch::X86, "macos"),
            Some(PathBuf::from(
                "/opt/ndk/toolchains/llvm/prebuilt/darwin-x86_64/bin/i686-linux-android-addr2line"
            ))
        );
        assert_eq!(
            tool_path_for(ndk, Arch::X64, "windows"),
            Some(PathBuf::from(
                "/opt/ndk/toolchains/llvm/prebuilt/windows-x86_64/bin/x86_64-linux-android-addr2line.exe"
            ))
        );
        assert_eq!(tool_path_for(ndk, Arch::X86, "freebsd"), None);
    }

    #[test]
    fn test_ndk_root_per_host() {
        let hub = Path::new("/hub");
        assert_eq!(
            ndk_root_for(hub, "2021.3.16f1", "windows"),
            Some(PathBuf::from(
                "/hub/2021.3.16f1/Editor/Data/PlaybackEngines/AndroidPlayer/NDK"
            ))
        );
        assert_eq!(
            ndk_root_for(hub, "2021.3.16f1", "macos"),
            Some(PathBuf::from("/hub/2021.3.16f1/PlaybackEngines/AndroidPlayer/NDK"))
        );
        assert_eq!(ndk_root_for(hub, "2021.3.16f1", "solaris"), None);
    }

    #[test]
    fn test_locate_ndk_requires_existing_dir() {
        let hub = tempfile::tempdir().unwrap();
        assert_eq!(locate_ndk(Some(hub.path()), "2021.3.16f1"), None);

        let ndk = ndk_root_for(hub.path(), "2021.3.16f1", env::consts::OS).unwrap();
        fs::create_dir_all(&ndk).unwrap();
        assert_eq!(locate_ndk(Some(hub.path()), "2021.3.16f1"), Some(ndk));
    }
}
