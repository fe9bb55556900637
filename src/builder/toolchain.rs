//! Platform-to-toolchain resolution.
//!
//! All knowledge about which prebuilt compiler, sysroot and triple belongs to
//! a target lives in the two static tables below. Build recipes only ever see
//! the resulting [`ToolchainDescriptor`], so supporting a new platform is a
//! table edit.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::{BuildOptions, PlatformError, TargetCpu, TargetOs, TargetPlatform};

/// Minimum macOS version targeted by darwin builds.
pub const MACOSX_VERSION_MIN: &str = "10.6";

/// Search path used for native builds on unix-like targets.
pub const SYSTEM_SEARCH_PATH: &str = "/bin:/usr/bin:/sbin:/usr/sbin";

/// How a target OS points the compiler at its system root.
#[derive(Debug, Clone, Copy)]
enum Sysroot {
    /// No sysroot flag.
    None,
    /// `-isysroot<root>/<sdk>` followed by a minimum OS version.
    Apple(&'static str),
    /// `--sysroot=` the `sysroot` directory inside the toolchain.
    Gnu,
}

#[derive(Debug, Clone, Copy)]
enum SearchPath {
    /// Toolchain `bin` directory ahead of the host PATH.
    ToolchainFirst,
    Fixed(&'static str),
}

/// Per-OS toolchain facts, paths relative to the toolchain root.
#[derive(Debug)]
struct OsEntry {
    os: TargetOs,
    toolchain_dir: &'static str,
    cc: &'static str,
    cxx: &'static str,
    sysroot: Sysroot,
    search_path: SearchPath,
}

const LINUX_GCC: &str = "platform/prebuilts/gcc/linux-x86/host/x86_64-linux-glibc2.11-4.8";
const MINGW_GCC: &str = "platform/prebuilts/gcc/linux-x86/host/x86_64-w64-mingw32-4.8";
const DARWIN_CLANG: &str = "platform/prebuilts/clang/darwin-x86/host/x86_64-apple-darwin-3.7.0";

const OS_TABLE: &[OsEntry] = &[
    OsEntry {
        os: TargetOs::Linux,
        toolchain_dir: LINUX_GCC,
        cc: "x86_64-linux-gcc",
        cxx: "x86_64-linux-g++",
        sysroot: Sysroot::Gnu,
        search_path: SearchPath::Fixed(SYSTEM_SEARCH_PATH),
    },
    OsEntry {
        os: TargetOs::Darwin,
        toolchain_dir: DARWIN_CLANG,
        cc: "clang",
        cxx: "clang++",
        sysroot: Sysroot::Apple("platform/prebuilts/sysroot/darwin-x86/MacOSX10.6.sdk"),
        search_path: SearchPath::Fixed(SYSTEM_SEARCH_PATH),
    },
    OsEntry {
        os: TargetOs::Windows,
        toolchain_dir: MINGW_GCC,
        cc: "x86_64-w64-mingw32-gcc",
        cxx: "x86_64-w64-mingw32-g++",
        sysroot: Sysroot::None,
        search_path: SearchPath::ToolchainFirst,
    },
];

/// Per-platform identifiers expected by configure scripts and OpenSSL.
#[derive(Debug)]
struct PlatformEntry {
    platform: TargetPlatform,
    configure_host: &'static str,
    tls_platform_id: &'static str,
}

const PLATFORM_TABLE: &[PlatformEntry] = &[
    PlatformEntry {
        platform: TargetPlatform::new(TargetOs::Darwin, TargetCpu::X86_64),
        configure_host: "x86_64-darwin10",
        tls_platform_id: "darwin64-x86_64-cc",
    },
    PlatformEntry {
        platform: TargetPlatform::new(TargetOs::Darwin, TargetCpu::X86),
        configure_host: "i686-darwin10",
        tls_platform_id: "darwin-i386-cc",
    },
    PlatformEntry {
        platform: TargetPlatform::new(TargetOs::Linux, TargetCpu::X86_64),
        configure_host: "x86_64-linux",
        tls_platform_id: "linux-x86_64",
    },
    PlatformEntry {
        platform: TargetPlatform::new(TargetOs::Linux, TargetCpu::X86),
        configure_host: "i686-linux",
        tls_platform_id: "linux-generic32",
    },
    // Both windows flavours are driven through the 64-bit mingw driver;
    // word size comes from -m32/-m64.
    PlatformEntry {
        platform: TargetPlatform::new(TargetOs::Windows, TargetCpu::X86_64),
        configure_host: "x86_64-w64-mingw32",
        tls_platform_id: "mingw64",
    },
    PlatformEntry {
        platform: TargetPlatform::new(TargetOs::Windows, TargetCpu::X86),
        configure_host: "x86_64-w64-mingw32",
        tls_platform_id: "mingw",
    },
];

/// Everything a build recipe needs to know about the target toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainDescriptor {
    pub platform: TargetPlatform,
    pub cc: PathBuf,
    pub cxx: PathBuf,
    /// Sysroot part of `cflags`, empty when the target has none.
    pub sysroot_flags: String,
    pub cflags: String,
    pub configure_host: String,
    pub tls_platform_id: String,
    pub search_path: String,
}

impl ToolchainDescriptor {
    /// Cross tool prefix derived from the C compiler (`.../x86_64-w64-mingw32-`).
    pub fn tool_prefix(&self) -> String {
        let cc = self.cc.to_string_lossy();
        cc.strip_suffix("gcc").unwrap_or(&cc).to_string()
    }

    /// Compiler flags split into separate arguments.
    pub fn cflags_args(&self) -> Vec<String> {
        self.cflags.split_whitespace().map(str::to_string).collect()
    }
}

/// Maps targets to toolchain facts rooted at a prebuilt toolchain directory.
#[derive(Debug, Clone)]
pub struct PlatformResolver {
    toolchain_root: PathBuf,
    host_path: String,
}

impl PlatformResolver {
    /// Create a resolver, capturing the host PATH for toolchains that extend it.
    pub fn new(toolchain_root: impl Into<PathBuf>) -> Self {
        PlatformResolver {
            toolchain_root: toolchain_root.into(),
            host_path: std::env::var("PATH").unwrap_or_default(),
        }
    }

    /// Override the captured host PATH.
    pub fn with_host_path(mut self, host_path: impl Into<String>) -> Self {
        self.host_path = host_path.into();
        self
    }

    pub fn toolchain_root(&self) -> &Path {
        &self.toolchain_root
    }

    fn bin_dir(&self, entry: &OsEntry) -> PathBuf {
        self.toolchain_root.join(entry.toolchain_dir).join("bin")
    }

    /// Absolute path of the C compiler for `os`.
    pub fn c_compiler(&self, os: TargetOs) -> Result<PathBuf, PlatformError> {
        let entry = os_entry(os, "c_compiler")?;
        Ok(self.bin_dir(entry).join(entry.cc))
    }

    /// Absolute path of the C++ compiler for `os`.
    pub fn cxx_compiler(&self, os: TargetOs) -> Result<PathBuf, PlatformError> {
        let entry = os_entry(os, "cxx_compiler")?;
        Ok(self.bin_dir(entry).join(entry.cxx))
    }

    /// Sysroot flags for `platform`, without the word-size flag.
    pub fn sysroot_flags(&self, platform: TargetPlatform) -> Result<String, PlatformError> {
        let entry = os_entry(platform.os, "sysroot_flags")?;
        let root = self.toolchain_root.display();
        Ok(match entry.sysroot {
            Sysroot::None => String::new(),
            Sysroot::Apple(sdk) => format!(
                "-isysroot{}/{} -mmacosx-version-min={}",
                root, sdk, MACOSX_VERSION_MIN
            ),
            Sysroot::Gnu => format!("--sysroot={}/{}/sysroot", root, entry.toolchain_dir),
        })
    }

    /// Full compiler flag string for `platform`.
    pub fn compile_flags(&self, platform: TargetPlatform) -> Result<String, PlatformError> {
        // Platform must be in the table even though flags only use os/cpu.
        platform_entry(platform, "compile_flags")?;
        let sysroot = self.sysroot_flags(platform)?;
        let bits = platform.cpu.bits_flag();
        if sysroot.is_empty() {
            Ok(bits.to_string())
        } else {
            Ok(format!("{} {}", sysroot, bits))
        }
    }

    /// PATH-style search path for native build tools.
    pub fn toolchain_search_path(&self, os: TargetOs) -> Result<String, PlatformError> {
        let entry = os_entry(os, "toolchain_search_path")?;
        Ok(match entry.search_path {
            SearchPath::Fixed(path) => path.to_string(),
            SearchPath::ToolchainFirst => {
                let bin = self.bin_dir(entry);
                if self.host_path.is_empty() {
                    bin.display().to_string()
                } else {
                    format!("{}:{}", bin.display(), self.host_path)
                }
            }
        })
    }

    /// Autoconf `--host` triple.
    pub fn configure_host(&self, platform: TargetPlatform) -> Result<&'static str, PlatformError> {
        Ok(platform_entry(platform, "configure_host")?.configure_host)
    }

    /// OpenSSL `Configure` target name.
    pub fn tls_platform_id(&self, platform: TargetPlatform) -> Result<&'static str, PlatformError> {
        Ok(platform_entry(platform, "tls_platform_id")?.tls_platform_id)
    }

    /// Resolve every lookup for the session's target.
    pub fn descriptor(&self, opts: &BuildOptions) -> Result<ToolchainDescriptor, PlatformError> {
        let platform = opts.target_platform();
        Ok(ToolchainDescriptor {
            platform,
            cc: self.c_compiler(opts.target_os())?,
            cxx: self.cxx_compiler(opts.target_os())?,
            sysroot_flags: self.sysroot_flags(platform)?,
            cflags: self.compile_flags(platform)?,
            configure_host: self.configure_host(platform)?.to_string(),
            tls_platform_id: self.tls_platform_id(platform)?.to_string(),
            search_path: self.toolchain_search_path(opts.target_os())?,
        })
    }
}

fn os_entry(os: TargetOs, context: &'static str) -> Result<&'static OsEntry, PlatformError> {
    OS_TABLE
        .iter()
        .find(|e| e.os == os)
        .ok_or_else(|| PlatformError::UnknownTargetOs {
            value: os.to_string(),
            context,
        })
}

fn platform_entry(
    platform: TargetPlatform,
    context: &'static str,
) -> Result<&'static PlatformEntry, PlatformError> {
    PLATFORM_TABLE
        .iter()
        .find(|e| e.platform == platform)
        .ok_or_else(|| PlatformError::UnknownTargetPlatform {
            value: platform.to_string(),
            context,
        })
}

const _: () = {
    assert!(OS_TABLE.len() == TargetOs::ALL.len());
    assert!(PLATFORM_TABLE.len() == TargetOs::ALL.len() * TargetCpu::ALL.len());
};
