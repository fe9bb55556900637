//! Environment overrides passed to native build steps.
//!
//! Native build tools silently ignore variables they don't know, so the set
//! of variables a recipe may set is closed: [`EnvKey`] lists every one of
//! them and [`BuildEnv::from_pairs`] rejects anything else.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("unsupported build environment variable `{0}`")]
    UnknownKey(String),
}

/// A recognized build environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EnvKey {
    /// C compiler path.
    Cc,
    /// Compiler flags.
    Cflags,
    /// Linker search flags.
    Ldflags,
    /// Extra system link libraries.
    Libs,
    /// Install-root override for `make install`.
    DestDir,
    /// Tool search path.
    Path,
    /// Cross tool prefix for makefiles that derive `ar`, `ranlib` etc. from it.
    Prefix,
    /// Compiler flags appended by makefiles that reserve `CFLAGS`.
    ExtraCflags,
    /// Preprocessor defines appended by such makefiles.
    ExtraDefines,
    /// Include flags appended by such makefiles.
    ExtraIncludes,
}

impl EnvKey {
    pub const ALL: [EnvKey; 10] = [
        EnvKey::Cc,
        EnvKey::Cflags,
        EnvKey::Ldflags,
        EnvKey::Libs,
        EnvKey::DestDir,
        EnvKey::Path,
        EnvKey::Prefix,
        EnvKey::ExtraCflags,
        EnvKey::ExtraDefines,
        EnvKey::ExtraIncludes,
    ];

    /// Variable name as seen by the child process.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EnvKey::Cc => "CC",
            EnvKey::Cflags => "CFLAGS",
            EnvKey::Ldflags => "LDFLAGS",
            EnvKey::Libs => "LIBS",
            EnvKey::DestDir => "DESTDIR",
            EnvKey::Path => "PATH",
            EnvKey::Prefix => "PREFIX",
            EnvKey::ExtraCflags => "EXTRA_CFLAGS",
            EnvKey::ExtraDefines => "EXTRA_DEFINES",
            EnvKey::ExtraIncludes => "EXTRA_INCLUDES",
        }
    }
}

impl fmt::Display for EnvKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvKey {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| EnvError::UnknownKey(s.to_string()))
    }
}

/// Environment overrides layered on top of the inherited environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildEnv {
    vars: BTreeMap<EnvKey, String>,
}

impl BuildEnv {
    pub fn new() -> Self {
        BuildEnv::default()
    }

    /// Build from name/value pairs, rejecting unrecognized names.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, EnvError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut env = BuildEnv::new();
        for (key, value) in pairs {
            let key: EnvKey = key.as_ref().parse()?;
            env.vars.insert(key, value.into());
        }
        Ok(env)
    }

    pub fn set(mut self, key: EnvKey, value: impl Into<String>) -> Self {
        self.vars.insert(key, value.into());
        self
    }

    pub fn cc(self, cc: &Path) -> Self {
        self.set(EnvKey::Cc, cc.display().to_string())
    }

    pub fn cflags(self, flags: impl Into<String>) -> Self {
        self.set(EnvKey::Cflags, flags)
    }

    pub fn ldflags(self, flags: impl Into<String>) -> Self {
        self.set(EnvKey::Ldflags, flags)
    }

    /// Set `LIBS`, leaving it unset when `libs` is `None`.
    pub fn libs(self, libs: Option<&str>) -> Self {
        match libs {
            Some(libs) => self.set(EnvKey::Libs, libs),
            None => self,
        }
    }

    pub fn dest_dir(self, dir: &Path) -> Self {
        self.set(EnvKey::DestDir, dir.display().to_string())
    }

    pub fn search_path(self, path: impl Into<String>) -> Self {
        self.set(EnvKey::Path, path)
    }

    pub fn get(&self, key: EnvKey) -> Option<&str> {
        self.vars.get(&key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Variables in a stable order, as (name, value).
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for BuildEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}={:?}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_accepts_known_keys() {
        let env = BuildEnv::from_pairs([("CC", "/usr/bin/gcc"), ("LIBS", "-ldl")]).unwrap();
        assert_eq!(env.get(EnvKey::Cc), Some("/usr/bin/gcc"));
        assert_eq!(env.get(EnvKey::Libs), Some("-ldl"));
        assert_eq!(env.get(EnvKey::Cflags), None);
    }

    #[test]
    fn test_from_pairs_rejects_unknown_keys() {
        let err = BuildEnv::from_pairs([("CC", "gcc"), ("CPPFLAGS", "-DX")]).unwrap_err();
        assert_eq!(err, EnvError::UnknownKey("CPPFLAGS".into()));
    }

    #[test]
    fn test_libs_none_stays_unset() {
        let env = BuildEnv::new().libs(None).cflags("-O2");
        assert_eq!(env.get(EnvKey::Libs), None);
        assert_eq!(env.to_string(), "CFLAGS=\"-O2\"");
    }

    #[test]
    fn test_key_names_round_trip() {
        for key in EnvKey::ALL {
            assert_eq!(key.as_str().parse::<EnvKey>().unwrap(), key);
        }
    }
}
