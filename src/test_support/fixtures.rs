//! Vendor tree fixtures.
//!
//! Each package gets just the files its recipe touches: build scripts it
//! invokes and the artifacts the copy-style installs pick up.

use std::path::{Path, PathBuf};

const ZLIB_FILES: &[(&str, &str)] = &[
    ("configure", "#!/bin/sh\n"),
    ("Makefile", "all:\n"),
    (
        "win32/Makefile.gcc",
        "STATICLIB = libz.a\nPREFIX =\nCC = $(PREFIX)gcc\nAR = $(PREFIX)ar\n",
    ),
    ("libz.a", "!<arch>\n"),
    ("zlib.h", "/* zlib.h */\n"),
    ("zconf.h", "/* zconf.h */\n"),
];

const OPENSSL_FILES: &[(&str, &str)] = &[("Configure", "#!/usr/bin/env perl\n")];

const LIBSSH2_FILES: &[(&str, &str)] = &[
    ("buildconf", "#!/bin/sh\n"),
    ("configure", "#!/bin/sh\n"),
];

const LIBGIT2_FILES: &[(&str, &str)] = &[
    ("Makefile.crystax", "all: libgit2.a\n"),
    ("libgit2.a", "!<arch>\n"),
    ("include/git2.h", "#include \"git2/common.h\"\n"),
    ("include/git2/common.h", "/* common */\n"),
    ("include/git2/repository.h", "/* repository */\n"),
];

/// Minimal vendor trees for all four packages under `<root>/vendor`.
#[derive(Debug, Clone)]
pub struct VendorFixture {
    root: PathBuf,
}

impl VendorFixture {
    pub fn create(base: &Path) -> std::io::Result<Self> {
        let root = base.join("vendor");
        for (package, files) in [
            ("zlib", ZLIB_FILES),
            ("openssl", OPENSSL_FILES),
            ("libssh2", LIBSSH2_FILES),
            ("libgit2", LIBGIT2_FILES),
        ] {
            for (rel, contents) in files {
                let path = root.join(package).join(rel);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, contents)?;
            }
        }
        Ok(VendorFixture { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
