use chrono::{NaiveDate, NaiveDateTime};
use shieldlens_core::conf::{ShieldlensConfig, load_config};
use shieldlens_core::engine::Engine;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway directory holding `shieldlens.hcl` plus the logs it points at.
///
/// Log paths in the config are relative, so loading also exercises path
/// resolution against the config file's directory.
pub struct TestSite {
    dir: TempDir,
}

impl TestSite {
    pub fn new(extra_config: &str) -> Self {
        Self::with_strategy("full_rescan", extra_config)
    }

    pub fn with_strategy(strategy: &str, extra_config: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = format!(
            "sources {{\n  access_log = \"access.log\"\n  error_log = \"error.log\"\n  strategy = \"{strategy}\"\n}}\n{extra_config}"
        );
        fs::write(dir.path().join("shieldlens.hcl"), config).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn access_log(&self) -> PathBuf {
        self.dir.path().join("access.log")
    }

    pub fn error_log(&self) -> PathBuf {
        self.dir.path().join("error.log")
    }

    pub fn write_access(&self, lines: &[String]) {
        fs::write(self.access_log(), join(lines)).unwrap();
    }

    pub fn append_access(&self, lines: &[String]) {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.access_log())
            .unwrap();
        file.write_all(join(lines).as_bytes()).unwrap();
    }

    pub fn write_errors(&self, lines: &[&str]) {
        let text: String = lines.iter().map(|l| format!("{l}\n")).collect();
        fs::write(self.error_log(), text).unwrap();
    }

    pub fn config(&self) -> ShieldlensConfig {
        load_config(self.path()).expect("test config should load")
    }

    pub fn engine(&self) -> Engine {
        Engine::from_config(&self.config()).expect("test enrichment should build")
    }
}

fn join(lines: &[String]) -> String {
    lines.iter().map(|l| format!("{l}\n")).collect()
}

/// 2024-01-10 at `h:m` UTC.
pub fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 10)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

/// Combined-format line stamped 2024-01-10 `10:minute` UTC.
pub fn access_line(
    ip: &str,
    minute: u32,
    method: &str,
    url: &str,
    status: u16,
    ua: &str,
) -> String {
    format!(
        r#"{ip} - - [10/Jan/2024:10:{minute:02}:00 +0000] "{method} {url} HTTP/1.1" {status} 512 "-" "{ua}""#
    )
}
