use std::fmt;

use super::types::Config;

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  \x1b[38;5;244m───────────────────────────────────────────────\x1b[0m"
        )?;
        writeln!(
            f,
            "  \x1b[1;34m⦿\x1b[0m \x1b[1;37mListening:\x1b[0m   \x1b[32m0.0.0.0:{}\x1b[0m",
            self.port
        )?;
        writeln!(
            f,
            "  \x1b[1;34m⦿\x1b[0m \x1b[1;37mWeb root:\x1b[0m    \x1b[36m{}\x1b[0m",
            self.webroot.display()
        )?;
        writeln!(
            f,
            "  \x1b[1;34m⦿\x1b[0m \x1b[1;37mIdle timeout:\x1b[0m \x1b[33m{}s\x1b[0m{}",
            self.idle_timeout.as_secs(),
            if self.idle_timeout.is_zero() { " \x1b[38;5;244m(disabled)\x1b[0m" } else { "" }
        )?;
        writeln!(
            f,
            "  \x1b[1;34m⦿\x1b[0m \x1b[1;37mDefault file:\x1b[0m \x1b[36m{}\x1b[0m",
            self.default_file
        )?;
        writeln!(
            f,
            "  \x1b[1;34m⦿\x1b[0m \x1b[1;37mDirectory listing:\x1b[0m \x1b[{}m{}\x1b[0m",
            if self.directory_listing { "32" } else { "31" },
            if self.directory_listing { "ON" } else { "OFF" }
        )?;

        if !self.mime_overrides.is_empty() {
            writeln!(f, "  \x1b[1;34m⦿\x1b[0m \x1b[1;37mMIME overrides:\x1b[0m")?;
            let mut exts: Vec<_> = self.mime_overrides.iter().collect();
            exts.sort_by_key(|(ext, _)| ext.as_str());
            for (ext, mime) in exts {
                writeln!(f, "    \x1b[38;5;244m.{ext:4}\x1b[0m → \x1b[35m{mime}\x1b[0m")?;
            }
        }

        writeln!(
            f,
            "  \x1b[38;5;244m───────────────────────────────────────────────\x1b[0m"
        )
    }
}

pub fn display_config(config: &Config) {
    println!("\n\x1b[1;35m 🌐 WEBSERV CONFIGURATION\x1b[0m");
    print!("{config}");
    println!(" \x1b[1;32m✔\x1b[0m Ready for requests!\n");
}
