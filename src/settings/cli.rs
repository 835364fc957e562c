// SPDX-License-Identifier: GPL-3.0-or-later
use structopt::StructOpt;

use std::path::PathBuf;

/// Thermal imager: reads a thermal camera and draws a false color image of it.
#[derive(Debug, StructOpt)]
#[structopt()]
pub(crate) struct Args {
    /// Path to a configuration file.
    #[structopt(short, long, parse(from_os_str), default_value = "config.toml")]
    pub(crate) config_path: PathBuf,
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use structopt::StructOpt;

    use super::Args;

    #[test]
    fn default_path() {
        let args = Args::from_iter(&["thermal-imager"]);
        assert_eq!(args.config_path, PathBuf::from("config.toml"));
    }

    #[test]
    fn custom_path() {
        let args = Args::from_iter(&["thermal-imager", "-c", "/etc/imager.toml"]);
        assert_eq!(args.config_path, PathBuf::from("/etc/imager.toml"));
    }
}
