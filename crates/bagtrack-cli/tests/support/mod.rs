use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

pub fn new_command_with_temp_home() -> (Command, tempfile::TempDir) {
    let temp_home = tempfile::tempdir().expect("temp home");
    let command = command_for_home(temp_home.path());
    (command, temp_home)
}

pub fn command_for_home(home: &Path) -> Command {
    let binary = assert_cmd::cargo::cargo_bin!("bagtrack");
    let mut command = Command::new(binary);
    command.env("HOME", home);
    command.env("XDG_CONFIG_HOME", home.join(".config"));
    command.env("XDG_DATA_HOME", home.join(".local").join("share"));
    command.env_remove("BAGTRACK_LOG");
    command
}

pub fn run_ok(home: &Path, args: &[&str]) {
    command_for_home(home).args(args).assert().success();
}

pub fn write_config(home: &Path, raw: &str) {
    let config_dir = home.join(".config").join("bagtrack");
    fs::create_dir_all(&config_dir).expect("create config dir");
    fs::write(config_dir.join("config.toml"), raw).expect("write config");
}

pub fn store_dir(home: &Path) -> PathBuf {
    home.join(".local")
        .join("share")
        .join("bagtrack")
        .join("store")
}

pub fn log_files(home: &Path) -> Vec<String> {
    let log_dir = home.join(".local").join("share").join("bagtrack").join("logs");
    let mut names: Vec<String> = fs::read_dir(log_dir)
        .expect("read logs dir")
        .map(|entry| {
            entry
                .expect("log entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
