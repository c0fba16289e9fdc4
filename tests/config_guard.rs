// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use mitander_migrate::app::config::GlobalSettings;
use mitander_migrate::domain::constants::CHAIN_SEPOLIA;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Fail CI if config files contain 64-hex private keys or obvious secrets.
#[test]
fn no_committed_hex_keys_in_configs() {
    let re = Regex::new(r"0x?[a-fA-F0-9]{64}").unwrap();
    let candidates = [
        "config.toml",
        "config.example.toml",
        ".env",
        ".env.example",
    ];
    for file in candidates {
        if !Path::new(file).exists() {
            continue;
        }
        let body = fs::read_to_string(file).expect("read config");
        for (idx, line) in body.lines().enumerate() {
            if line.trim_start().starts_with('#') {
                continue;
            }
            if re.is_match(line) {
                panic!("Secret-looking hex in {} at line {}", file, idx + 1);
            }
        }
    }
}

#[test]
fn example_config_deserializes() {
    let path = "config.example.toml";
    if !Path::new(path).exists() {
        return;
    }
    let settings = config::Config::builder()
        .add_source(config::File::from(Path::new(path)))
        .build()
        .expect("build")
        .try_deserialize::<GlobalSettings>()
        .expect("deserialize");
    assert_eq!(settings.chain_id, CHAIN_SEPOLIA);
    assert_eq!(
        settings.http_provider(CHAIN_SEPOLIA).as_deref(),
        Some("https://ethereum-sepolia-rpc.publicnode.com")
    );
    assert!(settings.network_table().is_ok());
    assert!(settings.signer().is_err());
}
