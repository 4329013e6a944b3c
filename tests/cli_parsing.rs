//! Tests for CLI option parsing.

use clap::Parser;
use std::path::PathBuf;
use zone_check::Opt;

#[test]
fn test_minimal_invocation() {
    let opt = Opt::try_parse_from([
        "zone_check",
        "--config-file",
        "dns.toml",
        "--zone",
        "example.com.",
    ])
    .unwrap();
    assert_eq!(opt.config_file, PathBuf::from("dns.toml"));
    assert_eq!(opt.zones, vec!["example.com.".to_string()]);
    assert!(opt.nameservers.is_empty());
}

#[test]
fn test_defaults() {
    let opt = Opt::try_parse_from([
        "zone_check",
        "--config-file",
        "dns.toml",
        "--zone",
        "example.com.",
    ])
    .unwrap();
    assert_eq!(opt.timeout_secs, 8);
    assert_eq!(opt.workers, 4);
}

#[test]
fn test_repeatable_zones_and_nameservers() {
    let opt = Opt::try_parse_from([
        "zone_check",
        "--config-file",
        "dns.toml",
        "--zone",
        "example.com.",
        "--zone",
        "example.org.",
        "--nameserver",
        "10.0.0.53",
        "--nameserver",
        "ns1.example.com",
    ])
    .unwrap();
    assert_eq!(
        opt.zones,
        vec!["example.com.".to_string(), "example.org.".to_string()]
    );
    // Order matters: it decides the report's server columns.
    assert_eq!(
        opt.nameservers,
        vec!["10.0.0.53".to_string(), "ns1.example.com".to_string()]
    );
}

#[test]
fn test_tuning_overrides() {
    let opt = Opt::try_parse_from([
        "zone_check",
        "--config-file",
        "dns.toml",
        "--zone",
        "example.com.",
        "--timeout-secs",
        "2",
        "--workers",
        "16",
    ])
    .unwrap();
    assert_eq!(opt.timeout_secs, 2);
    assert_eq!(opt.workers, 16);
}

#[test]
fn test_config_file_is_required() {
    let result = Opt::try_parse_from(["zone_check", "--zone", "example.com."]);
    assert!(result.is_err());
}

#[test]
fn test_at_least_one_zone_is_required() {
    let result = Opt::try_parse_from(["zone_check", "--config-file", "dns.toml"]);
    assert!(result.is_err());
}
