use crate::args::CliArgs;
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_defaults_to_current_directory() {
    let args = CliArgs::try_parse_from(["tla"]).unwrap();
    assert_eq!(args.paths, vec![PathBuf::from(".")]);
    assert!(args.out_dir.is_none());
    assert!(!args.no_source_map);
    assert!(!args.stdout);
    assert!(!args.list);
}

#[test]
fn test_parses_paths_and_flags() {
    let args = CliArgs::try_parse_from([
        "tla",
        "app",
        "src/main.ts",
        "--out-dir",
        "dist",
        "--config",
        "tla.json",
        "--no-source-map",
    ])
    .unwrap();
    assert_eq!(
        args.paths,
        vec![PathBuf::from("app"), PathBuf::from("src/main.ts")]
    );
    assert_eq!(args.out_dir, Some(PathBuf::from("dist")));
    assert_eq!(args.config, Some(PathBuf::from("tla.json")));
    assert!(args.no_source_map);
}

#[test]
fn test_stdout_conflicts_with_out_dir() {
    assert!(CliArgs::try_parse_from(["tla", "--stdout", "--out-dir", "dist"]).is_err());
    assert!(CliArgs::try_parse_from(["tla", "--list", "--stdout"]).is_err());
    assert!(CliArgs::try_parse_from(["tla", "--stdout"]).is_ok());
}

#[test]
fn test_clap_definition_is_consistent() {
    use clap::CommandFactory;
    CliArgs::command().debug_assert();
}
