use super::*;

#[test]
fn parses_db_commands() {
    for (arg, expected) in [
        ("ping", "Ping"),
        ("migrate", "Migrate"),
        ("seed", "Seed"),
    ] {
        let cli = Cli::try_parse_from(["aeo-cli", "db", arg]).expect("expected valid cli args");
        let Some(Commands::Db { command }) = cli.command else {
            panic!("expected db command for '{arg}'");
        };
        assert_eq!(format!("{command:?}"), expected);
    }
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["aeo-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn analyze_requires_brand() {
    assert!(Cli::try_parse_from(["aeo-cli", "analyze"]).is_err());

    let cli = Cli::try_parse_from([
        "aeo-cli",
        "analyze",
        "--brand",
        "acme",
        "--url",
        "https://acme.com/about",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Analyze { ref brand, url: Some(ref u) })
            if brand == "acme" && u == "https://acme.com/about"
    ));
}

#[test]
fn prompts_generate_defaults_max_per_category() {
    let cli = Cli::try_parse_from(["aeo-cli", "prompts", "generate", "--brand", "acme"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Prompts {
            command: PromptCommands::Generate {
                max_per_category: aeo_prompts::DEFAULT_MAX_PER_CATEGORY,
                ..
            }
        })
    ));
}

#[test]
fn scan_collects_repeated_platforms() {
    let cli = Cli::try_parse_from([
        "aeo-cli",
        "scan",
        "--brand",
        "acme",
        "--platform",
        "claude",
        "--platform",
        "gemini",
        "--max-prompts",
        "20",
        "--dry-run",
    ])
    .unwrap();
    let Some(Commands::Scan {
        brand,
        platforms,
        max_prompts,
        dry_run,
    }) = cli.command
    else {
        panic!("expected scan command");
    };
    assert_eq!(brand, "acme");
    assert_eq!(platforms, vec![Platform::Claude, Platform::Gemini]);
    assert_eq!(max_prompts, Some(20));
    assert!(dry_run);
}

#[test]
fn scan_rejects_unknown_platform() {
    let err = Cli::try_parse_from(["aeo-cli", "scan", "--brand", "acme", "--platform", "myspace"])
        .unwrap_err();
    assert!(err.to_string().contains("myspace"));
}

#[test]
fn report_range_defaults_to_thirty_days() {
    let cli = Cli::try_parse_from(["aeo-cli", "report", "--brand", "acme"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            range: DateRange::Month,
            ..
        })
    ));

    let cli =
        Cli::try_parse_from(["aeo-cli", "report", "--brand", "acme", "--range", "all"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            range: DateRange::All,
            ..
        })
    ));

    assert!(
        Cli::try_parse_from(["aeo-cli", "report", "--brand", "acme", "--range", "1y"]).is_err()
    );
}
