use crate::TestCli;

#[test]
fn test_add_use_and_list_contexts() {
    let cli = TestCli::get();
    let config_file = TestCli::config_file();
    let endpoint = "http://localhost:1/1.1";

    for name in ["local", "prod"] {
        cli.run_ok(
            endpoint,
            &config_file,
            ["config", "add", "-n", name, "-e", endpoint, "-t", "secret"],
        );
    }
    cli.run_ok(endpoint, &config_file, ["config", "use", "prod"]);

    let current = cli.run_ok(endpoint, &config_file, ["config", "current"]);
    assert_eq!(current.stdout.trim(), "prod");

    let listed = cli.run_ok(endpoint, &config_file, ["config", "ls"]);
    assert!(listed.stdout.contains("local"), "{}", listed.stdout);
    assert!(listed.stdout.contains("<Hidden>"), "{}", listed.stdout);
    assert!(!listed.stdout.contains("secret"), "{}", listed.stdout);

    let unknown = cli.run(endpoint, &config_file, ["config", "use", "staging"]);
    assert_eq!(unknown.code, Some(1));
}
