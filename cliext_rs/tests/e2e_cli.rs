//! End-to-end tests for the cliext-demo binary.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// The demo binary, run from an empty directory so no stray config is found.
fn demo(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("cliext-demo");
    cmd.current_dir(dir.path());
    cmd
}

// ============================================
// Help
// ============================================

mod help_output {
    use super::*;

    #[test]
    fn no_arguments_prints_group_help() {
        let dir = TempDir::new().unwrap();
        demo(&dir)
            .assert()
            .success()
            .stdout(predicate::str::starts_with(
                "Usage: cliext-demo [OPTIONS] COMMAND [ARGS]...",
            ))
            .stdout(predicate::str::contains("greet (hello,hi)"))
            .stdout(predicate::str::contains("sum (add)"));
    }

    #[test]
    fn hidden_command_not_listed() {
        let dir = TempDir::new().unwrap();
        demo(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("fail").not());
    }

    #[test]
    fn subcommand_help_lists_global_options_and_aliases() {
        let dir = TempDir::new().unwrap();
        demo(&dir)
            .args(["hi", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with(
                "Usage: cliext-demo greet [OPTIONS] [NAME]",
            ))
            .stdout(predicate::str::contains("-v, --verbosity LVL"))
            .stdout(predicate::str::contains("-c, --config FILE"))
            .stdout(predicate::str::contains("-n, --dry-run"))
            .stdout(predicate::str::contains("Aliases:\n  hello\n  hi"));
    }
}

// ============================================
// Dispatch
// ============================================

mod dispatch {
    use super::*;

    #[test]
    fn aliases_run_the_same_command() {
        let dir = TempDir::new().unwrap();
        for name in ["greet", "hello", "hi"] {
            demo(&dir)
                .args([name, "Bob"])
                .assert()
                .success()
                .stdout("Hello, Bob!\n");
        }
    }

    #[test]
    fn global_option_on_either_side_of_command() {
        let dir = TempDir::new().unwrap();
        for args in [
            ["-v", "DEBUG", "greet", "bob"],
            ["greet", "-v", "DEBUG", "bob"],
            ["greet", "bob", "-v", "debug"],
        ] {
            demo(&dir)
                .args(args)
                .assert()
                .success()
                .stdout(predicate::str::contains("Debug: greeting name=bob"))
                .stdout(predicate::str::contains("Hello, bob!"));
        }
    }

    #[test]
    fn shared_flag_belongs_to_subcommand() {
        let dir = TempDir::new().unwrap();
        demo(&dir)
            .args(["greet", "-n"])
            .assert()
            .success()
            .stdout("Would print: Hello, world!\n");

        demo(&dir)
            .args(["-n", "greet"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Error: No such option: -n"));
    }

    #[test]
    fn variadic_integers() {
        let dir = TempDir::new().unwrap();
        demo(&dir)
            .args(["add", "1", "2", "39"])
            .assert()
            .success()
            .stdout("42\n");
    }
}

// ============================================
// Errors
// ============================================

mod errors {
    use super::*;

    #[test]
    fn unknown_command_suggests_close_match() {
        let dir = TempDir::new().unwrap();
        demo(&dir)
            .arg("gret")
            .assert()
            .code(2)
            .stdout(predicate::str::contains(
                "Try 'cliext-demo --help' for help.",
            ))
            .stderr(predicate::str::contains(
                "Error: No such command 'gret'. Did you mean 'greet'?",
            ));
    }

    #[test]
    fn exclusive_options_rejected_together() {
        let dir = TempDir::new().unwrap();
        demo(&dir)
            .args(["greet", "--shout"])
            .assert()
            .success()
            .stdout("HELLO, WORLD!\n");

        demo(&dir)
            .args(["greet", "--shout", "--whisper"])
            .assert()
            .code(2)
            .stdout(predicate::str::contains("Usage: cliext-demo greet"))
            .stderr(predicate::str::contains(
                "Error: Mutually exclusive options: --shout --whisper",
            ));
    }

    #[test]
    fn dangling_global_option() {
        let dir = TempDir::new().unwrap();
        demo(&dir)
            .args(["greet", "-v"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains(
                "Error: Option '-v' requires an argument.",
            ));
    }

    #[test]
    fn invalid_integer() {
        let dir = TempDir::new().unwrap();
        demo(&dir)
            .args(["sum", "1", "x"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("'x' is not a valid integer."));
    }

    #[test]
    fn handler_failure_is_logged() {
        let dir = TempDir::new().unwrap();
        demo(&dir)
            .arg("fail")
            .assert()
            .code(1)
            .stderr("Error: Something went wrong\n");
    }

    #[test]
    fn quiet_silences_errors() {
        let dir = TempDir::new().unwrap();
        demo(&dir)
            .args(["--verbosity", "quiet", "fail"])
            .assert()
            .code(1)
            .stdout("")
            .stderr("");
    }
}

// ============================================
// Configuration
// ============================================

mod configuration {
    use super::*;

    #[test]
    fn default_config_file_is_loaded() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cliext-demo.toml"), "greeting = \"Howdy\"\n").unwrap();
        demo(&dir)
            .arg("greet")
            .assert()
            .success()
            .stdout("Howdy, world!\n");
    }

    #[test]
    fn config_option_after_command() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("alt.yaml"), "greeting: Hey\n").unwrap();
        demo(&dir)
            .args(["hi", "ann", "-c", "alt.yaml"])
            .assert()
            .success()
            .stdout("Hey, ann!\n");
    }

    #[test]
    fn unknown_config_format_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("alt.ini"), "greeting=Hey\n").unwrap();
        demo(&dir)
            .args(["--config", "alt.ini", "greet"])
            .assert()
            .code(1)
            .stderr("Error: Unknown configuration file format \".ini\"\n");
    }
}
