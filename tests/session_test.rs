use std::io::Cursor;

use bomforest::cli::{CliError, Session, SessionReport};
use bomforest::config::Settings;
use bomforest::exitcode;
use bomforest::util::testing;
use rstest::rstest;

fn session(settings: &Settings) -> Session {
    testing::init_test_setup();
    Session::new(settings).unwrap()
}

fn run(session: &mut Session, input: &str) -> (String, String, SessionReport) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let report = session
        .run(Cursor::new(input.to_string()), &mut out, &mut err)
        .unwrap();
    (
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
        report,
    )
}

#[test]
fn given_bom_script_when_running_then_forest_persists_across_lines() {
    let mut session = session(&Settings::default());
    let (out, err, report) = run(
        &mut session,
        "addAssembly Car=4:Wheel;1:Body\n\
         addAssembly Wheel=5:Bolt\n\
         getComponents Car\n\
         getAssemblies Car\n\
         printAssembly Bolt\n",
    );

    assert_eq!(out, "OK\nOK\nBolt:20;Body:1\nWheel:4\nCOMPONENT\n");
    assert!(err.is_empty(), "{err}");
    assert_eq!(report.total, 5);
    assert_eq!(session.registry().tree_names(), vec!["Car"]);
}

#[test]
fn given_blank_and_crlf_lines_when_running_then_blank_lines_are_skipped() {
    let mut session = session(&Settings::default());
    let (out, _, report) = run(&mut session, "\naddAssembly A=1:B\r\n\n   \nprintAssembly A\r\n");

    assert_eq!(out, "OK\nB:1\n");
    assert_eq!(report.total, 2);
    assert_eq!(report.failed, 0);
}

#[rstest]
#[case("exit", "addAssembly A=1:B\nexit\nprintAssembly A\n", "OK\n")]
#[case("quit", "addAssembly A=1:B\nexit\nprintAssembly A\n", "OK\nB:1\n")]
fn given_quit_command_setting_when_running_then_session_stops_on_it(
    #[case] quit_command: &str,
    #[case] input: &str,
    #[case] expected: &str,
) {
    let settings = Settings {
        quit_command: quit_command.into(),
        ..Settings::default()
    };
    let mut session = session(&settings);
    let (out, _, _) = run(&mut session, input);
    assert_eq!(out, expected);
}

#[test]
fn given_lowered_max_quantity_when_running_then_registry_enforces_it() {
    let settings = Settings {
        max_quantity: 5,
        ..Settings::default()
    };
    let mut session = session(&settings);
    let (out, err, report) = run(&mut session, "addAssembly A=6:B\naddAssembly A=5:B\n");

    assert_eq!(out, "OK\n");
    assert!(err.contains("Error, the amount of a part/assembly cannot exceed 5."));
    assert_eq!(report.failed, 1);
}

#[test]
fn given_single_lines_when_handled_then_errors_keep_their_kind() {
    let mut session = session(&Settings::default());

    assert_eq!(session.handle_line("quit").unwrap(), None);
    let invalid = session.handle_line("addPart A*2:B").unwrap_err();
    assert!(matches!(invalid, CliError::InvalidInput(_)));
    assert_eq!(invalid.exit_code(), exitcode::DATAERR);

    let rule = session.handle_line("removeAssembly A").unwrap_err();
    assert!(matches!(rule, CliError::Application(_)));
    assert_eq!(
        rule.to_string(),
        "no BOM exists in the system for the specified name: A."
    );
}
