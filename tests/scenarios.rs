//! End-to-end scenarios exercised through the public API rather than
//! internal unit tests.

use std::sync::{Arc, Mutex};

use ferrocli::config::{FieldSchema, Schema};
use ferrocli::error::{CliErrorKind, Outcome};
use ferrocli::io::SharedBuffer;
use ferrocli::model::value::Kind;
use ferrocli::wrapper::IoMode;
use ferrocli::{Application, Command, Constraint, ExitError, Flag, FlagGroup, ParseResult, PositionalArgument, Value, WrapperConfig};

/// A. Top-level flags with defaults: `--name Alice -v` leaves `age` at its
/// default while overriding `name` and `verbose`.
#[test]
fn scenario_a_flags_and_short_bool() {
    let captured: Arc<Mutex<Option<ParseResult>>> = Arc::new(Mutex::new(None));
    let sink = captured.clone();

    let app = Arc::new(
        Application::new("demo")
            .flag(Flag::new("name", Kind::String).default_value(Value::Str("Go User".into())))
            .flag(Flag::new("age", Kind::Int).default_value(Value::Int(30)))
            .flag(Flag::new("verbose", Kind::Bool).short('v'))
            .command(Command::new("run").action(Arc::new(move |ctx| {
                *sink.lock().unwrap() = ctx.parse_result.clone();
                Ok(())
            }))),
    );

    let outcome = ferrocli::run(app, &["run".into(), "--name".into(), "Alice".into(), "-v".into()]);
    assert!(matches!(outcome, Outcome::Ran(None)));

    let result = captured.lock().unwrap().clone().expect("action ran");
    assert_eq!(result.get("name"), Some(&Value::Str("Alice".into())));
    assert_eq!(result.get("age"), Some(&Value::Int(30)));
    assert_eq!(result.get("verbose"), Some(&Value::Bool(true)));
}

/// B. A subcommand with an enum flag and a required positional.
#[test]
fn scenario_b_subcommand_enum_and_positional() {
    let captured: Arc<Mutex<Option<ParseResult>>> = Arc::new(Mutex::new(None));
    let sink = captured.clone();

    let app = Arc::new(Application::new("demo").command(
        Command::new("deploy")
            .flag(
                Flag::new("env", Kind::Enum)
                    .enum_values(["dev", "staging", "prod"])
                    .default_value(Value::Enum("prod".into())),
            )
            .positional(PositionalArgument::new("target", Kind::String, 0).required())
            .action(Arc::new(move |ctx| {
                *sink.lock().unwrap() = ctx.parse_result.clone();
                Ok(())
            })),
    ));

    let outcome = ferrocli::run(
        app,
        &["deploy".into(), "--env".into(), "staging".into(), "web-1".into()],
    );
    assert!(matches!(outcome, Outcome::Ran(None)));

    let result = captured.lock().unwrap().clone().expect("action ran");
    assert_eq!(result.command_name(), Some("deploy"));
    assert_eq!(result.get("env"), Some(&Value::Enum("staging".into())));
    assert_eq!(result.positional("target"), Some(&Value::Str("web-1".into())));
}

fn app_with_output_group() -> Application {
    Application::new("demo")
        .flag(Flag::new("json", Kind::Bool))
        .flag(Flag::new("yaml", Kind::Bool))
        .group(FlagGroup::new("output", Constraint::ExactlyOne).flag("json").flag("yaml"))
}

/// C. `exactly-one` group violation (both set), violation (none set), and
/// success (exactly one set).
#[test]
fn scenario_c_group_violation_both_set() {
    let app = app_with_output_group();
    let err = ferrocli::parser::parse(&app, &["--json".into(), "--yaml".into()]).unwrap_err();
    assert_eq!(err.kind, CliErrorKind::FlagGroupViolation);
    assert!(err.message.contains("json") && err.message.contains("yaml"));
}

#[test]
fn scenario_c_group_violation_none_set() {
    let app = app_with_output_group();
    let err = ferrocli::parser::parse(&app, &[]).unwrap_err();
    assert_eq!(err.kind, CliErrorKind::FlagGroupViolation);
}

#[test]
fn scenario_c_group_success_one_set() {
    let app = app_with_output_group();
    let result = ferrocli::parser::parse(&app, &["--yaml".into()]).unwrap();
    assert!(result.is_set("yaml"));
    assert!(!result.is_set("json"));
}

/// D. A wrapper command bound to the system `echo` binary.
#[test]
fn scenario_d_echo_wrapper_end_to_end() {
    let tee = SharedBuffer::new();
    let wrapper = WrapperConfig::new("echo")
        .pre_args(["wrapped:"])
        .forward_args()
        .io_mode(IoMode::Capture)
        .tee_stdout(tee.clone());

    let app = Arc::new(Application::new("demo").command(Command::new("echo").wrapper(wrapper)));
    let outcome = ferrocli::run(app, &["echo".into(), "hello".into()]);

    assert!(matches!(outcome, Outcome::Ran(None)));
    assert_eq!(tee.snapshot(), b"wrapped: hello\n");
}

/// E. A wrapper command whose child exits non-zero becomes an `ExitError`
/// carrying that same code.
#[test]
fn scenario_e_wrapper_nonzero_exit_becomes_exit_error() {
    let wrapper = WrapperConfig::new("sh").pre_args(["-c", "exit 7"]).io_mode(IoMode::Capture);
    let app = Arc::new(Application::new("demo").command(Command::new("fail").wrapper(wrapper)));
    let outcome = ferrocli::run(app, &["fail".into()]);

    match outcome {
        Outcome::Ran(Some(err)) => {
            let exit = err.downcast_ref::<ExitError>().expect("expected an ExitError");
            assert_eq!(exit.code, 7);
            assert_eq!(app_exit_code(&exit), 7);
        }
        other => panic!("expected Outcome::Ran(Some(exit error)), got {other:?}"),
    }
}

fn app_exit_code(exit: &ExitError) -> i32 {
    ferrocli::ExitCodeMapper::new().resolve(Some(exit))
}

/// F. Precedence resolution: flag overrides env overrides default.
#[test]
fn scenario_f_flag_overrides_env_overrides_default() {
    std::env::set_var("FERROCLI_TEST_PORT", "9000");

    let schema = Schema::new()
        .field(
            FieldSchema::new("host", Kind::String)
                .default_value(Value::Str("localhost".into())),
        )
        .field(
            FieldSchema::new("port", Kind::Int)
                .env("FERROCLI_TEST_PORT")
                .flag("port")
                .default_value(Value::Int(8080)),
        );

    let mut parsed = ParseResult::empty();
    parsed.set("port", Value::Int(3000));

    let resolved = ferrocli::config::resolve(&schema, None, &parsed).unwrap();
    assert_eq!(resolved.get("host"), Some(&Value::Str("localhost".into())));
    assert_eq!(resolved.get("port"), Some(&Value::Int(3000)));

    std::env::remove_var("FERROCLI_TEST_PORT");
}

/// F (env layer alone): with no flag override, the environment variable
/// wins over the default.
#[test]
fn scenario_f_env_overrides_default_when_no_flag_given() {
    std::env::set_var("FERROCLI_TEST_PORT2", "9000");

    let schema = Schema::new().field(
        FieldSchema::new("port", Kind::Int)
            .env("FERROCLI_TEST_PORT2")
            .flag("port")
            .default_value(Value::Int(8080)),
    );

    let parsed = ParseResult::empty();
    let resolved = ferrocli::config::resolve(&schema, None, &parsed).unwrap();
    assert_eq!(resolved.get("port"), Some(&Value::Int(9000)));

    std::env::remove_var("FERROCLI_TEST_PORT2");
}
