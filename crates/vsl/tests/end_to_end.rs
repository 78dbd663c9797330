use pretty_assertions::assert_eq;
use vsl::{
    core::runtime::capture_output, emit_object, lower_source, run_module, run_source, Backend,
    CodegenConfig, Reply, Shell, ShellConfig,
};

const PROGRAM: &str = r#"
FUNC add(a, b)
{
    RETURN a + b
}

FUNC fact(n)
{
    IF n - 1 THEN
        RETURN n * fact(n - 1)
    FI
    RETURN 1
}

FUNC main()
{
    VAR i, s
    i := 1
    WHILE 5 - i + 1 DO
    {
        s := s + i
        i := i + 1
    }
    DONE
    PRINT "sum = ", s, ", fact = ", fact(5), "\n"
    RETURN add(3, 4)
}
"#;

fn interpreter_shell() -> Shell {
    Shell::new(ShellConfig {
        backend: Backend::Interpreter,
        ..ShellConfig::default()
    })
}

fn feed(shell: &mut Shell, lines: &[&str]) -> Vec<Reply> {
    lines.iter().map(|line| shell.feed_line(line).unwrap()).collect()
}

#[test]
fn test_program_on_both_backends() {
    let config = CodegenConfig::default();
    for backend in [Backend::Interpreter, Backend::Jit] {
        let (result, out) = capture_output(|| run_source(PROGRAM, backend, &config));
        assert_eq!(result.unwrap(), 7.0, "{backend:?}");
        assert_eq!(out, "sum = 15.0, fact = 120.0\n", "{backend:?}");
    }
}

const NESTED_LOOPS: &str = r#"
FUNC grid(n)
{
    VAR i, total
    WHILE n - i DO
    {
        VAR j
        WHILE 3 - j DO
        {
            total := total + 1
            j := j + 1
        }
        DONE
        i := i + 1
    }
    DONE
    PRINT "rows ", i, "\n"
    RETURN total
}

FUNC find(limit)
{
    VAR k
    WHILE limit + 5 - k DO
    {
        k := k + 1
        IF k - limit + 1 THEN
            RETURN k * 100
        FI
    }
    DONE
    RETURN -1
}

FUNC main()
{
    PRINT "a\0b", "|\n"
    RETURN grid(4) + find(3)
}
"#;

#[test]
fn test_nested_loops_on_both_backends() {
    let config = CodegenConfig::default();
    for backend in [Backend::Interpreter, Backend::Jit] {
        let (result, out) = capture_output(|| run_source(NESTED_LOOPS, backend, &config));
        assert_eq!(result.unwrap(), 312.0, "{backend:?}");
        assert_eq!(out, "a|\nrows 4.0\n", "{backend:?}");
    }
}

#[test]
fn test_optimized_jit_matches_interpreter() {
    let module = lower_source(PROGRAM, "opt").unwrap();
    let (fast, _) = capture_output(|| {
        run_module(&module, Backend::Jit, &CodegenConfig::optimized()).unwrap()
    });
    let (slow, _) = capture_output(|| {
        run_module(&module, Backend::Interpreter, &CodegenConfig::default()).unwrap()
    });
    assert_eq!(fast, slow);
}

#[test]
fn test_lowering_errors_surface() {
    let err = lower_source("FUNC main() { RETURN nope(1) }", "bad").unwrap_err();
    assert!(format!("{err:#}").contains("Unknown function 'nope'"));

    let err = lower_source("FUNC main() { RETURN 1 +", "bad").unwrap_err();
    assert!(format!("{err:#}").contains("Syntax error"));
}

#[test]
fn test_missing_main() {
    let err = run_source(
        "FUNC helper() { RETURN 1 }",
        Backend::Interpreter,
        &CodegenConfig::default(),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("main"));
}

#[test]
fn test_emit_object() {
    let bytes = emit_object(PROGRAM, "prog.vsl", &CodegenConfig::default()).unwrap();
    assert!(bytes.len() > 16);
}

#[test]
fn test_shell_commands() {
    let mut shell = interpreter_shell();
    assert_eq!(shell.prompt(), ">>> ");
    assert_eq!(shell.feed_line("").unwrap(), Reply::Idle);
    assert!(matches!(shell.feed_line("H").unwrap(), Reply::Output(help) if help.contains("(Q)uit")));
    assert_eq!(shell.feed_line("Q").unwrap(), Reply::Quit);
}

#[test]
fn test_shell_accumulates_state() {
    let mut shell = interpreter_shell();
    let replies = feed(
        &mut shell,
        &[
            "VAR x",
            "x := 5",
            "FUNC twice(v) { RETURN v * 2 }",
            "PRINT x, \" \", twice(x)",
        ],
    );
    assert!(replies.iter().all(|r| *r == Reply::Accepted));

    let (reply, out) = capture_output(|| shell.feed_line("E").unwrap());
    assert_eq!(reply, Reply::Executed(0.0));
    assert_eq!(out, "5.0 10.0");

    match shell.feed_line("P").unwrap() {
        Reply::Output(listing) => {
            assert!(listing.contains("function %twice(f64) -> f64"));
            assert!(listing.contains("function %main() -> f64"));
        }
        other => panic!("expected a listing, got {other:?}"),
    }
}

#[test]
fn test_shell_multiline_input() {
    let mut shell = interpreter_shell();
    let replies = feed(
        &mut shell,
        &["FUNC sq(v) \\", "{", "    RETURN v * v", "}", ""],
    );
    assert_eq!(
        replies,
        vec![Reply::More, Reply::More, Reply::More, Reply::More, Reply::Accepted]
    );
    assert_eq!(shell.prompt(), ">>> ");

    shell.feed_line("RETURN sq(9)").unwrap();
    assert_eq!(shell.execute().unwrap(), 81.0);
}

#[test]
fn test_shell_interrupt_discards_pending_input() {
    let mut shell = interpreter_shell();
    assert_eq!(shell.feed_line("VAR y \\").unwrap(), Reply::More);
    assert_eq!(shell.prompt(), "... ");
    shell.interrupt();
    assert_eq!(shell.prompt(), ">>> ");
    assert!(shell.feed_line("y := 1").is_err());
}

#[test]
fn test_shell_recovers_from_bad_input() {
    let mut shell = interpreter_shell();
    feed(&mut shell, &["VAR a", "a := 2"]);

    assert!(shell.feed_line("PRINT undefined_fn()").is_err());
    assert!(shell.feed_line("a := := 3").is_err());
    assert!(shell.feed_line("FUNC main() { RETURN 0 }").is_err());

    shell.feed_line("RETURN a").unwrap();
    let (result, out) = capture_output(|| shell.execute().unwrap());
    assert_eq!(result, 2.0);
    assert_eq!(out, "");
}

#[test]
fn test_shell_jit_execution() {
    let mut shell = Shell::default();
    feed(&mut shell, &["VAR n", "n := 4", "PRINT \"n=\", n", "RETURN n / 8"]);
    let (result, out) = capture_output(|| shell.execute().unwrap());
    assert_eq!(result, 0.5);
    assert_eq!(out, "n=4.0");

    // A second run starts from fresh globals again.
    let (again, _) = capture_output(|| shell.execute().unwrap());
    assert_eq!(again, 0.5);
}
