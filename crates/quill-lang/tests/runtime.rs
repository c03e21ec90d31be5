//! Evaluation tests.
//!
//! Each test compiles and runs a whole script against a fresh state, then
//! inspects the variables it left behind.

use std::rc::Rc;

use futures::executor::block_on;
use quill_lang::{
    build_initial_state, interpret, Callbacks, CanvasCommand, ErrorCode, Host, InterpretError,
    Settings, SignalKind, State, Value,
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

struct Silent;

impl Host for Silent {
    fn output(&self, _chunk: &str) {}
    fn canvas(&self, _command: CanvasCommand) {}
}

fn fresh() -> State {
    build_initial_state(Callbacks::new(Rc::new(Silent)), &Settings::default())
}

fn run(src: &str) -> State {
    let mut state = fresh();
    block_on(interpret(src, &mut state)).unwrap_or_else(|e| panic!("script failed: {e}"));
    state
}

fn run_err(src: &str) -> InterpretError {
    let mut state = fresh();
    match block_on(interpret(src, &mut state)) {
        Ok(()) => panic!("expected the script to fail"),
        Err(e) => e,
    }
}

fn runtime_err(src: &str) -> quill_lang::RuntimeError {
    match run_err(src) {
        InterpretError::Runtime(e) => e,
        other => panic!("expected a runtime error, got: {other:?}"),
    }
}

fn n(state: &State, key: &str) -> f64 {
    match state.get(key) {
        Some(Value::Number(x)) => *x,
        other => panic!("expected Number for '{key}', got: {other:?}"),
    }
}

fn s(state: &State, key: &str) -> String {
    match state.get(key) {
        Some(Value::Str(x)) => x.clone(),
        other => panic!("expected Str for '{key}', got: {other:?}"),
    }
}

fn b(state: &State, key: &str) -> bool {
    match state.get(key) {
        Some(Value::Bool(x)) => *x,
        other => panic!("expected Bool for '{key}', got: {other:?}"),
    }
}

fn nums(state: &State, key: &str) -> Vec<f64> {
    match state.get(key) {
        Some(Value::Array(rc)) => rc.borrow().iter().map(|v| match v {
            Value::Number(x) => *x,
            other => panic!("array element not Number: {other:?}"),
        }).collect(),
        other => panic!("expected Array for '{key}', got: {other:?}"),
    }
}

// ─── Arithmetic and precedence ───────────────────────────────────────────────

#[test]
fn multiplication_binds_tighter() {
    let st = run("x = 2 + 3 * 4;");
    assert_eq!(n(&st, "x"), 14.0);
}

#[test]
fn grouping_overrides_precedence() {
    let st = run("x = (2 + 3) * 4");
    assert_eq!(n(&st, "x"), 20.0);
}

#[test]
fn subtraction_is_left_associative() {
    let st = run("x = 10 - 3 - 2; y = 24 / 4 / 2");
    assert_eq!(n(&st, "x"), 5.0);
    assert_eq!(n(&st, "y"), 3.0);
}

#[test]
fn unary_minus_and_not() {
    let st = run("a = -3 + 1; t = not false; u = not 0; v = not 'x'");
    assert_eq!(n(&st, "a"), -2.0);
    assert!(b(&st, "t"));
    assert!(b(&st, "u"));
    assert!(!b(&st, "v"));
}

#[test]
fn plus_concatenates_with_strings() {
    let st = run(r#"a = "n=" + 1; b = 1 + 2 + "3"; c = "3" * "4""#);
    assert_eq!(s(&st, "a"), "n=1");
    assert_eq!(s(&st, "b"), "33");
    assert_eq!(n(&st, "c"), 12.0);
}

#[test]
fn division_by_zero_is_infinite() {
    let st = run("x = 1 / 0; y = 1 / 0 + ''");
    assert!(n(&st, "x").is_infinite());
    assert_eq!(s(&st, "y"), "Infinity");
}

#[test]
fn relational_on_strings_is_lexicographic() {
    let st = run(r#"a = "apple" < "banana"; b = "10" < "9"; c = 10 < 9; d = "10" < 9"#);
    assert!(b(&st, "a"));
    assert!(b(&st, "b"));
    assert!(!b(&st, "c"));
    assert!(!b(&st, "d"));
}

#[test]
fn loose_equality_coerces() {
    let st = run(r#"
        a = 1 == "1"
        b = null == undefined
        c = 0 == false
        d = null == 0
        e = "x" != "y"
        f = [1] == [1]
    "#);
    assert!(b(&st, "a"));
    assert!(b(&st, "b"));
    assert!(b(&st, "c"));
    assert!(!b(&st, "d"));
    assert!(b(&st, "e"));
    assert!(!b(&st, "f"));
}

#[test]
fn logical_operators_return_operands() {
    let st = run(r#"a = 0 or "fallback"; b = 1 and 2; c = null || 0"#);
    assert_eq!(s(&st, "a"), "fallback");
    assert_eq!(n(&st, "b"), 2.0);
    assert_eq!(n(&st, "c"), 0.0);
}

// ─── Conditionals ────────────────────────────────────────────────────────────

#[test]
fn if_else_takes_then_branch() {
    let st = run(r#"if (1 < 2) x = "yes"; else x = "no"; end"#);
    assert_eq!(s(&st, "x"), "yes");
}

#[test]
fn elseif_chain_picks_first_match() {
    let src = r#"
        v = 5
        if (v < 0)
            r = "neg"
        elseif (v < 3)
            r = "small"
        elseif (v < 10)
            r = "medium"
        elseif (v < 100)
            r = "large"
        else
            r = "huge"
        end
    "#;
    assert_eq!(s(&run(src), "r"), "medium");
}

#[test]
fn if_without_match_does_nothing() {
    let st = run("x = 1; if (x > 5) x = 2; elseif (x > 3) x = 3; end");
    assert_eq!(n(&st, "x"), 1.0);
}

// ─── Loops ───────────────────────────────────────────────────────────────────

#[test]
fn while_counts_up() {
    let st = run("i=0; while (i<3) i=i+1; end");
    assert_eq!(n(&st, "i"), 3.0);
}

#[test]
fn for_binds_counter_in_order() {
    let st = run("seen = []; for (i, 3) seen.push(i); end");
    assert_eq!(nums(&st, "seen"), vec![0.0, 1.0, 2.0]);
    assert_eq!(n(&st, "i"), 2.0);
}

#[test]
fn for_count_is_evaluated_once() {
    let st = run("k = 3; runs = 0; for (i, k) k = 10; runs = runs + 1; end");
    assert_eq!(n(&st, "runs"), 3.0);
}

#[test]
fn for_with_zero_count_skips_body() {
    let st = run("runs = 0; for (i, 0) runs = 1; end");
    assert_eq!(n(&st, "runs"), 0.0);
    assert!(st.get("i").is_none());
}

#[test]
fn break_and_continue() {
    let src = "
        total = 0
        i = 0
        while (true)
            i++
            if (i > 10) break; end
            if (i == 2 or i == 4) continue; end
            total += i
        end
    ";
    let st = run(src);
    assert_eq!(n(&st, "total"), 49.0);
    assert_eq!(n(&st, "i"), 11.0);
}

#[test]
fn break_only_leaves_innermost_loop() {
    let src = "
        hits = 0
        for (i, 3)
            for (j, 10)
                if (j == 2) break; end
                hits += 1
            end
        end
    ";
    assert_eq!(n(&run(src), "hits"), 6.0);
}

// ─── Functions ───────────────────────────────────────────────────────────────

#[test]
fn function_returns_value() {
    let st = run("function add(a,b); return a+b; end y = add(2,3);");
    assert_eq!(n(&st, "y"), 5.0);
    assert!(st.get("a").is_none());
    assert!(st.get("b").is_none());
}

#[test]
fn parameters_restore_previous_values() {
    let st = run(r#"a = "outer"; function f(a); a = a * 2; return a; end r = f(21)"#);
    assert_eq!(n(&st, "r"), 42.0);
    assert_eq!(s(&st, "a"), "outer");
}

#[test]
fn non_parameter_assignments_leak_to_caller() {
    let st = run("function f(x); leaked = x + 1; end f(1)");
    assert_eq!(n(&st, "leaked"), 2.0);
}

#[test]
fn recursion_restores_parameters_per_call() {
    let src = "
        function fact(n)
            if (n <= 1) return 1; end
            return n * fact(n - 1)
        end
        r = fact(5)
    ";
    let st = run(src);
    assert_eq!(n(&st, "r"), 120.0);
    assert!(st.get("n").is_none());
}

const COUNT_DOWN: &str = "
    function count(k)
        if (k == 0) return 0; end
        return 1 + count(k - 1)
    end
";

// Debug builds need more stack per call level than the default test thread.
fn on_big_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new()
        .stack_size(64 << 20)
        .spawn(f)
        .expect("spawn")
        .join()
        .expect("script thread panicked")
}

#[test]
fn runaway_recursion_is_a_runtime_error() {
    let (line, message, leaked) = on_big_stack(|| {
        let mut state = fresh();
        let err = block_on(interpret(&format!("{COUNT_DOWN}\nr = count(100000)"), &mut state)).unwrap_err();
        let InterpretError::Runtime(e) = err else { panic!("expected runtime error, got {err:?}") };
        (e.line, e.message, state.get("k").is_some())
    });
    assert_eq!(message, "maximum call depth exceeded");
    assert_eq!(line, 4);
    assert!(!leaked, "parameters restored while unwinding");
}

#[test]
fn recursion_within_depth_limit_succeeds() {
    let r = on_big_stack(|| n(&run(&format!("{COUNT_DOWN}\nr = count(150)")), "r"));
    assert_eq!(r, 150.0);
}

#[test]
fn call_depth_limit_is_configurable() {
    let settings = Settings { max_call_depth: 3, ..Settings::default() };
    let mut state = build_initial_state(Callbacks::new(Rc::new(Silent)), &settings);
    block_on(interpret(&format!("{COUNT_DOWN}\na = count(2)"), &mut state)).unwrap();
    assert_eq!(n(&state, "a"), 2.0);
    let err = block_on(interpret("b = count(3)", &mut state)).unwrap_err();
    assert!(matches!(err, InterpretError::Runtime(e) if e.message == "maximum call depth exceeded"));
}

#[test]
fn missing_arguments_are_undefined() {
    let st = run("function f(a, b); return b; end r = f(1); t = r == undefined");
    assert!(b(&st, "t"));
}

#[test]
fn bare_return_yields_null_and_fallthrough_undefined() {
    let st = run("function f(); return; end function g(); end a = f() == null; b = g(); c = b == undefined");
    assert!(b(&st, "a"));
    assert!(b(&st, "c"));
}

#[test]
fn functions_are_values() {
    let st = run("function twice(f, x); return f(f(x)); end function inc(v); return v + 1; end r = twice(inc, 5)");
    assert_eq!(n(&st, "r"), 7.0);
}

#[test]
fn parameters_restored_after_error() {
    let mut state = fresh();
    let res = block_on(interpret("p = 1; function f(p); missing(); end f(2)", &mut state));
    assert!(res.is_err());
    assert!(matches!(state.get("p"), Some(Value::Number(x)) if *x == 1.0));
}

// ─── Evaluation order ────────────────────────────────────────────────────────

// Eager logic is the language's observed behaviour and kept as such.
#[test]
fn logical_and_evaluates_both_sides() {
    let st = run("sideEffects = []; function se(); sideEffects.push(1); return true; end r = false and se();");
    assert_eq!(nums(&st, "sideEffects"), vec![1.0]);
    assert!(!b(&st, "r"));
}

#[test]
fn logical_or_evaluates_both_sides() {
    let st = run("calls = 0; function se(); calls += 1; return false; end r = true or se() or se();");
    assert_eq!(n(&st, "calls"), 2.0);
    assert!(b(&st, "r"));
}

#[test]
fn call_arguments_evaluate_left_to_right() {
    let st = run("log = []; function t(v); log.push(v); return v; end function f(a, b, c); end f(t(1), t(2), t(3))");
    assert_eq!(nums(&st, "log"), vec![1.0, 2.0, 3.0]);
}

#[test]
fn object_literal_is_fresh_each_visit() {
    let src = "
        made = []
        c = 0
        for (i, 2)
            c += 1
            made.push({ n: c })
        end
        same = made[0] == made[1]
        first = made[0].n
        second = made[1].n
    ";
    let st = run(src);
    assert!(!b(&st, "same"));
    assert_eq!(n(&st, "first"), 1.0);
    assert_eq!(n(&st, "second"), 2.0);
}

#[test]
fn postfix_update_returns_old_value() {
    let st = run("i = 5; a = i++; b = i--; c = i");
    assert_eq!(n(&st, "a"), 5.0);
    assert_eq!(n(&st, "b"), 6.0);
    assert_eq!(n(&st, "c"), 5.0);
}

#[test]
fn compound_assignment_on_places() {
    let st = run("o = { n: 1 }; o.n += 4; xs = [1, 2]; xs[1] *= 10; s = 'a'; s += 'b'");
    assert_eq!(nums(&st, "xs"), vec![1.0, 20.0]);
    assert_eq!(s(&st, "s"), "ab");
    let Some(Value::Object(o)) = st.get("o") else { panic!("o missing") };
    assert!(matches!(o.borrow().get("n"), Some(Value::Number(x)) if *x == 5.0));
}

#[test]
fn assignment_chains_right_to_left() {
    let st = run("a = b = 3");
    assert_eq!(n(&st, "b"), 3.0);
    assert!(matches!(st.get("a"), Some(Value::Undefined)));
}

// ─── Interpolation ───────────────────────────────────────────────────────────

#[test]
fn interpolation_substitutes_variables() {
    let st = run(r#"name="world"; s="hi ${name}";"#);
    assert_eq!(s(&st, "s"), "hi world");
}

#[test]
fn interpolation_evaluates_expressions_in_current_state() {
    let src = r#"
        out = []
        for (i, 2)
            out.push("${i}: ${i * 10 + 1}")
        end
        first = out[0]
        second = out[1]
        dotted = "${[1, 2].length} ${'ab'.toUpperCase()}"
    "#;
    let st = run(src);
    assert_eq!(s(&st, "first"), "0: 1");
    assert_eq!(s(&st, "second"), "1: 11");
    assert_eq!(s(&st, "dotted"), "2 AB");
}

#[test]
fn interpolation_dollar_shorthand() {
    let st = run(r#"v = 7; s = "v=${$v}""#);
    assert_eq!(s(&st, "s"), "v=7");
}

#[test]
fn interpolation_errors_report_literal_line() {
    let err = runtime_err("\n\ns = \"a ${nope} b\"");
    assert_eq!(err.line, 3);
    assert!(err.message.contains("undefined variable `nope`"), "{}", err.message);
}

#[test]
fn marker_closes_at_first_brace() {
    let err = runtime_err(r#"s = "${ {a: 1}.a }""#);
    assert!(err.message.starts_with("in `${ {a: 1}`"), "{}", err.message);
}

#[test]
fn interpolation_ignores_trailing_tokens() {
    let st = run(r#"a = 1; b = 2; s = "[${a b}] [${b + 1 )}]""#);
    assert_eq!(s(&st, "s"), "[1] [3]");
}

// ─── Arrays, objects and strings ─────────────────────────────────────────────

#[test]
fn nested_member_and_index_chains() {
    let src = "
        data = { items: [ { name: 'a', tags: ['x', 'y'] } ] }
        t = data.items[0].tags[1]
        k = data['items'][0]['name']
    ";
    let st = run(src);
    assert_eq!(s(&st, "t"), "y");
    assert_eq!(s(&st, "k"), "a");
}

#[test]
fn missing_property_is_undefined() {
    let st = run("o = {}; m = o.nope == undefined; x = [1][5] == undefined");
    assert!(b(&st, "m"));
    assert!(b(&st, "x"));
}

#[test]
fn index_writes_pad_with_undefined() {
    let st = run("xs = []; xs[2] = 9; len = xs.length; gap = xs[0] == undefined");
    assert_eq!(n(&st, "len"), 3.0);
    assert!(b(&st, "gap"));
}

#[test]
fn array_length_assignment_truncates() {
    let st = run("xs = [1, 2, 3, 4]; xs.length = 2");
    assert_eq!(nums(&st, "xs"), vec![1.0, 2.0]);
}

#[test]
fn arrays_are_shared_by_reference() {
    let st = run("a = [1]; b = a; b.push(2); same = a == b");
    assert_eq!(nums(&st, "a"), vec![1.0, 2.0]);
    assert!(b(&st, "same"));
}

#[test]
fn bound_methods_keep_receiver() {
    let st = run("xs = [3]; push = xs.push; push(4); up = 'abc'.toUpperCase; u = up()");
    assert_eq!(nums(&st, "xs"), vec![3.0, 4.0]);
    assert_eq!(s(&st, "u"), "ABC");
}

#[test]
fn array_methods() {
    let st = run("
        xs = [1, 2, 3, 4]
        last = xs.pop()
        first = xs.shift()
        mid = xs.slice(0, 1)
        found = xs.indexOf(3)
        has = xs.includes(9)
        xs.reverse()
    ");
    assert_eq!(n(&st, "last"), 4.0);
    assert_eq!(n(&st, "first"), 1.0);
    assert_eq!(nums(&st, "mid"), vec![2.0]);
    assert_eq!(n(&st, "found"), 1.0);
    assert!(!b(&st, "has"));
    assert_eq!(nums(&st, "xs"), vec![3.0, 2.0]);
}

#[test]
fn string_methods() {
    let st = run(r#"
        parts = "a,b,c".split(",")
        joined = parts.join("-")
        n = parts.length
        has = "hello".includes("ell")
        at = "hello".indexOf("l")
        trimmed = "  pad ".trim()
    "#);
    assert_eq!(s(&st, "joined"), "a-b-c");
    assert_eq!(n(&st, "n"), 3.0);
    assert!(b(&st, "has"));
    assert_eq!(n(&st, "at"), 2.0);
    assert_eq!(s(&st, "trimmed"), "pad");
}

#[test]
fn string_index_reads_characters() {
    let st = run("c = 'héllo'[1]; len = 'héllo'.length");
    assert_eq!(s(&st, "c"), "é");
    assert_eq!(n(&st, "len"), 5.0);
}

#[test]
fn object_keys_keep_insertion_order() {
    let st = run("o = { b: 1, a: 2 }; o.c = 3; o.b = 4");
    let Some(Value::Object(o)) = st.get("o") else { panic!("o missing") };
    let o = o.borrow();
    assert_eq!(o.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    assert!(matches!(o.get("b"), Some(Value::Number(x)) if *x == 4.0));
}

#[test]
fn config_is_visible_and_mutable() {
    let st = run("v = config.version; config.autosave = true");
    assert_eq!(s(&st, "v"), "1.0");
    assert!(matches!(st.config.borrow().get("autosave"), Some(Value::Bool(true))));
}

#[test]
fn math_namespace() {
    let st = run("a = math.round(2.5); b = math.floor(-1.5); c = math.pow(2, 10); r = math.random(); ok = r >= 0 and r < 1");
    assert_eq!(n(&st, "a"), 3.0);
    assert_eq!(n(&st, "b"), -2.0);
    assert_eq!(n(&st, "c"), 1024.0);
    assert!(b(&st, "ok"));
}

// ─── Signals ─────────────────────────────────────────────────────────────────

#[test]
fn exit_stops_quietly() {
    let st = run("a = 1; exit(); a = 2");
    assert_eq!(n(&st, "a"), 1.0);
}

#[test]
fn exit_unwinds_through_calls_and_loops() {
    let st = run("function f(); while (true) exit(); end end n = 0; f(); n = 1");
    assert_eq!(n(&st, "n"), 0.0);
}

#[test]
fn return_at_top_level_is_uncaught_signal() {
    assert!(matches!(run_err("x = 1; return x;"), InterpretError::UncaughtSignal(SignalKind::Return)));
}

// A function declared inside a loop body may still contain `break`; calling
// it from outside any loop lets the signal escape.
#[test]
fn break_escaping_function_is_uncaught_signal() {
    let src = "
        k = 0
        while (k < 1)
            k = k + 1
            function stop() break; end
        end
        stop()
    ";
    assert!(matches!(run_err(src), InterpretError::UncaughtSignal(SignalKind::Break)));
}

#[test]
fn break_inside_called_function_stops_callers_loop() {
    let src = "
        runs = 0
        while (true)
            function stop() break; end
            runs += 1
            stop()
            runs = 100
        end
    ";
    assert_eq!(n(&run(src), "runs"), 1.0);
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[test]
fn lex_errors_abort_before_running() {
    let mut state = fresh();
    let err = block_on(interpret("ran = 1\nx = 1 @ 2 ~ 3", &mut state)).unwrap_err();
    let InterpretError::Compile(errs) = err else { panic!("expected compile errors") };
    assert_eq!(errs.len(), 2);
    assert!(errs.iter().all(|e| e.code == ErrorCode::L001 && e.code.is_lex()));
    assert_eq!(errs[0].line, 2);
    assert!(state.get("ran").is_none());
}

#[test]
fn parse_errors_abort_before_running() {
    let mut state = fresh();
    let err = block_on(interpret("ran = 1; if (x", &mut state)).unwrap_err();
    let InterpretError::Compile(errs) = err else { panic!("expected compile errors") };
    assert_eq!(errs[0].code, ErrorCode::P003);
    assert!(errs[0].code.is_parse());
    assert!(state.get("ran").is_none());
}

#[test]
fn break_outside_loop_is_a_compile_error() {
    let InterpretError::Compile(errs) = run_err("ran = 1; break;") else { panic!("expected compile error") };
    assert_eq!(errs[0].code, ErrorCode::P005);
    let InterpretError::Compile(errs) = run_err("continue") else { panic!("expected compile error") };
    assert_eq!(errs[0].code, ErrorCode::P006);
}

#[test]
fn invalid_assignment_target() {
    let InterpretError::Compile(errs) = run_err("1 = x") else { panic!("expected compile error") };
    assert_eq!(errs[0].code, ErrorCode::P004);
}

#[test]
fn undefined_variable() {
    let err = runtime_err("x = 1\ny = z + 1");
    assert_eq!(err.line, 2);
    assert!(err.message.contains("undefined variable `z`"));
}

#[test]
fn calling_a_non_function() {
    let err = runtime_err("x = 5; x()");
    assert!(err.message.contains("`x` is not a function"), "{}", err.message);
    let err = runtime_err("o = {}; o.go()");
    assert!(err.message.contains("`go` is not a function"), "{}", err.message);
}

#[test]
fn member_of_null_names_property() {
    let err = runtime_err("o = null\n\nv = o.field");
    assert_eq!(err.line, 3);
    assert!(err.message.contains("field"), "{}", err.message);
    assert!(err.message.contains("null"), "{}", err.message);
}

#[test]
fn index_of_undefined_names_index() {
    let err = runtime_err("u = undefined; v = u[4]");
    assert!(err.message.contains('4'), "{}", err.message);
    assert!(err.message.contains("undefined"), "{}", err.message);
}

#[test]
fn state_survives_runtime_errors() {
    let mut state = fresh();
    assert!(block_on(interpret("before = 1; boom(); after = 1", &mut state)).is_err());
    assert!(state.get("before").is_some());
    assert!(state.get("after").is_none());
}

#[test]
fn state_persists_across_runs() {
    let mut state = fresh();
    block_on(interpret("counter = 1; function bump(); counter += 1; end", &mut state)).unwrap();
    block_on(interpret("bump(); bump()", &mut state)).unwrap();
    assert_eq!(n(&state, "counter"), 3.0);
}

// ─── Lexer leniency ──────────────────────────────────────────────────────────

#[test]
fn unterminated_comment_is_accepted() {
    let st = run("x = 1 # trailing comment without newline");
    assert_eq!(n(&st, "x"), 1.0);
}

#[test]
fn unterminated_string_runs_to_end() {
    let st = run("x = 'open ended");
    assert_eq!(s(&st, "x"), "open ended");
}

#[test]
fn escapes_decode() {
    let st = run(r#"x = "a\tb\\c\"d\q""#);
    assert_eq!(s(&st, "x"), "a\tb\\c\"dq");
}
