//! Snippet tests for the compiler pipeline and VM as a whole, reproducing
//! the end-to-end scenarios from the design spec (§8).

use wisp::common::source::Source;
use wisp::{compile, run};

fn run_snippet(source: &str) -> String {
    let compiled = compile(Source::source(source)).expect("compile failed");
    let mut out = Vec::new();
    run(compiled, 8, &mut out).expect("run failed");
    String::from_utf8(out).expect("non-utf8 output")
}

#[test]
fn function_call_squares_its_argument() {
    let output = run_snippet("function f(x) return x*x end print(f(5))");
    assert_eq!(output, "25\n");
}

#[test]
fn map_for_loop_visits_every_pair_exactly_once() {
    let output = run_snippet("t = {a=1, b=2} for k,v in t do print(k,v) end");
    let mut lines: Vec<&str> = output.lines().collect();
    lines.sort();
    assert_eq!(lines, vec!["a\t1", "b\t2"]);
}

#[test]
fn coroutine_yields_in_order_then_reports_dead() {
    let output = run_snippet(
        "c = coroutine(function() yield(1) yield(2) yield(3) end) \
         print(resume(c)) print(resume(c)) print(resume(c)) print(resume(c))",
    );
    assert_eq!(output, "1\n2\n3\nfalse\tcannot resume dead coroutine\n");
}

#[test]
fn vec_for_loop_accumulates_a_sum() {
    let output = run_snippet("a = [1,2,3] s = 0 for i in a do s = s + i end print(s)");
    assert_eq!(output, "6\n");
}

#[test]
fn recursive_fibonacci_of_ten() {
    let output = run_snippet(
        "function fib(n) if n < 2 then return n else return fib(n-1)+fib(n-2) end end print(fib(10))",
    );
    assert_eq!(output, "55\n");
}

#[test]
fn count_and_concat_on_strings() {
    let output = run_snippet("s = \"hello\" print(#s) print(s .. \" world\")");
    assert_eq!(output, "5\nhello world\n");
}

#[test]
fn while_loop_with_break_and_continue() {
    let output = run_snippet(
        "i = 0 s = 0 \
         while i < 10 do \
           i = i + 1 \
           if i == 5 then continue end \
           if i == 8 then break end \
           s = s + i \
         end \
         print(s)",
    );
    // 1+2+3+4 (5 skipped by continue) + 6+7 (8 breaks before adding) = 23
    assert_eq!(output, "23\n");
}

#[test]
fn method_call_dispatches_through_self() {
    let output = run_snippet(
        "counter = {n = 0} \
         function bump() self.n = self.n + 1 return self.n end \
         print(counter:bump()) print(counter:bump())",
    );
    assert_eq!(output, "1\n2\n");
}

#[test]
fn pattern_match_captures_groups() {
    let output = run_snippet("print(\"2026-07-28\" ~ [[(\\d+)-(\\d+)-(\\d+)]])");
    assert_eq!(output, "2026-07-28\t2026\t07\t28\n");
}

#[test]
fn resuming_a_running_coroutine_is_a_syntax_level_program_but_dead_resume_is_not_fatal() {
    let output = run_snippet(
        "c = coroutine(function() yield(\"hi\") end) \
         print(resume(c)) \
         print(resume(c))",
    );
    assert_eq!(output, "hi\nfalse\tcannot resume dead coroutine\n");
}
