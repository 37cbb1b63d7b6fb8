//! Behavioural guarantees of rendering and dependency extraction, checked
//! through the public API across every registered backend.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rulesmith::deps::{extract, DepStatus, DepStore, ExtractContext};
use rulesmith::toolchain::{registry, GCC_LIKE, MSVC_LIKE};
use rulesmith::{
    select, Action, DependencyMode, DependencyParseError, ErrorScope, ParseErrorPolicy,
    RuleError, RuleInvocation, VariableOverrides,
};

fn sample_invocation(action: Action) -> RuleInvocation {
    RuleInvocation::new(action, "out/target").inputs(["in/a", "in/b"])
}

#[test]
fn test_every_backend_defines_every_action() {
    let registry = registry().unwrap();
    for name in registry.names() {
        for action in Action::ALL {
            assert!(
                registry.get_template(&name, action).is_ok(),
                "{} is missing {}",
                name,
                action
            );
        }
    }
}

#[test]
fn test_rendering_is_deterministic() {
    for name in registry().unwrap().names() {
        let tc = select(&name, VariableOverrides::new().with("cflags", "-O2 -g")).unwrap();
        for action in Action::ALL {
            let inv = sample_invocation(action);
            let first = tc.render(&inv).unwrap();
            let second = tc.render(&inv).unwrap();
            assert_eq!(first.command.tokens(), second.command.tokens());
            assert_eq!(first.description, second.description);
        }
    }
}

#[test]
fn test_overrides_beat_descriptor_defaults() {
    let cases = [
        (GCC_LIKE, "cc", "gcc", Action::CompileC),
        (GCC_LIKE, "ar", "ar", Action::Archive),
        (MSVC_LIKE, "cl", "cl", Action::CompileC),
        (MSVC_LIKE, "link", "link", Action::LinkExe),
    ];

    for (backend, var, default, action) in cases {
        let tc = select(backend, VariableOverrides::new().with(var, "custom-tool")).unwrap();
        let tokens = tc.render(&sample_invocation(action)).unwrap().command.tokens();
        assert!(tokens.contains(&"custom-tool".to_string()));
        assert!(!tokens.contains(&default.to_string()));
    }
}

#[test]
fn test_link_inputs_keep_order_and_duplicates() {
    for name in registry().unwrap().names() {
        let tc = select(&name, VariableOverrides::new()).unwrap();
        let inv = RuleInvocation::new(Action::LinkExe, "app").inputs(["a.o", "b.o", "liba.a", "a.o"]);
        let args = tc.render(&inv).unwrap().command.args;

        let positional: Vec<&str> = args
            .iter()
            .map(String::as_str)
            .filter(|a| ["a.o", "b.o", "liba.a"].contains(a))
            .collect();
        assert_eq!(positional, vec!["a.o", "b.o", "liba.a", "a.o"]);
    }
}

#[test]
fn test_description_is_tag_and_output() {
    let tc = select(MSVC_LIKE, VariableOverrides::new()).unwrap();
    let rule = tc
        .render(&RuleInvocation::new(Action::Archive, "lib/foo.lib").input("a.obj"))
        .unwrap();
    assert_eq!(rule.description, "AR lib/foo.lib");
}

#[test]
fn test_zero_inputs_rejected_for_every_action() {
    let tc = select(GCC_LIKE, VariableOverrides::new()).unwrap();
    for action in Action::ALL {
        let err = tc.render(&RuleInvocation::new(action, "out")).unwrap_err();
        assert!(matches!(err, RuleError::InvalidInvocation { .. }));
        assert_eq!(err.scope(), ErrorScope::Build);
    }
}

#[test]
fn test_depfile_round_trip() {
    let ctx = ExtractContext::new("out.o", "/work");
    let extracted = extract(DependencyMode::GccDepfile, "out.o: a.h b.h", &ctx).unwrap();

    let expected: BTreeSet<PathBuf> = ["/work/a.h", "/work/b.h"].iter().map(PathBuf::from).collect();
    assert_eq!(extracted.record.output, PathBuf::from("/work/out.o"));
    assert_eq!(extracted.record.dependencies, expected);
}

#[test]
fn test_stdout_scan_round_trip() {
    let ctx = ExtractContext::new("main.obj", "/work");
    let stdout = "main.c\nNote: including file: C:\\a.h\nmain.c(7): error C2065: 'x': undeclared identifier\n";
    let extracted = extract(DependencyMode::MsvcStdoutScan, stdout, &ctx).unwrap();

    let deps: Vec<&Path> = extracted.record.dependencies.iter().map(PathBuf::as_path).collect();
    assert_eq!(deps, vec![Path::new("C:/a.h")]);
    assert_eq!(
        extracted.passthrough,
        vec!["main.c", "main.c(7): error C2065: 'x': undeclared identifier"]
    );
}

#[test]
fn test_malformed_depfile_does_not_fail_the_step() {
    let dir = tempfile::tempdir().unwrap();
    let tc = select(GCC_LIKE, VariableOverrides::new()).unwrap();
    let rule = tc
        .render(&RuleInvocation::new(Action::CompileC, "main.o").input("main.c"))
        .unwrap();

    std::fs::write(dir.path().join("main.o.d"), "main.o main.c a.h\n").unwrap();

    let mut store = DepStore::default();
    let report = tc.finish_step(
        &rule,
        "main.c:1: warning: unused\n",
        dir.path(),
        &mut store,
        ParseErrorPolicy::default(),
    );

    match &report.status {
        DepStatus::Degraded { error, .. } => {
            assert_eq!(*error, DependencyParseError::MissingColon { line: 1 });
            assert_eq!(error.scope(), ErrorScope::Bookkeeping);
        }
        other => panic!("expected degraded status, got {:?}", other),
    }
    assert_eq!(report.passthrough, vec!["main.c:1: warning: unused"]);
    assert!(store.is_empty());
}

#[test]
fn test_finish_step_records_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    let tc = select(GCC_LIKE, VariableOverrides::new()).unwrap();
    let rule = tc
        .render(
            &RuleInvocation::new(Action::CompileC, "obj/main.o")
                .input("src/main.c")
                .extra_output("deps/main.d"),
        )
        .unwrap();
    assert_eq!(rule.depfile.as_deref(), Some(Path::new("deps/main.d")));

    std::fs::create_dir_all(dir.path().join("deps")).unwrap();
    std::fs::write(
        dir.path().join("deps/main.d"),
        "obj/main.o: src/main.c include/a.h\n",
    )
    .unwrap();

    let mut store = DepStore::default();
    let report = tc.finish_step(&rule, "", dir.path(), &mut store, ParseErrorPolicy::Warn);
    assert_eq!(report.status, DepStatus::Recorded { dependencies: 1 });

    let deps = store.get(&report.output).unwrap();
    assert!(deps.iter().all(|p| p.ends_with("include/a.h")));
}

#[test]
fn test_truncated_depfile_does_not_replace_record() {
    let dir = tempfile::tempdir().unwrap();
    let tc = select(GCC_LIKE, VariableOverrides::new()).unwrap();
    let rule = tc
        .render(&RuleInvocation::new(Action::CompileC, "out.o").input("out.c"))
        .unwrap();
    let depfile = dir.path().join("out.o.d");

    let mut store = DepStore::default();
    std::fs::write(&depfile, "out.o: out.c a.h \\\n  b.h \\\n  c.h\n").unwrap();
    let report = tc.finish_step(&rule, "", dir.path(), &mut store, ParseErrorPolicy::Warn);
    assert_eq!(report.status, DepStatus::Recorded { dependencies: 3 });

    // Cut off right after a continuation, as a cancelled compile leaves it
    std::fs::write(&depfile, "out.o: out.c a.h \\\n").unwrap();

    let report = tc.finish_step(&rule, "", dir.path(), &mut store, ParseErrorPolicy::Warn);
    match &report.status {
        DepStatus::Degraded { error, .. } => {
            assert_eq!(*error, DependencyParseError::UnterminatedContinuation { line: 1 });
        }
        other => panic!("expected degraded status, got {:?}", other),
    }
    assert_eq!(store.get(&report.output).map(|deps| deps.len()), Some(3));

    let report = tc.finish_step(&rule, "", dir.path(), &mut store, ParseErrorPolicy::MarkStale);
    assert!(report.is_degraded());
    assert!(store.get(&report.output).is_none());
}

#[test]
fn test_cancelled_step_leaves_no_depfile() {
    let dir = tempfile::tempdir().unwrap();
    let tc = select(GCC_LIKE, VariableOverrides::new()).unwrap();
    let rule = tc
        .render(&RuleInvocation::new(Action::CompileCxx, "a.o").input("a.cpp"))
        .unwrap();

    let mut store = DepStore::default();
    let report = tc.finish_step(&rule, "", dir.path(), &mut store, ParseErrorPolicy::MarkStale);
    assert!(report.is_degraded());
    assert!(report.warning().is_some());
}

#[test]
fn test_msvc_finish_step_uses_stdout() {
    let tc = select(MSVC_LIKE, VariableOverrides::new()).unwrap();
    let rule = tc
        .render(&RuleInvocation::new(Action::CompileCxx, "obj/a.obj").input("src/a.cpp"))
        .unwrap();

    let mut store = DepStore::default();
    let report = tc.finish_step(
        &rule,
        "a.cpp\nNote: including file: C:\\sdk\\vector\n",
        Path::new("C:/proj"),
        &mut store,
        ParseErrorPolicy::default(),
    );

    assert_eq!(report.output, PathBuf::from("C:/proj/obj/a.obj"));
    assert_eq!(report.status, DepStatus::Recorded { dependencies: 1 });
    assert_eq!(report.passthrough, vec!["a.cpp"]);
}

#[test]
fn test_unregistered_backend_is_an_error() {
    let err = select("clang-cl", VariableOverrides::new()).unwrap_err();
    assert!(matches!(err, RuleError::UnknownBackend { ref name, .. } if name == "clang-cl"));

    assert!(matches!(
        select("GCC-LIKE", VariableOverrides::new()),
        Err(RuleError::UnknownBackend { .. })
    ));
}
