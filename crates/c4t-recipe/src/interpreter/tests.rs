use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use super::*;

/// Driver that records jobs instead of running a compiler.
#[derive(Default)]
struct RecordingDriver {
    jobs: RefCell<Vec<CompileJob>>,
    /// Fail this many calls before succeeding.
    failures: Cell<usize>,
}

impl RecordingDriver {
    fn failing(times: usize) -> Self {
        let driver = Self::default();
        driver.failures.set(times);
        driver
    }

    fn jobs(&self) -> Vec<CompileJob> {
        self.jobs.borrow().clone()
    }
}

impl Driver for RecordingDriver {
    fn run_compiler(
        &self,
        job: &CompileJob,
        sink: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<(), DriverError> {
        if cancel.is_cancelled() {
            return Err(DriverError::Cancelled);
        }
        writeln!(sink, "compiling {}", job.output.display())?;
        if self.failures.get() > 0 {
            self.failures.set(self.failures.get() - 1);
            return Err(DriverError::Failed {
                command: "cc".to_string(),
                code: 1,
                first_line: "error: flaky".to_string(),
            });
        }
        self.jobs.borrow_mut().push(job.clone());
        Ok(())
    }
}

fn recipe(output: Output, files: &[&str], instructions: Vec<Instruction>) -> Recipe {
    Recipe::builder("d")
        .output(output)
        .add_files(files.iter().copied())
        .add_instructions(instructions)
        .build()
}

fn paths(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(|n| Path::new("d").join(n)).collect()
}

fn run(driver: &RecordingDriver, recipe: Recipe) -> Result<(), InterpretError> {
    Interpreter::builder()
        .driver(driver)
        .build(recipe)
        .unwrap()
        .interpret(&CancelToken::new())
}

#[test]
fn test_missing_driver() {
    let result = Interpreter::builder().build(Recipe::default());
    assert!(matches!(result, Err(Error::DriverMissing)));
}

#[test]
fn test_empty_recipe() {
    let driver = RecordingDriver::default();
    run(&driver, Recipe::default()).unwrap();
    assert!(driver.jobs().is_empty());
}

#[test]
fn test_push_same_input_twice() {
    let driver = RecordingDriver::default();
    let err = run(
        &driver,
        recipe(
            Output::Object,
            &["a", "b"],
            vec![Instruction::push_input("a"), Instruction::push_input("a")],
        ),
    )
    .unwrap_err();
    assert_eq!(err.pc, 1);
    assert!(matches!(
        err.source,
        Error::FileUnavailable {
            reason: Unavailable::Consumed,
            ..
        }
    ));
}

#[test]
fn test_push_undeclared_input() {
    let driver = RecordingDriver::default();
    let err = run(
        &driver,
        recipe(Output::Object, &["a"], vec![Instruction::push_input("z")]),
    )
    .unwrap_err();
    assert_eq!(err.pc, 0);
    assert!(matches!(
        err.source,
        Error::FileUnavailable {
            reason: Unavailable::Undeclared,
            ref file,
        } if file == "z"
    ));
    assert!(err.to_string().contains("push_input \"z\""), "{err}");
}

#[test]
fn test_push_inputs_selects_by_kind() {
    let driver = RecordingDriver::default();
    let mut interp = Interpreter::builder()
        .driver(&driver)
        .build(recipe(
            Output::Object,
            &["body.c", "body.h"],
            vec![Instruction::PushInputs {
                kind: FileKind::C_SRC,
            }],
        ))
        .unwrap();
    interp.interpret(&CancelToken::new()).unwrap();
    assert_eq!(interp.staged(), ["body.c"]);
    assert!(!interp.is_available("body.c"));
    assert!(interp.is_available("body.h"));
}

#[test]
fn test_push_inputs_skips_consumed_and_keeps_order() {
    let driver = RecordingDriver::default();
    let mut interp = Interpreter::builder()
        .driver(&driver)
        .build(recipe(
            Output::Object,
            &["c.c", "a.c", "x.h", "b.c"],
            vec![
                Instruction::push_input("a.c"),
                Instruction::PushInputs { kind: FileKind::C },
            ],
        ))
        .unwrap();
    interp.interpret(&CancelToken::new()).unwrap();
    assert_eq!(interp.staged(), ["a.c", "c.c", "x.h", "b.c"]);
}

#[test]
fn test_object_counter_and_overflow() {
    let driver = RecordingDriver::default();
    let mut interp = Interpreter::builder()
        .driver(&driver)
        .max_objs(3)
        .build(recipe(
            Output::Object,
            &[],
            vec![Instruction::CompileObj { npops: 1 }; 4],
        ))
        .unwrap();
    let err = interp.interpret(&CancelToken::new()).unwrap_err();

    assert_eq!(err.pc, 3);
    assert!(matches!(err.source, Error::ObjOverflow { max: 3 }));
    let outputs: Vec<_> = driver.jobs().into_iter().map(|j| j.output).collect();
    assert_eq!(outputs, paths(&["obj_0.o", "obj_1.o", "obj_2.o"]));
    assert_eq!(interp.objs_allocated(), 3);
}

#[test]
fn test_objects_are_restaged() {
    let driver = RecordingDriver::default();
    let mut interp = Interpreter::builder()
        .driver(&driver)
        .build(recipe(
            Output::Executable,
            &["a.c", "b.c"],
            vec![
                Instruction::push_input("a.c"),
                Instruction::CompileObj { npops: 1 },
                Instruction::push_input("b.c"),
                Instruction::CompileObj { npops: 1 },
                Instruction::CompileExe { npops: 2 },
            ],
        ))
        .unwrap();
    interp.interpret(&CancelToken::new()).unwrap();

    let jobs = driver.jobs();
    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs[0].target, Target::Object);
    assert_eq!(jobs[0].inputs, paths(&["a.c"]));
    assert_eq!(jobs[1].inputs, paths(&["b.c"]));
    assert_eq!(jobs[2].target, Target::Executable);
    assert_eq!(jobs[2].inputs, paths(&["obj_0.o", "obj_1.o"]));
    assert_eq!(jobs[2].output, PathBuf::from("d/a.out"));
    assert!(interp.staged().is_empty());
    assert!(interp.is_done());
    // Objects live on the stack only, never in the input pool.
    assert!(!interp.is_available("obj_0.o"));
}

#[test]
fn test_pop_all_shorthand() {
    for npops in [0, -1, 7] {
        let driver = RecordingDriver::default();
        run(
            &driver,
            recipe(
                Output::Object,
                &["a.c", "b.c", "c.c"],
                vec![
                    Instruction::PushInputs { kind: FileKind::ANY },
                    Instruction::CompileObj { npops },
                ],
            ),
        )
        .unwrap();
        assert_eq!(
            driver.jobs()[0].inputs,
            paths(&["a.c", "b.c", "c.c"]),
            "npops = {npops}"
        );
    }
}

#[test]
fn test_partial_pop_takes_top_oldest_first() {
    let driver = RecordingDriver::default();
    let mut interp = Interpreter::builder()
        .driver(&driver)
        .build(recipe(
            Output::Object,
            &["a.c", "b.c", "c.c"],
            vec![
                Instruction::PushInputs { kind: FileKind::ANY },
                Instruction::CompileObj { npops: 2 },
            ],
        ))
        .unwrap();
    interp.interpret(&CancelToken::new()).unwrap();
    assert_eq!(driver.jobs()[0].inputs, paths(&["b.c", "c.c"]));
    assert_eq!(interp.staged(), ["a.c", "obj_0.o"]);
}

#[test]
fn test_exe_requires_executable_output() {
    for output in [Output::Nothing, Output::Object] {
        let driver = RecordingDriver::default();
        let err = run(
            &driver,
            recipe(output, &["a.c"], vec![Instruction::CompileExe { npops: 0 }]),
        )
        .unwrap_err();
        assert!(matches!(err.source, Error::BadOutput(o) if o == output));
        assert!(driver.jobs().is_empty());
    }
}

#[test]
fn test_custom_output_path_and_sink() {
    let driver = RecordingDriver::default();
    let mut log = Vec::new();
    {
        let mut interp = Interpreter::builder()
            .driver(&driver)
            .sink(&mut log)
            .output_path("bin/test")
            .build(
                Recipe::builder("d")
                    .add_files(["a.c"])
                    .compile_all_c_to_exe()
                    .build(),
            )
            .unwrap();
        interp.interpret(&CancelToken::new()).unwrap();
    }
    assert_eq!(driver.jobs()[0].output, PathBuf::from("bin/test"));
    assert_eq!(String::from_utf8(log).unwrap(), "compiling bin/test\n");
}

#[test]
fn test_driver_failure_keeps_state_for_retry() {
    let driver = RecordingDriver::failing(1);
    let mut interp = Interpreter::builder()
        .driver(&driver)
        .build(recipe(
            Output::Object,
            &["a.c"],
            vec![
                Instruction::push_input("a.c"),
                Instruction::CompileObj { npops: 1 },
            ],
        ))
        .unwrap();

    let err = interp.interpret(&CancelToken::new()).unwrap_err();
    assert_eq!(err.pc, 1);
    assert!(matches!(err.source, Error::Driver(DriverError::Failed { .. })));
    assert_eq!(interp.pc(), 1);
    assert_eq!(interp.staged(), ["a.c"]);
    assert_eq!(interp.objs_allocated(), 1);

    // The retry compiles the same inputs under a fresh object name.
    interp.interpret(&CancelToken::new()).unwrap();
    let jobs = driver.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].inputs, paths(&["a.c"]));
    assert_eq!(jobs[0].output, PathBuf::from("d/obj_1.o"));
    assert_eq!(interp.staged(), ["obj_1.o"]);
}

#[test]
fn test_cancelled_driver_call() {
    let driver = RecordingDriver::default();
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut interp = Interpreter::builder()
        .driver(&driver)
        .build(
            Recipe::builder("d")
                .add_files(["a.c"])
                .compile_all_c_to_exe()
                .build(),
        )
        .unwrap();
    let err = interp.interpret(&cancel).unwrap_err();
    assert_eq!(err.pc, 1);
    assert!(matches!(err.source, Error::Driver(DriverError::Cancelled)));
    assert_eq!(interp.staged(), ["a.c"]);
}
