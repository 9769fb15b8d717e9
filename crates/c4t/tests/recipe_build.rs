//! Builds small recipes with the host C compiler.
//!
//! Skipped when no `cc` is on the path.

use std::fs;
use std::path::Path;
use std::process::Command;

use c4t::{Error, GccDriver, Instruction, Output, Recipe, RunOptions, run_recipe};

fn have_cc() -> bool {
    Command::new("cc")
        .arg("--version")
        .output()
        .is_ok_and(|out| out.status.success())
}

fn write_sources(dir: &Path) {
    fs::write(dir.join("body.h"), "int body(void);\n").unwrap();
    fs::write(
        dir.join("body.c"),
        "#include \"body.h\"\nint body(void) { return 0; }\n",
    )
    .unwrap();
    fs::write(
        dir.join("main.c"),
        "#include \"body.h\"\nint main(void) { return body(); }\n",
    )
    .unwrap();
}

#[test]
fn test_build_via_objects() {
    if !have_cc() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());

    let recipe = Recipe::builder(dir.path())
        .output(Output::Executable)
        .add_files(["body.c", "body.h", "main.c"])
        .add_instructions([
            Instruction::push_input("body.c"),
            Instruction::CompileObj { npops: 1 },
            Instruction::push_input("main.c"),
            Instruction::CompileObj { npops: 1 },
            Instruction::CompileExe { npops: 0 },
        ])
        .build();
    run_recipe(recipe, &GccDriver::new("cc"), &RunOptions::default())
        .result
        .unwrap();

    assert!(dir.path().join("obj_0.o").exists());
    assert!(dir.path().join("obj_1.o").exists());
    let status = Command::new(dir.path().join("a.out")).status().unwrap();
    assert!(status.success());
}

#[test]
fn test_build_all_sources_at_once() {
    if !have_cc() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let exe = dir.path().join("sb");

    let recipe = Recipe::builder(dir.path())
        .add_files(["body.c", "body.h", "main.c"])
        .compile_all_c_to_exe()
        .build();
    let options = RunOptions::default().with_output(Some(exe.clone()));
    run_recipe(recipe, &GccDriver::new("cc"), &options).result.unwrap();
    assert!(exe.exists());
}

#[test]
fn test_compiler_error_is_reported() {
    if !have_cc() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.c"), "int main(void) { return }\n").unwrap();

    let recipe = Recipe::builder(dir.path())
        .add_files(["broken.c"])
        .compile_file_to_obj("broken.c")
        .build();
    let run = run_recipe(recipe, &GccDriver::new("cc"), &RunOptions::default());
    // The full diagnostics survive the failure, not just the first line.
    assert!(String::from_utf8_lossy(&run.log).contains("broken.c"));
    let err = run.result.unwrap_err();
    let Error::Build(err) = err else {
        panic!("expected build error, got {err}");
    };
    assert_eq!(err.pc, 1);
    assert!(matches!(
        err.source,
        c4t::recipe::Error::Driver(c4t::DriverError::Failed { .. })
    ));
}
