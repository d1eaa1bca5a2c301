use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode, Stdio};

#[derive(Debug)]
struct AppError {
    code: u8,
    message: String,
}

impl AppError {
    fn usage(message: impl Into<String>) -> Self {
        Self {
            code: 2,
            message: message.into(),
        }
    }

    fn command(message: impl Into<String>) -> Self {
        Self {
            code: 1,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Step {
    name: &'static str,
    program: &'static str,
    args: &'static [&'static str],
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.message);
            ExitCode::from(err.code)
        }
    }
}

fn run() -> Result<(), AppError> {
    let mut args = env::args().skip(1);
    let Some(subcommand) = args.next() else {
        return Err(AppError::usage(usage()));
    };

    if args.next().is_some() {
        return Err(AppError::usage(format!(
            "Unexpected extra arguments for `{subcommand}`.\n\n{}",
            usage()
        )));
    }

    match subcommand.as_str() {
        "ci" => run_ci(),
        "fuzz-smoke" => run_fuzz_smoke(),
        "bench-check" => run_bench_check(),
        "release-check" => run_release_check(),
        "help" | "--help" | "-h" => {
            println!("{}", usage());
            Ok(())
        }
        _ => Err(AppError::usage(format!(
            "Unknown xtask subcommand `{subcommand}`.\n\n{}",
            usage()
        ))),
    }
}

fn run_ci() -> Result<(), AppError> {
    let steps = [
        Step {
            name: "Format check",
            program: "cargo",
            args: &["fmt", "--all", "--", "--check"],
        },
        Step {
            name: "Clippy lint",
            program: "cargo",
            args: &[
                "clippy",
                "--workspace",
                "--all-targets",
                "--",
                "-D",
                "warnings",
            ],
        },
        Step {
            name: "Workspace tests",
            program: "cargo",
            args: &["test", "--workspace"],
        },
    ];

    run_steps("ci", &steps)
}

const FUZZ_MANIFEST: &str = "fuzz/Cargo.toml";
const FUZZ_SEEDS: &str = "fuzz/seeds";
const FUZZ_HOOKS: &[&str] = &[
    "config_limits_hook",
    "link_scan_hook",
    "script_parse_hook",
    "traffic_decode_hook",
];

fn run_fuzz_smoke() -> Result<(), AppError> {
    if !Path::new(FUZZ_MANIFEST).exists() {
        println!("No fuzz hooks detected at `{FUZZ_MANIFEST}`; running baseline smoke check.");
        let fallback = [Step {
            name: "Workspace check",
            program: "cargo",
            args: &["check", "--workspace", "--all-targets"],
        }];
        return run_steps("fuzz-smoke", &fallback);
    }

    let steps = [Step {
        name: "Build fuzz hooks",
        program: "cargo",
        args: &["build", "--manifest-path", FUZZ_MANIFEST, "--bins"],
    }];
    run_steps("fuzz-smoke", &steps)?;

    let mut replayed = 0_usize;
    for hook in FUZZ_HOOKS {
        for seed in seed_files(hook)? {
            run_hook(hook, &seed)?;
            replayed += 1;
        }
    }
    println!("Replayed {replayed} seed input(s) through {} hook(s).", FUZZ_HOOKS.len());
    Ok(())
}

fn seed_files(hook: &str) -> Result<Vec<PathBuf>, AppError> {
    let dir = Path::new(FUZZ_SEEDS).join(hook);
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(&dir).map_err(|error| {
        AppError::command(format!("Failed to list seeds in {}: {error}", dir.display()))
    })?;

    let mut seeds = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|error| {
                AppError::command(format!("Failed to list seeds in {}: {error}", dir.display()))
            })?
            .path();
        if path.is_file() {
            seeds.push(path);
        }
    }
    seeds.sort();
    Ok(seeds)
}

fn run_hook(hook: &str, seed: &Path) -> Result<(), AppError> {
    let binary = Path::new("fuzz/target/debug").join(hook);
    println!("-> {hook} < {}", seed.display());
    let input = File::open(seed).map_err(|error| {
        AppError::command(format!("Failed to open seed {}: {error}", seed.display()))
    })?;
    let status = Command::new(&binary)
        .stdin(Stdio::from(input))
        .status()
        .map_err(|error| {
            AppError::command(format!(
                "Failed to launch hook `{hook}` ({}): {error}",
                binary.display()
            ))
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(AppError::command(format!(
            "Hook `{hook}` failed on {} with status {status}.",
            seed.display()
        )))
    }
}

fn run_bench_check() -> Result<(), AppError> {
    let steps = [Step {
        name: "Compile benchmarks",
        program: "cargo",
        args: &["bench", "-p", "vtraffic", "--no-run"],
    }];

    run_steps("bench-check", &steps)
}

fn run_release_check() -> Result<(), AppError> {
    let steps = [
        Step {
            name: "Workspace check",
            program: "cargo",
            args: &["check", "--workspace", "--all-targets"],
        },
        Step {
            name: "All-feature tests",
            program: "cargo",
            args: &["test", "--workspace", "--all-features"],
        },
        Step {
            name: "Release binary",
            program: "cargo",
            args: &["build", "--release", "-p", "vtraffic-cli"],
        },
        Step {
            name: "Documentation build",
            program: "cargo",
            args: &["doc", "--workspace", "--no-deps"],
        },
    ];

    run_steps("release-check", &steps)
}

fn run_steps(name: &str, steps: &[Step]) -> Result<(), AppError> {
    println!("Running xtask `{name}` with {} step(s).", steps.len());
    for step in steps {
        run_step(step)?;
    }
    println!("xtask `{name}` completed successfully.");
    Ok(())
}

fn run_step(step: &Step) -> Result<(), AppError> {
    println!("-> {}: {} {}", step.name, step.program, step.args.join(" "));
    let status = Command::new(step.program)
        .args(step.args)
        .status()
        .map_err(|error| {
            AppError::command(format!(
                "Failed to launch step `{}` ({} {}): {}",
                step.name,
                step.program,
                step.args.join(" "),
                error
            ))
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(AppError::command(format!(
            "Step `{}` failed with status {}.",
            step.name, status
        )))
    }
}

fn usage() -> &'static str {
    "Usage: cargo run -p xtask -- <subcommand>\n\nSubcommands:\n  ci             Run fmt, clippy, and workspace tests\n  fuzz-smoke     Build the fuzz hooks and replay fuzz/seeds through each one\n  bench-check    Compile the criterion benchmarks without running them\n  release-check  Run workspace check, all-feature tests, the release binary build, and docs build\n  help           Print this help\n\nExit codes:\n  0  Success\n  1  Command execution failure\n  2  Usage error"
}
