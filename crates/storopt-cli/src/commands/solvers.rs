use anyhow::Result;
use storopt_solver_common::{is_solver_installed, list_installed_solvers, solvers_dir, DEFAULT_SOLVER};

pub fn handle(default_solver: &str) -> Result<()> {
    let installed = list_installed_solvers();
    match solvers_dir() {
        Some(dir) if installed.is_empty() => println!("No solvers in {}", dir.display()),
        Some(dir) => {
            println!("Solvers in {}:", dir.display());
            for path in &installed {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                println!("  {name}");
            }
        }
        None => println!("Cannot determine home directory"),
    }

    let found = if is_solver_installed(default_solver) {
        "found"
    } else {
        "not found"
    };
    println!("Default solver: {default_solver} ({found})");
    if default_solver != DEFAULT_SOLVER {
        println!("  (built-in default is {DEFAULT_SOLVER})");
    }
    Ok(())
}
