// src/core/run_many.rs

use crate::{constants::DEFAULT_OUTPUT_STYLE, models::{PackageManager, RunManyOptions}};

/// Composes the `nx run-many ...` argument list for the given options.
///
/// The flag order is fixed; downstream scripts parse and snapshot this output.
/// Empty strings, a zero parallelism and an empty project list count as unset.
pub fn compose_run_many_command(options: &RunManyOptions) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(configuration) = non_empty(options.configuration.as_deref()) {
        args.push(format!("--configuration={}", configuration));
    }
    if let Some(runner) = non_empty(options.runner.as_deref()) {
        args.push(format!("--runner={}", runner));
    }
    if let Some(parallel) = options.parallel.filter(|n| *n > 0) {
        args.push(format!("--parallel={}", parallel));
    }
    if options.skip_cache {
        args.push("--skip-nx-cache".to_string());
    }
    if options.ignore_cycles {
        args.push("--nx-ignore-cycles".to_string());
    }
    if !options.no_bail {
        args.push("--nx-bail".to_string());
    }
    if let Some(projects) = options.projects.as_ref().filter(|p| !p.is_empty()) {
        args.push(format!("--projects={}", projects.join(",")));
    }
    if let Some(exclude) = non_empty(options.exclude.as_deref()) {
        args.push(format!("--exclude={}", exclude));
    }
    if options.verbose {
        args.push("--verbose".to_string());
    }

    let output_style = non_empty(options.output_style.as_deref()).unwrap_or(DEFAULT_OUTPUT_STYLE);
    let mut command = vec![
        "nx".to_string(),
        "run-many".to_string(),
        format!("--target={}", options.target),
        format!("--output-style={}", output_style),
    ];
    command.extend(args);
    command
}

/// Renders the full `nx run-many` command line behind the package manager's exec prefix.
pub fn exec_run_many_command(package_manager: PackageManager, options: &RunManyOptions) -> String {
    let command = package_manager.exec(compose_run_many_command(options).as_slice());
    log::trace!("Composed run-many command: {}", command);
    command
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
