//! Terminal output utilities

use console::style;

use nodegraph::{CycleError, GraphError};

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{}: {}", style("error").red().bold(), message);
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{}: {}", style("warning").yellow().bold(), message);
}

/// Print an info message to stderr, keeping stdout for command output
pub fn print_info(message: &str) {
    eprintln!("{}: {}", style("info").blue().bold(), message);
}

/// Report a command failure, with hints when the cause is a kernel error
pub fn report(err: &anyhow::Error) {
    if let Some(cycle) = err.downcast_ref::<CycleError<String>>() {
        cycle.display_with_hints();
    } else if let Some(graph) = err.chain().find_map(|e| e.downcast_ref::<GraphError>()) {
        // Outermost context first, then the kernel error with its hint
        if err.downcast_ref::<GraphError>().is_none() {
            print_error(&err.to_string());
        }
        graph.display_with_hints();
    } else {
        print_error(&format!("{:#}", err));
    }
}
