//! Stylescope - command-line tool for building scoped CSS from style sources

use std::process::ExitCode;

use stylescope::cli;

fn main() -> ExitCode {
    cli::run()
}
