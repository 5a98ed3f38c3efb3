use std::process::ExitCode;

use repowatch::ui::output;

fn main() -> ExitCode {
    match repowatch::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
