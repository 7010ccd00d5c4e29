//! Reporting errors to the user.

use std::{backtrace::BacktraceStatus, fmt};

use anyhow::Error;

/// Support for displaying an error with its complete chain of causes.
pub trait DisplayCausesExt {
    /// Display the error and its causes, plus a backtrace if one was
    /// captured (see `RUST_BACKTRACE`).
    fn display_causes_and_backtrace(&self) -> DisplayCauses<'_>;

    /// Display the error and its causes only.
    fn display_causes(&self) -> DisplayCauses<'_>;
}

impl DisplayCausesExt for Error {
    fn display_causes_and_backtrace(&self) -> DisplayCauses<'_> {
        DisplayCauses {
            err: self,
            show_backtrace: true,
        }
    }

    fn display_causes(&self) -> DisplayCauses<'_> {
        DisplayCauses {
            err: self,
            show_backtrace: false,
        }
    }
}

/// Helper type used to display errors.
pub struct DisplayCauses<'a> {
    err: &'a Error,
    show_backtrace: bool,
}

impl fmt::Display for DisplayCauses<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.err)?;
        for cause in self.err.chain().skip(1) {
            writeln!(f, "  caused by: {}", cause)?;
        }

        let backtrace = self.err.backtrace();
        if self.show_backtrace && backtrace.status() == BacktraceStatus::Captured {
            write!(f, "{}", backtrace)?;
        }
        Ok(())
    }
}

/// Generate a `main` function which calls the specified function. If the
/// function returns `Result::Err(_)`, then `main` will print the error and exit
/// with a non-zero status code.
#[macro_export]
macro_rules! quick_main {
    ($wrapped:ident) => {
        fn main() {
            if let Err(err) = $wrapped() {
                use ::std::io::Write;
                use $crate::errors::DisplayCausesExt;
                let stderr = ::std::io::stderr();
                write!(&mut stderr.lock(), "{}", err.display_causes_and_backtrace())
                    .expect("Error occurred while trying to display error");
                ::std::process::exit(1);
            }
        }
    };
}

#[test]
fn displays_every_cause() {
    use anyhow::Context as _;

    let err = std::fs::File::open("/nonexistent/taskenv/task.json")
        .context("can't open task file")
        .context("can't load task")
        .expect_err("file should not exist");
    let displayed = err.display_causes().to_string();
    let lines = displayed.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "ERROR: can't load task");
    assert_eq!(lines[1], "  caused by: can't open task file");
    assert!(lines[2].starts_with("  caused by: "));
    assert_eq!(lines.len(), 3);
}
