//! Command lines with a parallel display form.

use std::fmt;
use std::path::Path;

/// Mask shown in place of secret arguments
pub const SECRET_MASK: &str = "***";

/// An external command: the argv that is executed plus the string that is logged.
///
/// The display form is built alongside argv, one argument at a time, so a
/// secret only ever enters argv while the display receives [`SECRET_MASK`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    display: String,
}

impl CommandLine {
    /// Start a command line for `program`
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            display: program.clone(),
            program,
            args: Vec::new(),
        }
    }

    /// Append a plain argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        let arg = arg.into();
        self.display.push(' ');
        self.display.push_str(&arg);
        self.args.push(arg);
        self
    }

    /// Append several plain arguments
    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        args.into_iter().fold(self, |cmd, arg| cmd.arg(arg))
    }

    /// Append an argument shown in double quotes (paths)
    pub fn quoted(mut self, arg: impl Into<String>) -> Self {
        let arg = arg.into();
        self.display.push_str(&format!(" \"{arg}\""));
        self.args.push(arg);
        self
    }

    /// Append a path argument shown in double quotes
    pub fn path(self, path: &Path) -> Self {
        self.quoted(path.display().to_string())
    }

    /// Append a secret argument, masked in the display form
    pub fn secret(mut self, arg: impl Into<String>) -> Self {
        self.display.push(' ');
        self.display.push_str(SECRET_MASK);
        self.args.push(arg.into());
        self
    }

    /// Program to execute
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program
    pub fn argv(&self) -> &[String] {
        &self.args
    }

    /// Loggable form of the command line
    pub fn display(&self) -> &str {
        &self.display
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}
