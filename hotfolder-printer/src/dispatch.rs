//! Print dispatch
//!
//! Submits a finished document to the print subsystem. Success means the
//! request was handed over, not that paper came out.

use crate::error::{PrintError, PrintResult};
use crate::printer::PrinterHandle;
use crate::process::{ChildGuard, Completion};
use crate::viewer;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Dispatch strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintMethod {
    /// Viewer command line (`/t <file> <printer>`)
    #[default]
    Acrobat,
    /// The OS "print" action registered for the file type
    ShellExecute,
}

/// Trait for print dispatchers
#[allow(async_fn_in_trait)]
pub trait Dispatcher {
    /// Submit `file` to the printer
    async fn dispatch(&self, file: &Path) -> PrintResult<()>;
}

/// Viewer subprocess settings
#[derive(Debug, Clone)]
pub struct ViewerOptions {
    /// Explicit executable, auto-discovered when `None`
    pub executable: Option<PathBuf>,
    /// Bounded wait on the viewer process
    pub timeout: Duration,
    /// The viewer stays open after printing, so still running at the timeout
    /// counts as submitted
    pub lingers: bool,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            executable: None,
            timeout: Duration::from_secs(10),
            lingers: true,
        }
    }
}

/// Prints through the viewer command line
#[derive(Debug, Clone)]
pub struct ViewerDispatcher {
    printer: PrinterHandle,
    options: ViewerOptions,
}

impl ViewerDispatcher {
    pub fn new(printer: PrinterHandle, options: ViewerOptions) -> Self {
        Self { printer, options }
    }
}

impl Dispatcher for ViewerDispatcher {
    #[instrument(skip(self, file), fields(file = %file.display(), printer = %self.printer))]
    async fn dispatch(&self, file: &Path) -> PrintResult<()> {
        ensure_exists(file)?;
        let exe = viewer::locate(self.options.executable.as_deref())?;

        info!(viewer = %exe.display(), "Printing with viewer");
        let args: [&OsStr; 3] = [
            OsStr::new("/t"),
            file.as_os_str(),
            OsStr::new(self.printer.name()),
        ];
        let guard = ChildGuard::spawn(&exe, args)?;

        match guard.wait_bounded(self.options.timeout).await? {
            Completion::Exited => {
                info!("Print job submitted");
                Ok(())
            }
            Completion::Lingering if self.options.lingers => {
                info!(timeout = ?self.options.timeout, "Print job submitted, closed lingering viewer");
                Ok(())
            }
            Completion::Lingering => Err(PrintError::Timeout(self.options.timeout)),
        }
    }
}

/// Prints through the OS file association
#[derive(Debug, Clone)]
pub struct ShellDispatcher {
    printer: PrinterHandle,
    timeout: Duration,
}

impl ShellDispatcher {
    pub fn new(printer: PrinterHandle, timeout: Duration) -> Self {
        Self { printer, timeout }
    }
}

impl Dispatcher for ShellDispatcher {
    #[instrument(skip(self, file), fields(file = %file.display(), printer = %self.printer))]
    async fn dispatch(&self, file: &Path) -> PrintResult<()> {
        ensure_exists(file)?;
        info!("Printing with shell print action");
        shell::print(file, &self.printer, self.timeout).await?;
        info!("Print job submitted");
        Ok(())
    }
}

/// Dispatcher selected by [`PrintMethod`]
#[derive(Debug, Clone)]
pub enum PrintDispatcher {
    Viewer(ViewerDispatcher),
    Shell(ShellDispatcher),
}

impl PrintDispatcher {
    pub fn new(method: PrintMethod, printer: PrinterHandle, options: ViewerOptions) -> Self {
        match method {
            PrintMethod::Acrobat => Self::Viewer(ViewerDispatcher::new(printer, options)),
            PrintMethod::ShellExecute => {
                warn!("Using shell print action; the document's handler may show UI");
                Self::Shell(ShellDispatcher::new(printer, options.timeout))
            }
        }
    }
}

impl Dispatcher for PrintDispatcher {
    async fn dispatch(&self, file: &Path) -> PrintResult<()> {
        match self {
            Self::Viewer(d) => d.dispatch(file).await,
            Self::Shell(d) => d.dispatch(file).await,
        }
    }
}

fn ensure_exists(file: &Path) -> PrintResult<()> {
    if file.is_file() {
        return Ok(());
    }
    Err(PrintError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("File not found: {}", file.display()),
    )))
}

/// OS default printer handling around the shell print verb
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(not(windows), allow(dead_code))]
enum DefaultSwap {
    /// Target already is the default
    Keep,
    /// Make the target the default, then restore `restore` if one was set
    Swap { restore: Option<String> },
}

#[cfg_attr(not(windows), allow(dead_code))]
fn plan_default_swap(printer: &PrinterHandle, current: Option<String>) -> DefaultSwap {
    if printer.is_default() || current.as_deref() == Some(printer.name()) {
        DefaultSwap::Keep
    } else {
        DefaultSwap::Swap { restore: current }
    }
}

#[cfg(windows)]
mod shell {
    use super::{DefaultSwap, plan_default_swap};
    use crate::error::{PrintError, PrintResult};
    use crate::printer::{PrinterHandle, windows_default_printer, windows_set_default_printer};
    use std::ffi::OsStr;
    use std::path::Path;
    use std::time::Duration;
    use tracing::warn;

    pub(super) async fn print(
        file: &Path,
        printer: &PrinterHandle,
        _timeout: Duration,
    ) -> PrintResult<()> {
        // ShellExecute is synchronous, run in blocking task
        let file = file.to_path_buf();
        let printer = printer.clone();
        tokio::task::spawn_blocking(move || print_blocking(&file, &printer))
            .await
            .map_err(|e| PrintError::WindowsPrinter(format!("Task join failed: {}", e)))?
    }

    /// The print verb always targets the default printer, so a named printer
    /// is made the default for the duration of the call.
    fn print_blocking(file: &Path, printer: &PrinterHandle) -> PrintResult<()> {
        let swap = if printer.is_default() {
            DefaultSwap::Keep
        } else {
            plan_default_swap(printer, windows_default_printer()?)
        };

        if let DefaultSwap::Swap { restore } = &swap {
            windows_set_default_printer(printer.name())?;
            if restore.is_none() {
                warn!(
                    printer = %printer.name(),
                    "No default printer was set, leaving this printer as the default"
                );
            }
        }

        let result = shell_execute_print(file);

        if let DefaultSwap::Swap {
            restore: Some(original),
        } = swap
            && let Err(e) = windows_set_default_printer(&original)
        {
            warn!(printer = %original, error = %e, "Failed to restore default printer");
        }

        result
    }

    fn shell_execute_print(file: &Path) -> PrintResult<()> {
        use windows::Win32::UI::Shell::ShellExecuteW;
        use windows::Win32::UI::WindowsAndMessaging::SW_HIDE;
        use windows::core::PCWSTR;

        fn to_wide(s: &OsStr) -> Vec<u16> {
            use std::os::windows::ffi::OsStrExt;
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let verb = to_wide(OsStr::new("print"));
        let file_w = to_wide(file.as_os_str());
        let dir_w = to_wide(file.parent().unwrap_or(Path::new(".")).as_os_str());

        let result = unsafe {
            ShellExecuteW(
                None,
                PCWSTR::from_raw(verb.as_ptr()),
                PCWSTR::from_raw(file_w.as_ptr()),
                PCWSTR::null(),
                PCWSTR::from_raw(dir_w.as_ptr()),
                SW_HIDE,
            )
        };

        // Values above 32 mean success
        if result.0 as isize <= 32 {
            return Err(PrintError::WindowsPrinter(format!(
                "ShellExecuteW print failed with code {}",
                result.0 as isize
            )));
        }
        Ok(())
    }
}

#[cfg(unix)]
mod shell {
    use crate::error::{PrintError, PrintResult};
    use crate::printer::PrinterHandle;
    use crate::process::{ChildGuard, Completion};
    use std::ffi::OsStr;
    use std::path::Path;
    use std::time::Duration;

    /// CUPS `lp` is the registered print action on Unix desktops
    pub(super) async fn print(
        file: &Path,
        printer: &PrinterHandle,
        timeout: Duration,
    ) -> PrintResult<()> {
        let mut args: Vec<&OsStr> = Vec::new();
        if !printer.is_default() {
            args.push(OsStr::new("-d"));
            args.push(OsStr::new(printer.name()));
        }
        args.push(file.as_os_str());

        let guard = ChildGuard::spawn(Path::new("lp"), args)?;
        match guard.wait_bounded(timeout).await? {
            Completion::Exited => Ok(()),
            Completion::Lingering => Err(PrintError::Timeout(timeout)),
        }
    }
}

#[cfg(not(any(unix, windows)))]
mod shell {
    use crate::error::{PrintError, PrintResult};
    use crate::printer::PrinterHandle;
    use std::path::Path;
    use std::time::Duration;

    pub(super) async fn print(
        _file: &Path,
        _printer: &PrinterHandle,
        _timeout: Duration,
    ) -> PrintResult<()> {
        Err(PrintError::Unsupported("shell print action".to_string()))
    }
}
