//! Printer discovery and resolution
//!
//! Supports:
//! - Windows spooler printers (via Win32 API)
//! - CUPS destinations (via `lpstat`)

use crate::error::{PrintError, PrintResult};
use std::fmt;
use tracing::{debug, info, warn};

/// A printer resolved once at startup and reused for every dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterHandle {
    name: String,
    is_default: bool,
}

impl PrinterHandle {
    /// A printer selected explicitly by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_default: false,
        }
    }

    /// The OS default printer (or the first one found when no default is set)
    pub fn system_default(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_default: true,
        }
    }

    /// Get the printer name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this handle stands for the default printer
    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

impl fmt::Display for PrinterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default {
            write!(f, "{} (default)", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// List installed printers
pub async fn list_printers() -> PrintResult<Vec<String>> {
    platform::list().await
}

/// Get the default printer name
pub async fn default_printer() -> PrintResult<Option<String>> {
    platform::default_printer().await
}

/// Resolve a printer name against the installed printers
///
/// An empty or missing name means the default printer, falling back to the
/// first available one.
pub async fn resolve(name: Option<&str>) -> PrintResult<PrinterHandle> {
    let available = list_printers().await?;
    let default = default_printer().await?;
    let handle = resolve_from(name, &available, default)?;
    info!(printer = %handle, "Printer resolved");
    Ok(handle)
}

/// Resolution rules, separated from the OS queries
pub fn resolve_from(
    name: Option<&str>,
    available: &[String],
    default: Option<String>,
) -> PrintResult<PrinterHandle> {
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        if available.iter().any(|p| p == name) {
            return Ok(PrinterHandle::named(name));
        }
        return Err(PrintError::PrinterNotFound(name.to_string()));
    }

    if let Some(default) = default {
        return Ok(PrinterHandle::system_default(default));
    }

    debug!("No default printer set, using first available");
    available
        .first()
        .cloned()
        .map(PrinterHandle::system_default)
        .ok_or(PrintError::NoPrinters)
}

/// Parse `lpstat -a` output: one destination per line, name first
#[cfg_attr(not(unix), allow(dead_code))]
pub(crate) fn parse_lpstat_destinations(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Parse `lpstat -d` output
#[cfg_attr(not(unix), allow(dead_code))]
pub(crate) fn parse_lpstat_default(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (_, name) = line.split_once("system default destination:")?;
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    })
}

#[cfg(unix)]
mod platform {
    use super::{parse_lpstat_default, parse_lpstat_destinations};
    use crate::error::{PrintError, PrintResult};
    use tokio::process::Command;
    use tracing::warn;

    async fn lpstat(arg: &str) -> PrintResult<Option<String>> {
        let output = Command::new("lpstat")
            .arg(arg)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PrintError::Unsupported("lpstat not found, is CUPS installed?".to_string())
                } else {
                    PrintError::Io(e)
                }
            })?;

        if !output.status.success() {
            // lpstat exits non-zero when no destinations exist
            warn!(
                arg,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "lpstat reported no destinations"
            );
            return Ok(None);
        }

        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }

    pub(super) async fn list() -> PrintResult<Vec<String>> {
        Ok(lpstat("-a")
            .await?
            .map(|out| parse_lpstat_destinations(&out))
            .unwrap_or_default())
    }

    pub(super) async fn default_printer() -> PrintResult<Option<String>> {
        Ok(lpstat("-d")
            .await?
            .and_then(|out| parse_lpstat_default(&out)))
    }
}

#[cfg(windows)]
mod platform {
    use crate::error::{PrintError, PrintResult};

    pub(super) async fn list() -> PrintResult<Vec<String>> {
        use windows::Win32::Graphics::Printing::{
            EnumPrintersW, PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL, PRINTER_INFO_5W,
        };
        use windows::core::PWSTR;

        unsafe {
            let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
            let mut needed: u32 = 0;
            let mut returned: u32 = 0;

            let _ = EnumPrintersW(flags, None, 5, None, &mut needed, &mut returned);

            if needed == 0 {
                return Ok(Vec::new());
            }

            let mut buf: Vec<u8> = vec![0; needed as usize];
            EnumPrintersW(
                flags,
                None,
                5,
                Some(buf.as_mut_slice()),
                &mut needed,
                &mut returned,
            )
            .map_err(|_| PrintError::WindowsPrinter("EnumPrintersW failed".to_string()))?;

            let ptr = buf.as_ptr() as *const PRINTER_INFO_5W;
            let slice = std::slice::from_raw_parts(ptr, returned as usize);

            let mut result: Vec<String> = Vec::new();
            for info in slice.iter() {
                if info.pPrinterName.is_null() {
                    continue;
                }
                let name = PWSTR(info.pPrinterName.0).to_string().unwrap_or_default();

                let port = if info.pPortName.is_null() {
                    String::new()
                } else {
                    PWSTR(info.pPortName.0).to_string().unwrap_or_default()
                };

                if !is_virtual_port(&port) {
                    result.push(name);
                }
            }

            Ok(result)
        }
    }

    /// Ports that never reach paper (print-to-file, XPS, OneNote, fax)
    fn is_virtual_port(port: &str) -> bool {
        let p = port.to_lowercase();
        p == "file:"
            || p == "portprompt:"
            || p == "xpsport:"
            || p.starts_with("onenote")
            || p == "nul:"
            || p == "shrfax:"
            || p.starts_with("wfsport:")
    }

    pub(super) async fn default_printer() -> PrintResult<Option<String>> {
        get_default()
    }

    pub(crate) fn get_default() -> PrintResult<Option<String>> {
        use windows::Win32::Graphics::Printing::GetDefaultPrinterW;
        use windows::core::PWSTR;

        unsafe {
            let mut needed: u32 = 0;
            let _ = GetDefaultPrinterW(None, &mut needed);

            if needed == 0 {
                return Ok(None);
            }

            let mut buf: Vec<u16> = vec![0; needed as usize];
            let ok = GetDefaultPrinterW(Some(PWSTR(buf.as_mut_ptr())), &mut needed);

            if !ok.as_bool() {
                return Ok(None);
            }

            let name = PWSTR(buf.as_mut_ptr())
                .to_string()
                .map_err(|e| PrintError::WindowsPrinter(format!("UTF-16 decode failed: {}", e)))?;

            Ok(Some(name))
        }
    }

    pub(crate) fn set_default(name: &str) -> PrintResult<()> {
        use windows::Win32::Graphics::Printing::SetDefaultPrinterW;
        use windows::core::PCWSTR;

        let name_w: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
        let ok = unsafe { SetDefaultPrinterW(PCWSTR::from_raw(name_w.as_ptr())) };
        if !ok.as_bool() {
            return Err(PrintError::WindowsPrinter(format!(
                "SetDefaultPrinterW failed for {}",
                name
            )));
        }
        Ok(())
    }
}

#[cfg(not(any(unix, windows)))]
mod platform {
    use crate::error::{PrintError, PrintResult};

    pub(super) async fn list() -> PrintResult<Vec<String>> {
        Err(PrintError::Unsupported("printer enumeration".to_string()))
    }

    pub(super) async fn default_printer() -> PrintResult<Option<String>> {
        Ok(None)
    }
}

#[cfg(windows)]
pub(crate) use platform::{
    get_default as windows_default_printer, set_default as windows_set_default_printer,
};

/// Log the available printers, used when resolution fails
pub async fn log_available_printers() {
    match list_printers().await {
        Ok(printers) if printers.is_empty() => warn!("No printers found"),
        Ok(printers) => {
            for p in printers {
                info!(printer = %p, "Available printer");
            }
        }
        Err(e) => warn!(error = %e, "Failed to enumerate printers"),
    }
}
