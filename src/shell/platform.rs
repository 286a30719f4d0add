//! Locations of Windows system tools.
//!
//! Tools are addressed by absolute path under the Windows directory so a
//! planted `reg.exe` earlier on PATH is never picked up, and PowerShell is
//! always the 64-bit build (a 32-bit host would see the WOW64 view of the
//! registry and miss the TPM cmdlets).

use std::path::Path;

const DEFAULT_WINDOWS_DIR: &str = r"C:\Windows";

/// Absolute paths of the system executables the adapters invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemTools {
    /// 64-bit Windows PowerShell.
    pub powershell: String,
    /// Registry console tool.
    pub reg: String,
    /// Service control manager console tool.
    pub sc: String,
}

impl SystemTools {
    /// Resolve tool paths from the process environment.
    pub fn detect() -> Self {
        Self::detect_with_env(|key: &str| std::env::var(key))
    }

    /// Resolve tool paths with a custom env var lookup function.
    ///
    /// `WINDIR` wins over `SystemRoot`; both missing falls back to `C:\Windows`.
    pub fn detect_with_env<F>(env_fn: F) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let windows_dir = env_fn("WINDIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env_fn("SystemRoot").ok().filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_WINDOWS_DIR.to_string());
        Self::under(&windows_dir)
    }

    /// Tool paths below an explicit Windows directory.
    pub fn under(windows_dir: &str) -> Self {
        let base = windows_dir.trim_end_matches(['\\', '/']);
        Self {
            powershell: format!(r"{}\System32\WindowsPowerShell\v1.0\powershell.exe", base),
            reg: format!(r"{}\System32\reg.exe", base),
            sc: format!(r"{}\System32\sc.exe", base),
        }
    }

    /// The Windows directory these tools were resolved under.
    pub fn windows_dir(&self) -> &str {
        self.reg
            .strip_suffix(r"\System32\reg.exe")
            .unwrap_or(DEFAULT_WINDOWS_DIR)
    }

    /// File name of a tool path, for log and error messages.
    pub fn short_name(tool: &str) -> &str {
        tool.rsplit(['\\', '/']).next().unwrap_or(tool)
    }
}

impl Default for SystemTools {
    fn default() -> Self {
        Self::under(DEFAULT_WINDOWS_DIR)
    }
}

/// Check if running in a CI environment.
///
/// Used to suppress the progress spinner. Checks common CI environment
/// variables: `CI`, `GITHUB_ACTIONS`, `GITLAB_CI`, `CIRCLECI`, `TRAVIS`,
/// `JENKINS_URL`.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS", "JENKINS_URL"]
        .iter()
        .any(|var| std::env::var(var).is_ok())
}

/// Whether a Windows-style path names an existing directory on this host.
pub fn dir_exists(path: &str) -> bool {
    !path.is_empty() && Path::new(path).is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::VarError;

    #[test]
    fn prefers_windir() {
        let tools = SystemTools::detect_with_env(|key| match key {
            "WINDIR" => Ok(r"D:\Win".to_string()),
            "SystemRoot" => Ok(r"E:\Other".to_string()),
            _ => Err(VarError::NotPresent),
        });
        assert_eq!(
            tools.powershell,
            r"D:\Win\System32\WindowsPowerShell\v1.0\powershell.exe"
        );
        assert_eq!(tools.sc, r"D:\Win\System32\sc.exe");
    }

    #[test]
    fn falls_back_to_system_root() {
        let tools = SystemTools::detect_with_env(|key| match key {
            "WINDIR" => Ok("   ".to_string()),
            "SystemRoot" => Ok(r"E:\Windows\".to_string()),
            _ => Err(VarError::NotPresent),
        });
        assert_eq!(tools.reg, r"E:\Windows\System32\reg.exe");
        assert_eq!(tools.windows_dir(), r"E:\Windows");
    }

    #[test]
    fn defaults_to_c_windows() {
        let tools = SystemTools::detect_with_env(|_| Err(VarError::NotPresent));
        assert_eq!(tools, SystemTools::default());
        assert_eq!(tools.windows_dir(), r"C:\Windows");
    }

    #[test]
    fn short_name_strips_directory() {
        assert_eq!(SystemTools::short_name(r"C:\Windows\System32\sc.exe"), "sc.exe");
        assert_eq!(SystemTools::short_name("sc.exe"), "sc.exe");
    }

    #[test]
    fn dir_exists_rejects_empty() {
        assert!(!dir_exists(""));
        let temp = tempfile::TempDir::new().unwrap();
        assert!(dir_exists(&temp.path().to_string_lossy()));
    }
}
