use anyhow::Result;
use arboard::Clipboard;
#[cfg(target_os = "linux")]
use arboard::SetExtLinux;

pub const DAEMON_FLAG: &str = "__clipboard_daemon";

// On Linux the clipboard belongs to the process that set it, so a short-lived
// CLI loses the contents on exit. We re-exec ourselves as a detached daemon
// that holds the selection alive.
#[cfg(target_os = "linux")]
fn run_daemon_mode() -> Result<()> {
    let text = std::io::read_to_string(std::io::stdin())?;

    let mut clipboard = Clipboard::new()?;
    match clipboard.set().wait().text(text) {
        Ok(_waiter) => {
            std::thread::park(); // Keep the process alive so the clipboard stays valid
            unreachable!("daemon should park indefinitely");
        }
        Err(e) => Err(anyhow::Error::from(e)),
    }
}

/// Checks argv for the daemon flag before normal CLI parsing. Returns
/// Ok(true) when daemon mode handled everything and the caller should exit.
pub fn check_and_run_daemon_if_requested() -> Result<bool> {
    if std::env::args().any(|a| a == DAEMON_FLAG) {
        #[cfg(target_os = "linux")]
        {
            run_daemon_mode()?;
            return Ok(true);
        }
        #[cfg(not(target_os = "linux"))]
        {
            log::warn!("{} flag used on non-Linux system, ignoring", DAEMON_FLAG);
            std::process::exit(0);
        }
    }
    Ok(false)
}

pub fn copy_text_to_clipboard(text: String) -> Result<()> {
    #[cfg(not(target_os = "linux"))]
    {
        let mut clipboard = Clipboard::new()?;
        clipboard.set_text(text)?;
    }

    #[cfg(target_os = "linux")]
    {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let mut child = Command::new(std::env::current_exe()?)
            .arg(DAEMON_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .current_dir("/")
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
            stdin.flush()?;
        } else {
            return Err(anyhow::anyhow!("failed to get stdin for clipboard daemon"));
        }
    }
    Ok(())
}
