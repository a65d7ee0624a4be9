// settingsync/src/sync/prompt.rs
use anyhow::{Context, Result};
use tokio::runtime::{Handle, RuntimeFlavor};

/// Asks for approval before a mutation that overwrites or removes remote data.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Blocking yes/no question on the terminal. Keeps asking until it gets an
/// answer.
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        blocking(|| dialoguer::Confirm::new().with_prompt(question).interact())
            .context("Failed to read confirmation from terminal")
    }
}

/// Approves everything (`--yes`), echoing each question so the log shows
/// what was approved.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        println!("{} [y/n] y (--yes)", question);
        Ok(true)
    }
}

/// Reads the `Authorization` header value without echoing it.
pub fn read_auth_header() -> Result<String> {
    blocking(|| {
        dialoguer::Password::new()
            .with_prompt("Enter Authentication Header (copy from site)")
            .interact()
    })
    .context("Failed to read authentication header")
}

/// Runs a terminal read that blocks the calling thread. On a multi-threaded
/// tokio runtime the worker is handed off first so other tasks keep running.
fn blocking<T>(read: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(read)
        }
        _ => read(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assume_yes_approves() -> anyhow::Result<()> {
        assert!(AssumeYes.confirm("Upload changes to x")?);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_read_inside_multi_thread_runtime() -> anyhow::Result<()> {
        let ticker = tokio::spawn(async { 7 });
        let answer = blocking(|| {
            std::thread::sleep(std::time::Duration::from_millis(10));
            42
        });
        assert_eq!(answer, 42);
        assert_eq!(ticker.await?, 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_blocking_read_inside_current_thread_runtime() {
        assert_eq!(blocking(|| "y"), "y");
    }

    #[test]
    fn test_blocking_read_outside_runtime() {
        assert!(blocking(|| true));
    }

    #[test]
    fn test_scripted_runs_out_of_answers() -> anyhow::Result<()> {
        let mut confirm = scripted::ScriptedConfirm::new([false]);
        assert!(!confirm.confirm("first")?);
        assert!(confirm.confirm("second").is_err());
        assert_eq!(confirm.questions, vec!["first", "second"]);
        Ok(())
    }
}
