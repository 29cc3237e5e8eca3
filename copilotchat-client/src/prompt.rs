//! User-facing progress for the device flow.
//!
//! The device flow needs a human to open a URL and type a code. How that
//! is shown is up to the caller; [`ConsolePrompt`] prints to stdout.

use crate::device_flow::{DeviceCodeSession, DevicePollResult};

/// Observer for device flow progress.
pub trait DeviceCodePrompt: Send + Sync {
    /// The user must visit `session.verification_uri` and enter `session.user_code`.
    fn show_code(&self, session: &DeviceCodeSession);

    /// A poll is about to be sent.
    fn polling(&self, _attempt: u32) {}

    /// A poll came back without a token.
    fn not_yet(&self, _attempt: u32, _result: &DevicePollResult) {}

    /// The device flow and token exchange completed.
    fn authorized(&self) {}
}

/// Prints progress to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt;

impl DeviceCodePrompt for ConsolePrompt {
    fn show_code(&self, session: &DeviceCodeSession) {
        println!("\nPlease visit: {}", session.verification_uri);
        println!("And enter code: {}\n", session.user_code);
    }

    fn polling(&self, attempt: u32) {
        println!("Checking for authentication... attempt {attempt}");
    }

    fn not_yet(&self, _attempt: u32, result: &DevicePollResult) {
        match result {
            DevicePollResult::Pending => {
                println!("Login not detected. Please visit the URL and enter the code.");
            }
            other => println!("Authorization not complete: {other}"),
        }
    }

    fn authorized(&self) {
        println!("Successfully authenticated!");
    }
}

/// Shows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPrompt;

impl DeviceCodePrompt for SilentPrompt {
    fn show_code(&self, _session: &DeviceCodeSession) {}
}
