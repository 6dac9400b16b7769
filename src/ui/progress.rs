//! Download progress with CI fallback

use super::context::UiContext;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::io::Read;

/// Byte progress for a single download.
///
/// Shows an indicatif bar in interactive mode and one summary line in CI,
/// where redrawn bars only clutter the job log.
pub struct DownloadProgress {
    bar: ProgressBar,
    interactive: bool,
}

impl DownloadProgress {
    /// Create a progress indicator for `label`, with a known or unknown size
    pub fn new(ctx: &UiContext, label: &str, total: Option<u64>) -> Self {
        let interactive = ctx.use_fancy_output();
        let bar = if interactive {
            let bar = ProgressBar::new(total.unwrap_or(0));
            let template = if total.is_some() {
                "  {spinner:.cyan} {msg}  {bar:30.cyan/dim} {bytes}/{total_bytes} ({eta})"
            } else {
                "  {spinner:.cyan} {msg}  {bytes} {elapsed:.dim}"
            };
            if let Ok(style) = ProgressStyle::default_bar().template(template) {
                bar.set_style(style.progress_chars("━╸─"));
            }
            bar.set_message(label.to_string());
            bar
        } else {
            println!("Downloading {}", label);
            ProgressBar::hidden()
        };
        Self { bar, interactive }
    }

    /// Wrap a reader so bytes read advance the bar
    pub fn wrap_read<R: Read>(&self, reader: R) -> impl Read {
        self.bar.wrap_read(reader)
    }

    /// Finish, reporting the number of bytes written
    pub fn finish(&self, bytes: u64) {
        if self.interactive {
            self.bar.finish_and_clear();
        }
        println!("Downloaded {}", HumanBytes(bytes));
    }
}
