// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Page-level progress reporting for the paginated loops.
///
/// Every message goes to the `tracing` subscriber; the spinner is an extra
/// visual for interactive terminals.
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::info;

/// Progress sink shared by the merged-pull index and the issue loop.
#[derive(Debug, Clone,)]
pub struct Progress
{
    bar: ProgressBar,
}

impl Progress
{
    /// Spinner drawn on stderr; indicatif hides it when stderr is not a
    /// terminal.
    pub fn spinner() -> Self
    {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr(),);
        if let Ok(style,) = ProgressStyle::default_spinner()
            .template("{spinner:.yellow} [{elapsed_precise}] {msg}",)
        {
            bar.set_style(style,);
        }
        Self {
            bar,
        }
    }

    /// Progress that only emits log events.
    pub fn hidden() -> Self
    {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Reports that `page` of the listing named `what` is being fetched.
    pub fn page(&self, what: &str, page: u32,)
    {
        let message = format!("Getting {what} page #{page:02}.");
        info!("{}", message);
        self.bar.set_message(message,);
        self.bar.tick();
    }

    /// Reports a free-form step, such as a pull detail lookup.
    pub fn step(&self, message: impl Into<String,>,)
    {
        let message = message.into();
        self.bar.set_message(message,);
        self.bar.tick();
    }

    /// Clears the spinner and leaves `message` as the final line.
    pub fn finish(&self, message: impl Into<String,>,)
    {
        let message = message.into();
        info!("{}", message);
        self.bar.finish_with_message(message,);
    }
}
