//! Progress reporting for consensus runs

use colored::Colorize;
use consensus_application::ports::progress::ProgressNotifier;
use consensus_domain::{Model, Phase};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress during a consensus run with progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            phase_bar: Mutex::new(None),
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn phase_display_name(phase: &Phase) -> String {
        format!("Phase {}: {}", phase.number(), phase.display_name())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_phase_start(&self, phase: &Phase, total_tasks: usize) {
        let pb = match phase {
            Phase::Divergent => {
                let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
                pb.set_style(Self::phase_style());
                pb.set_message("Waiting for models...");
                pb
            }
            // A single long judge call: a spinner says more than a bar
            Phase::Synthesis => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::spinner_style());
                pb.enable_steady_tick(Duration::from_millis(120));
                pb.set_message("Judge is synthesizing...");
                pb
            }
        };
        pb.set_prefix(Self::phase_display_name(phase));

        if let Ok(mut bar) = self.phase_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_task_complete(&self, _phase: &Phase, model: &Model, success: bool) {
        if let Ok(bar) = self.phase_bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            let status = if success {
                format!("{} {}", "v".green(), model)
            } else {
                format!("{} {}", "x".red(), model)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_phase_complete(&self, phase: &Phase) {
        if let Ok(mut bar) = self.phase_bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.finish_with_message(format!("{} complete!", format!("Phase {}", phase.number()).green()));
        }
    }

    fn on_synthesis_retry(&self, attempt: usize, max_attempts: usize) {
        let _ = self.multi.println(format!(
            "{} synthesis failed, retrying ({}/{}) with responses reloaded from disk",
            "!".yellow().bold(),
            attempt,
            max_attempts
        ));
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_phase_start(&self, phase: &Phase, total_tasks: usize) {
        let phase_name = ProgressReporter::phase_display_name(phase);
        eprintln!(
            "{} {} ({} tasks)",
            "->".cyan(),
            phase_name.bold(),
            total_tasks
        );
    }

    fn on_task_complete(&self, _phase: &Phase, model: &Model, success: bool) {
        if success {
            eprintln!("  {} {}", "v".green(), model);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), model);
        }
    }

    fn on_phase_complete(&self, _phase: &Phase) {
        eprintln!();
    }

    fn on_synthesis_retry(&self, attempt: usize, max_attempts: usize) {
        eprintln!(
            "  {} retrying synthesis ({}/{})",
            "!".yellow(),
            attempt,
            max_attempts
        );
    }
}
