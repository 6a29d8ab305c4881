use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use shapescreen::engine::progress::{Progress, ProgressCallback};
use std::fmt::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const SPINNER_TICK_MS: u64 = 80;

/// Draws core progress events on stderr.
///
/// A phase shows as a spinner labelled with the phase name; a task inside it
/// turns the line into a bar. While screening, the bar message counts the
/// rows that ended up without a score.
#[derive(Clone)]
pub struct CliProgressHandler {
    bar: ProgressBar,
    missing_rows: Arc<AtomicUsize>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Tracks state without drawing, for `--quiet` runs and tests.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target).with_style(Self::phase_style());
        bar.finish_and_clear();
        Self {
            bar,
            missing_rows: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let handler = self.clone();
        Box::new(move |event| handler.apply(event))
    }

    fn apply(&self, event: Progress) {
        let bar = &self.bar;
        match event {
            Progress::PhaseStart { name } => {
                bar.reset();
                bar.set_length(0);
                bar.set_style(Self::phase_style());
                bar.set_prefix(name);
                bar.set_message("");
                bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::PhaseFinish => {
                bar.disable_steady_tick();
                bar.finish_with_message("done");
            }
            Progress::TaskStart { total_steps } => {
                bar.disable_steady_tick();
                bar.reset();
                bar.set_length(total_steps);
                bar.set_style(Self::task_style());
            }
            Progress::TaskIncrement => bar.inc(1),
            Progress::TaskFinish => {
                if let Some(len) = bar.length() {
                    bar.set_position(len);
                }
                bar.finish();
            }
            Progress::RowFinished { scored: false, .. } => {
                let missing = self.missing_rows.fetch_add(1, Ordering::Relaxed) + 1;
                bar.set_message(format!("{missing} missing"));
            }
            Progress::RowFinished { scored: true, .. } => {}
            Progress::Message(text) => bar.println(format!("  {text}")),
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {msg}")
            .expect("Failed to create phase style template")
    }

    fn task_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{prefix:.bold:<16} [{bar:40.cyan/blue}] {pos}/{len} {msg} ({eta})",
        )
        .expect("Failed to create task style template")
        .with_key("eta", |state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
        })
        .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn missing(handler: &CliProgressHandler) -> usize {
        handler.missing_rows.load(Ordering::Relaxed)
    }

    #[test]
    fn starts_finished_and_empty() {
        let handler = CliProgressHandler::hidden();
        assert!(handler.bar.is_finished());
        assert_eq!(handler.bar.length(), Some(0));
        assert_eq!(missing(&handler), 0);
    }

    #[test]
    fn database_load_then_screen_updates_the_bar() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart {
            name: "Indexing Shapes",
        });
        assert_eq!(handler.bar.prefix(), "Indexing Shapes");
        assert!(!handler.bar.is_finished());
        callback(Progress::TaskStart { total_steps: 2 });
        callback(Progress::TaskIncrement);
        callback(Progress::TaskFinish);
        assert_eq!(handler.bar.position(), 2);
        callback(Progress::PhaseFinish);
        assert_eq!(handler.bar.message(), "done");

        callback(Progress::PhaseStart { name: "Screening" });
        assert_eq!(handler.bar.message(), "");
        callback(Progress::TaskStart { total_steps: 3 });
        assert_eq!(handler.bar.length(), Some(3));
        assert_eq!(handler.bar.position(), 0);

        callback(Progress::RowFinished { row: 0, scored: true });
        callback(Progress::TaskIncrement);
        callback(Progress::RowFinished { row: 1, scored: false });
        callback(Progress::TaskIncrement);
        assert_eq!(handler.bar.position(), 2);
        assert_eq!(handler.bar.message(), "1 missing");

        callback(Progress::RowFinished { row: 2, scored: false });
        callback(Progress::TaskIncrement);
        callback(Progress::TaskFinish);
        assert!(handler.bar.is_finished());
        assert_eq!(handler.bar.message(), "2 missing");
        assert_eq!(missing(&handler), 2);
    }

    #[test]
    fn interrupted_task_still_finishes_the_bar() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        callback(Progress::TaskStart { total_steps: 10 });
        callback(Progress::TaskIncrement);
        callback(Progress::TaskFinish);

        assert!(handler.bar.is_finished());
        assert_eq!(handler.bar.position(), 10);
    }

    #[test]
    fn callbacks_from_worker_threads_share_state() {
        let handler = CliProgressHandler::hidden();
        let callback = Arc::new(handler.get_callback());
        handler.get_callback()(Progress::TaskStart { total_steps: 8 });

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let callback = Arc::clone(&callback);
                thread::spawn(move || {
                    callback(Progress::TaskIncrement);
                    callback(Progress::RowFinished { row: 0, scored: false });
                    callback(Progress::TaskIncrement);
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(handler.bar.position(), 8);
        assert_eq!(missing(&handler), 4);
    }
}
