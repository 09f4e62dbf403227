//! The dispatch loop.
//!
//! [`ViewController`] owns the controller state and the screen. Sampler
//! updates and key events are handled one at a time; drill-down fetches
//! block the loop (under the fetch deadline and the cancel token), so the
//! sampler's rendezvous sends fail and its ticks are dropped meanwhile.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, select};
use tracing::{debug, info, warn};

use super::event::{Key, UiEvent};
use super::input::INPUT_LABEL;
use super::layout::{LayoutKind, Region};
use super::mode::{Mode, SubView};
use super::screen::{Panel, RenderSink, Screen};
use super::state::ControllerState;
use super::style::Styles;
use super::transitions::{Action, lookup};
use super::widgets::{header, help, processlist, report, status};
use crate::cancel::{CancelToken, run_bounded};
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, SourceError};
use crate::models::{ExplainFormat, ServerInfo};
use crate::sampler::SamplerUpdate;
use crate::source::DataSource;

/// Shown when `EXPLAIN ANALYZE` exceeds the fetch deadline.
pub const ANALYZE_TIMEOUT_TEXT: &str =
    "Aborting... the query was too long, use <A> to ignore timeout.";

const BACK_HINT: &str = "(<-- <Backspace> to return)";

pub struct ViewController<S: DataSource + ?Sized + 'static, R: RenderSink> {
    source: Arc<S>,
    sink: R,
    config: ConsoleConfig,
    cancel: CancelToken,
    state: ControllerState,
    screen: Screen,
    last: Option<SamplerUpdate>,
}

impl<S: DataSource + ?Sized + 'static, R: RenderSink> ViewController<S, R> {
    pub fn new(
        source: Arc<S>,
        sink: R,
        config: ConsoleConfig,
        cancel: CancelToken,
        info: &ServerInfo,
    ) -> Self {
        let mut screen = Screen::new(config.spark_history);
        screen.write(Region::Header, header::header(info));
        let mut controller = Self {
            source,
            sink,
            config,
            cancel,
            state: ControllerState::default(),
            screen,
            last: None,
        };
        controller.enter_main_layout();
        controller
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }

    /// Runs until cancellation or until either channel disconnects.
    ///
    /// Cancellation is a normal exit. Fatal errors (lost connection,
    /// terminal failure) are returned.
    pub fn run(
        &mut self,
        keys: &Receiver<UiEvent>,
        updates: &Receiver<SamplerUpdate>,
    ) -> Result<(), ConsoleError> {
        let done = self.cancel.done();
        let mut result = self.draw();
        'dispatch: while result.is_ok() && !self.cancel.is_cancelled() {
            select! {
                recv(done) -> _ => break 'dispatch,
                recv(keys) -> event => match event {
                    Ok(UiEvent::Key(key)) => result = self.handle_key(key),
                    Ok(UiEvent::Resize) => result = self.draw(),
                    Err(_) => break 'dispatch,
                },
                recv(updates) -> update => match update {
                    Ok(update) => result = self.on_update(update),
                    // The sampler exited; its join handle carries the reason.
                    Err(_) => break 'dispatch,
                },
            }
        }
        debug!("dispatch loop stopped");
        match result {
            Err(e) if e.is_cancelled() => Ok(()),
            other => other,
        }
    }

    /// Handles one sampler update.
    pub fn on_update(&mut self, update: SamplerUpdate) -> Result<(), ConsoleError> {
        self.cancel.check()?;
        if let Some(rates) = &update.rates {
            self.screen.push_spark(status::qps_point(rates));
        }
        let result = if self.state.sampling_owns_main_view {
            self.show_sample(&update);
            self.draw()
        } else if let Some(view) = self.state.mode.sub_view() {
            self.open_sub_view(view)
        } else {
            Ok(())
        };
        self.last = Some(update);
        result
    }

    /// Handles one key press.
    pub fn handle_key(&mut self, key: Key) -> Result<(), ConsoleError> {
        self.cancel.check()?;

        if self.state.awaiting_input && !key.is_quit() {
            match key {
                Key::Char(c) => {
                    self.state.input.push(c);
                    return self.show_input();
                }
                Key::Backspace => {
                    self.state.input.pop();
                    return self.show_input();
                }
                _ => {}
            }
        }

        let Some(transition) = lookup(key, self.state.mode, self.state.awaiting_input) else {
            return Ok(());
        };
        debug!(?key, mode = ?self.state.mode, action = ?transition.action, "key");

        match transition.action {
            Action::Quit => {
                self.cancel.cancel();
                Ok(())
            }
            Action::ShowHelp => {
                self.leave_main_view(Mode::Help, LayoutKind::FullScreen);
                self.screen.set_title(Region::Main, help::TITLE);
                self.screen.write(Region::Main, help::help());
                self.draw()
            }
            Action::OpenSubView(view) => {
                self.leave_main_view(view.mode(), LayoutKind::FullScreen);
                self.open_sub_view(view)
            }
            Action::RequestInput { suspend_sampling } => {
                let mode = transition.next.unwrap_or(self.state.mode);
                self.state.mode = mode;
                self.state.awaiting_input = true;
                self.state.error = None;
                self.state.input.activate(mode);
                if suspend_sampling {
                    self.state.sampling_owns_main_view = false;
                    self.enter_drilldown_layout("Thread detail");
                }
                self.show_input()
            }
            Action::Submit => self.submit(),
            Action::Back => {
                self.state.reset_to_main();
                self.state.error = None;
                self.enter_main_layout();
                self.draw()
            }
            Action::Explain(format) => self.explain(format),
            Action::Analyze { bounded: true } => self.analyze_bounded(),
            Action::Analyze { bounded: false } => self.explain(ExplainFormat::AnalyzeNoTimeout),
            Action::Redraw => {
                if let Some(update) = self.last.take() {
                    self.show_sample(&update);
                    self.last = Some(update);
                }
                self.draw()
            }
            Action::Scroll(delta) => {
                self.screen.scroll_by(delta);
                self.draw()
            }
        }
    }

    fn submit(&mut self) -> Result<(), ConsoleError> {
        let mode = self.state.mode;
        self.state.awaiting_input = false;
        let id = match self.state.input.submit() {
            Ok(id) => id,
            Err(e) => {
                debug!(error = %e, "rejected session id");
                self.degrade(e.to_string());
                return self.draw();
            }
        };
        self.state.target = Some(id.clone());

        match mode {
            Mode::Kill => self.kill(id),
            Mode::Locking => {
                let fetched = self.fetch(Some(self.config.fetch_timeout), {
                    let id = id.clone();
                    move |s: &S| s.fetch_locks(&id)
                });
                let title = format!("Locks of thread {id} {BACK_HINT}");
                self.show_drilldown(mode, &id, title, fetched.map(|r| report::report(&r)))
            }
            Mode::ThreadDetail => {
                let fetched = self.fetch(Some(self.config.fetch_timeout), {
                    let id = id.clone();
                    move |s: &S| s.fetch_session_detail(&id)
                });
                let title = format!("Thread {id} {BACK_HINT}");
                self.show_drilldown(mode, &id, title, fetched.map(|t| report::vertical(&t)))
            }
            _ => {
                let format = mode.explain_format().unwrap_or(ExplainFormat::Normal);
                self.explain(format)
            }
        }
    }

    fn kill(&mut self, id: String) -> Result<(), ConsoleError> {
        let result = self.fetch(Some(self.config.fetch_timeout), {
            let id = id.clone();
            move |s: &S| s.kill_session(&id)
        });
        self.state.reset_to_main();
        self.state.error = None;
        match result {
            Ok(()) => {
                info!(thread_id = %id, "session killed");
                self.screen.clear(Region::Bottom);
                self.screen.focus(Region::Main);
            }
            Err(e) if e.is_fatal() || e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!(thread_id = %id, error = %e, "kill failed");
                let msg = format!("Thread_id '{id}' cannot be killed: {e}");
                self.screen.write(Region::Bottom, Panel::styled(msg.clone(), Styles::error()));
                self.state.error = Some(msg);
            }
        }
        self.draw()
    }

    fn explain(&mut self, format: ExplainFormat) -> Result<(), ConsoleError> {
        let Some(id) = self.state.target.clone() else {
            return Ok(());
        };
        let deadline = format.is_bounded().then_some(self.config.fetch_timeout);
        let fetched = self.fetch(deadline, {
            let id = id.clone();
            move |s: &S| s.fetch_explain(&id, format)
        });
        self.show_drilldown(
            Mode::for_explain(format),
            &id,
            report::EXPLAIN_TITLE.to_string(),
            fetched.map(|e| report::explain(&e)),
        )
    }

    /// `EXPLAIN ANALYZE` under the deadline; a timeout keeps the operator in
    /// the normal explain view with a hint to retry without deadline.
    fn analyze_bounded(&mut self) -> Result<(), ConsoleError> {
        let Some(id) = self.state.target.clone() else {
            return Ok(());
        };
        let fetched = self.fetch(Some(self.config.fetch_timeout), {
            let id = id.clone();
            move |s: &S| s.fetch_explain(&id, ExplainFormat::Analyze)
        });
        match fetched {
            Err(ConsoleError::Timeout(after)) => {
                warn!(thread_id = %id, timeout_secs = after.as_secs(), "EXPLAIN ANALYZE aborted");
                self.state.mode = Mode::ExplainNormal;
                self.enter_drilldown_layout(report::EXPLAIN_TITLE);
                self.screen.write(
                    Region::Main,
                    Panel::styled(ANALYZE_TIMEOUT_TEXT, Styles::error()),
                );
                self.draw()
            }
            other => self.show_drilldown(
                Mode::ExplainAnalyze,
                &id,
                report::EXPLAIN_TITLE.to_string(),
                other.map(|e| report::explain(&e)),
            ),
        }
    }

    /// Fetches and shows a server-wide view; called on entry and on every
    /// sampler update while the view is active.
    fn open_sub_view(&mut self, view: SubView) -> Result<(), ConsoleError> {
        let deadline = Some(self.config.fetch_timeout);
        let fetched = match view {
            SubView::Memory => self
                .fetch(deadline, |s: &S| s.fetch_memory_status())
                .map(|r| report::report(&r)),
            SubView::Replication => self
                .fetch(deadline, |s: &S| s.fetch_replication_status())
                .map(|t| report::vertical(&t)),
            SubView::Engine => self
                .fetch(deadline, |s: &S| s.fetch_engine_status())
                .map(|text| report::text(&text)),
            SubView::ErrorLog => self
                .fetch(deadline, |s: &S| s.fetch_error_log())
                .map(|t| report::table(&t)),
        };
        match fetched {
            Ok(panel) => {
                self.screen
                    .set_title(Region::Main, format!("{} {BACK_HINT}", view.title()));
                self.screen.write(Region::Main, panel);
                self.draw()
            }
            Err(e) => self.fail(format!("{} cannot be retrieved: {e}", view.title()), e),
        }
    }

    fn show_drilldown(
        &mut self,
        mode: Mode,
        id: &str,
        title: String,
        fetched: Result<Panel, ConsoleError>,
    ) -> Result<(), ConsoleError> {
        match fetched {
            Ok(panel) => {
                self.state.mode = mode;
                self.state.sampling_owns_main_view = false;
                self.state.error = None;
                self.enter_drilldown_layout(&title);
                self.screen.write(Region::Main, panel);
                self.draw()
            }
            Err(e) => self.fail(format!("Thread_id '{id}' cannot be retrieved: {e}"), e),
        }
    }

    /// Fatal and cancellation errors propagate; anything else degrades to
    /// the main list with `message` in the error line.
    fn fail(&mut self, message: String, err: ConsoleError) -> Result<(), ConsoleError> {
        if err.is_fatal() || err.is_cancelled() {
            return Err(err);
        }
        warn!(mode = ?self.state.mode, error = %err, "drill-down failed");
        self.degrade(message);
        self.draw()
    }

    fn degrade(&mut self, message: String) {
        self.state.reset_to_main();
        self.enter_main_layout();
        self.screen
            .write(Region::Bottom, Panel::styled(message.clone(), Styles::error()));
        self.state.error = Some(message);
    }

    fn fetch<T, F>(&self, deadline: Option<Duration>, fetch: F) -> Result<T, ConsoleError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, SourceError> + Send + 'static,
    {
        let source = Arc::clone(&self.source);
        run_bounded(&self.cancel, deadline, move || fetch(&*source))
    }

    fn leave_main_view(&mut self, mode: Mode, layout: LayoutKind) {
        self.state.mode = mode;
        self.state.sampling_owns_main_view = false;
        self.state.awaiting_input = false;
        self.state.input.clear();
        self.state.target = None;
        self.state.error = None;
        self.screen.set_layout(layout);
    }

    fn enter_main_layout(&mut self) {
        self.screen.set_layout(LayoutKind::Dashboard);
        self.screen.set_title(Region::Main, processlist::TITLE);
        self.screen
            .write(Region::Main, Panel::plain(processlist::PLEASE_WAIT));
        self.screen.focus(Region::Main);
    }

    fn enter_drilldown_layout(&mut self, title: &str) {
        self.screen.set_layout(LayoutKind::Drilldown);
        self.screen.set_title(Region::Main, title);
        self.screen.set_title(Region::Status, "Status");
        if let Some(last) = &self.last {
            self.screen
                .write(Region::Status, status::status(&last.sample, last.rates.as_ref()));
        }
        self.screen.focus(Region::Main);
    }

    fn show_sample(&mut self, update: &SamplerUpdate) {
        self.screen.set_title(Region::Status, "Status");
        self.screen
            .write(Region::Status, status::status(&update.sample, update.rates.as_ref()));
        if let Some(rates) = &update.rates {
            self.screen.set_title(Region::RateBars, "Rates/s");
            self.screen.write(Region::RateBars, status::rate_bars(rates));
        }
        self.screen.write(
            Region::Main,
            processlist::processlist(&update.sample.sessions, &self.config.latency_bands),
        );
    }

    fn show_input(&mut self) -> Result<(), ConsoleError> {
        self.screen.write(
            Region::Bottom,
            Panel::Input {
                label: INPUT_LABEL.to_string(),
                value: self.state.input.text().to_string(),
            },
        );
        self.screen.focus(Region::Bottom);
        self.draw()
    }

    /// Draws the screen on the dispatch thread. Draws never overlap; ticks
    /// arriving meanwhile are shed by the sampler's rendezvous send.
    fn draw(&mut self) -> Result<(), ConsoleError> {
        self.cancel.check()?;
        self.sink.draw(&self.screen).map_err(ConsoleError::Render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{Sampler, spawn_sampler};
    use crate::source::mock::{Call, ScriptedSource};
    use crossbeam_channel::{bounded, unbounded};
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Instant;

    /// Counts frames; optionally slow or failing.
    #[derive(Clone, Default)]
    struct RecordingSink {
        frames: Arc<AtomicUsize>,
        delay: Option<Duration>,
        fail: bool,
    }

    impl RenderSink for RecordingSink {
        fn draw(&mut self, _screen: &Screen) -> io::Result<()> {
            if self.fail {
                return Err(io::Error::other("terminal gone"));
            }
            if let Some(d) = self.delay {
                thread::sleep(d);
            }
            self.frames.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    type Controller = ViewController<ScriptedSource, RecordingSink>;

    fn config() -> ConsoleConfig {
        ConsoleConfig {
            fetch_timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }

    fn controller_with(source: &Arc<ScriptedSource>, config: ConsoleConfig) -> Controller {
        let info = source.server_info().unwrap();
        ViewController::new(
            Arc::clone(source),
            RecordingSink::default(),
            config,
            CancelToken::new(),
            &info,
        )
    }

    fn controller(source: &Arc<ScriptedSource>) -> Controller {
        controller_with(source, config())
    }

    fn update(source: &Arc<ScriptedSource>) -> SamplerUpdate {
        let (sample, rates) = Sampler::new(Arc::clone(source), CancelToken::new())
            .tick()
            .unwrap();
        SamplerUpdate { sample, rates }
    }

    fn press(c: &mut Controller, keys: &str) {
        for ch in keys.chars() {
            c.handle_key(Key::Char(ch)).unwrap();
        }
    }

    fn submit(c: &mut Controller, keys: &str) {
        press(c, keys);
        c.handle_key(Key::Enter).unwrap();
    }

    fn assert_main_list(c: &Controller) {
        let state = c.state();
        assert_eq!(state.mode, Mode::MainList);
        assert!(state.sampling_owns_main_view);
        assert!(!state.awaiting_input);
        assert!(state.input.text().is_empty());
        assert_eq!(c.screen().layout(), LayoutKind::Dashboard);
        assert_eq!(c.screen().title(Region::Main), Some(processlist::TITLE));
    }

    #[test]
    fn starts_on_main_list_waiting_for_data() {
        let source = Arc::new(ScriptedSource::typical());
        let c = controller(&source);
        assert_main_list(&c);
        assert_eq!(c.screen().text(Region::Main), processlist::PLEASE_WAIT);
        assert!(c.screen().text(Region::Header).contains("[db1:3306]"));
    }

    #[test]
    fn sampler_updates_draw_the_main_list() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.on_update(update(&source)).unwrap();
        let main = c.screen().text(Region::Main);
        assert!(main.starts_with("Cmd"));
        assert!(main.contains("SELECT * FROM orders WHERE status = 'open'"));
        assert!(c.screen().text(Region::Status).contains("QPS: --"));
        assert_eq!(c.sink().frames.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn locking_scenario_success() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.handle_key(Key::Char('l')).unwrap();
        assert_eq!(c.state().mode, Mode::Locking);
        assert!(c.state().awaiting_input);
        assert_eq!(c.screen().text(Region::Bottom), "Thread Id: ");

        // Sampling keeps the list fresh while the id is typed.
        press(&mut c, "42");
        c.on_update(update(&source)).unwrap();
        assert!(c.screen().text(Region::Main).contains("app@10.0.0.5"));
        assert_eq!(c.screen().text(Region::Bottom), "Thread Id: 42");

        c.handle_key(Key::Enter).unwrap();
        assert_eq!(source.drilldown_calls(), vec![Call::Locks("42".into())]);
        let state = c.state();
        assert_eq!(state.mode, Mode::Locking);
        assert_eq!(state.target.as_deref(), Some("42"));
        assert!(!state.sampling_owns_main_view);
        assert!(!state.awaiting_input);
        assert!(state.input.text().is_empty());
        assert_eq!(c.screen().layout(), LayoutKind::Drilldown);
        let main = c.screen().text(Region::Main);
        assert!(main.contains("Data locks"));
        assert!(main.contains("Lock waits"));
        assert!(c.screen().text(Region::Status).contains("Uptime"));
    }

    #[test]
    fn locking_scenario_error_degrades() {
        let source = Arc::new(ScriptedSource::typical());
        source.fail("locks", SourceError::Query("lock wait timeout".into()));
        let mut c = controller(&source);
        c.handle_key(Key::Char('L')).unwrap();
        submit(&mut c, "42");

        assert_main_list(&c);
        let err = c.state().error.clone().unwrap();
        assert!(err.starts_with("Thread_id '42' cannot be retrieved"), "{err}");
        assert!(err.contains("lock wait timeout"));
        assert_eq!(c.screen().text(Region::Bottom), err);
    }

    #[test]
    fn non_digit_input_makes_no_source_call() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.handle_key(Key::Char('l')).unwrap();
        submit(&mut c, "abc");

        assert!(source.drilldown_calls().is_empty());
        assert_main_list(&c);
        assert_eq!(
            c.state().error.as_deref(),
            Some("input 'abc' is not a number")
        );
        assert_eq!(c.screen().text(Region::Bottom), "input 'abc' is not a number");
    }

    #[test]
    fn empty_input_is_rejected() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.handle_key(Key::Char('k')).unwrap();
        c.handle_key(Key::Enter).unwrap();
        assert!(source.drilldown_calls().is_empty());
        assert_main_list(&c);
        assert_eq!(c.state().error.as_deref(), Some("input '' is not a number"));
    }

    #[test]
    fn backspace_edits_while_awaiting_input() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.handle_key(Key::Char('e')).unwrap();
        press(&mut c, "42x");
        c.handle_key(Key::Backspace).unwrap();
        assert_eq!(c.state().mode, Mode::ExplainNormal);
        assert!(c.state().awaiting_input);
        c.handle_key(Key::Enter).unwrap();
        assert_eq!(
            source.drilldown_calls(),
            vec![Call::Explain("42".into(), ExplainFormat::Normal)]
        );
    }

    #[test]
    fn space_cycles_explain_formats() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.handle_key(Key::Char('e')).unwrap();
        submit(&mut c, "42");
        assert_eq!(c.state().mode, Mode::ExplainNormal);
        assert_eq!(c.screen().title(Region::Main), Some(report::EXPLAIN_TITLE));

        let mut modes = Vec::new();
        for _ in 0..3 {
            c.handle_key(Key::Char(' ')).unwrap();
            modes.push(c.state().mode);
        }
        assert_eq!(
            modes,
            vec![Mode::ExplainTree, Mode::ExplainJson, Mode::ExplainNormal]
        );
        let formats: Vec<ExplainFormat> = source
            .drilldown_calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Explain(id, f) if id == "42" => Some(f),
                _ => None,
            })
            .collect();
        assert_eq!(
            formats,
            vec![
                ExplainFormat::Normal,
                ExplainFormat::Tree,
                ExplainFormat::Json,
                ExplainFormat::Normal
            ]
        );
        assert!(c.screen().text(Region::Main).contains("SIMPLE"));
    }

    #[test]
    fn analyze_timeout_offers_unbounded_retry() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller_with(
            &source,
            ConsoleConfig {
                fetch_timeout: Duration::from_millis(40),
                ..Default::default()
            },
        );
        c.handle_key(Key::Char('e')).unwrap();
        submit(&mut c, "42");
        source.delay("explain", Duration::from_millis(200));

        c.handle_key(Key::Char('a')).unwrap();
        assert_eq!(c.state().mode, Mode::ExplainNormal);
        assert_eq!(c.screen().text(Region::Main), ANALYZE_TIMEOUT_TEXT);
        assert!(c.state().error.is_none());

        c.handle_key(Key::Char('A')).unwrap();
        assert_eq!(c.state().mode, Mode::ExplainAnalyze);
        assert_eq!(
            source.drilldown_calls().last(),
            Some(&Call::Explain("42".into(), ExplainFormat::AnalyzeNoTimeout))
        );
        assert!(c.screen().text(Region::Main).contains("EXPLAIN ANALYZE"));
        // No further analyze from the analyze view.
        c.handle_key(Key::Char('a')).unwrap();
        assert_eq!(c.state().mode, Mode::ExplainAnalyze);
    }

    #[test]
    fn bounded_analyze_within_deadline_shows_the_plan() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.handle_key(Key::Char('e')).unwrap();
        submit(&mut c, "42");
        c.handle_key(Key::Char(' ')).unwrap();
        assert_eq!(c.state().mode, Mode::ExplainTree);

        c.handle_key(Key::Char('a')).unwrap();
        assert_eq!(c.state().mode, Mode::ExplainAnalyze);
        assert_eq!(
            source.drilldown_calls().last(),
            Some(&Call::Explain("42".into(), ExplainFormat::Analyze))
        );
        assert!(c.screen().text(Region::Main).contains("EXPLAIN ANALYZE"));
        assert_ne!(c.screen().text(Region::Main), ANALYZE_TIMEOUT_TEXT);
        assert!(c.state().error.is_none());
    }

    #[test]
    fn unbounded_analyze_outlasts_the_fetch_deadline() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller_with(
            &source,
            ConsoleConfig {
                fetch_timeout: Duration::from_millis(30),
                ..Default::default()
            },
        );
        c.handle_key(Key::Char('e')).unwrap();
        submit(&mut c, "42");
        source.delay("explain", Duration::from_millis(150));

        c.handle_key(Key::Char('A')).unwrap();
        assert_eq!(c.state().mode, Mode::ExplainAnalyze);
        assert!(c.state().error.is_none());
        assert!(c.screen().text(Region::Main).contains("EXPLAIN ANALYZE"));
    }

    #[test]
    fn driver_timeout_on_unbounded_analyze_degrades() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.handle_key(Key::Char('e')).unwrap();
        submit(&mut c, "42");
        source.fail("explain", SourceError::Timeout("read timed out".into()));

        c.handle_key(Key::Char('A')).unwrap();
        assert_main_list(&c);
        assert!(!c.cancel.is_cancelled());
        let err = c.state().error.clone().unwrap();
        assert!(err.starts_with("Thread_id '42' cannot be retrieved"), "{err}");
        assert!(err.contains("timed out"), "{err}");
    }

    #[test]
    fn other_timeouts_degrade() {
        let source = Arc::new(ScriptedSource::typical());
        source.delay("session_detail", Duration::from_millis(200));
        let mut c = controller_with(
            &source,
            ConsoleConfig {
                fetch_timeout: Duration::from_millis(30),
                ..Default::default()
            },
        );
        c.handle_key(Key::Char('d')).unwrap();
        submit(&mut c, "57");
        assert_main_list(&c);
        let err = c.state().error.clone().unwrap();
        assert!(err.contains("Thread_id '57'"));
        assert!(err.contains("timed out"));
    }

    #[test]
    fn thread_detail_suspends_sampling_immediately() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.on_update(update(&source)).unwrap();
        c.handle_key(Key::Char('d')).unwrap();
        assert_eq!(c.state().mode, Mode::ThreadDetail);
        assert!(!c.state().sampling_owns_main_view);
        assert_eq!(c.screen().layout(), LayoutKind::Drilldown);

        c.on_update(update(&source)).unwrap();
        assert_eq!(c.screen().text(Region::Main), "");

        submit(&mut c, "42");
        assert_eq!(
            source.drilldown_calls(),
            vec![Call::SessionDetail("42".into())]
        );
        assert!(c.screen().text(Region::Main).contains("thd_id: 42"));
    }

    #[test]
    fn kill_returns_to_main_list() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.handle_key(Key::Char('k')).unwrap();
        submit(&mut c, "63");
        assert_eq!(source.drilldown_calls(), vec![Call::Kill("63".into())]);
        assert_main_list(&c);
        assert!(c.state().error.is_none());
        assert_eq!(c.screen().text(Region::Bottom), "");
        assert_eq!(c.screen().focused(), Region::Main);
    }

    #[test]
    fn failed_kill_shows_error() {
        let source = Arc::new(ScriptedSource::typical());
        source.fail("kill", SourceError::NotFound("thread 9".into()));
        let mut c = controller(&source);
        c.handle_key(Key::Char('K')).unwrap();
        submit(&mut c, "9");
        assert_main_list(&c);
        assert!(c.screen().text(Region::Bottom).contains("thread 9 not found"));
    }

    #[test]
    fn sub_views_refresh_on_every_update() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.handle_key(Key::Char('m')).unwrap();
        assert_eq!(c.state().mode, Mode::MemoryStatus);
        assert_eq!(c.screen().layout(), LayoutKind::FullScreen);
        assert_eq!(source.count("memory_status"), 1);
        assert!(c.screen().text(Region::Main).contains("Total allocated"));

        c.on_update(update(&source)).unwrap();
        c.on_update(update(&source)).unwrap();
        assert_eq!(source.count("memory_status"), 3);

        // Switching views directly, without going back first.
        c.handle_key(Key::Char('I')).unwrap();
        assert_eq!(c.state().mode, Mode::EngineStatus);
        assert!(c.screen().text(Region::Main).contains("INNODB MONITOR OUTPUT"));
        c.on_update(update(&source)).unwrap();
        assert_eq!(source.count("memory_status"), 3);
        assert_eq!(source.count("engine_status"), 2);
    }

    #[test]
    fn sub_view_errors_degrade() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.handle_key(Key::Char('r')).unwrap();
        source.fail("replication", SourceError::Query("not a replica".into()));
        c.on_update(update(&source)).unwrap();
        assert_main_list(&c);
        assert!(c.state().error.as_deref().unwrap().starts_with("Replication cannot be retrieved"));
    }

    #[test]
    fn connection_errors_in_drilldowns_are_fatal() {
        let source = Arc::new(ScriptedSource::typical());
        source.fail("locks", SourceError::Connection("gone away".into()));
        let mut c = controller(&source);
        c.handle_key(Key::Char('l')).unwrap();
        press(&mut c, "1");
        let err = c.handle_key(Key::Enter).unwrap_err();
        assert!(matches!(err, ConsoleError::Connection(_)));
    }

    #[test]
    fn render_failure_is_fatal() {
        let source = Arc::new(ScriptedSource::typical());
        let info = source.server_info().unwrap();
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let mut c = ViewController::new(source.clone(), sink, config(), CancelToken::new(), &info);
        let err = c.on_update(update(&source)).unwrap_err();
        assert!(matches!(err, ConsoleError::Render(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn every_mode_returns_to_main_list_on_backspace() {
        let routes: &[(&str, Mode)] = &[
            ("?", Mode::Help),
            ("m", Mode::MemoryStatus),
            ("r", Mode::Replication),
            ("i", Mode::EngineStatus),
            ("E", Mode::ErrorLog),
            ("l42\n", Mode::Locking),
            ("d42\n", Mode::ThreadDetail),
            ("e42\n", Mode::ExplainNormal),
            ("e42\n ", Mode::ExplainTree),
            ("e42\n  ", Mode::ExplainJson),
            ("e42\nA", Mode::ExplainAnalyze),
        ];
        for (keys, expected) in routes {
            let source = Arc::new(ScriptedSource::typical());
            let mut c = controller(&source);
            for ch in keys.chars() {
                let key = if ch == '\n' { Key::Enter } else { Key::Char(ch) };
                c.handle_key(key).unwrap();
            }
            assert_eq!(c.state().mode, *expected, "{keys:?}");
            assert!(!c.state().sampling_owns_main_view, "{keys:?}");

            c.handle_key(Key::Backspace).unwrap();
            assert_main_list(&c);
            assert!(c.state().target.is_none());
            assert_eq!(c.screen().text(Region::Main), processlist::PLEASE_WAIT);

            c.on_update(update(&source)).unwrap();
            assert!(c.screen().text(Region::Main).contains("app@10.0.0.5"), "{keys:?}");
        }
    }

    #[test]
    fn help_and_scrolling() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.handle_key(Key::Char('?')).unwrap();
        assert_eq!(c.screen().layout(), LayoutKind::FullScreen);
        assert!(c.screen().text(Region::Main).contains("EXPLAIN ANALYZE without timeout"));
        c.handle_key(Key::PageDown).unwrap();
        assert_eq!(c.screen().scroll(), 10);
        c.handle_key(Key::Up).unwrap();
        assert_eq!(c.screen().scroll(), 9);
    }

    #[test]
    fn space_on_main_list_redraws_last_sample() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.handle_key(Key::Char(' ')).unwrap();
        assert_eq!(c.screen().text(Region::Main), processlist::PLEASE_WAIT);
        c.on_update(update(&source)).unwrap();
        let frames = c.sink().frames.load(Ordering::SeqCst);
        c.handle_key(Key::Char(' ')).unwrap();
        assert_eq!(c.sink().frames.load(Ordering::SeqCst), frames + 1);
        assert!(c.screen().text(Region::Main).contains("app@10.0.0.5"));
    }

    #[test]
    fn quit_cancels_and_nothing_runs_afterwards() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.handle_key(Key::Esc).unwrap();
        let frames = c.sink().frames.load(Ordering::SeqCst);

        assert!(c.handle_key(Key::Char('m')).unwrap_err().is_cancelled());
        assert!(c.on_update(update(&source)).unwrap_err().is_cancelled());
        assert_eq!(source.count("memory_status"), 0);
        assert_eq!(c.sink().frames.load(Ordering::SeqCst), frames);
    }

    #[test]
    fn quit_works_while_awaiting_input() {
        let source = Arc::new(ScriptedSource::typical());
        let mut c = controller(&source);
        c.handle_key(Key::Char('l')).unwrap();
        press(&mut c, "4");
        c.handle_key(Key::CtrlC).unwrap();
        assert!(c.cancel.is_cancelled());
    }

    #[test]
    fn slow_draws_shed_ticks_instead_of_queueing_them() {
        let source = Arc::new(ScriptedSource::typical());
        let cancel = CancelToken::new();
        let sink = RecordingSink {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let probe = sink.clone();
        let info = source.server_info().unwrap();
        let mut c = ViewController::new(source.clone(), sink, config(), cancel.clone(), &info);

        let (tx, updates) = bounded(0);
        let sampler =
            spawn_sampler(source.clone(), Duration::from_millis(2), cancel.clone(), tx).unwrap();
        let (_keys_tx, keys) = unbounded();
        let stopper = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            stopper.cancel();
        });

        c.run(&keys, &updates).unwrap();
        let stats = sampler.join().unwrap().unwrap();
        let frames = probe.frames.load(Ordering::SeqCst);
        assert!(frames >= 2);
        // Ticks every 2ms against 20ms draws: most are shed, and every
        // delivered one was drawn without a backlog building up.
        assert!(stats.dropped >= 1, "{stats:?}");
        assert!(stats.delivered as usize <= frames, "{stats:?} frames={frames}");
    }

    #[test]
    fn cancel_mid_tick_stops_the_loop_within_one_tick() {
        let source = Arc::new(ScriptedSource::typical());
        let cancel = CancelToken::new();
        let interval = Duration::from_millis(100);
        let info = source.server_info().unwrap();
        let mut c = ViewController::new(
            source.clone(),
            RecordingSink::default(),
            config(),
            cancel.clone(),
            &info,
        );
        let (tx, updates) = bounded(0);
        let sampler = spawn_sampler(source.clone(), interval, cancel.clone(), tx).unwrap();
        let (_keys_tx, keys) = unbounded();

        thread::sleep(Duration::from_millis(30));
        source.cancel_on("session_list", cancel.clone());
        let start = Instant::now();
        c.run(&keys, &updates).unwrap();
        assert!(start.elapsed() < interval * 2);
        sampler.join().unwrap().unwrap();

        let calls = source.calls();
        assert_eq!(calls.last(), Some(&Call::SessionList));
        assert_eq!(
            source.count("session_list"),
            source.count("server_status") + 1
        );
    }

    #[test]
    fn key_events_drive_the_loop() {
        let source = Arc::new(ScriptedSource::typical());
        let cancel = CancelToken::new();
        let info = source.server_info().unwrap();
        let mut c = ViewController::new(
            source.clone(),
            RecordingSink::default(),
            config(),
            cancel,
            &info,
        );
        let (_updates_tx, updates) = bounded::<SamplerUpdate>(0);
        let (keys_tx, keys) = unbounded();
        for key in [Key::Char('l'), Key::Char('7'), Key::Enter, Key::Esc] {
            keys_tx.send(UiEvent::Key(key)).unwrap();
        }
        c.run(&keys, &updates).unwrap();
        assert_eq!(source.drilldown_calls(), vec![Call::Locks("7".into())]);
        assert_eq!(c.state().mode, Mode::Locking);
    }

    #[test]
    fn empty_session_list_keeps_header() {
        let source = Arc::new(ScriptedSource::new());
        let mut c = controller(&source);
        c.on_update(update(&source)).unwrap();
        assert_eq!(c.screen().text(Region::Main).lines().count(), 1);
    }
}
