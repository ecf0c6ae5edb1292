//! Shared panel state.
//!
//! One lock guards the ledger, the display toggles, the staleness monitor and
//! the renderer, so the stream loop and the key loop never observe or draw a
//! half-applied snapshot. Every state change redraws while the lock is held.

use crate::shared::config::PanelConfig;
use crate::shared::input::{Command, Control};
use crate::shared::ledger::{ApplyOutcome, Ledger};
use crate::shared::monitor::{Connectivity, StalenessMonitor};
use crate::shared::snapshot;
use crate::shared::types::AccountSnapshot;
use crate::shared::view::{build_view, DisplayMode, Footer, PanelFrame, ViewOptions};
use crate::shared::widget::Renderer;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Everything the panel knows, minus the renderer
#[derive(Debug, Clone)]
pub struct PanelState {
    config: PanelConfig,
    ledger: Ledger,
    monitor: StalenessMonitor,
    mode: DisplayMode,
    hide_pending: bool,
    hide_balance: bool,
}

impl PanelState {
    pub fn new(config: PanelConfig) -> Self {
        Self {
            ledger: Ledger::new(),
            monitor: StalenessMonitor::new(config.ttl_delta()),
            mode: DisplayMode::default(),
            hide_pending: config.hide_pending,
            hide_balance: config.hide_balance,
            config,
        }
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn connectivity(&self) -> Connectivity {
        self.monitor.connectivity()
    }

    pub fn hide_pending(&self) -> bool {
        self.hide_pending
    }

    pub fn hide_balance(&self) -> bool {
        self.hide_balance
    }

    fn options(&self) -> ViewOptions {
        ViewOptions {
            count_pending: self.config.count_pending,
            hide_pending: self.hide_pending,
            show_stops: self.config.show_stops,
            near_trigger_atr: self.config.near_trigger_atr,
        }
    }

    /// Build the frame for the current state
    ///
    /// A stale feed always yields [`PanelFrame::NoData`], whatever the ledger holds.
    pub fn frame(&self) -> PanelFrame {
        if !self.monitor.connectivity().is_live() {
            return PanelFrame::NoData {
                account: self.config.account.clone(),
            };
        }

        let view = self.ledger.view();
        PanelFrame::Live {
            view: build_view(self.mode, &view, &self.options()),
            footer: Footer::new(view.summary, self.hide_balance),
        }
    }

    fn apply(&mut self, snapshot: &AccountSnapshot, now: DateTime<Utc>) -> ApplyOutcome {
        let outcome = self.ledger.apply(snapshot, now);
        self.monitor.record_message(now);
        outcome
    }

    fn command(&mut self, command: Command) -> Control {
        match command {
            Command::Cycle => self.mode = self.mode.next(),
            Command::Show(mode) => self.mode = mode,
            Command::TogglePending => self.hide_pending = !self.hide_pending,
            Command::ToggleBalance => self.hide_balance = !self.hide_balance,
            Command::Quit => return Control::Quit,
        }
        info!(mode = ?self.mode, hide_pending = self.hide_pending, hide_balance = self.hide_balance, "command applied");
        Control::Continue
    }
}

struct Shared<R> {
    state: PanelState,
    renderer: R,
}

impl<R: Renderer> Shared<R> {
    fn render(&mut self) {
        let frame = self.state.frame();
        if let Err(error) = self.renderer.render(&frame) {
            error!(%error, "failed to render panel");
        }
    }
}

/// What one [`Dashboard::tick`] changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub went_stale: bool,
    pub evicted: usize,
}

/// Cloneable handle to the shared panel state and its renderer
pub struct Dashboard<R> {
    inner: Arc<Mutex<Shared<R>>>,
}

impl<R> Clone for Dashboard<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Renderer> Dashboard<R> {
    pub fn new(config: PanelConfig, renderer: R) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Shared {
                state: PanelState::new(config),
                renderer,
            })),
        }
    }

    /// Decode and apply one raw payload
    ///
    /// Malformed payloads and payloads for another account are logged and
    /// dropped. Returns the apply outcome when the payload was applied.
    pub fn ingest(&self, raw: &str, now: DateTime<Utc>) -> Option<ApplyOutcome> {
        let envelope = match snapshot::decode(raw) {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(%error, "dropping undecodable payload");
                return None;
            }
        };

        let mut shared = self.inner.lock();
        if envelope.topic != shared.state.config.account {
            debug!(topic = %envelope.topic, "ignoring payload for another account");
            return None;
        }

        let outcome = shared.state.apply(&envelope.snapshot, now);
        shared.render();
        Some(outcome)
    }

    /// Apply an already decoded snapshot
    pub fn apply(&self, snapshot: &AccountSnapshot, now: DateTime<Utc>) -> ApplyOutcome {
        let mut shared = self.inner.lock();
        let outcome = shared.state.apply(snapshot, now);
        shared.render();
        outcome
    }

    /// Apply a keyboard command
    pub fn command(&self, command: Command) -> Control {
        let mut shared = self.inner.lock();
        let control = shared.state.command(command);
        if control == Control::Continue {
            shared.render();
        }
        control
    }

    /// Run the staleness check and TTL eviction at `now`
    ///
    /// Redraws once if either changed anything.
    pub fn tick(&self, now: DateTime<Utc>) -> TickOutcome {
        let mut shared = self.inner.lock();
        let ttl = shared.state.config.ttl_delta();

        let outcome = TickOutcome {
            went_stale: shared.state.monitor.check(now),
            evicted: shared.state.ledger.evict(now, ttl),
        };

        if outcome.evicted > 0 {
            info!(evicted = outcome.evicted, remaining = shared.state.ledger.len(), "evicted stale orders");
        }
        if outcome.went_stale || outcome.evicted > 0 {
            shared.render();
        }
        outcome
    }

    /// Draw the current state unconditionally
    pub fn redraw(&self) {
        self.inner.lock().render();
    }

    /// The frame the renderer would draw now
    pub fn frame(&self) -> PanelFrame {
        self.inner.lock().state.frame()
    }

    /// Read the state under the lock
    pub fn inspect<T>(&self, f: impl FnOnce(&PanelState) -> T) -> T {
        f(&self.inner.lock().state)
    }

    /// Access the renderer under the lock, e.g. to restore the terminal on exit
    pub fn with_renderer<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        f(&mut self.inner.lock().renderer)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::shared::error::RenderError;
    use crate::shared::ledger::tests::{fragment, snapshot};
    use crate::shared::types::OrderKind;
    use crate::shared::view::View;
    use std::time::Duration;

    /// Renderer that keeps every frame it was asked to draw
    #[derive(Debug, Default)]
    pub(crate) struct RecordingRenderer {
        pub frames: Vec<PanelFrame>,
        pub fail: bool,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, frame: &PanelFrame) -> Result<(), RenderError> {
            self.frames.push(frame.clone());
            if self.fail {
                return Err(RenderError::Io("test backend".to_string()));
            }
            Ok(())
        }
    }

    pub(crate) fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    pub(crate) const EURUSD_LONG: &str = r#"711700 {"balance":1000.0,"equity":1048.0,"profit":48.0,"symbol":{"name":"EURUSD","bid":1.1,"ask":1.1002,"digits":5},"orders":[{"ticket":1,"type":0,"size":1.0,"symbol":"EURUSD","openPrice":1.095,"swap":-2.0,"profit":50.0}]}"#;

    fn dashboard() -> Dashboard<RecordingRenderer> {
        Dashboard::new(
            PanelConfig::default().with_ttl(Duration::from_secs(5)),
            RecordingRenderer::default(),
        )
    }

    fn frames(dashboard: &Dashboard<RecordingRenderer>) -> usize {
        dashboard.with_renderer(|renderer| renderer.frames.len())
    }

    #[test]
    fn test_starts_stale_with_no_data() {
        let dashboard = dashboard();
        assert_eq!(
            dashboard.frame(),
            PanelFrame::NoData {
                account: "711700".to_string()
            }
        );
        assert_eq!(dashboard.inspect(|state| state.connectivity()), Connectivity::Stale);
    }

    #[test]
    fn test_ingest_shows_position() {
        let dashboard = dashboard();

        let outcome = dashboard.ingest(EURUSD_LONG, at(0)).unwrap();
        assert_eq!(outcome.inserted, 1);
        assert_eq!(frames(&dashboard), 1);

        match dashboard.frame() {
            PanelFrame::Live {
                view: View::Positions(rows),
                footer,
            } => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].instrument, "EURUSD");
                assert_eq!(rows[0].position, "LONG 1.00");
                assert_eq!(rows[0].total, 48.0);
                assert_eq!(footer.profit, 48.0);
                assert!(footer.hide_balance);
            }
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[test]
    fn test_ingest_drops_bad_payloads() {
        let dashboard = dashboard();

        assert_eq!(dashboard.ingest("garbage", at(0)), None);
        assert_eq!(dashboard.ingest("711700 {not json", at(0)), None);
        assert_eq!(
            dashboard.ingest(&EURUSD_LONG.replacen("711700", "7117001", 1), at(0)),
            None
        );

        assert_eq!(frames(&dashboard), 0);
        assert!(dashboard.inspect(|state| state.ledger().is_empty()));
        assert!(!dashboard.frame().is_live());
    }

    #[test]
    fn test_tick_evicts_and_goes_stale() {
        let dashboard = dashboard();
        dashboard.ingest(EURUSD_LONG, at(0));

        // Exactly at the TTL nothing changes
        assert_eq!(dashboard.tick(at(5)), TickOutcome::default());
        assert_eq!(frames(&dashboard), 1);

        let outcome = dashboard.tick(at(6));
        assert_eq!(outcome, TickOutcome { went_stale: true, evicted: 1 });
        assert_eq!(frames(&dashboard), 2);
        assert!(dashboard.inspect(|state| state.ledger().is_empty()));
        assert_eq!(
            dashboard.with_renderer(|renderer| renderer.frames.last().cloned()),
            Some(PanelFrame::NoData {
                account: "711700".to_string()
            })
        );

        // Nothing left to change
        assert_eq!(dashboard.tick(at(7)), TickOutcome::default());
        assert_eq!(frames(&dashboard), 2);
    }

    #[test]
    fn test_new_snapshot_revives_feed() {
        let dashboard = dashboard();
        dashboard.ingest(EURUSD_LONG, at(0));
        dashboard.tick(at(6));
        assert!(!dashboard.frame().is_live());

        dashboard.ingest(EURUSD_LONG, at(7));
        assert!(dashboard.frame().is_live());
        assert_eq!(dashboard.inspect(|state| state.connectivity()), Connectivity::Live);
    }

    #[test]
    fn test_commands() {
        struct TestCase {
            input: Command,
            expected_mode: DisplayMode,
            expected_hide_pending: bool,
            expected_hide_balance: bool,
        }

        let dashboard = dashboard();

        let tests = vec![
            TestCase {
                // TC0: cycle from positions
                input: Command::Cycle,
                expected_mode: DisplayMode::Orders,
                expected_hide_pending: false,
                expected_hide_balance: true,
            },
            TestCase {
                // TC1: cycle from orders
                input: Command::Cycle,
                expected_mode: DisplayMode::Pending,
                expected_hide_pending: false,
                expected_hide_balance: true,
            },
            TestCase {
                // TC2: cycle wraps around
                input: Command::Cycle,
                expected_mode: DisplayMode::Positions,
                expected_hide_pending: false,
                expected_hide_balance: true,
            },
            TestCase {
                // TC3: jump to pending
                input: Command::Show(DisplayMode::Pending),
                expected_mode: DisplayMode::Pending,
                expected_hide_pending: false,
                expected_hide_balance: true,
            },
            TestCase {
                // TC4: toggle pending
                input: Command::TogglePending,
                expected_mode: DisplayMode::Pending,
                expected_hide_pending: true,
                expected_hide_balance: true,
            },
            TestCase {
                // TC5: toggle balance
                input: Command::ToggleBalance,
                expected_mode: DisplayMode::Pending,
                expected_hide_pending: true,
                expected_hide_balance: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(dashboard.command(test.input), Control::Continue, "TC{} failed", index);
            let (mode, hide_pending, hide_balance) = dashboard.inspect(|state| {
                (state.mode(), state.hide_pending(), state.hide_balance())
            });
            assert_eq!(mode, test.expected_mode, "TC{} failed", index);
            assert_eq!(hide_pending, test.expected_hide_pending, "TC{} failed", index);
            assert_eq!(hide_balance, test.expected_hide_balance, "TC{} failed", index);
        }

        assert_eq!(frames(&dashboard), 6);
        assert_eq!(dashboard.command(Command::Quit), Control::Quit);
        assert_eq!(frames(&dashboard), 6);
    }

    #[test]
    fn test_orders_mode_hides_pending() {
        let dashboard = dashboard();
        dashboard.apply(
            &snapshot(
                "EURUSD",
                vec![
                    fragment(1, OrderKind::Buy, 1.0, 50.0, -2.0),
                    fragment(2, OrderKind::BuyLimit, 0.5, 0.0, 0.0),
                ],
            ),
            at(0),
        );
        dashboard.command(Command::Show(DisplayMode::Orders));

        let rows = |dashboard: &Dashboard<RecordingRenderer>| match dashboard.frame() {
            PanelFrame::Live { view, .. } => view.len(),
            PanelFrame::NoData { .. } => 0,
        };
        assert_eq!(rows(&dashboard), 2);

        dashboard.command(Command::TogglePending);
        assert_eq!(rows(&dashboard), 1);
    }

    #[test]
    fn test_render_failure_is_not_fatal() {
        let dashboard = Dashboard::new(
            PanelConfig::default(),
            RecordingRenderer {
                frames: Vec::new(),
                fail: true,
            },
        );

        assert!(dashboard.ingest(EURUSD_LONG, at(0)).is_some());
        dashboard.redraw();
        assert_eq!(frames(&dashboard), 2);
        assert_eq!(dashboard.inspect(|state| state.ledger().len()), 1);
    }

    /// Renderer that checks every live frame's footer agrees with its rows
    #[derive(Debug, Default)]
    struct ConsistencyRenderer {
        frames: usize,
        mismatches: Vec<String>,
    }

    impl Renderer for ConsistencyRenderer {
        fn render(&mut self, frame: &PanelFrame) -> Result<(), RenderError> {
            self.frames += 1;
            let PanelFrame::Live { view, footer } = frame else {
                return Ok(());
            };

            let rows_profit: f64 = match view {
                View::Positions(rows) => rows.iter().map(|row| row.profit).sum(),
                View::Orders { rows, .. } => rows.iter().map(|row| row.profit).sum(),
                View::Pending(_) => {
                    self.mismatches.push("unexpected pending view".to_string());
                    return Ok(());
                }
            };
            if rows_profit != footer.profit || footer.equity != footer.balance + footer.profit {
                self.mismatches.push(format!("rows {rows_profit} vs footer {footer:?}"));
            }
            Ok(())
        }
    }

    fn numbered_snapshot(index: u32) -> String {
        let profit = f64::from(index);
        format!(
            r#"711700 {{"balance":1000.0,"equity":{},"profit":{profit},"symbol":{{"name":"EURUSD","bid":1.1,"ask":1.1002,"digits":5}},"orders":[{{"ticket":1,"type":0,"size":1.0,"openPrice":1.095,"swap":0.0,"profit":{profit}}}]}}"#,
            1000.0 + profit
        )
    }

    #[test]
    fn test_concurrent_ingest_and_commands_render_consistent_frames() {
        const SNAPSHOTS: u32 = 200;
        const COMMANDS: usize = 200;

        let dashboard = Dashboard::new(PanelConfig::default(), ConsistencyRenderer::default());
        let commands = [
            Command::Show(DisplayMode::Orders),
            Command::ToggleBalance,
            Command::Show(DisplayMode::Positions),
            Command::TogglePending,
        ];

        std::thread::scope(|scope| {
            let stream = dashboard.clone();
            scope.spawn(move || {
                for index in 1..=SNAPSHOTS {
                    assert!(stream.ingest(&numbered_snapshot(index), at(0)).is_some());
                }
            });

            let keys = dashboard.clone();
            scope.spawn(move || {
                for command in commands.iter().cycle().take(COMMANDS) {
                    assert_eq!(keys.command(*command), Control::Continue);
                }
            });
        });

        let (frames, mismatches) = dashboard.with_renderer(|renderer| {
            (renderer.frames, std::mem::take(&mut renderer.mismatches))
        });
        assert!(mismatches.is_empty(), "{mismatches:?}");
        assert_eq!(frames, SNAPSHOTS as usize + COMMANDS);
        assert_eq!(
            dashboard.inspect(|state| state.ledger().view().summary.profit),
            f64::from(SNAPSHOTS)
        );
    }
}
