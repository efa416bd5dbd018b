//! End-to-end scenarios against the public [`FrameTimeline`] facade.
//!
//! Each test drives the ingress API exactly as a compositor would, then
//! inspects the resolved history. Thresholds are the 2ms defaults;
//! `vsyncPeriod` is 16_666_666ns (60Hz) throughout.

use std::sync::Arc;

use frame_timeline_core::clock::{Clock, FakeClock};
use frame_timeline_core::config::FrameTimelineConfig;
use frame_timeline_core::facade::FrameTimeline;
use frame_timeline_core::jank::JankType;
use frame_timeline_core::sinks::{
    DisplayStatsRecord, NoopTimeStatsSink, NoopTraceDataSource, PreSignaledFence, SurfaceStatsRecord, TimeStatsSink,
};
use frame_timeline_core::surface_frame::{PredictionState, PresentState};
use frame_timeline_core::time::{Duration, TimelineItem, Timestamp};

const VSYNC_PERIOD: Duration = Duration(16_666_666);

fn timeline() -> FrameTimeline {
    FrameTimeline::new(
        FrameTimelineConfig::default(),
        Arc::new(FakeClock::new(1)),
        Box::new(NoopTimeStatsSink),
        Box::new(NoopTraceDataSource),
    )
}

fn ms(n: u64) -> Timestamp {
    Timestamp(n * 1_000_000)
}

#[derive(Default)]
struct RecordingTimeStats {
    surfaces: Vec<SurfaceStatsRecord>,
    displays: Vec<DisplayStatsRecord>,
}

impl TimeStatsSink for RecordingTimeStats {
    fn record_surface_stats(&mut self, record: &SurfaceStatsRecord) {
        self.surfaces.push(record.clone());
    }

    fn record_display_stats(&mut self, record: &DisplayStatsRecord) {
        self.displays.push(*record);
    }
}

#[derive(Clone, Default)]
struct SharedRecordingTimeStats(Arc<std::sync::Mutex<RecordingTimeStats>>);

impl TimeStatsSink for SharedRecordingTimeStats {
    fn record_surface_stats(&mut self, record: &SurfaceStatsRecord) {
        self.0.lock().unwrap().record_surface_stats(record);
    }

    fn record_display_stats(&mut self, record: &DisplayStatsRecord) {
        self.0.lock().unwrap().record_display_stats(record);
    }
}

#[test]
fn on_time_frame_has_no_jank() {
    let tl = timeline();

    let display_token = tl.generate_token_for_predictions(TimelineItem::new(ms(0), ms(10), ms(16)));
    let surface_token = tl.generate_token_for_predictions(TimelineItem::new(ms(0), ms(8), ms(16)));

    tl.set_sf_wake_up(Some(display_token), ms(0), VSYNC_PERIOD);

    let sf = tl.create_surface_frame_for_token(Some(surface_token), 100, 1000, "L", "L#0");
    sf.set_actual_queue_time(ms(7));
    sf.set_acquire_fence_time(ms(8));
    sf.set_present_state(PresentState::Presented, Timestamp::UNSET);
    tl.add_surface_frame(sf.clone());

    tl.set_sf_present(ms(10), Box::new(PreSignaledFence(ms(16).nanos())));

    assert_eq!(tl.history_len(), 1);
    let history = tl.history();
    let frame = &history[0];
    assert_eq!(frame.jank_type(), JankType::empty());
    assert_eq!(sf.jank_type(), JankType::empty());
}

#[test]
fn compositor_missed_deadline() {
    let tl = timeline();

    let display_token = tl.generate_token_for_predictions(TimelineItem::new(ms(0), ms(10), ms(16)));
    let surface_token = tl.generate_token_for_predictions(TimelineItem::new(ms(0), ms(8), ms(16)));

    tl.set_sf_wake_up(Some(display_token), ms(0), VSYNC_PERIOD);

    let sf = tl.create_surface_frame_for_token(Some(surface_token), 100, 1000, "L", "L#0");
    sf.set_acquire_fence_time(ms(8));
    sf.set_present_state(PresentState::Presented, Timestamp::UNSET);
    tl.add_surface_frame(sf.clone());

    // setSfPresent at 20ms (well past the 10ms+2ms deadline), fence at 32ms.
    tl.set_sf_present(ms(20), Box::new(PreSignaledFence(ms(32).nanos())));

    let history = tl.history();
    let frame = &history[0];
    assert!(frame.jank_type().contains(JankType::SURFACE_FLINGER_DEADLINE_MISSED));
    assert!(sf.jank_type().contains(JankType::SURFACE_FLINGER_DEADLINE_MISSED));
}

#[test]
fn display_hal_jank() {
    let tl = timeline();

    let display_token = tl.generate_token_for_predictions(TimelineItem::new(ms(0), ms(10), ms(16)));
    tl.set_sf_wake_up(Some(display_token), ms(0), VSYNC_PERIOD);

    let sf = tl.create_surface_frame_for_token(None, 100, 1000, "L", "L#0");
    sf.set_present_state(PresentState::Presented, Timestamp::UNSET);
    tl.add_surface_frame(sf.clone());

    // Ready is on-time (endTime=10ms, deadline=10ms+2ms), present is late (33ms).
    tl.set_sf_present(ms(10), Box::new(PreSignaledFence(ms(33).nanos())));

    let history = tl.history();
    assert_eq!(history[0].jank_type(), JankType::DISPLAY_HAL);
    assert_eq!(sf.jank_type(), JankType::DISPLAY_HAL);
}

#[test]
fn app_buffer_stuffing() {
    let tl = timeline();

    let display_token = tl.generate_token_for_predictions(TimelineItem::new(ms(0), ms(10), ms(16)));
    tl.set_sf_wake_up(Some(display_token), ms(0), VSYNC_PERIOD);

    // First surface frame on layer L, latched a while ago.
    let first = tl.create_surface_frame_for_token(None, 100, 1000, "L", "L#0");
    first.set_present_state(PresentState::Presented, Timestamp::UNSET);
    tl.add_surface_frame(first);

    // Second surface frame, same layer: its lastLatchTime falls inside
    // [predPresent - vsyncPeriod, predPresent] = [-0.666ms, 16ms], i.e. a
    // stale buffer was re-presented.
    let second = tl.create_surface_frame_for_token(None, 100, 1000, "L", "L#1");
    second.set_present_state(PresentState::Presented, ms(10));
    tl.add_surface_frame(second.clone());

    tl.set_sf_present(ms(10), Box::new(PreSignaledFence(ms(16).nanos())));

    assert!(second.jank_type().contains(JankType::APP_BUFFER_STUFFING));
}

#[test]
fn expired_token_yields_expired_prediction_state() {
    let fake = Arc::new(FakeClock::new(1));
    let clock: Arc<dyn Clock> = fake.clone();
    let tl = FrameTimeline::new(
        FrameTimelineConfig::default(),
        clock,
        Box::new(NoopTimeStatsSink),
        Box::new(NoopTraceDataSource),
    );

    let token = tl.generate_token_for_predictions(TimelineItem::new(ms(0), ms(8), ms(16)));

    fake.advance(Duration::from_millis(200).nanos());

    let sf = tl.create_surface_frame_for_token(Some(token), 100, 1000, "L", "L#0");
    assert_eq!(sf.prediction_state(), PredictionState::Expired);
    assert_eq!(sf.predictions(), TimelineItem::UNSET);
}

#[test]
fn protocol_violations_are_logged_and_dropped() {
    let _ = env_logger::try_init();
    let tl = timeline();

    // addSurfaceFrame with no open display frame: dropped, nothing to assert
    // against but that it doesn't panic.
    let orphan = tl.create_surface_frame_for_token(None, 1, 1, "L", "L#orphan");
    tl.add_surface_frame(orphan);

    let display_token = tl.generate_token_for_predictions(TimelineItem::new(ms(0), ms(10), ms(16)));
    tl.set_sf_wake_up(Some(display_token), ms(0), VSYNC_PERIOD);

    let sf = tl.create_surface_frame_for_token(None, 100, 1000, "L", "L#0");
    sf.set_present_state(PresentState::Presented, Timestamp::UNSET);
    // Contradictory transition: already Presented, now claiming Dropped.
    sf.set_present_state(PresentState::Dropped, Timestamp::UNSET);
    assert_eq!(sf.present_state(), PresentState::Presented, "contradictory transition must be ignored");

    tl.add_surface_frame(sf.clone());
    tl.set_sf_present(ms(10), Box::new(PreSignaledFence(ms(16).nanos())));

    // A second setSfPresent with nothing open: dropped, history unaffected.
    tl.set_sf_present(ms(20), Box::new(PreSignaledFence(ms(30).nanos())));
    assert_eq!(tl.history_len(), 1);

    // Mutating the surface frame after its owning display frame resolved
    // is also a no-op.
    sf.set_actual_start_time(ms(1));
    assert_eq!(sf.actuals().start, Timestamp::UNSET);
}

#[test]
fn timestats_records_carry_layer_name_and_gpu_composition() {
    let sink = SharedRecordingTimeStats::default();
    let tl = FrameTimeline::new(
        FrameTimelineConfig::default(),
        Arc::new(FakeClock::new(1)),
        Box::new(sink.clone()),
        Box::new(NoopTraceDataSource),
    );

    let display_token = tl.generate_token_for_predictions(TimelineItem::new(ms(0), ms(10), ms(16)));
    tl.set_sf_wake_up(Some(display_token), ms(0), VSYNC_PERIOD);

    let sf = tl.create_surface_frame_for_token(None, 100, 1000, "StatusBar", "StatusBar#0");
    sf.set_gpu_composition(true);
    sf.set_present_state(PresentState::Presented, Timestamp::UNSET);
    tl.add_surface_frame(sf);

    tl.set_sf_present(ms(10), Box::new(PreSignaledFence(ms(16).nanos())));

    let recorded = sink.0.lock().unwrap();
    assert_eq!(recorded.displays.len(), 1);
    assert_eq!(recorded.displays[0].token, display_token);

    assert_eq!(recorded.surfaces.len(), 1);
    let surface = &recorded.surfaces[0];
    assert_eq!(surface.owner_uid, 1000);
    assert_eq!(surface.layer_name, "StatusBar");
    assert!(surface.gpu_composition);
}

#[test]
fn history_is_bounded_to_the_configured_maximum() {
    let tl = timeline();
    tl.set_max_display_frames(4);

    for i in 0..10u64 {
        let wake = Timestamp(1 + i * 16_666_666);
        tl.set_sf_wake_up(None, wake, VSYNC_PERIOD);
        tl.set_sf_present(
            wake + VSYNC_PERIOD,
            Box::new(PreSignaledFence((wake + VSYNC_PERIOD).nanos())),
        );
    }

    assert_eq!(tl.history_len(), 4);
}
