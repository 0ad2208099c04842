/*!
 * Tests for timeline reconciliation
 */

use dualsub::errors::ValidationError;
use dualsub::reconciler::{reconcile, ReconcilerConfig, TimelineReconciler, DEFAULT_MIN_DURATION_MS};
use dualsub::{Segment, Timeline};

fn assert_timeline_invariants(timeline: &Timeline, min: u64) {
    let segments = timeline.segments();
    for segment in segments {
        assert!(segment.duration_ms() >= min, "segment shorter than floor: {:?}", segment);
    }
    for pair in segments.windows(2) {
        assert!(pair[0].start_ms <= pair[1].start_ms, "starts out of order: {:?}", pair);
        assert!(pair[0].end_ms <= pair[1].start_ms, "segments overlap: {:?}", pair);
    }
}

#[test]
fn test_reconcile_withShortSegmentBeforeNeighbor_shouldReachFloorWithoutCrossingNeighbor() {
    let raw = vec![
        Segment::new(0, 1500, "Hello"),
        Segment::new(2000, 2050, "um"),
        Segment::new(2100, 4000, "there"),
    ];

    let timeline = reconcile(&raw).unwrap();

    assert_eq!(timeline.len(), 3);
    let um = timeline.get(1).unwrap();
    assert_eq!(um.source_text, "um");
    assert!(um.duration_ms() >= DEFAULT_MIN_DURATION_MS);
    assert!(um.end_ms <= 2100);
    assert!(um.start_ms >= 1500);
    assert_timeline_invariants(&timeline, DEFAULT_MIN_DURATION_MS);
}

#[test]
fn test_reconcile_withShortFirstSegment_shouldExtendBackIntoLeadingGap() {
    let raw = vec![Segment::new(2000, 2050, "um"), Segment::new(2100, 3000, "next")];

    let timeline = reconcile(&raw).unwrap();

    assert_eq!(timeline.get(0).unwrap().start_ms, 1600);
    assert_eq!(timeline.get(0).unwrap().end_ms, 2100);
    assert_eq!(timeline.get(1).unwrap().start_ms, 2100);
}

#[test]
fn test_reconcile_withUnorderedInput_shouldSortByStart() {
    let raw = vec![Segment::new(2000, 3000, "b"), Segment::new(0, 1000, "a")];
    let timeline = reconcile(&raw).unwrap();
    assert_eq!(timeline.source_texts(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_reconcile_withOverlap_shouldClipEarlierEnd() {
    let raw = vec![Segment::new(0, 1500, "a"), Segment::new(1000, 2000, "b")];

    let (timeline, report) = TimelineReconciler::new().reconcile_with_report(&raw).unwrap();

    assert_eq!(timeline.get(0).unwrap().end_ms, 1000);
    assert_eq!(timeline.get(1).unwrap().start_ms, 1000);
    assert_eq!(report.clipped_overlaps, 1);
}

#[test]
fn test_reconcile_withInvertedEnd_shouldInferFromNextStart() {
    let raw = vec![
        Segment::new(0, 1000, "a"),
        Segment::new(1500, 1200, "b"),
        Segment::new(3000, 4000, "c"),
    ];

    let (timeline, report) = TimelineReconciler::new().reconcile_with_report(&raw).unwrap();

    assert_eq!(timeline.get(1).unwrap().end_ms, 3000);
    assert_eq!(report.inferred_ends, 1);
}

#[test]
fn test_reconcile_withInvertedLastSegment_shouldFailWithIndex() {
    let raw = vec![Segment::new(0, 1000, "a"), Segment::new(1500, 1200, "b")];

    let result = reconcile(&raw);

    assert_eq!(
        result,
        Err(ValidationError::UninferableEnd {
            index: 1,
            start_ms: 1500,
            end_ms: 1200
        })
    );
}

#[test]
fn test_reconcile_withBlankText_shouldDropSegment() {
    let raw = vec![Segment::new(0, 1000, "   "), Segment::new(1000, 2000, " b ")];

    let (timeline, report) = TimelineReconciler::new().reconcile_with_report(&raw).unwrap();

    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.get(0).unwrap().source_text, "b");
    assert_eq!(report.dropped_empty, 1);
}

#[test]
fn test_reconcile_withNoRoomToExtend_shouldMergeIntoPrevious() {
    let raw = vec![
        Segment::new(0, 1000, "a"),
        Segment::new(1000, 1100, "b"),
        Segment::new(1100, 2000, "c"),
    ];

    let (timeline, report) = TimelineReconciler::new().reconcile_with_report(&raw).unwrap();

    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline.get(0).unwrap(), &Segment::new(0, 1100, "a b"));
    assert_eq!(timeline.get(1).unwrap(), &Segment::new(1100, 2000, "c"));
    assert_eq!(report.merged, 1);
}

#[test]
fn test_reconcile_withNoRoomForFirstSegment_shouldMergeIntoNext() {
    let raw = vec![Segment::new(0, 100, "a"), Segment::new(100, 1000, "b")];

    let timeline = reconcile(&raw).unwrap();

    assert_eq!(timeline.segments(), &[Segment::new(0, 1000, "a b")]);
}

#[test]
fn test_reconcile_withMessyInput_shouldSatisfyAllInvariants() {
    let raw = vec![
        Segment::new(5000, 5010, "x"),
        Segment::new(0, 800, "a"),
        Segment::new(700, 900, "b"),
        Segment::new(900, 900, "c"),
        Segment::new(3000, 2000, "d"),
        Segment::new(4000, 6000, "e"),
    ];

    let timeline = reconcile(&raw).unwrap();

    assert_eq!(timeline.len(), 5);
    assert_timeline_invariants(&timeline, DEFAULT_MIN_DURATION_MS);
}

#[test]
fn test_reconcile_withCustomFloor_shouldUseIt() {
    let reconciler = TimelineReconciler::with_config(ReconcilerConfig { min_duration_ms: 200 });
    let raw = vec![Segment::new(0, 100, "a"), Segment::new(1000, 2000, "b")];

    let timeline = reconciler.reconcile(&raw).unwrap();

    assert_eq!(timeline.get(0).unwrap().end_ms, 200);
}

#[test]
fn test_reconcile_withZeroFloor_shouldBeRejected() {
    let reconciler = TimelineReconciler::with_config(ReconcilerConfig { min_duration_ms: 0 });
    assert_eq!(
        reconciler.reconcile(&[Segment::new(0, 1000, "a")]),
        Err(ValidationError::ZeroMinimumDuration)
    );
}

#[test]
fn test_reconcile_withAnyInput_shouldLeaveInputUntouched() {
    let raw = vec![Segment::new(2000, 1000, "late"), Segment::new(0, 50, "short"), Segment::new(3000, 4000, "ok")];
    let before = raw.clone();

    let _ = reconcile(&raw);

    assert_eq!(raw, before);
}

#[test]
fn test_reconcile_withEmptyInput_shouldReturnEmptyTimeline() {
    assert!(reconcile(&[]).unwrap().is_empty());
}
