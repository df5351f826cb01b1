use crate::config::SprinklerConfig;
use crate::error::Error;

#[test]
fn test_start_and_stop() {
    let mut cfg = SprinklerConfig::default();
    cfg.queue_start(0).unwrap();
    cfg.queue_start(31).unwrap();
    assert_eq!(cfg.running_queues(), 1 | 1 << 31);

    cfg.queue_stop(0).unwrap();
    assert_eq!(cfg.running_queues(), 1 << 31);

    cfg.queue_stop_all();
    assert_eq!(cfg.running_queues(), 0);

    assert_eq!(cfg.queue_start(32), Err(Error::Param));
}

#[test]
fn test_pause_all_then_resume_all_restores() {
    let mut cfg = SprinklerConfig::default();
    assert!(!cfg.any_queue_paused());

    cfg.queue_pause_all();
    assert!(cfg.any_queue_paused());
    assert_eq!(cfg.paused_queues(), u32::MAX);

    cfg.queue_resume_all();
    assert!(!cfg.any_queue_paused());
    assert_eq!(cfg.paused_queues(), 0);
}

#[test]
fn test_pause_per_queue() {
    let mut cfg = SprinklerConfig::default();
    cfg.queue_pause(3).unwrap();
    cfg.queue_pause(17).unwrap();
    assert_eq!(cfg.paused_queues(), 1 << 3 | 1 << 17);
    assert!(cfg.is_queue_paused(3).unwrap());
    assert!(!cfg.is_queue_paused(4).unwrap());

    cfg.queue_resume(3).unwrap();
    assert_eq!(cfg.paused_queues(), 1 << 17);

    assert_eq!(cfg.queue_pause(32), Err(Error::Param));
    assert_eq!(cfg.is_queue_paused(32), Err(Error::Param));
}

#[test]
fn test_step_clamps_at_the_ends() {
    let mut cfg = SprinklerConfig::default();

    cfg.queue_previous(0).unwrap();
    assert_eq!(cfg.current_idx[0], 0);

    for _ in 0..40 {
        cfg.queue_next(0).unwrap();
    }
    assert_eq!(cfg.current_idx[0], 31);

    cfg.queue_previous(0).unwrap();
    assert_eq!(cfg.current_idx[0], 30);

    assert_eq!(cfg.queue_next(32), Err(Error::Param));
}

#[test]
fn test_global_step_touches_running_queues_only() {
    let mut cfg = SprinklerConfig::default();
    cfg.queue_start(1).unwrap();
    cfg.queue_start(4).unwrap();

    cfg.queue_next_all();
    assert_eq!(cfg.current_idx[1], 1);
    assert_eq!(cfg.current_idx[4], 1);
    assert_eq!(cfg.current_idx[0], 0);

    cfg.queue_previous_all();
    assert_eq!(cfg.current_idx[1], 0);
    assert_eq!(cfg.current_idx[4], 0);
}

#[test]
fn test_control_surface_does_not_dirty_config() {
    let mut cfg = SprinklerConfig::default();
    cfg.queue_start(2).unwrap();
    cfg.queue_pause_all();
    cfg.queue_next(2).unwrap();
    assert!(!cfg.is_dirty());
}
