use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use rune_anim::{AnimationOptions, EasingFunction, NodeId, SchedulerMode, StopOptions, Timeline};
use rune_config::RuneConfig;
use tokio::task::LocalSet;

fn headless_timeline() -> Timeline {
    Timeline::builder()
        .mode(SchedulerMode::Timer)
        .timer_interval(Duration::from_millis(10))
        .build()
}

#[tokio::test(start_paused = true)]
async fn awaiting_a_set_resolves_after_duration() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let timeline = headless_timeline();
            let frames = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&frames);

            let started = tokio::time::Instant::now();
            let set = timeline
                .animate(
                    ["a", "b"],
                    move |node, p, _| sink.borrow_mut().push((node.to_string(), p)),
                    AnimationOptions::new()
                        .duration_ms(200.0)
                        .easing(EasingFunction::Linear),
                )?;

            let targets = set.deferred().await?;
            assert_eq!(targets, vec![NodeId::from("a"), NodeId::from("b")]);
            assert!(started.elapsed() >= Duration::from_millis(200));
            assert!(timeline.is_idle());

            let frames = frames.borrow();
            assert!(frames.len() > 2);
            assert_eq!(frames.last().map(|(_, p)| *p), Some(1.0));
            anyhow::Ok(())
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn cancelling_rejects_the_awaited_result() {
    LocalSet::new()
        .run_until(async {
            let timeline = headless_timeline();
            let set = timeline
                .animate(["a"], |_, _, _| {}, AnimationOptions::new().infinite(true))
                .unwrap();

            let canceller = timeline.clone();
            tokio::task::spawn_local(async move {
                tokio::time::sleep(Duration::from_millis(55)).await;
                canceller.stop(&NodeId::from("a"), StopOptions::CANCEL);
            });

            let err = set.deferred().await.unwrap_err();
            assert!(err.is_cancelled());

            tokio::time::sleep(Duration::from_millis(20)).await;
            assert!(timeline.is_idle());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn timeline_from_config_honours_defaults() {
    let mut config = RuneConfig::default();
    config.animation.duration = 50.0;
    config.animation.easing = "ease-out".to_string();
    config.scheduler.mode = SchedulerMode::Timer;
    config.scheduler.frame_interval_ms = 5.0;

    LocalSet::new()
        .run_until(async {
            let timeline = Timeline::from_config(&config).build();
            let set = timeline
                .animate(["a"], |_, _, _| {}, AnimationOptions::new())
                .unwrap();
            let spec = set.animations()[0].spec().clone();
            assert_eq!(spec.duration_ms, 50.0);
            assert_eq!(spec.easing, EasingFunction::EaseOut);

            set.deferred().await.unwrap();
            assert!(timeline.is_idle());
        })
        .await;
}
