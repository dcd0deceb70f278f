use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::Result;
use log::info;
use rune_anim::{AnimationOptions, EasingFunction, NodeId, StopOptions, Timeline};
use rune_config::{RuneConfig, SchedulerMode};
use tokio::task::LocalSet;

const BAR_WIDTH: usize = 40;

fn bar(progress: f64) -> String {
    let filled = (progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn render(state: &BTreeMap<String, f64>) {
    for (node, progress) in state {
        println!("{node:>8} {} {:>5.1}%", bar(*progress), progress * 100.0);
    }
    println!();
}

async fn run(config: RuneConfig, nodes: Vec<String>) -> Result<()> {
    // Headless host: there is no display to pace frames.
    let timeline = Timeline::from_config(&config)
        .mode(SchedulerMode::Timer)
        .build();

    let state: Rc<RefCell<BTreeMap<String, f64>>> = Rc::new(RefCell::new(BTreeMap::new()));
    let last_print = Rc::new(RefCell::new(f64::NEG_INFINITY));

    let fade = {
        let state = Rc::clone(&state);
        let last_print = Rc::clone(&last_print);
        let clock = timeline.clone();
        timeline.animate(
            nodes.iter().map(String::as_str),
            move |node, progress, _| {
                state.borrow_mut().insert(node.to_string(), progress);
                let now = clock.now();
                let mut last = last_print.borrow_mut();
                if now - *last >= 100.0 || progress >= 1.0 {
                    *last = now;
                    render(&state.borrow());
                }
            },
            AnimationOptions::new(),
        )?
    };
    info!("animating {} nodes", fade.len());

    let spinner = timeline.animate(
        ["spinner"],
        |_, _, _| {},
        AnimationOptions::new()
            .duration_ms(250.0)
            .easing(EasingFunction::Linear)
            .infinite(true),
    )?;

    let targets = fade.deferred().await?;
    info!(
        "finished: {}",
        targets
            .iter()
            .map(NodeId::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    spinner.stop(StopOptions::CANCEL);
    if let Err(error) = spinner.deferred().await {
        info!("spinner: {error}");
    }

    for event in timeline.drain_events() {
        info!("{event:?}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let _ = env_logger::try_init();

    let nodes: Vec<String> = std::env::args()
        .find_map(|a| a.strip_prefix("--nodes=").map(|s| s.to_string()))
        .unwrap_or_else(|| "title,body,footer".to_string())
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let config = RuneConfig::load();
    info!(
        "duration={}ms easing={} interval={}ms",
        config.animation.duration, config.animation.easing, config.scheduler.frame_interval_ms
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    LocalSet::new().block_on(&runtime, run(config, nodes))
}
