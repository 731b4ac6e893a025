//! Async countdown tests against tokio's paused virtual clock.
//!
//! With `start_paused = true`, `sleep_until` resolves the instant the
//! clock is advanced to the deadline, so these run in microseconds and
//! never flake.

use std::time::Duration;

use auxclash_timer::{Countdown, CountdownEvent};

#[tokio::test(start_paused = true)]
async fn test_tick_decrements_once_per_second() {
    let mut countdown = Countdown::idle();
    countdown.arm(3, "done");

    assert_eq!(
        countdown.tick().await,
        CountdownEvent::Tick { remaining: 2 }
    );
    assert_eq!(
        countdown.tick().await,
        CountdownEvent::Tick { remaining: 1 }
    );
    assert_eq!(countdown.tick().await, CountdownEvent::Expired("done"));
}

#[tokio::test(start_paused = true)]
async fn test_expiry_fires_exactly_once() {
    let mut countdown = Countdown::idle();
    countdown.arm(1, "once");

    assert_eq!(countdown.tick().await, CountdownEvent::Expired("once"));

    // The tag is gone; the countdown is idle and pends forever.
    assert!(!countdown.is_armed());
    let pended = tokio::time::timeout(Duration::from_secs(30), countdown.tick())
        .await
        .is_err();
    assert!(pended, "expired countdown should go idle, not refire");
}

#[tokio::test(start_paused = true)]
async fn test_idle_countdown_pends_forever() {
    let mut countdown: Countdown<&str> = Countdown::idle();
    let result =
        tokio::time::timeout(Duration::from_secs(60), countdown.tick()).await;
    assert!(result.is_err(), "idle countdown must not resolve");
}

#[tokio::test(start_paused = true)]
async fn test_stop_suppresses_expiry() {
    let mut countdown = Countdown::idle();
    countdown.arm(2, "never");
    assert_eq!(
        countdown.tick().await,
        CountdownEvent::Tick { remaining: 1 }
    );

    assert_eq!(countdown.stop(), Some("never"));
    let result =
        tokio::time::timeout(Duration::from_secs(10), countdown.tick()).await;
    assert!(result.is_err(), "stopped countdown must not fire");
}

#[tokio::test(start_paused = true)]
async fn test_fast_forward_expires_on_next_tick() {
    let mut countdown = Countdown::idle();
    countdown.arm(90, "submission-window");
    assert_eq!(
        countdown.tick().await,
        CountdownEvent::Tick { remaining: 89 }
    );

    // Both players locked in — collapse to the final second.
    countdown.fast_forward(1);
    assert_eq!(
        countdown.tick().await,
        CountdownEvent::Expired("submission-window")
    );
}

#[tokio::test(start_paused = true)]
async fn test_pause_resume_continues_where_it_left_off() {
    let mut countdown = Countdown::idle();
    countdown.arm(5, "phase");
    assert_eq!(
        countdown.tick().await,
        CountdownEvent::Tick { remaining: 4 }
    );

    let paused = countdown.pause().unwrap();
    assert_eq!(paused.remaining, 4);

    // Time passes while paused; nothing fires.
    let result =
        tokio::time::timeout(Duration::from_secs(120), countdown.tick()).await;
    assert!(result.is_err());

    countdown.resume(paused);
    assert_eq!(
        countdown.tick().await,
        CountdownEvent::Tick { remaining: 3 }
    );
    assert_eq!(
        countdown.tick().await,
        CountdownEvent::Tick { remaining: 2 }
    );
    assert_eq!(
        countdown.tick().await,
        CountdownEvent::Tick { remaining: 1 }
    );
    assert_eq!(countdown.tick().await, CountdownEvent::Expired("phase"));
}

#[tokio::test(start_paused = true)]
async fn test_rearm_during_flight_restarts_cleanly() {
    let mut countdown = Countdown::idle();
    countdown.arm(10, "old");
    assert_eq!(
        countdown.tick().await,
        CountdownEvent::Tick { remaining: 9 }
    );

    // Supersede the transition mid-flight.
    countdown.arm(2, "new");
    assert_eq!(
        countdown.tick().await,
        CountdownEvent::Tick { remaining: 1 }
    );
    assert_eq!(countdown.tick().await, CountdownEvent::Expired("new"));
}

#[tokio::test(start_paused = true)]
async fn test_arm_zero_expires_on_first_tick() {
    let mut countdown = Countdown::idle();
    countdown.arm(0, "now-ish");
    assert_eq!(countdown.tick().await, CountdownEvent::Expired("now-ish"));
}

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    // Mirrors real room usage: commands and ticks interleaved in one
    // select! loop, commands never starved by the countdown.
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(4);
    let mut countdown = Countdown::idle();
    countdown.arm(3, "phase-over");

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        tx.send("lock-in").await.ok();
    });

    let mut ticks = 0;
    let mut commands = 0;
    loop {
        tokio::select! {
            Some(_) = rx.recv() => {
                commands += 1;
                countdown.fast_forward(1);
            }
            event = countdown.tick() => match event {
                CountdownEvent::Tick { .. } => ticks += 1,
                CountdownEvent::Expired(tag) => {
                    assert_eq!(tag, "phase-over");
                    break;
                }
            }
        }
    }

    assert_eq!(commands, 1);
    // One tick at t=1s, then the command at 1.5s clamps to 1 and the
    // t=2s tick expires.
    assert_eq!(ticks, 1);
}
