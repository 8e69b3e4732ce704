#![allow(non_snake_case)]

use std::time::Duration;
use taixiu_bot::{
    gateway::{
        DeliveryError,
        DeliveryGateway,
    },
    test_helpers::FakeTransport,
};
use tokio::time::Instant;

const UNIT: Duration = Duration::from_secs(1);

fn gateway() -> DeliveryGateway<FakeTransport> {
    DeliveryGateway::with_backoff_unit(FakeTransport::new(), UNIT)
}

#[tokio::test(start_paused = true)]
async fn send_text__succeeds_after_two_transient_failures() {
    // given
    let gateway = gateway();
    gateway.transport().fail_next_text(2);
    let started = Instant::now();

    // when
    let handle = gateway.send_text(1, "hello").await;

    // then: linear backoff waited 1 unit, then 2 units
    assert!(handle.is_ok());
    assert_eq!(started.elapsed(), UNIT * 3);
    assert_eq!(gateway.transport().texts_for(1), vec!["hello".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn send_text__gives_up_after_three_attempts() {
    // given
    let gateway = gateway();
    gateway.transport().fail_next_text(3);
    let started = Instant::now();

    // when
    let result = gateway.send_text(1, "hello").await;

    // then: no wait follows the final attempt
    assert_eq!(result.unwrap_err(), DeliveryError);
    assert_eq!(started.elapsed(), UNIT * 3);
    assert!(gateway.transport().sent_texts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn send_text__honours_the_mandated_rate_limit_wait() {
    // given
    let gateway = gateway();
    gateway
        .transport()
        .rate_limit_next_text(Duration::from_secs(7));
    let started = Instant::now();

    // when
    let handle = gateway.send_text(1, "hello").await;

    // then: mandated 7s plus one backoff unit
    assert!(handle.is_ok());
    assert_eq!(started.elapsed(), Duration::from_secs(7) + UNIT);
}

#[tokio::test(start_paused = true)]
async fn send_die__retries_like_every_other_call() {
    // given
    let gateway = gateway();
    gateway.transport().fail_next_die(2);
    gateway.transport().script_rolls([5]);

    // when
    let die = gateway.send_die(1).await.unwrap();

    // then
    assert_eq!(die.value, 5);
    assert_eq!(gateway.transport().die_requests(), 3);
}

#[tokio::test(start_paused = true)]
async fn delete_message__exhaustion_yields_the_uniform_sentinel() {
    // given
    let gateway = gateway();
    let handle = gateway.send_text(1, "to be removed").await.unwrap();
    gateway.transport().fail_next_delete(3);

    // when
    let result = gateway.delete_message(1, handle).await;

    // then
    assert_eq!(result.unwrap_err(), DeliveryError);
    assert!(gateway.transport().deleted().is_empty());
}
