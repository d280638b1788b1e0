// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Black-box protocol scenarios against a live server.

use std::time::Duration;

use gatehouse::protocol::DoorState;
use gatehouse::protocol::NEED_CHALLENGE;
use gatehouse::protocol::SESSION_EXPIRED;

use crate::fakes::Door;
use crate::server;
use crate::tests::support;
use crate::tests::support::Client;

fn spawn_server(
    conversation_duration: Duration,
    door: &Door,
) -> server::SpawnedServer {
    server::spawn(server::Options {
        port: 0,
        psk: *server::TEST_PSK.as_bytes(),
        conversation_duration,
        door: door.clone(),
    })
}

#[test]
fn handshake_and_command() {
    let door = Door::new();
    let spawned = spawn_server(Duration::from_secs(5), &door);
    let mut client = Client::connect(spawned.port);

    let challenge = client.transact(NEED_CHALLENGE);
    assert_eq!(challenge.len(), 16);

    let mut request = support::token_for(&challenge);
    request.extend_from_slice(b"GET_STATUS");
    assert_eq!(client.transact(&request), b"DOOR_CLOSED");
    assert_eq!(door.commands_processed(), 1);

    spawned.shutdown();
}

#[test]
fn commands_drive_the_door() {
    let travel = Duration::from_millis(500);
    let door = Door::with_travel_time(travel);
    let spawned = spawn_server(Duration::from_secs(10), &door);
    let mut client = Client::connect(spawned.port);

    let challenge = client.transact(NEED_CHALLENGE);
    let token = support::token_for(&challenge);
    let command = |name: &[u8]| {
        let mut request = token.clone();
        request.extend_from_slice(name);
        request
    };

    assert_eq!(client.transact(&command(b"GET_STATUS")), b"DOOR_CLOSED");

    // Opening presses the button and starts the travel timer; the door
    // reports itself in motion until the timer elapses.
    assert_eq!(client.transact(&command(b"OPEN")), b"DOOR_MOVING");
    assert_eq!(door.state(), DoorState::Moving);

    // A second OPEN while in motion must not press again; if it did,
    // the door would settle closed below instead of open.
    assert_eq!(client.transact(&command(b"OPEN")), b"DOOR_MOVING");

    std::thread::sleep(travel + Duration::from_millis(200));
    assert_eq!(client.transact(&command(b"GET_STATUS")), b"DOOR_OPEN");
    assert_eq!(door.state(), DoorState::Open);

    assert_eq!(client.transact(&command(b"PRESS_BUTTON")), b"DOOR_MOVING");
    std::thread::sleep(travel + Duration::from_millis(200));
    assert_eq!(client.transact(&command(b"GET_STATUS")), b"DOOR_CLOSED");

    // Closing an already-closed door does nothing.
    assert_eq!(client.transact(&command(b"CLOSE")), b"DOOR_CLOSED");
    assert_eq!(door.state(), DoorState::Closed);

    spawned.shutdown();
}

#[test]
fn replay_after_expiry_is_rejected() {
    let window = Duration::from_millis(200);
    let door = Door::new();
    let spawned = spawn_server(window, &door);
    let mut client = Client::connect(spawned.port);

    let challenge = client.transact(NEED_CHALLENGE);
    let mut request = support::token_for(&challenge);
    request.extend_from_slice(b"GET_STATUS");

    let frame = client.seal(&request);
    client.send_raw(&frame);
    assert_eq!(client.recv(), b"DOOR_CLOSED");
    assert_eq!(door.commands_processed(), 1);

    // Byte-for-byte replay, outside the conversation window.
    std::thread::sleep(window + Duration::from_millis(200));
    client.send_raw(&frame);
    assert_eq!(client.recv(), SESSION_EXPIRED);

    // The consumer never saw the replay.
    assert_eq!(door.commands_processed(), 1);

    spawned.shutdown();
}

#[test]
fn superseding_handshake_invalidates_old_conversation() {
    let door = Door::new();
    let spawned = spawn_server(Duration::from_secs(5), &door);
    let mut client = Client::connect(spawned.port);

    let stale_token = support::token_for(&client.transact(NEED_CHALLENGE));
    let fresh_token = support::token_for(&client.transact(NEED_CHALLENGE));
    assert_ne!(stale_token, fresh_token);

    // The stale token is now worthless, even though its conversation
    // never timed out.
    let mut request = stale_token;
    request.extend_from_slice(b"GET_STATUS");
    assert_eq!(client.transact(&request), SESSION_EXPIRED);
    assert_eq!(door.commands_processed(), 0);

    // The fresh token works.
    let mut request = fresh_token;
    request.extend_from_slice(b"GET_STATUS");
    assert_eq!(client.transact(&request), b"DOOR_CLOSED");
    assert_eq!(door.commands_processed(), 1);

    spawned.shutdown();
}

#[test]
fn over_length_frame_is_dropped() {
    let door = Door::new();
    let spawned = spawn_server(Duration::from_secs(5), &door);
    let mut client = Client::connect(spawned.port);

    // A transmission claiming 300 bytes is dropped at the length
    // prefix, with no reply.
    client.send_raw(&300u16.to_le_bytes());
    client.expect_silence(Duration::from_millis(300));
    assert_eq!(door.commands_processed(), 0);

    // The receive path is back to waiting for a length; the same
    // connection can still complete a normal exchange.
    let challenge = client.transact(NEED_CHALLENGE);
    let mut request = support::token_for(&challenge);
    request.extend_from_slice(b"GET_STATUS");
    assert_eq!(client.transact(&request), b"DOOR_CLOSED");
    assert_eq!(door.commands_processed(), 1);

    spawned.shutdown();
}

#[test]
fn tampered_frame_earns_silence() {
    let door = Door::new();
    let spawned = spawn_server(Duration::from_secs(5), &door);
    let mut client = Client::connect(spawned.port);

    let challenge = client.transact(NEED_CHALLENGE);
    let mut request = support::token_for(&challenge);
    request.extend_from_slice(b"GET_STATUS");

    let mut frame = client.seal(&request);
    *frame.last_mut().unwrap() ^= 1;
    client.send_raw(&frame);
    client.expect_silence(Duration::from_millis(300));
    assert_eq!(door.commands_processed(), 0);

    // The tampered frame cost us nothing: the conversation is intact.
    let mut request = support::token_for(&challenge);
    request.extend_from_slice(b"GET_STATUS");
    assert_eq!(client.transact(&request), b"DOOR_CLOSED");

    spawned.shutdown();
}

#[test]
fn unknown_command_earns_silence() {
    let door = Door::new();
    let spawned = spawn_server(Duration::from_secs(5), &door);
    let mut client = Client::connect(spawned.port);

    let challenge = client.transact(NEED_CHALLENGE);
    let mut request = support::token_for(&challenge);
    request.extend_from_slice(b"FOO");

    let frame = client.seal(&request);
    client.send_raw(&frame);
    client.expect_silence(Duration::from_millis(300));

    // The consumer was consulted and declined to answer.
    assert_eq!(door.commands_processed(), 1);

    spawned.shutdown();
}
