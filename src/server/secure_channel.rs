// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The session state machine.
//!
//! [`SecureChannel`] listens for encrypted transmissions from clients,
//! decrypts and verifies them, delegates command payloads to the
//! [`Consumer`], and sends back encrypted responses.
//!
//! Because the transport is unauthenticated TCP and the only secret is a
//! pre-shared key, the server defends against replay with a handshake:
//!
//! 1. Client: `seal("NEED_CHALLENGE")`.
//! 2. Server: generate a random 16-byte challenge; compute
//!    `conversation_token = HMAC(PSK, challenge)`; start the expiration
//!    timer; reply `seal(challenge)`.
//!
//! Every following message in the conversation (bounded by the timer) is
//! `seal(token ‖ command)`. The server checks that the received token
//! matches its own, in constant time, and that the conversation has not
//! expired; a stale or mismatched token earns `seal("SESSION_EXPIRED")`,
//! and a fresh handshake always replaces whatever conversation came
//! before it.
//!
//! The machine is driven by [`SecureChannel::step()`], which the host
//! calls from its main loop. One call does a bounded amount of work: at
//! most one read against the channel, and at most one response write.

use core::time::Duration;

use subtle::ConstantTimeEq as _;

use crate::crypto::cipher;
use crate::crypto::hmac;
use crate::crypto::hmac::EngineExt as _;
use crate::crypto::nonce;
use crate::crypto::Psk;
use crate::hardware::clock::Clock;
use crate::hardware::clock::Timer;
use crate::net;
use crate::protocol::envelope;
use crate::protocol::CHALLENGE_LEN;
use crate::protocol::MAX_TRANSMISSION_SIZE;
use crate::protocol::NEED_CHALLENGE;
use crate::protocol::SESSION_EXPIRED;
use crate::protocol::TOKEN_LEN;
use crate::server::Consumer;
use crate::server::Error;

/// How long a conversation stays valid after its handshake.
pub const DEFAULT_CONVERSATION_DURATION: Duration = Duration::from_millis(5000);

/// Consumer responses of this length or shorter are never sent back.
///
/// An empty or near-empty response is the consumer's way of saying
/// "ignore this command".
const RESPONSE_SUPPRESS_LEN: usize = 2;

/// Options struct for initializing a [`SecureChannel`].
///
/// Everything the server touches is borrowed from the application root;
/// there are no hidden globals.
pub struct Options<'a, Chan, Cons, Rng, Ciph, Mac, Clk> {
    /// The transport to listen on.
    pub channel: &'a mut Chan,
    /// The consumer that decrypted commands are delegated to.
    pub consumer: &'a mut Cons,
    /// The source of IVs and handshake challenges.
    pub rng: &'a mut Rng,
    /// The AES-128-CBC engine.
    pub cipher: &'a mut Ciph,
    /// The HMAC-SHA1 engine.
    pub hmac: &'a mut Mac,
    /// The uptime clock conversation deadlines are measured against.
    pub clock: &'a Clk,
    /// The pre-shared key.
    pub psk: &'a Psk,
    /// How long a conversation stays valid; see
    /// [`DEFAULT_CONVERSATION_DURATION`].
    pub conversation_duration: Duration,
}

/// Transmission receive stages.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum State {
    /// Waiting for the two-byte length prefix of a transmission.
    NeedTransmissionLength,
    /// The prefix arrived; waiting for the remainder of the transmission.
    ReceivingTransmission,
}

/// The current conversation, if any.
///
/// At any instant at most one conversation exists; a new handshake
/// replaces it and expiry clears it.
struct Conversation {
    /// The locally-computed token, `HMAC(PSK, challenge)`.
    token: [u8; TOKEN_LEN],
    valid: bool,
    timer: Timer,
}

impl Conversation {
    fn new(duration: Duration) -> Self {
        Self {
            token: [0; TOKEN_LEN],
            valid: false,
            timer: Timer::new(duration),
        }
    }

    /// Clears the token once the deadline passes.
    fn invalidate_if_expired(&mut self, clock: &impl Clock) {
        if self.timer.is_running() && self.timer.is_elapsed(clock) {
            info!("invalidating conversation");
            self.token = [0; TOKEN_LEN];
            self.valid = false;
        }
    }

    /// Returns true if the conversation is live and `received_token`
    /// matches ours.
    ///
    /// The token comparison takes constant time with respect to its
    /// length.
    fn is_valid(&mut self, clock: &impl Clock, received_token: &[u8]) -> bool {
        self.valid
            && self.timer.is_running()
            && !self.timer.is_elapsed(clock)
            && bool::from(received_token.ct_eq(&self.token))
    }
}

/// The secure-channel server.
///
/// This type implements the receive loop, handshake, and conversation
/// lifecycle of the device end of the channel. It exclusively owns the
/// receive and send buffers and the conversation record; the transport,
/// crypto engines, and consumer are borrowed through [`Options`].
pub struct SecureChannel<'a, Chan, Cons, Rng, Ciph, Mac, Clk> {
    opts: Options<'a, Chan, Cons, Rng, Ciph, Mac, Clk>,
    state: State,
    transmission_length: usize,
    receive_buffer: [u8; MAX_TRANSMISSION_SIZE],
    send_buffer: [u8; MAX_TRANSMISSION_SIZE],
    conversation: Conversation,
}

impl<'a, Chan, Cons, Rng, Ciph, Mac, Clk>
    SecureChannel<'a, Chan, Cons, Rng, Ciph, Mac, Clk>
where
    Chan: net::Channel,
    Cons: Consumer,
    Rng: nonce::Source,
    Ciph: cipher::Engine,
    Mac: hmac::Engine,
    Clk: Clock,
{
    /// Creates a new `SecureChannel` with the given `Options`.
    pub fn new(opts: Options<'a, Chan, Cons, Rng, Ciph, Mac, Clk>) -> Self {
        let conversation = Conversation::new(opts.conversation_duration);
        Self {
            opts,
            state: State::NeedTransmissionLength,
            transmission_length: 0,
            receive_buffer: [0; MAX_TRANSMISSION_SIZE],
            send_buffer: [0; MAX_TRANSMISSION_SIZE],
            conversation,
        }
    }

    /// Performs one bounded unit of work.
    ///
    /// Call this from the host's main loop. One tick performs at most one
    /// read against the channel and at most one response write, and
    /// returns immediately either way.
    ///
    /// The returned error is for the host's debug channel only; whatever
    /// needed to happen on the wire has already happened, and the receive
    /// path is already reset.
    pub fn step(&mut self) -> Result<(), Error> {
        self.conversation.invalidate_if_expired(&self.opts.clock);

        match self.state {
            State::NeedTransmissionLength => {
                let mut length_bytes = [0; envelope::LENGTH_LEN];
                if self.opts.channel.read(&mut length_bytes)? == 0 {
                    return Ok(());
                }

                let length = u16::from_le_bytes(length_bytes) as usize;
                info!("incoming transmission length: {} bytes", length);

                if length > 0 && length < MAX_TRANSMISSION_SIZE {
                    self.receive_buffer[..envelope::LENGTH_LEN]
                        .copy_from_slice(&length_bytes);
                    self.transmission_length = length;
                    self.state = State::ReceivingTransmission;
                } else {
                    self.reset_transmission_state();
                }
                Ok(())
            }
            State::ReceivingTransmission => {
                let body_len = self
                    .transmission_length
                    .saturating_sub(envelope::LENGTH_LEN);
                let read = self.opts.channel.read(
                    &mut self.receive_buffer[envelope::LENGTH_LEN..]
                        [..body_len],
                );

                let result = match read {
                    Ok(n) if n == body_len => self.process_transmission(),
                    // Partial transmissions are discarded; the protocol
                    // does not support resumption.
                    Ok(_) => Ok(()),
                    Err(e) => Err(e.into()),
                };

                self.reset_transmission_state();
                result
            }
        }
    }

    /// Loses all receive state and starts waiting on a new transmission.
    fn reset_transmission_state(&mut self) {
        self.receive_buffer = [0; MAX_TRANSMISSION_SIZE];
        self.send_buffer = [0; MAX_TRANSMISSION_SIZE];
        self.transmission_length = 0;
        self.state = State::NeedTransmissionLength;
    }

    /// Handles a transmission after it was received in its entirety.
    fn process_transmission(&mut self) -> Result<(), Error> {
        let Self {
            opts,
            receive_buffer,
            send_buffer,
            conversation,
            transmission_length,
            ..
        } = self;
        let length = *transmission_length;

        // A transmission that fails to open earns silence: answering
        // would turn the device into a decryption oracle.
        let payload = match envelope::open(
            &mut receive_buffer[..length],
            opts.psk,
            opts.cipher,
            opts.hmac,
        ) {
            Ok(payload) => payload,
            Err(e) => {
                error!("dropping transmission: {:?}", e);
                return Err(e.into());
            }
        };
        info!("received {}-byte payload", payload.len());

        if payload == NEED_CHALLENGE {
            info!("generating conversation token...");
            let mut challenge = [0; CHALLENGE_LEN];
            opts.rng
                .next_nonce(&mut challenge)
                .map_err(|_| Error::Internal)?;

            opts.hmac
                .contiguous_hmac(
                    opts.psk.as_bytes(),
                    &challenge,
                    &mut conversation.token,
                )
                .map_err(|_| Error::Internal)?;
            conversation.valid = true;
            conversation.timer.start(&opts.clock);

            let sealed = envelope::seal(
                &challenge,
                opts.psk,
                opts.rng,
                opts.cipher,
                opts.hmac,
                send_buffer,
            )?;
            opts.channel.write(&send_buffer[..sealed])?;
            return Ok(());
        }

        // Any other payload must carry the conversation token as its
        // prefix.
        info!("verifying conversation token...");
        let token_ok = payload.len() >= TOKEN_LEN
            && conversation.is_valid(&opts.clock, &payload[..TOKEN_LEN]);
        if !token_ok {
            warn!("conversation invalid; answering SESSION_EXPIRED");
            let sealed = envelope::seal(
                SESSION_EXPIRED,
                opts.psk,
                opts.rng,
                opts.cipher,
                opts.hmac,
                send_buffer,
            )?;
            opts.channel.write(&send_buffer[..sealed])?;
            return Err(Error::SessionInvalid);
        }

        let message = &payload[TOKEN_LEN..];
        let mut response = [0; envelope::MAX_PAYLOAD_LEN];
        let response_len =
            opts.consumer.process_message(message, &mut response);
        info!("consumer answered {} bytes", response_len);

        if response_len == 0 {
            return Err(Error::UnknownCommand);
        }
        if response_len <= RESPONSE_SUPPRESS_LEN {
            return Ok(());
        }

        let sealed = envelope::seal(
            &response[..response_len],
            opts.psk,
            opts.rng,
            opts.cipher,
            opts.hmac,
            send_buffer,
        )?;
        opts.channel.write(&send_buffer[..sealed])?;
        Ok(())
    }
}
